use serde::{Deserialize, Serialize};

static CHAR_TYPE: HostType = HostType::Char;

/// The static type of a host expression node.
#[derive(PartialEq, Eq, PartialOrd, Ord, Debug, Clone, Hash, Serialize, Deserialize)]
pub enum HostType {
    Boolean,
    Char,
    Int32,
    Int64,
    Single,
    Double,
    Decimal,
    String,
    DateTime,
    ObjectId,
    Object,
    StringComparison,
    StringSplitOptions,
    Nullable(Box<HostType>),
    Array(Box<HostType>),
    Enumerable(Box<HostType>),
    List(Box<HostType>),
    Queryable(Box<HostType>),
    Dictionary(Box<HostType>, Box<HostType>),
    Function(Vec<HostType>, Box<HostType>),
    Class(String),
    Anonymous(Vec<(String, HostType)>),
}

impl HostType {
    pub fn nullable(inner: HostType) -> Self {
        HostType::Nullable(Box::new(inner))
    }

    pub fn array(item: HostType) -> Self {
        HostType::Array(Box::new(item))
    }

    pub fn enumerable(item: HostType) -> Self {
        HostType::Enumerable(Box::new(item))
    }

    pub fn list(item: HostType) -> Self {
        HostType::List(Box::new(item))
    }

    pub fn queryable(item: HostType) -> Self {
        HostType::Queryable(Box::new(item))
    }

    pub fn dictionary(key: HostType, value: HostType) -> Self {
        HostType::Dictionary(Box::new(key), Box::new(value))
    }

    pub fn class(name: &str) -> Self {
        HostType::Class(name.to_string())
    }

    /// Strips one level of `Nullable`.
    pub fn underlying_type(&self) -> &HostType {
        match self {
            HostType::Nullable(inner) => inner,
            _ => self,
        }
    }

    pub fn is_nullable(&self) -> bool {
        matches!(self, HostType::Nullable(_))
    }

    pub fn is_numeric(&self) -> bool {
        matches!(
            self.underlying_type(),
            HostType::Int32 | HostType::Int64 | HostType::Single | HostType::Double | HostType::Decimal
        )
    }

    pub fn is_integral(&self) -> bool {
        matches!(self.underlying_type(), HostType::Int32 | HostType::Int64)
    }

    /// Whether values of this type are stored as arrays. Strings are
    /// sequences of chars on the host but are not treated as sequences
    /// here.
    pub fn is_sequence(&self) -> bool {
        matches!(
            self,
            HostType::Array(_) | HostType::Enumerable(_) | HostType::List(_) | HostType::Queryable(_)
        )
    }

    pub fn item_type(&self) -> Option<&HostType> {
        match self {
            HostType::Array(item)
            | HostType::Enumerable(item)
            | HostType::List(item)
            | HostType::Queryable(item) => Some(item),
            HostType::String => Some(&CHAR_TYPE),
            _ => None,
        }
    }

    pub fn function_parameters(&self) -> Option<&[HostType]> {
        match self {
            HostType::Function(params, _) => Some(params),
            _ => None,
        }
    }
}

#[derive(PartialEq, Eq, PartialOrd, Ord, Debug, Clone, Copy, Hash, Serialize, Deserialize)]
pub enum StringComparison {
    CurrentCulture,
    CurrentCultureIgnoreCase,
    InvariantCulture,
    InvariantCultureIgnoreCase,
    Ordinal,
    OrdinalIgnoreCase,
}

#[derive(PartialEq, Eq, PartialOrd, Ord, Debug, Clone, Copy, Hash, Serialize, Deserialize)]
pub enum StringSplitOptions {
    None,
    RemoveEmptyEntries,
}

/// A literal host value carried by a constant expression. Decimals, dates
/// and ObjectIds are kept in their textual form and parsed by the
/// serializer that encodes them.
#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub enum HostValue {
    Null,
    Boolean(bool),
    Char(char),
    Int32(i32),
    Int64(i64),
    Single(f32),
    Double(f64),
    Decimal(String),
    String(String),
    DateTime(String),
    ObjectId(String),
    Array(Vec<HostValue>),
    Document(Vec<(String, HostValue)>),
    StringComparison(StringComparison),
    StringSplitOptions(StringSplitOptions),
}

#[derive(PartialEq, Eq, PartialOrd, Ord, Debug, Clone, Copy, Hash, Serialize, Deserialize)]
pub struct ParameterId(pub u64);

#[derive(PartialEq, Eq, PartialOrd, Ord, Debug, Clone, Copy, Hash, Serialize, Deserialize)]
pub enum DeclaringType {
    String,
    Enumerable,
    Queryable,
    Math,
    Convert,
    DateTime,
    Object,
    List,
    Dictionary,
    Regex,
    Int32,
    Int64,
    Double,
    Decimal,
    /// Driver extension methods with no host equivalent.
    Mql,
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub enum Expression {
    Constant(ConstantExpression),
    Parameter(ParameterExpression),
    MemberAccess(MemberExpression),
    MethodCall(MethodCallExpression),
    Binary(BinaryExpression),
    Unary(UnaryExpression),
    Conditional(ConditionalExpression),
    Lambda(LambdaExpression),
    NewArray(NewArrayExpression),
    New(NewExpression),
    Queryable(QueryableExpression),
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConstantExpression {
    pub value: HostValue,
    #[serde(rename = "type")]
    pub ty: HostType,
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterExpression {
    pub id: ParameterId,
    pub name: String,
    #[serde(rename = "type")]
    pub ty: HostType,
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberInfo {
    pub declaring_type: HostType,
    pub name: String,
    #[serde(rename = "type")]
    pub ty: HostType,
}

/// `expression` is `None` for static members such as `DateTime.Now`.
#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberExpression {
    #[serde(default)]
    pub expression: Option<Box<Expression>>,
    pub member: MemberInfo,
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodInfo {
    pub declaring_type: DeclaringType,
    pub name: String,
    pub parameters: Vec<HostType>,
    pub return_type: HostType,
    pub is_static: bool,
}

/// Extension methods such as `Enumerable.Select` are static calls whose
/// first argument is the source.
#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodCallExpression {
    #[serde(default)]
    pub object: Option<Box<Expression>>,
    pub method: MethodInfo,
    pub arguments: Vec<Expression>,
}

#[derive(PartialEq, Eq, Debug, Clone, Copy, Hash, Serialize, Deserialize)]
pub enum BinaryOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Power,
    Equal,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    AndAlso,
    OrElse,
    And,
    Or,
    Coalesce,
    ArrayIndex,
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BinaryExpression {
    pub op: BinaryOperator,
    pub left: Box<Expression>,
    pub right: Box<Expression>,
    #[serde(rename = "type")]
    pub ty: HostType,
}

#[derive(PartialEq, Eq, Debug, Clone, Copy, Hash, Serialize, Deserialize)]
pub enum UnaryOperator {
    Not,
    Negate,
    Convert,
    ArrayLength,
    Quote,
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnaryExpression {
    pub op: UnaryOperator,
    pub operand: Box<Expression>,
    #[serde(rename = "type")]
    pub ty: HostType,
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionalExpression {
    pub test: Box<Expression>,
    pub if_true: Box<Expression>,
    pub if_false: Box<Expression>,
    #[serde(rename = "type")]
    pub ty: HostType,
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LambdaExpression {
    pub parameters: Vec<ParameterExpression>,
    pub body: Box<Expression>,
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewArrayExpression {
    pub element_type: HostType,
    pub elements: Vec<Expression>,
}

/// Anonymous type creation and member initialization, `new { A = x }` or
/// `new T { A = x }`.
#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewExpression {
    #[serde(rename = "type")]
    pub ty: HostType,
    pub members: Vec<(String, Expression)>,
}

/// The root of a query: a collection exposed as a queryable sequence.
#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryableExpression {
    pub collection: String,
    pub document_type: HostType,
}

impl Expression {
    pub fn ty(&self) -> HostType {
        match self {
            Expression::Constant(c) => c.ty.clone(),
            Expression::Parameter(p) => p.ty.clone(),
            Expression::MemberAccess(m) => m.member.ty.clone(),
            Expression::MethodCall(c) => c.method.return_type.clone(),
            Expression::Binary(b) => b.ty.clone(),
            Expression::Unary(u) => u.ty.clone(),
            Expression::Conditional(c) => c.ty.clone(),
            Expression::Lambda(l) => HostType::Function(
                l.parameters.iter().map(|p| p.ty.clone()).collect(),
                Box::new(l.body.ty()),
            ),
            Expression::NewArray(a) => HostType::array(a.element_type.clone()),
            Expression::New(n) => n.ty.clone(),
            Expression::Queryable(q) => HostType::queryable(q.document_type.clone()),
        }
    }

    pub fn as_constant(&self) -> Option<&HostValue> {
        match self {
            Expression::Constant(c) => Some(&c.value),
            _ => None,
        }
    }

    /// Lambdas passed to queryable methods arrive quoted.
    pub fn strip_quotes(&self) -> &Expression {
        match self {
            Expression::Unary(UnaryExpression {
                op: UnaryOperator::Quote,
                operand,
                ..
            }) => operand.strip_quotes(),
            _ => self,
        }
    }

    pub fn as_lambda(&self) -> Option<&LambdaExpression> {
        match self.strip_quotes() {
            Expression::Lambda(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_method_call(&self) -> Option<&MethodCallExpression> {
        match self {
            Expression::MethodCall(c) => Some(c),
            _ => None,
        }
    }
}

impl MethodCallExpression {
    pub fn is(&self, declaring_type: DeclaringType, name: &str) -> bool {
        self.method.declaring_type == declaring_type && self.method.name == name
    }
}
