use super::*;
use itertools::Itertools;
use std::fmt::{self, Display, Formatter};

impl Display for HostType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            HostType::Boolean => write!(f, "bool"),
            HostType::Char => write!(f, "char"),
            HostType::Int32 => write!(f, "int"),
            HostType::Int64 => write!(f, "long"),
            HostType::Single => write!(f, "float"),
            HostType::Double => write!(f, "double"),
            HostType::Decimal => write!(f, "decimal"),
            HostType::String => write!(f, "string"),
            HostType::DateTime => write!(f, "DateTime"),
            HostType::ObjectId => write!(f, "ObjectId"),
            HostType::Object => write!(f, "object"),
            HostType::StringComparison => write!(f, "StringComparison"),
            HostType::StringSplitOptions => write!(f, "StringSplitOptions"),
            HostType::Nullable(t) => write!(f, "{t}?"),
            HostType::Array(t) => write!(f, "{t}[]"),
            HostType::Enumerable(t) => write!(f, "IEnumerable<{t}>"),
            HostType::List(t) => write!(f, "List<{t}>"),
            HostType::Queryable(t) => write!(f, "IQueryable<{t}>"),
            HostType::Dictionary(k, v) => write!(f, "Dictionary<{k}, {v}>"),
            HostType::Function(params, result) => {
                write!(f, "Func<")?;
                for p in params {
                    write!(f, "{p}, ")?;
                }
                write!(f, "{result}>")
            }
            HostType::Class(name) => write!(f, "{name}"),
            HostType::Anonymous(members) => write!(
                f,
                "<>f__AnonymousType<{}>",
                members.iter().map(|(_, t)| t).join(", ")
            ),
        }
    }
}

impl Display for HostValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            HostValue::Null => write!(f, "null"),
            HostValue::Boolean(b) => write!(f, "{b}"),
            HostValue::Char(c) => write!(f, "'{c}'"),
            HostValue::Int32(i) => write!(f, "{i}"),
            HostValue::Int64(i) => write!(f, "{i}L"),
            HostValue::Single(x) => write!(f, "{x}F"),
            HostValue::Double(x) => write!(f, "{x}"),
            HostValue::Decimal(d) => write!(f, "{d}M"),
            HostValue::String(s) => write!(f, "\"{s}\""),
            HostValue::DateTime(d) => write!(f, "{d}"),
            HostValue::ObjectId(o) => write!(f, "{o}"),
            HostValue::Array(items) => write!(f, "[{}]", items.iter().join(", ")),
            HostValue::Document(members) => write!(
                f,
                "{{ {} }}",
                members.iter().map(|(k, v)| format!("{k} = {v}")).join(", ")
            ),
            HostValue::StringComparison(c) => write!(f, "{c:?}"),
            HostValue::StringSplitOptions(o) => write!(f, "{o:?}"),
        }
    }
}

impl Display for DeclaringType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let name = match self {
            DeclaringType::String => "string",
            DeclaringType::Int32 => "int",
            DeclaringType::Int64 => "long",
            DeclaringType::Double => "double",
            DeclaringType::Decimal => "decimal",
            DeclaringType::Object => "object",
            other => return write!(f, "{other:?}"),
        };
        write!(f, "{name}")
    }
}

impl Display for BinaryOperator {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Subtract => "-",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
            BinaryOperator::Modulo => "%",
            BinaryOperator::Power => "^",
            BinaryOperator::Equal => "==",
            BinaryOperator::NotEqual => "!=",
            BinaryOperator::LessThan => "<",
            BinaryOperator::LessThanOrEqual => "<=",
            BinaryOperator::GreaterThan => ">",
            BinaryOperator::GreaterThanOrEqual => ">=",
            BinaryOperator::AndAlso => "AndAlso",
            BinaryOperator::OrElse => "OrElse",
            BinaryOperator::And => "And",
            BinaryOperator::Or => "Or",
            BinaryOperator::Coalesce => "??",
            BinaryOperator::ArrayIndex => "[]",
        };
        write!(f, "{symbol}")
    }
}

fn is_extension(method: &MethodInfo) -> bool {
    method.is_static
        && matches!(
            method.declaring_type,
            DeclaringType::Enumerable | DeclaringType::Queryable | DeclaringType::Mql
        )
}

impl Display for MethodCallExpression {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let args = &self.arguments;
        match (&self.object, args.split_first()) {
            (Some(object), _) if self.method.name == "get_Item" => {
                write!(f, "{object}[{}]", args.iter().join(", "))
            }
            (Some(object), _) => {
                write!(f, "{object}.{}({})", self.method.name, args.iter().join(", "))
            }
            (None, Some((source, rest))) if is_extension(&self.method) => {
                write!(f, "{source}.{}({})", self.method.name, rest.iter().join(", "))
            }
            (None, _) => write!(
                f,
                "{}.{}({})",
                self.method.declaring_type,
                self.method.name,
                args.iter().join(", ")
            ),
        }
    }
}

/// Renders expressions the way the host language prints expression trees,
/// for use in diagnostics.
impl Display for Expression {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Constant(c) => write!(f, "{}", c.value),
            Expression::Parameter(p) => write!(f, "{}", p.name),
            Expression::MemberAccess(m) => match &m.expression {
                Some(target) => write!(f, "{target}.{}", m.member.name),
                None => write!(f, "{}.{}", m.member.declaring_type, m.member.name),
            },
            Expression::MethodCall(c) => write!(f, "{c}"),
            Expression::Binary(b) => match b.op {
                BinaryOperator::ArrayIndex => write!(f, "{}[{}]", b.left, b.right),
                op => write!(f, "({} {op} {})", b.left, b.right),
            },
            Expression::Unary(u) => match u.op {
                UnaryOperator::Not => write!(f, "Not({})", u.operand),
                UnaryOperator::Negate => write!(f, "-{}", u.operand),
                UnaryOperator::Convert => write!(f, "Convert({}, {})", u.operand, u.ty),
                UnaryOperator::ArrayLength => write!(f, "ArrayLength({})", u.operand),
                UnaryOperator::Quote => write!(f, "{}", u.operand),
            },
            Expression::Conditional(c) => {
                write!(f, "IIF({}, {}, {})", c.test, c.if_true, c.if_false)
            }
            Expression::Lambda(l) => match l.parameters.as_slice() {
                [p] => write!(f, "{} => {}", p.name, l.body),
                params => write!(
                    f,
                    "({}) => {}",
                    params.iter().map(|p| p.name.as_str()).join(", "),
                    l.body
                ),
            },
            Expression::NewArray(a) => write!(
                f,
                "new [] {{{}}}",
                a.elements.iter().join(", ")
            ),
            Expression::New(n) => {
                let members = n
                    .members
                    .iter()
                    .map(|(name, e)| format!("{name} = {e}"))
                    .join(", ");
                match &n.ty {
                    HostType::Anonymous(_) => write!(f, "new {{{members}}}"),
                    ty => write!(f, "new {ty}() {{{members}}}"),
                }
            }
            Expression::Queryable(q) => write!(f, "{}.AsQueryable()", q.collection),
        }
    }
}
