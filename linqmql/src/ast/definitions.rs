use bson::Bson;
use linqmql_datastructures::unique_linked_hash_map::UniqueLinkedHashMap;

/// An aggregation expression.
#[derive(PartialEq, Debug, Clone)]
pub enum Expression {
    Constant(Bson),
    /// A constant that must be wrapped in `$literal` because the server
    /// would otherwise read it as a field path or an expression.
    Literal(Bson),
    FieldPath(FieldPath),
    Variable(String),
    Unary(Unary),
    Binary(Binary),
    Ternary(Ternary),
    Nary(Nary),
    Cond(Cond),
    Let(Let),
    Map(Map),
    Filter(ArrayFilter),
    Reduce(Reduce),
    Zip(Zip),
    Range(Range),
    Slice(Slice),
    IndexOf(IndexOf),
    Convert(Convert),
    Switch(Switch),
    Trim(Trim),
    RegexMatch(RegexMatch),
    ReplaceAll(ReplaceAll),
    DateAdd(DateAdd),
    GetField(GetField),
    Array(Vec<Expression>),
    Document(UniqueLinkedHashMap<String, Expression>),
}

/// `root: None` addresses the current document (`$a.b`); `root: Some(v)`
/// addresses a path under a variable (`$$v.a.b`).
#[derive(PartialEq, Eq, Debug, Clone)]
pub struct FieldPath {
    pub root: Option<String>,
    pub segments: Vec<String>,
}

#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum UnaryOperator {
    Abs,
    AllElementsTrue,
    AnyElementTrue,
    ArrayToObject,
    Avg,
    Ceil,
    DayOfMonth,
    DayOfWeek,
    DayOfYear,
    Exp,
    First,
    Floor,
    Hour,
    IsArray,
    Last,
    Ln,
    Log10,
    Max,
    Millisecond,
    Min,
    Minute,
    Month,
    Not,
    ObjectToArray,
    ReverseArray,
    Second,
    Size,
    Sqrt,
    StdDevPop,
    StdDevSamp,
    StrLenBytes,
    StrLenCP,
    Sum,
    ToBool,
    ToDate,
    ToDecimal,
    ToDouble,
    ToInt,
    ToLong,
    ToLower,
    ToObjectId,
    ToString,
    ToUpper,
    Trunc,
    Type,
    Year,
}

#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum BinaryOperator {
    ArrayElemAt,
    Cmp,
    Divide,
    Eq,
    Gt,
    Gte,
    IfNull,
    In,
    Log,
    Lt,
    Lte,
    Mod,
    Ne,
    Pow,
    Round,
    SetDifference,
    SetIsSubset,
    Split,
    StrCaseCmp,
    Subtract,
}

#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum TernaryOperator {
    SubstrBytes,
    SubstrCP,
}

/// Operators whose arguments may be flattened when nested.
#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum NaryOperator {
    Add,
    And,
    Concat,
    ConcatArrays,
    Max,
    Min,
    Multiply,
    Or,
    SetIntersection,
    SetUnion,
}

#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum IndexOfOperator {
    Array,
    Bytes,
    CP,
}

#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum TrimOperator {
    Trim,
    LTrim,
    RTrim,
}

#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum ConvertTarget {
    Bool,
    Date,
    Decimal,
    Double,
    Int,
    Long,
    ObjectId,
    String,
}

#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum DateUnit {
    Year,
    Month,
    Day,
    Hour,
    Minute,
    Second,
    Millisecond,
}

#[derive(PartialEq, Debug, Clone)]
pub struct Unary {
    pub op: UnaryOperator,
    pub arg: Box<Expression>,
}

#[derive(PartialEq, Debug, Clone)]
pub struct Binary {
    pub op: BinaryOperator,
    pub left: Box<Expression>,
    pub right: Box<Expression>,
}

#[derive(PartialEq, Debug, Clone)]
pub struct Ternary {
    pub op: TernaryOperator,
    pub first: Box<Expression>,
    pub second: Box<Expression>,
    pub third: Box<Expression>,
}

#[derive(PartialEq, Debug, Clone)]
pub struct Nary {
    pub op: NaryOperator,
    pub args: Vec<Expression>,
}

#[derive(PartialEq, Debug, Clone)]
pub struct Cond {
    pub if_expr: Box<Expression>,
    pub then_expr: Box<Expression>,
    pub else_expr: Box<Expression>,
}

#[derive(PartialEq, Debug, Clone)]
pub struct LetVariable {
    pub name: String,
    pub value: Box<Expression>,
}

#[derive(PartialEq, Debug, Clone)]
pub struct Let {
    pub vars: Vec<LetVariable>,
    pub inside: Box<Expression>,
}

#[derive(PartialEq, Debug, Clone)]
pub struct Map {
    pub input: Box<Expression>,
    pub as_name: String,
    pub inside: Box<Expression>,
}

#[derive(PartialEq, Debug, Clone)]
pub struct ArrayFilter {
    pub input: Box<Expression>,
    pub as_name: String,
    pub cond: Box<Expression>,
    pub limit: Option<Box<Expression>>,
}

/// `$reduce` binds the fixed variables `$$value` and `$$this`.
#[derive(PartialEq, Debug, Clone)]
pub struct Reduce {
    pub input: Box<Expression>,
    pub initial_value: Box<Expression>,
    pub inside: Box<Expression>,
}

#[derive(PartialEq, Debug, Clone)]
pub struct Zip {
    pub inputs: Vec<Expression>,
    pub use_longest_length: bool,
}

#[derive(PartialEq, Debug, Clone)]
pub struct Range {
    pub start: Box<Expression>,
    pub end: Box<Expression>,
    pub step: Option<Box<Expression>>,
}

/// `$slice` with an optional starting position.
#[derive(PartialEq, Debug, Clone)]
pub struct Slice {
    pub input: Box<Expression>,
    pub position: Option<Box<Expression>>,
    pub n: Box<Expression>,
}

/// `end` is only rendered when `start` is present.
#[derive(PartialEq, Debug, Clone)]
pub struct IndexOf {
    pub op: IndexOfOperator,
    pub input: Box<Expression>,
    pub search: Box<Expression>,
    pub start: Option<Box<Expression>>,
    pub end: Option<Box<Expression>>,
}

#[derive(PartialEq, Debug, Clone)]
pub struct Convert {
    pub input: Box<Expression>,
    pub to: ConvertTarget,
    pub on_error: Option<Box<Expression>>,
    pub on_null: Option<Box<Expression>>,
}

#[derive(PartialEq, Debug, Clone)]
pub struct SwitchCase {
    pub case: Box<Expression>,
    pub then: Box<Expression>,
}

#[derive(PartialEq, Debug, Clone)]
pub struct Switch {
    pub branches: Vec<SwitchCase>,
    pub default: Option<Box<Expression>>,
}

#[derive(PartialEq, Debug, Clone)]
pub struct Trim {
    pub op: TrimOperator,
    pub input: Box<Expression>,
    pub chars: Option<Box<Expression>>,
}

#[derive(PartialEq, Debug, Clone)]
pub struct RegexMatch {
    pub input: Box<Expression>,
    pub regex: String,
    pub options: String,
}

#[derive(PartialEq, Debug, Clone)]
pub struct ReplaceAll {
    pub input: Box<Expression>,
    pub find: Box<Expression>,
    pub replacement: Box<Expression>,
}

#[derive(PartialEq, Debug, Clone)]
pub struct DateAdd {
    pub start_date: Box<Expression>,
    pub unit: DateUnit,
    pub amount: Box<Expression>,
}

#[derive(PartialEq, Debug, Clone)]
pub struct GetField {
    pub field: String,
    pub input: Box<Expression>,
}

/// A query predicate in the match language.
#[derive(PartialEq, Debug, Clone)]
pub enum Filter {
    And(Vec<Filter>),
    Or(Vec<Filter>),
    Nor(Vec<Filter>),
    Field(FieldFilter),
    Expr(Expression),
}

/// An empty path addresses the element itself inside `$elemMatch`.
#[derive(PartialEq, Debug, Clone)]
pub struct FieldFilter {
    pub path: Vec<String>,
    pub op: FieldOperation,
}

#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum ComparisonOperator {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
}

#[derive(PartialEq, Debug, Clone)]
pub enum FieldOperation {
    Comparison(ComparisonOperator, Bson),
    In(Vec<Bson>),
    Nin(Vec<Bson>),
    Exists(bool),
    Regex { pattern: String, options: String },
    ElemMatch(Box<Filter>),
    Size(i32),
    Not(Box<FieldOperation>),
}

#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum SortDirection {
    Ascending,
    Descending,
}

#[derive(PartialEq, Debug, Clone)]
pub struct SortField {
    pub path: Vec<String>,
    pub direction: SortDirection,
}

#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum AccumulatorOperator {
    AddToSet,
    Avg,
    First,
    Last,
    Max,
    Min,
    Push,
    StdDevPop,
    StdDevSamp,
    Sum,
}

#[derive(PartialEq, Debug, Clone)]
pub struct Accumulator {
    pub op: AccumulatorOperator,
    pub arg: Expression,
}

#[derive(PartialEq, Debug, Clone)]
pub struct Group {
    pub id: Expression,
    pub accumulators: UniqueLinkedHashMap<String, Accumulator>,
}

#[derive(PartialEq, Debug, Clone)]
pub enum Stage {
    Match(Filter),
    /// Computed fields only; `_id` is suppressed unless projected.
    Project(UniqueLinkedHashMap<String, Expression>),
    AddFields(UniqueLinkedHashMap<String, Expression>),
    Group(Group),
    Sort(Vec<SortField>),
    Skip(i64),
    Limit(i64),
    ReplaceRoot(Expression),
    Unwind(Vec<String>),
}

#[derive(PartialEq, Debug, Clone, Default)]
pub struct Pipeline {
    pub stages: Vec<Stage>,
}
