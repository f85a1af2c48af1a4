//! Smart constructors. They fold constant operands at construction time,
//! flatten nested associative operators and drop identity operands, so the
//! translators can build nodes without special-casing constants.

use super::definitions::*;
use bson::Bson;
use linqmql_datastructures::unique_linked_hash_map::UniqueLinkedHashMap;

pub const ROOT: &str = "ROOT";

/// Values the server would evaluate instead of taking literally: strings
/// that look like paths and containers holding such strings or operator
/// keys.
fn needs_literal(value: &Bson) -> bool {
    match value {
        Bson::String(s) => s.starts_with('$'),
        Bson::Array(items) => items.iter().any(needs_literal),
        Bson::Document(d) => d
            .iter()
            .any(|(k, v)| k.starts_with('$') || k.contains('.') || needs_literal(v)),
        _ => false,
    }
}

fn flatten(op: NaryOperator, args: Vec<Expression>) -> Vec<Expression> {
    let mut out = Vec::with_capacity(args.len());
    for arg in args {
        match arg {
            Expression::Nary(Nary { op: inner, args }) if inner == op => {
                out.extend(flatten(op, args))
            }
            arg => out.push(arg),
        }
    }
    out
}

fn boxed(e: Expression) -> Box<Expression> {
    Box::new(e)
}

impl Expression {
    pub fn constant(value: impl Into<Bson>) -> Self {
        let value = value.into();
        if needs_literal(&value) {
            Expression::Literal(value)
        } else {
            Expression::Constant(value)
        }
    }

    pub fn as_constant(&self) -> Option<&Bson> {
        match self {
            Expression::Constant(v) | Expression::Literal(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        match self.as_constant() {
            Some(Bson::Int32(i)) => Some(*i),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self.as_constant() {
            Some(Bson::Boolean(b)) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self.as_constant() {
            Some(Bson::String(s)) => Some(s),
            _ => None,
        }
    }

    pub fn var(name: &str) -> Self {
        Expression::Variable(name.to_string())
    }

    /// The current document, `$$ROOT`.
    pub fn root() -> Self {
        Expression::var(ROOT)
    }

    pub fn field(segments: &[&str]) -> Self {
        Expression::FieldPath(FieldPath {
            root: None,
            segments: segments.iter().map(|s| s.to_string()).collect(),
        })
    }

    /// Extends a path-like expression by one field. Returns `None` when the
    /// target is computed, in which case the caller must bind it first.
    pub fn try_field_access(target: Expression, name: &str) -> Option<Self> {
        match target {
            Expression::Variable(v) if v == ROOT => Some(Expression::field(&[name])),
            Expression::Variable(v) => Some(Expression::FieldPath(FieldPath {
                root: Some(v),
                segments: vec![name.to_string()],
            })),
            Expression::FieldPath(mut p) => {
                p.segments.push(name.to_string());
                Some(Expression::FieldPath(p))
            }
            _ => None,
        }
    }

    /// Simple expressions may be repeated in the output without cost.
    pub fn is_simple(&self) -> bool {
        matches!(
            self,
            Expression::Constant(_)
                | Expression::Literal(_)
                | Expression::FieldPath(_)
                | Expression::Variable(_)
        )
    }

    /// Returns the expression itself when it is simple, otherwise a
    /// reference to a new variable together with the binding to introduce.
    pub fn use_var_if_not_simple(name: &str, expr: Expression) -> (Self, Option<LetVariable>) {
        if expr.is_simple() {
            (expr, None)
        } else {
            (
                Expression::var(name),
                Some(LetVariable {
                    name: name.to_string(),
                    value: boxed(expr),
                }),
            )
        }
    }

    pub fn unary(op: UnaryOperator, arg: Expression) -> Self {
        let folded = match (op, arg.as_constant()) {
            (UnaryOperator::StrLenCP, Some(Bson::String(s))) => {
                i32::try_from(s.chars().count()).ok().map(Expression::constant)
            }
            // `$toLower` and `$toUpper` only change ASCII letters.
            (UnaryOperator::ToLower, Some(Bson::String(s))) => {
                Some(Expression::constant(s.to_ascii_lowercase()))
            }
            (UnaryOperator::ToUpper, Some(Bson::String(s))) => {
                Some(Expression::constant(s.to_ascii_uppercase()))
            }
            (UnaryOperator::Not, Some(Bson::Boolean(b))) => Some(Expression::constant(!b)),
            _ => None,
        };
        folded.unwrap_or_else(|| {
            Expression::Unary(Unary {
                op,
                arg: boxed(arg),
            })
        })
    }

    pub fn binary(op: BinaryOperator, left: Expression, right: Expression) -> Self {
        if op == BinaryOperator::Subtract {
            match (left.as_i32(), right.as_i32()) {
                (Some(l), Some(r)) => {
                    if let Some(d) = l.checked_sub(r) {
                        return Expression::constant(d);
                    }
                }
                (_, Some(0)) => return left,
                _ => {}
            }
        }
        Expression::Binary(Binary {
            op,
            left: boxed(left),
            right: boxed(right),
        })
    }

    pub fn ternary(
        op: TernaryOperator,
        first: Expression,
        second: Expression,
        third: Expression,
    ) -> Self {
        Expression::Ternary(Ternary {
            op,
            first: boxed(first),
            second: boxed(second),
            third: boxed(third),
        })
    }

    pub fn nary(op: NaryOperator, args: Vec<Expression>) -> Self {
        match op {
            NaryOperator::Add => Expression::add(args),
            NaryOperator::And => Expression::and(args),
            NaryOperator::Or => Expression::or(args),
            NaryOperator::Concat => Expression::concat(args),
            op => Expression::Nary(Nary {
                op,
                args: flatten(op, args),
            }),
        }
    }

    pub fn add(args: Vec<Expression>) -> Self {
        let args = flatten(NaryOperator::Add, args);
        if args.len() > 1 && args.iter().all(|a| a.as_i32().is_some()) {
            let sum: i64 = args.iter().filter_map(Expression::as_i32).map(i64::from).sum();
            if let Ok(sum) = i32::try_from(sum) {
                return Expression::constant(sum);
            }
        }
        let mut args: Vec<_> = args.into_iter().filter(|a| a.as_i32() != Some(0)).collect();
        match args.len() {
            0 => Expression::constant(0),
            1 => args.remove(0),
            _ => Expression::Nary(Nary {
                op: NaryOperator::Add,
                args,
            }),
        }
    }

    pub fn subtract(left: Expression, right: Expression) -> Self {
        Expression::binary(BinaryOperator::Subtract, left, right)
    }

    pub fn and(args: Vec<Expression>) -> Self {
        Expression::fold_logical(NaryOperator::And, args, true)
    }

    pub fn or(args: Vec<Expression>) -> Self {
        Expression::fold_logical(NaryOperator::Or, args, false)
    }

    /// `identity` is the operand value that can be dropped; its negation
    /// short-circuits the whole expression.
    fn fold_logical(op: NaryOperator, args: Vec<Expression>, identity: bool) -> Self {
        let args = flatten(op, args);
        if args.iter().any(|a| a.as_bool() == Some(!identity)) {
            return Expression::constant(!identity);
        }
        let mut args: Vec<_> = args
            .into_iter()
            .filter(|a| a.as_bool() != Some(identity))
            .collect();
        match args.len() {
            0 => Expression::constant(identity),
            1 => args.remove(0),
            _ => Expression::Nary(Nary { op, args }),
        }
    }

    pub fn concat(args: Vec<Expression>) -> Self {
        let mut out: Vec<Expression> = vec![];
        for arg in flatten(NaryOperator::Concat, args) {
            if arg.as_str() == Some("") {
                continue;
            }
            match (out.last().and_then(Expression::as_str), arg.as_str()) {
                (Some(prev), Some(next)) => {
                    let merged = Expression::constant(format!("{prev}{next}"));
                    out.pop();
                    out.push(merged);
                }
                _ => out.push(arg),
            }
        }
        match out.len() {
            0 => Expression::constant(""),
            1 if out[0].as_str().is_some() => out.remove(0),
            _ => Expression::Nary(Nary {
                op: NaryOperator::Concat,
                args: out,
            }),
        }
    }

    pub fn not(arg: Expression) -> Self {
        Expression::unary(UnaryOperator::Not, arg)
    }

    pub fn eq(left: Expression, right: Expression) -> Self {
        Expression::binary(BinaryOperator::Eq, left, right)
    }

    pub fn ne(left: Expression, right: Expression) -> Self {
        Expression::binary(BinaryOperator::Ne, left, right)
    }

    pub fn gte(left: Expression, right: Expression) -> Self {
        Expression::binary(BinaryOperator::Gte, left, right)
    }

    pub fn lte(left: Expression, right: Expression) -> Self {
        Expression::binary(BinaryOperator::Lte, left, right)
    }

    pub fn size(arg: Expression) -> Self {
        Expression::unary(UnaryOperator::Size, arg)
    }

    pub fn str_len_cp(arg: Expression) -> Self {
        Expression::unary(UnaryOperator::StrLenCP, arg)
    }

    pub fn to_lower(arg: Expression) -> Self {
        Expression::unary(UnaryOperator::ToLower, arg)
    }

    pub fn array_elem_at(array: Expression, index: Expression) -> Self {
        Expression::binary(BinaryOperator::ArrayElemAt, array, index)
    }

    pub fn if_null(value: Expression, replacement: Expression) -> Self {
        Expression::binary(BinaryOperator::IfNull, value, replacement)
    }

    pub fn cond(if_expr: Expression, then_expr: Expression, else_expr: Expression) -> Self {
        match if_expr.as_bool() {
            Some(true) => then_expr,
            Some(false) => else_expr,
            None => Expression::Cond(Cond {
                if_expr: boxed(if_expr),
                then_expr: boxed(then_expr),
                else_expr: boxed(else_expr),
            }),
        }
    }

    pub fn let_in(vars: Vec<LetVariable>, inside: Expression) -> Self {
        if vars.is_empty() {
            inside
        } else {
            Expression::Let(Let {
                vars,
                inside: boxed(inside),
            })
        }
    }

    /// Binds the optional variable produced by `use_var_if_not_simple`.
    pub fn let_if_some(var: Option<LetVariable>, inside: Expression) -> Self {
        Expression::let_in(var.into_iter().collect(), inside)
    }

    pub fn map(input: Expression, as_name: &str, inside: Expression) -> Self {
        Expression::Map(Map {
            input: boxed(input),
            as_name: as_name.to_string(),
            inside: boxed(inside),
        })
    }

    pub fn filter(input: Expression, as_name: &str, cond: Expression) -> Self {
        Expression::Filter(ArrayFilter {
            input: boxed(input),
            as_name: as_name.to_string(),
            cond: boxed(cond),
            limit: None,
        })
    }

    pub fn reduce(input: Expression, initial_value: Expression, inside: Expression) -> Self {
        Expression::Reduce(Reduce {
            input: boxed(input),
            initial_value: boxed(initial_value),
            inside: boxed(inside),
        })
    }

    pub fn zip(inputs: Vec<Expression>) -> Self {
        Expression::Zip(Zip {
            inputs,
            use_longest_length: false,
        })
    }

    pub fn range(start: Expression, end: Expression) -> Self {
        Expression::Range(Range {
            start: boxed(start),
            end: boxed(end),
            step: None,
        })
    }

    pub fn slice(input: Expression, position: Option<Expression>, n: Expression) -> Self {
        Expression::Slice(Slice {
            input: boxed(input),
            position: position.map(boxed),
            n: boxed(n),
        })
    }

    pub fn index_of(
        op: IndexOfOperator,
        input: Expression,
        search: Expression,
        start: Option<Expression>,
        end: Option<Expression>,
    ) -> Self {
        Expression::IndexOf(IndexOf {
            op,
            input: boxed(input),
            search: boxed(search),
            start: start.map(boxed),
            end: end.map(boxed),
        })
    }

    pub fn convert(input: Expression, to: ConvertTarget) -> Self {
        Expression::Convert(Convert {
            input: boxed(input),
            to,
            on_error: None,
            on_null: None,
        })
    }

    pub fn trim(op: TrimOperator, input: Expression, chars: Option<Expression>) -> Self {
        Expression::Trim(Trim {
            op,
            input: boxed(input),
            chars: chars.map(boxed),
        })
    }

    pub fn get_field(input: Expression, field: &str) -> Self {
        Expression::GetField(GetField {
            field: field.to_string(),
            input: boxed(input),
        })
    }

    pub fn document(fields: UniqueLinkedHashMap<String, Expression>) -> Self {
        Expression::Document(fields)
    }
}
