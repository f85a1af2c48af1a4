//! Constructors for host expression trees. Host programs normally hand the
//! compiler a tree built by their own compiler; these helpers build the
//! same shapes directly.

use super::*;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_PARAMETER_ID: AtomicU64 = AtomicU64::new(1);

/// Creates a parameter with a fresh identity. Two parameters created with
/// the same name are distinct.
pub fn parameter(name: &str, ty: HostType) -> ParameterExpression {
    ParameterExpression {
        id: ParameterId(NEXT_PARAMETER_ID.fetch_add(1, Ordering::Relaxed)),
        name: name.to_string(),
        ty,
    }
}

pub fn param(p: &ParameterExpression) -> Expression {
    Expression::Parameter(p.clone())
}

pub fn constant(value: HostValue, ty: HostType) -> Expression {
    Expression::Constant(ConstantExpression { value, ty })
}

pub fn null(ty: HostType) -> Expression {
    constant(HostValue::Null, ty)
}

pub fn boolean(b: bool) -> Expression {
    constant(HostValue::Boolean(b), HostType::Boolean)
}

pub fn int(i: i32) -> Expression {
    constant(HostValue::Int32(i), HostType::Int32)
}

pub fn long(i: i64) -> Expression {
    constant(HostValue::Int64(i), HostType::Int64)
}

pub fn double(x: f64) -> Expression {
    constant(HostValue::Double(x), HostType::Double)
}

pub fn string(s: &str) -> Expression {
    constant(HostValue::String(s.to_string()), HostType::String)
}

pub fn character(c: char) -> Expression {
    constant(HostValue::Char(c), HostType::Char)
}

pub fn comparison(c: StringComparison) -> Expression {
    constant(HostValue::StringComparison(c), HostType::StringComparison)
}

pub fn split_options(o: StringSplitOptions) -> Expression {
    constant(HostValue::StringSplitOptions(o), HostType::StringSplitOptions)
}

pub fn member(target: Expression, name: &str, ty: HostType) -> Expression {
    Expression::MemberAccess(MemberExpression {
        member: MemberInfo {
            declaring_type: target.ty(),
            name: name.to_string(),
            ty,
        },
        expression: Some(Box::new(target)),
    })
}

pub fn static_member(declaring_type: HostType, name: &str, ty: HostType) -> Expression {
    Expression::MemberAccess(MemberExpression {
        member: MemberInfo {
            declaring_type,
            name: name.to_string(),
            ty,
        },
        expression: None,
    })
}

pub fn method(
    declaring_type: DeclaringType,
    name: &str,
    parameters: Vec<HostType>,
    return_type: HostType,
    is_static: bool,
) -> MethodInfo {
    MethodInfo {
        declaring_type,
        name: name.to_string(),
        parameters,
        return_type,
        is_static,
    }
}

/// An instance call whose parameter types are taken from the arguments.
pub fn call_instance(
    object: Expression,
    declaring_type: DeclaringType,
    name: &str,
    arguments: Vec<Expression>,
    return_type: HostType,
) -> Expression {
    let parameters = arguments.iter().map(Expression::ty).collect();
    Expression::MethodCall(MethodCallExpression {
        object: Some(Box::new(object)),
        method: method(declaring_type, name, parameters, return_type, false),
        arguments,
    })
}

/// A static or extension call whose parameter types are taken from the
/// arguments.
pub fn call_static(
    declaring_type: DeclaringType,
    name: &str,
    arguments: Vec<Expression>,
    return_type: HostType,
) -> Expression {
    let parameters = arguments.iter().map(Expression::ty).collect();
    Expression::MethodCall(MethodCallExpression {
        object: None,
        method: method(declaring_type, name, parameters, return_type, true),
        arguments,
    })
}

pub fn lambda(parameters: Vec<ParameterExpression>, body: Expression) -> Expression {
    Expression::Lambda(LambdaExpression {
        parameters,
        body: Box::new(body),
    })
}

pub fn quote(lambda: Expression) -> Expression {
    let ty = lambda.ty();
    Expression::Unary(UnaryExpression {
        op: UnaryOperator::Quote,
        operand: Box::new(lambda),
        ty,
    })
}

pub fn binary(op: BinaryOperator, left: Expression, right: Expression, ty: HostType) -> Expression {
    Expression::Binary(BinaryExpression {
        op,
        left: Box::new(left),
        right: Box::new(right),
        ty,
    })
}

/// Arithmetic whose result has the left operand's type.
pub fn arithmetic(op: BinaryOperator, left: Expression, right: Expression) -> Expression {
    let ty = left.ty();
    binary(op, left, right, ty)
}

pub fn compare(op: BinaryOperator, left: Expression, right: Expression) -> Expression {
    binary(op, left, right, HostType::Boolean)
}

pub fn and_also(left: Expression, right: Expression) -> Expression {
    binary(BinaryOperator::AndAlso, left, right, HostType::Boolean)
}

pub fn or_else(left: Expression, right: Expression) -> Expression {
    binary(BinaryOperator::OrElse, left, right, HostType::Boolean)
}

pub fn coalesce(left: Expression, right: Expression) -> Expression {
    let ty = right.ty();
    binary(BinaryOperator::Coalesce, left, right, ty)
}

pub fn array_index(array: Expression, index: Expression) -> Expression {
    let ty = array
        .ty()
        .item_type()
        .cloned()
        .unwrap_or(HostType::Object);
    binary(BinaryOperator::ArrayIndex, array, index, ty)
}

pub fn unary(op: UnaryOperator, operand: Expression, ty: HostType) -> Expression {
    Expression::Unary(UnaryExpression {
        op,
        operand: Box::new(operand),
        ty,
    })
}

pub fn not(operand: Expression) -> Expression {
    unary(UnaryOperator::Not, operand, HostType::Boolean)
}

pub fn negate(operand: Expression) -> Expression {
    let ty = operand.ty();
    unary(UnaryOperator::Negate, operand, ty)
}

pub fn convert(operand: Expression, ty: HostType) -> Expression {
    unary(UnaryOperator::Convert, operand, ty)
}

pub fn conditional(test: Expression, if_true: Expression, if_false: Expression) -> Expression {
    let ty = if_true.ty();
    Expression::Conditional(ConditionalExpression {
        test: Box::new(test),
        if_true: Box::new(if_true),
        if_false: Box::new(if_false),
        ty,
    })
}

pub fn new_array(element_type: HostType, elements: Vec<Expression>) -> Expression {
    Expression::NewArray(NewArrayExpression {
        element_type,
        elements,
    })
}

/// `new { A = a, B = b }`, typed as an anonymous type over the member
/// expression types.
pub fn new_anonymous(members: Vec<(&str, Expression)>) -> Expression {
    let members: Vec<(String, Expression)> = members
        .into_iter()
        .map(|(name, e)| (name.to_string(), e))
        .collect();
    let ty = HostType::Anonymous(
        members
            .iter()
            .map(|(name, e)| (name.clone(), e.ty()))
            .collect(),
    );
    Expression::New(NewExpression { ty, members })
}

pub fn new_object(ty: HostType, members: Vec<(&str, Expression)>) -> Expression {
    Expression::New(NewExpression {
        ty,
        members: members
            .into_iter()
            .map(|(name, e)| (name.to_string(), e))
            .collect(),
    })
}

pub fn queryable(collection: &str, document_type: HostType) -> Expression {
    Expression::Queryable(QueryableExpression {
        collection: collection.to_string(),
        document_type,
    })
}
