use super::{Error, ExpressionTranslator, Result, TranslatedExpression, TranslationContext};
use crate::{
    ast::{self, UnaryOperator},
    expression::{
        Expression, HostType, HostValue, MethodCallExpression, StringComparison,
    },
    serializer::SerializerRef,
};

/// The largest `$slice` count, used to mean "the rest of the array".
pub(crate) const MAX_SLICE_COUNT: i32 = i32::MAX;

/// Wraps `ast` in the conversion that turns a value the server computes as
/// `native` into the representation of `requested`. A server double already
/// satisfies a host single.
pub(crate) fn convert_numeric(ast: ast::Expression, native: &HostType, requested: &HostType) -> ast::Expression {
    let native = native.underlying_type();
    let requested = requested.underlying_type();
    if native == requested || (native == &HostType::Double && requested == &HostType::Single) {
        return ast;
    }
    let op = match requested {
        HostType::Decimal => UnaryOperator::ToDecimal,
        HostType::Double | HostType::Single => UnaryOperator::ToDouble,
        HostType::Int64 => UnaryOperator::ToLong,
        HostType::Int32 => UnaryOperator::ToInt,
        _ => return ast,
    };
    ast::Expression::unary(op, ast)
}

/// The type `$avg` computes: a decimal for decimal input and a double
/// otherwise.
pub(crate) fn native_average_type(value_type: &HostType) -> HostType {
    match value_type.underlying_type() {
        HostType::Decimal => HostType::Decimal,
        _ => HostType::Double,
    }
}

/// The type `$sum` computes, which is the input type except that singles
/// are summed as doubles.
pub(crate) fn native_sum_type(value_type: &HostType) -> HostType {
    match value_type.underlying_type() {
        HostType::Single => HostType::Double,
        ty => ty.clone(),
    }
}

/// Whether a comparison mode folds case. Culture-sensitive case-sensitive
/// modes have no server equivalent.
pub(crate) fn ignore_case(comparison: StringComparison) -> Result<bool> {
    match comparison {
        StringComparison::Ordinal => Ok(false),
        StringComparison::OrdinalIgnoreCase
        | StringComparison::CurrentCultureIgnoreCase
        | StringComparison::InvariantCultureIgnoreCase => Ok(true),
        StringComparison::CurrentCulture | StringComparison::InvariantCulture => {
            Err(Error::UnsupportedStringComparison(comparison))
        }
    }
}

/// The value of an argument that must be known at translation time.
pub(crate) fn constant_argument<'a>(call: &MethodCallExpression, argument: &'a Expression) -> Result<&'a HostValue> {
    argument
        .as_constant()
        .ok_or_else(|| Error::NonConstantArgument(call.to_string(), argument.to_string()))
}

pub(crate) fn comparison_argument(call: &MethodCallExpression, argument: &Expression) -> Result<StringComparison> {
    match constant_argument(call, argument)? {
        HostValue::StringComparison(c) => Ok(*c),
        _ => Err(Error::NonConstantArgument(call.to_string(), argument.to_string())),
    }
}

pub(crate) fn bool_argument(call: &MethodCallExpression, argument: &Expression) -> Result<bool> {
    match constant_argument(call, argument)? {
        HostValue::Boolean(b) => Ok(*b),
        _ => Err(Error::NonConstantArgument(call.to_string(), argument.to_string())),
    }
}

/// The characters of a constant char, char array or string argument.
pub(crate) fn chars_argument(call: &MethodCallExpression, argument: &Expression) -> Result<Vec<char>> {
    let value = match argument {
        Expression::NewArray(array) => {
            return array
                .elements
                .iter()
                .map(|e| match constant_argument(call, e)? {
                    HostValue::Char(c) => Ok(*c),
                    _ => Err(Error::NonConstantArgument(call.to_string(), e.to_string())),
                })
                .collect();
        }
        argument => constant_argument(call, argument)?,
    };
    match value {
        HostValue::Char(c) => Ok(vec![*c]),
        HostValue::String(s) => Ok(s.chars().collect()),
        HostValue::Array(items) => items
            .iter()
            .map(|item| match item {
                HostValue::Char(c) => Ok(*c),
                _ => Err(Error::NonConstantArgument(call.to_string(), argument.to_string())),
            })
            .collect(),
        _ => Err(Error::NonConstantArgument(call.to_string(), argument.to_string())),
    }
}

/// Translates a string-valued argument. Chars are strings on the server
/// side of a string operation, so char constants become one-character
/// strings; other chars cannot be used.
pub(crate) fn translate_string_argument(
    translator: &ExpressionTranslator,
    context: &TranslationContext,
    call: &MethodCallExpression,
    argument: &Expression,
) -> Result<ast::Expression> {
    match argument.ty() {
        HostType::Char => match constant_argument(call, argument)? {
            HostValue::Char(c) => Ok(ast::Expression::constant(c.to_string())),
            _ => Err(Error::NonConstantArgument(call.to_string(), argument.to_string())),
        },
        _ => Ok(translator.translate(context, argument)?.ast),
    }
}

/// Translates `operand`, serializing it with `serializer` when it is a
/// constant so that it compares equal to values stored with that
/// serializer.
pub(crate) fn translate_comparand(
    translator: &ExpressionTranslator,
    context: &TranslationContext,
    operand: &Expression,
    serializer: &SerializerRef,
) -> Result<ast::Expression> {
    match operand {
        Expression::Constant(c) => Ok(ast::Expression::constant(serializer.serialize_value(&c.value)?)),
        operand => Ok(translator.translate(context, operand)?.ast),
    }
}

/// Translates two operands that are compared with each other. A constant
/// on either side is serialized with the serializer of the other side.
pub(crate) fn translate_comparands(
    translator: &ExpressionTranslator,
    context: &TranslationContext,
    left: &Expression,
    right: &Expression,
) -> Result<(TranslatedExpression, ast::Expression)> {
    match (left, right) {
        (Expression::Constant(_), right) if !matches!(right, Expression::Constant(_)) => {
            let right = translator.translate(context, right)?;
            let left_ast = translate_comparand(translator, context, left, &right.serializer)?;
            let left = TranslatedExpression {
                expression: left.clone(),
                ast: left_ast,
                serializer: right.serializer.clone(),
            };
            Ok((left, right.ast))
        }
        (left, right) => {
            let left = translator.translate(context, left)?;
            let right = translate_comparand(translator, context, right, &left.serializer)?;
            Ok((left, right))
        }
    }
}

/// Binds `expression` to a fresh variable unless it is simple. Returns the
/// expression to use, the binding to wrap around the result and the
/// context in which the binding's name is reserved.
pub(crate) fn bind_if_not_simple(
    context: &TranslationContext,
    base: &str,
    expression: ast::Expression,
) -> (ast::Expression, Option<ast::LetVariable>, TranslationContext) {
    if expression.is_simple() {
        return (expression, None, context.clone());
    }
    let name = context.unique_variable_name(base);
    let (reference, binding) = ast::Expression::use_var_if_not_simple(&name, expression);
    (reference, binding, context.with_variable_name(&name))
}

/// The default value of a non-nullable value type, if it has one.
pub(crate) fn default_value(ty: &HostType) -> Option<bson::Bson> {
    match ty {
        HostType::Boolean => Some(bson::Bson::Boolean(false)),
        HostType::Char | HostType::Int32 => Some(bson::Bson::Int32(0)),
        HostType::Int64 => Some(bson::Bson::Int64(0)),
        HostType::Single | HostType::Double => Some(bson::Bson::Double(0.0)),
        HostType::Decimal => crate::serializer::parse_decimal("0")
            .ok()
            .map(bson::Bson::Decimal128),
        _ => None,
    }
}
