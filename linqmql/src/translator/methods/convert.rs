use super::{translated, MethodSignature, MethodTranslator, ParameterKind as P};
use crate::{
    ast::{self, ConvertTarget, UnaryOperator},
    expression::{DeclaringType, HostType, MethodCallExpression},
    translator::{Error, ExpressionTranslator, Result, TranslatedExpression, TranslationContext},
};

const TO_STRING_OVERLOADS: &[MethodSignature] = &[MethodSignature::any_instance("ToString", &[])];

const CONVERT_OVERLOADS: &[MethodSignature] = &[
    MethodSignature::static_method(DeclaringType::Convert, "ToBoolean", &[P::Any]),
    MethodSignature::static_method(DeclaringType::Convert, "ToDateTime", &[P::Any]),
    MethodSignature::static_method(DeclaringType::Convert, "ToDecimal", &[P::Any]),
    MethodSignature::static_method(DeclaringType::Convert, "ToDouble", &[P::Any]),
    MethodSignature::static_method(DeclaringType::Convert, "ToInt32", &[P::Any]),
    MethodSignature::static_method(DeclaringType::Convert, "ToInt64", &[P::Any]),
    MethodSignature::static_method(DeclaringType::Convert, "ToString", &[P::Any]),
    MethodSignature::static_method(DeclaringType::Int32, "Parse", &[P::String]),
    MethodSignature::static_method(DeclaringType::Int64, "Parse", &[P::String]),
    MethodSignature::static_method(DeclaringType::Double, "Parse", &[P::String]),
    MethodSignature::static_method(DeclaringType::Decimal, "Parse", &[P::String]),
];

pub(crate) struct ToStringTranslator;

/// `Convert.ToX` and `X.Parse` with `$convert` to the method's return type.
pub(crate) struct ConvertTranslator;

impl MethodTranslator for ToStringTranslator {
    fn overloads(&self) -> &'static [MethodSignature] {
        TO_STRING_OVERLOADS
    }

    fn translate(
        &self,
        translator: &ExpressionTranslator,
        context: &TranslationContext,
        call: &MethodCallExpression,
    ) -> Result<TranslatedExpression> {
        let object = call
            .object
            .as_deref()
            .ok_or_else(|| Error::MethodNotSupported(call.to_string()))?;
        let value = translator.translate(context, object)?;
        let ast = match object.ty() {
            HostType::String => value.ast,
            _ => ast::Expression::unary(UnaryOperator::ToString, value.ast),
        };
        translated(call, ast, context.serializer_for(&HostType::String)?)
    }
}

impl MethodTranslator for ConvertTranslator {
    fn overloads(&self) -> &'static [MethodSignature] {
        CONVERT_OVERLOADS
    }

    fn translate(
        &self,
        translator: &ExpressionTranslator,
        context: &TranslationContext,
        call: &MethodCallExpression,
    ) -> Result<TranslatedExpression> {
        let to = match call.method.return_type {
            HostType::Boolean => ConvertTarget::Bool,
            HostType::DateTime => ConvertTarget::Date,
            HostType::Decimal => ConvertTarget::Decimal,
            HostType::Double => ConvertTarget::Double,
            HostType::Int32 => ConvertTarget::Int,
            HostType::Int64 => ConvertTarget::Long,
            HostType::String => ConvertTarget::String,
            _ => return Err(Error::MethodNotSupported(call.to_string())),
        };
        let value = translator.translate(context, &call.arguments[0])?;
        translated(
            call,
            ast::Expression::convert(value.ast, to),
            context.serializer_for(&call.method.return_type)?,
        )
    }
}
