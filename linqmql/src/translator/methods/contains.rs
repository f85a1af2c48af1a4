use super::{arguments, translated, MethodSignature, MethodTranslator, ParameterKind as P};
use crate::{
    ast::{self, BinaryOperator},
    expression::{DeclaringType, HostType, MethodCallExpression},
    translator::{utils, ExpressionTranslator, Result, TranslatedExpression, TranslationContext},
};

const OVERLOADS: &[MethodSignature] = &[
    MethodSignature::static_method(DeclaringType::Enumerable, "Contains", &[P::Sequence, P::Any]),
    MethodSignature::instance(DeclaringType::List, "Contains", &[P::Any]),
];

pub(crate) struct ContainsTranslator;

impl MethodTranslator for ContainsTranslator {
    fn overloads(&self) -> &'static [MethodSignature] {
        OVERLOADS
    }

    fn translate(
        &self,
        translator: &ExpressionTranslator,
        context: &TranslationContext,
        call: &MethodCallExpression,
    ) -> Result<TranslatedExpression> {
        let args = arguments(call);
        let source = translator.translate(context, args[0])?;
        let item = source.serializer.item_serializer()?;
        let value = utils::translate_comparand(translator, context, args[1], &item)?;
        translated(
            call,
            ast::Expression::binary(BinaryOperator::In, value, source.ast),
            context.serializer_for(&HostType::Boolean)?,
        )
    }
}
