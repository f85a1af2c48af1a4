use super::{translated, MethodSignature, MethodTranslator, ParameterKind as P};
use crate::{
    ast::{self, UnaryOperator},
    expression::{DeclaringType, MethodCallExpression},
    translator::{ExpressionTranslator, Result, TranslatedExpression, TranslationContext},
};

const OVERLOADS: &[MethodSignature] = &[
    MethodSignature::static_method(DeclaringType::Enumerable, "Max", &[P::Sequence]),
    MethodSignature::static_method(DeclaringType::Enumerable, "Max", &[P::Sequence, P::Lambda(1)]),
    MethodSignature::static_method(DeclaringType::Enumerable, "Min", &[P::Sequence]),
    MethodSignature::static_method(DeclaringType::Enumerable, "Min", &[P::Sequence, P::Lambda(1)]),
];

pub(crate) struct MinMaxTranslator;

impl MethodTranslator for MinMaxTranslator {
    fn overloads(&self) -> &'static [MethodSignature] {
        OVERLOADS
    }

    fn translate(
        &self,
        translator: &ExpressionTranslator,
        context: &TranslationContext,
        call: &MethodCallExpression,
    ) -> Result<TranslatedExpression> {
        let source = translator.translate(context, &call.arguments[0])?;
        let item = source.serializer.item_serializer()?;
        let (values, serializer) = match call.arguments.get(1) {
            None => (source.ast, item),
            Some(selector) => {
                let (names, body) = translator.translate_lambda(context, selector, &[item])?;
                (ast::Expression::map(source.ast, &names[0], body.ast), body.serializer)
            }
        };
        let op = if call.method.name == "Max" {
            UnaryOperator::Max
        } else {
            UnaryOperator::Min
        };
        translated(call, ast::Expression::unary(op, values), serializer)
    }
}
