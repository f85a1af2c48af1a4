use super::{translated, MethodSignature, MethodTranslator, ParameterKind as P};
use crate::{
    ast,
    expression::{DeclaringType, MethodCallExpression},
    translator::{ExpressionTranslator, Result, TranslatedExpression, TranslationContext},
};

const OVERLOADS: &[MethodSignature] = &[
    MethodSignature::static_method(DeclaringType::Enumerable, "Count", &[P::Sequence]),
    MethodSignature::static_method(DeclaringType::Enumerable, "Count", &[P::Sequence, P::Lambda(1)]),
    MethodSignature::static_method(DeclaringType::Enumerable, "LongCount", &[P::Sequence]),
    MethodSignature::static_method(DeclaringType::Enumerable, "LongCount", &[P::Sequence, P::Lambda(1)]),
];

pub(crate) struct CountTranslator;

impl MethodTranslator for CountTranslator {
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
        let items = match call.arguments.get(1) {
            None => source.ast,
            Some(predicate) => {
                let item = source.serializer.item_serializer()?;
                let (names, body) = translator.translate_lambda(context, predicate, &[item])?;
                ast::Expression::filter(source.ast, &names[0], body.ast)
            }
        };
        translated(
            call,
            ast::Expression::size(items),
            context.serializer_for(&call.method.return_type)?,
        )
    }
}
