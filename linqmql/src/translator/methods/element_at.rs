use super::{translated, MethodSignature, MethodTranslator, ParameterKind as P};
use crate::{
    ast,
    expression::{DeclaringType, MethodCallExpression},
    translator::{utils, ExpressionTranslator, Result, TranslatedExpression, TranslationContext},
};

const OVERLOADS: &[MethodSignature] = &[
    MethodSignature::static_method(DeclaringType::Enumerable, "First", &[P::Sequence]),
    MethodSignature::static_method(DeclaringType::Enumerable, "First", &[P::Sequence, P::Lambda(1)]),
    MethodSignature::static_method(DeclaringType::Enumerable, "FirstOrDefault", &[P::Sequence]),
    MethodSignature::static_method(DeclaringType::Enumerable, "FirstOrDefault", &[P::Sequence, P::Lambda(1)]),
    MethodSignature::static_method(DeclaringType::Enumerable, "Last", &[P::Sequence]),
    MethodSignature::static_method(DeclaringType::Enumerable, "Last", &[P::Sequence, P::Lambda(1)]),
    MethodSignature::static_method(DeclaringType::Enumerable, "LastOrDefault", &[P::Sequence]),
    MethodSignature::static_method(DeclaringType::Enumerable, "LastOrDefault", &[P::Sequence, P::Lambda(1)]),
    MethodSignature::static_method(DeclaringType::Enumerable, "ElementAt", &[P::Sequence, P::Int32]),
    MethodSignature::static_method(DeclaringType::Enumerable, "ElementAtOrDefault", &[P::Sequence, P::Int32]),
];

/// Positional access with `$arrayElemAt`. `First` and `Last` read index 0
/// and -1, after filtering when a predicate is given. A missing element of
/// a value type defaults with `$ifNull`.
pub(crate) struct ElementAtTranslator;

impl MethodTranslator for ElementAtTranslator {
    fn overloads(&self) -> &'static [MethodSignature] {
        OVERLOADS
    }

    fn translate(
        &self,
        translator: &ExpressionTranslator,
        context: &TranslationContext,
        call: &MethodCallExpression,
    ) -> Result<TranslatedExpression> {
        let name = call.method.name.as_str();
        let source = translator.translate(context, &call.arguments[0])?;
        let item = source.serializer.item_serializer()?;
        let end = || ast::Expression::constant(if name.starts_with("Last") { -1 } else { 0 });
        let (array, index) = match call.arguments.get(1) {
            Some(index) if name.starts_with("ElementAt") => {
                (source.ast, translator.translate(context, index)?.ast)
            }
            Some(predicate) => {
                let (names, body) = translator.translate_lambda(context, predicate, &[item.clone()])?;
                (ast::Expression::filter(source.ast, &names[0], body.ast), end())
            }
            None => (source.ast, end()),
        };
        let mut ast = ast::Expression::array_elem_at(array, index);
        if name.ends_with("OrDefault") {
            if let Some(default) = utils::default_value(&call.method.return_type) {
                ast = ast::Expression::if_null(ast, ast::Expression::constant(default));
            }
        }
        translated(call, ast, item)
    }
}
