use super::{translated, MethodSignature, MethodTranslator, ParameterKind as P};
use crate::{
    ast::{self, BinaryOperator, UnaryOperator},
    expression::{DeclaringType, HostType, MethodCallExpression},
    translator::{ExpressionTranslator, Result, TranslatedExpression, TranslationContext},
};

const OVERLOADS: &[MethodSignature] = &[
    MethodSignature::static_method(DeclaringType::Enumerable, "Any", &[P::Sequence]),
    MethodSignature::static_method(DeclaringType::Enumerable, "Any", &[P::Sequence, P::Lambda(1)]),
    MethodSignature::static_method(DeclaringType::Enumerable, "All", &[P::Sequence, P::Lambda(1)]),
];

pub(crate) struct AnyAllTranslator;

impl MethodTranslator for AnyAllTranslator {
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
        let ast = match call.arguments.get(1) {
            None => ast::Expression::binary(
                BinaryOperator::Gt,
                ast::Expression::size(source.ast),
                ast::Expression::constant(0),
            ),
            Some(predicate) => {
                let item = source.serializer.item_serializer()?;
                let (names, body) = translator.translate_lambda(context, predicate, &[item])?;
                let op = if call.method.name == "All" {
                    UnaryOperator::AllElementsTrue
                } else {
                    UnaryOperator::AnyElementTrue
                };
                ast::Expression::unary(op, ast::Expression::map(source.ast, &names[0], body.ast))
            }
        };
        translated(call, ast, context.serializer_for(&HostType::Boolean)?)
    }
}
