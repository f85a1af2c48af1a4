use super::{translated, MethodSignature, MethodTranslator, ParameterKind as P};
use crate::{
    ast::{self, BinaryOperator, NaryOperator, UnaryOperator},
    expression::{DeclaringType, MethodCallExpression},
    serializer::ArraySerializer,
    translator::{Error, ExpressionTranslator, Result, TranslatedExpression, TranslationContext},
};
use std::sync::Arc;

const OVERLOADS: &[MethodSignature] = &[
    MethodSignature::static_method(DeclaringType::Enumerable, "Concat", &[P::Sequence, P::Sequence]),
    MethodSignature::static_method(DeclaringType::Enumerable, "Union", &[P::Sequence, P::Sequence]),
    MethodSignature::static_method(DeclaringType::Enumerable, "Intersect", &[P::Sequence, P::Sequence]),
    MethodSignature::static_method(DeclaringType::Enumerable, "Except", &[P::Sequence, P::Sequence]),
    MethodSignature::static_method(DeclaringType::Enumerable, "Distinct", &[P::Sequence]),
    MethodSignature::static_method(DeclaringType::Enumerable, "Reverse", &[P::Sequence]),
];

/// Whole-array operations. Set operators do not preserve item order.
pub(crate) struct SetOperationsTranslator;

impl MethodTranslator for SetOperationsTranslator {
    fn overloads(&self) -> &'static [MethodSignature] {
        OVERLOADS
    }

    fn translate(
        &self,
        translator: &ExpressionTranslator,
        context: &TranslationContext,
        call: &MethodCallExpression,
    ) -> Result<TranslatedExpression> {
        let first = translator.translate(context, &call.arguments[0])?;
        let item = first.serializer.item_serializer()?;
        let second = call
            .arguments
            .get(1)
            .map(|second| translator.translate(context, second))
            .transpose()?
            .map(|second| second.ast);
        let ast = match (call.method.name.as_str(), second) {
            ("Concat", Some(second)) => ast::Expression::nary(NaryOperator::ConcatArrays, vec![first.ast, second]),
            ("Union", Some(second)) => ast::Expression::nary(NaryOperator::SetUnion, vec![first.ast, second]),
            ("Intersect", Some(second)) => {
                ast::Expression::nary(NaryOperator::SetIntersection, vec![first.ast, second])
            }
            ("Except", Some(second)) => ast::Expression::binary(BinaryOperator::SetDifference, first.ast, second),
            ("Distinct", None) => ast::Expression::nary(NaryOperator::SetUnion, vec![first.ast]),
            ("Reverse", None) => ast::Expression::unary(UnaryOperator::ReverseArray, first.ast),
            _ => return Err(Error::MethodNotSupported(call.to_string())),
        };
        translated(call, ast, Arc::new(ArraySerializer::enumerable(item)))
    }
}
