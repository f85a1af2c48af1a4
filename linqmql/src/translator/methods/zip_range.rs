use super::{translated, MethodSignature, MethodTranslator, ParameterKind as P};
use crate::{
    ast,
    expression::{DeclaringType, HostType, MethodCallExpression},
    serializer::ArraySerializer,
    translator::{utils, ExpressionTranslator, Result, TranslatedExpression, TranslationContext},
};
use std::sync::Arc;

const ZIP_OVERLOADS: &[MethodSignature] = &[MethodSignature::static_method(
    DeclaringType::Enumerable,
    "Zip",
    &[P::Sequence, P::Sequence, P::Lambda(2)],
)];

const RANGE_OVERLOADS: &[MethodSignature] = &[MethodSignature::static_method(
    DeclaringType::Enumerable,
    "Range",
    &[P::Int32, P::Int32],
)];

/// `Zip(first, second, selector)` maps over `$zip` pairs, which stop at the
/// shorter input.
pub(crate) struct ZipTranslator;

/// `Range(start, count)` is `$range` from `start` up to `start + count`.
pub(crate) struct RangeTranslator;

impl MethodTranslator for ZipTranslator {
    fn overloads(&self) -> &'static [MethodSignature] {
        ZIP_OVERLOADS
    }

    fn translate(
        &self,
        translator: &ExpressionTranslator,
        context: &TranslationContext,
        call: &MethodCallExpression,
    ) -> Result<TranslatedExpression> {
        let first = translator.translate(context, &call.arguments[0])?;
        let second = translator.translate(context, &call.arguments[1])?;
        let pair = context.unique_variable_name("pair");
        let inner = context.with_variable_name(&pair);
        let pair_ref = ast::Expression::var(&pair);
        let body = translator.translate_lambda_with(
            &inner,
            &call.arguments[2],
            vec![
                (
                    ast::Expression::array_elem_at(pair_ref.clone(), ast::Expression::constant(0)),
                    first.serializer.item_serializer()?,
                ),
                (
                    ast::Expression::array_elem_at(pair_ref, ast::Expression::constant(1)),
                    second.serializer.item_serializer()?,
                ),
            ],
        )?;
        let ast = ast::Expression::map(ast::Expression::zip(vec![first.ast, second.ast]), &pair, body.ast);
        translated(call, ast, Arc::new(ArraySerializer::enumerable(body.serializer)))
    }
}

impl MethodTranslator for RangeTranslator {
    fn overloads(&self) -> &'static [MethodSignature] {
        RANGE_OVERLOADS
    }

    fn translate(
        &self,
        translator: &ExpressionTranslator,
        context: &TranslationContext,
        call: &MethodCallExpression,
    ) -> Result<TranslatedExpression> {
        let start = translator.translate(context, &call.arguments[0])?;
        let count = translator.translate(context, &call.arguments[1])?;
        let (start_ast, binding, _) = utils::bind_if_not_simple(context, "start", start.ast);
        let end = ast::Expression::add(vec![start_ast.clone(), count.ast]);
        let ast = ast::Expression::let_if_some(binding, ast::Expression::range(start_ast, end));
        translated(
            call,
            ast,
            Arc::new(ArraySerializer::enumerable(context.serializer_for(&HostType::Int32)?)),
        )
    }
}
