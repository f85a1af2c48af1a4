//! Projection and filtering of arrays. The indexed overloads pair each item
//! with its position by zipping the source with `$range`.

use super::{translated, MethodSignature, MethodTranslator, ParameterKind as P};
use crate::{
    ast::{self, NaryOperator},
    expression::{DeclaringType, Expression, HostType, MethodCallExpression},
    serializer::{ArraySerializer, SerializerRef},
    translator::{utils, ExpressionTranslator, Result, TranslatedExpression, TranslationContext},
};
use std::sync::Arc;

const SELECT_OVERLOADS: &[MethodSignature] = &[
    MethodSignature::static_method(DeclaringType::Enumerable, "Select", &[P::Sequence, P::Lambda(1)]),
    MethodSignature::static_method(DeclaringType::Enumerable, "Select", &[P::Sequence, P::Lambda(2)]),
];

const WHERE_OVERLOADS: &[MethodSignature] = &[
    MethodSignature::static_method(DeclaringType::Enumerable, "Where", &[P::Sequence, P::Lambda(1)]),
    MethodSignature::static_method(DeclaringType::Enumerable, "Where", &[P::Sequence, P::Lambda(2)]),
];

const SELECT_MANY_OVERLOADS: &[MethodSignature] = &[MethodSignature::static_method(
    DeclaringType::Enumerable,
    "SelectMany",
    &[P::Sequence, P::Lambda(1)],
)];

pub(crate) struct SelectTranslator;

pub(crate) struct WhereTranslator;

pub(crate) struct SelectManyTranslator;

/// The pairs of `[item, index]` the indexed overloads iterate over, bound to
/// a fresh variable name, and the context reserving that name.
struct IndexedSource {
    pairs: ast::Expression,
    pair: String,
    binding: Option<ast::LetVariable>,
    context: TranslationContext,
}

fn indexed_source(context: &TranslationContext, source: ast::Expression) -> IndexedSource {
    let (source, binding, context) = utils::bind_if_not_simple(context, "source", source);
    let pair = context.unique_variable_name("pair");
    let indexes = ast::Expression::range(ast::Expression::constant(0), ast::Expression::size(source.clone()));
    IndexedSource {
        pairs: ast::Expression::zip(vec![source, indexes]),
        context: context.with_variable_name(&pair),
        pair,
        binding,
    }
}

/// Translates an indexed lambda with its parameters bound to the two
/// halves of the current pair.
fn translate_indexed_lambda(
    translator: &ExpressionTranslator,
    indexed: &IndexedSource,
    lambda: &Expression,
    item: SerializerRef,
) -> Result<TranslatedExpression> {
    let pair = ast::Expression::var(&indexed.pair);
    translator.translate_lambda_with(
        &indexed.context,
        lambda,
        vec![
            (ast::Expression::array_elem_at(pair.clone(), ast::Expression::constant(0)), item),
            (
                ast::Expression::array_elem_at(pair, ast::Expression::constant(1)),
                indexed.context.serializer_for(&HostType::Int32)?,
            ),
        ],
    )
}

impl MethodTranslator for SelectTranslator {
    fn overloads(&self) -> &'static [MethodSignature] {
        SELECT_OVERLOADS
    }

    fn translate(
        &self,
        translator: &ExpressionTranslator,
        context: &TranslationContext,
        call: &MethodCallExpression,
    ) -> Result<TranslatedExpression> {
        let source = translator.translate(context, &call.arguments[0])?;
        let item = source.serializer.item_serializer()?;
        let selector = &call.arguments[1];
        let (ast, body) = if call.method.parameters[1].function_parameters().map(<[_]>::len) == Some(2) {
            let indexed = indexed_source(context, source.ast);
            let body = translate_indexed_lambda(translator, &indexed, selector, item)?;
            let map = ast::Expression::map(indexed.pairs, &indexed.pair, body.ast.clone());
            (ast::Expression::let_if_some(indexed.binding, map), body)
        } else {
            let (names, body) = translator.translate_lambda(context, selector, &[item])?;
            (ast::Expression::map(source.ast, &names[0], body.ast.clone()), body)
        };
        translated(call, ast, Arc::new(ArraySerializer::enumerable(body.serializer)))
    }
}

impl MethodTranslator for WhereTranslator {
    fn overloads(&self) -> &'static [MethodSignature] {
        WHERE_OVERLOADS
    }

    fn translate(
        &self,
        translator: &ExpressionTranslator,
        context: &TranslationContext,
        call: &MethodCallExpression,
    ) -> Result<TranslatedExpression> {
        let source = translator.translate(context, &call.arguments[0])?;
        let item = source.serializer.item_serializer()?;
        let predicate = &call.arguments[1];
        let ast = if call.method.parameters[1].function_parameters().map(<[_]>::len) == Some(2) {
            let indexed = indexed_source(context, source.ast);
            let body = translate_indexed_lambda(translator, &indexed, predicate, item.clone())?;
            let kept = ast::Expression::filter(indexed.pairs, &indexed.pair, body.ast);
            let items = ast::Expression::map(
                kept,
                &indexed.pair,
                ast::Expression::array_elem_at(ast::Expression::var(&indexed.pair), ast::Expression::constant(0)),
            );
            ast::Expression::let_if_some(indexed.binding, items)
        } else {
            let (names, body) = translator.translate_lambda(context, predicate, &[item.clone()])?;
            ast::Expression::filter(source.ast, &names[0], body.ast)
        };
        translated(call, ast, Arc::new(ArraySerializer::enumerable(item)))
    }
}

impl MethodTranslator for SelectManyTranslator {
    fn overloads(&self) -> &'static [MethodSignature] {
        SELECT_MANY_OVERLOADS
    }

    /// Maps each item to its array, then concatenates the arrays with
    /// `$reduce`.
    fn translate(
        &self,
        translator: &ExpressionTranslator,
        context: &TranslationContext,
        call: &MethodCallExpression,
    ) -> Result<TranslatedExpression> {
        let source = translator.translate(context, &call.arguments[0])?;
        let item = source.serializer.item_serializer()?;
        let (names, body) = translator.translate_lambda(context, &call.arguments[1], &[item])?;
        let arrays = ast::Expression::map(source.ast, &names[0], body.ast);
        let ast = ast::Expression::reduce(
            arrays,
            ast::Expression::Array(vec![]),
            ast::Expression::nary(
                NaryOperator::ConcatArrays,
                vec![ast::Expression::var("value"), ast::Expression::var("this")],
            ),
        );
        let result_item = body.serializer.item_serializer()?;
        translated(call, ast, Arc::new(ArraySerializer::enumerable(result_item)))
    }
}
