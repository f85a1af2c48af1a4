use super::{translated, MethodSignature, MethodTranslator, ParameterKind as P};
use crate::{
    ast::{self, LetVariable},
    expression::{DeclaringType, Expression, MethodCallExpression},
    serializer::SerializerRef,
    translator::{utils, Error, ExpressionTranslator, Result, TranslatedExpression, TranslationContext},
};

const OVERLOADS: &[MethodSignature] = &[
    MethodSignature::static_method(DeclaringType::Enumerable, "Aggregate", &[P::Sequence, P::Lambda(2)]),
    MethodSignature::static_method(DeclaringType::Enumerable, "Aggregate", &[P::Sequence, P::Any, P::Lambda(2)]),
    MethodSignature::static_method(
        DeclaringType::Enumerable,
        "Aggregate",
        &[P::Sequence, P::Any, P::Lambda(2), P::Lambda(1)],
    ),
];

/// Translates a folding lambda with its parameters bound to their own
/// variables, set from `$$value` and `$$this` on entry. A nested `$reduce`
/// rebinds `$$value` and `$$this`, so the body never refers to them
/// directly.
fn translate_fold(
    translator: &ExpressionTranslator,
    context: &TranslationContext,
    func: &Expression,
    accumulator: SerializerRef,
    item: SerializerRef,
) -> Result<ast::Expression> {
    let (names, body) = translator.translate_lambda(context, func, &[accumulator, item])?;
    let vars = names
        .into_iter()
        .zip(["value", "this"])
        .map(|(name, reduce_var)| LetVariable {
            name,
            value: Box::new(ast::Expression::var(reduce_var)),
        })
        .collect();
    Ok(ast::Expression::let_in(vars, body.ast))
}

/// `Aggregate` folds with `$reduce`. Without a seed the first item seeds
/// the fold over the rest, and a source of at most one item yields its
/// first item.
pub(crate) struct AggregateTranslator;

impl MethodTranslator for AggregateTranslator {
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
        match call.arguments.as_slice() {
            [_, func] => {
                let (source_ast, binding, inner) = utils::bind_if_not_simple(context, "source", source.ast);
                let body = translate_fold(translator, &inner, func, item.clone(), item.clone())?;
                let first = ast::Expression::array_elem_at(source_ast.clone(), ast::Expression::constant(0));
                let rest = ast::Expression::slice(
                    source_ast.clone(),
                    Some(ast::Expression::constant(1)),
                    ast::Expression::constant(utils::MAX_SLICE_COUNT),
                );
                let ast = ast::Expression::cond(
                    ast::Expression::lte(ast::Expression::size(source_ast), ast::Expression::constant(1)),
                    first.clone(),
                    ast::Expression::reduce(rest, first, body),
                );
                translated(call, ast::Expression::let_if_some(binding, ast), item)
            }
            [_, seed, func, selector @ ..] => {
                let seed = translator.translate(context, seed)?;
                let body = translate_fold(translator, context, func, seed.serializer.clone(), item)?;
                let reduced = ast::Expression::reduce(source.ast, seed.ast, body);
                match selector {
                    [] => translated(call, reduced, seed.serializer),
                    [selector] => {
                        let (names, result) =
                            translator.translate_lambda(context, selector, &[seed.serializer])?;
                        let ast = ast::Expression::let_in(
                            names
                                .into_iter()
                                .map(|name| LetVariable {
                                    name,
                                    value: Box::new(reduced.clone()),
                                })
                                .collect(),
                            result.ast,
                        );
                        translated(call, ast, result.serializer)
                    }
                    _ => Err(Error::MethodNotSupported(call.to_string())),
                }
            }
            _ => Err(Error::MethodNotSupported(call.to_string())),
        }
    }
}
