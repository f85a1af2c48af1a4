use super::{translated, MethodSignature, MethodTranslator, ParameterKind as P};
use crate::{
    ast::{self, NaryOperator},
    expression::{DeclaringType, MethodCallExpression},
    translator::{utils, ExpressionTranslator, Result, TranslatedExpression, TranslationContext},
};
use bson::Bson;

const OVERLOADS: &[MethodSignature] = &[
    MethodSignature::static_method(DeclaringType::Enumerable, "Skip", &[P::Sequence, P::Int32]),
    MethodSignature::static_method(DeclaringType::Enumerable, "Take", &[P::Sequence, P::Int32]),
];

/// A translated count: either known at translation time or clamped to be
/// non-negative on the server, since a negative `$slice` count reads from
/// the end of the array.
enum Count {
    Constant(i64),
    Computed(ast::Expression),
}

impl Count {
    fn new(ast: ast::Expression) -> Self {
        match ast.as_constant() {
            Some(Bson::Int32(n)) => Count::Constant(i64::from(*n)),
            Some(Bson::Int64(n)) => Count::Constant(*n),
            _ => Count::Computed(ast::Expression::nary(
                NaryOperator::Max,
                vec![ast::Expression::constant(0), ast],
            )),
        }
    }
}

/// `Skip` and `Take` with `$slice`. A `Take` directly over a `Skip` becomes
/// a single slice with both a position and a count. Counts of zero or less
/// skip nothing and take nothing.
pub(crate) struct SkipTakeTranslator;

impl SkipTakeTranslator {
    fn skip(source: ast::Expression, count: Count) -> ast::Expression {
        match count {
            Count::Constant(n) if n <= 0 => source,
            Count::Constant(n) => ast::Expression::slice(
                source,
                Some(ast::Expression::constant(n_to_bson(n))),
                ast::Expression::constant(utils::MAX_SLICE_COUNT),
            ),
            Count::Computed(n) => ast::Expression::slice(
                source,
                Some(n),
                ast::Expression::constant(utils::MAX_SLICE_COUNT),
            ),
        }
    }

    fn take(source: ast::Expression, count: Count) -> ast::Expression {
        match count {
            Count::Constant(n) if n <= 0 => ast::Expression::constant(Bson::Array(vec![])),
            Count::Constant(n) => ast::Expression::slice(source, None, ast::Expression::constant(n_to_bson(n))),
            Count::Computed(n) => ast::Expression::slice(source, None, n),
        }
    }
}

fn n_to_bson(n: i64) -> Bson {
    match i32::try_from(n) {
        Ok(n) => Bson::Int32(n),
        Err(_) => Bson::Int64(n),
    }
}

impl MethodTranslator for SkipTakeTranslator {
    fn overloads(&self) -> &'static [MethodSignature] {
        OVERLOADS
    }

    fn translate(
        &self,
        translator: &ExpressionTranslator,
        context: &TranslationContext,
        call: &MethodCallExpression,
    ) -> Result<TranslatedExpression> {
        let count = Count::new(translator.translate(context, &call.arguments[1])?.ast);
        if call.method.name == "Skip" {
            let source = translator.translate(context, &call.arguments[0])?;
            return translated(call, Self::skip(source.ast, count), source.serializer);
        }

        let skip = call.arguments[0]
            .as_method_call()
            .filter(|inner| inner.is(DeclaringType::Enumerable, "Skip") && inner.arguments.len() == 2);
        let Some(inner) = skip else {
            let source = translator.translate(context, &call.arguments[0])?;
            return translated(call, Self::take(source.ast, count), source.serializer);
        };
        let source = translator.translate(context, &inner.arguments[0])?;
        let position = Count::new(translator.translate(context, &inner.arguments[1])?.ast);
        // The three-argument `$slice` requires a positive count, so only a
        // positive constant take fuses with the skip.
        let ast = match (position, count) {
            (_, Count::Constant(n)) if n <= 0 => ast::Expression::constant(Bson::Array(vec![])),
            (Count::Constant(m), count) if m <= 0 => Self::take(source.ast, count),
            (Count::Constant(m), Count::Constant(n)) => ast::Expression::slice(
                source.ast,
                Some(ast::Expression::constant(n_to_bson(m))),
                ast::Expression::constant(n_to_bson(n)),
            ),
            (Count::Computed(m), Count::Constant(n)) => ast::Expression::slice(
                source.ast,
                Some(m),
                ast::Expression::constant(n_to_bson(n)),
            ),
            (position, count) => Self::take(Self::skip(source.ast, position), count),
        };
        translated(call, ast, source.serializer)
    }
}
