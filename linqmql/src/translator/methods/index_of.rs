use super::{arguments, translated, MethodSignature, MethodTranslator, ParameterKind as P};
use crate::{
    ast::{self, IndexOfOperator, UnaryOperator},
    expression::{DeclaringType, Expression, HostType, MethodCallExpression},
    translator::{utils, ExpressionTranslator, Result, TranslatedExpression, TranslationContext},
};
use bson::Bson;

const INDEX_OF_OVERLOADS: &[MethodSignature] = &[
    MethodSignature::instance(DeclaringType::String, "IndexOf", &[P::Char]),
    MethodSignature::instance(DeclaringType::String, "IndexOf", &[P::String]),
    MethodSignature::instance(DeclaringType::String, "IndexOf", &[P::Char, P::Int32]),
    MethodSignature::instance(DeclaringType::String, "IndexOf", &[P::String, P::Int32]),
    MethodSignature::instance(DeclaringType::String, "IndexOf", &[P::Char, P::Int32, P::Int32]),
    MethodSignature::instance(DeclaringType::String, "IndexOf", &[P::String, P::Int32, P::Int32]),
    MethodSignature::instance(DeclaringType::String, "IndexOf", &[P::String, P::StringComparison]),
    MethodSignature::instance(DeclaringType::String, "IndexOf", &[P::String, P::Int32, P::StringComparison]),
    MethodSignature::instance(
        DeclaringType::String,
        "IndexOf",
        &[P::String, P::Int32, P::Int32, P::StringComparison],
    ),
    MethodSignature::static_method(DeclaringType::Mql, "IndexOfBytes", &[P::String, P::String]),
    MethodSignature::static_method(DeclaringType::Mql, "IndexOfBytes", &[P::String, P::String, P::Int32]),
    MethodSignature::static_method(
        DeclaringType::Mql,
        "IndexOfBytes",
        &[P::String, P::String, P::Int32, P::Int32],
    ),
    MethodSignature::instance(DeclaringType::List, "IndexOf", &[P::Any]),
];

const INDEX_OF_ANY_OVERLOADS: &[MethodSignature] = &[
    MethodSignature::instance(DeclaringType::String, "IndexOfAny", &[P::CharArray]),
    MethodSignature::instance(DeclaringType::String, "IndexOfAny", &[P::CharArray, P::Int32]),
    MethodSignature::instance(DeclaringType::String, "IndexOfAny", &[P::CharArray, P::Int32, P::Int32]),
];

/// `IndexOf` on strings in code points (or bytes for `IndexOfBytes`) and on
/// lists. A count becomes the exclusive end index `start + count`.
pub(crate) struct IndexOfTranslator;

/// `IndexOfAny` searches for each of a constant set of chars and takes the
/// smallest position found.
pub(crate) struct IndexOfAnyTranslator;

/// Translates the optional start and count arguments of a search into the
/// start and end indexes of `$indexOfCP`.
fn translate_bounds(
    translator: &ExpressionTranslator,
    context: &TranslationContext,
    bounds: &[&Expression],
) -> Result<(Option<ast::Expression>, Option<ast::Expression>)> {
    let start = bounds
        .first()
        .map(|start| translator.translate(context, start))
        .transpose()?
        .map(|start| start.ast);
    let end = match (&start, bounds.get(1)) {
        (Some(start), Some(count)) => Some(ast::Expression::add(vec![
            start.clone(),
            translator.translate(context, count)?.ast,
        ])),
        _ => None,
    };
    Ok((start, end))
}

impl MethodTranslator for IndexOfTranslator {
    fn overloads(&self) -> &'static [MethodSignature] {
        INDEX_OF_OVERLOADS
    }

    fn translate(
        &self,
        translator: &ExpressionTranslator,
        context: &TranslationContext,
        call: &MethodCallExpression,
    ) -> Result<TranslatedExpression> {
        let int32 = context.serializer_for(&HostType::Int32)?;
        let args = arguments(call);
        if call.method.declaring_type == DeclaringType::List {
            let list = translator.translate(context, args[0])?;
            let item = list.serializer.item_serializer()?;
            let value = utils::translate_comparand(translator, context, args[1], &item)?;
            let ast = ast::Expression::index_of(IndexOfOperator::Array, list.ast, value, None, None);
            return translated(call, ast, int32);
        }

        let (bounds, comparison) = match args[2..].split_last() {
            Some((last, init)) if last.ty() == HostType::StringComparison => {
                (init, Some(utils::comparison_argument(call, last)?))
            }
            _ => (&args[2..], None),
        };
        let ignore_case = comparison.map(utils::ignore_case).transpose()?.unwrap_or(false);
        let mut string = translator.translate(context, args[0])?.ast;
        let mut value = utils::translate_string_argument(translator, context, call, args[1])?;
        if ignore_case {
            string = ast::Expression::to_lower(string);
            value = ast::Expression::to_lower(value);
        }
        let (start, end) = translate_bounds(translator, context, bounds)?;
        let op = if call.method.name == "IndexOfBytes" {
            IndexOfOperator::Bytes
        } else {
            IndexOfOperator::CP
        };
        translated(call, ast::Expression::index_of(op, string, value, start, end), int32)
    }
}

impl MethodTranslator for IndexOfAnyTranslator {
    fn overloads(&self) -> &'static [MethodSignature] {
        INDEX_OF_ANY_OVERLOADS
    }

    fn translate(
        &self,
        translator: &ExpressionTranslator,
        context: &TranslationContext,
        call: &MethodCallExpression,
    ) -> Result<TranslatedExpression> {
        let args = arguments(call);
        let chars = utils::chars_argument(call, args[1])?;
        let string = translator.translate(context, args[0])?.ast;
        let (start, end) = translate_bounds(translator, context, &args[2..])?;

        let (string, binding, context) = utils::bind_if_not_simple(context, "string", string);
        let c = context.unique_variable_name("c");
        let context = context.with_variable_name(&c);
        let positions = context.unique_variable_name("positions");
        let context = context.with_variable_name(&positions);
        let i = context.unique_variable_name("i");

        let candidates = ast::Expression::map(
            ast::Expression::constant(Bson::Array(
                chars.iter().map(|ch| Bson::String(ch.to_string())).collect(),
            )),
            &c,
            ast::Expression::index_of(IndexOfOperator::CP, string, ast::Expression::var(&c), start, end),
        );
        let found = ast::Expression::filter(
            candidates,
            &i,
            ast::Expression::gte(ast::Expression::var(&i), ast::Expression::constant(0)),
        );
        let positions_ref = ast::Expression::var(&positions);
        let smallest = ast::Expression::cond(
            ast::Expression::eq(ast::Expression::size(positions_ref.clone()), ast::Expression::constant(0)),
            ast::Expression::constant(-1),
            ast::Expression::unary(UnaryOperator::Min, positions_ref),
        );
        let ast = ast::Expression::let_if_some(
            binding,
            ast::Expression::let_in(
                vec![ast::LetVariable {
                    name: positions,
                    value: Box::new(found),
                }],
                smallest,
            ),
        );
        translated(call, ast, context.serializer_for(&HostType::Int32)?)
    }
}
