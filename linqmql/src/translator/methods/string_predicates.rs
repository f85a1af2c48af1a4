use super::{translated, MethodSignature, MethodTranslator, ParameterKind as P};
use crate::{
    ast::{self, IndexOfOperator, TernaryOperator},
    expression::{DeclaringType, HostType, MethodCallExpression},
    translator::{utils, Error, ExpressionTranslator, Result, TranslatedExpression, TranslationContext},
};

const OVERLOADS: &[MethodSignature] = &[
    MethodSignature::instance(DeclaringType::String, "StartsWith", &[P::String]),
    MethodSignature::instance(DeclaringType::String, "StartsWith", &[P::Char]),
    MethodSignature::instance(DeclaringType::String, "StartsWith", &[P::String, P::StringComparison]),
    MethodSignature::instance(DeclaringType::String, "EndsWith", &[P::String]),
    MethodSignature::instance(DeclaringType::String, "EndsWith", &[P::Char]),
    MethodSignature::instance(DeclaringType::String, "EndsWith", &[P::String, P::StringComparison]),
    MethodSignature::instance(DeclaringType::String, "Contains", &[P::String]),
    MethodSignature::instance(DeclaringType::String, "Contains", &[P::Char]),
    MethodSignature::instance(DeclaringType::String, "Contains", &[P::String, P::StringComparison]),
];

/// `StartsWith`, `EndsWith` and `Contains` as expressions. Filters translate
/// these to regular expressions instead.
pub(crate) struct StringPredicateTranslator;

impl MethodTranslator for StringPredicateTranslator {
    fn overloads(&self) -> &'static [MethodSignature] {
        OVERLOADS
    }

    fn translate(
        &self,
        translator: &ExpressionTranslator,
        context: &TranslationContext,
        call: &MethodCallExpression,
    ) -> Result<TranslatedExpression> {
        let object = call
            .object
            .as_deref()
            .ok_or_else(|| Error::MethodNotSupported(call.to_string()))?;
        let mut string = translator.translate(context, object)?.ast;
        let mut value = utils::translate_string_argument(translator, context, call, &call.arguments[0])?;
        let ignore_case = match call.arguments.get(1) {
            Some(comparison) => utils::ignore_case(utils::comparison_argument(call, comparison)?)?,
            None => false,
        };
        if ignore_case {
            string = ast::Expression::to_lower(string);
            value = ast::Expression::to_lower(value);
        }
        let ast = match call.method.name.as_str() {
            "StartsWith" => {
                let (value, binding, _) = utils::bind_if_not_simple(context, "value", value);
                let prefix = ast::Expression::ternary(
                    TernaryOperator::SubstrCP,
                    string,
                    ast::Expression::constant(0),
                    ast::Expression::str_len_cp(value.clone()),
                );
                ast::Expression::let_if_some(binding, ast::Expression::eq(prefix, value))
            }
            "EndsWith" => ends_with(context, string, value),
            _ => ast::Expression::gte(
                ast::Expression::index_of(IndexOfOperator::CP, string, value, None, None),
                ast::Expression::constant(0),
            ),
        };
        translated(call, ast, context.serializer_for(&HostType::Boolean)?)
    }
}

/// The suffix must be found exactly where it would have to start.
fn ends_with(context: &TranslationContext, string: ast::Expression, value: ast::Expression) -> ast::Expression {
    let (string, string_binding, context) = utils::bind_if_not_simple(context, "string", string);
    let (value, value_binding, context) = utils::bind_if_not_simple(&context, "value", value);
    let start = ast::Expression::subtract(
        ast::Expression::str_len_cp(string.clone()),
        ast::Expression::str_len_cp(value.clone()),
    );
    let (start, start_binding, _) = utils::bind_if_not_simple(&context, "start", start);
    let test = ast::Expression::and(vec![
        ast::Expression::gte(start.clone(), ast::Expression::constant(0)),
        ast::Expression::eq(
            ast::Expression::index_of(IndexOfOperator::CP, string, value, Some(start.clone()), None),
            start,
        ),
    ]);
    ast::Expression::let_in(
        string_binding.into_iter().chain(value_binding).collect(),
        ast::Expression::let_if_some(start_binding, test),
    )
}
