use super::{arguments, translated, MethodSignature, MethodTranslator, ParameterKind as P};
use crate::{
    ast::{self, BinaryOperator},
    expression::{DeclaringType, HostType, MethodCallExpression},
    translator::{utils, ExpressionTranslator, Result, TranslatedExpression, TranslationContext},
};

const STRING_EQUALS_OVERLOADS: &[MethodSignature] = &[
    MethodSignature::instance(DeclaringType::String, "Equals", &[P::String]),
    MethodSignature::instance(DeclaringType::String, "Equals", &[P::String, P::StringComparison]),
    MethodSignature::static_method(DeclaringType::String, "Equals", &[P::String, P::String]),
    MethodSignature::static_method(
        DeclaringType::String,
        "Equals",
        &[P::String, P::String, P::StringComparison],
    ),
];

const EQUALS_OVERLOADS: &[MethodSignature] = &[
    MethodSignature::any_instance("Equals", &[P::Any]),
    MethodSignature::static_method(DeclaringType::Object, "Equals", &[P::Any, P::Any]),
];

const COMPARE_OVERLOADS: &[MethodSignature] = &[
    MethodSignature::static_method(DeclaringType::String, "Compare", &[P::String, P::String]),
    MethodSignature::static_method(DeclaringType::String, "Compare", &[P::String, P::String, P::Boolean]),
    MethodSignature::static_method(
        DeclaringType::String,
        "Compare",
        &[P::String, P::String, P::StringComparison],
    ),
    MethodSignature::any_instance("CompareTo", &[P::Any]),
];

/// String equality honoring a comparison mode; case-insensitive modes
/// compare the lower-cased operands.
pub(crate) struct StringEqualsTranslator;

pub(crate) struct EqualsTranslator;

/// `Compare` and `CompareTo` with `$cmp`, or `$strcasecmp` when case is
/// ignored.
pub(crate) struct CompareTranslator;

/// Whether the optional third argument asks for a case-insensitive
/// comparison. It is either a `StringComparison` or an `ignoreCase` flag.
fn ignores_case(call: &MethodCallExpression) -> Result<bool> {
    let args = arguments(call);
    match args.get(2) {
        None => Ok(false),
        Some(mode) if mode.ty() == HostType::Boolean => utils::bool_argument(call, mode),
        Some(mode) => utils::ignore_case(utils::comparison_argument(call, mode)?),
    }
}

impl MethodTranslator for StringEqualsTranslator {
    fn overloads(&self) -> &'static [MethodSignature] {
        STRING_EQUALS_OVERLOADS
    }

    fn translate(
        &self,
        translator: &ExpressionTranslator,
        context: &TranslationContext,
        call: &MethodCallExpression,
    ) -> Result<TranslatedExpression> {
        let args = arguments(call);
        let (left, right) = utils::translate_comparands(translator, context, args[0], args[1])?;
        let ast = if ignores_case(call)? {
            ast::Expression::eq(ast::Expression::to_lower(left.ast), ast::Expression::to_lower(right))
        } else {
            ast::Expression::eq(left.ast, right)
        };
        translated(call, ast, context.serializer_for(&HostType::Boolean)?)
    }
}

impl MethodTranslator for EqualsTranslator {
    fn overloads(&self) -> &'static [MethodSignature] {
        EQUALS_OVERLOADS
    }

    fn translate(
        &self,
        translator: &ExpressionTranslator,
        context: &TranslationContext,
        call: &MethodCallExpression,
    ) -> Result<TranslatedExpression> {
        let args = arguments(call);
        let (left, right) = utils::translate_comparands(translator, context, args[0], args[1])?;
        translated(
            call,
            ast::Expression::eq(left.ast, right),
            context.serializer_for(&HostType::Boolean)?,
        )
    }
}

impl MethodTranslator for CompareTranslator {
    fn overloads(&self) -> &'static [MethodSignature] {
        COMPARE_OVERLOADS
    }

    fn translate(
        &self,
        translator: &ExpressionTranslator,
        context: &TranslationContext,
        call: &MethodCallExpression,
    ) -> Result<TranslatedExpression> {
        let args = arguments(call);
        let (left, right) = utils::translate_comparands(translator, context, args[0], args[1])?;
        let op = if ignores_case(call)? {
            BinaryOperator::StrCaseCmp
        } else {
            BinaryOperator::Cmp
        };
        translated(
            call,
            ast::Expression::binary(op, left.ast, right),
            context.serializer_for(&HostType::Int32)?,
        )
    }
}
