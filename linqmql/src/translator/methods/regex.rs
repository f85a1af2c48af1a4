use super::{translated, MethodSignature, MethodTranslator, ParameterKind as P};
use crate::{
    ast,
    expression::{DeclaringType, HostType, HostValue, MethodCallExpression},
    translator::{utils, Error, ExpressionTranslator, Result, TranslatedExpression, TranslationContext},
};

const OVERLOADS: &[MethodSignature] = &[MethodSignature::static_method(
    DeclaringType::Regex,
    "IsMatch",
    &[P::String, P::String],
)];

/// `Regex.IsMatch` with a constant pattern becomes `$regexMatch`.
pub(crate) struct RegexIsMatchTranslator;

impl MethodTranslator for RegexIsMatchTranslator {
    fn overloads(&self) -> &'static [MethodSignature] {
        OVERLOADS
    }

    fn translate(
        &self,
        translator: &ExpressionTranslator,
        context: &TranslationContext,
        call: &MethodCallExpression,
    ) -> Result<TranslatedExpression> {
        let input = translator.translate(context, &call.arguments[0])?;
        let pattern = match utils::constant_argument(call, &call.arguments[1])? {
            HostValue::String(pattern) => pattern.clone(),
            _ => {
                return Err(Error::NonConstantArgument(
                    call.to_string(),
                    call.arguments[1].to_string(),
                ))
            }
        };
        let ast = ast::Expression::RegexMatch(ast::RegexMatch {
            input: Box::new(input.ast),
            regex: pattern,
            options: String::new(),
        });
        translated(call, ast, context.serializer_for(&HostType::Boolean)?)
    }
}
