use super::{translated, MethodSignature, MethodTranslator, ParameterKind as P};
use crate::{
    ast::{self, BinaryOperator},
    expression::{
        DeclaringType, Expression, HostType, HostValue, MethodCallExpression, StringSplitOptions,
    },
    serializer::ArraySerializer,
    translator::{utils, Error, ExpressionTranslator, Result, TranslatedExpression, TranslationContext},
};
use std::sync::Arc;

const OVERLOADS: &[MethodSignature] = &[
    MethodSignature::instance(DeclaringType::String, "Split", &[P::CharArray]),
    MethodSignature::instance(DeclaringType::String, "Split", &[P::Char, P::StringSplitOptions]),
    MethodSignature::instance(DeclaringType::String, "Split", &[P::String, P::StringSplitOptions]),
    MethodSignature::instance(DeclaringType::String, "Split", &[P::CharArray, P::Int32]),
    MethodSignature::instance(DeclaringType::String, "Split", &[P::CharArray, P::StringSplitOptions]),
    MethodSignature::instance(DeclaringType::String, "Split", &[P::StringArray, P::StringSplitOptions]),
    MethodSignature::instance(
        DeclaringType::String,
        "Split",
        &[P::Char, P::Int32, P::StringSplitOptions],
    ),
    MethodSignature::instance(
        DeclaringType::String,
        "Split",
        &[P::String, P::Int32, P::StringSplitOptions],
    ),
    MethodSignature::instance(
        DeclaringType::String,
        "Split",
        &[P::CharArray, P::Int32, P::StringSplitOptions],
    ),
    MethodSignature::instance(
        DeclaringType::String,
        "Split",
        &[P::StringArray, P::Int32, P::StringSplitOptions],
    ),
];

/// `Split` on a single constant separator with `$split`. Empty entries are
/// filtered out on request and a count limits the number of parts.
pub(crate) struct SplitTranslator;

impl MethodTranslator for SplitTranslator {
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
        let string = translator.translate(context, object)?;
        let separator = separator(call, &call.arguments[0])?;

        let mut count = None;
        let mut remove_empty_entries = false;
        for argument in &call.arguments[1..] {
            match argument.ty() {
                HostType::Int32 => count = Some(translator.translate(context, argument)?.ast),
                _ => {
                    remove_empty_entries = matches!(
                        utils::constant_argument(call, argument)?,
                        HostValue::StringSplitOptions(StringSplitOptions::RemoveEmptyEntries)
                    )
                }
            }
        }

        let mut ast = ast::Expression::binary(
            BinaryOperator::Split,
            string.ast,
            ast::Expression::constant(separator),
        );
        if remove_empty_entries {
            ast = ast::Expression::filter(
                ast,
                "item",
                ast::Expression::ne(ast::Expression::var("item"), ast::Expression::constant("")),
            );
        }
        if let Some(count) = count {
            ast = ast::Expression::slice(ast, None, count);
        }
        translated(
            call,
            ast,
            Arc::new(ArraySerializer::new(
                HostType::array(HostType::String),
                string.serializer,
            )),
        )
    }
}

/// The one separator `$split` supports.
fn separator(call: &MethodCallExpression, argument: &Expression) -> Result<String> {
    let unsupported = || Error::UnsupportedSplitSeparator(call.to_string());
    let separators: Vec<String> = match argument.ty() {
        HostType::String => match utils::constant_argument(call, argument)? {
            HostValue::String(s) => vec![s.clone()],
            _ => return Err(unsupported()),
        },
        HostType::Array(item) if *item == HostType::String => match argument {
            Expression::NewArray(array) => array
                .elements
                .iter()
                .map(|e| match e.as_constant() {
                    Some(HostValue::String(s)) => Ok(s.clone()),
                    _ => Err(unsupported()),
                })
                .collect::<Result<_>>()?,
            _ => match utils::constant_argument(call, argument)? {
                HostValue::Array(items) => items
                    .iter()
                    .map(|item| match item {
                        HostValue::String(s) => Ok(s.clone()),
                        _ => Err(unsupported()),
                    })
                    .collect::<Result<_>>()?,
                _ => return Err(unsupported()),
            },
        },
        _ => utils::chars_argument(call, argument)?
            .into_iter()
            .map(|c| c.to_string())
            .collect(),
    };
    match separators.as_slice() {
        [separator] if !separator.is_empty() => Ok(separator.clone()),
        _ => Err(unsupported()),
    }
}
