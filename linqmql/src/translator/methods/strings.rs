use super::{arguments, translated, MethodSignature, MethodTranslator, ParameterKind as P};
use crate::{
    ast::{self, BinaryOperator, TernaryOperator, TrimOperator, UnaryOperator},
    expression::{DeclaringType, Expression, HostType, MethodCallExpression},
    options::ServerVersion,
    translator::{utils, Error, ExpressionTranslator, Result, TranslatedExpression, TranslationContext},
};
use bson::Bson;

const CASE_OVERLOADS: &[MethodSignature] = &[
    MethodSignature::instance(DeclaringType::String, "ToLower", &[]),
    MethodSignature::instance(DeclaringType::String, "ToLowerInvariant", &[]),
    MethodSignature::instance(DeclaringType::String, "ToUpper", &[]),
    MethodSignature::instance(DeclaringType::String, "ToUpperInvariant", &[]),
];

const TRIM_OVERLOADS: &[MethodSignature] = &[
    MethodSignature::instance(DeclaringType::String, "Trim", &[]),
    MethodSignature::instance(DeclaringType::String, "Trim", &[P::Char]),
    MethodSignature::instance(DeclaringType::String, "Trim", &[P::CharArray]),
    MethodSignature::instance(DeclaringType::String, "TrimStart", &[]),
    MethodSignature::instance(DeclaringType::String, "TrimStart", &[P::Char]),
    MethodSignature::instance(DeclaringType::String, "TrimStart", &[P::CharArray]),
    MethodSignature::instance(DeclaringType::String, "TrimEnd", &[]),
    MethodSignature::instance(DeclaringType::String, "TrimEnd", &[P::Char]),
    MethodSignature::instance(DeclaringType::String, "TrimEnd", &[P::CharArray]),
];

const SUBSTRING_OVERLOADS: &[MethodSignature] = &[
    MethodSignature::instance(DeclaringType::String, "Substring", &[P::Int32]),
    MethodSignature::instance(DeclaringType::String, "Substring", &[P::Int32, P::Int32]),
];

const CONCAT_OVERLOADS: &[MethodSignature] = &[
    MethodSignature::static_method(DeclaringType::String, "Concat", &[P::String, P::String]),
    MethodSignature::static_method(DeclaringType::String, "Concat", &[P::String, P::String, P::String]),
    MethodSignature::static_method(
        DeclaringType::String,
        "Concat",
        &[P::String, P::String, P::String, P::String],
    ),
    MethodSignature::static_method(DeclaringType::String, "Concat", &[P::StringArray]),
];

const IS_NULL_OR_EMPTY_OVERLOADS: &[MethodSignature] = &[
    MethodSignature::static_method(DeclaringType::String, "IsNullOrEmpty", &[P::String]),
    MethodSignature::static_method(DeclaringType::String, "IsNullOrWhiteSpace", &[P::String]),
];

const REPLACE_OVERLOADS: &[MethodSignature] = &[
    MethodSignature::instance(DeclaringType::String, "Replace", &[P::String, P::String]),
    MethodSignature::instance(DeclaringType::String, "Replace", &[P::Char, P::Char]),
];

pub(crate) struct CaseTranslator;

/// Trims whitespace, or the given constant chars.
pub(crate) struct TrimTranslator;

/// `Substring` in code points. Without a length the rest of the string is
/// taken.
pub(crate) struct SubstringTranslator;

pub(crate) struct ConcatTranslator;

pub(crate) struct IsNullOrEmptyTranslator;

pub(crate) struct ReplaceTranslator;

fn instance<'a>(call: &'a MethodCallExpression) -> Result<&'a Expression> {
    call.object
        .as_deref()
        .ok_or_else(|| Error::MethodNotSupported(call.to_string()))
}

impl MethodTranslator for CaseTranslator {
    fn overloads(&self) -> &'static [MethodSignature] {
        CASE_OVERLOADS
    }

    fn translate(
        &self,
        translator: &ExpressionTranslator,
        context: &TranslationContext,
        call: &MethodCallExpression,
    ) -> Result<TranslatedExpression> {
        let string = translator.translate(context, instance(call)?)?;
        let op = if call.method.name.starts_with("ToUpper") {
            UnaryOperator::ToUpper
        } else {
            UnaryOperator::ToLower
        };
        translated(call, ast::Expression::unary(op, string.ast), string.serializer)
    }
}

impl MethodTranslator for TrimTranslator {
    fn overloads(&self) -> &'static [MethodSignature] {
        TRIM_OVERLOADS
    }

    fn translate(
        &self,
        translator: &ExpressionTranslator,
        context: &TranslationContext,
        call: &MethodCallExpression,
    ) -> Result<TranslatedExpression> {
        let string = translator.translate(context, instance(call)?)?;
        let op = match call.method.name.as_str() {
            "TrimStart" => TrimOperator::LTrim,
            "TrimEnd" => TrimOperator::RTrim,
            _ => TrimOperator::Trim,
        };
        let chars = call
            .arguments
            .first()
            .map(|chars| utils::chars_argument(call, chars))
            .transpose()?
            .map(|chars| ast::Expression::constant(chars.into_iter().collect::<String>()));
        translated(call, ast::Expression::trim(op, string.ast, chars), string.serializer)
    }
}

impl MethodTranslator for SubstringTranslator {
    fn overloads(&self) -> &'static [MethodSignature] {
        SUBSTRING_OVERLOADS
    }

    fn translate(
        &self,
        translator: &ExpressionTranslator,
        context: &TranslationContext,
        call: &MethodCallExpression,
    ) -> Result<TranslatedExpression> {
        let string = translator.translate(context, instance(call)?)?;
        let start = translator.translate(context, &call.arguments[0])?.ast;
        let ast = match call.arguments.get(1) {
            Some(length) => {
                let length = translator.translate(context, length)?.ast;
                ast::Expression::ternary(TernaryOperator::SubstrCP, string.ast, start, length)
            }
            None => {
                let (source, source_binding, context) = utils::bind_if_not_simple(context, "string", string.ast);
                let (start, start_binding, _) = utils::bind_if_not_simple(&context, "start", start);
                let length = ast::Expression::subtract(ast::Expression::str_len_cp(source.clone()), start.clone());
                ast::Expression::let_in(
                    source_binding.into_iter().chain(start_binding).collect(),
                    ast::Expression::ternary(TernaryOperator::SubstrCP, source, start, length),
                )
            }
        };
        translated(call, ast, string.serializer)
    }
}

impl MethodTranslator for ConcatTranslator {
    fn overloads(&self) -> &'static [MethodSignature] {
        CONCAT_OVERLOADS
    }

    fn translate(
        &self,
        translator: &ExpressionTranslator,
        context: &TranslationContext,
        call: &MethodCallExpression,
    ) -> Result<TranslatedExpression> {
        let parts: Vec<&Expression> = match call.arguments.as_slice() {
            [Expression::NewArray(array)] => array.elements.iter().collect(),
            [array] if array.ty() == HostType::array(HostType::String) => {
                return Err(Error::NonConstantArgument(call.to_string(), array.to_string()))
            }
            parts => parts.iter().collect(),
        };
        let parts = parts
            .into_iter()
            .map(|part| Ok(translator.translate(context, part)?.ast))
            .collect::<Result<Vec<_>>>()?;
        translated(
            call,
            ast::Expression::concat(parts),
            context.serializer_for(&HostType::String)?,
        )
    }
}

impl MethodTranslator for IsNullOrEmptyTranslator {
    fn overloads(&self) -> &'static [MethodSignature] {
        IS_NULL_OR_EMPTY_OVERLOADS
    }

    fn translate(
        &self,
        translator: &ExpressionTranslator,
        context: &TranslationContext,
        call: &MethodCallExpression,
    ) -> Result<TranslatedExpression> {
        let mut string = translator.translate(context, &call.arguments[0])?.ast;
        if call.method.name == "IsNullOrWhiteSpace" {
            string = ast::Expression::trim(TrimOperator::Trim, string, None);
        }
        let ast = ast::Expression::binary(
            BinaryOperator::In,
            string,
            ast::Expression::constant(Bson::Array(vec![Bson::Null, Bson::String(String::new())])),
        );
        translated(call, ast, context.serializer_for(&HostType::Boolean)?)
    }
}

impl MethodTranslator for ReplaceTranslator {
    fn overloads(&self) -> &'static [MethodSignature] {
        REPLACE_OVERLOADS
    }

    fn translate(
        &self,
        translator: &ExpressionTranslator,
        context: &TranslationContext,
        call: &MethodCallExpression,
    ) -> Result<TranslatedExpression> {
        context.require_server_version("$replaceAll", ServerVersion::V4_4)?;
        let args = arguments(call);
        let string = translator.translate(context, args[0])?;
        let find = utils::translate_string_argument(translator, context, call, args[1])?;
        let replacement = utils::translate_string_argument(translator, context, call, args[2])?;
        let ast = ast::Expression::ReplaceAll(ast::ReplaceAll {
            input: Box::new(string.ast),
            find: Box::new(find),
            replacement: Box::new(replacement),
        });
        translated(call, ast, string.serializer)
    }
}
