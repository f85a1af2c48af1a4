//! Dictionaries stored as documents are read through `$objectToArray`
//! entries `{ k, v }`; those stored as arrays of documents already have
//! that shape. A constant string key of a document dictionary is a plain
//! field access.

use super::{arguments, translated, MethodSignature, MethodTranslator, ParameterKind as P};
use crate::{
    ast::{self, BinaryOperator, UnaryOperator},
    expression::{DeclaringType, Expression, HostType, HostValue, MethodCallExpression},
    serializer::DictionaryRepresentation,
    translator::{
        members, utils, ExpressionTranslator, Result, TranslatedExpression, TranslationContext,
    },
};

const CONTAINS_KEY_OVERLOADS: &[MethodSignature] = &[
    MethodSignature::instance(DeclaringType::Dictionary, "ContainsKey", &[P::Any]),
    MethodSignature::instance(DeclaringType::Dictionary, "ContainsValue", &[P::Any]),
];

const INDEXER_OVERLOADS: &[MethodSignature] = &[
    MethodSignature::instance(DeclaringType::Dictionary, "get_Item", &[P::Any]),
    MethodSignature::instance(DeclaringType::List, "get_Item", &[P::Int32]),
];

pub(crate) struct ContainsKeyTranslator;

pub(crate) struct IndexerTranslator;

fn entries(dictionary: &TranslatedExpression) -> ast::Expression {
    match dictionary.serializer.dictionary_representation() {
        Some(DictionaryRepresentation::ArrayOfDocuments) => dictionary.ast.clone(),
        _ => ast::Expression::unary(UnaryOperator::ObjectToArray, dictionary.ast.clone()),
    }
}

/// A constant key that can be used as a field name of a document
/// dictionary.
fn field_key<'a>(dictionary: &TranslatedExpression, key: &'a Expression) -> Option<&'a str> {
    if dictionary.serializer.dictionary_representation() != Some(DictionaryRepresentation::Document) {
        return None;
    }
    match key.as_constant() {
        Some(HostValue::String(k)) if !k.is_empty() && !k.starts_with('$') && !k.contains('.') => Some(k),
        _ => None,
    }
}

fn entry_field(name: &str, field: &str) -> ast::Expression {
    ast::Expression::FieldPath(ast::FieldPath {
        root: Some(name.to_string()),
        segments: vec![field.to_string()],
    })
}

impl MethodTranslator for ContainsKeyTranslator {
    fn overloads(&self) -> &'static [MethodSignature] {
        CONTAINS_KEY_OVERLOADS
    }

    fn translate(
        &self,
        translator: &ExpressionTranslator,
        context: &TranslationContext,
        call: &MethodCallExpression,
    ) -> Result<TranslatedExpression> {
        let args = arguments(call);
        let dictionary = translator.translate(context, args[0])?;
        let boolean = context.serializer_for(&HostType::Boolean)?;

        if call.method.name == "ContainsKey" {
            if let Some(key) = field_key(&dictionary, args[1]) {
                let field = members::field_access(context, dictionary.ast, key)?;
                let ast = ast::Expression::ne(
                    ast::Expression::unary(UnaryOperator::Type, field),
                    ast::Expression::constant("missing"),
                );
                return translated(call, ast, boolean);
            }
        }

        let (field, serializer) = if call.method.name == "ContainsKey" {
            ("k", dictionary.serializer.key_serializer()?)
        } else {
            ("v", dictionary.serializer.value_serializer()?)
        };
        let value = utils::translate_comparand(translator, context, args[1], &serializer)?;
        let entry = "kv";
        let values = ast::Expression::map(entries(&dictionary), entry, entry_field(entry, field));
        translated(call, ast::Expression::binary(BinaryOperator::In, value, values), boolean)
    }
}

impl MethodTranslator for IndexerTranslator {
    fn overloads(&self) -> &'static [MethodSignature] {
        INDEXER_OVERLOADS
    }

    fn translate(
        &self,
        translator: &ExpressionTranslator,
        context: &TranslationContext,
        call: &MethodCallExpression,
    ) -> Result<TranslatedExpression> {
        let args = arguments(call);
        let target = translator.translate(context, args[0])?;
        if call.method.declaring_type == DeclaringType::List {
            let index = translator.translate(context, args[1])?;
            let item = target.serializer.item_serializer()?;
            return translated(call, ast::Expression::array_elem_at(target.ast, index.ast), item);
        }

        let value_serializer = target.serializer.value_serializer()?;
        if let Some(key) = field_key(&target, args[1]) {
            let ast = members::field_access(context, target.ast, key)?;
            return translated(call, ast, value_serializer);
        }

        let key_serializer = target.serializer.key_serializer()?;
        let key = utils::translate_comparand(translator, context, args[1], &key_serializer)?;
        let entry = context.unique_variable_name("kv");
        let matching = ast::Expression::filter(
            entries(&target),
            &entry,
            ast::Expression::eq(entry_field(&entry, "k"), key),
        );
        let values = ast::Expression::map(matching, &entry, entry_field(&entry, "v"));
        let ast = ast::Expression::array_elem_at(values, ast::Expression::constant(0));
        translated(call, ast, value_serializer)
    }
}
