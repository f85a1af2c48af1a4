use super::{
    is_document_type, Error, ExpressionTranslator, Result, TranslatedExpression,
    TranslationContext,
};
use crate::{
    ast::{self, BinaryOperator, LetVariable, UnaryOperator},
    expression::{Expression, HostType, MemberExpression},
    options::ServerVersion,
    serializer::DictionaryRepresentation,
};
use bson::Bson;

/// Member accesses: properties with a dedicated operator, and otherwise a
/// field of the containing document.
pub(crate) fn translate_member(
    translator: &ExpressionTranslator,
    context: &TranslationContext,
    m: &MemberExpression,
) -> Result<TranslatedExpression> {
    let expression = Expression::MemberAccess(m.clone());
    let result = |ast, serializer| {
        Ok(TranslatedExpression {
            expression: expression.clone(),
            ast,
            serializer,
        })
    };

    let target = match &m.expression {
        Some(target) => target,
        None => {
            return match (&m.member.declaring_type, m.member.name.as_str()) {
                (HostType::DateTime, "Now" | "UtcNow") => result(
                    ast::Expression::var("NOW"),
                    context.serializer_for(&HostType::DateTime)?,
                ),
                (HostType::String, "Empty") => result(
                    ast::Expression::constant(""),
                    context.serializer_for(&HostType::String)?,
                ),
                _ => Err(Error::not_supported(&expression)),
            }
        }
    };

    let target_type = target.ty();
    let name = m.member.name.as_str();
    let translated = translator.translate(context, target)?;

    match (&target_type, name) {
        (HostType::String, "Length") => {
            return result(
                ast::Expression::str_len_cp(translated.ast),
                context.serializer_for(&HostType::Int32)?,
            )
        }
        (HostType::Array(_), "Length") | (HostType::List(_), "Count") => {
            return result(
                ast::Expression::size(translated.ast),
                context.serializer_for(&HostType::Int32)?,
            )
        }
        (HostType::Dictionary(_, _), "Count") => {
            let entries = match translated.serializer.dictionary_representation() {
                Some(DictionaryRepresentation::ArrayOfDocuments) => translated.ast,
                _ => ast::Expression::unary(UnaryOperator::ObjectToArray, translated.ast),
            };
            return result(
                ast::Expression::size(entries),
                context.serializer_for(&HostType::Int32)?,
            );
        }
        (HostType::Nullable(_), "HasValue") => {
            return result(
                ast::Expression::ne(translated.ast, ast::Expression::constant(Bson::Null)),
                context.serializer_for(&HostType::Boolean)?,
            )
        }
        (HostType::Nullable(_), "Value") => {
            return result(translated.ast, context.serializer_for(&m.member.ty)?)
        }
        (HostType::DateTime, _) => {
            if let Some(ast) = date_part(name, translated.ast.clone()) {
                return result(ast, context.serializer_for(&m.member.ty)?);
            }
        }
        _ => {}
    }

    if !is_document_type(&target_type) && !matches!(target_type, HostType::Object) {
        return Err(Error::not_supported(&expression));
    }
    let member = translated.serializer.member(name)?;
    let ast = field_access(context, translated.ast, &member.element_name)?;
    result(ast, member.serializer)
}

/// Accesses a field of a document-valued expression. Paths are extended
/// directly; computed documents are bound first. Field names a path cannot
/// express need `$getField`.
pub(crate) fn field_access(context: &TranslationContext, target: ast::Expression, field: &str) -> Result<ast::Expression> {
    if field.starts_with('$') || field.contains('.') {
        context.require_server_version("$getField", ServerVersion::V5_0)?;
        return Ok(ast::Expression::get_field(target, field));
    }
    if let Some(path) = ast::Expression::try_field_access(target.clone(), field) {
        return Ok(path);
    }
    // the body references only the binding, so a fixed name cannot capture
    let name = "this";
    Ok(ast::Expression::let_in(
        vec![LetVariable {
            name: name.to_string(),
            value: Box::new(target),
        }],
        ast::Expression::FieldPath(ast::FieldPath {
            root: Some(name.to_string()),
            segments: vec![field.to_string()],
        }),
    ))
}

/// `DateTime` components. The host numbers days of the week from zero.
fn date_part(name: &str, date: ast::Expression) -> Option<ast::Expression> {
    let op = match name {
        "Year" => UnaryOperator::Year,
        "Month" => UnaryOperator::Month,
        "Day" => UnaryOperator::DayOfMonth,
        "DayOfYear" => UnaryOperator::DayOfYear,
        "Hour" => UnaryOperator::Hour,
        "Minute" => UnaryOperator::Minute,
        "Second" => UnaryOperator::Second,
        "Millisecond" => UnaryOperator::Millisecond,
        "DayOfWeek" => {
            return Some(ast::Expression::binary(
                BinaryOperator::Subtract,
                ast::Expression::unary(UnaryOperator::DayOfWeek, date),
                ast::Expression::constant(1),
            ))
        }
        _ => return None,
    };
    Some(ast::Expression::unary(op, date))
}
