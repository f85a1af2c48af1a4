use super::{translated, MethodSignature, MethodTranslator, ParameterKind as P};
use crate::{
    ast::{self, DateUnit, NaryOperator},
    expression::{DeclaringType, HostType, MethodCallExpression},
    options::ServerVersion,
    translator::{Error, ExpressionTranslator, Result, TranslatedExpression, TranslationContext},
};

const OVERLOADS: &[MethodSignature] = &[
    MethodSignature::instance(DeclaringType::DateTime, "AddYears", &[P::Int32]),
    MethodSignature::instance(DeclaringType::DateTime, "AddMonths", &[P::Int32]),
    MethodSignature::instance(DeclaringType::DateTime, "AddDays", &[P::Numeric]),
    MethodSignature::instance(DeclaringType::DateTime, "AddHours", &[P::Numeric]),
    MethodSignature::instance(DeclaringType::DateTime, "AddMinutes", &[P::Numeric]),
    MethodSignature::instance(DeclaringType::DateTime, "AddSeconds", &[P::Numeric]),
    MethodSignature::instance(DeclaringType::DateTime, "AddMilliseconds", &[P::Numeric]),
];

/// `AddX` with `$dateAdd`. Before 5.0, units of fixed length add
/// milliseconds instead; months and years have no such equivalent.
pub(crate) struct DateAddTranslator;

fn unit(name: &str) -> Option<(DateUnit, Option<i64>)> {
    Some(match name {
        "AddYears" => (DateUnit::Year, None),
        "AddMonths" => (DateUnit::Month, None),
        "AddDays" => (DateUnit::Day, Some(86_400_000)),
        "AddHours" => (DateUnit::Hour, Some(3_600_000)),
        "AddMinutes" => (DateUnit::Minute, Some(60_000)),
        "AddSeconds" => (DateUnit::Second, Some(1_000)),
        "AddMilliseconds" => (DateUnit::Millisecond, Some(1)),
        _ => return None,
    })
}

impl MethodTranslator for DateAddTranslator {
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
        let (unit, milliseconds) =
            unit(&call.method.name).ok_or_else(|| Error::MethodNotSupported(call.to_string()))?;
        let date = translator.translate(context, object)?;
        let amount = translator.translate(context, &call.arguments[0])?.ast;
        let ast = match milliseconds {
            Some(ms) if context.options().compatibility_level < ServerVersion::V5_0 => ast::Expression::add(vec![
                date.ast,
                ast::Expression::nary(NaryOperator::Multiply, vec![amount, ast::Expression::constant(ms)]),
            ]),
            _ => {
                context.require_server_version("$dateAdd", ServerVersion::V5_0)?;
                ast::Expression::DateAdd(ast::DateAdd {
                    start_date: Box::new(date.ast),
                    unit,
                    amount: Box::new(amount),
                })
            }
        };
        translated(call, ast, context.serializer_for(&HostType::DateTime)?)
    }
}
