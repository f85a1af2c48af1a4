use super::{translated, MethodSignature, MethodTranslator, ParameterKind as P};
use crate::{
    ast::{self, UnaryOperator},
    expression::{DeclaringType, MethodCallExpression},
    translator::{utils, Error, ExpressionTranslator, Result, TranslatedExpression, TranslationContext},
};

const OVERLOADS: &[MethodSignature] = &[
    MethodSignature::static_method(DeclaringType::Enumerable, "Average", &[P::NumericSequence]),
    MethodSignature::static_method(DeclaringType::Enumerable, "Average", &[P::Sequence, P::Lambda(1)]),
    MethodSignature::static_method(DeclaringType::Enumerable, "Sum", &[P::NumericSequence]),
    MethodSignature::static_method(DeclaringType::Enumerable, "Sum", &[P::Sequence, P::Lambda(1)]),
];

/// `$avg` and `$sum` over the items, or over the selected values. The
/// result is converted when the server's numeric type differs from the
/// method's return type.
pub(crate) struct AverageSumTranslator;

impl MethodTranslator for AverageSumTranslator {
    fn overloads(&self) -> &'static [MethodSignature] {
        OVERLOADS
    }

    fn translate(
        &self,
        translator: &ExpressionTranslator,
        context: &TranslationContext,
        call: &MethodCallExpression,
    ) -> Result<TranslatedExpression> {
        let source = translator.translate(context, &call.arguments[0])?;
        let (values, value_type) = match call.arguments.get(1) {
            None => {
                let item_type = call.arguments[0]
                    .ty()
                    .item_type()
                    .cloned()
                    .ok_or_else(|| Error::MethodNotSupported(call.to_string()))?;
                (source.ast, item_type)
            }
            Some(selector) => {
                let item = source.serializer.item_serializer()?;
                let (names, body) = translator.translate_lambda(context, selector, &[item])?;
                let value_type = body.expression.ty();
                (ast::Expression::map(source.ast, &names[0], body.ast), value_type)
            }
        };
        let (op, native) = if call.method.name == "Average" {
            (UnaryOperator::Avg, utils::native_average_type(&value_type))
        } else {
            (UnaryOperator::Sum, utils::native_sum_type(&value_type))
        };
        let result_type = &call.method.return_type;
        let ast = utils::convert_numeric(ast::Expression::unary(op, values), &native, result_type);
        translated(call, ast, context.serializer_for(result_type)?)
    }
}
