use super::{translated, MethodSignature, MethodTranslator, ParameterKind as P};
use crate::{
    ast::{self, UnaryOperator},
    expression::{DeclaringType, HostType, MethodCallExpression},
    translator::{utils, ExpressionTranslator, Result, TranslatedExpression, TranslationContext},
};

const OVERLOADS: &[MethodSignature] = &[
    MethodSignature::static_method(DeclaringType::Mql, "StandardDeviationPopulation", &[P::NumericSequence]),
    MethodSignature::static_method(
        DeclaringType::Mql,
        "StandardDeviationPopulation",
        &[P::Sequence, P::Lambda(1)],
    ),
    MethodSignature::static_method(DeclaringType::Mql, "StandardDeviationSample", &[P::NumericSequence]),
    MethodSignature::static_method(DeclaringType::Mql, "StandardDeviationSample", &[P::Sequence, P::Lambda(1)]),
];

/// `$stdDevPop` and `$stdDevSamp` over the items, or over the selected
/// values. The server always computes a double.
pub(crate) struct StandardDeviationTranslator;

impl MethodTranslator for StandardDeviationTranslator {
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
        let values = match call.arguments.get(1) {
            None => source.ast,
            Some(selector) => {
                let item = source.serializer.item_serializer()?;
                let (names, body) = translator.translate_lambda(context, selector, &[item])?;
                ast::Expression::map(source.ast, &names[0], body.ast)
            }
        };
        let op = if call.method.name == "StandardDeviationPopulation" {
            UnaryOperator::StdDevPop
        } else {
            UnaryOperator::StdDevSamp
        };
        let result_type = &call.method.return_type;
        let ast = utils::convert_numeric(ast::Expression::unary(op, values), &HostType::Double, result_type);
        translated(call, ast, context.serializer_for(result_type)?)
    }
}
