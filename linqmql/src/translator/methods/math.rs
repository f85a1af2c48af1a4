use super::{translated, MethodSignature, MethodTranslator, ParameterKind as P};
use crate::{
    ast::{self, BinaryOperator, NaryOperator, UnaryOperator},
    expression::{DeclaringType, MethodCallExpression},
    translator::{Error, ExpressionTranslator, Result, TranslatedExpression, TranslationContext},
};

const OVERLOADS: &[MethodSignature] = &[
    MethodSignature::static_method(DeclaringType::Math, "Abs", &[P::Numeric]),
    MethodSignature::static_method(DeclaringType::Math, "Ceiling", &[P::Numeric]),
    MethodSignature::static_method(DeclaringType::Math, "Floor", &[P::Numeric]),
    MethodSignature::static_method(DeclaringType::Math, "Truncate", &[P::Numeric]),
    MethodSignature::static_method(DeclaringType::Math, "Round", &[P::Numeric]),
    MethodSignature::static_method(DeclaringType::Math, "Round", &[P::Numeric, P::Int32]),
    MethodSignature::static_method(DeclaringType::Math, "Exp", &[P::Double]),
    MethodSignature::static_method(DeclaringType::Math, "Log", &[P::Double]),
    MethodSignature::static_method(DeclaringType::Math, "Log", &[P::Double, P::Double]),
    MethodSignature::static_method(DeclaringType::Math, "Log10", &[P::Double]),
    MethodSignature::static_method(DeclaringType::Math, "Pow", &[P::Double, P::Double]),
    MethodSignature::static_method(DeclaringType::Math, "Sqrt", &[P::Double]),
    MethodSignature::static_method(DeclaringType::Math, "Max", &[P::Numeric, P::Numeric]),
    MethodSignature::static_method(DeclaringType::Math, "Min", &[P::Numeric, P::Numeric]),
];

pub(crate) struct MathTranslator;

impl MethodTranslator for MathTranslator {
    fn overloads(&self) -> &'static [MethodSignature] {
        OVERLOADS
    }

    fn translate(
        &self,
        translator: &ExpressionTranslator,
        context: &TranslationContext,
        call: &MethodCallExpression,
    ) -> Result<TranslatedExpression> {
        let mut args = call
            .arguments
            .iter()
            .map(|arg| Ok(translator.translate(context, arg)?.ast))
            .collect::<Result<Vec<_>>>()?;
        let second = if args.len() == 2 { args.pop() } else { None };
        let first = args.pop().ok_or_else(|| Error::MethodNotSupported(call.to_string()))?;
        let ast = match (call.method.name.as_str(), second) {
            ("Abs", None) => ast::Expression::unary(UnaryOperator::Abs, first),
            ("Ceiling", None) => ast::Expression::unary(UnaryOperator::Ceil, first),
            ("Floor", None) => ast::Expression::unary(UnaryOperator::Floor, first),
            ("Truncate", None) => ast::Expression::unary(UnaryOperator::Trunc, first),
            ("Exp", None) => ast::Expression::unary(UnaryOperator::Exp, first),
            ("Log", None) => ast::Expression::unary(UnaryOperator::Ln, first),
            ("Log10", None) => ast::Expression::unary(UnaryOperator::Log10, first),
            ("Sqrt", None) => ast::Expression::unary(UnaryOperator::Sqrt, first),
            ("Round", None) => ast::Expression::binary(BinaryOperator::Round, first, ast::Expression::constant(0)),
            ("Round", Some(digits)) => ast::Expression::binary(BinaryOperator::Round, first, digits),
            ("Log", Some(base)) => ast::Expression::binary(BinaryOperator::Log, first, base),
            ("Pow", Some(exponent)) => ast::Expression::binary(BinaryOperator::Pow, first, exponent),
            ("Max", Some(other)) => ast::Expression::nary(NaryOperator::Max, vec![first, other]),
            ("Min", Some(other)) => ast::Expression::nary(NaryOperator::Min, vec![first, other]),
            _ => return Err(Error::MethodNotSupported(call.to_string())),
        };
        translated(call, ast, context.serializer_for(&call.method.return_type)?)
    }
}
