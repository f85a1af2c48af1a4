pub mod ast;
mod codegen;
pub mod expression;
pub mod options;
pub mod result;
pub mod serializer;
#[cfg(test)]
mod test;
pub mod translator;
pub mod usererror;

use crate::{
    ast::simplifier,
    codegen::MqlCodeGenerator,
    expression::Expression,
    result::Result,
    serializer::SerializerRef,
    translator::{
        ExpressionTranslator, FilterTranslator, FinalOperator, PipelineTranslator, Symbol,
        TranslationContext,
    },
};
use lazy_static::lazy_static;
use tracing::debug;

lazy_static! {
    static ref EXPRESSION_TRANSLATOR: ExpressionTranslator = ExpressionTranslator::standard();
}

/// A translated expression: the rendered aggregation expression and the
/// serializer that decodes the values it produces.
#[derive(Debug, Clone)]
pub struct Translation {
    pub expression: bson::Bson,
    pub output_serializer: SerializerRef,
}

/// A translated predicate rendered in the match language.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterTranslation {
    pub filter: bson::Document,
}

/// Contains all the information needed to run the translation of a
/// queryable method chain.
#[derive(Debug, Clone)]
pub struct PipelineTranslation {
    pub collection: String,
    pub pipeline: Vec<bson::Document>,
    pub output_serializer: SerializerRef,
    pub final_operator: Option<FinalOperator>,
}

/// Translates a one-parameter lambda whose parameter is the current
/// document into an aggregation expression. Any other expression is
/// translated as is, so it may only refer to constants.
#[tracing::instrument(skip_all)]
pub fn translate_expression(context: &TranslationContext, expression: &Expression) -> Result<Translation> {
    debug!(expression = %expression, "translating expression");
    let (context, body) = match expression.as_lambda() {
        Some(lambda) if lambda.parameters.len() == 1 => {
            let parameter = &lambda.parameters[0];
            let serializer = context.serializer_for(&parameter.ty)?;
            let context = context.with_symbol(
                parameter,
                Symbol::current(&parameter.name, ast::Expression::root(), serializer),
            );
            (context, lambda.body.as_ref())
        }
        _ => (context.clone(), expression),
    };
    let translated = EXPRESSION_TRANSLATOR.translate(&context, body)?;
    let simplified = simplifier::simplify_expression(translated.ast, context.options());
    let rendered = MqlCodeGenerator::default().codegen_expression(simplified)?;
    debug!(rendered = %rendered, "translated expression");
    Ok(Translation {
        expression: rendered,
        output_serializer: translated.serializer,
    })
}

/// Translates a predicate lambda over the current document into a match
/// filter, using field shorthand wherever the match language allows.
#[tracing::instrument(skip_all)]
pub fn translate_filter(context: &TranslationContext, predicate: &Expression) -> Result<FilterTranslation> {
    debug!(predicate = %predicate, "translating filter");
    let lambda = predicate
        .as_lambda()
        .ok_or_else(|| translator::Error::ExpressionNotSupported(predicate.to_string(), None))?;
    let serializer = match lambda.parameters.as_slice() {
        [parameter] => context.serializer_for(&parameter.ty)?,
        _ => return Err(translator::Error::ExpressionNotSupported(predicate.to_string(), None).into()),
    };
    let filter = FilterTranslator::new(EXPRESSION_TRANSLATOR.clone()).translate_lambda(context, predicate, serializer)?;
    let simplified = simplifier::simplify_filter(filter, context.options());
    let rendered = MqlCodeGenerator::default().codegen_filter(simplified)?;
    debug!(rendered = %rendered, "translated filter");
    Ok(FilterTranslation { filter: rendered })
}

/// Translates a queryable method chain rooted at a collection into an
/// aggregation pipeline.
#[tracing::instrument(skip_all)]
pub fn translate_pipeline(context: &TranslationContext, query: &Expression) -> Result<PipelineTranslation> {
    debug!(query = %query, "translating pipeline");
    let executable = PipelineTranslator::new(EXPRESSION_TRANSLATOR.clone()).translate(context, query)?;
    let simplified = simplifier::simplify_pipeline(executable.pipeline, context.options());
    let pipeline = MqlCodeGenerator::default().codegen_pipeline(simplified)?;
    debug!(stages = pipeline.len(), collection = %executable.collection, "translated pipeline");
    Ok(PipelineTranslation {
        collection: executable.collection,
        pipeline,
        output_serializer: executable.output_serializer,
        final_operator: executable.final_operator,
    })
}
