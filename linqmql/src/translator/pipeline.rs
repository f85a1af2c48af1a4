use super::{
    utils, Error, ExpressionTranslator, FilterTranslator, Result, Symbol, TranslationContext,
};
use crate::{
    ast::{self, Accumulator, AccumulatorOperator, Group, SortDirection, SortField, Stage},
    expression::{DeclaringType, Expression, HostType, HostValue, MethodCallExpression},
    serializer::{SerializerRef, WrappedValueSerializer},
};
use linqmql_datastructures::unique_linked_hash_map::UniqueLinkedHashMap;
use std::sync::Arc;
use tracing::trace;

/// How the results of an executed pipeline become the value of the query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinalOperator {
    /// The first document; no documents is an error.
    First,
    /// The first document, or the default value.
    FirstOrDefault,
    /// The only document; no documents or more than one is an error.
    Single,
    /// The only document or the default value; more than one is an error.
    SingleOrDefault,
    /// Whether there is a document.
    Any,
    /// The `_v` field of the only document, or the default value of the
    /// result type when there is none.
    Scalar,
}

/// A pipeline ready to run against a collection.
#[derive(Debug, Clone)]
pub struct ExecutableQuery {
    pub collection: String,
    pub pipeline: ast::Pipeline,
    /// Describes the documents the pipeline outputs.
    pub output_serializer: SerializerRef,
    /// `None` when the query yields the whole sequence of documents.
    pub final_operator: Option<FinalOperator>,
}

/// The pipeline built so far and the documents it outputs.
struct PipelineState {
    collection: String,
    stages: Vec<Stage>,
    serializer: SerializerRef,
}

impl PipelineState {
    fn push(&mut self, stage: Stage) {
        trace!(stage = ?stage, "appending stage");
        self.stages.push(stage);
    }

    /// The expression a lambda parameter over the current documents
    /// translates to, and the serializer of that value. Scalar results of
    /// earlier stages live in the `_v` field.
    fn current(&self) -> (ast::Expression, SerializerRef) {
        match self.serializer.wrapped_value_serializer() {
            Some(inner) => (ast::Expression::field(&[WrappedValueSerializer::FIELD_NAME]), inner),
            None => (ast::Expression::root(), self.serializer.clone()),
        }
    }

    /// `context` with the parameter of a one-parameter lambda bound to the
    /// current document.
    fn bind<'a>(
        &self,
        context: &TranslationContext,
        lambda: &'a Expression,
    ) -> Result<(TranslationContext, &'a Expression)> {
        let l = lambda.as_lambda().ok_or_else(|| Error::not_supported(lambda))?;
        let parameter = match l.parameters.as_slice() {
            [parameter] => parameter,
            _ => return Err(Error::not_supported(lambda)),
        };
        let (ast, serializer) = self.current();
        let context = context.with_symbol(parameter, Symbol::current(&parameter.name, ast, serializer));
        Ok((context, l.body.as_ref()))
    }
}

/// Translates a chain of queryable methods over a collection into an
/// aggregation pipeline.
#[derive(Clone, Default)]
pub struct PipelineTranslator {
    expressions: ExpressionTranslator,
    filters: FilterTranslator,
}

impl PipelineTranslator {
    pub fn new(expressions: ExpressionTranslator) -> Self {
        Self {
            filters: FilterTranslator::new(expressions.clone()),
            expressions,
        }
    }

    pub fn translate(&self, context: &TranslationContext, expression: &Expression) -> Result<ExecutableQuery> {
        if let Expression::MethodCall(call) = expression {
            if let Some(final_operator) = self.final_operator(call) {
                let mut state = self.translate_source(context, &call.arguments[0])?;
                self.translate_final(context, &mut state, call)?;
                return Ok(ExecutableQuery {
                    collection: state.collection,
                    pipeline: ast::Pipeline { stages: state.stages },
                    output_serializer: state.serializer,
                    final_operator: Some(final_operator),
                });
            }
        }
        let state = self.translate_source(context, expression)?;
        Ok(ExecutableQuery {
            collection: state.collection,
            pipeline: ast::Pipeline { stages: state.stages },
            output_serializer: state.serializer,
            final_operator: None,
        })
    }

    fn final_operator(&self, call: &MethodCallExpression) -> Option<FinalOperator> {
        Some(match (call.method.declaring_type, call.method.name.as_str()) {
            (DeclaringType::Queryable, "First") => FinalOperator::First,
            (DeclaringType::Queryable, "FirstOrDefault") => FinalOperator::FirstOrDefault,
            (DeclaringType::Queryable, "Single") => FinalOperator::Single,
            (DeclaringType::Queryable, "SingleOrDefault") => FinalOperator::SingleOrDefault,
            (DeclaringType::Queryable, "Any") => FinalOperator::Any,
            (DeclaringType::Queryable, "Count" | "LongCount" | "Sum" | "Average" | "Min" | "Max")
            | (DeclaringType::Mql, "StandardDeviationPopulation" | "StandardDeviationSample") => FinalOperator::Scalar,
            _ => return None,
        })
    }

    /// Translates a method chain that yields a sequence of documents.
    fn translate_source(&self, context: &TranslationContext, expression: &Expression) -> Result<PipelineState> {
        let call = match expression {
            Expression::Queryable(q) => {
                return Ok(PipelineState {
                    collection: q.collection.clone(),
                    stages: vec![],
                    serializer: context.serializer_for(&q.document_type)?,
                })
            }
            Expression::MethodCall(call) if call.method.declaring_type == DeclaringType::Queryable => call,
            _ => return Err(Error::NotQueryable(expression.to_string())),
        };
        let mut state = self.translate_source(context, &call.arguments[0])?;
        match (call.method.name.as_str(), call.arguments.len()) {
            ("Where", 2) => {
                let filter = self.translate_predicate(context, &state, &call.arguments[1])?;
                state.push(Stage::Match(filter));
            }
            ("Select", 2) => self.translate_select(context, &mut state, &call.arguments[1])?,
            ("SelectMany", 2) => self.translate_select_many(context, &mut state, &call.arguments[1])?,
            ("OrderBy" | "OrderByDescending", 2) => {
                let field = self.translate_sort_field(context, &state, call)?;
                state.push(Stage::Sort(vec![field]));
            }
            ("ThenBy" | "ThenByDescending", 2) => {
                let field = self.translate_sort_field(context, &state, call)?;
                match state.stages.last_mut() {
                    Some(Stage::Sort(fields)) => fields.push(field),
                    _ => {
                        return Err(Error::not_supported_because(
                            expression,
                            "ThenBy must directly follow OrderBy or another ThenBy.",
                        ))
                    }
                }
            }
            ("Skip", 2) => {
                let n = constant_count(call, &call.arguments[1])?;
                if n > 0 {
                    state.push(Stage::Skip(n));
                }
            }
            ("Take", 2) => {
                let n = constant_count(call, &call.arguments[1])?;
                if n > 0 {
                    state.push(Stage::Limit(n));
                } else {
                    // `$limit` must be positive.
                    state.push(Stage::Match(ast::Filter::Expr(ast::Expression::constant(false))));
                }
            }
            ("Distinct", 1) => self.translate_distinct(&mut state)?,
            _ => return Err(Error::MethodNotSupported(call.to_string())),
        }
        Ok(state)
    }

    fn translate_predicate(
        &self,
        context: &TranslationContext,
        state: &PipelineState,
        predicate: &Expression,
    ) -> Result<ast::Filter> {
        let (context, body) = state.bind(context, predicate)?;
        self.filters.translate(&context, body)
    }

    /// Document results become the projected fields; any other result is
    /// projected into `_v`.
    fn translate_select(
        &self,
        context: &TranslationContext,
        state: &mut PipelineState,
        selector: &Expression,
    ) -> Result<()> {
        let (context, body) = state.bind(context, selector)?;
        let translated = self.expressions.translate(&context, body)?;
        match translated.ast {
            ast::Expression::Variable(ref name) if name == ast::ROOT => {}
            ast::Expression::Document(fields) if !fields.is_empty() => {
                state.push(Stage::Project(fields));
                state.serializer = translated.serializer;
            }
            ast => {
                let mut fields = UniqueLinkedHashMap::new();
                fields.insert(WrappedValueSerializer::FIELD_NAME.to_string(), ast)?;
                state.push(Stage::Project(fields));
                state.serializer = Arc::new(WrappedValueSerializer::new(translated.serializer));
            }
        }
        Ok(())
    }

    /// The selected arrays are projected into `_v` and unwound. Document
    /// items are promoted to the root.
    fn translate_select_many(
        &self,
        context: &TranslationContext,
        state: &mut PipelineState,
        selector: &Expression,
    ) -> Result<()> {
        let (context, body) = state.bind(context, selector)?;
        let translated = self.expressions.translate(&context, body)?;
        let item = translated.serializer.item_serializer()?;
        let mut fields = UniqueLinkedHashMap::new();
        fields.insert(WrappedValueSerializer::FIELD_NAME.to_string(), translated.ast)?;
        state.push(Stage::Project(fields));
        state.push(Stage::Unwind(vec![WrappedValueSerializer::FIELD_NAME.to_string()]));
        if item.members().is_empty() {
            state.serializer = Arc::new(WrappedValueSerializer::new(item));
        } else {
            state.push(Stage::ReplaceRoot(ast::Expression::field(&[
                WrappedValueSerializer::FIELD_NAME,
            ])));
            state.serializer = item;
        }
        Ok(())
    }

    fn translate_sort_field(
        &self,
        context: &TranslationContext,
        state: &PipelineState,
        call: &MethodCallExpression,
    ) -> Result<SortField> {
        let (context, body) = state.bind(context, &call.arguments[1])?;
        let key = self.expressions.translate(&context, body)?;
        let path = match key.ast {
            ast::Expression::FieldPath(ast::FieldPath { root: None, segments }) if !segments.is_empty() => segments,
            _ => {
                return Err(Error::not_supported_because(
                    &call.arguments[1],
                    "Sort keys must be fields of the current document.",
                ))
            }
        };
        let direction = if call.method.name.ends_with("Descending") {
            SortDirection::Descending
        } else {
            SortDirection::Ascending
        };
        Ok(SortField { path, direction })
    }

    /// Groups identical documents (or `_v` values) and restores the
    /// document shape from the group key.
    fn translate_distinct(&self, state: &mut PipelineState) -> Result<()> {
        let (current, _) = state.current();
        state.push(Stage::Group(Group {
            id: current,
            accumulators: UniqueLinkedHashMap::new(),
        }));
        let id = ast::Expression::field(&["_id"]);
        if state.serializer.wrapped_value_serializer().is_some() {
            let mut fields = UniqueLinkedHashMap::new();
            fields.insert(WrappedValueSerializer::FIELD_NAME.to_string(), id)?;
            state.push(Stage::Project(fields));
        } else {
            state.push(Stage::ReplaceRoot(id));
        }
        Ok(())
    }

    /// Appends the stages of a terminal operator: an optional predicate,
    /// a limit for element operators, or a `$group` computing the scalar.
    fn translate_final(
        &self,
        context: &TranslationContext,
        state: &mut PipelineState,
        call: &MethodCallExpression,
    ) -> Result<()> {
        let name = call.method.name.as_str();
        let argument = call.arguments.get(1);
        match name {
            "First" | "FirstOrDefault" | "Single" | "SingleOrDefault" | "Any" | "Count" | "LongCount" => {
                if let Some(predicate) = argument {
                    let filter = self.translate_predicate(context, state, predicate)?;
                    state.push(Stage::Match(filter));
                }
            }
            _ => {}
        }
        match name {
            "First" | "FirstOrDefault" => state.push(Stage::Limit(1)),
            "Single" | "SingleOrDefault" => state.push(Stage::Limit(2)),
            "Any" => {
                state.push(Stage::Limit(1));
                let mut fields = UniqueLinkedHashMap::new();
                fields.insert(
                    WrappedValueSerializer::FIELD_NAME.to_string(),
                    ast::Expression::constant(true),
                )?;
                state.push(Stage::Project(fields));
                state.serializer = Arc::new(WrappedValueSerializer::new(
                    context.serializer_for(&HostType::Boolean)?,
                ));
            }
            "Count" | "LongCount" => {
                let one = if name == "Count" {
                    ast::Expression::constant(1)
                } else {
                    ast::Expression::constant(1_i64)
                };
                self.push_scalar_group(state, AccumulatorOperator::Sum, one)?;
                state.serializer = Arc::new(WrappedValueSerializer::new(
                    context.serializer_for(&call.method.return_type)?,
                ));
            }
            _ => self.translate_accumulator(context, state, call)?,
        }
        Ok(())
    }

    /// `Sum`, `Average`, `Min`, `Max` and the standard deviations over the
    /// documents or over the selected values, converted to the return type
    /// where the server computes a different numeric type.
    fn translate_accumulator(
        &self,
        context: &TranslationContext,
        state: &mut PipelineState,
        call: &MethodCallExpression,
    ) -> Result<()> {
        let (value, value_serializer) = match call.arguments.get(1) {
            Some(selector) => {
                let (context, body) = state.bind(context, selector)?;
                let translated = self.expressions.translate(&context, body)?;
                (translated.ast, translated.serializer)
            }
            None => state.current(),
        };
        let value_type = value_serializer.value_type().clone();
        let result_type = &call.method.return_type;
        let (op, native) = match call.method.name.as_str() {
            "Sum" => (AccumulatorOperator::Sum, Some(utils::native_sum_type(&value_type))),
            "Average" => (AccumulatorOperator::Avg, Some(utils::native_average_type(&value_type))),
            "Min" => (AccumulatorOperator::Min, None),
            "Max" => (AccumulatorOperator::Max, None),
            "StandardDeviationPopulation" => (AccumulatorOperator::StdDevPop, Some(HostType::Double)),
            "StandardDeviationSample" => (AccumulatorOperator::StdDevSamp, Some(HostType::Double)),
            _ => return Err(Error::MethodNotSupported(call.to_string())),
        };
        self.push_scalar_group(state, op, value)?;
        let result = ast::Expression::field(&[WrappedValueSerializer::FIELD_NAME]);
        let serializer = match native {
            Some(native) => {
                let converted = utils::convert_numeric(result.clone(), &native, result_type);
                if converted != result {
                    let mut fields = UniqueLinkedHashMap::new();
                    fields.insert(WrappedValueSerializer::FIELD_NAME.to_string(), converted)?;
                    state.push(Stage::Project(fields));
                }
                context.serializer_for(result_type)?
            }
            None => value_serializer,
        };
        state.serializer = Arc::new(WrappedValueSerializer::new(serializer));
        Ok(())
    }

    fn push_scalar_group(
        &self,
        state: &mut PipelineState,
        op: AccumulatorOperator,
        arg: ast::Expression,
    ) -> Result<()> {
        let mut accumulators = UniqueLinkedHashMap::new();
        accumulators.insert(
            WrappedValueSerializer::FIELD_NAME.to_string(),
            Accumulator { op, arg },
        )?;
        state.push(Stage::Group(Group {
            id: ast::Expression::constant(bson::Bson::Null),
            accumulators,
        }));
        Ok(())
    }
}

/// `Skip` and `Take` counts must be known when the pipeline is built.
fn constant_count(call: &MethodCallExpression, argument: &Expression) -> Result<i64> {
    match utils::constant_argument(call, argument)? {
        HostValue::Int32(n) => Ok(i64::from(*n)),
        HostValue::Int64(n) => Ok(*n),
        _ => Err(Error::NonConstantArgument(call.to_string(), argument.to_string())),
    }
}
