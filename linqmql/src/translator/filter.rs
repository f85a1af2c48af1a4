use super::{utils, Error, ExpressionTranslator, Result, Symbol, TranslationContext};
use crate::{
    ast::{self, ComparisonOperator, FieldFilter, FieldOperation, Filter},
    expression::{
        BinaryOperator, DeclaringType, Expression, HostType, HostValue, MethodCallExpression,
        UnaryOperator,
    },
    serializer::{DictionaryRepresentation, SerializerRef},
};
use bson::Bson;
use tracing::trace;

/// Where the predicate being translated is evaluated. Inside `$elemMatch`
/// paths are relative to the array element and `$expr` is not available.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    Document,
    Element,
}

/// Translates boolean host expressions into the match language. Shapes the
/// match language expresses directly use field shorthand; everything else
/// falls back to `$expr` over the aggregation translation.
#[derive(Clone, Default)]
pub struct FilterTranslator {
    expressions: ExpressionTranslator,
}

impl FilterTranslator {
    pub fn new(expressions: ExpressionTranslator) -> Self {
        Self { expressions }
    }

    /// Translates a predicate lambda whose parameter is the current
    /// document, described by `serializer`.
    pub fn translate_lambda(
        &self,
        context: &TranslationContext,
        lambda: &Expression,
        serializer: SerializerRef,
    ) -> Result<Filter> {
        let l = lambda.as_lambda().ok_or_else(|| Error::not_supported(lambda))?;
        let parameter = match l.parameters.as_slice() {
            [parameter] => parameter,
            _ => return Err(Error::not_supported(lambda)),
        };
        let context = context.with_symbol(
            parameter,
            Symbol::current(&parameter.name, ast::Expression::root(), serializer),
        );
        self.translate(&context, &l.body)
    }

    /// Translates a boolean expression whose parameters are already bound
    /// in `context`.
    pub fn translate(&self, context: &TranslationContext, expression: &Expression) -> Result<Filter> {
        self.translate_in(context, expression, Scope::Document)
    }

    fn translate_in(&self, context: &TranslationContext, expression: &Expression, scope: Scope) -> Result<Filter> {
        match expression.strip_quotes() {
            Expression::Binary(b) if b.ty.underlying_type() == &HostType::Boolean => match b.op {
                BinaryOperator::AndAlso | BinaryOperator::And => Ok(and(vec![
                    self.translate_in(context, &b.left, scope)?,
                    self.translate_in(context, &b.right, scope)?,
                ])),
                BinaryOperator::OrElse | BinaryOperator::Or => Ok(or(vec![
                    self.translate_in(context, &b.left, scope)?,
                    self.translate_in(context, &b.right, scope)?,
                ])),
                _ => self.translate_leaf(context, expression, scope),
            },
            Expression::Unary(u) if u.op == UnaryOperator::Not => {
                Ok(negate(self.translate_in(context, &u.operand, scope)?))
            }
            Expression::MethodCall(call) => match self.translate_method(context, call, scope)? {
                Some(filter) => Ok(filter),
                None => self.translate_leaf(context, expression, scope),
            },
            _ => self.translate_leaf(context, expression, scope),
        }
    }

    /// Translates the expression as an aggregation expression and matches
    /// the result against the shapes the match language can express.
    fn translate_leaf(&self, context: &TranslationContext, expression: &Expression, scope: Scope) -> Result<Filter> {
        let translated = self.expressions.translate(context, expression)?;
        if let Some(filter) = field_filter(&translated.ast) {
            return Ok(filter);
        }
        match scope {
            Scope::Document => {
                trace!(expression = %expression, "filter falls back to $expr");
                Ok(Filter::Expr(translated.ast))
            }
            Scope::Element => Err(Error::not_supported_because(
                expression,
                "Array element predicates must be expressible in the match language.",
            )),
        }
    }

    fn translate_method(
        &self,
        context: &TranslationContext,
        call: &MethodCallExpression,
        scope: Scope,
    ) -> Result<Option<Filter>> {
        let name = call.method.name.as_str();
        match (call.method.declaring_type, name, call.method.is_static) {
            (DeclaringType::String, "StartsWith" | "EndsWith" | "Contains", false) => {
                self.translate_string_predicate(context, call)
            }
            (DeclaringType::Regex, "IsMatch", true) => {
                let path = match self.field_path(context, &call.arguments[0])? {
                    Some(path) => path,
                    None => return Ok(None),
                };
                match call.arguments[1].as_constant() {
                    Some(HostValue::String(pattern)) => Ok(Some(field(
                        path,
                        FieldOperation::Regex {
                            pattern: pattern.clone(),
                            options: String::new(),
                        },
                    ))),
                    _ => Ok(None),
                }
            }
            (DeclaringType::String, "IsNullOrEmpty", true) => {
                let path = match self.field_path(context, &call.arguments[0])? {
                    Some(path) => path,
                    None => return Ok(None),
                };
                Ok(Some(field(
                    path,
                    FieldOperation::In(vec![Bson::Null, Bson::String(String::new())]),
                )))
            }
            (DeclaringType::Enumerable, "Contains", true) => self.translate_contains(context, call),
            (DeclaringType::List, "Contains", false) => self.translate_contains(context, call),
            (DeclaringType::Enumerable, "Any" | "All", true) => self.translate_any_all(context, call, scope),
            (DeclaringType::Dictionary, "ContainsKey", false) => {
                let object = match call.object.as_deref() {
                    Some(object) => object,
                    None => return Ok(None),
                };
                let dictionary = self.expressions.translate(context, object)?;
                if dictionary.serializer.dictionary_representation() != Some(DictionaryRepresentation::Document) {
                    return Ok(None);
                }
                match (path_of(&dictionary.ast), call.arguments[0].as_constant()) {
                    (Some(mut path), Some(HostValue::String(key)))
                        if !key.is_empty() && !key.starts_with('$') && !key.contains('.') =>
                    {
                        path.push(key.clone());
                        Ok(Some(field(path, FieldOperation::Exists(true))))
                    }
                    _ => Ok(None),
                }
            }
            _ => Ok(None),
        }
    }

    /// `StartsWith`, `EndsWith` and `Contains` of a constant on a field
    /// become anchored or unanchored regular expressions.
    fn translate_string_predicate(
        &self,
        context: &TranslationContext,
        call: &MethodCallExpression,
    ) -> Result<Option<Filter>> {
        let object = match call.object.as_deref() {
            Some(object) => object,
            None => return Ok(None),
        };
        let path = match self.field_path(context, object)? {
            Some(path) => path,
            None => return Ok(None),
        };
        let value = match call.arguments[0].as_constant() {
            Some(HostValue::String(s)) => s.clone(),
            Some(HostValue::Char(c)) => c.to_string(),
            _ => return Ok(None),
        };
        let ignore_case = match call.arguments.get(1) {
            Some(comparison) => utils::ignore_case(utils::comparison_argument(call, comparison)?)?,
            None => false,
        };
        let escaped = regex::escape(&value);
        let pattern = match call.method.name.as_str() {
            "StartsWith" => format!("^{escaped}"),
            "EndsWith" => format!("{escaped}$"),
            _ => escaped,
        };
        let options = if ignore_case { "i" } else { "" }.to_string();
        Ok(Some(field(path, FieldOperation::Regex { pattern, options })))
    }

    /// `constants.Contains(field)` is `$in`; `field.Contains(constant)` on
    /// an array field matches any element equal to the constant.
    fn translate_contains(&self, context: &TranslationContext, call: &MethodCallExpression) -> Result<Option<Filter>> {
        let args: Vec<&Expression> = call.object.as_deref().into_iter().chain(call.arguments.iter()).collect();
        let (source, value) = (args[0], args[1]);

        if let Some(path) = self.field_path(context, value)? {
            let item = self.expressions.translate(context, value)?.serializer;
            let values = match source {
                Expression::NewArray(array) => array
                    .elements
                    .iter()
                    .map(|e| match e.as_constant() {
                        Some(v) => Ok(Some(item.serialize_value(v)?)),
                        None => Ok(None),
                    })
                    .collect::<Result<Option<Vec<_>>>>()?,
                Expression::Constant(c) => match &c.value {
                    HostValue::Array(values) => Some(
                        values
                            .iter()
                            .map(|v| Ok(item.serialize_value(v)?))
                            .collect::<Result<Vec<_>>>()?,
                    ),
                    _ => None,
                },
                _ => None,
            };
            if let Some(values) = values {
                return Ok(Some(field(path, FieldOperation::In(values))));
            }
        }

        let array = self.expressions.translate(context, source)?;
        match (path_of(&array.ast), value.as_constant()) {
            (Some(path), Some(v)) => {
                let item = array.serializer.item_serializer()?;
                Ok(Some(field(
                    path,
                    FieldOperation::Comparison(ComparisonOperator::Eq, item.serialize_value(v)?),
                )))
            }
            _ => Ok(None),
        }
    }

    /// `Any()` tests for a non-empty array, `Any(predicate)` is
    /// `$elemMatch` and `All(predicate)` is the absence of an element
    /// failing the predicate.
    fn translate_any_all(
        &self,
        context: &TranslationContext,
        call: &MethodCallExpression,
        scope: Scope,
    ) -> Result<Option<Filter>> {
        let source = self.expressions.translate(context, &call.arguments[0])?;
        let path = match path_of(&source.ast) {
            Some(path) if !(scope == Scope::Element && path.is_empty()) => path,
            _ => return Ok(None),
        };
        let predicate = match call.arguments.get(1) {
            None if call.method.name == "Any" => {
                return Ok(Some(and(vec![
                    field(path.clone(), FieldOperation::Exists(true)),
                    field(path, FieldOperation::Not(Box::new(FieldOperation::Size(0)))),
                ])))
            }
            None => return Ok(None),
            Some(predicate) => predicate,
        };
        let l = predicate
            .strip_quotes()
            .as_lambda()
            .ok_or_else(|| Error::not_supported(predicate))?;
        let parameter = match l.parameters.as_slice() {
            [parameter] => parameter,
            _ => return Ok(None),
        };
        let item = source.serializer.item_serializer()?;
        let element = context.with_symbol(
            parameter,
            Symbol::current(
                &parameter.name,
                ast::Expression::FieldPath(ast::FieldPath {
                    root: None,
                    segments: vec![],
                }),
                item,
            ),
        );
        let condition = match self.translate_in(&element, &l.body, Scope::Element) {
            Ok(condition) => condition,
            Err(_) if scope == Scope::Document => return Ok(None),
            Err(e) => return Err(e),
        };
        let condition = match call.method.name.as_str() {
            "All" => negate(condition),
            _ => condition,
        };
        let condition = match element_filter(condition) {
            Some(condition) => condition,
            None if scope == Scope::Document => return Ok(None),
            None => {
                return Err(Error::not_supported_because(
                    Expression::MethodCall(call.clone()),
                    "Array element predicates must be expressible in the match language.",
                ))
            }
        };
        let elem_match = FieldOperation::ElemMatch(Box::new(condition));
        Ok(Some(match call.method.name.as_str() {
            "All" => field(path, FieldOperation::Not(Box::new(elem_match))),
            _ => field(path, elem_match),
        }))
    }

    /// The path of a field of the current document, if the expression is
    /// one.
    fn field_path(&self, context: &TranslationContext, expression: &Expression) -> Result<Option<Vec<String>>> {
        match expression {
            Expression::MemberAccess(_) | Expression::Parameter(_) => {
                Ok(path_of(&self.expressions.translate(context, expression)?.ast))
            }
            _ => Ok(None),
        }
    }
}

fn path_of(ast: &ast::Expression) -> Option<Vec<String>> {
    match ast {
        ast::Expression::FieldPath(ast::FieldPath { root: None, segments }) => Some(segments.clone()),
        _ => None,
    }
}

fn field(path: Vec<String>, op: FieldOperation) -> Filter {
    Filter::Field(FieldFilter { path, op })
}

fn and(filters: Vec<Filter>) -> Filter {
    Filter::And(
        filters
            .into_iter()
            .flat_map(|f| match f {
                Filter::And(inner) => inner,
                f => vec![f],
            })
            .collect(),
    )
}

fn or(filters: Vec<Filter>) -> Filter {
    Filter::Or(
        filters
            .into_iter()
            .flat_map(|f| match f {
                Filter::Or(inner) => inner,
                f => vec![f],
            })
            .collect(),
    )
}

fn flip(op: ComparisonOperator) -> ComparisonOperator {
    match op {
        ComparisonOperator::Gt => ComparisonOperator::Lt,
        ComparisonOperator::Gte => ComparisonOperator::Lte,
        ComparisonOperator::Lt => ComparisonOperator::Gt,
        ComparisonOperator::Lte => ComparisonOperator::Gte,
        op => op,
    }
}

fn comparison_operator(op: ast::BinaryOperator) -> Option<ComparisonOperator> {
    Some(match op {
        ast::BinaryOperator::Eq => ComparisonOperator::Eq,
        ast::BinaryOperator::Ne => ComparisonOperator::Ne,
        ast::BinaryOperator::Gt => ComparisonOperator::Gt,
        ast::BinaryOperator::Gte => ComparisonOperator::Gte,
        ast::BinaryOperator::Lt => ComparisonOperator::Lt,
        ast::BinaryOperator::Lte => ComparisonOperator::Lte,
        _ => return None,
    })
}

/// Matches an aggregation expression against the field shapes of the match
/// language: a boolean field, a field compared with a constant, membership
/// of a field in a constant array and the size of an array field.
fn field_filter(ast: &ast::Expression) -> Option<Filter> {
    if let Some(path) = path_of(ast) {
        return Some(field(path, FieldOperation::Comparison(ComparisonOperator::Eq, Bson::Boolean(true))));
    }
    let b = match ast {
        ast::Expression::Binary(b) => b,
        _ => return None,
    };
    if b.op == ast::BinaryOperator::In {
        return match (path_of(&b.left), b.right.as_constant()) {
            (Some(path), Some(Bson::Array(values))) => Some(field(path, FieldOperation::In(values.clone()))),
            _ => None,
        };
    }
    let op = comparison_operator(b.op)?;
    match (b.left.as_ref(), b.right.as_ref()) {
        (
            ast::Expression::Unary(ast::Unary {
                op: ast::UnaryOperator::Size,
                arg,
            }),
            ast::Expression::Constant(Bson::Int32(n)),
        ) if op == ComparisonOperator::Eq => path_of(arg).map(|path| field(path, FieldOperation::Size(*n))),
        (left, right) => match (path_of(left), right.as_constant(), left.as_constant(), path_of(right)) {
            (Some(path), Some(value), _, _) => Some(field(path, FieldOperation::Comparison(op, value.clone()))),
            (_, _, Some(value), Some(path)) => {
                Some(field(path, FieldOperation::Comparison(flip(op), value.clone())))
            }
            _ => None,
        },
    }
}

/// Rewrites an `$elemMatch` condition into a shape the match language can
/// render. Conditions on the element itself combine only by conjunction,
/// so disjunctions of equalities become `$in` and their negations `$nin`.
/// Returns `None` when no such shape exists.
fn element_filter(filter: Filter) -> Option<Filter> {
    let filter = match filter {
        Filter::Or(filters) => match element_values(&filters) {
            Some(values) => field(vec![], FieldOperation::In(values)),
            None => Filter::Or(filters),
        },
        Filter::Nor(filters) => match element_values(&filters) {
            Some(values) => field(vec![], FieldOperation::Nin(values)),
            None => Filter::Nor(filters),
        },
        filter => filter,
    };
    let renderable = match &filter {
        Filter::Field(_) => true,
        Filter::And(filters) => filters.iter().all(is_element_field) || !filters.iter().any(mentions_element),
        filter => !mentions_element(filter),
    };
    renderable.then_some(filter)
}

fn is_element_field(filter: &Filter) -> bool {
    matches!(filter, Filter::Field(f) if f.path.is_empty())
}

/// Whether any field operation in the filter applies to the element
/// itself rather than to one of its fields.
fn mentions_element(filter: &Filter) -> bool {
    match filter {
        Filter::Field(f) => f.path.is_empty(),
        Filter::And(filters) | Filter::Or(filters) | Filter::Nor(filters) => filters.iter().any(mentions_element),
        Filter::Expr(_) => false,
    }
}

/// The values of a disjunction of equality or membership tests on the
/// element itself.
fn element_values(filters: &[Filter]) -> Option<Vec<Bson>> {
    let mut values = Vec::new();
    for filter in filters {
        match filter {
            Filter::Field(f) if f.path.is_empty() => match &f.op {
                FieldOperation::Comparison(ComparisonOperator::Eq, value) => values.push(value.clone()),
                FieldOperation::In(vs) => values.extend(vs.iter().cloned()),
                _ => return None,
            },
            _ => return None,
        }
    }
    Some(values)
}

/// The negation of a filter, pushed down to the field operations where the
/// match language has a complementary operator.
pub(crate) fn negate(filter: Filter) -> Filter {
    match filter {
        Filter::Field(FieldFilter { path, op }) => {
            let op = match op {
                FieldOperation::Comparison(ComparisonOperator::Eq, value) => {
                    FieldOperation::Comparison(ComparisonOperator::Ne, value)
                }
                FieldOperation::Comparison(ComparisonOperator::Ne, value) => {
                    FieldOperation::Comparison(ComparisonOperator::Eq, value)
                }
                FieldOperation::In(values) => FieldOperation::Nin(values),
                FieldOperation::Nin(values) => FieldOperation::In(values),
                FieldOperation::Exists(b) => FieldOperation::Exists(!b),
                FieldOperation::Not(inner) => *inner,
                op => FieldOperation::Not(Box::new(op)),
            };
            field(path, op)
        }
        Filter::Or(filters) => Filter::Nor(filters),
        Filter::Nor(filters) => or(filters),
        Filter::Expr(e) => Filter::Expr(ast::Expression::not(e)),
        filter @ Filter::And(_) => Filter::Nor(vec![filter]),
    }
}
