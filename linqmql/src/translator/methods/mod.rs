//! Method translators. Each translator recognizes a family of method
//! shapes through a static table of signatures and translates calls that
//! match one of them. The registry dispatches a call to the first
//! translator registered for the method name whose table matches.

use super::{Error, ExpressionTranslator, Result, TranslatedExpression, TranslationContext};
use crate::{
    ast,
    expression::{DeclaringType, Expression, HostType, MethodCallExpression},
    serializer::SerializerRef,
};
use std::{collections::BTreeMap, sync::Arc};
use tracing::{trace, warn};

mod aggregate;
mod any_all;
mod average_sum;
mod contains;
mod convert;
mod count;
mod dates;
mod dictionary;
mod element_at;
mod equals_compare;
mod index_of;
mod math;
mod min_max;
mod regex;
mod select_where;
mod set_operations;
mod skip_take;
mod split;
mod standard_deviation;
mod string_predicates;
mod strings;
mod zip_range;

#[cfg(test)]
mod test;

/// What a parameter position accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterKind {
    Any,
    Boolean,
    Char,
    CharArray,
    Int32,
    Double,
    DateTime,
    String,
    StringArray,
    StringComparison,
    StringSplitOptions,
    Numeric,
    /// Arrays, lists and enumerables; strings are not sequences here.
    Sequence,
    NumericSequence,
    /// A lambda with this many parameters, possibly quoted.
    Lambda(usize),
}

impl ParameterKind {
    fn accepts(&self, ty: &HostType) -> bool {
        match self {
            ParameterKind::Any => true,
            ParameterKind::Boolean => ty == &HostType::Boolean,
            ParameterKind::Char => ty == &HostType::Char,
            ParameterKind::CharArray => ty == &HostType::array(HostType::Char),
            ParameterKind::Int32 => ty == &HostType::Int32,
            ParameterKind::Double => ty == &HostType::Double,
            ParameterKind::DateTime => ty.underlying_type() == &HostType::DateTime,
            ParameterKind::String => ty == &HostType::String,
            ParameterKind::StringArray => ty == &HostType::array(HostType::String),
            ParameterKind::StringComparison => ty == &HostType::StringComparison,
            ParameterKind::StringSplitOptions => ty == &HostType::StringSplitOptions,
            ParameterKind::Numeric => ty.is_numeric(),
            ParameterKind::Sequence => ty.is_sequence(),
            ParameterKind::NumericSequence => {
                ty.is_sequence() && ty.item_type().map_or(false, HostType::is_numeric)
            }
            ParameterKind::Lambda(n) => ty.function_parameters().map_or(false, |p| p.len() == *n),
        }
    }
}

/// One recognized method shape. `declaring_type: None` matches a method
/// of any type, such as `Equals` or `CompareTo`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MethodSignature {
    pub declaring_type: Option<DeclaringType>,
    pub name: &'static str,
    pub is_static: bool,
    pub parameters: &'static [ParameterKind],
}

impl MethodSignature {
    pub const fn instance(declaring_type: DeclaringType, name: &'static str, parameters: &'static [ParameterKind]) -> Self {
        Self {
            declaring_type: Some(declaring_type),
            name,
            is_static: false,
            parameters,
        }
    }

    /// Static methods, including extension methods whose first parameter
    /// is the source.
    pub const fn static_method(declaring_type: DeclaringType, name: &'static str, parameters: &'static [ParameterKind]) -> Self {
        Self {
            declaring_type: Some(declaring_type),
            name,
            is_static: true,
            parameters,
        }
    }

    pub const fn any_instance(name: &'static str, parameters: &'static [ParameterKind]) -> Self {
        Self {
            declaring_type: None,
            name,
            is_static: false,
            parameters,
        }
    }

    pub fn matches(&self, call: &MethodCallExpression) -> bool {
        let method = &call.method;
        self.name == method.name
            && self.is_static == method.is_static
            && self.declaring_type.map_or(true, |t| t == method.declaring_type)
            && self.parameters.len() == method.parameters.len()
            && self
                .parameters
                .iter()
                .zip(method.parameters.iter())
                .all(|(kind, ty)| kind.accepts(ty))
    }
}

pub trait MethodTranslator: Send + Sync {
    fn overloads(&self) -> &'static [MethodSignature];

    fn translate(
        &self,
        translator: &ExpressionTranslator,
        context: &TranslationContext,
        call: &MethodCallExpression,
    ) -> Result<TranslatedExpression>;
}

/// Method translators by method name, in registration order.
#[derive(Default)]
pub struct MethodTranslatorRegistry {
    translators: BTreeMap<&'static str, Vec<Arc<dyn MethodTranslator>>>,
}

impl MethodTranslatorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in translators. String `Equals` is registered ahead of
    /// the generic `Equals` so that comparison modes are honored.
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(aggregate::AggregateTranslator));
        registry.register(Arc::new(average_sum::AverageSumTranslator));
        registry.register(Arc::new(standard_deviation::StandardDeviationTranslator));
        registry.register(Arc::new(min_max::MinMaxTranslator));
        registry.register(Arc::new(any_all::AnyAllTranslator));
        registry.register(Arc::new(count::CountTranslator));
        registry.register(Arc::new(element_at::ElementAtTranslator));
        registry.register(Arc::new(contains::ContainsTranslator));
        registry.register(Arc::new(select_where::SelectTranslator));
        registry.register(Arc::new(select_where::WhereTranslator));
        registry.register(Arc::new(select_where::SelectManyTranslator));
        registry.register(Arc::new(zip_range::ZipTranslator));
        registry.register(Arc::new(zip_range::RangeTranslator));
        registry.register(Arc::new(skip_take::SkipTakeTranslator));
        registry.register(Arc::new(set_operations::SetOperationsTranslator));
        registry.register(Arc::new(index_of::IndexOfTranslator));
        registry.register(Arc::new(index_of::IndexOfAnyTranslator));
        registry.register(Arc::new(string_predicates::StringPredicateTranslator));
        registry.register(Arc::new(equals_compare::StringEqualsTranslator));
        registry.register(Arc::new(equals_compare::EqualsTranslator));
        registry.register(Arc::new(equals_compare::CompareTranslator));
        registry.register(Arc::new(strings::CaseTranslator));
        registry.register(Arc::new(strings::TrimTranslator));
        registry.register(Arc::new(strings::SubstringTranslator));
        registry.register(Arc::new(strings::ConcatTranslator));
        registry.register(Arc::new(strings::IsNullOrEmptyTranslator));
        registry.register(Arc::new(strings::ReplaceTranslator));
        registry.register(Arc::new(split::SplitTranslator));
        registry.register(Arc::new(convert::ToStringTranslator));
        registry.register(Arc::new(convert::ConvertTranslator));
        registry.register(Arc::new(math::MathTranslator));
        registry.register(Arc::new(dates::DateAddTranslator));
        registry.register(Arc::new(dictionary::ContainsKeyTranslator));
        registry.register(Arc::new(dictionary::IndexerTranslator));
        registry.register(Arc::new(regex::RegexIsMatchTranslator));
        registry
    }

    /// Appends a translator after those already registered for the same
    /// method names.
    pub fn register(&mut self, translator: Arc<dyn MethodTranslator>) {
        let mut names: Vec<&'static str> = translator.overloads().iter().map(|s| s.name).collect();
        names.dedup();
        for name in names {
            let entry = self.translators.entry(name).or_default();
            if !entry.iter().any(|t| Arc::ptr_eq(t, &translator)) {
                entry.push(translator.clone());
            }
        }
    }

    pub fn translate(
        &self,
        translator: &ExpressionTranslator,
        context: &TranslationContext,
        call: &MethodCallExpression,
    ) -> Result<TranslatedExpression> {
        let candidates = self
            .translators
            .get(call.method.name.as_str())
            .map(Vec::as_slice)
            .unwrap_or_default();
        for candidate in candidates {
            if candidate.overloads().iter().any(|s| s.matches(call)) {
                trace!(method = %call.method.name, "translating method call");
                return candidate.translate(translator, context, call);
            }
        }
        warn!(call = %call, "no translator matches method call");
        Err(Error::MethodNotSupported(call.to_string()))
    }
}

pub(crate) fn translated(
    call: &MethodCallExpression,
    ast: ast::Expression,
    serializer: SerializerRef,
) -> Result<TranslatedExpression> {
    Ok(TranslatedExpression {
        expression: Expression::MethodCall(call.clone()),
        ast,
        serializer,
    })
}

/// The arguments of a call with the instance, if any, first.
pub(crate) fn arguments(call: &MethodCallExpression) -> Vec<&Expression> {
    call.object
        .as_deref()
        .into_iter()
        .chain(call.arguments.iter())
        .collect()
}
