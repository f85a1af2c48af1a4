//! Translation of host expression trees into the aggregation AST. The
//! dispatcher in `expressions` handles node kinds, `members` handles
//! member accesses, `methods` holds one translator per family of method
//! shapes, `filter` produces match-language predicates and `pipeline`
//! assembles stages from queryable method chains.

use crate::{
    expression::{HostType, StringComparison},
    options::ServerVersion,
    serializer,
    usererror::{util::generate_suggestion, UserError, UserErrorDisplay},
};
use linqmql_datastructures::unique_linked_hash_map::DuplicateKeyError;

mod context;
mod expressions;
mod filter;
mod members;
pub mod methods;
mod pipeline;
mod utils;

pub use context::{Symbol, TranslationContext};
pub use expressions::{ExpressionTranslator, TranslatedExpression};
pub use filter::FilterTranslator;
pub use methods::{MethodSignature, MethodTranslator, MethodTranslatorRegistry, ParameterKind};
pub use pipeline::{ExecutableQuery, FinalOperator, PipelineTranslator};


pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, UserErrorDisplay, PartialEq)]
pub enum Error {
    /// The rendered expression and, when there is one, why it was rejected.
    ExpressionNotSupported(String, Option<String>),
    MethodNotSupported(String),
    UnboundParameter(String),
    NotQueryable(String),
    RequiresServerVersion {
        operator: &'static str,
        required: ServerVersion,
        configured: ServerVersion,
    },
    /// The rendered method call and the argument that must be a constant.
    NonConstantArgument(String, String),
    UnsupportedStringComparison(StringComparison),
    UnsupportedSplitSeparator(String),
    InvalidDocumentKey(String),
    DuplicateKey(DuplicateKeyError),
    Serializer(serializer::Error),
}

impl From<serializer::Error> for Error {
    fn from(value: serializer::Error) -> Self {
        Error::Serializer(value)
    }
}

impl From<DuplicateKeyError> for Error {
    fn from(value: DuplicateKeyError) -> Self {
        Error::DuplicateKey(value)
    }
}

impl Error {
    pub(crate) fn not_supported(expression: impl ToString) -> Self {
        Error::ExpressionNotSupported(expression.to_string(), None)
    }

    pub(crate) fn not_supported_because(expression: impl ToString, reason: &str) -> Self {
        Error::ExpressionNotSupported(expression.to_string(), Some(reason.to_string()))
    }
}

impl UserError for Error {
    fn code(&self) -> u32 {
        match self {
            Error::ExpressionNotSupported(_, _) => 1000,
            Error::MethodNotSupported(_) => 1001,
            Error::UnboundParameter(_) => 1002,
            Error::NotQueryable(_) => 1003,
            Error::RequiresServerVersion { .. } => 1004,
            Error::NonConstantArgument(_, _) => 1100,
            Error::UnsupportedStringComparison(_) => 1101,
            Error::UnsupportedSplitSeparator(_) => 1102,
            Error::InvalidDocumentKey(_) => 1103,
            Error::DuplicateKey(_) => 1104,
            Error::Serializer(_) => 1200,
        }
    }

    fn user_message(&self) -> Option<String> {
        match self {
            Error::ExpressionNotSupported(_, reason) => reason.clone(),
            Error::MethodNotSupported(_) => None,
            Error::UnboundParameter(_) => None,
            Error::NotQueryable(_) => Some(
                "Queryable sources can only appear at the root of a query pipeline.".to_string(),
            ),
            Error::RequiresServerVersion { .. } => Some(
                "Raise the compatibility level or rewrite the expression.".to_string(),
            ),
            Error::NonConstantArgument(_, _) => None,
            Error::UnsupportedStringComparison(_) => Some(
                "Only ordinal and case-insensitive comparisons are supported.".to_string(),
            ),
            Error::UnsupportedSplitSeparator(_) => Some(
                "Split is only supported with a single constant separator.".to_string(),
            ),
            Error::InvalidDocumentKey(_) => None,
            Error::DuplicateKey(_) => None,
            Error::Serializer(serializer::Error::NoMemberSerializer { member, known, .. }) => {
                match generate_suggestion(member, known) {
                    Ok(suggestions) if !suggestions.is_empty() => Some(format!(
                        "Member `{}` not found. Did you mean: {}",
                        member,
                        suggestions.join(", ")
                    )),
                    Ok(_) => Some(format!("Member `{member}` not found.")),
                    Err(e) => Some(e),
                }
            }
            Error::Serializer(_) => None,
        }
    }

    fn technical_message(&self) -> String {
        match self {
            Error::ExpressionNotSupported(expression, _) => {
                format!("expression not supported: {expression}")
            }
            Error::MethodNotSupported(expression) => {
                format!("method not supported: {expression}")
            }
            Error::UnboundParameter(name) => format!("parameter `{name}` is not in scope"),
            Error::NotQueryable(expression) => {
                format!("expression is not a queryable source: {expression}")
            }
            Error::RequiresServerVersion {
                operator,
                required,
                configured,
            } => format!(
                "{operator} requires server version {required} but the compatibility level is {configured}"
            ),
            Error::NonConstantArgument(expression, argument) => format!(
                "argument `{argument}` of {expression} must be a constant"
            ),
            Error::UnsupportedStringComparison(comparison) => {
                format!("string comparison {comparison:?} is not supported")
            }
            Error::UnsupportedSplitSeparator(expression) => {
                format!("unsupported separator in {expression}")
            }
            Error::InvalidDocumentKey(key) => format!(
                "invalid document key '{key}': document keys may not be empty, contain dots, or start with dollars"
            ),
            Error::DuplicateKey(e) => e.to_string(),
            Error::Serializer(e) => e.to_string(),
        }
    }
}

/// True when values of this type are stored as embedded documents.
pub(crate) fn is_document_type(ty: &HostType) -> bool {
    matches!(ty.underlying_type(), HostType::Class(_) | HostType::Anonymous(_))
}
