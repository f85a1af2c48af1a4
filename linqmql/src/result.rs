use crate::{codegen, serializer, translator};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error, PartialEq)]
pub enum Error {
    #[error("translator error: {0}")]
    Translator(#[from] translator::Error),
    #[error("codegen error: {0}")]
    Codegen(#[from] codegen::Error),
    #[error("serializer error: {0}")]
    Serializer(#[from] serializer::Error),
}
