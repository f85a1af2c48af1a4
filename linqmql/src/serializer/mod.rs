//! Codecs describing how host values are stored as BSON. The translator
//! never encodes documents itself; it asks a serializer for the encoding of
//! constants and for the serializers of items, keys, values and members so
//! that the type of every translated sub-expression is known.

use crate::expression::{HostType, HostValue};
use serde::{Deserialize, Serialize};
use std::{fmt::Debug, sync::Arc};
use thiserror::Error;

mod registry;
mod standard;
pub use registry::{ClassMap, MemberMap, SerializerRegistry, StandardSerializerRegistry};
pub use standard::*;

#[cfg(test)]
mod test;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("serializer for {0} does not provide an item serializer")]
    NoItemSerializer(HostType),
    #[error("serializer for {0} does not provide key and value serializers")]
    NoDictionarySerializer(HostType),
    #[error("serializer for {ty} has no member named {member}")]
    NoMemberSerializer {
        ty: HostType,
        member: String,
        known: Vec<String>,
    },
    #[error("no serializer is registered for {0}")]
    UnmappedType(HostType),
    #[error("value {value} cannot be serialized by the serializer for {ty}")]
    IncompatibleValue { value: String, ty: HostType },
    #[error("class map {0} contains itself")]
    RecursiveClassMap(String),
    #[error("class map {0} is registered more than once")]
    DuplicateClassMap(String),
    #[error("invalid decimal literal {0}")]
    InvalidDecimal(String),
    #[error("invalid ObjectId literal {0}")]
    InvalidObjectId(String),
    #[error("invalid date literal {0}")]
    InvalidDateTime(String),
}

/// How a value is represented on the wire when it differs from the
/// natural BSON type of its host type.
#[derive(PartialEq, Eq, Debug, Clone, Copy, Default, Hash, Serialize, Deserialize)]
pub enum BsonRepresentation {
    #[default]
    Native,
    String,
    Int32,
    Int64,
    Double,
    Decimal128,
}

#[derive(PartialEq, Eq, Debug, Clone, Copy, Default, Hash, Serialize, Deserialize)]
pub enum DictionaryRepresentation {
    /// `{ key: value, ... }`
    #[default]
    Document,
    /// `[ { k: key, v: value }, ... ]`
    ArrayOfDocuments,
}

#[derive(Debug, Clone)]
pub struct MemberSerialization {
    pub member_name: String,
    pub element_name: String,
    pub serializer: SerializerRef,
}

pub trait Serializer: Debug + Send + Sync {
    fn value_type(&self) -> &HostType;

    fn representation(&self) -> BsonRepresentation {
        BsonRepresentation::Native
    }

    fn serialize_value(&self, value: &HostValue) -> Result<bson::Bson>;

    fn item_serializer(&self) -> Result<SerializerRef> {
        Err(Error::NoItemSerializer(self.value_type().clone()))
    }

    fn key_serializer(&self) -> Result<SerializerRef> {
        Err(Error::NoDictionarySerializer(self.value_type().clone()))
    }

    fn value_serializer(&self) -> Result<SerializerRef> {
        Err(Error::NoDictionarySerializer(self.value_type().clone()))
    }

    fn dictionary_representation(&self) -> Option<DictionaryRepresentation> {
        None
    }

    fn member(&self, name: &str) -> Result<MemberSerialization> {
        Err(Error::NoMemberSerializer {
            ty: self.value_type().clone(),
            member: name.to_string(),
            known: vec![],
        })
    }

    /// The serializer of a document type, with its members in declaration
    /// order. Empty for non-document serializers.
    fn members(&self) -> Vec<MemberSerialization> {
        vec![]
    }

    /// For `{ _v: value }` documents produced by scalar projections, the
    /// serializer of the wrapped value.
    fn wrapped_value_serializer(&self) -> Option<SerializerRef> {
        None
    }
}

pub type SerializerRef = Arc<dyn Serializer>;

impl PartialEq for dyn Serializer {
    fn eq(&self, other: &Self) -> bool {
        self.value_type() == other.value_type()
            && self.representation() == other.representation()
            && self.wrapped_value_serializer().is_some()
                == other.wrapped_value_serializer().is_some()
    }
}
