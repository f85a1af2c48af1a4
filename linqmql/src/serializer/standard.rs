use super::*;
use bson::{oid::ObjectId, Bson, Decimal128, Document};
use std::str::FromStr;

pub(crate) fn parse_decimal(text: &str) -> Result<Decimal128> {
    Decimal128::from_str(text).map_err(|_| Error::InvalidDecimal(text.to_string()))
}

fn parse_date(text: &str) -> Result<bson::DateTime> {
    chrono::DateTime::parse_from_rfc3339(text)
        .map(|dt| bson::DateTime::from_chrono(dt.with_timezone(&chrono::Utc)))
        .map_err(|_| Error::InvalidDateTime(text.to_string()))
}

fn parse_object_id(text: &str) -> Result<ObjectId> {
    ObjectId::parse_str(text).map_err(|_| Error::InvalidObjectId(text.to_string()))
}

/// Encodes a value using only its own shape, for constants whose static
/// type is `object`.
pub fn infer_bson(value: &HostValue) -> Result<Bson> {
    Ok(match value {
        HostValue::Null => Bson::Null,
        HostValue::Boolean(b) => Bson::Boolean(*b),
        HostValue::Char(c) => Bson::Int32(*c as i32),
        HostValue::Int32(i) => Bson::Int32(*i),
        HostValue::Int64(i) => Bson::Int64(*i),
        HostValue::Single(x) => Bson::Double(*x as f64),
        HostValue::Double(x) => Bson::Double(*x),
        HostValue::Decimal(d) => Bson::Decimal128(parse_decimal(d)?),
        HostValue::String(s) => Bson::String(s.clone()),
        HostValue::DateTime(d) => Bson::DateTime(parse_date(d)?),
        HostValue::ObjectId(o) => Bson::ObjectId(parse_object_id(o)?),
        HostValue::Array(items) => {
            Bson::Array(items.iter().map(infer_bson).collect::<Result<_>>()?)
        }
        HostValue::Document(members) => Bson::Document(
            members
                .iter()
                .map(|(k, v)| Ok((k.clone(), infer_bson(v)?)))
                .collect::<Result<Document>>()?,
        ),
        HostValue::StringComparison(c) => Bson::Int32(*c as i32),
        HostValue::StringSplitOptions(o) => Bson::Int32(*o as i32),
    })
}

fn incompatible(value: &HostValue, ty: &HostType) -> Error {
    Error::IncompatibleValue {
        value: value.to_string(),
        ty: ty.clone(),
    }
}

fn as_f64(b: &Bson) -> Option<f64> {
    match b {
        Bson::Int32(i) => Some(*i as f64),
        Bson::Int64(i) => Some(*i as f64),
        Bson::Double(x) => Some(*x),
        Bson::Decimal128(d) => d.to_string().parse().ok(),
        _ => None,
    }
}

/// Converts a natively encoded numeric value into the BSON type a numeric
/// host type or representation requires.
fn coerce_numeric(native: Bson, target: &HostType, original: &HostValue) -> Result<Bson> {
    let fail = || incompatible(original, target);
    Ok(match (target, &native) {
        (HostType::Int32, Bson::Int32(_)) => native,
        (HostType::Int32, Bson::Int64(i)) => Bson::Int32(i32::try_from(*i).map_err(|_| fail())?),
        (HostType::Int64, Bson::Int32(i)) => Bson::Int64(*i as i64),
        (HostType::Int64, Bson::Int64(_)) => native,
        (HostType::Single | HostType::Double, _) => Bson::Double(as_f64(&native).ok_or_else(fail)?),
        (HostType::Decimal, Bson::Decimal128(_)) => native,
        (HostType::Decimal, Bson::Int32(i)) => Bson::Decimal128(parse_decimal(&i.to_string())?),
        (HostType::Decimal, Bson::Int64(i)) => Bson::Decimal128(parse_decimal(&i.to_string())?),
        (HostType::Decimal, Bson::Double(x)) => Bson::Decimal128(parse_decimal(&x.to_string())?),
        _ => return Err(fail()),
    })
}

fn apply_representation(native: Bson, representation: BsonRepresentation, value: &HostValue, ty: &HostType) -> Result<Bson> {
    let target = match representation {
        BsonRepresentation::Native => return Ok(native),
        BsonRepresentation::String => {
            return Ok(match native {
                Bson::Null => Bson::Null,
                Bson::String(_) => native,
                Bson::Int32(i) => Bson::String(i.to_string()),
                Bson::Int64(i) => Bson::String(i.to_string()),
                Bson::Double(x) => Bson::String(x.to_string()),
                Bson::Decimal128(d) => Bson::String(d.to_string()),
                Bson::ObjectId(o) => Bson::String(o.to_hex()),
                Bson::Boolean(b) => Bson::String(b.to_string()),
                _ => return Err(incompatible(value, ty)),
            })
        }
        BsonRepresentation::Int32 => HostType::Int32,
        BsonRepresentation::Int64 => HostType::Int64,
        BsonRepresentation::Double => HostType::Double,
        BsonRepresentation::Decimal128 => HostType::Decimal,
    };
    match native {
        Bson::Null => Ok(Bson::Null),
        native => coerce_numeric(native, &target, value),
    }
}

/// Serializer for scalar host types.
#[derive(Debug, Clone)]
pub struct PrimitiveSerializer {
    ty: HostType,
    representation: BsonRepresentation,
}

impl PrimitiveSerializer {
    pub fn new(ty: HostType) -> Self {
        Self::with_representation(ty, BsonRepresentation::Native)
    }

    pub fn with_representation(ty: HostType, representation: BsonRepresentation) -> Self {
        Self { ty, representation }
    }
}

impl Serializer for PrimitiveSerializer {
    fn value_type(&self) -> &HostType {
        &self.ty
    }

    fn representation(&self) -> BsonRepresentation {
        self.representation
    }

    fn serialize_value(&self, value: &HostValue) -> Result<Bson> {
        let native = match (&self.ty, value) {
            (_, HostValue::Null) => Bson::Null,
            (HostType::Boolean, HostValue::Boolean(b)) => Bson::Boolean(*b),
            (HostType::Char, HostValue::Char(c)) => Bson::Int32(*c as i32),
            (HostType::String, HostValue::String(s)) => Bson::String(s.clone()),
            (HostType::String, HostValue::Char(c)) => Bson::String(c.to_string()),
            (HostType::DateTime, HostValue::DateTime(d)) => Bson::DateTime(parse_date(d)?),
            (HostType::ObjectId, HostValue::ObjectId(o)) => Bson::ObjectId(parse_object_id(o)?),
            (HostType::StringComparison, HostValue::StringComparison(c)) => Bson::Int32(*c as i32),
            (HostType::StringSplitOptions, HostValue::StringSplitOptions(o)) => {
                Bson::Int32(*o as i32)
            }
            (
                ty,
                HostValue::Int32(_)
                | HostValue::Int64(_)
                | HostValue::Single(_)
                | HostValue::Double(_)
                | HostValue::Decimal(_),
            ) if ty.is_numeric() => coerce_numeric(infer_bson(value)?, ty, value)?,
            _ => return Err(incompatible(value, &self.ty)),
        };
        apply_representation(native, self.representation, value, &self.ty)
    }
}

#[derive(Debug, Clone)]
pub struct NullableSerializer {
    ty: HostType,
    inner: SerializerRef,
}

impl NullableSerializer {
    pub fn new(inner: SerializerRef) -> Self {
        Self {
            ty: HostType::nullable(inner.value_type().clone()),
            inner,
        }
    }

    pub fn inner(&self) -> &SerializerRef {
        &self.inner
    }
}

impl Serializer for NullableSerializer {
    fn value_type(&self) -> &HostType {
        &self.ty
    }

    fn representation(&self) -> BsonRepresentation {
        self.inner.representation()
    }

    fn serialize_value(&self, value: &HostValue) -> Result<Bson> {
        match value {
            HostValue::Null => Ok(Bson::Null),
            value => self.inner.serialize_value(value),
        }
    }
}

/// Serializer for arrays, lists and other sequences stored as BSON arrays.
#[derive(Debug, Clone)]
pub struct ArraySerializer {
    ty: HostType,
    item: SerializerRef,
}

impl ArraySerializer {
    pub fn new(ty: HostType, item: SerializerRef) -> Self {
        Self { ty, item }
    }

    /// An `IEnumerable<T>` over the given item serializer.
    pub fn enumerable(item: SerializerRef) -> Self {
        Self::new(HostType::enumerable(item.value_type().clone()), item)
    }
}

impl Serializer for ArraySerializer {
    fn value_type(&self) -> &HostType {
        &self.ty
    }

    fn serialize_value(&self, value: &HostValue) -> Result<Bson> {
        match value {
            HostValue::Null => Ok(Bson::Null),
            HostValue::Array(items) => Ok(Bson::Array(
                items
                    .iter()
                    .map(|item| self.item.serialize_value(item))
                    .collect::<Result<_>>()?,
            )),
            _ => Err(incompatible(value, &self.ty)),
        }
    }

    fn item_serializer(&self) -> Result<SerializerRef> {
        Ok(self.item.clone())
    }
}

#[derive(Debug, Clone)]
pub struct DictionarySerializer {
    ty: HostType,
    key: SerializerRef,
    value: SerializerRef,
    representation: DictionaryRepresentation,
}

impl DictionarySerializer {
    pub fn new(key: SerializerRef, value: SerializerRef, representation: DictionaryRepresentation) -> Self {
        Self {
            ty: HostType::dictionary(key.value_type().clone(), value.value_type().clone()),
            key,
            value,
            representation,
        }
    }

    fn key_string(&self, key: &HostValue) -> Result<String> {
        match self.key.serialize_value(key)? {
            Bson::String(s) => Ok(s),
            _ => Err(incompatible(key, self.key.value_type())),
        }
    }
}

impl Serializer for DictionarySerializer {
    fn value_type(&self) -> &HostType {
        &self.ty
    }

    fn serialize_value(&self, value: &HostValue) -> Result<Bson> {
        let entries = match value {
            HostValue::Null => return Ok(Bson::Null),
            HostValue::Document(entries) => entries,
            _ => return Err(incompatible(value, &self.ty)),
        };
        match self.representation {
            DictionaryRepresentation::Document => Ok(Bson::Document(
                entries
                    .iter()
                    .map(|(k, v)| {
                        Ok((
                            self.key_string(&HostValue::String(k.clone()))?,
                            self.value.serialize_value(v)?,
                        ))
                    })
                    .collect::<Result<Document>>()?,
            )),
            DictionaryRepresentation::ArrayOfDocuments => Ok(Bson::Array(
                entries
                    .iter()
                    .map(|(k, v)| {
                        let mut entry = Document::new();
                        entry.insert("k", self.key.serialize_value(&HostValue::String(k.clone()))?);
                        entry.insert("v", self.value.serialize_value(v)?);
                        Ok(Bson::Document(entry))
                    })
                    .collect::<Result<_>>()?,
            )),
        }
    }

    fn key_serializer(&self) -> Result<SerializerRef> {
        Ok(self.key.clone())
    }

    fn value_serializer(&self) -> Result<SerializerRef> {
        Ok(self.value.clone())
    }

    fn dictionary_representation(&self) -> Option<DictionaryRepresentation> {
        Some(self.representation)
    }
}

/// Serializer for document classes. Class maps produce one with element
/// names taken from the map; anonymous types and member initializers
/// produce one whose element names equal the member names.
#[derive(Debug, Clone)]
pub struct DocumentSerializer {
    ty: HostType,
    members: Vec<MemberSerialization>,
}

impl DocumentSerializer {
    pub fn new(ty: HostType, members: Vec<MemberSerialization>) -> Self {
        Self { ty, members }
    }

    pub fn anonymous(members: Vec<(String, SerializerRef)>) -> Self {
        let ty = HostType::Anonymous(
            members
                .iter()
                .map(|(name, s)| (name.clone(), s.value_type().clone()))
                .collect(),
        );
        let members = members
            .into_iter()
            .map(|(name, serializer)| MemberSerialization {
                member_name: name.clone(),
                element_name: name,
                serializer,
            })
            .collect();
        Self { ty, members }
    }
}

impl Serializer for DocumentSerializer {
    fn value_type(&self) -> &HostType {
        &self.ty
    }

    fn serialize_value(&self, value: &HostValue) -> Result<Bson> {
        let members = match value {
            HostValue::Null => return Ok(Bson::Null),
            HostValue::Document(members) => members,
            _ => return Err(incompatible(value, &self.ty)),
        };
        let mut out = Document::new();
        for (name, v) in members {
            let m = self.member(name)?;
            out.insert(m.element_name, m.serializer.serialize_value(v)?);
        }
        Ok(Bson::Document(out))
    }

    fn member(&self, name: &str) -> Result<MemberSerialization> {
        self.members
            .iter()
            .find(|m| m.member_name == name)
            .cloned()
            .ok_or_else(|| Error::NoMemberSerializer {
                ty: self.ty.clone(),
                member: name.to_string(),
                known: self.members.iter().map(|m| m.member_name.clone()).collect(),
            })
    }

    fn members(&self) -> Vec<MemberSerialization> {
        self.members.clone()
    }
}

/// Serializer for the `{ _v: value }` documents that a pipeline produces
/// when a projection yields a scalar.
#[derive(Debug, Clone)]
pub struct WrappedValueSerializer {
    inner: SerializerRef,
}

impl WrappedValueSerializer {
    pub const FIELD_NAME: &'static str = "_v";

    pub fn new(inner: SerializerRef) -> Self {
        Self { inner }
    }
}

impl Serializer for WrappedValueSerializer {
    fn value_type(&self) -> &HostType {
        self.inner.value_type()
    }

    fn representation(&self) -> BsonRepresentation {
        self.inner.representation()
    }

    fn serialize_value(&self, value: &HostValue) -> Result<Bson> {
        let mut out = Document::new();
        out.insert(Self::FIELD_NAME, self.inner.serialize_value(value)?);
        Ok(Bson::Document(out))
    }

    fn wrapped_value_serializer(&self) -> Option<SerializerRef> {
        Some(self.inner.clone())
    }
}

/// Serializer for values whose static type is `object`.
#[derive(Debug, Clone)]
pub struct ObjectSerializer {
    ty: HostType,
}

impl Default for ObjectSerializer {
    fn default() -> Self {
        Self {
            ty: HostType::Object,
        }
    }
}

impl Serializer for ObjectSerializer {
    fn value_type(&self) -> &HostType {
        &self.ty
    }

    fn serialize_value(&self, value: &HostValue) -> Result<Bson> {
        infer_bson(value)
    }
}

/// Builds the serializer for a type. Class types are resolved through
/// `classes`; `representation` applies to the scalar at the bottom of any
/// nullable or sequence wrappers.
pub(crate) fn resolve_type(
    ty: &HostType,
    representation: BsonRepresentation,
    dictionary_representation: DictionaryRepresentation,
    classes: &mut dyn FnMut(&str) -> Result<SerializerRef>,
) -> Result<SerializerRef> {
    Ok(match ty {
        HostType::Boolean
        | HostType::Char
        | HostType::Int32
        | HostType::Int64
        | HostType::Single
        | HostType::Double
        | HostType::Decimal
        | HostType::String
        | HostType::DateTime
        | HostType::ObjectId
        | HostType::StringComparison
        | HostType::StringSplitOptions => Arc::new(PrimitiveSerializer::with_representation(
            ty.clone(),
            representation,
        )),
        HostType::Object => Arc::new(ObjectSerializer::default()),
        HostType::Nullable(inner) => Arc::new(NullableSerializer::new(resolve_type(
            inner,
            representation,
            dictionary_representation,
            classes,
        )?)),
        HostType::Array(item)
        | HostType::Enumerable(item)
        | HostType::List(item)
        | HostType::Queryable(item) => Arc::new(ArraySerializer::new(
            ty.clone(),
            resolve_type(item, representation, dictionary_representation, classes)?,
        )),
        HostType::Dictionary(key, value) => Arc::new(DictionarySerializer::new(
            resolve_type(key, BsonRepresentation::Native, DictionaryRepresentation::Document, classes)?,
            resolve_type(value, representation, DictionaryRepresentation::Document, classes)?,
            dictionary_representation,
        )),
        HostType::Anonymous(members) => Arc::new(DocumentSerializer::anonymous(
            members
                .iter()
                .map(|(name, t)| {
                    Ok((
                        name.clone(),
                        resolve_type(t, BsonRepresentation::Native, DictionaryRepresentation::Document, classes)?,
                    ))
                })
                .collect::<Result<_>>()?,
        )),
        HostType::Class(name) => classes(name)?,
        HostType::Function(_, _) => return Err(Error::UnmappedType(ty.clone())),
    })
}
