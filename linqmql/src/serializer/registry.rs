use super::{
    standard::resolve_type, BsonRepresentation, DictionaryRepresentation, DocumentSerializer,
    Error, MemberSerialization, Result, SerializerRef,
};
use crate::expression::HostType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Looks up serializers by host type. Implementations must be safe for
/// concurrent reads; translation never mutates the registry.
pub trait SerializerRegistry: Send + Sync {
    fn lookup(&self, ty: &HostType) -> Result<SerializerRef>;
}

/// Describes how a document class maps onto BSON.
#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassMap {
    pub name: String,
    pub members: Vec<MemberMap>,
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberMap {
    pub member_name: String,
    /// Defaults to the member name.
    #[serde(default)]
    pub element_name: Option<String>,
    pub member_type: HostType,
    #[serde(default)]
    pub representation: BsonRepresentation,
    #[serde(default)]
    pub dictionary_representation: DictionaryRepresentation,
}

/// Resolves primitives, sequences, dictionaries and anonymous types
/// structurally, and document classes through their registered class maps.
#[derive(Debug, Default, Clone)]
pub struct StandardSerializerRegistry {
    classes: BTreeMap<String, SerializerRef>,
}

impl StandardSerializerRegistry {
    pub fn new(class_maps: Vec<ClassMap>) -> Result<Self> {
        let mut maps = BTreeMap::new();
        for map in class_maps.iter() {
            if maps.insert(map.name.as_str(), map).is_some() {
                return Err(Error::DuplicateClassMap(map.name.clone()));
            }
        }
        let mut builder = ClassBuilder {
            maps,
            built: BTreeMap::new(),
            in_progress: vec![],
        };
        for map in class_maps.iter() {
            builder.build(&map.name)?;
        }
        Ok(Self {
            classes: builder.built,
        })
    }
}

impl SerializerRegistry for StandardSerializerRegistry {
    fn lookup(&self, ty: &HostType) -> Result<SerializerRef> {
        resolve_type(
            ty,
            BsonRepresentation::Native,
            DictionaryRepresentation::Document,
            &mut |name| {
                self.classes
                    .get(name)
                    .cloned()
                    .ok_or_else(|| Error::UnmappedType(HostType::class(name)))
            },
        )
    }
}

struct ClassBuilder<'a> {
    maps: BTreeMap<&'a str, &'a ClassMap>,
    built: BTreeMap<String, SerializerRef>,
    in_progress: Vec<String>,
}

impl<'a> ClassBuilder<'a> {
    fn build(&mut self, name: &str) -> Result<SerializerRef> {
        if let Some(done) = self.built.get(name) {
            return Ok(done.clone());
        }
        if self.in_progress.iter().any(|n| n == name) {
            return Err(Error::RecursiveClassMap(name.to_string()));
        }
        let map = *self
            .maps
            .get(name)
            .ok_or_else(|| Error::UnmappedType(HostType::class(name)))?;

        self.in_progress.push(name.to_string());
        let mut members = Vec::with_capacity(map.members.len());
        for m in map.members.iter() {
            let serializer = resolve_type(
                &m.member_type,
                m.representation,
                m.dictionary_representation,
                &mut |class| self.build(class),
            )?;
            members.push(MemberSerialization {
                member_name: m.member_name.clone(),
                element_name: m
                    .element_name
                    .clone()
                    .unwrap_or_else(|| m.member_name.clone()),
                serializer,
            });
        }
        self.in_progress.pop();

        let serializer: SerializerRef = std::sync::Arc::new(DocumentSerializer::new(
            HostType::class(name),
            members,
        ));
        self.built.insert(name.to_string(), serializer.clone());
        Ok(serializer)
    }
}
