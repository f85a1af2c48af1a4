use linked_hash_map::LinkedHashMap;
use std::{fmt::Display, hash::Hash};
use thiserror::Error;

/// An insertion-ordered map that refuses to overwrite keys. Field order
/// matters when rendering documents, and a repeated field name in a
/// computed document or a `$project` is always a translation bug, so
/// duplicates are reported instead of silently replacing the first value.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct UniqueLinkedHashMap<K, V>(LinkedHashMap<K, V>)
where
    K: Hash + Eq + Display;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("duplicate key found: {0}")]
pub struct DuplicateKeyError(pub String);

impl DuplicateKeyError {
    pub fn key_name(&self) -> &str {
        &self.0
    }
}

impl<K, V> UniqueLinkedHashMap<K, V>
where
    K: Hash + Eq + Display,
{
    pub fn new() -> Self {
        Self(LinkedHashMap::new())
    }

    pub fn insert(&mut self, k: K, v: V) -> Result<(), DuplicateKeyError> {
        if self.0.contains_key(&k) {
            return Err(DuplicateKeyError(k.to_string()));
        }
        self.0.insert(k, v);
        Ok(())
    }

    pub fn insert_many(
        &mut self,
        entries: impl IntoIterator<Item = (K, V)>,
    ) -> Result<(), DuplicateKeyError> {
        entries
            .into_iter()
            .try_for_each(|(k, v)| self.insert(k, v))
    }

    pub fn get(&self, k: &K) -> Option<&V> {
        self.0.get(k)
    }

    pub fn contains_key(&self, k: &K) -> bool {
        self.0.contains_key(k)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.0.keys()
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.0.values()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.0.iter()
    }

    /// Builds a map from `entries`, failing on the first repeated key.
    pub fn try_from_iter(entries: impl IntoIterator<Item = (K, V)>) -> Result<Self, DuplicateKeyError> {
        let mut out = Self::new();
        out.insert_many(entries)?;
        Ok(out)
    }

    /// Rebuilds the map with every value transformed by `f`, keeping key
    /// order. Stops at the first error.
    pub fn try_map_values<W, E, F>(self, mut f: F) -> Result<UniqueLinkedHashMap<K, W>, E>
    where
        F: FnMut(V) -> Result<W, E>,
    {
        let mut out = LinkedHashMap::new();
        for (k, v) in self.0 {
            out.insert(k, f(v)?);
        }
        Ok(UniqueLinkedHashMap(out))
    }

    /// Infallible counterpart of `try_map_values`.
    pub fn map_values<W, F>(self, mut f: F) -> UniqueLinkedHashMap<K, W>
    where
        F: FnMut(V) -> W,
    {
        UniqueLinkedHashMap(self.0.into_iter().map(|(k, v)| (k, f(v))).collect())
    }
}

impl<K, V> IntoIterator for UniqueLinkedHashMap<K, V>
where
    K: Hash + Eq + Display,
{
    type Item = (K, V);
    type IntoIter = linked_hash_map::IntoIter<K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Builds a map from literal entries, panicking on duplicates. Only meant
/// for tests and for maps whose keys are known to be distinct.
#[macro_export]
macro_rules! unchecked_unique_linked_hash_map {
    ($($key:expr => $val:expr),* $(,)?) => {{
        #[allow(unused_mut)]
        let mut out = $crate::unique_linked_hash_map::UniqueLinkedHashMap::new();
        $(
            out.insert($key, $val).unwrap();
        )*
        out
    }};
}
