use bytes::Bytes;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// A leaf of the parameter tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scalar {
    /// A decoded text value.
    Text(String),
    /// Raw bytes of an uploaded file kept in memory.
    Binary(Bytes),
    /// Path of an uploaded file spooled to disk.
    File(PathBuf),
}

/// A node of the decoded parameter tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Scalar(Scalar),
    Array(Vec<Value>),
    Object(Map),
}

impl Value {
    pub fn is_scalar(&self) -> bool {
        matches!(self, Value::Scalar(_))
    }

    /// Returns the text if this is a [`Scalar::Text`].
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Scalar(Scalar::Text(text)) => Some(text),
            _ => None,
        }
    }

    /// Returns the raw bytes of a text or binary scalar.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Scalar(Scalar::Text(text)) => Some(text.as_bytes()),
            Value::Scalar(Scalar::Binary(bytes)) => Some(bytes),
            _ => None,
        }
    }

    pub fn as_path(&self) -> Option<&Path> {
        match self {
            Value::Scalar(Scalar::File(path)) => Some(path),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Map> {
        match self {
            Value::Object(map) => Some(map),
            _ => None,
        }
    }

    /// Follows a property path through nested objects.
    pub fn pointer(&self, path: &[&str]) -> Option<&Value> {
        path.iter().try_fold(self, |node, key| node.as_object()?.get(key))
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Value::Scalar(Scalar::Text(text.to_owned()))
    }
}

impl From<String> for Value {
    fn from(text: String) -> Self {
        Value::Scalar(Scalar::Text(text))
    }
}

impl From<Bytes> for Value {
    fn from(bytes: Bytes) -> Self {
        Value::Scalar(Scalar::Binary(bytes))
    }
}

impl From<PathBuf> for Value {
    fn from(path: PathBuf) -> Self {
        Value::Scalar(Scalar::File(path))
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(items)
    }
}

impl From<Map> for Value {
    fn from(map: Map) -> Self {
        Value::Object(map)
    }
}

/// An insertion-ordered mapping from names to [`Value`]s.
///
/// This is the root of every decoded parameter tree and the accumulator the
/// parse functions merge into. Lookups go through a hash index, so merging
/// `n` distinct names stays linear in `n`.
#[derive(Debug, Clone, Default)]
pub struct Map {
    entries: Vec<(String, Value)>,
    index: HashMap<String, usize>,
}

impl Map {
    pub fn new() -> Map {
        Map::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.index.get(key).map(|&idx| &self.entries[idx].1)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        let idx = *self.index.get(key)?;
        Some(&mut self.entries[idx].1)
    }

    /// Sets `key` to `value`, returning the previous value. A new key is
    /// appended at the end; an existing key keeps its position.
    pub fn insert<K: Into<String>>(&mut self, key: K, value: Value) -> Option<Value> {
        let key = key.into();
        match self.index.get(&key) {
            Some(&idx) => Some(std::mem::replace(&mut self.entries[idx].1, value)),
            None => {
                self.push(key, value);
                None
            }
        }
    }

    /// Removes `key`, shifting the later entries down by one.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        let idx = self.index.remove(key)?;
        let (_, value) = self.entries.remove(idx);

        for (key, _) in &self.entries[idx..] {
            if let Some(slot) = self.index.get_mut(key) {
                *slot -= 1;
            }
        }

        Some(value)
    }

    /// Returns the value stored under `key`, inserting the result of
    /// `default` first when the key is absent.
    pub fn get_or_insert_with<F: FnOnce() -> Value>(&mut self, key: &str, default: F) -> &mut Value {
        let idx = match self.index.get(key) {
            Some(&idx) => idx,
            None => self.push(key.to_owned(), default()),
        };
        &mut self.entries[idx].1
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    fn push(&mut self, key: String, value: Value) -> usize {
        let idx = self.entries.len();
        self.index.insert(key.clone(), idx);
        self.entries.push((key, value));
        idx
    }
}

impl PartialEq for Map {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl Eq for Map {}

impl<K: Into<String>> FromIterator<(K, Value)> for Map {
    fn from_iter<T: IntoIterator<Item = (K, Value)>>(iter: T) -> Self {
        let mut map = Map::new();
        for (key, value) in iter {
            map.insert(key, value);
        }
        map
    }
}

impl IntoIterator for Map {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

#[cfg(feature = "json")]
mod json {
    use super::{Map, Scalar, Value};
    use serde::ser::{Serialize, SerializeMap, Serializer};

    impl Serialize for Scalar {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            match self {
                Scalar::Text(text) => serializer.serialize_str(text),
                Scalar::Binary(bytes) => serializer.collect_seq(bytes.iter()),
                Scalar::File(path) => serializer.serialize_str(&path.to_string_lossy()),
            }
        }
    }

    impl Serialize for Value {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            match self {
                Value::Scalar(scalar) => scalar.serialize(serializer),
                Value::Array(items) => serializer.collect_seq(items),
                Value::Object(map) => map.serialize(serializer),
            }
        }
    }

    impl Serialize for Map {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            let mut state = serializer.serialize_map(Some(self.len()))?;
            for (key, value) in self.iter() {
                state.serialize_entry(key, value)?;
            }
            state.end()
        }
    }

    impl Map {
        /// Converts the tree into a [`serde_json::Value`].
        pub fn to_json(&self) -> serde_json::Value {
            serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
        }
    }

}
