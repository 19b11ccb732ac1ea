//! Memory record types.
//!
//! These types model what the upstream retrieval pipeline persists: text
//! fragments with their embedding vectors and tag metadata, grouped into
//! named indexes on the remote vector database.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::MemoryError;

/// An ordered vector of floats produced by an embedding provider.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Embedding(Vec<f32>);

impl Embedding {
    pub fn new(values: Vec<f32>) -> Self {
        Self(values)
    }

    /// Number of components in the vector.
    pub fn dimension(&self) -> usize {
        self.0.len()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub fn into_inner(self) -> Vec<f32> {
        self.0
    }
}

impl From<Vec<f32>> for Embedding {
    fn from(values: Vec<f32>) -> Self {
        Self(values)
    }
}

/// Separator between a tag key and its value in stored form.
///
/// Keys must not contain it; values may.
pub const TAG_SEPARATOR: char = ':';

/// Tag metadata: each key maps to a set of values.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagCollection(BTreeMap<String, BTreeSet<String>>);

impl TagCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a value under `key`. Adding an existing pair is a no-op.
    pub fn add(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.entry(key.into()).or_default().insert(value.into());
    }

    pub fn get(&self, key: &str) -> Option<&BTreeSet<String>> {
        self.0.get(key)
    }

    pub fn contains(&self, key: &str, value: &str) -> bool {
        self.0.get(key).is_some_and(|values| values.contains(value))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Keys that contain [`TAG_SEPARATOR`] and so cannot be stored.
    pub fn invalid_keys(&self) -> impl Iterator<Item = &str> {
        self.0
            .keys()
            .map(String::as_str)
            .filter(|key| key.contains(TAG_SEPARATOR))
    }

    /// Iterate over every `(key, value)` pair in key order.
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0
            .iter()
            .flat_map(|(k, values)| values.iter().map(move |v| (k.as_str(), v.as_str())))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for TagCollection {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut tags = TagCollection::new();
        for (k, v) in iter {
            tags.add(k, v);
        }
        tags
    }
}

/// A persisted unit of memory.
///
/// `vector` is optional on input: a record carrying only `text` is embedded
/// by the store before it is written. Records read back without embeddings
/// requested also have `vector == None`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MemoryRecord {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vector: Option<Embedding>,
    #[serde(default)]
    pub tags: TagCollection,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub payload: serde_json::Map<String, serde_json::Value>,
}

impl MemoryRecord {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_vector(mut self, vector: impl Into<Embedding>) -> Self {
        self.vector = Some(vector.into());
        self
    }

    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.add(key, value);
        self
    }

    pub fn with_payload(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.payload.insert(key.into(), value);
        self
    }
}

/// A record paired with its relevance to a query (higher = more similar).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub record: MemoryRecord,
    pub relevance: f64,
}

/// Conjunction of tag equalities.
///
/// A slice of filters is read as a disjunction: a record matches when any
/// one filter matches. An empty filter matches everything.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemoryFilter(Vec<(String, String)>);

impl MemoryFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn by_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.push((key.into(), value.into()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Whether every pair of this filter is present in `tags`.
    pub fn matches(&self, tags: &TagCollection) -> bool {
        self.pairs().all(|(k, v)| tags.contains(k, v))
    }
}

/// Whether `tags` satisfies the disjunction of `filters`.
pub fn matches_any(filters: &[MemoryFilter], tags: &TagCollection) -> bool {
    let active: Vec<&MemoryFilter> = filters.iter().filter(|f| !f.is_empty()).collect();
    active.is_empty() || active.iter().any(|f| f.matches(tags))
}

/// A validated index (collection) name.
///
/// Must be non-empty, start with an ASCII letter, and contain only ASCII
/// letters, digits and underscores -- the names the vector database accepts
/// as class names and that are safe to embed in URL paths and queries.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IndexName(String);

impl IndexName {
    pub fn parse(name: &str) -> Result<Self, MemoryError> {
        let mut chars = name.chars();
        match chars.next() {
            None => {
                return Err(MemoryError::InvalidArgument(
                    "index name must not be empty".to_string(),
                ));
            }
            Some(first) if !first.is_ascii_alphabetic() => {
                return Err(MemoryError::InvalidArgument(format!(
                    "index name '{name}' must start with a letter"
                )));
            }
            Some(_) => {}
        }
        if let Some(bad) = chars.find(|c| !(c.is_ascii_alphanumeric() || *c == '_')) {
            return Err(MemoryError::InvalidArgument(format!(
                "index name '{name}' contains invalid character '{bad}'"
            )));
        }
        Ok(Self(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IndexName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for IndexName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
