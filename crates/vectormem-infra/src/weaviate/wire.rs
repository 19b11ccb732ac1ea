//! Weaviate request and response bodies.
//!
//! Records are stored with three properties: `text`, `tags` (wire-encoded
//! `key:value` strings) and `payload` (the JSON payload serialized into a
//! single text property, so GraphQL can select it without sub-fields).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use vectormem_types::error::MemoryError;
use vectormem_types::memory::{Embedding, MemoryRecord, SearchResult};

use super::filter::{decode_tags, encode_tags};

// ---------------------------------------------------------------------------
// Schema
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateClassRequest<'a> {
    pub class_name: &'a str,
    pub vector_index_config: VectorIndexConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VectorIndexConfig {
    pub vector_size: usize,
}

#[derive(Debug, Deserialize)]
pub struct SchemaResponse {
    #[serde(default)]
    pub classes: Option<Vec<ClassEntry>>,
}

#[derive(Debug, Deserialize)]
pub struct ClassEntry {
    #[serde(rename = "className", alias = "class")]
    pub class_name: String,
}

// ---------------------------------------------------------------------------
// Objects
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ObjectProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<String>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

impl ObjectProperties {
    pub fn from_record(record: &MemoryRecord) -> Result<Self, MemoryError> {
        let payload = if record.payload.is_empty() {
            None
        } else {
            Some(serde_json::to_string(&record.payload).map_err(|e| {
                MemoryError::InvalidArgument(format!("payload is not serializable: {e}"))
            })?)
        };
        Ok(Self {
            text: record.text.clone(),
            tags: encode_tags(&record.tags),
            payload,
        })
    }

    /// Rebuild a record from stored properties.
    pub fn into_record(
        self,
        id: String,
        vector: Option<Vec<f32>>,
    ) -> Result<MemoryRecord, MemoryError> {
        let payload = match self.payload.as_deref() {
            None | Some("") => serde_json::Map::new(),
            Some(raw) => match serde_json::from_str::<Value>(raw) {
                Ok(Value::Object(map)) => map,
                Ok(_) | Err(_) => {
                    return Err(MemoryError::MalformedResponse(format!(
                        "payload of record '{id}' is not a JSON object"
                    )));
                }
            },
        };
        Ok(MemoryRecord {
            id,
            vector: vector.map(Embedding::new),
            tags: decode_tags(&self.tags),
            text: self.text,
            payload,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct ObjectRequest<'a> {
    pub class: &'a str,
    pub id: &'a str,
    pub properties: ObjectProperties,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vector: Option<&'a [f32]>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ObjectResponse {
    #[serde(default)]
    pub id: Option<String>,
}

// ---------------------------------------------------------------------------
// Structured search / list
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest<'a> {
    pub class_name: &'a str,
    pub vector: &'a [f32],
    pub limit: usize,
    pub min_relevance: f64,
    pub with_embeddings: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filters: Option<Value>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListRequest<'a> {
    pub class_name: &'a str,
    pub limit: usize,
    pub offset: usize,
    pub with_embeddings: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filters: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub struct ResultsResponse {
    #[serde(default)]
    pub results: Vec<WireHit>,
}

#[derive(Debug, Deserialize)]
pub struct WireHit {
    pub id: String,
    #[serde(default)]
    pub properties: ObjectProperties,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub vector: Option<Vec<f32>>,
}

impl WireHit {
    pub fn into_record(self, with_vectors: bool) -> Result<MemoryRecord, MemoryError> {
        let vector = if with_vectors { self.vector } else { None };
        self.properties.into_record(self.id, vector)
    }

    pub fn into_result(self, with_vectors: bool) -> Result<SearchResult, MemoryError> {
        let relevance = self.score.ok_or_else(|| {
            MemoryError::MalformedResponse(format!("search hit '{}' has no score", self.id))
        })?;
        Ok(SearchResult {
            record: self.into_record(with_vectors)?,
            relevance,
        })
    }
}

// ---------------------------------------------------------------------------
// GraphQL
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct GraphQlRequest {
    pub query: String,
}

#[derive(Debug, Deserialize)]
pub struct GraphQlResponse {
    #[serde(default)]
    pub data: Option<GraphQlData>,
    #[serde(default)]
    pub errors: Option<Vec<GraphQlError>>,
}

#[derive(Debug, Deserialize)]
pub struct GraphQlData {
    #[serde(rename = "Get", default)]
    pub get: HashMap<String, Option<Vec<GraphQlHit>>>,
}

#[derive(Debug, Deserialize)]
pub struct GraphQlError {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct GraphQlHit {
    #[serde(flatten)]
    pub properties: ObjectProperties,
    #[serde(rename = "_additional")]
    pub additional: GraphQlAdditional,
}

#[derive(Debug, Deserialize)]
pub struct GraphQlAdditional {
    pub id: String,
    #[serde(default)]
    pub distance: Option<f64>,
    #[serde(default)]
    pub vector: Option<Vec<f32>>,
}

impl GraphQlHit {
    pub fn into_record(self, with_vectors: bool) -> Result<MemoryRecord, MemoryError> {
        let vector = if with_vectors { self.additional.vector } else { None };
        self.properties.into_record(self.additional.id, vector)
    }

    /// Relevance is `1 - distance` (cosine distance).
    pub fn into_result(self, with_vectors: bool) -> Result<SearchResult, MemoryError> {
        let distance = self.additional.distance.ok_or_else(|| {
            MemoryError::MalformedResponse(format!(
                "search hit '{}' has no distance",
                self.additional.id
            ))
        })?;
        Ok(SearchResult {
            record: self.into_record(with_vectors)?,
            relevance: 1.0 - distance,
        })
    }
}
