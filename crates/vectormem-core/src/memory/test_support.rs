//! In-process doubles for the embedding and gateway ports.

use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeSet, HashMap};
use std::hash::{Hash, Hasher};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use vectormem_types::error::MemoryError;
use vectormem_types::memory::{
    Embedding, IndexName, MemoryRecord, SearchResult, matches_any,
};

use super::embedder::Embedder;
use super::gateway::{GatewayCapabilities, ObjectListing, VectorGateway, VectorSearch};
use super::tokenizer;

/// Words that all land on component 0, so date-ish texts look alike.
const DATE_WORDS: &[&str] = &[
    "hoy", "ayer", "mañana", "fecha", "día", "dia", "mes", "año", "semana", "calendario",
    "enero", "febrero", "marzo", "abril", "mayo", "junio", "julio", "agosto", "septiembre",
    "octubre", "noviembre", "diciembre", "lunes", "martes", "miércoles", "jueves", "viernes",
];

/// Deterministic bag-of-words embedder.
///
/// Date words and numbers share component 0; every other token is hashed
/// onto the remaining components. Output is L2-normalised.
pub(crate) struct KeywordEmbedder {
    dimension: usize,
}

impl KeywordEmbedder {
    pub(crate) fn new(dimension: usize) -> Self {
        Self { dimension }
    }

    fn bucket(&self, token: &str) -> usize {
        let is_date = DATE_WORDS.contains(&token) || token.chars().all(|c| c.is_ascii_digit());
        if is_date || self.dimension < 2 {
            return 0;
        }
        let mut hasher = DefaultHasher::new();
        token.hash(&mut hasher);
        1 + (hasher.finish() as usize) % (self.dimension - 1)
    }
}

impl Embedder for KeywordEmbedder {
    async fn embed(&self, text: &str) -> Result<Embedding, MemoryError> {
        let mut values = vec![0.0f32; self.dimension];
        if self.dimension == 0 {
            return Ok(Embedding::new(values));
        }
        for token in tokenizer::tokens(text) {
            let token = token.to_lowercase();
            values[self.bucket(&token)] += 1.0;
        }
        let norm = values.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            values.iter_mut().for_each(|v| *v /= norm);
        }
        Ok(Embedding::new(values))
    }

    fn model_name(&self) -> &str {
        "keyword-test"
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn max_tokens(&self) -> usize {
        512
    }
}

/// Answers each known text after its own delay with `[position; 4]`.
pub(crate) struct DelayedEmbedder {
    script: Vec<(&'static str, Duration)>,
}

impl DelayedEmbedder {
    pub(crate) fn new(script: Vec<(&'static str, Duration)>) -> Self {
        Self { script }
    }
}

impl Embedder for DelayedEmbedder {
    async fn embed(&self, text: &str) -> Result<Embedding, MemoryError> {
        let Some(position) = self.script.iter().position(|(t, _)| *t == text) else {
            return Err(MemoryError::EmbeddingBackend(format!("unknown text '{text}'")));
        };
        tokio::time::sleep(self.script[position].1).await;
        Ok(Embedding::new(vec![position as f32; 4]))
    }

    fn model_name(&self) -> &str {
        "delayed-test"
    }

    fn dimension(&self) -> usize {
        4
    }

    fn max_tokens(&self) -> usize {
        512
    }
}

/// Embedder whose backend always rejects the request.
pub(crate) struct FailingEmbedder {
    dimension: usize,
}

impl FailingEmbedder {
    pub(crate) fn new(dimension: usize) -> Self {
        Self { dimension }
    }
}

impl Embedder for FailingEmbedder {
    async fn embed(&self, _text: &str) -> Result<Embedding, MemoryError> {
        Err(MemoryError::EmbeddingBackend("HTTP 500: model not loaded".to_string()))
    }

    fn model_name(&self) -> &str {
        "failing-test"
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn max_tokens(&self) -> usize {
        512
    }
}

struct IndexState {
    dimension: usize,
    records: Vec<MemoryRecord>,
}

/// Gateway over a map of in-memory indexes, scoring by cosine similarity.
///
/// Counts every call that reaches it so tests can assert that validation
/// failures and cancellations never touch the backend.
pub(crate) struct InMemoryGateway {
    indexes: Mutex<HashMap<String, IndexState>>,
    calls: AtomicUsize,
    native_min_relevance: bool,
}

impl InMemoryGateway {
    pub(crate) fn new() -> Self {
        Self {
            indexes: Mutex::new(HashMap::new()),
            calls: AtomicUsize::new(0),
            native_min_relevance: true,
        }
    }

    /// Report `min_relevance` as unsupported and return every hit.
    pub(crate) fn without_native_min_relevance(mut self) -> Self {
        self.native_min_relevance = false;
        self
    }

    pub(crate) fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// The record as stored, vector included.
    pub(crate) fn stored(&self, index: &str, id: &str) -> Option<MemoryRecord> {
        let indexes = self.indexes.lock().ok()?;
        indexes
            .get(index)?
            .records
            .iter()
            .find(|r| r.id == id)
            .cloned()
    }

    fn with_index<T>(
        &self,
        index: &IndexName,
        f: impl FnOnce(&mut IndexState) -> Result<T, MemoryError>,
    ) -> Result<T, MemoryError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut indexes = self
            .indexes
            .lock()
            .map_err(|_| MemoryError::BackendUnavailable("poisoned".to_string()))?;
        let state = indexes
            .get_mut(index.as_str())
            .ok_or_else(|| MemoryError::IndexNotFound(index.to_string()))?;
        f(state)
    }
}

fn cosine(a: &[f32], b: &[f32]) -> f64 {
    let dot: f64 = a.iter().zip(b).map(|(x, y)| f64::from(*x) * f64::from(*y)).sum();
    let na: f64 = a.iter().map(|x| f64::from(*x).powi(2)).sum::<f64>().sqrt();
    let nb: f64 = b.iter().map(|x| f64::from(*x).powi(2)).sum::<f64>().sqrt();
    if na == 0.0 || nb == 0.0 {
        0.0
    } else {
        dot / (na * nb)
    }
}

fn project(record: &MemoryRecord, with_vectors: bool) -> MemoryRecord {
    let mut record = record.clone();
    if !with_vectors {
        record.vector = None;
    }
    record
}

impl VectorGateway for InMemoryGateway {
    fn capabilities(&self) -> GatewayCapabilities {
        GatewayCapabilities {
            native_min_relevance: self.native_min_relevance,
        }
    }

    async fn create_index(&self, index: &IndexName, dimension: usize) -> Result<(), MemoryError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut indexes = self
            .indexes
            .lock()
            .map_err(|_| MemoryError::BackendUnavailable("poisoned".to_string()))?;
        if indexes.contains_key(index.as_str()) {
            return Err(MemoryError::IndexAlreadyExists(index.to_string()));
        }
        indexes.insert(
            index.to_string(),
            IndexState {
                dimension,
                records: Vec::new(),
            },
        );
        Ok(())
    }

    async fn list_indexes(&self) -> Result<BTreeSet<String>, MemoryError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let indexes = self
            .indexes
            .lock()
            .map_err(|_| MemoryError::BackendUnavailable("poisoned".to_string()))?;
        Ok(indexes.keys().cloned().collect())
    }

    async fn delete_index(&self, index: &IndexName) -> Result<(), MemoryError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut indexes = self
            .indexes
            .lock()
            .map_err(|_| MemoryError::BackendUnavailable("poisoned".to_string()))?;
        indexes
            .remove(index.as_str())
            .map(|_| ())
            .ok_or_else(|| MemoryError::IndexNotFound(index.to_string()))
    }

    async fn upsert_object(
        &self,
        index: &IndexName,
        record: &MemoryRecord,
    ) -> Result<String, MemoryError> {
        self.with_index(index, |state| {
            let dimension = record.vector.as_ref().map_or(0, |v| v.dimension());
            if dimension != state.dimension {
                return Err(MemoryError::Backend {
                    status: 422,
                    message: format!("vector length {dimension} != {}", state.dimension),
                });
            }
            state.records.retain(|r| r.id != record.id);
            state.records.push(record.clone());
            Ok(record.id.clone())
        })
    }

    async fn delete_object(&self, index: &IndexName, id: &str) -> Result<(), MemoryError> {
        self.with_index(index, |state| {
            let before = state.records.len();
            state.records.retain(|r| r.id != id);
            if state.records.len() == before {
                return Err(MemoryError::RecordNotFound {
                    index: index.to_string(),
                    id: id.to_string(),
                });
            }
            Ok(())
        })
    }

    async fn search_by_vector(
        &self,
        query: &VectorSearch<'_>,
    ) -> Result<Vec<SearchResult>, MemoryError> {
        let native = self.native_min_relevance;
        self.with_index(query.index, |state| {
            let mut hits: Vec<SearchResult> = state
                .records
                .iter()
                .filter(|r| matches_any(query.filters, &r.tags))
                .filter_map(|r| {
                    let vector = r.vector.as_ref()?;
                    let relevance = cosine(vector.as_slice(), query.vector.as_slice());
                    Some(SearchResult {
                        record: project(r, query.with_vectors),
                        relevance,
                    })
                })
                .filter(|hit| !native || hit.relevance >= query.min_relevance)
                .collect();
            hits.sort_by(|a, b| b.relevance.total_cmp(&a.relevance));
            hits.truncate(query.limit);
            Ok(hits)
        })
    }

    async fn list_objects(&self, query: &ObjectListing<'_>) -> Result<Vec<MemoryRecord>, MemoryError> {
        self.with_index(query.index, |state| {
            Ok(state
                .records
                .iter()
                .filter(|r| matches_any(query.filters, &r.tags))
                .skip(query.offset)
                .take(query.limit)
                .map(|r| project(r, query.with_vectors))
                .collect())
        })
    }
}
