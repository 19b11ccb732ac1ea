//! Vector database gateway trait.
//!
//! The gateway is the sole owner of the database's wire format: the store
//! hands it typed requests and receives typed results. Implementations
//! perform exactly one network round trip per call and never retry.

use std::collections::BTreeSet;
use std::future::Future;

use vectormem_types::error::MemoryError;
use vectormem_types::memory::{Embedding, IndexName, MemoryFilter, MemoryRecord, SearchResult};

/// What the backend behind a gateway enforces on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GatewayCapabilities {
    /// The backend drops results below `min_relevance` itself.
    pub native_min_relevance: bool,
}

/// A nearest-neighbour query.
#[derive(Debug, Clone)]
pub struct VectorSearch<'a> {
    pub index: &'a IndexName,
    pub vector: &'a Embedding,
    /// Disjunction of tag filters; empty means unrestricted.
    pub filters: &'a [MemoryFilter],
    pub limit: usize,
    pub min_relevance: f64,
    pub with_vectors: bool,
}

/// One page of an unranked listing.
#[derive(Debug, Clone)]
pub struct ObjectListing<'a> {
    pub index: &'a IndexName,
    pub filters: &'a [MemoryFilter],
    pub limit: usize,
    pub offset: usize,
    pub with_vectors: bool,
}

/// Trait for vector database protocol clients.
///
/// Uses RPITIT (native async fn in traits, Rust 2024 edition).
/// Implementations live in vectormem-infra.
pub trait VectorGateway: Send + Sync {
    fn capabilities(&self) -> GatewayCapabilities;

    /// Create an index. Not idempotent: an existing name fails with
    /// `IndexAlreadyExists`.
    fn create_index(
        &self,
        index: &IndexName,
        dimension: usize,
    ) -> impl Future<Output = Result<(), MemoryError>> + Send;

    fn list_indexes(&self) -> impl Future<Output = Result<BTreeSet<String>, MemoryError>> + Send;

    /// Delete an index and every record in it. Fails with `IndexNotFound`
    /// if absent.
    fn delete_index(&self, index: &IndexName)
    -> impl Future<Output = Result<(), MemoryError>> + Send;

    /// Insert or replace the record with the same id. Returns the stored id.
    fn upsert_object(
        &self,
        index: &IndexName,
        record: &MemoryRecord,
    ) -> impl Future<Output = Result<String, MemoryError>> + Send;

    /// Delete one record. Fails with `RecordNotFound` if absent.
    fn delete_object(
        &self,
        index: &IndexName,
        id: &str,
    ) -> impl Future<Output = Result<(), MemoryError>> + Send;

    /// Results ordered by descending relevance. Tie order is unspecified.
    fn search_by_vector(
        &self,
        query: &VectorSearch<'_>,
    ) -> impl Future<Output = Result<Vec<SearchResult>, MemoryError>> + Send;

    /// One page of records in backend-defined order.
    fn list_objects(
        &self,
        query: &ObjectListing<'_>,
    ) -> impl Future<Output = Result<Vec<MemoryRecord>, MemoryError>> + Send;
}
