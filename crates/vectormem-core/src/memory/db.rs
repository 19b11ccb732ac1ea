//! MemoryDb trait -- the contract retrieval pipelines consume.
//!
//! Any store honouring this trait can be swapped in behind a pipeline.
//!
//! # Missing-entity policy
//!
//! Strict: deleting an index that does not exist fails with
//! `IndexNotFound`, and deleting a record that does not exist fails with
//! `RecordNotFound`. Callers that tolerate double deletes check
//! [`MemoryError::is_not_found`] and move on; a failed delete never touches
//! other records.

use std::collections::BTreeSet;
use std::future::Future;
use std::pin::Pin;

use futures_util::Stream;
use tokio_util::sync::CancellationToken;
use vectormem_types::error::MemoryError;
use vectormem_types::memory::{MemoryFilter, MemoryRecord};

/// A lazy, finite, non-restartable sequence of results.
///
/// Nothing is sent to any backend until the stream is first polled. Once it
/// yields an error the stream is finished.
pub type MemoryStream<'a, T> = Pin<Box<dyn Stream<Item = Result<T, MemoryError>> + Send + 'a>>;

/// Parameters for [`MemoryDb::get_similar_list`].
#[derive(Debug, Clone)]
pub struct SearchOptions {
    /// Disjunction of tag filters; empty means unrestricted.
    pub filters: Vec<MemoryFilter>,
    /// Results scoring below this are never yielded.
    pub min_relevance: f64,
    /// Maximum number of results; must be > 0.
    pub limit: usize,
    /// Include stored vectors in the returned records.
    pub with_embeddings: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            filters: Vec::new(),
            min_relevance: 0.0,
            limit: 1,
            with_embeddings: false,
        }
    }
}

/// Parameters for [`MemoryDb::get_list`].
#[derive(Debug, Clone, Default)]
pub struct ListOptions {
    pub filters: Vec<MemoryFilter>,
    /// `None` lists every matching record.
    pub limit: Option<usize>,
    pub with_embeddings: bool,
}

/// Index-oriented CRUD and similarity search over a vector database.
///
/// Every operation takes a cancellation token. On cancellation the in-flight
/// network call is abandoned and the operation fails with `Cancelled`.
pub trait MemoryDb: Send + Sync {
    /// Create an index for vectors of `vector_dimension` components.
    ///
    /// The dimension must equal the embedder's; anything else fails with
    /// `InvalidArgument` before any network call, so every index created
    /// here accepts the vectors the store produces.
    fn create_index(
        &self,
        index: &str,
        vector_dimension: usize,
        cancel: &CancellationToken,
    ) -> impl Future<Output = Result<(), MemoryError>> + Send;

    fn get_indexes(
        &self,
        cancel: &CancellationToken,
    ) -> impl Future<Output = Result<BTreeSet<String>, MemoryError>> + Send;

    /// Delete an index and all its records (strict, see module docs).
    fn delete_index(
        &self,
        index: &str,
        cancel: &CancellationToken,
    ) -> impl Future<Output = Result<(), MemoryError>> + Send;

    /// Insert or replace a record, embedding its text first when it carries
    /// no vector. Returns the stored id.
    ///
    /// Rejected with `InvalidArgument`, before any network call, when a
    /// supplied vector has the wrong length or a non-finite component, or a
    /// tag key contains [`TAG_SEPARATOR`](vectormem_types::memory::TAG_SEPARATOR).
    fn upsert(
        &self,
        index: &str,
        record: &MemoryRecord,
        cancel: &CancellationToken,
    ) -> impl Future<Output = Result<String, MemoryError>> + Send;

    /// Records most similar to `query`, best first, with their scores.
    fn get_similar_list<'a>(
        &'a self,
        index: &str,
        query: &str,
        options: SearchOptions,
        cancel: &CancellationToken,
    ) -> MemoryStream<'a, (MemoryRecord, f64)>;

    /// Records matching the filters, in backend order.
    fn get_list<'a>(
        &'a self,
        index: &str,
        options: ListOptions,
        cancel: &CancellationToken,
    ) -> MemoryStream<'a, MemoryRecord>;

    /// Delete a record by its id (strict, see module docs).
    fn delete(
        &self,
        index: &str,
        record: &MemoryRecord,
        cancel: &CancellationToken,
    ) -> impl Future<Output = Result<(), MemoryError>> + Send;
}
