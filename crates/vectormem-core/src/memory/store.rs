//! VectorMemoryStore -- the orchestrator behind [`MemoryDb`].
//!
//! Validates input before any network call, computes embeddings for
//! text-only records and for similarity queries, delegates to the gateway,
//! and turns gateway results into lazy, cancellable streams.
//!
//! The store keeps no state between calls: every read goes to the remote
//! database and every write is a single remote mutation.

use std::borrow::Cow;
use std::collections::BTreeSet;

use tokio_util::sync::CancellationToken;
use vectormem_types::error::MemoryError;
use vectormem_types::memory::{IndexName, MemoryRecord, TAG_SEPARATOR};

use super::box_embedder::BoxEmbedder;
use super::db::{ListOptions, MemoryDb, MemoryStream, SearchOptions};
use super::gateway::{ObjectListing, VectorGateway, VectorSearch};
use crate::cancel::cancellable;

/// Records requested per listing round trip unless overridden.
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// Vector memory store over a gateway `G` and a type-erased embedder.
pub struct VectorMemoryStore<G> {
    gateway: G,
    embedder: BoxEmbedder,
    page_size: usize,
}

impl<G: VectorGateway> VectorMemoryStore<G> {
    pub fn new(gateway: G, embedder: BoxEmbedder) -> Self {
        Self {
            gateway,
            embedder,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Override the listing page size. Zero is clamped to one.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn embedder(&self) -> &BoxEmbedder {
        &self.embedder
    }

    /// Resolve the vector to write: the caller's, checked against the
    /// embedder dimension, or a freshly computed one from the record text.
    async fn prepare_record<'r>(
        &self,
        record: &'r MemoryRecord,
        cancel: &CancellationToken,
    ) -> Result<Cow<'r, MemoryRecord>, MemoryError> {
        let expected = self.embedder.dimension();
        match (&record.vector, &record.text) {
            (Some(vector), _) => {
                if vector.dimension() != expected {
                    return Err(MemoryError::InvalidArgument(format!(
                        "record '{}' has a {}-dimensional vector, index expects {expected}",
                        record.id,
                        vector.dimension()
                    )));
                }
                if let Some(position) = vector.as_slice().iter().position(|v| !v.is_finite()) {
                    return Err(MemoryError::InvalidArgument(format!(
                        "record '{}' has a non-finite vector component at position {position}",
                        record.id
                    )));
                }
                Ok(Cow::Borrowed(record))
            }
            (None, Some(text)) => {
                let embedding = self.embedder.embed(text, cancel).await?;
                if embedding.dimension() != expected {
                    return Err(MemoryError::EmbeddingBackend(format!(
                        "model '{}' returned {} dimensions, expected {expected}",
                        self.embedder.model_name(),
                        embedding.dimension()
                    )));
                }
                let mut owned = record.clone();
                owned.vector = Some(embedding);
                Ok(Cow::Owned(owned))
            }
            (None, None) => Err(MemoryError::InvalidArgument(format!(
                "record '{}' has neither a vector nor text to embed",
                record.id
            ))),
        }
    }
}

fn validate_id(record: &MemoryRecord) -> Result<(), MemoryError> {
    if record.id.trim().is_empty() {
        return Err(MemoryError::InvalidArgument(
            "record id must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_tags(record: &MemoryRecord) -> Result<(), MemoryError> {
    if let Some(key) = record.tags.invalid_keys().next() {
        return Err(MemoryError::InvalidArgument(format!(
            "tag key '{key}' on record '{}' must not contain '{TAG_SEPARATOR}'",
            record.id
        )));
    }
    Ok(())
}

fn failed<'a, T: Send + 'a>(err: MemoryError) -> MemoryStream<'a, T> {
    Box::pin(futures_util::stream::once(async move { Err(err) }))
}

impl<G: VectorGateway> MemoryDb for VectorMemoryStore<G> {
    #[tracing::instrument(skip(self, cancel))]
    async fn create_index(
        &self,
        index: &str,
        vector_dimension: usize,
        cancel: &CancellationToken,
    ) -> Result<(), MemoryError> {
        let index = IndexName::parse(index)?;
        if vector_dimension == 0 {
            return Err(MemoryError::InvalidArgument(
                "vector dimension must be > 0".to_string(),
            ));
        }
        if vector_dimension != self.embedder.dimension() {
            return Err(MemoryError::InvalidArgument(format!(
                "index '{index}' would hold {vector_dimension}-dimensional vectors, but model '{}' produces {}",
                self.embedder.model_name(),
                self.embedder.dimension()
            )));
        }
        cancellable(cancel, self.gateway.create_index(&index, vector_dimension)).await?;
        tracing::info!(index = %index, vector_dimension, "Created index");
        Ok(())
    }

    async fn get_indexes(
        &self,
        cancel: &CancellationToken,
    ) -> Result<BTreeSet<String>, MemoryError> {
        cancellable(cancel, self.gateway.list_indexes()).await
    }

    #[tracing::instrument(skip(self, cancel))]
    async fn delete_index(&self, index: &str, cancel: &CancellationToken) -> Result<(), MemoryError> {
        let index = IndexName::parse(index)?;
        cancellable(cancel, self.gateway.delete_index(&index)).await?;
        tracing::info!(index = %index, "Deleted index");
        Ok(())
    }

    #[tracing::instrument(skip(self, record, cancel), fields(id = %record.id))]
    async fn upsert(
        &self,
        index: &str,
        record: &MemoryRecord,
        cancel: &CancellationToken,
    ) -> Result<String, MemoryError> {
        let index = IndexName::parse(index)?;
        validate_id(record)?;
        validate_tags(record)?;
        let prepared = self.prepare_record(record, cancel).await?;
        let id = cancellable(cancel, self.gateway.upsert_object(&index, &prepared)).await?;
        tracing::debug!(index = %index, id = %id, "Upserted record");
        Ok(id)
    }

    fn get_similar_list<'a>(
        &'a self,
        index: &str,
        query: &str,
        options: SearchOptions,
        cancel: &CancellationToken,
    ) -> MemoryStream<'a, (MemoryRecord, f64)> {
        let index = match IndexName::parse(index) {
            Ok(index) => index,
            Err(e) => return failed(e),
        };
        if options.limit == 0 {
            return failed(MemoryError::InvalidArgument(
                "search limit must be > 0".to_string(),
            ));
        }
        if !options.min_relevance.is_finite() {
            return failed(MemoryError::InvalidArgument(format!(
                "min_relevance must be finite, got {}",
                options.min_relevance
            )));
        }
        let query = query.to_string();
        let cancel = cancel.clone();

        Box::pin(async_stream::try_stream! {
            let vector = self.embedder.embed(&query, &cancel).await?;
            let search = VectorSearch {
                index: &index,
                vector: &vector,
                filters: &options.filters,
                limit: options.limit,
                min_relevance: options.min_relevance,
                with_vectors: options.with_embeddings,
            };
            let hits = cancellable(&cancel, self.gateway.search_by_vector(&search)).await?;
            tracing::debug!(index = %index, hits = hits.len(), "Similarity search returned");

            let filter_locally = !self.gateway.capabilities().native_min_relevance;
            for hit in hits {
                if cancel.is_cancelled() {
                    Err::<(), _>(MemoryError::Cancelled)?;
                }
                if filter_locally && hit.relevance < options.min_relevance {
                    continue;
                }
                yield (hit.record, hit.relevance);
            }
        })
    }

    fn get_list<'a>(
        &'a self,
        index: &str,
        options: ListOptions,
        cancel: &CancellationToken,
    ) -> MemoryStream<'a, MemoryRecord> {
        let index = match IndexName::parse(index) {
            Ok(index) => index,
            Err(e) => return failed(e),
        };
        if options.limit == Some(0) {
            return failed(MemoryError::InvalidArgument(
                "list limit must be > 0".to_string(),
            ));
        }
        let cancel = cancel.clone();
        let page_size = self.page_size;

        Box::pin(async_stream::try_stream! {
            let mut offset = 0usize;
            let mut remaining = options.limit;
            loop {
                let page_limit = match remaining {
                    Some(0) => break,
                    Some(left) => left.min(page_size),
                    None => page_size,
                };
                let listing = ObjectListing {
                    index: &index,
                    filters: &options.filters,
                    limit: page_limit,
                    offset,
                    with_vectors: options.with_embeddings,
                };
                let page = cancellable(&cancel, self.gateway.list_objects(&listing)).await?;
                let fetched = page.len().min(page_limit);
                tracing::debug!(index = %index, offset, fetched, "Fetched listing page");

                for record in page.into_iter().take(page_limit) {
                    if cancel.is_cancelled() {
                        Err::<(), _>(MemoryError::Cancelled)?;
                    }
                    yield record;
                }

                offset += fetched;
                if let Some(left) = remaining.as_mut() {
                    *left = left.saturating_sub(fetched);
                }
                if fetched < page_limit {
                    break;
                }
            }
        })
    }

    #[tracing::instrument(skip(self, record, cancel), fields(id = %record.id))]
    async fn delete(
        &self,
        index: &str,
        record: &MemoryRecord,
        cancel: &CancellationToken,
    ) -> Result<(), MemoryError> {
        let index = IndexName::parse(index)?;
        validate_id(record)?;
        cancellable(cancel, self.gateway.delete_object(&index, &record.id)).await?;
        tracing::debug!(index = %index, id = %record.id, "Deleted record");
        Ok(())
    }
}
