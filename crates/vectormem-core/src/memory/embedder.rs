//! Embedder trait for text-to-vector conversion.
//!
//! Defines the capability the memory store needs from an embedding backend.
//! Implementations (OpenAI-compatible HTTP services, test doubles) live
//! outside this crate.

use std::future::Future;

use vectormem_types::error::MemoryError;
use vectormem_types::memory::Embedding;

use super::tokenizer;

/// Trait for converting text into embedding vectors.
///
/// Uses RPITIT (native async fn in traits, Rust 2024 edition).
pub trait Embedder: Send + Sync {
    /// Embed a single text.
    ///
    /// Fails with `EmbeddingBackend` when the backend answers with a non-2xx
    /// status or an unusable payload, and `BackendUnavailable` when it
    /// cannot be reached.
    fn embed(&self, text: &str) -> impl Future<Output = Result<Embedding, MemoryError>> + Send;

    /// Embed several texts. Output order matches input order.
    ///
    /// The first failure fails the whole batch; there is no partial result.
    /// The default runs the texts one after another.
    fn embed_batch(
        &self,
        texts: &[String],
    ) -> impl Future<Output = Result<Vec<Embedding>, MemoryError>> + Send {
        async move {
            let mut embeddings = Vec::with_capacity(texts.len());
            for text in texts {
                embeddings.push(self.embed(text).await?);
            }
            Ok(embeddings)
        }
    }

    /// The model name used for embeddings (e.g., "nomic-embed-text").
    fn model_name(&self) -> &str;

    /// The dimensionality of the output vectors, known without a call.
    fn dimension(&self) -> usize;

    /// Largest input, in tokens, the model accepts.
    fn max_tokens(&self) -> usize;

    /// Approximate token count; see [`tokenizer`].
    fn count_tokens(&self, text: &str) -> usize {
        tokenizer::count_tokens(text)
    }

    /// Approximate tokens; see [`tokenizer`].
    fn tokens<'t>(&self, text: &'t str) -> Vec<&'t str> {
        tokenizer::tokens(text)
    }
}
