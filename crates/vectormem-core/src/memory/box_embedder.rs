//! BoxEmbedder -- object-safe dynamic dispatch wrapper for Embedder.
//!
//! 1. Define an object-safe `EmbedderDyn` trait with boxed futures
//! 2. Blanket-impl `EmbedderDyn` for all `T: Embedder`
//! 3. `BoxEmbedder` wraps `Box<dyn EmbedderDyn>` and delegates
//!
//! The provider is picked once, when the box is built; nothing downstream
//! ever branches on which provider it is talking to.

use std::future::Future;
use std::pin::Pin;

use tokio_util::sync::CancellationToken;
use vectormem_types::error::MemoryError;
use vectormem_types::memory::Embedding;

use super::embedder::Embedder;
use crate::cancel::cancellable;

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, MemoryError>> + Send + 'a>>;

/// Object-safe version of [`Embedder`] with boxed futures.
pub trait EmbedderDyn: Send + Sync {
    fn embed_boxed<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Embedding>;

    fn embed_batch_boxed<'a>(&'a self, texts: &'a [String]) -> BoxFuture<'a, Vec<Embedding>>;

    fn model_name_dyn(&self) -> &str;

    fn dimension_dyn(&self) -> usize;

    fn max_tokens_dyn(&self) -> usize;

    fn count_tokens_dyn(&self, text: &str) -> usize;

    fn tokens_dyn<'t>(&self, text: &'t str) -> Vec<&'t str>;
}

impl<T: Embedder> EmbedderDyn for T {
    fn embed_boxed<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Embedding> {
        Box::pin(self.embed(text))
    }

    fn embed_batch_boxed<'a>(&'a self, texts: &'a [String]) -> BoxFuture<'a, Vec<Embedding>> {
        Box::pin(self.embed_batch(texts))
    }

    fn model_name_dyn(&self) -> &str {
        self.model_name()
    }

    fn dimension_dyn(&self) -> usize {
        self.dimension()
    }

    fn max_tokens_dyn(&self) -> usize {
        self.max_tokens()
    }

    fn count_tokens_dyn(&self, text: &str) -> usize {
        self.count_tokens(text)
    }

    fn tokens_dyn<'t>(&self, text: &'t str) -> Vec<&'t str> {
        self.tokens(text)
    }
}

/// Type-erased embedder selected at construction time.
///
/// Since `Embedder` uses RPITIT, it cannot be used as a trait object
/// directly. `BoxEmbedder` provides equivalent methods that delegate to the
/// inner `EmbedderDyn` trait object, and makes every network-bound call
/// cancellable.
pub struct BoxEmbedder {
    inner: Box<dyn EmbedderDyn + Send + Sync>,
}

impl BoxEmbedder {
    /// Wrap a concrete `Embedder` in a type-erased box.
    pub fn new<T: Embedder + 'static>(embedder: T) -> Self {
        Self {
            inner: Box::new(embedder),
        }
    }

    /// Embed a single text, abandoning the request if `cancel` fires.
    pub async fn embed(
        &self,
        text: &str,
        cancel: &CancellationToken,
    ) -> Result<Embedding, MemoryError> {
        cancellable(cancel, self.inner.embed_boxed(text)).await
    }

    /// Embed several texts in input order, abandoning the batch if `cancel` fires.
    pub async fn embed_batch(
        &self,
        texts: &[String],
        cancel: &CancellationToken,
    ) -> Result<Vec<Embedding>, MemoryError> {
        cancellable(cancel, self.inner.embed_batch_boxed(texts)).await
    }

    pub fn model_name(&self) -> &str {
        self.inner.model_name_dyn()
    }

    pub fn dimension(&self) -> usize {
        self.inner.dimension_dyn()
    }

    pub fn max_tokens(&self) -> usize {
        self.inner.max_tokens_dyn()
    }

    pub fn count_tokens(&self, text: &str) -> usize {
        self.inner.count_tokens_dyn(text)
    }

    pub fn tokens<'t>(&self, text: &'t str) -> Vec<&'t str> {
        self.inner.tokens_dyn(text)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::memory::test_support::{DelayedEmbedder, KeywordEmbedder};

    #[tokio::test]
    async fn test_box_delegates_metadata() {
        let embedder = BoxEmbedder::new(KeywordEmbedder::new(16));
        assert_eq!(embedder.dimension(), 16);
        assert_eq!(embedder.model_name(), "keyword-test");
        assert_eq!(embedder.max_tokens(), 512);
        assert_eq!(embedder.count_tokens("uno, dos; tres"), 3);
        assert_eq!(embedder.tokens("uno dos"), vec!["uno", "dos"]);
    }

    #[tokio::test]
    async fn test_embed_returns_configured_dimension() {
        let embedder = BoxEmbedder::new(KeywordEmbedder::new(32));
        let token = CancellationToken::new();
        let embedding = embedder.embed("hoy es abril", &token).await.unwrap();
        assert_eq!(embedding.dimension(), 32);
    }

    #[tokio::test]
    async fn test_batch_preserves_input_order_despite_latency() {
        // "a" is the slowest and "c" the fastest.
        let embedder = BoxEmbedder::new(DelayedEmbedder::new(vec![
            ("a", Duration::from_millis(40)),
            ("b", Duration::from_millis(20)),
            ("c", Duration::from_millis(1)),
        ]));
        let token = CancellationToken::new();
        let texts: Vec<String> = ["a", "b", "c"].iter().map(|s| s.to_string()).collect();

        let batch = embedder.embed_batch(&texts, &token).await.unwrap();
        let single_b = embedder.embed("b", &token).await.unwrap();

        assert_eq!(batch.len(), 3);
        assert_eq!(batch[1], single_b);
        assert_eq!(batch[0].as_slice()[0], 0.0);
        assert_eq!(batch[2].as_slice()[0], 2.0);
    }

    #[tokio::test]
    async fn test_batch_fails_as_a_whole() {
        let embedder = BoxEmbedder::new(DelayedEmbedder::new(vec![
            ("a", Duration::from_millis(1)),
        ]));
        let token = CancellationToken::new();
        let texts = vec!["a".to_string(), "unknown".to_string()];
        let result = embedder.embed_batch(&texts, &token).await;
        assert!(matches!(result, Err(MemoryError::EmbeddingBackend(_))));
    }

    #[tokio::test]
    async fn test_cancelled_embed_returns_cancelled() {
        let embedder = BoxEmbedder::new(KeywordEmbedder::new(8));
        let token = CancellationToken::new();
        token.cancel();
        let result = embedder.embed("hoy", &token).await;
        assert!(matches!(result, Err(MemoryError::Cancelled)));
    }
}
