//! OpenAI-compatible embedding provider.
//!
//! A single [`OpenAiCompatEmbedder`] serves OpenAI, Ollama, LM Studio and
//! any other service exposing the `/embeddings` protocol: the request body is
//! `{model, input, encoding_format: "float"}` and the vector is read from
//! `data[0].embedding`.
//!
//! The API key is wrapped in [`secrecy::SecretString`] and is never logged
//! or included in `Debug` output.

pub mod config;

use futures_util::{StreamExt, TryStreamExt};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use vectormem_core::memory::embedder::Embedder;
use vectormem_types::error::MemoryError;
use vectormem_types::memory::Embedding;

use self::config::EmbeddingClientConfig;

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
    encoding_format: &'static str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

/// Embedder for any OpenAI-compatible `/embeddings` endpoint.
///
/// Owns one long-lived `reqwest::Client`, so connections are pooled across
/// calls. Does NOT derive Debug; the key stays inside the `SecretString`.
pub struct OpenAiCompatEmbedder {
    client: reqwest::Client,
    provider_name: String,
    endpoint: String,
    api_key: Option<SecretString>,
    model: String,
    dimension: usize,
    max_tokens: usize,
    max_concurrency: usize,
}

impl OpenAiCompatEmbedder {
    /// Create an embedder from a configuration.
    ///
    /// Fails with `InvalidArgument` when the HTTP client cannot be built or
    /// the configuration is unusable.
    pub fn new(config: EmbeddingClientConfig) -> Result<Self, MemoryError> {
        if config.dimension == 0 {
            return Err(MemoryError::InvalidArgument(
                "embedding dimension must be > 0".to_string(),
            ));
        }
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| MemoryError::InvalidArgument(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            provider_name: config.provider_name,
            endpoint: config.endpoint,
            api_key: config
                .api_key
                .filter(|key| !key.is_empty())
                .map(SecretString::from),
            model: config.model,
            dimension: config.dimension,
            max_tokens: config.max_tokens,
            max_concurrency: config.max_concurrency.max(1),
        })
    }

    pub fn provider_name(&self) -> &str {
        &self.provider_name
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

fn transport_error(provider: &str, e: reqwest::Error) -> MemoryError {
    MemoryError::BackendUnavailable(format!("{provider} embedding request failed: {e}"))
}

impl Embedder for OpenAiCompatEmbedder {
    async fn embed(&self, text: &str) -> Result<Embedding, MemoryError> {
        let body = EmbeddingRequest {
            model: &self.model,
            input: text,
            encoding_format: "float",
        };

        tracing::debug!(
            provider = %self.provider_name,
            model = %self.model,
            chars = text.len(),
            "Requesting embedding"
        );

        let mut request = self.client.post(&self.endpoint).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key.expose_secret());
        }

        let response = request
            .send()
            .await
            .map_err(|e| transport_error(&self.provider_name, e))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            tracing::warn!(
                provider = %self.provider_name,
                status = status.as_u16(),
                "Embedding backend returned an error"
            );
            return Err(MemoryError::EmbeddingBackend(format!(
                "HTTP {status}: {error_body}"
            )));
        }

        let parsed: EmbeddingResponse = response.json().await.map_err(|e| {
            MemoryError::EmbeddingBackend(format!("failed to parse embedding response: {e}"))
        })?;

        let vector = parsed
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| {
                MemoryError::EmbeddingBackend("response contained no embedding".to_string())
            })?;

        if vector.len() != self.dimension {
            return Err(MemoryError::EmbeddingBackend(format!(
                "model '{}' returned {} dimensions, expected {}",
                self.model,
                vector.len(),
                self.dimension
            )));
        }

        Ok(Embedding::new(vector))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Embedding>, MemoryError> {
        let pending: Vec<_> = texts.iter().map(|text| self.embed(text)).collect();
        // `buffered` keeps input order regardless of completion order.
        futures_util::stream::iter(pending)
            .buffered(self.max_concurrency)
            .try_collect()
            .await
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn max_tokens(&self) -> usize {
        self.max_tokens
    }
}
