//! Configuration types and per-provider defaults for OpenAI-compatible
//! embedding services.
//!
//! Every provider that speaks the `/embeddings` protocol gets a factory
//! function returning an [`EmbeddingClientConfig`] with its usual endpoint.
//! The bootstrap path builds the config from the TOML file instead, so these
//! endpoints never act as silent fallbacks.

use std::time::Duration;

use vectormem_types::config::{EmbeddingConfig, EmbeddingProviderKind};

/// Configuration for an [`super::OpenAiCompatEmbedder`].
#[derive(Clone)]
pub struct EmbeddingClientConfig {
    /// Human-readable provider name (e.g., "openai", "ollama").
    pub provider_name: String,
    /// Full URL the request is posted to.
    pub endpoint: String,
    /// Sent as `Authorization: Bearer` when present.
    pub api_key: Option<String>,
    pub model: String,
    pub dimension: usize,
    pub max_tokens: usize,
    pub max_concurrency: usize,
    pub timeout: Duration,
}

const DEFAULT_MAX_TOKENS: usize = 8192;
const DEFAULT_MAX_CONCURRENCY: usize = 4;
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

fn preset(provider_name: &str, endpoint: &str, api_key: Option<&str>, model: &str, dimension: usize) -> EmbeddingClientConfig {
    EmbeddingClientConfig {
        provider_name: provider_name.into(),
        endpoint: endpoint.into(),
        api_key: api_key.map(Into::into),
        model: model.into(),
        dimension,
        max_tokens: DEFAULT_MAX_TOKENS,
        max_concurrency: DEFAULT_MAX_CONCURRENCY,
        timeout: DEFAULT_TIMEOUT,
    }
}

/// OpenAI default configuration.
///
/// Endpoint: `https://api.openai.com/v1/embeddings`
pub fn openai_defaults(api_key: &str, model: &str, dimension: usize) -> EmbeddingClientConfig {
    preset(
        "openai",
        "https://api.openai.com/v1/embeddings",
        Some(api_key),
        model,
        dimension,
    )
}

/// Local Ollama server configuration (OpenAI-compatible endpoint).
///
/// Endpoint: `http://localhost:11434/v1/embeddings`. Ollama ignores the key.
pub fn ollama_defaults(model: &str, dimension: usize) -> EmbeddingClientConfig {
    preset(
        "ollama",
        "http://localhost:11434/v1/embeddings",
        None,
        model,
        dimension,
    )
}

/// Local LM Studio server configuration.
///
/// Endpoint: `http://localhost:1234/v1/embeddings`
pub fn lm_studio_defaults(model: &str, dimension: usize) -> EmbeddingClientConfig {
    preset(
        "lm_studio",
        "http://localhost:1234/v1/embeddings",
        None,
        model,
        dimension,
    )
}

impl From<&EmbeddingConfig> for EmbeddingClientConfig {
    fn from(config: &EmbeddingConfig) -> Self {
        Self {
            provider_name: config.provider.to_string(),
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            dimension: config.dimension,
            max_tokens: config.max_tokens,
            max_concurrency: config.max_concurrency,
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }
}

/// Whether this provider kind needs an API key to be usable.
pub fn requires_api_key(kind: EmbeddingProviderKind) -> bool {
    matches!(kind, EmbeddingProviderKind::OpenAi)
}
