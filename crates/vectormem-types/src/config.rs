//! Configuration types for vectormem.
//!
//! `MemoryConfig` mirrors the `vectormem.toml` file read by the bootstrap
//! layer. The endpoint, model and dimension have no defaults: they must be
//! supplied explicitly so the store never runs against compiled-in hosts.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Which OpenAI-compatible embedding service the endpoint points at.
///
/// Selects request defaults only; every kind is served by the same adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbeddingProviderKind {
    #[serde(rename = "openai", alias = "open_ai")]
    OpenAi,
    Ollama,
    LmStudio,
    #[default]
    Custom,
}

impl fmt::Display for EmbeddingProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmbeddingProviderKind::OpenAi => write!(f, "openai"),
            EmbeddingProviderKind::Ollama => write!(f, "ollama"),
            EmbeddingProviderKind::LmStudio => write!(f, "lm_studio"),
            EmbeddingProviderKind::Custom => write!(f, "custom"),
        }
    }
}

impl FromStr for EmbeddingProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" | "open_ai" => Ok(EmbeddingProviderKind::OpenAi),
            "ollama" => Ok(EmbeddingProviderKind::Ollama),
            "lm_studio" | "lmstudio" => Ok(EmbeddingProviderKind::LmStudio),
            "custom" => Ok(EmbeddingProviderKind::Custom),
            other => Err(format!("invalid embedding provider: '{other}'")),
        }
    }
}

/// How similarity searches and listings are sent to the vector database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    /// JSON body posted to the object search/list endpoints.
    Structured,
    /// A `Get` query posted to the GraphQL endpoint.
    #[default]
    Graphql,
}

impl fmt::Display for SearchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchMode::Structured => write!(f, "structured"),
            SearchMode::Graphql => write!(f, "graphql"),
        }
    }
}

impl FromStr for SearchMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "structured" => Ok(SearchMode::Structured),
            "graphql" => Ok(SearchMode::Graphql),
            other => Err(format!("invalid search mode: '{other}'")),
        }
    }
}

/// Embedding backend settings.
#[derive(Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    #[serde(default)]
    pub provider: EmbeddingProviderKind,
    /// Full URL the embedding request is posted to.
    pub endpoint: String,
    pub model: String,
    pub dimension: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,
    /// Upper bound on in-flight requests during batch embedding.
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Vector database settings.
#[derive(Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Base URL of the database, e.g. `http://localhost:8080`.
    pub endpoint: String,
    #[serde(default)]
    pub search_mode: SearchMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Records fetched per round trip when listing.
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    pub embedding: EmbeddingConfig,
    pub database: DatabaseConfig,
}

fn default_max_tokens() -> usize {
    8192
}

fn default_max_concurrency() -> usize {
    4
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_page_size() -> usize {
    100
}

impl MemoryConfig {
    /// Reject values the store cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let e = &self.embedding;
        let d = &self.database;
        if e.endpoint.trim().is_empty() {
            return Err(ConfigError::Invalid("embedding.endpoint is empty".into()));
        }
        if e.model.trim().is_empty() {
            return Err(ConfigError::Invalid("embedding.model is empty".into()));
        }
        if e.dimension == 0 {
            return Err(ConfigError::Invalid(
                "embedding.dimension must be > 0".into(),
            ));
        }
        if e.max_concurrency == 0 {
            return Err(ConfigError::Invalid(
                "embedding.max_concurrency must be > 0".into(),
            ));
        }
        if d.endpoint.trim().is_empty() {
            return Err(ConfigError::Invalid("database.endpoint is empty".into()));
        }
        if d.page_size == 0 {
            return Err(ConfigError::Invalid(
                "database.page_size must be > 0".into(),
            ));
        }
        Ok(())
    }
}

// API keys are redacted from Debug output.
impl fmt::Debug for EmbeddingConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmbeddingConfig")
            .field("provider", &self.provider)
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("dimension", &self.dimension)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("max_tokens", &self.max_tokens)
            .field("max_concurrency", &self.max_concurrency)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("endpoint", &self.endpoint)
            .field("search_mode", &self.search_mode)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("timeout_secs", &self.timeout_secs)
            .field("page_size", &self.page_size)
            .finish()
    }
}
