//! Configuration loader for vectormem.
//!
//! Reads a `vectormem.toml` file and deserializes it into [`MemoryConfig`].
//! Unlike a settings file with safe defaults, a missing or malformed file is
//! an error: the endpoints, model and dimension have no fallback values.
//!
//! API keys may be supplied through the environment instead of the file;
//! the environment wins when both are set.

use std::path::Path;

use vectormem_types::config::MemoryConfig;
use vectormem_types::error::ConfigError;

/// Overrides `embedding.api_key`.
pub const EMBEDDING_API_KEY_ENV: &str = "VECTORMEM_EMBEDDING_API_KEY";

/// Overrides `database.api_key`.
pub const DATABASE_API_KEY_ENV: &str = "VECTORMEM_DATABASE_API_KEY";

/// Default config file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "vectormem.toml";

/// Load, override from the process environment, and validate.
pub async fn load_config(path: &Path) -> Result<MemoryConfig, ConfigError> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|err| ConfigError::Io {
            path: path.display().to_string(),
            message: err.to_string(),
        })?;

    let mut config = parse_config(&content)?;
    apply_env_overrides(&mut config, |name| std::env::var(name).ok());
    config.validate()?;

    tracing::debug!(
        path = %path.display(),
        provider = %config.embedding.provider,
        model = %config.embedding.model,
        dimension = config.embedding.dimension,
        search_mode = %config.database.search_mode,
        "Loaded configuration"
    );
    Ok(config)
}

/// Parse TOML into a config without touching the environment.
pub fn parse_config(content: &str) -> Result<MemoryConfig, ConfigError> {
    toml::from_str::<MemoryConfig>(content).map_err(|err| ConfigError::Parse(err.to_string()))
}

/// Replace API keys with values from `lookup` when present and non-empty.
pub fn apply_env_overrides(config: &mut MemoryConfig, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(key) = lookup(EMBEDDING_API_KEY_ENV).filter(|k| !k.is_empty()) {
        config.embedding.api_key = Some(key);
    }
    if let Some(key) = lookup(DATABASE_API_KEY_ENV).filter(|k| !k.is_empty()) {
        config.database.api_key = Some(key);
    }
}
