//! Shared application state for CLI commands.

use std::path::Path;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;

use vectormem_core::memory::store::VectorMemoryStore;
use vectormem_infra::builder::build_store;
use vectormem_infra::config::load_config;
use vectormem_infra::weaviate::WeaviateGateway;

/// Everything a command needs: the store and the token Ctrl+C cancels.
pub struct AppState {
    pub store: VectorMemoryStore<WeaviateGateway>,
    pub cancel: CancellationToken,
}

impl AppState {
    /// Load configuration from `config_path` and wire the store.
    pub async fn init(config_path: &Path) -> Result<Self> {
        let config = load_config(config_path)
            .await
            .with_context(|| format!("Failed to load config from {}", config_path.display()))?;
        let store = build_store(&config).context("Failed to initialize the memory store")?;

        Ok(Self {
            store,
            cancel: CancellationToken::new(),
        })
    }

    /// Cancel the in-flight operation on Ctrl+C.
    pub fn cancel_on_ctrl_c(&self) {
        let cancel = self.cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Interrupted, cancelling the in-flight operation");
                cancel.cancel();
            }
        });
    }
}
