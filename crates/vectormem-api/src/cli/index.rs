//! Index commands: create, list, delete.

use anyhow::{Context, Result};
use console::style;

use vectormem_core::memory::db::MemoryDb;

use crate::state::AppState;

/// Create an index, defaulting the dimension to the embedding model's.
pub async fn create_index(state: &AppState, name: &str, dimension: Option<usize>, json: bool) -> Result<()> {
    let dimension = dimension.unwrap_or_else(|| state.store.embedder().dimension());
    state
        .store
        .create_index(name, dimension, &state.cancel)
        .await
        .with_context(|| format!("Failed to create index '{name}'"))?;

    if json {
        let out = serde_json::json!({ "index": name, "dimension": dimension, "created": true });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!(
            "  {} Created index '{}' ({} dimensions)",
            style("✓").green(),
            style(name).cyan(),
            dimension
        );
    }
    Ok(())
}

pub async fn list_indexes(state: &AppState, json: bool) -> Result<()> {
    let indexes = state.store.get_indexes(&state.cancel).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&indexes)?);
        return Ok(());
    }
    if indexes.is_empty() {
        println!("  {} No indexes.", style("i").blue().bold());
        return Ok(());
    }
    for name in &indexes {
        println!("  {}", style(name).cyan());
    }
    Ok(())
}

/// Delete an index. With `missing_ok`, an absent index is not an error.
pub async fn delete_index(state: &AppState, name: &str, missing_ok: bool, json: bool) -> Result<()> {
    let deleted = match state.store.delete_index(name, &state.cancel).await {
        Ok(()) => true,
        Err(e) if missing_ok && e.is_not_found() => false,
        Err(e) => return Err(e).with_context(|| format!("Failed to delete index '{name}'")),
    };

    if json {
        let out = serde_json::json!({ "index": name, "deleted": deleted });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else if deleted {
        println!("  {} Deleted index '{}'", style("✓").green(), style(name).cyan());
    } else {
        println!("  {} Index '{}' did not exist", style("i").blue().bold(), style(name).cyan());
    }
    Ok(())
}
