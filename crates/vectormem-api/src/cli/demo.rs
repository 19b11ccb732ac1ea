//! The sample scenario: store one dated sentence, then find it by meaning.

use anyhow::{Context, Result};
use console::style;
use futures_util::TryStreamExt;

use vectormem_core::memory::db::{MemoryDb, SearchOptions};
use vectormem_types::memory::MemoryRecord;

use super::record::print_results;
use crate::state::AppState;

pub const DEMO_INDEX: &str = "Document";
pub const DEMO_ID: &str = "doc-001";
pub const DEMO_TEXT: &str = "Hoy es 1 de abril de 2025 y el equipo revisa el plan trimestral.";
pub const DEMO_QUERY: &str = "fecha";

/// Run the scenario against the configured backends.
///
/// The index is created only when absent, so the demo can be re-run.
pub async fn run(state: &AppState, json: bool) -> Result<()> {
    let store = &state.store;
    let cancel = &state.cancel;

    let indexes = store.get_indexes(cancel).await.context("Failed to list indexes")?;
    if !indexes.contains(DEMO_INDEX) {
        let dimension = store.embedder().dimension();
        store
            .create_index(DEMO_INDEX, dimension, cancel)
            .await
            .context("Failed to create the demo index")?;
        if !json {
            println!(
                "  {} Created index '{}' ({} dimensions)",
                style("✓").green(),
                style(DEMO_INDEX).cyan(),
                dimension
            );
        }
    }

    let record = MemoryRecord::new(DEMO_ID)
        .with_text(DEMO_TEXT)
        .with_tag("source", "demo");
    store
        .upsert(DEMO_INDEX, &record, cancel)
        .await
        .context("Failed to store the demo record")?;
    if !json {
        println!("  {} Stored '{}'", style("✓").green(), style(DEMO_ID).bold());
        println!("  Searching for '{}'...", style(DEMO_QUERY).bold());
    }

    let options = SearchOptions {
        limit: 1,
        ..Default::default()
    };
    let results: Vec<(MemoryRecord, f64)> = store
        .get_similar_list(DEMO_INDEX, DEMO_QUERY, options, cancel)
        .try_collect()
        .await
        .context("Demo search failed")?;

    print_results(DEMO_QUERY, &results, json)
}
