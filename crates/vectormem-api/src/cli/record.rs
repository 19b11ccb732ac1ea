//! Record commands: upsert, search, list, delete.

use anyhow::{Context, Result};
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;
use futures_util::TryStreamExt;

use vectormem_core::memory::db::{ListOptions, MemoryDb, SearchOptions};
use vectormem_types::memory::MemoryRecord;

use crate::state::AppState;

const TEXT_PREVIEW_CHARS: usize = 60;

fn preview(text: Option<&str>) -> String {
    let text = text.unwrap_or("");
    if text.chars().count() > TEXT_PREVIEW_CHARS {
        let cut: String = text.chars().take(TEXT_PREVIEW_CHARS - 3).collect();
        format!("{cut}...")
    } else {
        text.to_string()
    }
}

fn format_tags(record: &MemoryRecord) -> String {
    record
        .tags
        .pairs()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join(", ")
}

fn new_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(
        headers
            .iter()
            .map(|h| Cell::new(h).fg(Color::White))
            .collect::<Vec<_>>(),
    );
    table
}

/// Store `text` under `id`; the store computes the embedding.
pub async fn upsert(
    state: &AppState,
    index: &str,
    id: &str,
    text: &str,
    tags: &[(String, String)],
    json: bool,
) -> Result<()> {
    let record = tags
        .iter()
        .fold(MemoryRecord::new(id).with_text(text), |record, (k, v)| {
            record.with_tag(k.as_str(), v.as_str())
        });
    let stored_id = state
        .store
        .upsert(index, &record, &state.cancel)
        .await
        .with_context(|| format!("Failed to upsert '{id}' into '{index}'"))?;

    if json {
        let out = serde_json::json!({ "index": index, "id": stored_id });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!(
            "  {} Stored '{}' in '{}'",
            style("✓").green(),
            style(&stored_id).bold(),
            style(index).cyan()
        );
    }
    Ok(())
}

pub async fn search(
    state: &AppState,
    index: &str,
    query: &str,
    options: SearchOptions,
    json: bool,
) -> Result<()> {
    let results: Vec<(MemoryRecord, f64)> = state
        .store
        .get_similar_list(index, query, options, &state.cancel)
        .try_collect()
        .await
        .with_context(|| format!("Search in '{index}' failed"))?;

    print_results(query, &results, json)
}

/// Print search results as JSON or a table.
pub fn print_results(query: &str, results: &[(MemoryRecord, f64)], json: bool) -> Result<()> {
    if json {
        let out: Vec<serde_json::Value> = results
            .iter()
            .map(|(record, score)| serde_json::json!({ "score": score, "record": record }))
            .collect();
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    if results.is_empty() {
        println!("  {} No results for '{}'.", style("i").blue().bold(), query);
        return Ok(());
    }

    let mut table = new_table(&["Score", "Id", "Text", "Tags"]);
    for (record, score) in results {
        table.add_row(vec![
            Cell::new(format!("{score:.3}")).fg(Color::Yellow),
            Cell::new(&record.id).fg(Color::Cyan),
            Cell::new(preview(record.text.as_deref())).fg(Color::White),
            Cell::new(format_tags(record)).fg(Color::DarkGrey),
        ]);
    }
    println!("{table}");
    Ok(())
}

pub async fn list(state: &AppState, index: &str, options: ListOptions, json: bool) -> Result<()> {
    let records: Vec<MemoryRecord> = state
        .store
        .get_list(index, options, &state.cancel)
        .try_collect()
        .await
        .with_context(|| format!("Listing '{index}' failed"))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }
    if records.is_empty() {
        println!("  {} No records in '{}'.", style("i").blue().bold(), style(index).cyan());
        return Ok(());
    }

    let mut table = new_table(&["Id", "Text", "Tags"]);
    for record in &records {
        table.add_row(vec![
            Cell::new(&record.id).fg(Color::Cyan),
            Cell::new(preview(record.text.as_deref())).fg(Color::White),
            Cell::new(format_tags(record)).fg(Color::DarkGrey),
        ]);
    }
    println!("{table}");
    println!(
        "  {} record{}",
        style(records.len()).bold(),
        if records.len() == 1 { "" } else { "s" }
    );
    Ok(())
}

/// Delete a record. With `missing_ok`, an absent record is not an error.
pub async fn delete(state: &AppState, index: &str, id: &str, missing_ok: bool, json: bool) -> Result<()> {
    let record = MemoryRecord::new(id);
    let deleted = match state.store.delete(index, &record, &state.cancel).await {
        Ok(()) => true,
        Err(e) if missing_ok && e.is_not_found() => false,
        Err(e) => return Err(e).with_context(|| format!("Failed to delete '{id}' from '{index}'")),
    };

    if json {
        let out = serde_json::json!({ "index": index, "id": id, "deleted": deleted });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else if deleted {
        println!("  {} Deleted '{}' from '{}'", style("✓").green(), id, style(index).cyan());
    } else {
        println!("  {} '{}' was not in '{}'", style("i").blue().bold(), id, style(index).cyan());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_truncates_on_char_boundary() {
        let long = "ñ".repeat(100);
        let shown = preview(Some(&long));
        assert_eq!(shown.chars().count(), TEXT_PREVIEW_CHARS);
        assert!(shown.ends_with("..."));
        assert_eq!(preview(Some("corto")), "corto");
        assert_eq!(preview(None), "");
    }

    #[test]
    fn test_format_tags() {
        let record = MemoryRecord::new("x").with_tag("user", "alice").with_tag("lang", "es");
        assert_eq!(format_tags(&record), "lang=es, user=alice");
    }
}
