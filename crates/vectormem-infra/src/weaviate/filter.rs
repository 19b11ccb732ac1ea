//! Tag encoding and `where` filter construction.
//!
//! Tags travel as `"key:value"` strings in the `tags` text-array property.
//! A slice of [`MemoryFilter`]s becomes an `Or` over filters, each an `And`
//! over `ContainsAny` leaves. Levels with a single operand are collapsed.

use serde_json::{Value, json};
use vectormem_types::memory::{MemoryFilter, TAG_SEPARATOR, TagCollection};

pub fn encode_tag(key: &str, value: &str) -> String {
    format!("{key}{TAG_SEPARATOR}{value}")
}

pub fn encode_tags(tags: &TagCollection) -> Vec<String> {
    tags.pairs().map(|(k, v)| encode_tag(k, v)).collect()
}

/// Decode wire tags, splitting on the first separator.
/// Entries without a separator become a key with an empty value.
pub fn decode_tags<S: AsRef<str>>(wire: &[S]) -> TagCollection {
    wire.iter()
        .map(|entry| {
            let entry = entry.as_ref();
            entry.split_once(TAG_SEPARATOR).unwrap_or((entry, ""))
        })
        .collect()
}

fn leaf(key: &str, value: &str) -> Value {
    json!({
        "path": ["tags"],
        "operator": "ContainsAny",
        "valueText": [encode_tag(key, value)],
    })
}

fn combine(operator: &str, mut operands: Vec<Value>) -> Value {
    if operands.len() == 1 {
        return operands.remove(0);
    }
    json!({ "operator": operator, "operands": operands })
}

/// Build the `where` tree for `filters`, or `None` when nothing restricts.
pub fn where_filter(filters: &[MemoryFilter]) -> Option<Value> {
    let clauses: Vec<Value> = filters
        .iter()
        .filter(|f| !f.is_empty())
        .map(|f| combine("And", f.pairs().map(|(k, v)| leaf(k, v)).collect()))
        .collect();
    if clauses.is_empty() {
        return None;
    }
    Some(combine("Or", clauses))
}
