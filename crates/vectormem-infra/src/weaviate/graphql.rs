//! GraphQL `Get` query rendering.
//!
//! Weaviate's GraphQL input objects use unquoted keys and bare enum values
//! (`operator: And`), so the JSON `where` tree is rendered by hand rather
//! than serialized.

use std::fmt::Write as _;

use serde_json::Value;

/// Keys whose string values are GraphQL enum literals.
const ENUM_KEYS: &[&str] = &["operator"];

/// A `Get` query for one class.
#[derive(Debug)]
pub struct GetQuery<'a> {
    pub class: &'a str,
    /// Query vector and maximum cosine distance.
    pub near_vector: Option<(&'a [f32], f64)>,
    pub limit: usize,
    pub offset: Option<usize>,
    pub where_filter: Option<&'a Value>,
    pub with_vectors: bool,
}

impl GetQuery<'_> {
    pub fn render(&self) -> String {
        let mut args = Vec::new();
        if let Some((vector, distance)) = self.near_vector {
            args.push(format!(
                "nearVector: {{vector: {}, distance: {}}}",
                render_vector(vector),
                distance
            ));
        }
        args.push(format!("limit: {}", self.limit));
        if let Some(offset) = self.offset {
            args.push(format!("offset: {offset}"));
        }
        if let Some(filter) = self.where_filter {
            args.push(format!("where: {}", render_input(filter, None)));
        }

        let mut additional = String::from("id");
        if self.near_vector.is_some() {
            additional.push_str(" distance");
        }
        if self.with_vectors {
            additional.push_str(" vector");
        }

        format!(
            "{{ Get {{ {}({}) {{ text tags payload _additional {{ {} }} }} }} }}",
            self.class,
            args.join(", "),
            additional
        )
    }
}

fn render_vector(vector: &[f32]) -> String {
    let mut out = String::with_capacity(vector.len() * 10 + 2);
    out.push('[');
    for (i, v) in vector.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        let _ = write!(out, "{v}");
    }
    out.push(']');
    out
}

/// Render a JSON value as a GraphQL input literal.
fn render_input(value: &Value, key: Option<&str>) -> String {
    match value {
        Value::Object(map) => {
            let fields: Vec<String> = map
                .iter()
                .map(|(k, v)| format!("{k}: {}", render_input(v, Some(k))))
                .collect();
            format!("{{{}}}", fields.join(", "))
        }
        Value::Array(items) => {
            let items: Vec<String> = items.iter().map(|v| render_input(v, None)).collect();
            format!("[{}]", items.join(", "))
        }
        Value::String(s) if key.is_some_and(|k| ENUM_KEYS.contains(&k)) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_near_vector_query() {
        let vector = [0.5f32, -1.0];
        let query = GetQuery {
            class: "Document",
            near_vector: Some((&vector, 0.5)),
            limit: 1,
            offset: None,
            where_filter: None,
            with_vectors: false,
        }
        .render();
        assert_eq!(
            query,
            "{ Get { Document(nearVector: {vector: [0.5, -1], distance: 0.5}, limit: 1) \
             { text tags payload _additional { id distance } } } }"
        );
    }

    #[test]
    fn test_listing_query_with_where_and_vectors() {
        let filter = json!({
            "operator": "Or",
            "operands": [
                { "path": ["tags"], "operator": "ContainsAny", "valueText": ["user:a\"b"] },
                { "path": ["tags"], "operator": "ContainsAny", "valueText": ["user:c"] }
            ]
        });
        let query = GetQuery {
            class: "Document",
            near_vector: None,
            limit: 100,
            offset: Some(200),
            where_filter: Some(&filter),
            with_vectors: true,
        }
        .render();
        assert!(query.contains("limit: 100, offset: 200"));
        assert!(query.contains("operator: Or"));
        assert!(query.contains("operator: ContainsAny"));
        assert!(query.contains(r#"path: ["tags"]"#));
        assert!(query.contains(r#"valueText: ["user:a\"b"]"#));
        assert!(query.contains("_additional { id vector }"));
        assert!(!query.contains("nearVector"));
    }
}
