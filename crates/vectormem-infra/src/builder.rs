//! Construction of the store from configuration.
//!
//! The embedding provider is picked here, once; everything downstream holds
//! a [`BoxEmbedder`] and never branches on the provider kind.

use vectormem_core::memory::box_embedder::BoxEmbedder;
use vectormem_core::memory::store::VectorMemoryStore;
use vectormem_types::config::{EmbeddingConfig, MemoryConfig};
use vectormem_types::error::MemoryError;

use crate::embedding::OpenAiCompatEmbedder;
use crate::embedding::config::{EmbeddingClientConfig, requires_api_key};
use crate::weaviate::WeaviateGateway;

/// Build the embedding provider described by `config`.
pub fn build_embedder(config: &EmbeddingConfig) -> Result<BoxEmbedder, MemoryError> {
    if requires_api_key(config.provider) && config.api_key.is_none() {
        tracing::warn!(
            provider = %config.provider,
            "No API key configured; requests will likely be rejected"
        );
    }
    let embedder = OpenAiCompatEmbedder::new(EmbeddingClientConfig::from(config))?;
    tracing::info!(
        provider = embedder.provider_name(),
        endpoint = embedder.endpoint(),
        model = %config.model,
        dimension = config.dimension,
        "Embedding provider ready"
    );
    Ok(BoxEmbedder::new(embedder))
}

/// Build a store over the Weaviate gateway.
pub fn build_store(config: &MemoryConfig) -> Result<VectorMemoryStore<WeaviateGateway>, MemoryError> {
    let embedder = build_embedder(&config.embedding)?;
    let gateway = WeaviateGateway::new(&config.database)?;
    tracing::info!(
        endpoint = %config.database.endpoint,
        search_mode = %config.database.search_mode,
        "Vector database gateway ready"
    );
    Ok(VectorMemoryStore::new(gateway, embedder).with_page_size(config.database.page_size))
}

#[cfg(test)]
mod tests {
    use futures_util::StreamExt;
    use serde_json::json;
    use tokio_util::sync::CancellationToken;
    use vectormem_core::memory::db::{MemoryDb, SearchOptions};
    use vectormem_types::memory::MemoryRecord;
    use wiremock::{Mock, MockServer, ResponseTemplate, matchers};

    use super::*;
    use crate::config::parse_config;

    fn config_for(embedding: &MockServer, database: &MockServer) -> MemoryConfig {
        parse_config(&format!(
            r#"
[embedding]
provider = "ollama"
endpoint = "{}/v1/embeddings"
model = "nomic-embed-text"
dimension = 3

[database]
endpoint = "{}"
"#,
            embedding.uri(),
            database.uri()
        ))
        .unwrap()
    }

    #[test]
    fn test_build_embedder_uses_config_dimension() {
        let config: EmbeddingConfig = toml::from_str(
            r#"
provider = "openai"
endpoint = "https://api.openai.com/v1/embeddings"
model = "text-embedding-3-small"
dimension = 1536
"#,
        )
        .unwrap();
        let embedder = build_embedder(&config).unwrap();
        assert_eq!(embedder.dimension(), 1536);
        assert_eq!(embedder.model_name(), "text-embedding-3-small");
    }

    #[tokio::test]
    async fn test_store_embeds_text_then_writes_object() {
        let embedding = MockServer::start().await;
        let database = MockServer::start().await;
        Mock::given(matchers::method("POST"))
            .and(matchers::path("/v1/embeddings"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{ "embedding": [0.1, 0.2, 0.3] }]
            })))
            .expect(1)
            .mount(&embedding)
            .await;
        Mock::given(matchers::method("POST"))
            .and(matchers::path("/v1/objects"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "doc-001" })))
            .expect(1)
            .mount(&database)
            .await;

        let store = build_store(&config_for(&embedding, &database)).unwrap();
        let token = CancellationToken::new();
        let record = MemoryRecord::new("doc-001").with_text("Hoy es 1 de abril de 2025");
        let id = store.upsert("Document", &record, &token).await.unwrap();
        assert_eq!(id, "doc-001");

        let requests = database.received_requests().await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
        let sent: Vec<f32> = serde_json::from_value(body["vector"].clone()).unwrap();
        assert_eq!(sent, vec![0.1, 0.2, 0.3]);
    }

    #[tokio::test]
    async fn test_store_wrong_dimension_never_reaches_database() {
        let embedding = MockServer::start().await;
        let database = MockServer::start().await;
        Mock::given(matchers::any())
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&database)
            .await;

        let store = build_store(&config_for(&embedding, &database)).unwrap();
        let token = CancellationToken::new();
        let record = MemoryRecord::new("doc-001").with_vector(vec![1.0f32; 5]);
        let err = store.upsert("Document", &record, &token).await.unwrap_err();
        assert!(matches!(err, MemoryError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn test_store_search_over_graphql() {
        let embedding = MockServer::start().await;
        let database = MockServer::start().await;
        Mock::given(matchers::method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{ "embedding": [1.0, 0.0, 0.0] }]
            })))
            .mount(&embedding)
            .await;
        Mock::given(matchers::method("POST"))
            .and(matchers::path("/v1/graphql"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": { "Get": { "Document": [
                    { "text": "Hoy es 1 de abril de 2025", "tags": [], "_additional": { "id": "doc-001", "distance": 0.3 } }
                ] } }
            })))
            .expect(1)
            .mount(&database)
            .await;

        let store = build_store(&config_for(&embedding, &database)).unwrap();
        let token = CancellationToken::new();
        let options = SearchOptions {
            limit: 1,
            ..Default::default()
        };
        let results: Vec<_> = store
            .get_similar_list("Document", "fecha", options, &token)
            .collect()
            .await;

        assert_eq!(results.len(), 1);
        let (record, score) = results.into_iter().next().unwrap().unwrap();
        assert_eq!(record.id, "doc-001");
        assert!((score - 0.7).abs() < 1e-9);
    }
}
