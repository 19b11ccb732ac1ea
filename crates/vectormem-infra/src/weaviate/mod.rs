//! WeaviateGateway -- concrete [`VectorGateway`] for a Weaviate-style REST
//! and GraphQL API.
//!
//! Every call is exactly one HTTP round trip over a long-lived
//! `reqwest::Client`. Nothing is retried and nothing is cached.
//!
//! Status mapping:
//! - 404 on schema routes → `IndexNotFound`; on object routes →
//!   `RecordNotFound`, or `IndexNotFound` when the body names the class
//! - 409, or 422 mentioning "already exists", on schema creation →
//!   `IndexAlreadyExists`
//! - any other non-2xx → `Backend { status, message }`
//! - transport failures → `BackendUnavailable`
//! - undecodable 2xx bodies → `MalformedResponse`

pub mod filter;
pub mod graphql;
pub mod wire;

use std::collections::BTreeSet;
use std::time::Duration;

use reqwest::{Method, RequestBuilder, Response, Url};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;

use vectormem_core::memory::gateway::{
    GatewayCapabilities, ObjectListing, VectorGateway, VectorSearch,
};
use vectormem_types::config::{DatabaseConfig, SearchMode};
use vectormem_types::error::MemoryError;
use vectormem_types::memory::{IndexName, MemoryRecord, SearchResult};

use self::filter::where_filter;
use self::graphql::GetQuery;
use self::wire::{
    CreateClassRequest, GraphQlHit, GraphQlRequest, GraphQlResponse, ListRequest, ObjectProperties,
    ObjectRequest, ObjectResponse, ResultsResponse, SchemaResponse, SearchRequest,
    VectorIndexConfig,
};

/// Which kind of resource a request addresses, for 404/409 mapping.
#[derive(Debug, Clone, Copy)]
enum Route<'a> {
    Schema { index: &'a str },
    Class { index: &'a str },
    Object { index: &'a str, id: &'a str },
}

fn status_error(status: u16, body: String, route: Route<'_>) -> MemoryError {
    let already_exists = body.to_lowercase().contains("already exists");
    match (status, route) {
        (404, Route::Schema { index }) | (404, Route::Class { index }) => {
            MemoryError::IndexNotFound(index.to_string())
        }
        (404, Route::Object { index, id }) => {
            if body.contains("class") && body.contains(index) {
                MemoryError::IndexNotFound(index.to_string())
            } else {
                MemoryError::RecordNotFound {
                    index: index.to_string(),
                    id: id.to_string(),
                }
            }
        }
        (409, Route::Schema { index }) => MemoryError::IndexAlreadyExists(index.to_string()),
        (422, Route::Schema { index }) if already_exists => {
            MemoryError::IndexAlreadyExists(index.to_string())
        }
        _ => MemoryError::Backend {
            status,
            message: body,
        },
    }
}

fn transport_error(e: reqwest::Error) -> MemoryError {
    MemoryError::BackendUnavailable(format!("vector database request failed: {e}"))
}

/// Weaviate protocol client.
///
/// Does NOT derive Debug; the optional API key stays inside the
/// `SecretString`.
pub struct WeaviateGateway {
    client: reqwest::Client,
    base_url: Url,
    api_key: Option<SecretString>,
    search_mode: SearchMode,
}

impl WeaviateGateway {
    /// Create a gateway from the `[database]` configuration.
    pub fn new(config: &DatabaseConfig) -> Result<Self, MemoryError> {
        let base_url = Url::parse(&config.endpoint).map_err(|e| {
            MemoryError::InvalidArgument(format!(
                "invalid database endpoint '{}': {e}",
                config.endpoint
            ))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(MemoryError::InvalidArgument(format!(
                "database endpoint '{}' cannot be a base URL",
                config.endpoint
            )));
        }
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| MemoryError::InvalidArgument(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url,
            api_key: config
                .api_key
                .clone()
                .filter(|key| !key.is_empty())
                .map(SecretString::from),
            search_mode: config.search_mode,
        })
    }

    pub fn search_mode(&self) -> SearchMode {
        self.search_mode
    }

    /// Build the URL for `segments` below the base, percent-encoding each.
    fn url(&self, segments: &[&str]) -> Result<Url, MemoryError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                MemoryError::InvalidArgument(format!("cannot extend base URL '{}'", self.base_url))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, segments: &[&str]) -> Result<RequestBuilder, MemoryError> {
        let url = self.url(segments)?;
        tracing::debug!(method = %method, url = %url, "Vector database request");
        let mut request = self.client.request(method, url);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key.expose_secret());
        }
        Ok(request)
    }

    /// Send a request, turning transport failures and non-2xx statuses into
    /// typed errors.
    async fn execute(&self, request: RequestBuilder, route: Route<'_>) -> Result<Response, MemoryError> {
        let response = request.send().await.map_err(transport_error)?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        tracing::warn!(
            status = status.as_u16(),
            route = ?route,
            "Vector database returned an error"
        );
        Err(status_error(status.as_u16(), body, route))
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, MemoryError> {
        let bytes = response.bytes().await.map_err(transport_error)?;
        serde_json::from_slice(&bytes)
            .map_err(|e| MemoryError::MalformedResponse(format!("failed to parse response: {e}")))
    }

    /// Run a GraphQL `Get` and return the hits for `index`.
    async fn graphql_get(
        &self,
        index: &IndexName,
        query: GetQuery<'_>,
    ) -> Result<Vec<GraphQlHit>, MemoryError> {
        let body = GraphQlRequest {
            query: query.render(),
        };
        let request = self.request(Method::POST, &["v1", "graphql"])?.json(&body);
        let response = self
            .execute(request, Route::Class { index: index.as_str() })
            .await?;
        let parsed: GraphQlResponse = Self::decode(response).await?;

        if let Some(errors) = parsed.errors.filter(|errors| !errors.is_empty()) {
            let message = errors
                .into_iter()
                .map(|e| e.message)
                .collect::<Vec<_>>()
                .join("; ");
            // An unknown class surfaces as a schema validation error.
            if message.contains("Cannot query field") && message.contains(index.as_str()) {
                return Err(MemoryError::IndexNotFound(index.to_string()));
            }
            return Err(MemoryError::Backend {
                status: 200,
                message,
            });
        }

        let mut data = parsed.data.ok_or_else(|| {
            MemoryError::MalformedResponse("GraphQL response has no data".to_string())
        })?;
        Ok(data.get.remove(index.as_str()).flatten().unwrap_or_default())
    }
}

impl VectorGateway for WeaviateGateway {
    fn capabilities(&self) -> GatewayCapabilities {
        GatewayCapabilities {
            native_min_relevance: true,
        }
    }

    async fn create_index(&self, index: &IndexName, dimension: usize) -> Result<(), MemoryError> {
        let body = CreateClassRequest {
            class_name: index.as_str(),
            vector_index_config: VectorIndexConfig {
                vector_size: dimension,
            },
        };
        let request = self.request(Method::POST, &["v1", "schema"])?.json(&body);
        self.execute(request, Route::Schema { index: index.as_str() })
            .await?;
        Ok(())
    }

    async fn list_indexes(&self) -> Result<BTreeSet<String>, MemoryError> {
        let request = self.request(Method::GET, &["v1", "schema"])?;
        let response = self.execute(request, Route::Schema { index: "" }).await?;
        let schema: SchemaResponse = Self::decode(response).await?;
        Ok(schema
            .classes
            .unwrap_or_default()
            .into_iter()
            .map(|c| c.class_name)
            .collect())
    }

    async fn delete_index(&self, index: &IndexName) -> Result<(), MemoryError> {
        let request = self.request(Method::DELETE, &["v1", "schema", index.as_str()])?;
        self.execute(request, Route::Schema { index: index.as_str() })
            .await?;
        Ok(())
    }

    async fn upsert_object(
        &self,
        index: &IndexName,
        record: &MemoryRecord,
    ) -> Result<String, MemoryError> {
        let body = ObjectRequest {
            class: index.as_str(),
            id: &record.id,
            properties: ObjectProperties::from_record(record)?,
            vector: record.vector.as_ref().map(|v| v.as_slice()),
        };
        let request = self.request(Method::POST, &["v1", "objects"])?.json(&body);
        let response = self
            .execute(request, Route::Class { index: index.as_str() })
            .await?;

        let bytes = response.bytes().await.map_err(transport_error)?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(record.id.clone());
        }
        let parsed: ObjectResponse = serde_json::from_slice(&bytes)
            .map_err(|e| MemoryError::MalformedResponse(format!("failed to parse response: {e}")))?;
        Ok(parsed
            .id
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| record.id.clone()))
    }

    async fn delete_object(&self, index: &IndexName, id: &str) -> Result<(), MemoryError> {
        let request = self.request(Method::DELETE, &["v1", "objects", index.as_str(), id])?;
        self.execute(
            request,
            Route::Object {
                index: index.as_str(),
                id,
            },
        )
        .await?;
        Ok(())
    }

    async fn search_by_vector(
        &self,
        query: &VectorSearch<'_>,
    ) -> Result<Vec<SearchResult>, MemoryError> {
        let filters = where_filter(query.filters);
        match self.search_mode {
            SearchMode::Structured => {
                let body = SearchRequest {
                    class_name: query.index.as_str(),
                    vector: query.vector.as_slice(),
                    limit: query.limit,
                    min_relevance: query.min_relevance,
                    with_embeddings: query.with_vectors,
                    filters,
                };
                let request = self
                    .request(Method::POST, &["v1", "objects", "search"])?
                    .json(&body);
                let response = self
                    .execute(request, Route::Class { index: query.index.as_str() })
                    .await?;
                let parsed: ResultsResponse = Self::decode(response).await?;
                parsed
                    .results
                    .into_iter()
                    .map(|hit| hit.into_result(query.with_vectors))
                    .collect()
            }
            SearchMode::Graphql => {
                let get = GetQuery {
                    class: query.index.as_str(),
                    near_vector: Some((query.vector.as_slice(), 1.0 - query.min_relevance)),
                    limit: query.limit,
                    offset: None,
                    where_filter: filters.as_ref(),
                    with_vectors: query.with_vectors,
                };
                self.graphql_get(query.index, get)
                    .await?
                    .into_iter()
                    .map(|hit| hit.into_result(query.with_vectors))
                    .collect()
            }
        }
    }

    async fn list_objects(&self, query: &ObjectListing<'_>) -> Result<Vec<MemoryRecord>, MemoryError> {
        let filters = where_filter(query.filters);
        match self.search_mode {
            SearchMode::Structured => {
                let body = ListRequest {
                    class_name: query.index.as_str(),
                    limit: query.limit,
                    offset: query.offset,
                    with_embeddings: query.with_vectors,
                    filters,
                };
                let request = self
                    .request(Method::POST, &["v1", "objects", "list"])?
                    .json(&body);
                let response = self
                    .execute(request, Route::Class { index: query.index.as_str() })
                    .await?;
                let parsed: ResultsResponse = Self::decode(response).await?;
                parsed
                    .results
                    .into_iter()
                    .map(|hit| hit.into_record(query.with_vectors))
                    .collect()
            }
            SearchMode::Graphql => {
                let get = GetQuery {
                    class: query.index.as_str(),
                    near_vector: None,
                    limit: query.limit,
                    offset: Some(query.offset),
                    where_filter: filters.as_ref(),
                    with_vectors: query.with_vectors,
                };
                self.graphql_get(query.index, get)
                    .await?
                    .into_iter()
                    .map(|hit| hit.into_record(query.with_vectors))
                    .collect()
            }
        }
    }
}
