//! Elasticsearch REST client.
//!
//! Speaks the handful of REST endpoints the console needs: index listing,
//! count, search, get, partial update, index and delete. Every call is a
//! single request with no retries; the client-wide timeout bounds each one.

use super::{DocumentStore, StoreResult};
use crate::error::StoreError;
use crate::models::{Document, Fields};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::BTreeSet;
use std::time::Duration;
use tracing::{debug, warn};

/// Largest `size` a search may request under the default
/// `index.max_result_window`.
const MAX_RESULT_WINDOW: u64 = 10_000;

/// Connection settings for the Elasticsearch cluster.
#[derive(Debug, Clone)]
pub struct ElasticsearchConfig {
    pub url: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub verify_certs: bool,
    pub timeout_seconds: u64,
}

impl Default for ElasticsearchConfig {
    fn default() -> Self {
        Self {
            url: "https://localhost:9200".to_string(),
            username: None,
            password: None,
            verify_certs: true,
            timeout_seconds: 30,
        }
    }
}

/// `DocumentStore` backed by an Elasticsearch cluster.
pub struct ElasticsearchStore {
    config: ElasticsearchConfig,
    base_url: Url,
    http_client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct CountResponse {
    count: u64,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    hits: SearchHits,
}

#[derive(Debug, Deserialize)]
struct SearchHits {
    #[serde(default)]
    hits: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    #[serde(rename = "_id")]
    id: String,
    #[serde(rename = "_source", default)]
    source: Fields,
}

#[derive(Debug, Deserialize)]
struct GetResponse {
    #[serde(default)]
    found: bool,
    #[serde(rename = "_source", default)]
    source: Fields,
}

impl ElasticsearchStore {
    /// Build a client for the configured cluster.
    pub fn new(config: ElasticsearchConfig) -> Result<Self> {
        let base_url = Url::parse(&config.url)
            .with_context(|| format!("Invalid Elasticsearch URL: {}", config.url))?;

        if base_url.cannot_be_a_base() {
            anyhow::bail!("Elasticsearch URL cannot be used as a base: {}", config.url);
        }

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .danger_accept_invalid_certs(!config.verify_certs)
            .build()
            .context("Failed to create HTTP client")?;

        debug!("Elasticsearch client targeting {}", base_url);

        Ok(Self {
            config,
            base_url,
            http_client,
        })
    }

    /// Build a URL from path segments, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty();
            for segment in segments {
                path.push(segment);
            }
        }
        url
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self.http_client.request(method, url);
        match &self.config.username {
            Some(username) => builder.basic_auth(username, self.config.password.as_deref()),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder) -> StoreResult<Response> {
        builder.send().await.map_err(|e| {
            if e.is_timeout() {
                StoreError::Unavailable(format!(
                    "request timed out after {}s",
                    self.config.timeout_seconds
                ))
            } else if e.is_connect() {
                StoreError::Unavailable(format!(
                    "cannot connect to Elasticsearch at {}",
                    self.config.url
                ))
            } else {
                StoreError::Unavailable(format!("failed to send request: {}", e))
            }
        })
    }

    async fn api_error(response: Response) -> StoreError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        StoreError::Api { status, body }
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> StoreResult<T> {
        response
            .json()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))
    }

    /// Send a write and map 404 to `NotFound`.
    async fn write(&self, builder: RequestBuilder, index: &str, id: &str) -> StoreResult<()> {
        let response = self.send(builder).await?;
        match response.status() {
            status if status.is_success() => Ok(()),
            StatusCode::NOT_FOUND => Err(StoreError::not_found(index, id)),
            _ => Err(Self::api_error(response).await),
        }
    }
}

#[async_trait]
impl DocumentStore for ElasticsearchStore {
    async fn list_indices(&self, pattern: &str) -> StoreResult<BTreeSet<String>> {
        let mut url = self.endpoint(&[pattern]);
        url.query_pairs_mut()
            .append_pair("expand_wildcards", "open")
            .append_pair("allow_no_indices", "true");

        debug!("Listing indices matching {}", pattern);
        let response = self.send(self.request(Method::GET, url)).await?;

        match response.status() {
            status if status.is_success() => {
                let indices: serde_json::Map<String, Value> = Self::decode(response).await?;
                Ok(indices.into_iter().map(|(name, _)| name).collect())
            }
            StatusCode::NOT_FOUND => Ok(BTreeSet::new()),
            _ => Err(Self::api_error(response).await),
        }
    }

    async fn count(&self, index: &str) -> StoreResult<u64> {
        let url = self.endpoint(&[index, "_count"]);
        let response = self.send(self.request(Method::GET, url)).await?;

        match response.status() {
            status if status.is_success() => {
                let count: CountResponse = Self::decode(response).await?;
                Ok(count.count)
            }
            StatusCode::NOT_FOUND => Err(StoreError::IndexNotFound(index.to_string())),
            _ => Err(Self::api_error(response).await),
        }
    }

    async fn search(&self, index: &str, limit: u64) -> StoreResult<Vec<Document>> {
        let url = self.endpoint(&[index, "_search"]);
        let size = page_size(limit);
        if size < limit {
            warn!(
                "{} holds {} documents; reading only the first {}",
                index, limit, size
            );
        }
        let body = json!({
            "size": size,
            "query": { "match_all": {} },
        });

        let response = self
            .send(self.request(Method::POST, url).json(&body))
            .await?;

        match response.status() {
            status if status.is_success() => {
                let search: SearchResponse = Self::decode(response).await?;
                Ok(search
                    .hits
                    .hits
                    .into_iter()
                    .map(|hit| Document::new(hit.id, hit.source))
                    .collect())
            }
            StatusCode::NOT_FOUND => Err(StoreError::IndexNotFound(index.to_string())),
            _ => Err(Self::api_error(response).await),
        }
    }

    async fn get_document(&self, index: &str, id: &str) -> StoreResult<Fields> {
        let url = self.endpoint(&[index, "_doc", id]);
        let response = self.send(self.request(Method::GET, url)).await?;

        match response.status() {
            status if status.is_success() => {
                let doc: GetResponse = Self::decode(response).await?;
                if doc.found {
                    Ok(doc.source)
                } else {
                    Err(StoreError::not_found(index, id))
                }
            }
            StatusCode::NOT_FOUND => Err(StoreError::not_found(index, id)),
            _ => Err(Self::api_error(response).await),
        }
    }

    async fn update_document(&self, index: &str, id: &str, fields: Fields) -> StoreResult<()> {
        let mut url = self.endpoint(&[index, "_update", id]);
        url.query_pairs_mut().append_pair("refresh", "wait_for");

        let body = json!({ "doc": fields });
        self.write(self.request(Method::POST, url).json(&body), index, id)
            .await
    }

    async fn index_document(&self, index: &str, id: &str, fields: Fields) -> StoreResult<()> {
        let mut url = self.endpoint(&[index, "_doc", id]);
        url.query_pairs_mut().append_pair("refresh", "wait_for");

        self.write(self.request(Method::PUT, url).json(&fields), index, id)
            .await
    }

    async fn delete_document(&self, index: &str, id: &str) -> StoreResult<()> {
        let mut url = self.endpoint(&[index, "_doc", id]);
        url.query_pairs_mut().append_pair("refresh", "wait_for");

        self.write(self.request(Method::DELETE, url), index, id)
            .await
    }
}

/// Search page size: a single page capped at the result window.
fn page_size(limit: u64) -> u64 {
    limit.min(MAX_RESULT_WINDOW)
}
