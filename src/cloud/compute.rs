//! Compute Engine REST client.
//!
//! The controller only needs three verbs on regional resources, all
//! addressed by a path relative to the API endpoint:
//!
//! - `GET    /compute/v1/projects/{p}/regions/{r}/{collection}/{name}`
//! - `POST   /compute/v1/projects/{p}/regions/{r}/{collection}`
//! - `DELETE /compute/v1/projects/{p}/regions/{r}/{collection}/{name}`
//!
//! Insert and delete return a long-running operation which is not awaited.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use serde_json::Value;
use tracing::{debug, instrument};

use crate::cloud::auth::TokenProvider;
use crate::cloud::error::CloudError;

/// Default Compute API endpoint
pub const COMPUTE_ENDPOINT: &str = "https://compute.googleapis.com";

/// Minimal Compute API surface used by the resource adapters.
#[async_trait]
pub trait ComputeApi: Send + Sync {
    /// Fetch the resource at `path`.
    async fn get(&self, path: &str) -> Result<Value, CloudError>;

    /// Insert `body` into the collection at `collection_path`.
    async fn insert(&self, collection_path: &str, body: &Value) -> Result<Value, CloudError>;

    /// Delete the resource at `path`.
    async fn delete(&self, path: &str) -> Result<Value, CloudError>;
}

/// `reqwest` based Compute API client.
#[derive(Clone, Debug)]
pub struct ComputeClient {
    http: reqwest::Client,
    endpoint: String,
    tokens: Arc<TokenProvider>,
}

impl ComputeClient {
    /// Create a client for `endpoint` authenticating with `tokens`
    pub fn new(endpoint: impl Into<String>, tokens: TokenProvider) -> Result<Self, CloudError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            http,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            tokens: Arc::new(tokens),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.endpoint, path)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<Value, CloudError> {
        let token = self.tokens.token().await?;
        let response = request
            .header(ACCEPT, "application/json")
            .bearer_auth(token)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(CloudError::from_response(status.as_u16(), &body));
        }
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl ComputeApi for ComputeClient {
    #[instrument(skip(self))]
    async fn get(&self, path: &str) -> Result<Value, CloudError> {
        let value = self.send(self.http.get(self.url(path))).await?;
        debug!(self_link = ?value.get("selfLink"), "Fetched resource");
        Ok(value)
    }

    #[instrument(skip(self, body))]
    async fn insert(&self, collection_path: &str, body: &Value) -> Result<Value, CloudError> {
        let operation = self
            .send(self.http.post(self.url(collection_path)).json(body))
            .await?;
        debug!(operation = ?operation.get("name"), "Insert accepted");
        Ok(operation)
    }

    #[instrument(skip(self))]
    async fn delete(&self, path: &str) -> Result<Value, CloudError> {
        let operation = self.send(self.http.delete(self.url(path))).await?;
        debug!(operation = ?operation.get("name"), "Delete accepted");
        Ok(operation)
    }
}
