//! GCE metadata server client.
//!
//! Used at startup to discover the project and region the operator runs in,
//! and at runtime to obtain access tokens for the node's service account.

use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use crate::cloud::error::CloudError;

/// Default metadata server base URL
pub const METADATA_ENDPOINT: &str = "http://metadata.google.internal/computeMetadata/v1";

const METADATA_FLAVOR_HEADER: &str = "Metadata-Flavor";
const METADATA_FLAVOR: &str = "Google";

/// OAuth token issued by the metadata server.
#[derive(Clone, Debug, Deserialize)]
pub struct AccessToken {
    pub access_token: String,
    /// Lifetime in seconds from the time of issue.
    pub expires_in: u64,
    #[serde(default)]
    pub token_type: String,
}

/// Client for the GCE metadata server.
#[derive(Clone, Debug)]
pub struct MetadataClient {
    http: reqwest::Client,
    endpoint: String,
}

impl MetadataClient {
    /// Create a client for the given metadata base URL
    pub fn new(endpoint: impl Into<String>) -> Result<Self, CloudError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()?;
        Ok(Self {
            http,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
        })
    }

    async fn fetch(&self, path: &str) -> Result<reqwest::Response, CloudError> {
        let url = format!("{}/{}", self.endpoint, path);
        debug!(url = %url, "Querying metadata server");
        let response = self
            .http
            .get(&url)
            .header(METADATA_FLAVOR_HEADER, METADATA_FLAVOR)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CloudError::Metadata(format!(
                "{} returned {}: {}",
                path,
                status.as_u16(),
                body.trim()
            )));
        }
        Ok(response)
    }

    async fn fetch_text(&self, path: &str) -> Result<String, CloudError> {
        let text = self.fetch(path).await?.text().await?;
        Ok(text.trim().to_string())
    }

    /// Project ID of the running instance
    pub async fn project_id(&self) -> Result<String, CloudError> {
        let project = self.fetch_text("project/project-id").await?;
        if project.is_empty() {
            return Err(CloudError::Metadata("empty project id".to_string()));
        }
        Ok(project)
    }

    /// Zone of the running instance, e.g. `us-central1-a`.
    ///
    /// The metadata server answers with `projects/<number>/zones/<zone>`; only
    /// the last segment is returned.
    pub async fn zone(&self) -> Result<String, CloudError> {
        let zone = self.fetch_text("instance/zone").await?;
        zone.rsplit('/')
            .next()
            .filter(|z| !z.is_empty())
            .map(str::to_string)
            .ok_or_else(|| CloudError::Metadata(format!("malformed zone: {zone}")))
    }

    /// Region of the running instance, derived from its zone
    pub async fn region(&self) -> Result<String, CloudError> {
        let zone = self.zone().await?;
        region_from_zone(&zone)
            .ok_or_else(|| CloudError::Metadata(format!("cannot derive region from zone {zone}")))
    }

    /// Access token for the instance's default service account
    pub async fn access_token(&self) -> Result<AccessToken, CloudError> {
        let token: AccessToken = self
            .fetch("instance/service-accounts/default/token")
            .await?
            .json()
            .await?;
        Ok(token)
    }
}

/// Derive a region from a zone name (`us-central1-a` -> `us-central1`).
///
/// Only zones with exactly three dash-separated parts are accepted.
pub fn region_from_zone(zone: &str) -> Option<String> {
    let parts: Vec<&str> = zone.split('-').collect();
    match parts.as_slice() {
        [area, location, suffix]
            if !area.is_empty() && !location.is_empty() && !suffix.is_empty() =>
        {
            Some(format!("{area}-{location}"))
        }
        _ => None,
    }
}
