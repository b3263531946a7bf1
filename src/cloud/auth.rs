//! Access token sources for the Compute API.

use std::time::{Duration, Instant};

use tokio::sync::RwLock;
use tracing::debug;

use crate::cloud::error::CloudError;
use crate::cloud::metadata::MetadataClient;

/// Tokens are refreshed this long before they expire.
const REFRESH_MARGIN: Duration = Duration::from_secs(60);

/// Token cached from the metadata server.
#[derive(Clone, Debug)]
pub struct CachedToken {
    value: String,
    expires_at: Instant,
}

impl CachedToken {
    fn is_fresh(&self, now: Instant) -> bool {
        now + REFRESH_MARGIN < self.expires_at
    }
}

/// Source of bearer tokens for API requests.
#[derive(Debug)]
pub enum TokenProvider {
    /// A fixed token, e.g. from `gcloud auth print-access-token`.
    Static(String),
    /// Service account token from the metadata server, cached until close to expiry.
    Metadata {
        client: MetadataClient,
        cached: RwLock<Option<CachedToken>>,
    },
}

impl TokenProvider {
    /// Use a fixed token for every request
    pub fn fixed(token: impl Into<String>) -> Self {
        TokenProvider::Static(token.into())
    }

    /// Fetch tokens from the metadata server
    pub fn metadata(client: MetadataClient) -> Self {
        TokenProvider::Metadata {
            client,
            cached: RwLock::new(None),
        }
    }

    /// Current bearer token, refreshing it if needed
    pub async fn token(&self) -> Result<String, CloudError> {
        match self {
            TokenProvider::Static(token) => Ok(token.clone()),
            TokenProvider::Metadata { client, cached } => {
                let now = Instant::now();
                if let Some(token) = cached.read().await.as_ref().filter(|t| t.is_fresh(now)) {
                    return Ok(token.value.clone());
                }

                let mut slot = cached.write().await;
                // Another task may have refreshed while we waited for the lock
                if let Some(token) = slot.as_ref().filter(|t| t.is_fresh(now)) {
                    return Ok(token.value.clone());
                }

                let issued = client.access_token().await?;
                debug!(expires_in = issued.expires_in, "Refreshed access token");
                let token = CachedToken {
                    value: issued.access_token,
                    expires_at: now + Duration::from_secs(issued.expires_in),
                };
                let value = token.value.clone();
                *slot = Some(token);
                Ok(value)
            }
        }
    }
}
