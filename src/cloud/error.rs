//! Error types for Google Cloud API calls.
//!
//! The controller only interprets two provider conditions: "not found" and
//! "not ready". Everything else is surfaced unchanged.

use serde::Deserialize;
use thiserror::Error;

/// Reason reported by Compute Engine when a referenced resource exists but
/// cannot be used yet (typically still being created).
pub const REASON_RESOURCE_NOT_READY: &str = "resourceNotReady";

/// Reason reported by Compute Engine for a missing resource.
pub const REASON_NOT_FOUND: &str = "notFound";

/// Errors returned by the cloud layer.
#[derive(Error, Debug)]
pub enum CloudError {
    /// The API answered with a non-success status.
    #[error("Google API error (status {status}): {message}")]
    Api {
        status: u16,
        reasons: Vec<String>,
        message: String,
    },

    /// The request never produced an API response.
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The API response could not be decoded.
    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// The GCE metadata server did not provide a required value.
    #[error("Metadata server error: {0}")]
    Metadata(String),

    /// A forwarding rule was requested before the load balancer had an address.
    #[error("No load balancer address known for {0}")]
    MissingAddress(String),
}

impl CloudError {
    /// Build an API error from its parts.
    pub fn api(status: u16, reason: &str, message: impl Into<String>) -> Self {
        CloudError::Api {
            status,
            reasons: vec![reason.to_string()],
            message: message.into(),
        }
    }

    /// A 404 API error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::api(404, REASON_NOT_FOUND, message)
    }

    /// A 400 API error carrying the `resourceNotReady` reason.
    pub fn not_ready(message: impl Into<String>) -> Self {
        Self::api(400, REASON_RESOURCE_NOT_READY, message)
    }

    /// Decode a non-success response body.
    ///
    /// Bodies that are not the standard Google error envelope still produce
    /// an `Api` error with the raw text as message.
    pub fn from_response(status: u16, body: &str) -> Self {
        match serde_json::from_str::<ErrorEnvelope>(body) {
            Ok(envelope) => CloudError::Api {
                status,
                reasons: envelope
                    .error
                    .errors
                    .into_iter()
                    .filter_map(|item| item.reason)
                    .collect(),
                message: envelope.error.message,
            },
            Err(_) => CloudError::Api {
                status,
                reasons: Vec::new(),
                message: body.trim().to_string(),
            },
        }
    }

    /// Check if this error means the resource does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, CloudError::Api { status, .. } if *status == 404)
    }

    /// Check if this error means the operation must be retried later
    pub fn is_not_ready(&self) -> bool {
        matches!(
            self,
            CloudError::Api { reasons, .. } if reasons.iter().any(|r| r == REASON_RESOURCE_NOT_READY)
        )
    }
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    errors: Vec<ErrorItem>,
}

#[derive(Deserialize)]
struct ErrorItem {
    reason: Option<String>,
}
