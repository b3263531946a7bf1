//! Error types for the controller.
//!
//! Defines custom error types with classification for retry behavior.

use std::time::Duration;
use thiserror::Error;

use crate::cloud::CloudError;
use crate::resources::{Operation, ResourceKind};

/// Error type for controller operations
#[derive(Error, Debug)]
pub enum Error {
    /// Kubernetes API error
    #[error("Kubernetes API error: {0}")]
    Kube(#[from] kube::Error),

    /// The Ingress is annotated inconsistently; needs a change to the object
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A cloud call failed with something other than not-found or not-ready
    #[error("Failed to {operation} {resource} {name}: {source}")]
    Cloud {
        operation: Operation,
        resource: ResourceKind,
        name: String,
        #[source]
        source: CloudError,
    },

    /// The Ingress changed between read and finalizer update
    #[error("Update conflict: {0}")]
    UpdateConflict(String),
}

impl Error {
    /// Wrap a cloud error with the call it came from
    pub fn cloud(
        operation: Operation,
        resource: ResourceKind,
        name: impl Into<String>,
        source: CloudError,
    ) -> Self {
        Error::Cloud {
            operation,
            resource,
            name: name.into(),
            source,
        }
    }

    /// Check if this error indicates a not-found condition
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::Kube(kube::Error::Api(e)) if e.code == 404)
    }

    /// Check if this error indicates a conflicting write
    pub fn is_conflict(&self) -> bool {
        matches!(self, Error::UpdateConflict(_))
            || matches!(self, Error::Kube(kube::Error::Api(e)) if e.code == 409)
    }

    /// Check if this error should be retried
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Kube(e) => {
                // Retry on network errors, rate limiting, and server errors
                matches!(
                    e,
                    kube::Error::Api(api_err) if api_err.code >= 500 || api_err.code == 429
                ) || matches!(e, kube::Error::Service(_))
            }
            Error::Cloud { source, .. } => match source {
                CloudError::Api { status, .. } => *status >= 500 || *status == 429,
                CloudError::Transport(_) | CloudError::Metadata(_) => true,
                CloudError::Decode(_) | CloudError::MissingAddress(_) => false,
            },
            Error::UpdateConflict(_) => true,
            Error::Configuration(_) => false,
        }
    }

    /// Get the recommended requeue duration for this error
    pub fn requeue_after(&self) -> Duration {
        if self.is_conflict() {
            // Start over from fresh state
            Duration::from_secs(1)
        } else if self.is_retryable() {
            Duration::from_secs(30)
        } else {
            Duration::from_secs(300)
        }
    }
}

/// Result type alias for controller operations
pub type Result<T> = std::result::Result<T, Error>;
