//! Google Cloud access for the operator.
//!
//! - `compute`: Compute Engine REST client behind the `ComputeApi` trait
//! - `auth`: bearer token sources
//! - `metadata`: GCE metadata server (project, region, tokens)
//! - `error`: error classification shared by all of the above

pub mod auth;
pub mod compute;
pub mod error;
pub mod metadata;

pub use auth::TokenProvider;
pub use compute::{COMPUTE_ENDPOINT, ComputeApi, ComputeClient};
pub use error::CloudError;
pub use metadata::{METADATA_ENDPOINT, MetadataClient};
