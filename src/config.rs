//! Operator configuration.
//!
//! Every option can be given as a flag or through its environment variable.
//! Project and region fall back to the GCE metadata server when unset.

use std::time::Duration;

use clap::{Parser, ValueEnum};
use tracing::info;

use crate::cloud::{COMPUTE_ENDPOINT, CloudError, METADATA_ENDPOINT, MetadataClient, TokenProvider};
use crate::resources::Scope;

/// Log output format
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    #[default]
    Json,
    Text,
}

#[derive(Clone, Debug, Parser)]
#[command(name = "ilb-redirect-operator", version, about)]
pub struct Config {
    /// GCP project owning the load balancer resources
    #[arg(long, env = "GCP_PROJECT")]
    pub project: Option<String>,

    /// GCP region of the internal load balancer
    #[arg(long, env = "GCP_REGION")]
    pub region: Option<String>,

    /// VPC network the forwarding rule attaches to
    #[arg(long, env = "GCP_NETWORK", default_value = "default")]
    pub network: String,

    /// Only watch Ingresses in this namespace
    #[arg(long, env = "WATCH_NAMESPACE")]
    pub namespace: Option<String>,

    /// Delay before retrying after a not-ready response
    #[arg(long, env = "RETRY_DELAY_SECS", default_value_t = 3)]
    pub retry_delay_secs: u64,

    /// Port of the health and metrics server
    #[arg(long, env = "HEALTH_PORT", default_value_t = 8080)]
    pub health_port: u16,

    /// Compute Engine API endpoint
    #[arg(long, env = "COMPUTE_ENDPOINT", default_value = COMPUTE_ENDPOINT)]
    pub compute_endpoint: String,

    /// GCE metadata server endpoint
    #[arg(long, env = "GCE_METADATA_ENDPOINT", default_value = METADATA_ENDPOINT)]
    pub metadata_endpoint: String,

    /// Static OAuth access token; the metadata server token is used when unset
    #[arg(long, env = "GCP_ACCESS_TOKEN", hide_env_values = true)]
    pub access_token: Option<String>,

    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Json)]
    pub log_format: LogFormat,

    /// Run leader election before starting the controller
    #[arg(
        long,
        env = "LEADER_ELECTION",
        default_value_t = true,
        action = clap::ArgAction::Set
    )]
    pub leader_election: bool,
}

impl Config {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }

    /// Resolve project and region, asking the metadata server for whatever
    /// was not configured.
    pub async fn resolve_scope(&self, metadata: &MetadataClient) -> Result<Scope, CloudError> {
        let project = match &self.project {
            Some(project) => project.clone(),
            None => {
                let project = metadata.project_id().await?;
                info!(project = %project, "Resolved project from metadata server");
                project
            }
        };
        let region = match &self.region {
            Some(region) => region.clone(),
            None => {
                let region = metadata.region().await?;
                info!(region = %region, "Resolved region from metadata server");
                region
            }
        };
        Ok(Scope::new(project, region, self.network.clone()))
    }

    /// Token source for Compute API calls
    pub fn token_provider(&self, metadata: MetadataClient) -> TokenProvider {
        match &self.access_token {
            Some(token) => TokenProvider::fixed(token.clone()),
            None => TokenProvider::metadata(metadata),
        }
    }
}
