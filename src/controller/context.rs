//! Shared context for the controller.
//!
//! The Context struct holds shared state that is passed to the reconciler:
//! the Kubernetes client, the Compute API client, and the cloud scope
//! resolved at startup.

use std::sync::Arc;
use std::time::Duration;

use kube::Client;

use crate::cloud::ComputeApi;
use crate::controller::store::KubeIngressStore;
use crate::health::HealthState;
use crate::resources::{CloudResource, Scope, redirect_chain};

/// Field manager name for the operator
pub const FIELD_MANAGER: &str = "ilb-redirect-operator";

/// Default delay before retrying a not-ready resource
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(3);

/// Shared context for the controller
#[derive(Clone)]
pub struct Context {
    /// Kubernetes client
    pub client: Client,
    /// Compute API used by the redirect chain
    pub compute: Arc<dyn ComputeApi>,
    /// Project, region and network to provision into
    pub scope: Scope,
    /// Delay before retrying after a not-ready response
    pub retry_delay: Duration,
    /// Optional health state for metrics and readiness
    pub health_state: Option<Arc<HealthState>>,
}

impl Context {
    /// Create a new context
    pub fn new(
        client: Client,
        compute: Arc<dyn ComputeApi>,
        scope: Scope,
        retry_delay: Duration,
        health_state: Option<Arc<HealthState>>,
    ) -> Self {
        Self {
            client,
            compute,
            scope,
            retry_delay,
            health_state,
        }
    }

    /// Ingress access for the reconciler
    pub fn ingress_store(&self) -> KubeIngressStore {
        KubeIngressStore::new(self.client.clone())
    }

    /// Fresh redirect chain for one pass
    pub fn chain(&self) -> Vec<Box<dyn CloudResource>> {
        redirect_chain(self.compute.clone())
    }
}
