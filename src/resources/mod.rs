//! Cloud resources that make up the HTTP to HTTPS redirect.
//!
//! Every Ingress gets one chain of four regional Compute Engine resources,
//! each referencing the previous one by name:
//!
//! 1. `backend_service` - placeholder backend the URL map requires
//! 2. `url_map` - wildcard host rule redirecting to `https://<hostname>`
//! 3. `target_http_proxy` - points at the URL map
//! 4. `forwarding_rule` - binds port 80 of the Ingress address to the proxy
//!
//! Each type is exposed through the `CloudResource` trait so the orchestrator
//! never needs to know which concrete resource it is handling.

pub mod backend_service;
pub mod descriptor;
pub mod forwarding_rule;
pub mod target_http_proxy;
pub mod url_map;

pub use backend_service::BackendService;
pub use descriptor::{ResourceDescriptor, Scope, generated_name};
pub use forwarding_rule::ForwardingRule;
pub use target_http_proxy::TargetHttpProxy;
pub use url_map::UrlMap;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::cloud::{CloudError, ComputeApi};

/// The four resource types of the redirect chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResourceKind {
    BackendService,
    UrlMap,
    TargetHttpProxy,
    ForwardingRule,
}

impl ResourceKind {
    /// All kinds in creation order.
    pub const CHAIN: [ResourceKind; 4] = [
        ResourceKind::BackendService,
        ResourceKind::UrlMap,
        ResourceKind::TargetHttpProxy,
        ResourceKind::ForwardingRule,
    ];

    /// REST collection name of this kind
    pub fn collection(&self) -> &'static str {
        match self {
            ResourceKind::BackendService => "backendServices",
            ResourceKind::UrlMap => "urlMaps",
            ResourceKind::TargetHttpProxy => "targetHttpProxies",
            ResourceKind::ForwardingRule => "forwardingRules",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceKind::BackendService => write!(f, "backend-service"),
            ResourceKind::UrlMap => write!(f, "url-map"),
            ResourceKind::TargetHttpProxy => write!(f, "target-http-proxy"),
            ResourceKind::ForwardingRule => write!(f, "forwarding-rule"),
        }
    }
}

/// Operations a `CloudResource` supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Operation {
    Get,
    Create,
    Delete,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Get => write!(f, "get"),
            Operation::Create => write!(f, "create"),
            Operation::Delete => write!(f, "delete"),
        }
    }
}

/// Uniform capability set over one cloud resource type.
///
/// Implementations own only the provider request construction; they hold
/// no state across passes.
#[async_trait]
pub trait CloudResource: Send + Sync {
    /// Which resource of the chain this is.
    fn kind(&self) -> ResourceKind;

    /// Look up the resource by its generated name.
    ///
    /// Returns the provider's representation, or a `CloudError` that is
    /// `is_not_found()` when it does not exist.
    async fn get(&self, descriptor: &ResourceDescriptor) -> Result<Value, CloudError>;

    /// Create the resource, referencing the previous resource of the chain.
    async fn create(&self, descriptor: &ResourceDescriptor) -> Result<(), CloudError>;

    /// Delete the resource. A resource that is already gone is not an error.
    async fn delete(&self, descriptor: &ResourceDescriptor) -> Result<(), CloudError>;
}

/// Relative REST path of a regional collection
pub fn collection_path(scope: &Scope, kind: ResourceKind) -> String {
    format!(
        "/compute/v1/projects/{}/regions/{}/{}",
        scope.project,
        scope.region,
        kind.collection()
    )
}

/// Relative REST path of one named resource, also used for cross-references
pub fn resource_path(scope: &Scope, kind: ResourceKind, name: &str) -> String {
    format!("{}/{}", collection_path(scope, kind), name)
}

/// Map `NotFound` to success for delete calls.
fn ignore_not_found(result: Result<Value, CloudError>) -> Result<(), CloudError> {
    match result {
        Ok(_) => Ok(()),
        Err(e) if e.is_not_found() => Ok(()),
        Err(e) => Err(e),
    }
}

/// Build the redirect chain in creation order.
pub fn redirect_chain(api: Arc<dyn ComputeApi>) -> Vec<Box<dyn CloudResource>> {
    vec![
        Box::new(BackendService::new(api.clone())),
        Box::new(UrlMap::new(api.clone())),
        Box::new(TargetHttpProxy::new(api.clone())),
        Box::new(ForwardingRule::new(api)),
    ]
}
