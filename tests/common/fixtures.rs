//! Test fixtures and builder patterns for Ingress objects.

#![allow(clippy::needless_update)]

use std::collections::BTreeMap;

use k8s_openapi::api::networking::v1::{
    Ingress, IngressLoadBalancerIngress, IngressLoadBalancerStatus, IngressRule, IngressSpec,
    IngressStatus,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, Time};

use ilb_redirect_operator::controller::{FINALIZER, REDIRECT_ANNOTATION, STATIC_IP_ANNOTATION};
use ilb_redirect_operator::resources::{ResourceDescriptor, Scope, generated_name};

pub const PROJECT: &str = "acme-prod";
pub const REGION: &str = "europe-west1";
pub const NETWORK: &str = "default";

/// Scope every fixture provisions into.
pub fn test_scope() -> Scope {
    Scope::new(PROJECT, REGION, NETWORK)
}

/// Descriptor the reconciler builds for `namespace/name`.
pub fn descriptor_for(namespace: &str, name: &str, hostname: &str) -> ResourceDescriptor {
    ResourceDescriptor::new(generated_name(namespace, name), test_scope(), hostname)
}

/// Builder for creating Ingress test fixtures.
///
/// # Example
/// ```
/// let ingress = IngressBuilder::new("web")
///     .redirect()
///     .static_ip("web-ip")
///     .host("example.com")
///     .address("10.0.0.5")
///     .build();
/// ```
#[derive(Clone, Debug)]
pub struct IngressBuilder {
    name: String,
    namespace: String,
    annotations: BTreeMap<String, String>,
    finalizers: Vec<String>,
    host: Option<String>,
    address: Option<String>,
    deleting: bool,
    resource_version: Option<String>,
}

impl IngressBuilder {
    /// Create a new builder with the given Ingress name in `default`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: "default".to_string(),
            annotations: BTreeMap::new(),
            finalizers: Vec::new(),
            host: None,
            address: None,
            deleting: false,
            resource_version: Some("1".to_string()),
        }
    }

    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Add the redirect opt-in annotation.
    pub fn redirect(mut self) -> Self {
        self.annotations
            .insert(REDIRECT_ANNOTATION.to_string(), "true".to_string());
        self
    }

    /// Add the regional static IP annotation.
    pub fn static_ip(mut self, name: impl Into<String>) -> Self {
        self.annotations
            .insert(STATIC_IP_ANNOTATION.to_string(), name.into());
        self
    }

    pub fn annotation(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.annotations.insert(key.into(), value.into());
        self
    }

    /// Host of the first (only) rule.
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// First load balancer address in the status.
    pub fn address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    /// Add the operator's finalizer.
    pub fn with_finalizer(mut self) -> Self {
        self.finalizers.push(FINALIZER.to_string());
        self
    }

    pub fn finalizer(mut self, finalizer: impl Into<String>) -> Self {
        self.finalizers.push(finalizer.into());
        self
    }

    /// Mark the Ingress as pending deletion.
    pub fn deleting(mut self) -> Self {
        self.deleting = true;
        self
    }

    pub fn resource_version(mut self, version: impl Into<String>) -> Self {
        self.resource_version = Some(version.into());
        self
    }

    /// Build the Ingress.
    pub fn build(self) -> Ingress {
        Ingress {
            metadata: ObjectMeta {
                name: Some(self.name),
                namespace: Some(self.namespace),
                annotations: if self.annotations.is_empty() {
                    None
                } else {
                    Some(self.annotations)
                },
                finalizers: if self.finalizers.is_empty() {
                    None
                } else {
                    Some(self.finalizers)
                },
                deletion_timestamp: self.deleting.then(|| Time(jiff::Timestamp::now())),
                resource_version: self.resource_version,
                ..Default::default()
            },
            spec: Some(IngressSpec {
                rules: self.host.map(|host| {
                    vec![IngressRule {
                        host: Some(host),
                        ..Default::default()
                    }]
                }),
                ..Default::default()
            }),
            status: self.address.map(|ip| IngressStatus {
                load_balancer: Some(IngressLoadBalancerStatus {
                    ingress: Some(vec![IngressLoadBalancerIngress {
                        ip: Some(ip),
                        ..Default::default()
                    }]),
                    ..Default::default()
                }),
                ..Default::default()
            }),
        }
    }
}

impl Default for IngressBuilder {
    fn default() -> Self {
        Self::new("web")
    }
}

/// Annotated Ingress with a host, no address and no finalizer yet.
pub fn opted_in(name: &str) -> IngressBuilder {
    IngressBuilder::new(name)
        .redirect()
        .static_ip(format!("{name}-ip"))
        .host("example.com")
}

/// Annotated Ingress with an address and the finalizer registered.
pub fn ready(name: &str) -> IngressBuilder {
    opted_in(name).address("10.0.0.5").with_finalizer()
}
