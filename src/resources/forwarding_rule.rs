//! Regional forwarding rule binding port 80 of the Ingress address.
//!
//! The address is shared with the Ingress' own HTTPS forwarding rule, which
//! is why the Ingress must use a named regional static IP.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::cloud::{CloudError, ComputeApi};
use crate::resources::{
    CloudResource, ResourceDescriptor, ResourceKind, collection_path, ignore_not_found,
    resource_path,
};

/// Only plain HTTP is redirected.
const HTTP_PORT_RANGE: &str = "80";

/// Forwarding rule adapter.
pub struct ForwardingRule {
    api: Arc<dyn ComputeApi>,
}

impl ForwardingRule {
    const KIND: ResourceKind = ResourceKind::ForwardingRule;

    pub fn new(api: Arc<dyn ComputeApi>) -> Self {
        Self { api }
    }

    /// Insert request body. Fails when the descriptor carries no address.
    pub fn payload(descriptor: &ResourceDescriptor) -> Result<Value, CloudError> {
        let address = descriptor
            .address()
            .ok_or_else(|| CloudError::MissingAddress(descriptor.generated_name().to_string()))?;
        let scope = descriptor.scope();

        Ok(json!({
            "name": descriptor.generated_name(),
            "loadBalancingScheme": "INTERNAL_MANAGED",
            "target": resource_path(scope, ResourceKind::TargetHttpProxy, descriptor.generated_name()),
            "network": format!(
                "https://www.googleapis.com/compute/v1/projects/{}/global/networks/{}",
                scope.project, scope.network
            ),
            "IPAddress": address,
            "IPProtocol": "TCP",
            "portRange": HTTP_PORT_RANGE,
        }))
    }
}

#[async_trait]
impl CloudResource for ForwardingRule {
    fn kind(&self) -> ResourceKind {
        Self::KIND
    }

    async fn get(&self, descriptor: &ResourceDescriptor) -> Result<Value, CloudError> {
        let path = resource_path(descriptor.scope(), Self::KIND, descriptor.generated_name());
        self.api.get(&path).await
    }

    async fn create(&self, descriptor: &ResourceDescriptor) -> Result<(), CloudError> {
        let payload = Self::payload(descriptor)?;
        let collection = collection_path(descriptor.scope(), Self::KIND);
        self.api.insert(&collection, &payload).await.map(|_| ())
    }

    async fn delete(&self, descriptor: &ResourceDescriptor) -> Result<(), CloudError> {
        let path = resource_path(descriptor.scope(), Self::KIND, descriptor.generated_name());
        ignore_not_found(self.api.delete(&path).await)
    }
}
