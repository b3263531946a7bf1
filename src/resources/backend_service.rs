//! Regional backend service.
//!
//! The redirect URL map never forwards traffic, but Compute Engine requires a
//! default service, so an empty internal-managed HTTP backend service is
//! created first.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::cloud::{CloudError, ComputeApi};
use crate::resources::{
    CloudResource, ResourceDescriptor, ResourceKind, collection_path, ignore_not_found,
    resource_path,
};

/// Backend service adapter.
pub struct BackendService {
    api: Arc<dyn ComputeApi>,
}

impl BackendService {
    const KIND: ResourceKind = ResourceKind::BackendService;

    pub fn new(api: Arc<dyn ComputeApi>) -> Self {
        Self { api }
    }

    /// Insert request body
    pub fn payload(descriptor: &ResourceDescriptor) -> Value {
        json!({
            "name": descriptor.generated_name(),
            "loadBalancingScheme": "INTERNAL_MANAGED",
            "protocol": "HTTP",
        })
    }
}

#[async_trait]
impl CloudResource for BackendService {
    fn kind(&self) -> ResourceKind {
        Self::KIND
    }

    async fn get(&self, descriptor: &ResourceDescriptor) -> Result<Value, CloudError> {
        let path = resource_path(descriptor.scope(), Self::KIND, descriptor.generated_name());
        self.api.get(&path).await
    }

    async fn create(&self, descriptor: &ResourceDescriptor) -> Result<(), CloudError> {
        let collection = collection_path(descriptor.scope(), Self::KIND);
        self.api
            .insert(&collection, &Self::payload(descriptor))
            .await
            .map(|_| ())
    }

    async fn delete(&self, descriptor: &ResourceDescriptor) -> Result<(), CloudError> {
        let path = resource_path(descriptor.scope(), Self::KIND, descriptor.generated_name());
        ignore_not_found(self.api.delete(&path).await)
    }
}
