//! Regional target HTTP proxy in front of the redirect URL map.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::cloud::{CloudError, ComputeApi};
use crate::resources::{
    CloudResource, ResourceDescriptor, ResourceKind, collection_path, ignore_not_found,
    resource_path,
};

/// Target HTTP proxy adapter.
pub struct TargetHttpProxy {
    api: Arc<dyn ComputeApi>,
}

impl TargetHttpProxy {
    const KIND: ResourceKind = ResourceKind::TargetHttpProxy;

    pub fn new(api: Arc<dyn ComputeApi>) -> Self {
        Self { api }
    }

    /// Insert request body
    pub fn payload(descriptor: &ResourceDescriptor) -> Value {
        json!({
            "name": descriptor.generated_name(),
            "urlMap": resource_path(
                descriptor.scope(),
                ResourceKind::UrlMap,
                descriptor.generated_name(),
            ),
        })
    }
}

#[async_trait]
impl CloudResource for TargetHttpProxy {
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
