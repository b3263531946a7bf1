//! Regional URL map that performs the redirect.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::cloud::{CloudError, ComputeApi};
use crate::resources::{
    CloudResource, ResourceDescriptor, ResourceKind, collection_path, ignore_not_found,
    resource_path,
};

/// Path matcher shared by the single host rule.
const PATH_MATCHER: &str = "all";

/// URL map adapter.
pub struct UrlMap {
    api: Arc<dyn ComputeApi>,
}

impl UrlMap {
    const KIND: ResourceKind = ResourceKind::UrlMap;

    pub fn new(api: Arc<dyn ComputeApi>) -> Self {
        Self { api }
    }

    /// Insert request body.
    ///
    /// Every host and path is answered with a permanent redirect to
    /// `https://<hostname>/`, keeping the query string.
    pub fn payload(descriptor: &ResourceDescriptor) -> Value {
        let default_service = resource_path(
            descriptor.scope(),
            ResourceKind::BackendService,
            descriptor.generated_name(),
        );
        json!({
            "name": descriptor.generated_name(),
            "defaultService": default_service,
            "hostRules": [{
                "hosts": ["*"],
                "pathMatcher": PATH_MATCHER,
            }],
            "pathMatchers": [{
                "name": PATH_MATCHER,
                "defaultUrlRedirect": {
                    "hostRedirect": descriptor.hostname(),
                    "pathRedirect": "/",
                    "redirectResponseCode": "PERMANENT_REDIRECT",
                    "httpsRedirect": true,
                    "stripQuery": false,
                },
            }],
        })
    }
}

#[async_trait]
impl CloudResource for UrlMap {
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
