//! Reads and finalizer writes on the owning Ingress.
//!
//! These are the only writes the operator makes to an Ingress. Both carry the
//! observed `resourceVersion`, so a concurrent change makes the write fail
//! with a conflict instead of silently overwriting it.

use std::sync::Arc;

use async_trait::async_trait;
use k8s_openapi::api::networking::v1::Ingress;
use kube::{
    Api, Client, ResourceExt,
    api::{Patch, PatchParams},
};
use tracing::debug;

use crate::controller::context::FIELD_MANAGER;
use crate::controller::error::Error;

/// Access to Ingress objects by identity.
#[async_trait]
pub trait IngressStore: Send + Sync {
    /// Current state of the Ingress, or `None` if it no longer exists.
    async fn get(&self, namespace: &str, name: &str) -> Result<Option<Ingress>, Error>;

    /// Add `finalizer` to `ingress`, returning the updated object.
    async fn add_finalizer(&self, ingress: &Ingress, finalizer: &str) -> Result<Ingress, Error>;

    /// Remove `finalizer` from `ingress`, returning the updated object.
    async fn remove_finalizer(&self, ingress: &Ingress, finalizer: &str) -> Result<Ingress, Error>;
}

/// `IngressStore` backed by the Kubernetes API.
#[derive(Clone)]
pub struct KubeIngressStore {
    client: Client,
}

impl KubeIngressStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn api(&self, namespace: &str) -> Api<Ingress> {
        Api::namespaced(self.client.clone(), namespace)
    }

    async fn patch_finalizers(
        &self,
        ingress: &Ingress,
        finalizers: Vec<String>,
    ) -> Result<Ingress, Error> {
        let name = ingress.name_any();
        let namespace = ingress.namespace().unwrap_or_else(|| "default".to_string());
        let patch = finalizer_patch(ingress.resource_version(), finalizers);

        debug!(name = %name, namespace = %namespace, "Patching finalizers");
        self.api(&namespace)
            .patch(
                &name,
                &PatchParams {
                    field_manager: Some(FIELD_MANAGER.to_string()),
                    ..Default::default()
                },
                &Patch::Merge(&patch),
            )
            .await
            .map_err(|e| match e {
                kube::Error::Api(ref api_err) if api_err.code == 409 => {
                    Error::UpdateConflict(format!("{namespace}/{name}: {}", api_err.message))
                }
                other => Error::Kube(other),
            })
    }
}

/// Merge patch replacing the finalizer list, guarded by `resource_version`.
fn finalizer_patch(resource_version: Option<String>, finalizers: Vec<String>) -> serde_json::Value {
    match resource_version {
        Some(rv) => serde_json::json!({
            "metadata": {
                "resourceVersion": rv,
                "finalizers": finalizers
            }
        }),
        None => serde_json::json!({
            "metadata": {
                "finalizers": finalizers
            }
        }),
    }
}

#[async_trait]
impl IngressStore for KubeIngressStore {
    async fn get(&self, namespace: &str, name: &str) -> Result<Option<Ingress>, Error> {
        Ok(self.api(namespace).get_opt(name).await?)
    }

    async fn add_finalizer(&self, ingress: &Ingress, finalizer: &str) -> Result<Ingress, Error> {
        let mut finalizers = ingress.finalizers().to_vec();

        // Only add if not already present
        if finalizers.iter().any(|f| f == finalizer) {
            return Ok(ingress.clone());
        }
        finalizers.push(finalizer.to_string());
        self.patch_finalizers(ingress, finalizers).await
    }

    async fn remove_finalizer(&self, ingress: &Ingress, finalizer: &str) -> Result<Ingress, Error> {
        let mut finalizers = ingress.finalizers().to_vec();

        // Only patch if the finalizer exists
        let Some(pos) = finalizers.iter().position(|f| f == finalizer) else {
            return Ok(ingress.clone());
        };
        finalizers.remove(pos);
        self.patch_finalizers(ingress, finalizers).await
    }
}

#[async_trait]
impl<T: IngressStore + ?Sized> IngressStore for Arc<T> {
    async fn get(&self, namespace: &str, name: &str) -> Result<Option<Ingress>, Error> {
        (**self).get(namespace, name).await
    }

    async fn add_finalizer(&self, ingress: &Ingress, finalizer: &str) -> Result<Ingress, Error> {
        (**self).add_finalizer(ingress, finalizer).await
    }

    async fn remove_finalizer(&self, ingress: &Ingress, finalizer: &str) -> Result<Ingress, Error> {
        (**self).remove_finalizer(ingress, finalizer).await
    }
}
