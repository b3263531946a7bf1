//! ilb-redirect-operator library crate
//!
//! Adds an HTTP to HTTPS redirect next to GKE internal Ingress load
//! balancers. This module exports the controller, the Compute Engine client
//! and the redirect resource adapters.

pub mod cloud;
pub mod config;
pub mod controller;
pub mod health;
pub mod resources;

pub use config::{Config, LogFormat};
pub use health::HealthState;

use std::sync::Arc;

use futures::{Stream, StreamExt};
use k8s_openapi::api::networking::v1::Ingress;
use kube::runtime::watcher::Config as WatcherConfig;
use kube::runtime::{Controller, WatchStreamExt, reflector, watcher};
use kube::{Api, Client, Resource};
use serde::de::DeserializeOwned;
use tracing::{debug, error, info};

use controller::{Context, error_policy, reconcile};

/// Create namespaced or cluster-wide API based on scope
pub fn scoped_api<T>(client: Client, namespace: Option<&str>) -> Api<T>
where
    T: Resource<Scope = k8s_openapi::NamespaceResourceScope>,
    <T as Resource>::DynamicType: Default,
    T: Clone + DeserializeOwned + std::fmt::Debug,
{
    match namespace {
        Some(ns) => Api::namespaced(client, ns),
        None => Api::all(client),
    }
}

fn default_watcher_config() -> WatcherConfig {
    WatcherConfig::default().any_semantic()
}

/// Create a reflector-backed stream of applied objects with default backoff.
///
/// No generation predicate is applied: the load balancer address is written
/// to the Ingress status, and that change has to trigger a pass.
fn create_stream<K>(
    api: Api<K>,
    watcher_config: WatcherConfig,
) -> (
    reflector::Store<K>,
    impl Stream<Item = Result<K, watcher::Error>>,
)
where
    K: Resource + Clone + DeserializeOwned + std::fmt::Debug + Send + 'static,
    K::DynamicType: Default + Eq + std::hash::Hash + Clone,
{
    let (reader, writer) = reflector::store();
    let stream = reflector(writer, watcher(api, watcher_config))
        .default_backoff()
        .applied_objects();
    (reader, stream)
}

/// Run the Ingress controller.
///
/// When `namespace` is `Some(ns)`, only watches Ingresses in that namespace;
/// otherwise watches cluster-wide.
pub async fn run_controller(ctx: Arc<Context>, namespace: Option<&str>) {
    let scope_msg = namespace.unwrap_or("cluster-wide");
    info!(
        project = %ctx.scope.project,
        region = %ctx.scope.region,
        "Starting controller for Ingress resources (scope: {})",
        scope_msg
    );

    if let Some(ref state) = ctx.health_state {
        state.set_ready(true).await;
    }

    let ingresses: Api<Ingress> = scoped_api(ctx.client.clone(), namespace);
    let (reader, stream) = create_stream(ingresses, default_watcher_config());

    Controller::for_stream(stream, reader)
        .run(reconcile, error_policy, ctx)
        .for_each(|result| async move {
            match result {
                Ok((obj, _action)) => {
                    debug!("Reconciled: {}", obj.name);
                }
                Err(e) => {
                    // Watch events for an Ingress that was just deleted
                    // still trigger a pass; those are expected.
                    let is_not_found = match &e {
                        kube::runtime::controller::Error::ObjectNotFound(_) => true,
                        kube::runtime::controller::Error::ReconcilerFailed(err, _) => {
                            err.is_not_found()
                        }
                        _ => false,
                    };
                    if is_not_found {
                        debug!("Object no longer exists (likely deleted): {:?}", e);
                    } else {
                        error!("Reconciliation error: {:?}", e);
                    }
                }
            }
        })
        .await;

    error!("Controller stream ended unexpectedly");
}
