//! Ingress reconciler.
//!
//! One pass reads the Ingress by identity, decides what to do through
//! [`plan`], and drives the orchestrator over the redirect chain. The
//! finalizer is added before anything is provisioned and released only once
//! every resource of the chain is confirmed gone.

use std::sync::Arc;
use std::time::{Duration, Instant};

use k8s_openapi::api::networking::v1::Ingress;
use kube::ResourceExt;
use kube::runtime::controller::Action;
use tracing::{debug, error, info, instrument, warn};

use crate::controller::context::Context;
use crate::controller::error::Error;
use crate::controller::ingress::{FINALIZER, IngressObservation};
use crate::controller::orchestrator::{Outcome, ensure_all, remove_all};
use crate::controller::state::{Plan, RedirectState, plan};
use crate::controller::store::IngressStore;
use crate::resources::{CloudResource, ResourceDescriptor, Scope, generated_name};

/// Result of a successful pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileOutcome {
    pub state: RedirectState,
    /// Set when the pass hit a not-ready dependency
    pub requeue_after: Option<Duration>,
}

impl ReconcileOutcome {
    pub fn done(state: RedirectState) -> Self {
        Self {
            state,
            requeue_after: None,
        }
    }

    pub fn requeue(state: RedirectState, after: Duration) -> Self {
        Self {
            state,
            requeue_after: Some(after),
        }
    }

    /// Controller action for this outcome.
    pub fn action(&self) -> Action {
        match self.requeue_after {
            Some(after) => Action::requeue(after),
            None => Action::await_change(),
        }
    }
}

/// Drives the redirect chain for Ingresses read from `S`.
pub struct IngressReconciler<S> {
    store: S,
    scope: Scope,
    retry_delay: Duration,
}

impl<S: IngressStore> IngressReconciler<S> {
    pub fn new(store: S, scope: Scope, retry_delay: Duration) -> Self {
        Self {
            store,
            scope,
            retry_delay,
        }
    }

    /// Reconcile the Ingress `namespace/name` against `chain`.
    #[instrument(skip(self, chain), fields(namespace = %namespace, name = %name))]
    pub async fn reconcile(
        &self,
        namespace: &str,
        name: &str,
        chain: &[Box<dyn CloudResource>],
    ) -> Result<ReconcileOutcome, Error> {
        info!("Reconciling");

        let Some(ingress) = self.store.get(namespace, name).await? else {
            debug!("Ingress no longer exists");
            return Ok(ReconcileOutcome::done(RedirectState::Gone));
        };
        let observed = IngressObservation::from_ingress(&ingress);

        let outcome = match plan(&observed)? {
            Plan::Ignore => ReconcileOutcome::done(RedirectState::Ignored),
            Plan::Deprovision => {
                let hostname = observed.hostname.clone().unwrap_or_default();
                let descriptor = self.descriptor(&observed, hostname);
                self.deprovision(&ingress, &descriptor, chain).await?
            }
            Plan::Provision {
                hostname,
                add_finalizer,
                address,
            } => {
                if add_finalizer {
                    info!(finalizer = FINALIZER, "Adding finalizer");
                    self.store.add_finalizer(&ingress, FINALIZER).await?;
                }
                match address {
                    None => {
                        info!("Load balancer address not assigned yet");
                        ReconcileOutcome::done(RedirectState::AwaitingAddress)
                    }
                    Some(address) => {
                        let descriptor = self.descriptor(&observed, hostname).with_address(address);
                        self.provision(&descriptor, chain).await?
                    }
                }
            }
        };

        if let Some(after) = outcome.requeue_after {
            info!(state = %outcome.state, "Waiting {}s for dependencies", after.as_secs());
        }
        info!(state = %outcome.state, "Done reconciling");
        Ok(outcome)
    }

    fn descriptor(&self, observed: &IngressObservation, hostname: String) -> ResourceDescriptor {
        ResourceDescriptor::new(
            generated_name(&observed.namespace, &observed.name),
            self.scope.clone(),
            hostname,
        )
    }

    async fn provision(
        &self,
        descriptor: &ResourceDescriptor,
        chain: &[Box<dyn CloudResource>],
    ) -> Result<ReconcileOutcome, Error> {
        match ensure_all(descriptor, chain).await {
            Outcome::Success => Ok(ReconcileOutcome::done(RedirectState::Steady)),
            Outcome::RetryLater => Ok(ReconcileOutcome::requeue(
                RedirectState::Provisioning,
                self.retry_delay,
            )),
            Outcome::Fatal(e) => Err(e),
        }
    }

    async fn deprovision(
        &self,
        ingress: &Ingress,
        descriptor: &ResourceDescriptor,
        chain: &[Box<dyn CloudResource>],
    ) -> Result<ReconcileOutcome, Error> {
        match remove_all(descriptor, chain).await {
            Outcome::Success => {
                info!(finalizer = FINALIZER, "Removing finalizer");
                self.store.remove_finalizer(ingress, FINALIZER).await?;
                Ok(ReconcileOutcome::done(RedirectState::Gone))
            }
            Outcome::RetryLater => Ok(ReconcileOutcome::requeue(
                RedirectState::Deprovisioning,
                self.retry_delay,
            )),
            Outcome::Fatal(e) => Err(e),
        }
    }
}

/// Controller entry point for one Ingress.
pub async fn reconcile(obj: Arc<Ingress>, ctx: Arc<Context>) -> Result<Action, Error> {
    let start_time = Instant::now();
    let name = obj.name_any();
    let namespace = obj.namespace().unwrap_or_else(|| "default".to_string());

    let reconciler =
        IngressReconciler::new(ctx.ingress_store(), ctx.scope.clone(), ctx.retry_delay);
    let chain = ctx.chain();
    let outcome = reconciler.reconcile(&namespace, &name, &chain).await?;

    if let Some(ref health_state) = ctx.health_state {
        let duration = start_time.elapsed().as_secs_f64();
        health_state
            .metrics
            .record_reconcile(&namespace, &name, duration);
        health_state.metrics.record_outcome(outcome.state);
        health_state.touch();
    }

    Ok(outcome.action())
}

/// Error policy for the controller
pub fn error_policy(obj: Arc<Ingress>, error: &Error, ctx: Arc<Context>) -> Action {
    let name = obj.name_any();
    let namespace = obj.namespace().unwrap_or_else(|| "default".to_string());

    if let Some(ref health_state) = ctx.health_state {
        health_state.metrics.record_error(&namespace, &name);
    }

    if error.is_not_found() {
        debug!(name = %name, namespace = %namespace, "Ingress not found (likely deleted)");
        return Action::await_change();
    }

    if error.is_retryable() {
        warn!(name = %name, namespace = %namespace, error = %error, "Retryable error, will retry");
    } else {
        error!(name = %name, namespace = %namespace, error = %error, "Non-retryable error");
    }
    Action::requeue(error.requeue_after())
}
