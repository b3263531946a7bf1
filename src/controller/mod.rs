//! Controller module for ilb-redirect-operator.
//!
//! Contains the Ingress reconciler, the chain orchestrator, the lifecycle
//! state decision and error handling.

pub mod context;
pub mod error;
pub mod ingress;
pub mod ingress_reconciler;
pub mod orchestrator;
pub mod state;
pub mod store;

pub use context::Context;
pub use error::{Error, Result};
pub use ingress::{FINALIZER, IngressObservation, REDIRECT_ANNOTATION, STATIC_IP_ANNOTATION};
pub use ingress_reconciler::{IngressReconciler, ReconcileOutcome, error_policy, reconcile};
pub use orchestrator::{Outcome, ensure, ensure_all, remove, remove_all};
pub use state::{Plan, RedirectState, plan};
pub use store::{IngressStore, KubeIngressStore};
