//! Ensure/remove sequencing over the redirect chain.
//!
//! Resources are created in chain order and deleted in reverse, stopping at
//! the first step that did not succeed. Only two provider conditions are
//! interpreted here: not-found and not-ready. Everything else is wrapped with
//! the operation, resource type and name, and returned as `Outcome::Fatal`.

use tracing::{debug, info};

use crate::controller::error::Error;
use crate::resources::{CloudResource, Operation, ResourceDescriptor};

/// Result of ensuring or removing one resource, or a whole chain.
#[derive(Debug)]
#[must_use]
pub enum Outcome {
    /// The desired state holds.
    Success,
    /// The desired state is valid but not achievable yet; retry after a delay.
    RetryLater,
    /// Anything else.
    Fatal(Error),
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success)
    }
}

/// Create the resource if it does not exist.
///
/// An existing resource is left as is, even if it differs from the
/// desired shape.
pub async fn ensure(descriptor: &ResourceDescriptor, resource: &dyn CloudResource) -> Outcome {
    let kind = resource.kind();
    let name = descriptor.generated_name();

    match resource.get(descriptor).await {
        Ok(_) => {
            debug!(generated_name = %name, resource = %kind, "Resource exists");
            Outcome::Success
        }
        Err(e) if e.is_not_found() => {
            info!(generated_name = %name, resource = %kind, "Creating resource");
            match resource.create(descriptor).await {
                Ok(()) => Outcome::Success,
                Err(e) if e.is_not_ready() => {
                    debug!(generated_name = %name, resource = %kind, error = %e, "Dependency not ready");
                    Outcome::RetryLater
                }
                Err(e) => Outcome::Fatal(Error::cloud(Operation::Create, kind, name, e)),
            }
        }
        Err(e) if e.is_not_ready() => {
            debug!(generated_name = %name, resource = %kind, error = %e, "Resource not ready");
            Outcome::RetryLater
        }
        Err(e) => Outcome::Fatal(Error::cloud(Operation::Get, kind, name, e)),
    }
}

/// Delete the resource if it exists.
pub async fn remove(descriptor: &ResourceDescriptor, resource: &dyn CloudResource) -> Outcome {
    let kind = resource.kind();
    let name = descriptor.generated_name();

    info!(generated_name = %name, resource = %kind, "Deleting resource");
    match resource.delete(descriptor).await {
        Ok(()) => Outcome::Success,
        Err(e) if e.is_not_found() => Outcome::Success,
        Err(e) if e.is_not_ready() => {
            debug!(generated_name = %name, resource = %kind, error = %e, "Resource not ready for deletion");
            Outcome::RetryLater
        }
        Err(e) => Outcome::Fatal(Error::cloud(Operation::Delete, kind, name, e)),
    }
}

/// Ensure every resource of `chain`, in order.
pub async fn ensure_all(descriptor: &ResourceDescriptor, chain: &[Box<dyn CloudResource>]) -> Outcome {
    for resource in chain {
        match ensure(descriptor, resource.as_ref()).await {
            Outcome::Success => continue,
            other => return other,
        }
    }
    Outcome::Success
}

/// Remove every resource of `chain`, in reverse order.
pub async fn remove_all(descriptor: &ResourceDescriptor, chain: &[Box<dyn CloudResource>]) -> Outcome {
    for resource in chain.iter().rev() {
        match remove(descriptor, resource.as_ref()).await {
            Outcome::Success => continue,
            other => return other,
        }
    }
    Outcome::Success
}
