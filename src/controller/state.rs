//! Redirect lifecycle states and the decision of what a pass should do.
//!
//! States are never stored; they are derived from the observed Ingress on
//! every pass:
//!
//! ```text
//!                 annotated, has host
//!   Ignored ─────────────────────────────► AwaitingAddress ──(address)──► Provisioning ──► Steady
//!                                                                             │  ▲
//!                                                                   NotReady  └──┘
//!   any ──(deletion pending)──► Deprovisioning ──(all removed)──► Gone
//! ```

use std::fmt;

use crate::controller::error::Error;
use crate::controller::ingress::{IngressObservation, STATIC_IP_ANNOTATION};

/// State of the redirect for one Ingress after a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RedirectState {
    /// Not opted in, or nothing to redirect to
    Ignored,
    /// Opted in but the load balancer has no address yet
    AwaitingAddress,
    /// Chain partially created; waiting on a dependency
    Provisioning,
    /// All four resources exist
    Steady,
    /// Deletion pending; chain partially removed
    Deprovisioning,
    /// Ingress deleted, or all resources removed and finalizer released
    Gone,
}

impl fmt::Display for RedirectState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RedirectState::Ignored => write!(f, "Ignored"),
            RedirectState::AwaitingAddress => write!(f, "AwaitingAddress"),
            RedirectState::Provisioning => write!(f, "Provisioning"),
            RedirectState::Steady => write!(f, "Steady"),
            RedirectState::Deprovisioning => write!(f, "Deprovisioning"),
            RedirectState::Gone => write!(f, "Gone"),
        }
    }
}

/// What a pass has to do for an observed Ingress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Plan {
    /// Leave the Ingress alone
    Ignore,
    /// Remove the chain, then release the finalizer
    Deprovision,
    /// Register the finalizer if needed, then create the chain once an
    /// address is known
    Provision {
        hostname: String,
        add_finalizer: bool,
        address: Option<String>,
    },
}

/// Decide what to do for an observed Ingress.
///
/// Errors only on inconsistent annotations, which no retry can fix.
pub fn plan(observed: &IngressObservation) -> Result<Plan, Error> {
    if !observed.redirect_enabled {
        return Ok(Plan::Ignore);
    }
    if !observed.has_static_ip {
        return Err(Error::Configuration(format!(
            "a shared static IP is needed to create the https redirect forwarding rule for {}/{}, missing annotation: {}",
            observed.namespace, observed.name, STATIC_IP_ANNOTATION
        )));
    }
    if !observed.has_rules {
        return Ok(Plan::Ignore);
    }
    // Deletion never needs the host, so a rule that lost it still cleans up
    if observed.deletion_pending {
        return Ok(Plan::Deprovision);
    }
    let Some(hostname) = observed.hostname.clone() else {
        return Ok(Plan::Ignore);
    };

    Ok(Plan::Provision {
        hostname,
        add_finalizer: !observed.has_finalizer,
        address: observed.address.clone(),
    })
}
