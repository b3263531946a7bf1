//! Immutable description of one reconciliation pass.

use sha2::{Digest, Sha256};

/// Prefix of every generated resource name.
pub const NAME_PREFIX: &str = "ilb-redirect";

/// Compute Engine resource names are limited to 63 characters.
const MAX_NAME_LEN: usize = 63;

/// Number of hash hex characters appended to every name.
const HASH_SUFFIX_LEN: usize = 8;

/// Length of the readable part kept in front of the hash suffix.
const READABLE_LEN: usize = MAX_NAME_LEN - HASH_SUFFIX_LEN - 1;

/// Cloud scope the operator provisions into. Constant for the process lifetime.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Scope {
    pub project: String,
    pub region: String,
    /// VPC network the forwarding rule attaches to.
    pub network: String,
}

impl Scope {
    pub fn new(
        project: impl Into<String>,
        region: impl Into<String>,
        network: impl Into<String>,
    ) -> Self {
        Self {
            project: project.into(),
            region: region.into(),
            network: network.into(),
        }
    }
}

/// Everything needed to address and shape the redirect resources of one Ingress.
///
/// A descriptor is built from observed state at the start of each pass and
/// never changes afterwards; the fields are private and only readable.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResourceDescriptor {
    generated_name: String,
    scope: Scope,
    hostname: String,
    address: Option<String>,
}

impl ResourceDescriptor {
    /// Create a descriptor without a load balancer address
    pub fn new(generated_name: impl Into<String>, scope: Scope, hostname: impl Into<String>) -> Self {
        Self {
            generated_name: generated_name.into(),
            scope,
            hostname: hostname.into(),
            address: None,
        }
    }

    /// Set the load balancer address (construction only)
    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    pub fn generated_name(&self) -> &str {
        &self.generated_name
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    pub fn address(&self) -> Option<&str> {
        self.address.as_deref()
    }
}

/// Deterministic cloud resource name for an Ingress.
///
/// The readable part is `ilb-redirect-<namespace>-<name>`, sanitized and
/// shortened to fit the Compute Engine limit. It is always followed by a
/// hash of `namespace/name`: sanitizing and joining can map different
/// identities to the same text (`team-a/web` and `team/a-web`), the hash
/// cannot, since `/` never appears in a Kubernetes name.
pub fn generated_name(namespace: &str, name: &str) -> String {
    let readable: String = format!("{NAME_PREFIX}-{namespace}-{name}")
        .chars()
        .map(|c| {
            let c = c.to_ascii_lowercase();
            if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' {
                c
            } else {
                '-'
            }
        })
        .take(READABLE_LEN)
        .collect();

    let digest = Sha256::digest(format!("{namespace}/{name}").as_bytes());
    let hash: String = digest
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect::<String>()
        .chars()
        .take(HASH_SUFFIX_LEN)
        .collect();
    format!("{}-{}", readable.trim_end_matches('-'), hash)
}
