//! What the reconciler reads from an Ingress.

use k8s_openapi::api::networking::v1::Ingress;
use kube::ResourceExt;

/// Opt-in annotation; only its presence matters.
pub const REDIRECT_ANNOTATION: &str = "networking.gke.io/ilb-https-redirect";

/// Named regional static IP used by GKE's ingress controller. Required so the
/// redirect forwarding rule can share the Ingress address.
pub const STATIC_IP_ANNOTATION: &str = "kubernetes.io/ingress.regional-static-ip-name";

/// Finalizer guarding cleanup of the redirect resources
pub const FINALIZER: &str = "networking.gke.io/ilb-redirect";

/// Fields of an Ingress relevant to the redirect, extracted once per pass.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IngressObservation {
    pub name: String,
    pub namespace: String,
    /// Gating annotation present
    pub redirect_enabled: bool,
    /// Companion static IP annotation present
    pub has_static_ip: bool,
    pub deletion_pending: bool,
    pub has_finalizer: bool,
    /// At least one routing rule
    pub has_rules: bool,
    /// Host of the first rule, if there is a rule with a non-empty host
    pub hostname: Option<String>,
    /// First assigned load balancer IP, if any
    pub address: Option<String>,
}

impl IngressObservation {
    pub fn from_ingress(ingress: &Ingress) -> Self {
        let annotations = ingress.annotations();

        let rules = ingress
            .spec
            .as_ref()
            .and_then(|spec| spec.rules.as_deref())
            .unwrap_or_default();
        let hostname = rules
            .first()
            .and_then(|rule| rule.host.clone())
            .filter(|host| !host.is_empty());

        let address = ingress
            .status
            .as_ref()
            .and_then(|status| status.load_balancer.as_ref())
            .and_then(|lb| lb.ingress.as_ref())
            .and_then(|entries| entries.first())
            .and_then(|entry| entry.ip.clone())
            .filter(|ip| !ip.is_empty());

        Self {
            name: ingress.name_any(),
            namespace: ingress.namespace().unwrap_or_else(|| "default".to_string()),
            redirect_enabled: annotations.contains_key(REDIRECT_ANNOTATION),
            has_static_ip: annotations.contains_key(STATIC_IP_ANNOTATION),
            deletion_pending: ingress.metadata.deletion_timestamp.is_some(),
            has_finalizer: ingress.finalizers().iter().any(|f| f == FINALIZER),
            has_rules: !rules.is_empty(),
            hostname,
            address,
        }
    }
}
