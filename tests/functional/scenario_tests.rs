//! Reconciler scenarios over an Ingress lifecycle.

use std::time::Duration;

use ilb_redirect_operator::cloud::CloudError;
use ilb_redirect_operator::controller::{Error, FINALIZER, RedirectState};
use ilb_redirect_operator::resources::{Operation, ResourceKind, generated_name};
use kube::runtime::controller::Action;

use crate::common::{Call, Harness, IngressBuilder, NAMESPACE, descriptor_for, opted_in, ready};

const RETRY: Duration = Duration::from_secs(3);

fn creates() -> Vec<Call> {
    ResourceKind::CHAIN
        .into_iter()
        .map(|kind| Call::new(Operation::Create, kind))
        .collect()
}

fn deletes() -> Vec<Call> {
    ResourceKind::CHAIN
        .into_iter()
        .rev()
        .map(|kind| Call::new(Operation::Delete, kind))
        .collect()
}

// ============================================================================
// Ignored Ingresses
// ============================================================================

#[tokio::test]
async fn test_missing_ingress_is_gone() {
    let harness = Harness::new();
    let outcome = harness.pass("web").await.unwrap();
    assert_eq!(outcome.state, RedirectState::Gone);
    assert_eq!(outcome.action(), Action::await_change());
    assert!(harness.compute.calls().is_empty());
}

#[tokio::test]
async fn test_unannotated_ingress_is_ignored() {
    let harness = Harness::with(
        IngressBuilder::new("web")
            .host("example.com")
            .address("10.0.0.5")
            .build(),
    );

    let outcome = harness.pass("web").await.unwrap();
    assert_eq!(outcome.state, RedirectState::Ignored);
    assert!(harness.compute.calls().is_empty());
    assert_eq!(harness.store.finalizer_writes(), 0);
}

#[tokio::test]
async fn test_missing_static_ip_is_configuration_error() {
    let harness = Harness::with(
        IngressBuilder::new("web")
            .redirect()
            .host("example.com")
            .address("10.0.0.5")
            .build(),
    );

    let err = harness.pass("web").await.unwrap_err();
    assert!(matches!(err, Error::Configuration(_)));
    assert!(!err.is_retryable());
    assert!(harness.compute.calls().is_empty());
    assert_eq!(harness.store.finalizer_writes(), 0);
}

#[tokio::test]
async fn test_ingress_without_rules_is_ignored() {
    let harness = Harness::with(
        IngressBuilder::new("web")
            .redirect()
            .static_ip("web-ip")
            .address("10.0.0.5")
            .build(),
    );

    let outcome = harness.pass("web").await.unwrap();
    assert_eq!(outcome.state, RedirectState::Ignored);
    assert!(harness.compute.calls().is_empty());
    assert!(harness.finalizers("web").is_empty());
}

#[tokio::test]
async fn test_empty_host_is_ignored() {
    let harness = Harness::with(opted_in("web").host("").address("10.0.0.5").build());

    let outcome = harness.pass("web").await.unwrap();
    assert_eq!(outcome.state, RedirectState::Ignored);
    assert!(harness.compute.calls().is_empty());
}

// ============================================================================
// Provisioning
// ============================================================================

/// Annotated Ingress without an address: finalizer added, nothing created.
#[tokio::test]
async fn test_awaiting_address_adds_finalizer_only() {
    let harness = Harness::with(opted_in("web").build());

    let outcome = harness.pass("web").await.unwrap();
    assert_eq!(outcome.state, RedirectState::AwaitingAddress);
    assert_eq!(outcome.action(), Action::await_change());
    assert!(harness.compute.calls().is_empty());
    assert_eq!(harness.finalizers("web"), vec![FINALIZER.to_string()]);
    assert_eq!(harness.store.finalizer_adds(), 1);
}

/// Address assigned, nothing exists yet: the chain is created in order.
#[tokio::test]
async fn test_address_creates_chain_in_order() {
    let harness = Harness::with(ready("web").build());

    let outcome = harness.pass("web").await.unwrap();
    assert_eq!(outcome.state, RedirectState::Steady);
    assert_eq!(outcome.action(), Action::await_change());
    assert_eq!(harness.compute.mutations(), creates());
    assert_eq!(harness.store.finalizer_writes(), 0);

    let descriptor = descriptor_for(NAMESPACE, "web", "example.com");
    assert_eq!(harness.compute.existing(&descriptor), ResourceKind::CHAIN.to_vec());
}

#[tokio::test]
async fn test_finalizer_and_chain_in_one_pass() {
    let harness = Harness::with(opted_in("web").address("10.0.0.5").build());

    let outcome = harness.pass("web").await.unwrap();
    assert_eq!(outcome.state, RedirectState::Steady);
    assert_eq!(harness.finalizers("web"), vec![FINALIZER.to_string()]);
    assert_eq!(harness.compute.mutations(), creates());
}

#[tokio::test]
async fn test_created_resources_carry_ingress_values() {
    let harness = Harness::with(ready("web").host("shop.example.com").address("10.1.2.3").build());
    harness.pass("web").await.unwrap();

    let descriptor = descriptor_for(NAMESPACE, "web", "shop.example.com");
    let url_map = harness.compute.body(&descriptor, ResourceKind::UrlMap).unwrap();
    assert_eq!(
        url_map["pathMatchers"][0]["defaultUrlRedirect"]["hostRedirect"],
        "shop.example.com"
    );
    let rule = harness
        .compute
        .body(&descriptor, ResourceKind::ForwardingRule)
        .unwrap();
    assert_eq!(rule["IPAddress"], "10.1.2.3");
    assert_eq!(rule["portRange"], "80");
}

#[tokio::test]
async fn test_steady_pass_is_read_only() {
    let harness = Harness::with(ready("web").build());
    harness.pass("web").await.unwrap();
    harness.compute.clear_calls();

    let outcome = harness.pass("web").await.unwrap();
    assert_eq!(outcome.state, RedirectState::Steady);
    assert!(harness.compute.mutations().is_empty());
    assert_eq!(harness.compute.calls().len(), 4);
    assert_eq!(harness.compute.resource_count(), 4);
}

/// A not-ready dependency requeues without touching the finalizer.
#[tokio::test]
async fn test_create_not_ready_requeues() {
    let harness = Harness::with(ready("web").build());
    harness.compute.fail(
        Operation::Create,
        ResourceKind::TargetHttpProxy,
        || CloudError::not_ready("url map is not ready"),
        1,
    );

    let outcome = harness.pass("web").await.unwrap();
    assert_eq!(outcome.state, RedirectState::Provisioning);
    assert_eq!(outcome.requeue_after, Some(RETRY));
    assert_eq!(outcome.action(), Action::requeue(RETRY));
    assert_eq!(harness.store.finalizer_writes(), 0);

    let descriptor = descriptor_for(NAMESPACE, "web", "example.com");
    assert_eq!(
        harness.compute.existing(&descriptor),
        vec![ResourceKind::BackendService, ResourceKind::UrlMap]
    );
    assert!(
        !harness
            .compute
            .calls()
            .iter()
            .any(|call| call.kind == ResourceKind::ForwardingRule)
    );

    // The retry picks up where the last pass stopped
    harness.compute.clear_calls();
    let outcome = harness.pass("web").await.unwrap();
    assert_eq!(outcome.state, RedirectState::Steady);
    assert_eq!(
        harness.compute.mutations(),
        vec![
            Call::new(Operation::Create, ResourceKind::TargetHttpProxy),
            Call::new(Operation::Create, ResourceKind::ForwardingRule),
        ]
    );
}

#[tokio::test]
async fn test_get_not_ready_requeues_before_create() {
    let harness = Harness::with(ready("web").build());
    harness.compute.fail(
        Operation::Get,
        ResourceKind::BackendService,
        || CloudError::not_ready("backend service is being updated"),
        1,
    );

    let outcome = harness.pass("web").await.unwrap();
    assert_eq!(outcome.state, RedirectState::Provisioning);
    assert_eq!(outcome.requeue_after, Some(RETRY));
    assert!(harness.compute.mutations().is_empty());
}

#[tokio::test]
async fn test_retry_delay_is_configurable() {
    let harness = Harness::with_retry_delay(Duration::from_secs(10));
    harness.store.put(ready("web").build());
    harness.compute.fail_always(Operation::Create, ResourceKind::UrlMap, || {
        CloudError::not_ready("backend service is not ready")
    });

    let outcome = harness.pass("web").await.unwrap();
    assert_eq!(outcome.requeue_after, Some(Duration::from_secs(10)));
}

#[tokio::test]
async fn test_provider_error_is_wrapped() {
    let harness = Harness::with(ready("web").build());
    harness.compute.fail(
        Operation::Create,
        ResourceKind::UrlMap,
        || CloudError::api(403, "forbidden", "Required 'compute.urlMaps.create' permission"),
        1,
    );

    let err = harness.pass("web").await.unwrap_err();
    match &err {
        Error::Cloud {
            operation,
            resource,
            name,
            ..
        } => {
            assert_eq!(*operation, Operation::Create);
            assert_eq!(*resource, ResourceKind::UrlMap);
            assert_eq!(name, &generated_name(NAMESPACE, "web"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(err.to_string().contains("url-map"));
    assert!(!err.is_retryable());

    let descriptor = descriptor_for(NAMESPACE, "web", "example.com");
    assert_eq!(
        harness.compute.existing(&descriptor),
        vec![ResourceKind::BackendService]
    );
}

#[tokio::test]
async fn test_finalizer_conflict_fails_pass_before_cloud_calls() {
    let harness = Harness::with(opted_in("web").address("10.0.0.5").build());
    harness.store.conflict_next(1);

    let err = harness.pass("web").await.unwrap_err();
    assert!(matches!(err, Error::UpdateConflict(_)));
    assert!(err.is_conflict());
    assert_eq!(err.requeue_after(), Duration::from_secs(1));
    assert!(harness.compute.calls().is_empty());
    assert!(harness.finalizers("web").is_empty());

    // Next pass starts from fresh state
    let outcome = harness.pass("web").await.unwrap();
    assert_eq!(outcome.state, RedirectState::Steady);
    assert_eq!(harness.finalizers("web"), vec![FINALIZER.to_string()]);
}

// ============================================================================
// Deprovisioning
// ============================================================================

/// Deletion with all four resources present: reverse order, then finalizer.
#[tokio::test]
async fn test_deletion_removes_chain_in_reverse() {
    let harness = Harness::with(ready("web").deleting().build());
    let descriptor = descriptor_for(NAMESPACE, "web", "example.com").with_address("10.0.0.5");
    harness.compute.seed(&descriptor, &ResourceKind::CHAIN);

    let outcome = harness.pass("web").await.unwrap();
    assert_eq!(outcome.state, RedirectState::Gone);
    assert_eq!(harness.compute.calls(), deletes());
    assert_eq!(harness.compute.resource_count(), 0);
    assert_eq!(harness.store.finalizer_removes(), 1);
    // The last finalizer is gone, so the Ingress finished deleting
    assert!(harness.store.current(NAMESPACE, "web").is_none());
}

/// A rule that lost its host after provisioning still lets the Ingress
/// finish deleting.
#[tokio::test]
async fn test_deletion_after_host_removed_releases_finalizer() {
    let harness = Harness::with(ready("web").build());
    assert_eq!(harness.pass("web").await.unwrap().state, RedirectState::Steady);

    harness.store.update(NAMESPACE, "web", |ingress| {
        for rule in ingress.spec.iter_mut().flat_map(|spec| spec.rules.iter_mut().flatten()) {
            rule.host = None;
        }
    });
    // Without a host the live Ingress is left alone
    assert_eq!(harness.pass("web").await.unwrap().state, RedirectState::Ignored);
    assert_eq!(harness.compute.resource_count(), 4);

    harness.store.request_deletion(NAMESPACE, "web");
    harness.compute.clear_calls();
    let outcome = harness.pass("web").await.unwrap();
    assert_eq!(outcome.state, RedirectState::Gone);
    assert_eq!(harness.compute.calls(), deletes());
    assert_eq!(harness.compute.resource_count(), 0);
    assert!(harness.store.current(NAMESPACE, "web").is_none());
}

/// Url-map delete not ready: requeue, finalizer untouched.
#[tokio::test]
async fn test_deletion_not_ready_keeps_finalizer() {
    let harness = Harness::with(ready("web").deleting().build());
    let descriptor = descriptor_for(NAMESPACE, "web", "example.com").with_address("10.0.0.5");
    harness.compute.seed(&descriptor, &ResourceKind::CHAIN);
    harness.compute.fail(
        Operation::Delete,
        ResourceKind::UrlMap,
        || CloudError::not_ready("target proxy is still being deleted"),
        1,
    );

    let outcome = harness.pass("web").await.unwrap();
    assert_eq!(outcome.state, RedirectState::Deprovisioning);
    assert_eq!(outcome.action(), Action::requeue(RETRY));
    assert_eq!(
        harness.compute.calls(),
        vec![
            Call::new(Operation::Delete, ResourceKind::ForwardingRule),
            Call::new(Operation::Delete, ResourceKind::TargetHttpProxy),
            Call::new(Operation::Delete, ResourceKind::UrlMap),
        ]
    );
    assert_eq!(
        harness.compute.existing(&descriptor),
        vec![ResourceKind::BackendService, ResourceKind::UrlMap]
    );
    assert_eq!(harness.finalizers("web"), vec![FINALIZER.to_string()]);
    assert_eq!(harness.store.finalizer_writes(), 0);

    let outcome = harness.pass("web").await.unwrap();
    assert_eq!(outcome.state, RedirectState::Gone);
    assert_eq!(harness.compute.resource_count(), 0);
}

#[tokio::test]
async fn test_deletion_with_nothing_created_releases_finalizer() {
    let harness = Harness::with(opted_in("web").with_finalizer().deleting().build());

    let outcome = harness.pass("web").await.unwrap();
    assert_eq!(outcome.state, RedirectState::Gone);
    assert_eq!(harness.compute.calls(), deletes());
    assert_eq!(harness.store.finalizer_removes(), 1);
}

#[tokio::test]
async fn test_deletion_keeps_foreign_finalizers() {
    let harness = Harness::with(
        ready("web")
            .finalizer("example.com/other")
            .deleting()
            .build(),
    );

    let outcome = harness.pass("web").await.unwrap();
    assert_eq!(outcome.state, RedirectState::Gone);
    assert_eq!(harness.finalizers("web"), vec!["example.com/other".to_string()]);
}

#[tokio::test]
async fn test_deletion_provider_error_keeps_finalizer() {
    let harness = Harness::with(ready("web").deleting().build());
    harness.compute.fail(
        Operation::Delete,
        ResourceKind::ForwardingRule,
        || CloudError::api(503, "backendError", "try again"),
        1,
    );

    let err = harness.pass("web").await.unwrap_err();
    assert!(err.is_retryable());
    assert_eq!(harness.finalizers("web"), vec![FINALIZER.to_string()]);
}

// ============================================================================
// Full lifecycle
// ============================================================================

#[tokio::test]
async fn test_full_lifecycle() {
    let harness = Harness::with(opted_in("web").namespace(NAMESPACE).build());
    let descriptor = descriptor_for(NAMESPACE, "web", "example.com");

    // Created: opt-in registered, no address yet
    assert_eq!(
        harness.pass("web").await.unwrap().state,
        RedirectState::AwaitingAddress
    );
    // Repeated delivery changes nothing
    assert_eq!(
        harness.pass("web").await.unwrap().state,
        RedirectState::AwaitingAddress
    );
    assert_eq!(harness.store.finalizer_adds(), 1);
    assert!(harness.compute.calls().is_empty());

    // Load balancer comes up
    harness.store.assign_address(NAMESPACE, "web", "10.0.0.5");
    assert_eq!(harness.pass("web").await.unwrap().state, RedirectState::Steady);
    assert_eq!(harness.compute.existing(&descriptor), ResourceKind::CHAIN.to_vec());

    // Deleted
    harness.store.request_deletion(NAMESPACE, "web");
    harness.compute.clear_calls();
    assert_eq!(harness.pass("web").await.unwrap().state, RedirectState::Gone);
    assert_eq!(harness.compute.mutations(), deletes());
    assert!(harness.store.current(NAMESPACE, "web").is_none());

    // Late event for the deleted Ingress
    assert_eq!(harness.pass("web").await.unwrap().state, RedirectState::Gone);
    assert_eq!(harness.compute.resource_count(), 0);
}

#[tokio::test]
async fn test_ingresses_get_separate_chains() {
    let harness = Harness::new();
    harness.store.put(ready("web").build());
    harness.store.put(ready("api").host("api.example.com").build());

    harness.pass("web").await.unwrap();
    harness.pass("api").await.unwrap();
    assert_eq!(harness.compute.resource_count(), 8);

    harness.store.request_deletion(NAMESPACE, "web");
    harness.pass("web").await.unwrap();

    let api = descriptor_for(NAMESPACE, "api", "api.example.com");
    assert_eq!(harness.compute.existing(&api), ResourceKind::CHAIN.to_vec());
    assert_eq!(harness.compute.resource_count(), 4);
}
