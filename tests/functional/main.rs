// Test code is allowed to panic on failure
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic,
    clippy::string_slice
)]

//! Functional tests for the Ingress reconciler and the chain orchestrator.
//!
//! These tests drive the real reconciler and the real resource adapters
//! WITHOUT a Kubernetes cluster or a GCP project. The Kubernetes API and the
//! Compute API are replaced by in-memory fakes (see `tests/common`).
//!
//! ```bash
//! # Run all functional tests
//! cargo test --test functional
//!
//! # Run specific test
//! cargo test --test functional test_deletion_removes_chain_in_reverse
//! ```
//!
//! ## Test Categories
//!
//! - **Scenario tests**: reconciler passes over an Ingress lifecycle
//! - **Orchestrator tests**: ensure/remove over the real adapters

#[path = "../common/mod.rs"]
mod common;

mod scenario_tests;
