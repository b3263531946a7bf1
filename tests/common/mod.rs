//! Shared test fixtures and in-memory fakes (used by unit, functional, and proptest).

#![allow(dead_code)]

pub mod fixtures;

pub use fakes::*;
pub use fixtures::*;
pub use harness::*;
