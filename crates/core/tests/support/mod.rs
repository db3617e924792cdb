//! Shared test helpers for `clusterwatch-core` integration tests.
//!
//! In-memory stand-ins for the store's ports so tests can focus on store
//! behaviour instead of HTTP plumbing.

pub mod sources;
