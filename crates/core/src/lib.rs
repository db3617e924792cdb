//! # ClusterWatch Core
//!
//! Pure business logic layer - no infrastructure dependencies.
//!
//! This crate contains:
//! - The metrics subscription store (registration tables, request
//!   coalescing, snapshot, broadcast)
//! - Port/adapter interfaces (traits) for the collaborators it calls
//!
//! ## Architecture Principles
//! - Only depends on `clusterwatch-domain`
//! - No HTTP or platform code
//! - All external dependencies via traits
//! - Pure, testable business logic

pub mod metrics;

// Re-export specific items to avoid ambiguity
pub use metrics::ports::{MetricsSource, NodeDirectory, SessionProvider};
pub use metrics::{InMemoryNodeDirectory, MetricsStore, MetricsStoreBuilder, Registrations};
