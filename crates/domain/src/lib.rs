//! # ClusterWatch Domain
//!
//! Domain types and models for ClusterWatch.
//!
//! This crate contains:
//! - Typed cluster metrics (counter, gauge, meter, timer, histogram)
//! - Wire shapes of the cluster-metrics REST endpoints
//! - Store events broadcast to subscribers
//! - Configuration structures
//! - Domain error types and Result definitions
//!
//! ## Architecture
//! - No dependencies on other ClusterWatch crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod config;
pub mod constants;
pub mod errors;
pub mod macros;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
