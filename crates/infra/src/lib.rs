//! # ClusterWatch Infrastructure
//!
//! Infrastructure implementations of the core metrics ports.
//!
//! This crate contains:
//! - HTTP client with retries (`http`)
//! - REST client, session store and node lookup for the log-management
//!   server (`api`)
//! - `MetricsSource` adapter over the cluster metrics endpoints (`metrics`)
//! - Interval poller driving the metrics store (`scheduling`)
//! - Configuration loading from env or file (`config`)
//!
//! ## Architecture
//! - Implements traits defined in `clusterwatch-core`
//! - Contains all "impure" code (network, filesystem, timers)

pub mod api;
pub mod config;
pub mod errors;
pub mod http;
pub mod metrics;
pub mod scheduling;

// Re-export commonly used items
pub use api::{ApiClient, ApiClientConfig, ApiError, ClusterNodesClient, SessionStore};
pub use errors::InfraError;
pub use http::HttpClient;
pub use metrics::HttpMetricsSource;
pub use scheduling::{MetricsPoller, MetricsPollerConfig, PollerStats, SchedulerError};
