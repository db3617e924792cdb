//! Application constants
//!
//! Centralized location for all domain-level constants used throughout the
//! application.

// Metric names
pub const DEFAULT_METRICS_NAMESPACE: &str = "org";

// REST routes (relative to the API base URL)
pub const CLUSTER_METRICS_MULTIPLE_PATH: &str = "/cluster/metrics/multiple";
pub const CLUSTER_NODES_PATH: &str = "/system/cluster/nodes";

// Polling defaults
pub const DEFAULT_LIST_INTERVAL_SECS: u64 = 1;
pub const DEFAULT_NAMES_INTERVAL_SECS: u64 = 30;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_MAX_ATTEMPTS: usize = 3;

// Event broadcast
pub const EVENT_CHANNEL_CAPACITY: usize = 64;

// Headers
pub const REQUESTED_BY_HEADER: &str = "X-Requested-By";
pub const REQUESTED_BY_VALUE: &str = "cli";

/// Path of the per-node metric names listing for `namespace`.
///
/// Both segments must already be percent-encoded.
pub fn metric_names_path(node_id: &str, namespace: &str) -> String {
    format!("/cluster/{node_id}/metrics/namespace/{namespace}")
}
