//! Events broadcast by the metrics store

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::metrics::{ClusterMetrics, MetricName, NodeId};
use crate::errors::ClusterWatchError;

/// Result of a successful `list` round.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricsSnapshot {
    pub metrics: Arc<ClusterMetrics>,
    /// When the snapshot was taken; consumers compare it to decide whether to
    /// re-render.
    pub updated_at: DateTime<Utc>,
}

/// Result of a `names` round.
///
/// `names` holds every node with known names; a node whose fetch failed keeps
/// the names from the previous round and is listed in `errors`. A failed node
/// that never had names is absent from `names`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricNames {
    pub names: HashMap<NodeId, Vec<MetricName>>,
    pub errors: HashMap<NodeId, ClusterWatchError>,
}

impl MetricNames {
    /// Known names of `node_id`, if any.
    pub fn names_for(&self, node_id: &str) -> Option<&[MetricName]> {
        self.names.get(node_id).map(Vec::as_slice)
    }

    /// Error of the last round for `node_id`, if it failed.
    pub fn error_for(&self, node_id: &str) -> Option<&ClusterWatchError> {
        self.errors.get(node_id)
    }
}

/// Update pushed to store subscribers.
#[derive(Debug, Clone, PartialEq)]
pub enum MetricsEvent {
    /// A `list` round replaced the snapshot.
    MetricsUpdated(MetricsSnapshot),
    /// A `names` round finished (possibly with per-node errors).
    NamesUpdated(Arc<MetricNames>),
}

/// Everything a late subscriber needs to render immediately.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreState {
    pub metrics: Arc<ClusterMetrics>,
    pub updated_at: Option<DateTime<Utc>>,
    pub metric_names: Arc<MetricNames>,
}
