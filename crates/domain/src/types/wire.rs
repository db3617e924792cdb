//! Request and response bodies of the cluster REST endpoints

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::metrics::{Metric, MetricName, NodeId};

/// Body of `POST /cluster/metrics/multiple`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsRequest {
    pub metrics: Vec<MetricName>,
}

/// Per-node section of the cluster metrics response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeMetricsResponse {
    pub metrics: Vec<Metric>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<usize>,
}

/// Response of `POST /cluster/metrics/multiple`.
///
/// A node that could not be asked is reported as `null`.
pub type ClusterMetricsResponse = HashMap<NodeId, Option<NodeMetricsResponse>>;

/// One entry of a namespace listing.
///
/// Servers answer either with bare names or with full metric objects; only
/// the name is kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricNameEntry {
    Name(MetricName),
    Described { full_name: MetricName },
}

impl MetricNameEntry {
    /// Fully-qualified metric name of this entry.
    pub fn into_name(self) -> MetricName {
        match self {
            Self::Name(name) | Self::Described { full_name: name } => name,
        }
    }
}

/// Response of `GET /cluster/{node}/metrics/namespace/{namespace}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricNamesResponse {
    pub metrics: Vec<MetricNameEntry>,
}

impl MetricNamesResponse {
    /// Every listed name, in response order.
    pub fn into_names(self) -> Vec<MetricName> {
        self.metrics.into_iter().map(MetricNameEntry::into_name).collect()
    }
}

/// A node as listed by `GET /system/cluster/nodes`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterNode {
    pub node_id: NodeId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transport_address: Option<String>,
    #[serde(default)]
    pub is_leader: bool,
}

/// Response of `GET /system/cluster/nodes`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterNodesResponse {
    pub nodes: Vec<ClusterNode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<usize>,
}

impl ClusterNodesResponse {
    /// Ids of the listed nodes.
    pub fn node_ids(&self) -> Vec<NodeId> {
        self.nodes.iter().map(|n| n.node_id.clone()).collect()
    }
}
