//! Port interfaces for the metrics store

use async_trait::async_trait;
use clusterwatch_domain::{ClusterMetricsResponse, MetricName, NodeId, Result};

/// Backend that serves cluster metrics
#[async_trait]
pub trait MetricsSource: Send + Sync {
    /// Fetch the given metrics from every node in one request
    async fn fetch_cluster_metrics(
        &self,
        metric_names: &[MetricName],
    ) -> Result<ClusterMetricsResponse>;

    /// List the metric names a node exposes under `namespace`
    async fn fetch_metric_names(&self, node_id: &str, namespace: &str) -> Result<Vec<MetricName>>;
}

/// Answers whether there is an authenticated session
pub trait SessionProvider: Send + Sync {
    fn is_logged_in(&self) -> bool;
}

/// Current set of cluster nodes
///
/// `node_ids` returns `None` until the directory has been populated at least
/// once.
pub trait NodeDirectory: Send + Sync {
    fn node_ids(&self) -> Option<Vec<NodeId>>;

    /// Replace the known node set
    fn update(&self, node_ids: Vec<NodeId>);
}
