//! Flattening of cluster metrics responses into the store snapshot

use clusterwatch_domain::{ClusterMetrics, ClusterMetricsResponse, NodeMetrics};

/// Build a snapshot keyed by node, then by each metric's full name.
///
/// Nodes reported as `null` are skipped. A node that answered with an empty
/// list is kept with an empty map.
pub fn build_cluster_metrics(response: ClusterMetricsResponse) -> ClusterMetrics {
    response
        .into_iter()
        .filter_map(|(node_id, node)| {
            let node = node?;
            let metrics: NodeMetrics =
                node.metrics.into_iter().map(|m| (m.full_name.clone(), m)).collect();
            Some((node_id, metrics))
        })
        .collect()
}
