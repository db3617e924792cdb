//! Cluster membership lookup

use std::sync::Arc;

use clusterwatch_core::MetricsStore;
use clusterwatch_domain::constants::CLUSTER_NODES_PATH;
use clusterwatch_domain::{ClusterNodesResponse, NodeId};
use tracing::{debug, instrument};

use super::client::ApiClient;
use super::errors::ApiError;

/// Reads the node list from the server and feeds it to the metrics store
pub struct ClusterNodesClient {
    api: Arc<ApiClient>,
}

impl ClusterNodesClient {
    /// Node lookup over `api`.
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    /// Ids of every node currently in the cluster.
    #[instrument(skip(self))]
    pub async fn fetch_node_ids(&self) -> Result<Vec<NodeId>, ApiError> {
        let response: ClusterNodesResponse = self.api.get(CLUSTER_NODES_PATH).await?;
        let node_ids = response.node_ids();
        debug!(count = node_ids.len(), "Fetched cluster nodes");
        Ok(node_ids)
    }

    /// Fetch the node list and hand it to `store`; returns the node count.
    ///
    /// On failure the store keeps its previous node list.
    pub async fn refresh(&self, store: &MetricsStore) -> Result<usize, ApiError> {
        let node_ids = self.fetch_node_ids().await?;
        let count = node_ids.len();
        store.update_nodes(node_ids);
        Ok(count)
    }
}
