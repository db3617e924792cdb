//! In-memory node directory

use clusterwatch_domain::NodeId;
use parking_lot::RwLock;

use super::ports::NodeDirectory;

/// Node directory fed by whoever learns about cluster membership
#[derive(Debug, Default)]
pub struct InMemoryNodeDirectory {
    nodes: RwLock<Option<Vec<NodeId>>>,
}

impl InMemoryNodeDirectory {
    /// Empty directory; `node_ids` returns `None` until the first update.
    pub fn new() -> Self {
        Self::default()
    }

    /// Directory already populated with `node_ids`.
    pub fn with_nodes<I, S>(node_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<NodeId>,
    {
        Self { nodes: RwLock::new(Some(node_ids.into_iter().map(Into::into).collect())) }
    }
}

impl NodeDirectory for InMemoryNodeDirectory {
    fn node_ids(&self) -> Option<Vec<NodeId>> {
        self.nodes.read().clone()
    }

    fn update(&self, node_ids: Vec<NodeId>) {
        *self.nodes.write() = Some(node_ids);
    }
}
