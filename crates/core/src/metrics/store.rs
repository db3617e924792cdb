//! Metrics subscription store - core business logic

use std::sync::Arc;

use chrono::{DateTime, Utc};
use clusterwatch_domain::constants::{DEFAULT_METRICS_NAMESPACE, EVENT_CHANNEL_CAPACITY};
use clusterwatch_domain::{
    ClusterMetrics, ClusterWatchError, MetricName, MetricNames, MetricsEvent, MetricsSnapshot,
    NodeId, Result, StoreState,
};
use futures::future::join_all;
use parking_lot::{Mutex, RwLock};
use tokio::sync::broadcast;
use tracing::{debug, info, instrument, trace, warn};

use super::coalesce::InflightSlot;
use super::directory::InMemoryNodeDirectory;
use super::ports::{MetricsSource, NodeDirectory, SessionProvider};
use super::registry::Registrations;
use super::snapshot::build_cluster_metrics;

/// Client-side cluster metrics cache
///
/// Cheap to clone; every clone shares the same registrations, snapshot and
/// subscribers. Dropping the last clone disposes the store.
#[derive(Clone)]
pub struct MetricsStore {
    inner: Arc<StoreInner>,
}

struct StoreInner {
    source: Arc<dyn MetricsSource>,
    session: Arc<dyn SessionProvider>,
    nodes: Arc<dyn NodeDirectory>,
    namespace: String,
    registrations: Mutex<Registrations>,
    snapshot: RwLock<Snapshot>,
    metric_names: RwLock<Arc<MetricNames>>,
    list_round: Arc<InflightSlot<Arc<ClusterMetrics>>>,
    names_round: Arc<InflightSlot<Arc<MetricNames>>>,
    events: broadcast::Sender<MetricsEvent>,
}

#[derive(Default)]
struct Snapshot {
    metrics: Arc<ClusterMetrics>,
    updated_at: Option<DateTime<Utc>>,
}

impl MetricsStore {
    /// Create a store with an empty in-memory node directory and the default
    /// namespace
    pub fn new(source: Arc<dyn MetricsSource>, session: Arc<dyn SessionProvider>) -> Self {
        Self::assemble(
            source,
            session,
            Arc::new(InMemoryNodeDirectory::new()),
            DEFAULT_METRICS_NAMESPACE.to_string(),
            EVENT_CHANNEL_CAPACITY,
        )
    }

    fn assemble(
        source: Arc<dyn MetricsSource>,
        session: Arc<dyn SessionProvider>,
        nodes: Arc<dyn NodeDirectory>,
        namespace: String,
        event_capacity: usize,
    ) -> Self {
        let (events, _) = broadcast::channel(event_capacity.max(1));
        let inner = StoreInner {
            source,
            session,
            nodes,
            namespace,
            registrations: Mutex::new(Registrations::new()),
            snapshot: RwLock::new(Snapshot::default()),
            metric_names: RwLock::new(Arc::new(MetricNames::default())),
            list_round: InflightSlot::new(),
            names_round: InflightSlot::new(),
            events,
        };
        Self { inner: Arc::new(inner) }
    }

    /// Create a builder for fluent configuration
    pub fn builder() -> MetricsStoreBuilder {
        MetricsStoreBuilder::default()
    }

    /* ---------------------------------------------------------------------- */
    /* Registrations */
    /* ---------------------------------------------------------------------- */

    /// Register interest in `metric_name` on `node_id`.
    ///
    /// Bookkeeping only; the metric is fetched from the next `list` round on.
    pub fn add(&self, node_id: &str, metric_name: &str) {
        let count = self.inner.registrations.lock().add(node_id, metric_name);
        trace!(node_id, metric_name, count, "metric registered");
    }

    /// Register interest in `metric_name` independent of node.
    pub fn add_global(&self, metric_name: &str) {
        let count = self.inner.registrations.lock().add_global(metric_name);
        trace!(metric_name, count, "global metric registered");
    }

    /// Drop one registration of `metric_name` on `node_id`.
    pub fn remove(&self, node_id: &str, metric_name: &str) {
        let count = self.inner.registrations.lock().remove(node_id, metric_name);
        trace!(node_id, metric_name, count, "metric unregistered");
    }

    /// Drop one global registration of `metric_name`.
    pub fn remove_global(&self, metric_name: &str) {
        let count = self.inner.registrations.lock().remove_global(metric_name);
        trace!(metric_name, count, "global metric unregistered");
    }

    /// Current registration count of `metric_name` on `node_id`.
    pub fn registration_count(&self, node_id: &str, metric_name: &str) -> usize {
        self.inner.registrations.lock().count(node_id, metric_name)
    }

    /// Current global registration count of `metric_name`.
    pub fn global_registration_count(&self, metric_name: &str) -> usize {
        self.inner.registrations.lock().global_count(metric_name)
    }

    /// Names the next `list` round would request.
    pub fn metrics_to_fetch(&self) -> Vec<MetricName> {
        self.inner.registrations.lock().metrics_to_fetch()
    }

    /* ---------------------------------------------------------------------- */
    /* Fetch rounds */
    /* ---------------------------------------------------------------------- */

    /// Fetch every registered metric from all nodes and replace the snapshot.
    ///
    /// Returns `Ok(None)` without fetching when there is no session. While a
    /// round is outstanding, further calls join it instead of issuing a second
    /// request, and all of them observe the same outcome. On failure the
    /// previous snapshot is kept and nothing is broadcast.
    ///
    /// # Errors
    ///
    /// Returns the fetch error of the round, shared by all callers that joined
    /// it.
    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Option<Arc<ClusterMetrics>>> {
        if !self.inner.session.is_logged_in() {
            debug!("Not logged in, skipping metrics fetch");
            return Ok(None);
        }

        let inner = Arc::clone(&self.inner);
        let (round, joined) = self.inner.list_round.join_or_start(move || {
            let metric_names = {
                let registrations = inner.registrations.lock();
                if registrations.is_empty() {
                    debug!("No metrics registered, fetching an empty set");
                }
                registrations.metrics_to_fetch()
            };
            async move { inner.fetch_metrics(metric_names).await }
        });

        if joined {
            debug!("Joining outstanding metrics fetch");
        }

        round.await.map(Some)
    }

    /// Fetch the metric names every known node exposes under the store's
    /// namespace.
    ///
    /// Returns `Ok(None)` (after logging a warning) when the node directory
    /// has not been populated yet. Nodes are asked concurrently; a node that
    /// fails keeps its previously known names and has its error recorded,
    /// without affecting the others.
    ///
    /// # Errors
    ///
    /// Only internal failures (the fetch task dying) are returned; per-node
    /// failures are reported inside [`MetricNames::errors`].
    #[instrument(skip(self))]
    pub async fn names(&self) -> Result<Option<Arc<MetricNames>>> {
        let Some(node_ids) = self.inner.nodes.node_ids() else {
            warn!("Node list not yet available, not fetching metric names");
            return Ok(None);
        };

        let inner = Arc::clone(&self.inner);
        let (round, joined) = self
            .inner
            .names_round
            .join_or_start(move || async move { Ok(inner.fetch_names(node_ids).await) });

        if joined {
            debug!("Joining outstanding metric names fetch");
        }

        round.await.map(Some)
    }

    /// Whether a `list` round is currently outstanding.
    pub fn is_listing(&self) -> bool {
        self.inner.list_round.is_pending()
    }

    /* ---------------------------------------------------------------------- */
    /* Nodes, subscribers, state */
    /* ---------------------------------------------------------------------- */

    /// Replace the node set `names` works on.
    pub fn update_nodes(&self, node_ids: Vec<NodeId>) {
        debug!(count = node_ids.len(), "Node list updated");
        self.inner.nodes.update(node_ids);
    }

    /// Subscribe to snapshot and names updates.
    ///
    /// A subscriber that falls behind by more than the channel capacity
    /// skips the oldest events; it never blocks the store.
    pub fn subscribe(&self) -> broadcast::Receiver<MetricsEvent> {
        self.inner.events.subscribe()
    }

    /// Current snapshot and names.
    pub fn state(&self) -> StoreState {
        let snapshot = self.inner.snapshot.read();
        StoreState {
            metrics: Arc::clone(&snapshot.metrics),
            updated_at: snapshot.updated_at,
            metric_names: Arc::clone(&self.inner.metric_names.read()),
        }
    }

    /// Current snapshot.
    pub fn metrics(&self) -> Arc<ClusterMetrics> {
        Arc::clone(&self.inner.snapshot.read().metrics)
    }

    /// Namespace listed by `names`.
    pub fn namespace(&self) -> &str {
        &self.inner.namespace
    }
}

impl StoreInner {
    async fn fetch_metrics(&self, metric_names: Vec<MetricName>) -> Result<Arc<ClusterMetrics>> {
        debug!(count = metric_names.len(), "Fetching cluster metrics");

        let response = self.source.fetch_cluster_metrics(&metric_names).await.map_err(|err| {
            warn!(error = %err, "Cluster metrics fetch failed, keeping previous snapshot");
            err
        })?;

        let metrics = Arc::new(build_cluster_metrics(response));
        let updated_at = Utc::now();

        {
            let mut snapshot = self.snapshot.write();
            snapshot.metrics = Arc::clone(&metrics);
            snapshot.updated_at = Some(updated_at);
        }

        debug!(nodes = metrics.len(), "Metrics snapshot replaced");
        self.publish(MetricsEvent::MetricsUpdated(MetricsSnapshot {
            metrics: Arc::clone(&metrics),
            updated_at,
        }));

        Ok(metrics)
    }

    async fn fetch_names(&self, node_ids: Vec<NodeId>) -> Arc<MetricNames> {
        let previous = Arc::clone(&self.metric_names.read());

        let fetches = node_ids.into_iter().map(|node_id| async move {
            let result = self.source.fetch_metric_names(&node_id, &self.namespace).await;
            (node_id, result)
        });
        let results = join_all(fetches).await;

        let mut next = MetricNames::default();
        for (node_id, result) in results {
            match result {
                Ok(names) => {
                    next.names.insert(node_id, names);
                }
                Err(err) => {
                    warn!(node_id = %node_id, error = %err, "Failed to fetch metric names");
                    if let Some(names) = previous.names.get(&node_id) {
                        next.names.insert(node_id.clone(), names.clone());
                    }
                    next.errors.insert(node_id, err);
                }
            }
        }

        info!(nodes = next.names.len(), failed = next.errors.len(), "Metric names updated");

        let next = Arc::new(next);
        *self.metric_names.write() = Arc::clone(&next);
        self.publish(MetricsEvent::NamesUpdated(Arc::clone(&next)));
        next
    }

    fn publish(&self, event: MetricsEvent) {
        if self.events.send(event).is_err() {
            trace!("No subscribers for metrics event");
        }
    }
}

/// Builder for [`MetricsStore`]
#[derive(Default)]
pub struct MetricsStoreBuilder {
    source: Option<Arc<dyn MetricsSource>>,
    session: Option<Arc<dyn SessionProvider>>,
    nodes: Option<Arc<dyn NodeDirectory>>,
    namespace: Option<String>,
    event_capacity: Option<usize>,
}

impl MetricsStoreBuilder {
    /// Set the metrics backend
    pub fn source(mut self, source: Arc<dyn MetricsSource>) -> Self {
        self.source = Some(source);
        self
    }

    /// Set the session check consulted by `list`
    pub fn session(mut self, session: Arc<dyn SessionProvider>) -> Self {
        self.session = Some(session);
        self
    }

    /// Set the node directory consulted by `names`
    pub fn nodes(mut self, nodes: Arc<dyn NodeDirectory>) -> Self {
        self.nodes = Some(nodes);
        self
    }

    /// Namespace listed by `names` (default `org`)
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Number of events a slow subscriber may lag behind
    pub fn event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = Some(capacity.max(1));
        self
    }

    /// Build the store
    ///
    /// # Errors
    ///
    /// Returns `ClusterWatchError::Config` if the source or session is missing
    pub fn build(self) -> Result<MetricsStore> {
        let source =
            self.source.ok_or_else(|| ClusterWatchError::Config("Metrics source not set".into()))?;
        let session = self
            .session
            .ok_or_else(|| ClusterWatchError::Config("Session provider not set".into()))?;
        let nodes: Arc<dyn NodeDirectory> = match self.nodes {
            Some(nodes) => nodes,
            None => Arc::new(InMemoryNodeDirectory::new()),
        };
        let namespace = self.namespace.unwrap_or_else(|| DEFAULT_METRICS_NAMESPACE.to_string());

        Ok(MetricsStore::assemble(
            source,
            session,
            nodes,
            namespace,
            self.event_capacity.unwrap_or(EVENT_CHANNEL_CAPACITY),
        ))
    }
}
