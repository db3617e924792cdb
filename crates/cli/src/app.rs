//! Wiring of the daemon's components

use std::sync::Arc;

use clusterwatch_core::MetricsStore;
use clusterwatch_domain::{Config, MetricsEvent, WatchConfig};
use clusterwatch_infra::{
    ApiClient, ApiClientConfig, ClusterNodesClient, HttpMetricsSource, MetricsPoller,
    MetricsPollerConfig, SessionStore,
};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::broadcast::Receiver;
use tracing::{debug, info, warn};

pub struct App {
    pub session: Arc<SessionStore>,
    pub store: MetricsStore,
    pub poller: MetricsPoller,
}

impl App {
    /// Build the store and poller for `config`.
    ///
    /// Without a token the session stays logged out and metrics rounds are
    /// skipped until one is provided.
    pub fn build(config: &Config, token: Option<String>) -> anyhow::Result<Self> {
        let session = Arc::new(SessionStore::new());
        match token {
            Some(token) => session.login(token)?,
            None => warn!("CLUSTERWATCH_TOKEN not set; metrics polls will be skipped"),
        }

        let api = Arc::new(ApiClient::new(ApiClientConfig::from(&config.server), session.clone())?);
        debug!(base_url = api.base_url(), "API client ready");
        let store = MetricsStore::builder()
            .source(Arc::new(HttpMetricsSource::new(Arc::clone(&api))))
            .session(session.clone())
            .namespace(config.polling.namespace.clone())
            .build()?;

        let poller = MetricsPoller::new(store.clone(), MetricsPollerConfig::from(&config.polling))
            .with_nodes_client(Arc::new(ClusterNodesClient::new(api)));

        Ok(Self { session, store, poller })
    }
}

/// Register every watched metric; returns how many registrations were made.
pub fn register_watches(store: &MetricsStore, watch: &WatchConfig) -> usize {
    for name in &watch.global {
        store.add_global(name);
    }

    let per_node: usize = watch
        .nodes
        .iter()
        .map(|(node_id, names)| {
            for name in names {
                store.add(node_id, name);
            }
            names.len()
        })
        .sum();

    let total = watch.global.len() + per_node;
    info!(total, fetch_set = store.metrics_to_fetch().len(), "Watches registered");
    total
}

/// Log store events until the store is gone.
pub async fn log_events(mut events: Receiver<MetricsEvent>) {
    loop {
        match events.recv().await {
            Ok(MetricsEvent::MetricsUpdated(snapshot)) => {
                let metrics: usize = snapshot.metrics.values().map(|node| node.len()).sum();
                info!(
                    nodes = snapshot.metrics.len(),
                    metrics,
                    updated_at = %snapshot.updated_at,
                    "Metrics updated"
                );
                for (node_id, node) in snapshot.metrics.iter() {
                    for metric in node.values() {
                        debug!(node_id = %node_id, metric = %metric.full_name, kind = %metric.kind(), "metric");
                    }
                }
            }
            Ok(MetricsEvent::NamesUpdated(names)) => {
                info!(nodes = names.names.len(), failed = names.errors.len(), "Metric names updated");
                for (node_id, err) in &names.errors {
                    warn!(node_id = %node_id, error = %err, "Metric names unavailable");
                }
            }
            Err(RecvError::Lagged(skipped)) => warn!(skipped, "Event logger fell behind"),
            Err(RecvError::Closed) => break,
        }
    }
}
