use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use clusterwatch_core::{MetricsSource, SessionProvider};
use clusterwatch_domain::{
    ClusterMetricsResponse, ClusterWatchError, GaugeValue, Metric, MetricName, MetricValue,
    NodeMetricsResponse, Result as DomainResult,
};

/// In-memory cluster that answers every requested metric with a gauge on
/// each of its nodes.
///
/// Gauge values are bumped on every request, so consecutive snapshots differ.
#[derive(Default)]
pub struct FakeCluster {
    nodes: Vec<String>,
    names: Mutex<HashMap<String, Vec<MetricName>>>,
    unreachable: Mutex<Vec<String>>,
    requests: AtomicUsize,
    failing: AtomicBool,
}

impl FakeCluster {
    pub fn new(nodes: &[&str]) -> Self {
        Self { nodes: nodes.iter().map(|n| n.to_string()).collect(), ..Self::default() }
    }

    pub fn with_names(self, node_id: &str, names: &[&str]) -> Self {
        self.names
            .lock()
            .unwrap()
            .insert(node_id.to_string(), names.iter().map(|n| n.to_string()).collect());
        self
    }

    /// Make `names` fail for `node_id` from now on.
    pub fn take_offline(&self, node_id: &str) {
        self.unreachable.lock().unwrap().push(node_id.to_string());
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MetricsSource for FakeCluster {
    async fn fetch_cluster_metrics(
        &self,
        metric_names: &[MetricName],
    ) -> DomainResult<ClusterMetricsResponse> {
        let round = self.requests.fetch_add(1, Ordering::SeqCst) + 1;
        tokio::task::yield_now().await;

        if self.failing.load(Ordering::SeqCst) {
            return Err(ClusterWatchError::Network("502 Bad Gateway".into()));
        }

        Ok(self
            .nodes
            .iter()
            .map(|node_id| {
                let metrics = metric_names
                    .iter()
                    .map(|name| Metric {
                        full_name: name.clone(),
                        name: name.rsplit('.').next().unwrap_or(name).to_string(),
                        value: MetricValue::Gauge(GaugeValue { value: serde_json::json!(round) }),
                    })
                    .collect();
                (node_id.clone(), Some(NodeMetricsResponse { metrics, total: None }))
            })
            .collect())
    }

    async fn fetch_metric_names(
        &self,
        node_id: &str,
        namespace: &str,
    ) -> DomainResult<Vec<MetricName>> {
        if self.unreachable.lock().unwrap().iter().any(|n| n == node_id) {
            return Err(ClusterWatchError::Network(format!("{node_id} unreachable")));
        }

        Ok(self
            .names
            .lock()
            .unwrap()
            .get(node_id)
            .map(|names| names.iter().filter(|n| n.starts_with(namespace)).cloned().collect())
            .unwrap_or_default())
    }
}

/// Session flag toggled by tests.
#[derive(Default)]
pub struct ToggleSession(AtomicBool);

impl ToggleSession {
    pub fn logged_in() -> Arc<Self> {
        Arc::new(Self(AtomicBool::new(true)))
    }

    pub fn set(&self, logged_in: bool) {
        self.0.store(logged_in, Ordering::SeqCst);
    }
}

impl SessionProvider for ToggleSession {
    fn is_logged_in(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}
