//! `MetricsSource` backed by the cluster metrics REST endpoints

use std::sync::Arc;

use async_trait::async_trait;
use clusterwatch_core::MetricsSource;
use clusterwatch_domain::constants::{metric_names_path, CLUSTER_METRICS_MULTIPLE_PATH};
use clusterwatch_domain::{
    ClusterMetricsResponse, MetricName, MetricNamesResponse, MetricsRequest, Result,
};
use tracing::debug;
use urlencoding::encode;

use crate::api::ApiClient;

pub struct HttpMetricsSource {
    api: Arc<ApiClient>,
}

impl HttpMetricsSource {
    /// Source backed by `api`.
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl MetricsSource for HttpMetricsSource {
    async fn fetch_cluster_metrics(
        &self,
        metric_names: &[MetricName],
    ) -> Result<ClusterMetricsResponse> {
        let request = MetricsRequest { metrics: metric_names.to_vec() };
        let response: ClusterMetricsResponse =
            self.api.post(CLUSTER_METRICS_MULTIPLE_PATH, &request).await?;

        debug!(
            requested = metric_names.len(),
            nodes = response.len(),
            "Cluster metrics received"
        );
        Ok(response)
    }

    async fn fetch_metric_names(&self, node_id: &str, namespace: &str) -> Result<Vec<MetricName>> {
        let path = metric_names_path(&encode(node_id), &encode(namespace));
        let response: MetricNamesResponse = self.api.get(&path).await?;
        Ok(response.into_names())
    }
}
