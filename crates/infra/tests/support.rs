use std::sync::Arc;
use std::time::Duration;

use clusterwatch_core::MetricsStore;
use clusterwatch_infra::{ApiClient, ApiClientConfig, HttpMetricsSource, SessionStore};
use wiremock::MockServer;

/// Store wired to `server` through the real HTTP adapter.
pub struct TestStack {
    pub api: Arc<ApiClient>,
    pub session: Arc<SessionStore>,
    pub store: MetricsStore,
}

impl TestStack {
    pub fn new(server: &MockServer) -> Self {
        let session = Arc::new(SessionStore::with_token("integration-token").expect("token"));
        let config = ApiClientConfig {
            base_url: format!("{}/api", server.uri()),
            timeout: Duration::from_secs(2),
            max_attempts: 1,
        };
        let api = Arc::new(ApiClient::new(config, session.clone()).expect("api client"));
        let store =
            MetricsStore::new(Arc::new(HttpMetricsSource::new(Arc::clone(&api))), session.clone());

        Self { api, session, store }
    }
}

/// Metric object as the server renders it.
pub fn gauge_json(full_name: &str, value: f64) -> serde_json::Value {
    serde_json::json!({
        "full_name": full_name,
        "name": full_name.rsplit('.').next().unwrap_or(full_name),
        "type": "gauge",
        "metric": { "value": value }
    })
}
