//! Configuration structures
//!
//! Loaded from environment or file by `clusterwatch-infra::config`.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_LIST_INTERVAL_SECS, DEFAULT_MAX_ATTEMPTS, DEFAULT_METRICS_NAMESPACE,
    DEFAULT_NAMES_INTERVAL_SECS, DEFAULT_REQUEST_TIMEOUT_SECS,
};
use crate::types::{MetricName, NodeId};

/// Root configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(default)]
    pub polling: PollingConfig,
    #[serde(default)]
    pub watch: WatchConfig,
}

/// Where the log-management server lives and how to talk to it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// API base URL, e.g. `https://graylog.example.com/api`
    pub base_url: String,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    /// Total attempts per request (initial try + retries)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: usize,
}

impl ServerConfig {
    /// Server at `base_url` with default timeout and attempts.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout_seconds: DEFAULT_REQUEST_TIMEOUT_SECS,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    /// Per-request timeout.
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

/// Poll cadence
///
/// Failed rounds are not retried early; the next tick is the retry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollingConfig {
    #[serde(default = "default_list_interval")]
    pub list_interval_seconds: u64,
    #[serde(default = "default_names_interval")]
    pub names_interval_seconds: u64,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_namespace")]
    pub namespace: String,
}

impl PollingConfig {
    /// Time between metrics polls.
    pub const fn list_interval(&self) -> Duration {
        Duration::from_secs(self.list_interval_seconds)
    }

    /// Time between metric-name polls.
    pub const fn names_interval(&self) -> Duration {
        Duration::from_secs(self.names_interval_seconds)
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            list_interval_seconds: DEFAULT_LIST_INTERVAL_SECS,
            names_interval_seconds: DEFAULT_NAMES_INTERVAL_SECS,
            enabled: true,
            namespace: DEFAULT_METRICS_NAMESPACE.to_string(),
        }
    }
}

/// Metrics the daemon registers interest in at start
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchConfig {
    #[serde(default)]
    pub global: Vec<MetricName>,
    #[serde(default)]
    pub nodes: BTreeMap<NodeId, Vec<MetricName>>,
}

impl WatchConfig {
    /// Whether nothing is watched.
    pub fn is_empty(&self) -> bool {
        self.global.is_empty() && self.nodes.values().all(Vec::is_empty)
    }
}

const fn default_timeout_seconds() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

const fn default_max_attempts() -> usize {
    DEFAULT_MAX_ATTEMPTS
}

const fn default_list_interval() -> u64 {
    DEFAULT_LIST_INTERVAL_SECS
}

const fn default_names_interval() -> u64 {
    DEFAULT_NAMES_INTERVAL_SECS
}

const fn default_true() -> bool {
    true
}

fn default_namespace() -> String {
    DEFAULT_METRICS_NAMESPACE.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_json_fills_defaults() {
        let config: Config =
            serde_json::from_str(r#"{ "server": { "base_url": "http://localhost:9000/api" } }"#)
                .unwrap();

        assert_eq!(config.server.timeout_seconds, DEFAULT_REQUEST_TIMEOUT_SECS);
        assert_eq!(config.server.max_attempts, DEFAULT_MAX_ATTEMPTS);
        assert_eq!(config.polling, PollingConfig::default());
        assert!(config.watch.is_empty());
    }

    #[test]
    fn toml_watch_section() {
        let config: Config = toml::from_str(
            r#"
[server]
base_url = "http://localhost:9000/api"

[polling]
list_interval_seconds = 5
namespace = "jvm"

[watch]
global = ["org.graylog2.throughput.input"]

[watch.nodes]
node-1 = ["jvm.memory.heap.used"]
"#,
        )
        .unwrap();

        assert_eq!(config.polling.list_interval(), Duration::from_secs(5));
        assert_eq!(config.polling.names_interval_seconds, DEFAULT_NAMES_INTERVAL_SECS);
        assert_eq!(config.polling.namespace, "jvm");
        assert_eq!(config.watch.global.len(), 1);
        assert_eq!(config.watch.nodes["node-1"], vec!["jvm.memory.heap.used".to_string()]);
        assert!(!config.watch.is_empty());
    }
}
