//! Domain types and models
//!
//! - [`metrics`]: typed metric values and the cluster snapshot
//! - [`wire`]: request/response bodies of the cluster REST endpoints
//! - [`events`]: payloads the metrics store broadcasts to subscribers

pub mod events;
pub mod metrics;
pub mod wire;

pub use events::{MetricNames, MetricsEvent, MetricsSnapshot, StoreState};
pub use metrics::{
    ClusterMetrics, CounterValue, GaugeValue, HistogramValue, MeterValue, Metric, MetricKind,
    MetricName, MetricValue, NodeId, NodeMetrics, Rate, TimerValue, Timing,
};
pub use wire::{
    ClusterMetricsResponse, ClusterNode, ClusterNodesResponse, MetricNameEntry,
    MetricNamesResponse, MetricsRequest, NodeMetricsResponse,
};
