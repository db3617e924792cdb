//! Typed cluster metrics
//!
//! The server reports every metric as `{ full_name, name, type, metric }`
//! where the shape of `metric` depends on `type`. Parsing goes through
//! [`RawMetric`] so that an unknown `type`, or a payload that does not match
//! its `type`, is rejected when the response is decoded instead of surfacing
//! later as a missing field.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::errors::ClusterWatchError;
use crate::impl_wire_name_conversions;

/// Identifier of a cluster node.
pub type NodeId = String;

/// Identifier of a measurable quantity exposed by a node (e.g.
/// `org.graylog2.buffers.input.usage`).
pub type MetricName = String;

/// Metrics of a single node, keyed by the metric's full name.
pub type NodeMetrics = HashMap<MetricName, Metric>;

/// Consolidated snapshot: node id → full name → metric.
pub type ClusterMetrics = HashMap<NodeId, NodeMetrics>;

/* -------------------------------------------------------------------------- */
/* Metric kinds */
/* -------------------------------------------------------------------------- */

/// Value of the `type` tag on a metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    Counter,
    Gauge,
    Meter,
    Timer,
    Histogram,
}

impl_wire_name_conversions!(MetricKind {
    Counter => "counter",
    Gauge => "gauge",
    Meter => "meter",
    Timer => "timer",
    Histogram => "histogram",
});

/* -------------------------------------------------------------------------- */
/* Payloads */
/* -------------------------------------------------------------------------- */

/// Throughput figures shared by meters and timers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rate {
    pub total: f64,
    pub mean: f64,
    pub one_minute: f64,
    pub five_minute: f64,
    pub fifteen_minute: f64,
}

/// Latency distribution shared by timers and histograms.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Timing {
    #[serde(rename = "95th_percentile")]
    pub p95: f64,
    #[serde(rename = "98th_percentile")]
    pub p98: f64,
    #[serde(rename = "99th_percentile")]
    pub p99: f64,
    pub std_dev: f64,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterValue {
    pub count: i64,
}

/// Gauges may report numbers, strings or small objects, so the raw JSON value
/// is kept. Use [`GaugeValue::as_f64`] for the numeric view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GaugeValue {
    pub value: serde_json::Value,
}

impl GaugeValue {
    /// Numeric value of the gauge, if it reported one.
    pub fn as_f64(&self) -> Option<f64> {
        self.value.as_f64()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeterValue {
    pub rate: Rate,
    pub rate_unit: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimerValue {
    pub rate: Rate,
    pub rate_unit: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_unit: Option<String>,
    pub time: Timing,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistogramValue {
    pub time: Timing,
    pub count: i64,
}

/// Payload of a metric, one variant per [`MetricKind`].
#[derive(Debug, Clone, PartialEq)]
pub enum MetricValue {
    Counter(CounterValue),
    Gauge(GaugeValue),
    Meter(MeterValue),
    Timer(TimerValue),
    Histogram(HistogramValue),
}

impl MetricValue {
    /// Kind tag matching this payload.
    pub const fn kind(&self) -> MetricKind {
        match self {
            Self::Counter(_) => MetricKind::Counter,
            Self::Gauge(_) => MetricKind::Gauge,
            Self::Meter(_) => MetricKind::Meter,
            Self::Timer(_) => MetricKind::Timer,
            Self::Histogram(_) => MetricKind::Histogram,
        }
    }

    fn parse(kind: MetricKind, payload: serde_json::Value) -> serde_json::Result<Self> {
        Ok(match kind {
            MetricKind::Counter => Self::Counter(serde_json::from_value(payload)?),
            MetricKind::Gauge => Self::Gauge(serde_json::from_value(payload)?),
            MetricKind::Meter => Self::Meter(serde_json::from_value(payload)?),
            MetricKind::Timer => Self::Timer(serde_json::from_value(payload)?),
            MetricKind::Histogram => Self::Histogram(serde_json::from_value(payload)?),
        })
    }

    fn to_payload(&self) -> serde_json::Result<serde_json::Value> {
        match self {
            Self::Counter(v) => serde_json::to_value(v),
            Self::Gauge(v) => serde_json::to_value(v),
            Self::Meter(v) => serde_json::to_value(v),
            Self::Timer(v) => serde_json::to_value(v),
            Self::Histogram(v) => serde_json::to_value(v),
        }
    }
}

/* -------------------------------------------------------------------------- */
/* Metric */
/* -------------------------------------------------------------------------- */

/// A single metric as reported by a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawMetric", into = "RawMetric")]
pub struct Metric {
    /// Fully-qualified name; the snapshot is keyed by this.
    pub full_name: String,
    /// Short display name.
    pub name: String,
    pub value: MetricValue,
}

impl Metric {
    /// Wire type of the value.
    pub const fn kind(&self) -> MetricKind {
        self.value.kind()
    }
}

/// Wire representation of [`Metric`].
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawMetric {
    full_name: String,
    name: String,
    #[serde(rename = "type")]
    kind: MetricKind,
    metric: serde_json::Value,
}

impl TryFrom<RawMetric> for Metric {
    type Error = ClusterWatchError;

    fn try_from(raw: RawMetric) -> Result<Self, Self::Error> {
        let value = MetricValue::parse(raw.kind, raw.metric).map_err(|e| {
            ClusterWatchError::Decode(format!(
                "{} metric '{}' has an invalid payload: {}",
                raw.kind, raw.full_name, e
            ))
        })?;

        Ok(Self { full_name: raw.full_name, name: raw.name, value })
    }
}

impl From<Metric> for RawMetric {
    fn from(metric: Metric) -> Self {
        let kind = metric.kind();
        // Payload structs only hold plain fields, so this cannot fail.
        let payload = metric.value.to_payload().unwrap_or(serde_json::Value::Null);
        Self { full_name: metric.full_name, name: metric.name, kind, metric: payload }
    }
}
