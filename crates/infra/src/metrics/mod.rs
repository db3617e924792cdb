//! HTTP adapter for the metrics store

pub mod source;

pub use source::HttpMetricsSource;
