//! Background polling
//!
//! Schedulers own their task explicitly: `start`/`stop`, a join handle, a
//! cancellation token, and a bounded wait on shutdown.

pub mod error;
pub mod metrics_poller;

pub use error::{SchedulerError, SchedulerResult};
pub use metrics_poller::{MetricsPoller, MetricsPollerConfig, PollerStats};
