//! Cluster metrics subscription cache
//!
//! Consumers register interest in metric names (per node or global), a poller
//! calls [`MetricsStore::list`] on an interval, and only metrics with non-zero
//! interest are fetched. Results are broadcast to every subscriber.

mod coalesce;
pub mod directory;
pub mod ports;
pub mod registry;
pub mod snapshot;
pub mod store;

pub use directory::InMemoryNodeDirectory;
pub use registry::Registrations;
pub use snapshot::build_cluster_metrics;
pub use store::{MetricsStore, MetricsStoreBuilder};
