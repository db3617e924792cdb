//! Interval-driven polling of the metrics store.
//!
//! Every `list_interval` the poller calls [`MetricsStore::list`]; every
//! `names_interval` it refreshes the node list (when a
//! [`ClusterNodesClient`] is attached) and calls [`MetricsStore::names`].
//! The two schedules run independently: a slow names round never holds back
//! metrics polls, and the reverse. Failures are logged and counted. There is
//! no early retry: the next tick is the retry.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use clusterwatch_core::MetricsStore;
//! use clusterwatch_infra::scheduling::{MetricsPoller, MetricsPollerConfig};
//!
//! # async fn example(store: MetricsStore) -> Result<(), Box<dyn std::error::Error>> {
//! let mut poller = MetricsPoller::new(
//!     store,
//!     MetricsPollerConfig {
//!         list_interval: Duration::from_secs(1),
//!         names_interval: Duration::from_secs(30),
//!         ..MetricsPollerConfig::default()
//!     },
//! );
//!
//! poller.start().await?;
//! // ... application runs ...
//! poller.stop().await?;
//! # Ok(())
//! # }
//! ```

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use clusterwatch_core::MetricsStore;
use clusterwatch_domain::constants::{DEFAULT_LIST_INTERVAL_SECS, DEFAULT_NAMES_INTERVAL_SECS};
use clusterwatch_domain::PollingConfig;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{interval, Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::api::ClusterNodesClient;
use crate::scheduling::error::{SchedulerError, SchedulerResult};

type TaskHandle = Arc<Mutex<Option<JoinHandle<()>>>>;

const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Configuration for the metrics poller
#[derive(Debug, Clone)]
pub struct MetricsPollerConfig {
    pub list_interval: Duration,
    pub names_interval: Duration,
    /// How long `stop` waits for the loop to wind down
    pub stop_timeout: Duration,
}

impl Default for MetricsPollerConfig {
    fn default() -> Self {
        Self {
            list_interval: Duration::from_secs(DEFAULT_LIST_INTERVAL_SECS),
            names_interval: Duration::from_secs(DEFAULT_NAMES_INTERVAL_SECS),
            stop_timeout: Duration::from_secs(5),
        }
    }
}

impl From<&PollingConfig> for MetricsPollerConfig {
    fn from(polling: &PollingConfig) -> Self {
        Self {
            list_interval: polling.list_interval(),
            names_interval: polling.names_interval(),
            ..Self::default()
        }
    }
}

/// Tick and failure counts since the poller was created
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PollerStats {
    pub list_ticks: u64,
    pub list_failures: u64,
    pub names_ticks: u64,
    pub names_failures: u64,
}

#[derive(Default)]
struct PollerCounters {
    list_ticks: AtomicU64,
    list_failures: AtomicU64,
    names_ticks: AtomicU64,
    names_failures: AtomicU64,
}

impl PollerCounters {
    fn snapshot(&self) -> PollerStats {
        PollerStats {
            list_ticks: self.list_ticks.load(Ordering::Relaxed),
            list_failures: self.list_failures.load(Ordering::Relaxed),
            names_ticks: self.names_ticks.load(Ordering::Relaxed),
            names_failures: self.names_failures.load(Ordering::Relaxed),
        }
    }
}

struct PollContext {
    store: MetricsStore,
    nodes: Option<Arc<ClusterNodesClient>>,
    counters: Arc<PollerCounters>,
}

/// Drives the store's `list` and `names` rounds on fixed intervals
pub struct MetricsPoller {
    store: MetricsStore,
    nodes: Option<Arc<ClusterNodesClient>>,
    config: MetricsPollerConfig,
    cancellation_token: CancellationToken,
    task_handle: TaskHandle,
    counters: Arc<PollerCounters>,
}

impl MetricsPoller {
    /// Poller for `store`; nothing runs until [`start`](Self::start).
    pub fn new(store: MetricsStore, config: MetricsPollerConfig) -> Self {
        Self {
            store,
            nodes: None,
            config,
            cancellation_token: CancellationToken::new(),
            task_handle: Arc::new(Mutex::new(None)),
            counters: Arc::new(PollerCounters::default()),
        }
    }

    /// Refresh the store's node list from the server before every names
    /// round.
    pub fn with_nodes_client(mut self, nodes: Arc<ClusterNodesClient>) -> Self {
        self.nodes = Some(nodes);
        self
    }

    /// Spawn the polling task.
    ///
    /// Both intervals fire immediately, so the first rounds run right away.
    ///
    /// # Errors
    ///
    /// Returns `SchedulerError::AlreadyRunning` if the loop is active.
    #[instrument(skip(self))]
    pub async fn start(&mut self) -> SchedulerResult<()> {
        if self.is_running() {
            return Err(SchedulerError::AlreadyRunning);
        }

        info!(
            list_interval_ms = self.config.list_interval.as_millis() as u64,
            names_interval_ms = self.config.names_interval.as_millis() as u64,
            "Starting metrics poller"
        );

        // Fresh token so the poller can be restarted after `stop`.
        self.cancellation_token = CancellationToken::new();

        let context = PollContext {
            store: self.store.clone(),
            nodes: self.nodes.clone(),
            counters: Arc::clone(&self.counters),
        };
        let config = self.config.clone();
        let cancel = self.cancellation_token.clone();

        let handle = tokio::spawn(async move {
            Self::poll_loop(context, config, cancel).await;
        });

        *self.task_handle.lock().await = Some(handle);
        Ok(())
    }

    /// Cancel the loop and wait for it to finish.
    ///
    /// An outstanding fetch round is not aborted; it completes on its own
    /// task and still updates the store.
    ///
    /// # Errors
    ///
    /// `NotRunning` if the loop is not active, `Timeout` if it does not wind
    /// down within `stop_timeout`.
    #[instrument(skip(self))]
    pub async fn stop(&mut self) -> SchedulerResult<()> {
        if !self.is_running() {
            return Err(SchedulerError::NotRunning);
        }

        info!("Stopping metrics poller");
        self.cancellation_token.cancel();

        if let Some(handle) = self.task_handle.lock().await.take() {
            let stop_timeout = self.config.stop_timeout;
            match tokio::time::timeout(stop_timeout, handle).await {
                Ok(Ok(())) => {}
                Ok(Err(err)) => return Err(SchedulerError::TaskJoinFailed(err.to_string())),
                Err(_) => return Err(SchedulerError::Timeout { seconds: stop_timeout.as_secs() }),
            }
        }

        info!(stats = ?self.stats(), "Metrics poller stopped");
        Ok(())
    }

    /// Whether the loop task is alive.
    pub fn is_running(&self) -> bool {
        self.task_handle
            .try_lock()
            .ok()
            .and_then(|guard| guard.as_ref().map(|h| !h.is_finished()))
            .unwrap_or(false)
    }

    /// Tick and failure counts accumulated across every run.
    pub fn stats(&self) -> PollerStats {
        self.counters.snapshot()
    }

    async fn poll_loop(context: PollContext, config: MetricsPollerConfig, cancel: CancellationToken) {
        let context = &context;
        let list_loop = Self::run_schedule("list", config.list_interval, &cancel, move || {
            Self::poll_list(context)
        });
        let names_loop = Self::run_schedule("names", config.names_interval, &cancel, move || {
            Self::poll_names(context)
        });

        tokio::join!(list_loop, names_loop);
        debug!("Poll loop cancelled");
    }

    /// Run `round` on every tick of `period` until `cancel` fires.
    ///
    /// The next tick is only awaited once the current round is done, so a
    /// schedule never overlaps itself.
    async fn run_schedule<F, Fut>(
        schedule: &'static str,
        period: Duration,
        cancel: &CancellationToken,
        mut round: F,
    ) where
        F: FnMut() -> Fut,
        Fut: Future<Output = ()>,
    {
        let mut ticks = ticker(period);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = ticks.tick() => {
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        () = round() => {}
                    }
                }
            }
        }

        debug!(schedule, "Poll schedule stopped");
    }

    async fn poll_list(context: &PollContext) {
        context.counters.list_ticks.fetch_add(1, Ordering::Relaxed);

        match context.store.list().await {
            Ok(Some(metrics)) => debug!(nodes = metrics.len(), "Metrics poll completed"),
            Ok(None) => debug!("Metrics poll skipped, no session"),
            Err(err) => {
                context.counters.list_failures.fetch_add(1, Ordering::Relaxed);
                warn!(error = %err, "Metrics poll failed, retrying on next tick");
            }
        }
    }

    async fn poll_names(context: &PollContext) {
        context.counters.names_ticks.fetch_add(1, Ordering::Relaxed);
        let mut failed = false;

        if let Some(nodes) = &context.nodes {
            match nodes.refresh(&context.store).await {
                Ok(count) => debug!(count, "Node list refreshed"),
                Err(err) => {
                    failed = true;
                    warn!(
                        error = %err,
                        category = ?err.category(),
                        retryable = err.should_retry(),
                        "Node list refresh failed, keeping previous nodes"
                    );
                }
            }
        }

        match context.store.names().await {
            Ok(Some(names)) => failed |= !names.errors.is_empty(),
            Ok(None) => {}
            Err(err) => {
                failed = true;
                warn!(error = %err, "Metric names poll failed");
            }
        }

        if failed {
            context.counters.names_failures.fetch_add(1, Ordering::Relaxed);
        }
    }
}

fn ticker(period: Duration) -> Interval {
    let mut ticker = interval(period.max(MIN_INTERVAL));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}

impl Drop for MetricsPoller {
    fn drop(&mut self) {
        if self.is_running() {
            warn!("MetricsPoller dropped while running; cancelling");
            self.cancellation_token.cancel();
        }
    }
}
