//! # ClusterWatch daemon
//!
//! Polls cluster metrics from a log-management server and logs every update.
//!
//! ## Usage
//!
//! ```bash
//! CLUSTERWATCH_BASE_URL=https://graylog.example.com/api \
//! CLUSTERWATCH_TOKEN=... \
//! RUST_LOG=clusterwatch=debug \
//! clusterwatch
//! ```
//!
//! Watched metrics come from the `watch` section of a config file; the
//! variables above override that file's settings. See
//! `clusterwatch_infra::config` for lookup rules.

mod app;
mod logging;

use anyhow::Context;
use clusterwatch_infra::config;
use tracing::{info, warn};

use crate::app::{log_events, register_watches, App};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env before logging so it can set RUST_LOG
    let dotenv = dotenvy::dotenv();
    logging::init();
    match dotenv {
        Ok(path) => info!(path = %path.display(), "Loaded .env"),
        Err(e) => info!(reason = %e, "No .env loaded"),
    }

    let config = config::load().context("failed to load configuration")?;
    info!(base_url = %config.server.base_url, "ClusterWatch starting");

    let App { session: _session, store, mut poller } =
        App::build(&config, config::token_from_env()).context("failed to build client")?;

    if register_watches(&store, &config.watch) == 0 {
        warn!("No metrics watched; add a `watch` section to the config file");
    }

    let logger = tokio::spawn(log_events(store.subscribe()));

    if config.polling.enabled {
        poller.start().await?;
    } else {
        info!("Polling disabled; fetching once");
        if let Err(e) = store.list().await {
            warn!(error = %e, "Initial metrics fetch failed");
        }
    }

    tokio::signal::ctrl_c().await.context("failed to listen for shutdown signal")?;
    info!("Shutdown requested");

    if poller.is_running() {
        poller.stop().await?;
    }
    logger.abort();

    info!("ClusterWatch stopped");
    Ok(())
}
