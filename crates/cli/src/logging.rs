//! Tracing subscriber setup

use tracing_subscriber::EnvFilter;

/// Install the global subscriber.
///
/// `RUST_LOG` selects levels (default `info`); `CLUSTERWATCH_LOG_FORMAT=json`
/// switches to one JSON object per line.
pub fn init() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(env_filter).with_target(false);

    if json_requested(std::env::var("CLUSTERWATCH_LOG_FORMAT").ok().as_deref()) {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn json_requested(format: Option<&str>) -> bool {
    format.is_some_and(|f| f.trim().eq_ignore_ascii_case("json"))
}
