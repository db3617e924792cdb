//! Configuration loader
//!
//! ## Loading Strategy
//! 1. The first config file found by [`probe_config_paths`] is the base
//! 2. `CLUSTERWATCH_*` variables override individual settings on top of it
//! 3. Without a file, the environment alone must supply the base URL
//!
//! ## Environment Variables
//! - `CLUSTERWATCH_BASE_URL`: API base URL (required when no file is found)
//! - `CLUSTERWATCH_TIMEOUT_SECONDS`: per-request timeout
//! - `CLUSTERWATCH_LIST_INTERVAL`: seconds between metrics polls
//! - `CLUSTERWATCH_NAMES_INTERVAL`: seconds between metric-name polls
//! - `CLUSTERWATCH_POLLING_ENABLED`: `true`/`false`
//! - `CLUSTERWATCH_NAMESPACE`: namespace listed by names polls
//! - `CLUSTERWATCH_TOKEN`: access token, read separately by [`token_from_env`]
//!
//! Watch lists are only read from files; the environment never clears them.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use clusterwatch_domain::{
    ClusterWatchError, Config, PollingConfig, Result, ServerConfig, WatchConfig,
};

const BASE_URL_KEY: &str = "CLUSTERWATCH_BASE_URL";
const CONFIG_FILE_STEMS: [&str; 2] = ["config", "clusterwatch"];
const CONFIG_FILE_EXTENSIONS: [&str; 2] = ["json", "toml"];

/// Load the probed config file with environment overrides applied.
///
/// # Errors
/// Returns `ClusterWatchError::Config` if the file is invalid, an
/// environment value does not parse, or no base URL is configured anywhere.
pub fn load() -> Result<Config> {
    load_layered(probe_config_paths())
}

fn load_layered(file: Option<PathBuf>) -> Result<Config> {
    match file {
        Some(path) => {
            let config = apply_env_overrides(load_from_file(Some(path))?)?;
            tracing::info!("Configuration loaded from file with environment overrides");
            Ok(config)
        }
        None => {
            let config = load_from_env().map_err(|e| match e {
                ClusterWatchError::Config(msg) if env_var(BASE_URL_KEY).is_err() => {
                    ClusterWatchError::Config(format!("No config file found and {msg}"))
                }
                other => other,
            })?;
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
    }
}

/// Load configuration from `CLUSTERWATCH_*` variables alone.
///
/// Only the base URL is required; everything else falls back to the
/// defaults. The watch list stays empty.
///
/// # Errors
/// Returns `ClusterWatchError::Config` if the base URL is missing or a value
/// does not parse.
pub fn load_from_env() -> Result<Config> {
    let base = Config {
        server: ServerConfig::new(env_var(BASE_URL_KEY)?),
        polling: PollingConfig::default(),
        watch: WatchConfig::default(),
    };
    apply_env_overrides(base)
}

/// Override settings of `config` with every `CLUSTERWATCH_*` variable that
/// is set. Unset variables leave the current value alone.
///
/// # Errors
/// Returns `ClusterWatchError::Config` naming the variable that does not
/// parse.
pub fn apply_env_overrides(mut config: Config) -> Result<Config> {
    if let Some(base_url) = env_non_blank(BASE_URL_KEY) {
        config.server.base_url = base_url;
    }
    if let Some(timeout) = env_parse::<u64>("CLUSTERWATCH_TIMEOUT_SECONDS", "timeout")? {
        config.server.timeout_seconds = timeout;
    }
    if let Some(seconds) = env_parse("CLUSTERWATCH_LIST_INTERVAL", "list interval")? {
        config.polling.list_interval_seconds = seconds;
    }
    if let Some(seconds) = env_parse("CLUSTERWATCH_NAMES_INTERVAL", "names interval")? {
        config.polling.names_interval_seconds = seconds;
    }
    config.polling.enabled = env_bool("CLUSTERWATCH_POLLING_ENABLED", config.polling.enabled);
    if let Some(namespace) = env_non_blank("CLUSTERWATCH_NAMESPACE") {
        config.polling.namespace = namespace;
    }

    Ok(config)
}

/// Load configuration from a file.
///
/// If `path` is `None`, probes the standard locations. JSON and TOML are
/// supported, chosen by extension.
///
/// # Errors
/// Returns `ClusterWatchError::Config` if the file is missing, unreadable or
/// invalid.
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(ClusterWatchError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            ClusterWatchError::Config("No config file found in any of the standard locations".into())
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| ClusterWatchError::Config(format!("Failed to read config file: {e}")))?;

    parse_config(&contents, &config_path)
}

fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| ClusterWatchError::Config(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| ClusterWatchError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(ClusterWatchError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// First existing config file among the standard locations.
///
/// Searched in order: the current directory and up to two parents, then the
/// executable's directory and up to two parents. In each directory
/// `config.{json,toml}` is tried before `clusterwatch.{json,toml}`.
pub fn probe_config_paths() -> Option<PathBuf> {
    let roots = [std::env::current_dir().ok(), exe_dir()];
    roots.into_iter().flatten().flat_map(|root| candidates_in(&root)).find(|path| path.exists())
}

/// Access token from `CLUSTERWATCH_TOKEN`, if set and non-blank.
pub fn token_from_env() -> Option<String> {
    env_non_blank("CLUSTERWATCH_TOKEN")
}

fn exe_dir() -> Option<PathBuf> {
    std::env::current_exe().ok()?.parent().map(Path::to_path_buf)
}

fn candidates_in(root: &Path) -> Vec<PathBuf> {
    let dirs = [root.to_path_buf(), root.join(".."), root.join("../..")];
    dirs.iter()
        .flat_map(|dir| {
            CONFIG_FILE_STEMS.iter().flat_map(move |stem| {
                CONFIG_FILE_EXTENSIONS.iter().map(move |ext| dir.join(format!("{stem}.{ext}")))
            })
        })
        .collect()
}

fn env_var(key: &str) -> Result<String> {
    env_non_blank(key).ok_or_else(|| {
        ClusterWatchError::Config(format!("Missing required environment variable: {key}"))
    })
}

fn env_non_blank(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}

/// Parse an optional numeric variable; `Ok(None)` when unset.
fn env_parse<T>(key: &str, what: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| ClusterWatchError::Config(format!("Invalid {what} in {key}: {e}"))),
        Err(_) => Ok(None),
    }
}

/// Accepts `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off`
/// (case-insensitive).
fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}
