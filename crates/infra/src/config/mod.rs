//! Configuration loading
//!
//! Loads [`clusterwatch_domain::Config`] from a file, with environment
//! variables layered on top.

pub mod loader;

pub use loader::{
    apply_env_overrides, load, load_from_env, load_from_file, probe_config_paths, token_from_env,
};
