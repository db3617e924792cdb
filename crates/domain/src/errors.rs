//! Error types used throughout the application

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for ClusterWatch
///
/// Cloneable so that a single failed fetch can be handed to every caller that
/// joined it.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum ClusterWatchError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<serde_json::Error> for ClusterWatchError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

/// Result type alias for ClusterWatch operations
pub type Result<T> = std::result::Result<T, ClusterWatchError>;
