//! API-specific error types
//!
//! Classifies REST failures so callers can decide whether waiting for the
//! next poll is worthwhile.

use std::time::Duration;

use clusterwatch_domain::ClusterWatchError;
use reqwest::StatusCode;
use thiserror::Error;

/// Categories of API errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorCategory {
    /// 401, 403, or no session
    Authentication,
    /// 429
    RateLimit,
    /// 5xx
    Server,
    /// Other 4xx (404 included) and unparseable bodies
    Client,
    /// Connection failures and timeouts
    Network,
    /// Bad base URL or client setup
    Config,
}

/// API operation errors
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Rate limit exceeded: {0}")]
    RateLimit(String),

    #[error("Server error: {0}")]
    Server(String),

    #[error("Client error: {0}")]
    Client(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Timeout after {0:?}")]
    Timeout(Duration),
}

impl ApiError {
    /// Coarse classification used for logging and retry decisions.
    pub fn category(&self) -> ApiErrorCategory {
        match self {
            Self::Auth(_) => ApiErrorCategory::Authentication,
            Self::RateLimit(_) => ApiErrorCategory::RateLimit,
            Self::Server(_) => ApiErrorCategory::Server,
            Self::Client(_) | Self::NotFound(_) | Self::Decode(_) => ApiErrorCategory::Client,
            Self::Network(_) | Self::Timeout(_) => ApiErrorCategory::Network,
            Self::Config(_) => ApiErrorCategory::Config,
        }
    }

    /// Whether a later attempt may succeed without any change on our side.
    pub fn should_retry(&self) -> bool {
        matches!(
            self.category(),
            ApiErrorCategory::RateLimit | ApiErrorCategory::Server | ApiErrorCategory::Network
        )
    }

    /// Classify a non-success response.
    pub(crate) fn from_status(status: StatusCode, url: &str, body: &str) -> Self {
        let message = if body.is_empty() {
            format!("{url} returned status {status}")
        } else {
            format!("{url} returned status {status}: {body}")
        };

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            Self::Auth(message)
        } else if status == StatusCode::TOO_MANY_REQUESTS {
            Self::RateLimit(message)
        } else if status == StatusCode::NOT_FOUND {
            Self::NotFound(message)
        } else if status.is_server_error() {
            Self::Server(message)
        } else if status.is_client_error() {
            Self::Client(message)
        } else {
            Self::Network(message)
        }
    }
}

impl From<ClusterWatchError> for ApiError {
    fn from(err: ClusterWatchError) -> Self {
        match err {
            ClusterWatchError::Network(message) => Self::Network(message),
            ClusterWatchError::Auth(message) => Self::Auth(message),
            ClusterWatchError::Config(message) => Self::Config(message),
            ClusterWatchError::Decode(message) => Self::Decode(message),
            ClusterWatchError::NotFound(message) => Self::NotFound(message),
            ClusterWatchError::InvalidInput(message) => Self::Client(message),
            ClusterWatchError::Internal(message) => Self::Server(message),
        }
    }
}

impl From<ApiError> for ClusterWatchError {
    fn from(err: ApiError) -> Self {
        let message = err.to_string();
        match err {
            ApiError::Auth(_) => Self::Auth(message),
            ApiError::Config(_) => Self::Config(message),
            ApiError::Decode(_) => Self::Decode(message),
            ApiError::Client(_) => Self::InvalidInput(message),
            ApiError::NotFound(_) => Self::NotFound(message),
            ApiError::RateLimit(_)
            | ApiError::Server(_)
            | ApiError::Network(_)
            | ApiError::Timeout(_) => Self::Network(message),
        }
    }
}
