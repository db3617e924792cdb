//! Conversions from external infrastructure errors into domain errors.

use clusterwatch_domain::ClusterWatchError;
use reqwest::Error as HttpError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub ClusterWatchError);

impl From<InfraError> for ClusterWatchError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<ClusterWatchError> for InfraError {
    fn from(value: ClusterWatchError) -> Self {
        InfraError(value)
    }
}

trait IntoClusterWatchError {
    fn into_clusterwatch(self) -> ClusterWatchError;
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → ClusterWatchError */
/* -------------------------------------------------------------------------- */

impl IntoClusterWatchError for HttpError {
    fn into_clusterwatch(self) -> ClusterWatchError {
        if self.is_timeout() {
            return ClusterWatchError::Network("HTTP request timed out".into());
        }

        if self.is_connect() {
            return ClusterWatchError::Network("HTTP connection failure".into());
        }

        if self.is_decode() {
            return ClusterWatchError::Decode(format!("invalid HTTP response body: {self}"));
        }

        if let Some(status) = self.status() {
            let code = status.as_u16();
            let message =
                format!("HTTP {} {}", code, status.canonical_reason().unwrap_or("unknown status"));

            return match code {
                401 | 403 => ClusterWatchError::Auth(message),
                404 => ClusterWatchError::NotFound(message),
                400..=499 => ClusterWatchError::InvalidInput(message),
                _ => ClusterWatchError::Network(message),
            };
        }

        if self.is_builder() {
            return ClusterWatchError::Config(format!("invalid HTTP request: {self}"));
        }

        ClusterWatchError::Network(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(value.into_clusterwatch())
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
