//! Scheduler error types

use clusterwatch_domain::ClusterWatchError;
use thiserror::Error;

use crate::errors::InfraError;

/// Scheduler-specific errors
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("Scheduler already running")]
    AlreadyRunning,

    #[error("Scheduler not running")]
    NotRunning,

    /// The background task did not finish within the stop timeout
    #[error("Operation timed out after {seconds}s")]
    Timeout { seconds: u64 },

    #[error("Task join failed: {0}")]
    TaskJoinFailed(String),
}

impl From<SchedulerError> for InfraError {
    fn from(err: SchedulerError) -> Self {
        let domain = match err {
            SchedulerError::AlreadyRunning | SchedulerError::NotRunning => {
                ClusterWatchError::InvalidInput(err.to_string())
            }
            SchedulerError::Timeout { .. } | SchedulerError::TaskJoinFailed(_) => {
                ClusterWatchError::Internal(err.to_string())
            }
        };
        InfraError(domain)
    }
}

impl From<SchedulerError> for ClusterWatchError {
    fn from(err: SchedulerError) -> Self {
        InfraError::from(err).into()
    }
}

pub type SchedulerResult<T> = Result<T, SchedulerError>;
