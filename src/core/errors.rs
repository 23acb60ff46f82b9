use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::core::types::Metric;

/// Failure of a single sampling attempt.
///
/// Everything except [`SamplerError::Fatal`] is recoverable: the sample loop
/// reports it and tries again on the next tick.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SamplerError {
    /// The metric is not supported on this platform at all.
    #[error("{metric} is not available on this platform")]
    QueryUnavailable { metric: Metric },

    /// The OS query for a metric failed or returned garbage.
    #[error("failed to query {metric}: {message}")]
    QueryFailed { metric: Metric, message: String },

    /// Unrecoverable sampler state; stops the sample loop.
    #[error("sampler failed permanently: {0}")]
    Fatal(String),
}

impl SamplerError {
    pub fn failed(metric: Metric, message: impl Into<String>) -> Self {
        SamplerError::QueryFailed {
            metric,
            message: message.into(),
        }
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, SamplerError::Fatal(_))
    }
}

/// Unified error type for the dashboard binary.
#[derive(Debug, Error)]
pub enum WatchError {
    #[error("terminal error: {0}")]
    Io(#[from] io::Error),

    #[error("cannot open log file {path}: {source}")]
    LogFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Sampler(#[from] SamplerError),
}
