use std::time::Duration;

use thiserror::Error;

use crate::ec2::{ApiError, ApiErrorKind};

#[derive(Error, Debug)]
pub enum Error {
    #[error("SerializationError: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("EC2 {operation} failed: {source}")]
    Api {
        operation: &'static str,
        #[source]
        source: ApiError,
    },

    #[error("Invalid desired {kind}: {message}")]
    InvalidDesiredState { kind: &'static str, message: String },

    #[error("Terminal error: {0}")]
    Terminal(String),

    #[error("Resource is not ready to be modified: {message}")]
    Requeue {
        message: String,
        requeue_after: Duration,
    },

    #[error("Resource status is missing {0}")]
    MissingIdentifier(&'static str),

    #[error("Resource does not exist in EC2")]
    NotFound,

    #[error("Reconciliation was cancelled")]
    Cancelled,

    #[error("EC2 {operation} did not complete within {after:?}")]
    DeadlineExceeded {
        operation: &'static str,
        after: Duration,
    },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
    pub fn metric_label(&self) -> &'static str {
        match self {
            Error::SerializationError(_) => "SerializationError",
            Error::Api { .. } => "ApiError",
            Error::InvalidDesiredState { .. } => "InvalidDesiredState",
            Error::Terminal(_) => "Terminal",
            Error::Requeue { .. } => "Requeue",
            Error::MissingIdentifier(_) => "MissingIdentifier",
            Error::NotFound => "NotFound",
            Error::Cancelled => "Cancelled",
            Error::DeadlineExceeded { .. } => "DeadlineExceeded",
        }
    }

    /// Errors that no amount of retrying will fix until the desired state changes.
    pub fn is_terminal(&self) -> bool {
        match self {
            Error::InvalidDesiredState { .. }
            | Error::Terminal(_)
            | Error::MissingIdentifier(_)
            | Error::SerializationError(_) => true,
            Error::Api { source, .. } => source.kind() == ApiErrorKind::Terminal,
            Error::Requeue { .. }
            | Error::NotFound
            | Error::Cancelled
            | Error::DeadlineExceeded { .. } => false,
        }
    }

    /// Delay before the next reconciliation pass, or `None` when the resource
    /// should wait for a change to its desired state.
    pub fn requeue_after(&self, config: &Config) -> Option<Duration> {
        match self {
            Error::Requeue { requeue_after, .. } => Some(*requeue_after),
            e if e.is_terminal() => None,
            _ => Some(config.error_requeue),
        }
    }

    pub(crate) fn api(operation: &'static str) -> impl FnOnce(ApiError) -> Error {
        move |source| Error::Api { operation, source }
    }

    pub(crate) fn invalid(kind: &'static str, message: impl Into<String>) -> Error {
        Error::InvalidDesiredState {
            kind,
            message: message.into(),
        }
    }
}

/// Tunables shared by every resource manager
pub mod config;
pub use config::Config;

/// Per-kind resource managers
pub mod controllers;

/// EC2 client seams
pub mod ec2;

/// Log and trace integrations
pub mod telemetry;

/// Metrics
mod metrics;
pub use metrics::{Metrics, MetricsRecorder, OpType};

/// Offline delta planning used by the CLI
pub mod plan;

/// Generic desired-vs-latest collection reconciliation
pub mod reconcilers;

/// Resource representations
pub mod resources;
