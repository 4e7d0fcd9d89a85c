use std::error::Error;

use serde::Serialize;

/// Base trait for all application errors
pub trait StatdeckError: Error + Send + Sync + 'static {
    /// Error code for programmatic handling
    fn error_code(&self) -> &'static str;

    /// Whether this error should be logged as an error or warning
    fn is_user_error(&self) -> bool {
        false
    }
}

/// Common result type for the application
pub type StatdeckResult<T> = Result<T, Box<dyn StatdeckError>>;

/// Failures surfaced by the refresh controller.
///
/// Fetch failures are recorded in resource state rather than returned, so
/// this type is `Clone` and serializable for the snapshot.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DashboardError {
    /// Network or HTTP failure of a single resource read.
    #[error("{message}")]
    TransportError { message: String },

    /// Both the rich resource and its degraded fallback failed.
    #[error("{rich} (fallback also failed: {degraded})")]
    DegradedUnavailable { rich: String, degraded: String },

    /// A cache-clear or metric-reset action was rejected.
    #[error("{action} failed: {message}")]
    MutationFailed { action: String, message: String },

    #[error("refresh interval must be at least {min_ms}ms (got {got_ms}ms)")]
    InvalidInterval { got_ms: u64, min_ms: u64 },

    #[error("unknown resource '{name}'")]
    UnknownResource { name: String },

    #[error("unknown mutation '{name}'")]
    UnknownMutation { name: String },
}

impl StatdeckError for DashboardError {
    fn error_code(&self) -> &'static str {
        match self {
            DashboardError::TransportError { .. } => "TRANSPORT_ERROR",
            DashboardError::DegradedUnavailable { .. } => "DEGRADED_UNAVAILABLE",
            DashboardError::MutationFailed { .. } => "MUTATION_FAILED",
            DashboardError::InvalidInterval { .. } => "INVALID_INTERVAL",
            DashboardError::UnknownResource { .. } => "UNKNOWN_RESOURCE",
            DashboardError::UnknownMutation { .. } => "UNKNOWN_MUTATION",
        }
    }

    fn is_user_error(&self) -> bool {
        matches!(
            self,
            DashboardError::InvalidInterval { .. }
                | DashboardError::UnknownResource { .. }
                | DashboardError::UnknownMutation { .. }
        )
    }
}

impl StatdeckError for statdeck_config::ConfigError {
    fn error_code(&self) -> &'static str {
        match self {
            statdeck_config::ConfigError::ConfigParseError { .. } => "CONFIG_PARSE_ERROR",
            statdeck_config::ConfigError::InvalidConfiguration { .. } => "INVALID_CONFIGURATION",
            statdeck_config::ConfigError::IoError { .. } => "CONFIG_IO_ERROR",
        }
    }

    fn is_user_error(&self) -> bool {
        matches!(
            self,
            statdeck_config::ConfigError::ConfigParseError { .. }
                | statdeck_config::ConfigError::InvalidConfiguration { .. }
        )
    }
}
