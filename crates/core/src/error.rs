//! Error taxonomy shared by the orchestrator and the reconciler.

use thiserror::Error;

use crate::backend::ApiError;
use crate::batch::BatchError;

/// Errors surfaced by dashboard operations.
///
/// Unknown identifiers in progress events are not errors; the tracker
/// ignores them.
#[derive(Debug, Error)]
pub enum DashboardError {
    /// Input did not pass validation (e.g. malformed calendar date).
    #[error("validation failed: {0}")]
    Validation(String),

    /// A batch is already in flight, locally or on the backend.
    #[error("download already running: {0}")]
    AlreadyRunning(String),

    /// No eligible items were left after filtering.
    #[error("no unsaved facilities to download")]
    EmptyBatch,

    /// The backend could not be reached.
    #[error("network error: {0}")]
    Network(String),

    /// The backend answered with a failure.
    #[error("server error{}: {message}", .status.map(|s| format!(" (HTTP {s})")).unwrap_or_default())]
    Server {
        status: Option<u16>,
        message: String,
    },
}

impl DashboardError {
    /// Text shown to the operator in a notice.
    pub fn user_message(&self) -> String {
        match self {
            DashboardError::Validation(msg) => format!("Invalid input: {}", msg),
            DashboardError::AlreadyRunning(msg) => msg.clone(),
            DashboardError::EmptyBatch => {
                "All facilities for this date are already saved. Nothing to download.".to_string()
            }
            DashboardError::Network(msg) => {
                format!("Could not reach the server: {}", msg)
            }
            DashboardError::Server {
                status: Some(status),
                message,
            } => format!("Server error (HTTP {}): {}", status, message),
            DashboardError::Server {
                status: None,
                message,
            } => format!("Server reported a failure: {}", message),
        }
    }

    /// Short label used for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            DashboardError::Validation(_) => "validation",
            DashboardError::AlreadyRunning(_) => "already_running",
            DashboardError::EmptyBatch => "empty",
            DashboardError::Network(_) => "network",
            DashboardError::Server { .. } => "server",
        }
    }
}

impl From<ApiError> for DashboardError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::ConnectionFailed(msg) => DashboardError::Network(msg),
            ApiError::Timeout => DashboardError::Network("request timed out".to_string()),
            ApiError::Http { status, message } => DashboardError::Server {
                status: Some(status),
                message,
            },
            ApiError::InvalidResponse(msg) => DashboardError::Server {
                status: None,
                message: format!("invalid response: {}", msg),
            },
            ApiError::Rejected(message) => DashboardError::Server {
                status: None,
                message,
            },
        }
    }
}

impl From<BatchError> for DashboardError {
    fn from(err: BatchError) -> Self {
        match err {
            BatchError::EmptyBatch => DashboardError::EmptyBatch,
            BatchError::Busy(state) => DashboardError::AlreadyRunning(format!(
                "A download batch is already {}",
                state.replace('_', " ")
            )),
            other @ BatchError::InvalidTransition { .. } => {
                DashboardError::Validation(other.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DashboardError::Validation("bad date".to_string());
        assert_eq!(err.to_string(), "validation failed: bad date");

        let err = DashboardError::Server {
            status: Some(500),
            message: "boom".to_string(),
        };
        assert_eq!(err.to_string(), "server error (HTTP 500): boom");

        let err = DashboardError::Server {
            status: None,
            message: "nope".to_string(),
        };
        assert_eq!(err.to_string(), "server error: nope");
    }

    #[test]
    fn test_api_error_conversion() {
        let err: DashboardError = ApiError::Timeout.into();
        assert!(matches!(err, DashboardError::Network(_)));

        let err: DashboardError = ApiError::Http {
            status: 502,
            message: "bad gateway".to_string(),
        }
        .into();
        assert!(matches!(
            err,
            DashboardError::Server {
                status: Some(502),
                ..
            }
        ));
    }

    #[test]
    fn test_user_message_distinguishes_causes() {
        let network = DashboardError::Network("connection refused".to_string());
        assert!(network.user_message().contains("Could not reach the server"));

        let server = DashboardError::Server {
            status: Some(500),
            message: "An unexpected error occurred.".to_string(),
        };
        assert!(server.user_message().contains("HTTP 500"));

        assert_eq!(DashboardError::EmptyBatch.kind(), "empty");
    }

    #[test]
    fn test_batch_error_conversion() {
        let err: DashboardError = BatchError::Busy("in_flight").into();
        assert_eq!(
            err.to_string(),
            "download already running: A download batch is already in flight"
        );
        let err: DashboardError = BatchError::EmptyBatch.into();
        assert!(matches!(err, DashboardError::EmptyBatch));
    }
}
