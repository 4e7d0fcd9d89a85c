use crate::errors::StatdeckError;

/// Failure of a single call against the stats service.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("request failed: {message}")]
    Request { message: String },

    #[error("invalid response body: {message}")]
    Decode { message: String },

    #[error("timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },
}

impl StatdeckError for BackendError {
    fn error_code(&self) -> &'static str {
        match self {
            BackendError::Http { .. } => "BACKEND_HTTP_ERROR",
            BackendError::Request { .. } => "BACKEND_REQUEST_FAILED",
            BackendError::Decode { .. } => "BACKEND_DECODE_ERROR",
            BackendError::Timeout { .. } => "BACKEND_TIMEOUT",
        }
    }

    fn is_user_error(&self) -> bool {
        // 401/403 mean a bad or missing access token
        matches!(self, BackendError::Http { status: 401 | 403, .. })
    }
}

impl From<reqwest::Error> for BackendError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            return BackendError::Decode {
                message: e.to_string(),
            };
        }
        if let Some(status) = e.status() {
            return BackendError::Http {
                status: status.as_u16(),
                message: e.to_string(),
            };
        }
        BackendError::Request {
            message: e.to_string(),
        }
    }
}
