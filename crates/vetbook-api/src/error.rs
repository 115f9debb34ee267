//! Clinic API error types.

/// Errors from clinic API calls.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// HTTP transport error.
    #[error("HTTP error calling {endpoint}: {source}")]
    Http {
        endpoint: String,
        source: reqwest::Error,
    },
    /// The API rejected the bearer token (401/403).
    #[error("{endpoint} rejected credentials with {status}")]
    Unauthorized { endpoint: String, status: u16 },
    /// The requested record does not exist (404).
    #[error("{endpoint} returned 404")]
    NotFound { endpoint: String },
    /// Any other non-2xx status.
    #[error("{endpoint} returned {status}: {body}")]
    Status {
        endpoint: String,
        status: u16,
        body: String,
    },
    /// Response body was not valid JSON.
    #[error("failed to deserialize response from {endpoint}: {source}")]
    Deserialization {
        endpoint: String,
        source: reqwest::Error,
    },
    /// Response JSON did not match any known envelope.
    #[error("unexpected response shape from {endpoint}: {message}")]
    Contract { endpoint: String, message: String },
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] super::config::ConfigError),
}

/// Coarse classification used by callers to pick a recovery path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Redirect to login.
    Auth,
    /// Record-specific "not found" with retry/back.
    NotFound,
    /// Generic failure with retry.
    Network,
}

impl ApiError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::Unauthorized { .. } => ErrorKind::Auth,
            ApiError::NotFound { .. } => ErrorKind::NotFound,
            ApiError::Http { .. }
            | ApiError::Status { .. }
            | ApiError::Deserialization { .. }
            | ApiError::Contract { .. }
            | ApiError::Config(_) => ErrorKind::Network,
        }
    }

    /// Map a non-success status code to an error.
    pub(crate) fn from_status(endpoint: &str, status: u16, body: String) -> Self {
        match status {
            401 | 403 => ApiError::Unauthorized {
                endpoint: endpoint.to_string(),
                status,
            },
            404 => ApiError::NotFound {
                endpoint: endpoint.to_string(),
            },
            _ => ApiError::Status {
                endpoint: endpoint.to_string(),
                status,
                body,
            },
        }
    }
}
