// Error handling module
// Defines the errors surfaced by the gateway and the remote APIs

use thiserror::Error;

use crate::auth::DecodeError;

/// Maximum length for response bodies carried in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

/// Errors that can occur while talking to the backend
#[derive(Error, Debug)]
pub enum ApiError {
    /// Request was rejected with 401 and could not be recovered by a refresh
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Any other non-success status
    #[error("Backend error: {status} - {message}")]
    Status { status: u16, message: String },

    /// Transport failure, no response was received
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Response arrived but its body was not what we expected
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Credential returned by the backend could not be decoded
    #[error("Invalid credential: {0}")]
    Credential(#[from] DecodeError),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    /// Build an error from a failed response's status and body
    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let message = truncate_body(body);
        match status.as_u16() {
            401 => ApiError::Unauthorized(message),
            code => ApiError::Status {
                status: code,
                message,
            },
        }
    }

    /// HTTP status behind this error, when there was one
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Unauthorized(_) => Some(401),
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Truncate a response body to avoid logging excessive data
fn truncate_body(body: &str) -> String {
    if body.len() <= MAX_ERROR_BODY_LENGTH {
        return body.to_string();
    }
    let mut end = MAX_ERROR_BODY_LENGTH;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
}

/// Result type alias for API operations
pub type Result<T> = std::result::Result<T, ApiError>;
