//! Transfer Error Types
//!
//! Structured error handling for backend transfer operations.
//! Maps HTTP status codes to specific error variants for diagnosability.

use std::io;

/// Transfer backend error types
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("access denied: {0}")]
    Denied(String),

    #[error("rate limited: {0}")]
    RateLimited(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("server error ({0}): {1}")]
    Server(u16, String),

    #[error("request timeout")]
    Timeout,

    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
}

impl TransferError {
    /// Create a TransferError from an HTTP status code and response body
    pub fn from_status(status: u16, body: &str) -> Self {
        match status {
            401 | 403 => TransferError::Denied(body.to_string()),
            404 => TransferError::NotFound(body.to_string()),
            408 => TransferError::Timeout,
            429 => TransferError::RateLimited(body.to_string()),
            500..=599 => TransferError::Server(status, body.to_string()),
            _ => TransferError::Network(format!("HTTP {}: {}", status, body)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_map_to_variants() {
        assert!(matches!(
            TransferError::from_status(404, "gone"),
            TransferError::NotFound(_)
        ));
        assert!(matches!(
            TransferError::from_status(403, "no"),
            TransferError::Denied(_)
        ));
        assert!(matches!(
            TransferError::from_status(503, "busy"),
            TransferError::Server(503, _)
        ));
        assert!(matches!(
            TransferError::from_status(418, "teapot"),
            TransferError::Network(_)
        ));
    }
}
