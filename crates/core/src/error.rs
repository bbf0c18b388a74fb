//! Error types for ab-core
//!
//! Provides a unified error type that can be converted to appropriate exit codes.

use thiserror::Error;

/// Result type alias for ab-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for ab-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed S3 URI
    #[error("Invalid S3 URI: {0}")]
    InvalidUri(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Network error (retryable)
    #[error("Network error: {0}")]
    Network(String),

    /// Authentication error
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Remote listing failed mid-enumeration; entries already yielded stand
    #[error("Enumeration failed: {0}")]
    Enumeration(String),

    /// Effort analysis precondition failure (missing job, empty results,
    /// identity lookup unavailable)
    #[error("Aggregation failed: {0}")]
    Aggregation(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// General error
    #[error("{0}")]
    General(String),
}

impl Error {
    /// Get the appropriate exit code for this error
    pub const fn exit_code(&self) -> i32 {
        match self {
            Error::InvalidUri(_) => 2,                      // UsageError
            Error::Network(_) | Error::Enumeration(_) => 3,   // NetworkError
            Error::Auth(_) => 4,                              // AuthError
            Error::NotFound(_) => 5,                          // NotFound
            _ => 1,                                           // GeneralError
        }
    }
}
