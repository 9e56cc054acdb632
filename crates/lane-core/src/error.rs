//! Error types for querylane.

use thiserror::Error;

/// Result type alias using querylane's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for querylane operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation failed (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid input (malformed SQL, unsupported connector type, bad payload)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Schema introspection failed; the whole snapshot is aborted
    #[error("Introspection error: {0}")]
    Introspection(String),

    /// Artifact serialization or write failed
    #[error("Artifact error: {0}")]
    Artifact(String),

    /// Job queue error
    #[error("Job error: {0}")]
    Job(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
