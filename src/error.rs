//! Error types for shelf.

use thiserror::Error;

/// Common error type for shelf operations.
///
/// Every variant carries the message that is returned verbatim to the
/// client in a failure payload. No variant exposes server-side paths
/// beyond what the client supplied.
#[derive(Error, Debug)]
pub enum ShelfError {
    /// A client path resolved outside the configured root.
    #[error("{0}")]
    PathRejected(String),

    /// Target of an operation does not exist.
    #[error("{0} not found")]
    NotFound(String),

    /// Uploaded file is missing, empty, or has a disallowed extension.
    #[error("{0}")]
    InvalidUpload(String),

    /// Destination of mkdir/move/rename already exists.
    #[error("{0}")]
    AlreadyExists(String),

    /// I/O error from the underlying filesystem.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Result type alias for shelf operations.
pub type Result<T> = std::result::Result<T, ShelfError>;
