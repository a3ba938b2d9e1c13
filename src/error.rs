//! Error types for decomposition and recomposition.

use std::path::PathBuf;
use thiserror::Error;

/// Filesystem-level failures.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid path: {0}")]
    InvalidPath(String),
}

/// Errors surfaced by the codec and the command layer.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Suffix absent from the registry. Raised before any filesystem mutation.
    #[error("Metadata type {suffix} not found")]
    UnknownMetadataType { suffix: String },

    /// Composite document could not be parsed, or its root is not the expected element.
    #[error("Malformed document {}: {message}", path.display())]
    MalformedDocument { path: PathBuf, message: String },

    /// Fragment could not be read while composing.
    #[error("Unreadable fragment {}: {source}", path.display())]
    UnreadableFragment {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Storage error: {0}")]
    StorageError(#[from] StorageError),
}

impl From<config::ConfigError> for ApiError {
    fn from(err: config::ConfigError) -> Self {
        ApiError::ConfigError(err.to_string())
    }
}

impl From<std::io::Error> for ApiError {
    fn from(err: std::io::Error) -> Self {
        ApiError::StorageError(StorageError::IoError(err))
    }
}
