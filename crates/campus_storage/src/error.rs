//! Error types for storage operations.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A relative path tried to escape the data root or was empty.
    #[error("invalid path: {0:?}")]
    InvalidPath(PathBuf),

    /// Replacing the target with the rewritten temp file failed.
    #[error("failed to replace {path:?}: {source}")]
    Replace {
        /// The file being rewritten.
        path: PathBuf,
        /// Underlying error.
        source: io::Error,
    },
}
