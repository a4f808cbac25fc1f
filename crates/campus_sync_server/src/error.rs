//! Server error types.

use campus_storage::StorageError;
use campus_sync_protocol::ProtocolError;
use std::io;
use std::net::SocketAddr;
use thiserror::Error;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

/// Server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The listening socket could not be bound.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// Requested address.
        addr: SocketAddr,
        /// Underlying error.
        #[source]
        source: io::Error,
    },

    /// I/O error.
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),

    /// Transport error on a client connection.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Storage error.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// The client sent a message this server does not handle.
    #[error("unexpected request: {0}")]
    UnexpectedRequest(&'static str),

    /// An upload name reduced to nothing usable.
    #[error("invalid file name: {0:?}")]
    InvalidFileName(String),

    /// A blocking task panicked or was cancelled.
    #[error("task failed: {0}")]
    Task(String),
}

impl ServerError {
    /// Returns true if the error was caused by client input.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::UnexpectedRequest(_)
                | Self::InvalidFileName(_)
                | Self::Storage(StorageError::InvalidPath(_))
        )
    }
}

impl From<tokio::task::JoinError> for ServerError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Task(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn client_error_classification() {
        assert!(ServerError::UnexpectedRequest("Ack").is_client_error());
        let bad_path = StorageError::InvalidPath(PathBuf::from("../x"));
        assert!(ServerError::Storage(bad_path).is_client_error());
        assert!(!ServerError::Io(io::Error::from(io::ErrorKind::Other)).is_client_error());
    }
}
