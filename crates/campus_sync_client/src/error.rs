//! Client error types.

use campus_core::CoreError;
use campus_storage::StorageError;
use campus_sync_protocol::ProtocolError;
use thiserror::Error;

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Client errors.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Connecting or talking to a server failed.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// A domain operation failed.
    #[error("core error: {0}")]
    Core(#[from] CoreError),

    /// Local file access failed.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Reading a local file for upload failed.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// No session has been loaded yet.
    #[error("no session loaded")]
    NotLoaded,
}

impl ClientError {
    /// Returns true if the loader should fall back to local files.
    pub fn triggers_fallback(&self) -> bool {
        matches!(self, Self::Protocol(_))
    }

    /// Returns true if the server could not be reached at all.
    pub fn is_connect_failure(&self) -> bool {
        matches!(self, Self::Protocol(e) if e.is_connect_failure())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_classification() {
        assert!(ClientError::from(ProtocolError::Closed).triggers_fallback());
        let out_of_order = ProtocolError::unexpected("CourseCollection", "Ack");
        assert!(ClientError::from(out_of_order).triggers_fallback());
        assert!(!ClientError::NotLoaded.triggers_fallback());
        assert!(!ClientError::from(CoreError::UnknownStudent(1)).triggers_fallback());
    }
}
