//! Protocol error types.

use campus_codec::CodecError;
use std::io;
use thiserror::Error;

/// Result type for protocol operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;

/// Errors raised while talking to a peer.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The peer could not be reached.
    #[error("failed to connect to {addr}: {source}")]
    ConnectFailure {
        /// Address that was dialed.
        addr: String,
        /// Underlying error.
        #[source]
        source: io::Error,
    },

    /// Connecting took longer than the configured timeout.
    #[error("timed out connecting to {addr}")]
    ConnectTimeout {
        /// Address that was dialed.
        addr: String,
    },

    /// A frame or payload did not decode.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// The stream failed mid-frame or on write.
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),

    /// A message arrived that does not fit the exchange.
    #[error("unexpected message: expected {expected}, got {got}")]
    UnexpectedMessage {
        /// What the exchange required.
        expected: &'static str,
        /// What arrived.
        got: &'static str,
    },

    /// The peer closed the stream while a reply was outstanding.
    #[error("connection closed by peer")]
    Closed,
}

impl ProtocolError {
    /// Create an unexpected-message error.
    pub fn unexpected(expected: &'static str, got: &'static str) -> Self {
        Self::UnexpectedMessage { expected, got }
    }

    /// Returns true if the error means the peer went away.
    pub fn is_end_of_stream(&self) -> bool {
        match self {
            Self::Closed => true,
            Self::Io(e) => matches!(
                e.kind(),
                io::ErrorKind::UnexpectedEof
                    | io::ErrorKind::ConnectionReset
                    | io::ErrorKind::ConnectionAborted
                    | io::ErrorKind::BrokenPipe
            ),
            _ => false,
        }
    }

    /// Returns true if no connection was ever established.
    pub fn is_connect_failure(&self) -> bool {
        matches!(self, Self::ConnectFailure { .. } | Self::ConnectTimeout { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn end_of_stream_classification() {
        assert!(ProtocolError::Closed.is_end_of_stream());
        assert!(ProtocolError::Io(io::Error::from(io::ErrorKind::BrokenPipe)).is_end_of_stream());
        assert!(!ProtocolError::unexpected("Ack", "FetchAll").is_end_of_stream());
    }

    #[test]
    fn connect_failure_display() {
        let err = ProtocolError::ConnectFailure {
            addr: "127.0.0.1:1".into(),
            source: io::Error::from(io::ErrorKind::ConnectionRefused),
        };
        assert!(err.is_connect_failure());
        assert!(err.to_string().starts_with("failed to connect to 127.0.0.1:1"));
    }
}
