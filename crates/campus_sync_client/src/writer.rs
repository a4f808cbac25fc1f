//! Fire-and-forget writes to the sync server.

use crate::config::ClientConfig;
use crate::error::ClientResult;
use campus_core::{CoreError, CoreResult, LineSink};
use campus_sync_protocol::{Connection, WireMessage};
use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;
use tracing::debug;

/// Sends `WriteLine` requests, one connection per write.
///
/// The server sends no acknowledgement. `Ok` means the request was
/// flushed to the socket, not that it was persisted. There is no local
/// fallback: a write while the server is down fails.
#[derive(Debug, Clone)]
pub struct Writer {
    server_addr: SocketAddr,
    connect_timeout: Option<Duration>,
}

impl Writer {
    /// Creates a writer for the configured sync server.
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            server_addr: config.server_addr,
            connect_timeout: config.connect_timeout,
        }
    }

    /// Sends one line for `path` (relative to the server's data root).
    ///
    /// # Errors
    ///
    /// Returns an error if the server is unreachable or the send fails.
    pub async fn write_line(&self, path: &str, line: &str) -> ClientResult<()> {
        self.send(path, line).await
    }

    async fn send(&self, path: &str, line: &str) -> ClientResult<()> {
        let mut conn = Connection::connect(self.server_addr, self.connect_timeout).await?;
        conn.send(&WireMessage::write_line(path, line)).await?;
        conn.close().await?;
        debug!(%path, "write sent");
        Ok(())
    }
}

impl LineSink for Writer {
    fn write_line(&self, path: &str, line: &str) -> impl Future<Output = CoreResult<()>> + Send {
        async move { self.send(path, line).await.map_err(CoreError::sink) }
    }
}
