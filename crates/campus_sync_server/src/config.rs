//! Server configuration.

use campus_codec::DEFAULT_MAX_FRAME_LEN;
use campus_storage::DEFAULT_UPSERT_FILES;
use std::net::SocketAddr;
use std::path::PathBuf;

/// What a connection's reader does when its request queue is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackpressurePolicy {
    /// Stop reading until the writer catches up.
    #[default]
    Block,
    /// Drop the request and log it.
    Reject,
}

/// Configuration for the sync and notification servers.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Sync server address.
    pub bind_addr: SocketAddr,
    /// Notification server address.
    pub notify_addr: SocketAddr,
    /// Directory holding `database/` and `uploaded_files/`.
    pub data_root: PathBuf,
    /// Requests buffered per connection between reader and writer.
    pub queue_depth: usize,
    /// Behaviour when the queue is full.
    pub backpressure: BackpressurePolicy,
    /// File names written with upsert-by-key, compared case-insensitively.
    pub upsert_files: Vec<String>,
    /// Largest accepted frame payload.
    pub max_frame_len: usize,
}

impl ServerConfig {
    /// Creates a configuration serving `data_root` on the default ports.
    pub fn new(data_root: impl Into<PathBuf>) -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 55555)),
            notify_addr: SocketAddr::from(([127, 0, 0, 1], 44444)),
            data_root: data_root.into(),
            queue_depth: 256,
            backpressure: BackpressurePolicy::Block,
            upsert_files: DEFAULT_UPSERT_FILES.iter().map(|s| s.to_string()).collect(),
            max_frame_len: DEFAULT_MAX_FRAME_LEN,
        }
    }

    /// Sets the sync server address.
    pub fn with_bind_addr(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = addr;
        self
    }

    /// Sets the notification server address.
    pub fn with_notify_addr(mut self, addr: SocketAddr) -> Self {
        self.notify_addr = addr;
        self
    }

    /// Sets the per-connection queue depth. Zero is raised to one.
    pub fn with_queue_depth(mut self, depth: usize) -> Self {
        self.queue_depth = depth.max(1);
        self
    }

    /// Sets the backpressure policy.
    pub fn with_backpressure(mut self, policy: BackpressurePolicy) -> Self {
        self.backpressure = policy;
        self
    }

    /// Replaces the list of upsert files.
    pub fn with_upsert_files<I, S>(mut self, files: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.upsert_files = files.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the frame size limit.
    pub fn with_max_frame_len(mut self, len: usize) -> Self {
        self.max_frame_len = len;
        self
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new(".")
    }
}
