//! Client configuration.

use campus_core::AdminCredentials;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Configuration for the loader, writer and notification client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Sync server address.
    pub server_addr: SocketAddr,
    /// Notification server address.
    pub notify_addr: SocketAddr,
    /// Local data root used when the server is unreachable.
    pub data_root: PathBuf,
    /// Connect timeout. `None` leaves it to the operating system.
    pub connect_timeout: Option<Duration>,
    /// Administrator login.
    pub admin: AdminCredentials,
}

impl ClientConfig {
    /// Creates a configuration with the default server addresses.
    pub fn new(data_root: impl Into<PathBuf>) -> Self {
        Self {
            server_addr: SocketAddr::from(([127, 0, 0, 1], 55555)),
            notify_addr: SocketAddr::from(([127, 0, 0, 1], 44444)),
            data_root: data_root.into(),
            connect_timeout: None,
            admin: AdminCredentials::default(),
        }
    }

    /// Sets the sync server address.
    pub fn with_server_addr(mut self, addr: SocketAddr) -> Self {
        self.server_addr = addr;
        self
    }

    /// Sets the notification server address.
    pub fn with_notify_addr(mut self, addr: SocketAddr) -> Self {
        self.notify_addr = addr;
        self
    }

    /// Sets the connect timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Sets the administrator login.
    pub fn with_admin(mut self, admin: AdminCredentials) -> Self {
        self.admin = admin;
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(".")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.server_addr.port(), 55555);
        assert_eq!(config.notify_addr.port(), 44444);
        assert!(config.connect_timeout.is_none());
        assert_eq!(config.admin.id, 707070);
    }

    #[test]
    fn config_builder() {
        let config = ClientConfig::new("/tmp/campus")
            .with_server_addr("10.0.0.2:6000".parse().unwrap())
            .with_connect_timeout(Duration::from_millis(250));
        assert_eq!(config.server_addr.port(), 6000);
        assert_eq!(config.connect_timeout, Some(Duration::from_millis(250)));
    }
}
