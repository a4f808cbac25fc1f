//! # Campus Sync Server
//!
//! Two TCP servers over one data root:
//!
//! - [`SyncServer`] answers `FetchAll` with the coordinated collections and
//!   applies `WriteLine` requests, append or upsert by file name.
//! - [`NotificationServer`] is a broadcast hub for announcements, plus
//!   deadline submission, deadline queries and file uploads.
//!
//! A failing connection is logged and dropped; it never stops the server.
//!
//! ## Example
//!
//! ```no_run
//! use campus_sync_server::{NotificationServer, ServerConfig, SyncServer};
//!
//! # async fn start() -> campus_sync_server::ServerResult<()> {
//! let config = ServerConfig::new("/srv/campus");
//! let notify = NotificationServer::bind(&config).await?;
//! let sync = SyncServer::bind(config).await?;
//! tokio::try_join!(sync.run(), notify.run())?;
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod config;
mod error;
mod handler;
mod notify;
mod server;

pub use config::{BackpressurePolicy, ServerConfig};
pub use error::{ServerError, ServerResult};
pub use handler::{HandlerContext, RequestHandler};
pub use notify::{NotificationHub, NotificationServer};
pub use server::SyncServer;
