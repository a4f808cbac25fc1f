//! # Campus Sync Client
//!
//! Client side of the campus sync layer.
//!
//! - [`Loader`] builds a [`Session`] from the sync server, or from local
//!   files when the server cannot be used.
//! - [`Writer`] sends single-line writes to the sync server.
//! - [`NotificationClient`] posts and receives announcements, submits and
//!   queries deadlines, and uploads course files.
//!
//! ## Example
//!
//! ```no_run
//! use campus_sync_client::{ClientConfig, LoadSource, Loader};
//!
//! # async fn load() {
//! let mut loader = Loader::new(ClientConfig::new("."));
//! let session = loader.reload_all().await;
//! if session.source == LoadSource::Local {
//!     println!("server unavailable, showing local data");
//! }
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
mod loader;
mod notify;
mod writer;

pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
pub use loader::{LoadSource, LoadState, Loader, Session};
pub use notify::NotificationClient;
pub use writer::Writer;
