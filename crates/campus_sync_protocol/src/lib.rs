//! # Campus Sync Protocol
//!
//! Request model and transport for the campus sync servers.
//!
//! ## Message flow
//!
//! Sync channel (default `127.0.0.1:55555`):
//!
//! ```text
//! Client                          Server
//!   |                               |
//!   |-------- FetchAll ------------>|
//!   |<------- StudentCollection ----|
//!   |<------- TeacherCollection ----|
//!   |<------- CourseCollection -----|
//!   |                               |
//!   |-------- WriteLine ----------->|   (no reply)
//! ```
//!
//! Notification channel (default `127.0.0.1:44444`):
//!
//! ```text
//!   |-------- Announcement -------->|   broadcast to every client
//!   |-------- Deadline ------------>|
//!   |<------- Ack(Saved) -----------|   sender only
//!   |-------- DeadlineQuery ------->|
//!   |<------- DeadlineList ---------|   sender only
//!   |-------- FileUpload ---------->|   (no reply)
//! ```
//!
//! Every message is a single length-prefixed CBOR frame; see
//! [`campus_codec`].

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod connection;
mod error;
mod messages;

pub use connection::{read_frame, write_message, Connection, ConnectionReader, ConnectionWriter};
pub use error::{ProtocolError, ProtocolResult};
pub use messages::{AckStatus, WireMessage};

/// Default sync server address.
pub const DEFAULT_SYNC_ADDR: &str = "127.0.0.1:55555";
/// Default notification server address.
pub const DEFAULT_NOTIFY_ADDR: &str = "127.0.0.1:44444";
