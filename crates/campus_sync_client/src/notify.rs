//! Client side of the notification channel.

use crate::error::ClientResult;
use bytes::Bytes;
use campus_core::{Announcement, Deadline};
use campus_sync_protocol::{AckStatus, Connection, ProtocolError, WireMessage};
use std::collections::VecDeque;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// A long-lived connection to the notification server.
///
/// Broadcast announcements can arrive between a request and its reply.
/// They are queued and handed out by [`NotificationClient::next_announcement`].
#[derive(Debug)]
pub struct NotificationClient {
    conn: Connection,
    pending: VecDeque<Announcement>,
}

impl NotificationClient {
    /// Connects to the notification server.
    ///
    /// # Errors
    ///
    /// Returns an error if the server is unreachable.
    pub async fn connect(addr: SocketAddr, timeout: Option<Duration>) -> ClientResult<Self> {
        Ok(Self {
            conn: Connection::connect(addr, timeout).await?,
            pending: VecDeque::new(),
        })
    }

    /// Posts an announcement to every connected client, this one included.
    pub async fn announce(&mut self, announcement: &Announcement) -> ClientResult<()> {
        self.conn
            .send(&WireMessage::announcement(announcement.to_line()))
            .await?;
        Ok(())
    }

    /// Submits a deadline and waits for the server's acknowledgement.
    pub async fn save_deadline(&mut self, deadline: &Deadline) -> ClientResult<AckStatus> {
        self.conn.send(&WireMessage::Deadline(deadline.clone())).await?;
        match self.reply("Ack").await? {
            WireMessage::Ack(status) => Ok(status),
            other => Err(ProtocolError::unexpected("Ack", other.name()).into()),
        }
    }

    /// Fetches the deadlines recorded for a course.
    pub async fn deadlines_for(&mut self, course_id: &str) -> ClientResult<Vec<Deadline>> {
        self.conn
            .send(&WireMessage::DeadlineQuery {
                course_id: course_id.to_string(),
            })
            .await?;
        match self.reply("DeadlineList").await? {
            WireMessage::DeadlineList(list) => Ok(list),
            other => Err(ProtocolError::unexpected("DeadlineList", other.name()).into()),
        }
    }

    /// Uploads file contents for a course. No reply is sent.
    pub async fn upload(
        &mut self,
        course_id: &str,
        file_name: &str,
        bytes: Bytes,
    ) -> ClientResult<()> {
        self.conn
            .send(&WireMessage::FileUpload {
                course_id: course_id.to_string(),
                file_name: file_name.to_string(),
                bytes,
            })
            .await?;
        Ok(())
    }

    /// Reads a local file and uploads it under its own name.
    pub async fn upload_file(&mut self, course_id: &str, path: &Path) -> ClientResult<()> {
        let bytes = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.upload(course_id, &name, Bytes::from(bytes)).await
    }

    /// Waits for the next announcement. `None` means the server closed.
    pub async fn next_announcement(&mut self) -> ClientResult<Option<Announcement>> {
        if let Some(queued) = self.pending.pop_front() {
            return Ok(Some(queued));
        }
        loop {
            match self.conn.receive().await? {
                None => return Ok(None),
                Some(WireMessage::Announcement { text }) => {
                    if let Some(announcement) = Announcement::parse(&text) {
                        return Ok(Some(announcement));
                    }
                    debug!(%text, "ignoring unparsable announcement");
                }
                Some(other) => {
                    return Err(ProtocolError::unexpected("Announcement", other.name()).into())
                }
            }
        }
    }

    /// Closes the connection.
    pub async fn close(self) -> ClientResult<()> {
        self.conn.close().await?;
        Ok(())
    }

    // Reads until a non-announcement arrives, queueing announcements.
    async fn reply(&mut self, expected: &'static str) -> ClientResult<WireMessage> {
        loop {
            match self.conn.receive().await? {
                None => return Err(ProtocolError::Closed.into()),
                Some(WireMessage::Announcement { text }) => match Announcement::parse(&text) {
                    Some(announcement) => self.pending.push_back(announcement),
                    None => debug!(%text, expected, "ignoring unparsable announcement"),
                },
                Some(message) => return Ok(message),
            }
        }
    }
}
