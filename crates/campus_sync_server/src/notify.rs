//! The notification server: announcements, deadlines and uploads.
//!
//! Announcements are persisted and then broadcast to every client connected
//! at that moment, including the sender. There is no replay for clients
//! that connect later. Deadline submissions and queries are answered to the
//! sender only. Uploads get no reply.

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use bytes::Bytes;
use campus_core::{Deadline, UploadEntry};
use campus_storage::{safe_file_name, DataLayout, FlatFileStore};
use campus_sync_protocol::{AckStatus, Connection, ConnectionWriter, WireMessage};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::future::Future;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

type SharedWriter = Arc<Mutex<ConnectionWriter>>;

/// Registry of connected clients plus the notification record files.
#[derive(Debug)]
pub struct NotificationHub {
    store: FlatFileStore,
    layout: DataLayout,
    clients: RwLock<HashMap<u64, SharedWriter>>,
    next_id: AtomicU64,
}

impl NotificationHub {
    /// Creates a hub over `data_root`.
    pub fn new(data_root: impl Into<PathBuf>) -> Self {
        let root = data_root.into();
        Self {
            store: FlatFileStore::new(&root),
            layout: DataLayout::new(root),
            clients: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Number of connected clients.
    pub fn client_count(&self) -> usize {
        self.clients.read().len()
    }

    fn register(&self, writer: ConnectionWriter) -> (u64, SharedWriter) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let writer = Arc::new(Mutex::new(writer));
        self.clients.write().insert(id, Arc::clone(&writer));
        (id, writer)
    }

    fn unregister(&self, id: u64) {
        self.clients.write().remove(&id);
    }

    /// Persists an announcement and sends it to every connected client.
    ///
    /// Blank text is ignored. Returns the number of clients reached.
    pub async fn announce(&self, text: &str) -> usize {
        let text = text.trim();
        if text.is_empty() {
            debug!("ignoring blank announcement");
            return 0;
        }
        if let Err(e) = self.store.append_line(&self.layout.announcements(), text) {
            warn!(error = %e, "failed to persist announcement");
        }
        self.broadcast(&WireMessage::announcement(text)).await
    }

    async fn broadcast(&self, message: &WireMessage) -> usize {
        let snapshot: Vec<(u64, SharedWriter)> = self
            .clients
            .read()
            .iter()
            .map(|(id, w)| (*id, Arc::clone(w)))
            .collect();

        let mut delivered = 0;
        for (id, writer) in snapshot {
            match writer.lock().await.send(message).await {
                Ok(()) => delivered += 1,
                Err(e) => {
                    warn!(client = id, error = %e, "broadcast failed, removing client");
                    self.unregister(id);
                }
            }
        }
        debug!(delivered, "announcement broadcast");
        delivered
    }

    /// Appends a deadline row.
    pub fn save_deadline(&self, deadline: &Deadline) -> AckStatus {
        match self
            .store
            .append_line(&self.layout.deadlines(), &deadline.to_line())
        {
            Ok(()) => {
                info!(course = %deadline.course_id, task = %deadline.task_name, "deadline saved");
                AckStatus::Saved
            }
            Err(e) => {
                warn!(error = %e, "failed to save deadline");
                AckStatus::SaveFailed
            }
        }
    }

    /// Deadlines for one course, read fresh from disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the deadline file cannot be read.
    pub fn deadlines_for(&self, course_id: &str) -> ServerResult<Vec<Deadline>> {
        let lines = self.store.read_lines(&self.layout.deadlines())?;
        Ok(lines
            .iter()
            .filter(|l| !l.trim().is_empty())
            .filter_map(|l| {
                let parsed = Deadline::parse(l);
                if parsed.is_none() {
                    debug!(line = %l, "skipping malformed deadline row");
                }
                parsed
            })
            .filter(|d| d.is_for(course_id))
            .collect())
    }

    /// Stores an uploaded file under the course directory and indexes it.
    ///
    /// # Errors
    ///
    /// Fails if the name or course id is unusable, or the write fails.
    pub fn store_upload(
        &self,
        course_id: &str,
        file_name: &str,
        bytes: &[u8],
    ) -> ServerResult<PathBuf> {
        let name = safe_file_name(file_name)
            .ok_or_else(|| ServerError::InvalidFileName(file_name.to_string()))?;
        let course = safe_file_name(course_id)
            .filter(|c| *c == course_id.trim())
            .ok_or_else(|| ServerError::InvalidFileName(course_id.to_string()))?;

        let path = self.layout.upload_path(course, name);
        self.store.write_blob(&path, bytes)?;
        let entry = UploadEntry {
            course_id: course.to_string(),
            file_name: name.to_string(),
        };
        self.store
            .append_unique(&self.layout.upload_index(), &entry.to_line())?;
        info!(course, file = name, size = bytes.len(), "upload stored");
        Ok(path)
    }

    async fn handle(
        self: &Arc<Self>,
        writer: &SharedWriter,
        message: WireMessage,
    ) -> ServerResult<()> {
        match message {
            WireMessage::Announcement { text } => {
                self.announce(&text).await;
            }
            WireMessage::Deadline(deadline) => {
                let status = self.save_deadline(&deadline);
                writer.lock().await.send(&WireMessage::Ack(status)).await?;
            }
            WireMessage::DeadlineQuery { course_id } => {
                let deadlines = self.deadlines_for(&course_id).unwrap_or_else(|e| {
                    warn!(course = %course_id, error = %e, "failed to read deadlines");
                    Vec::new()
                });
                writer
                    .lock()
                    .await
                    .send(&WireMessage::DeadlineList(deadlines))
                    .await?;
            }
            WireMessage::FileUpload {
                course_id,
                file_name,
                bytes,
            } => {
                self.upload(course_id, file_name, bytes).await?;
            }
            other => return Err(ServerError::UnexpectedRequest(other.name())),
        }
        Ok(())
    }

    async fn upload(
        self: &Arc<Self>,
        course_id: String,
        file_name: String,
        bytes: Bytes,
    ) -> ServerResult<()> {
        let hub = Arc::clone(self);
        tokio::task::spawn_blocking(move || hub.store_upload(&course_id, &file_name, &bytes))
            .await??;
        Ok(())
    }
}

/// Accept loop for the notification channel.
#[derive(Debug)]
pub struct NotificationServer {
    listener: TcpListener,
    hub: Arc<NotificationHub>,
    max_frame_len: usize,
}

impl NotificationServer {
    /// Binds the configured `notify_addr`.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Bind`] if the address is unavailable.
    pub async fn bind(config: &ServerConfig) -> ServerResult<Self> {
        let addr = config.notify_addr;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind { addr, source })?;
        Ok(Self {
            listener,
            hub: Arc::new(NotificationHub::new(&config.data_root)),
            max_frame_len: config.max_frame_len,
        })
    }

    /// Address actually bound.
    pub fn local_addr(&self) -> ServerResult<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// The shared hub.
    pub fn hub(&self) -> Arc<NotificationHub> {
        Arc::clone(&self.hub)
    }

    /// Accepts clients until the process exits.
    pub async fn run(self) -> ServerResult<()> {
        self.run_until(std::future::pending()).await
    }

    /// Accepts clients until `shutdown` completes.
    pub async fn run_until(self, shutdown: impl Future<Output = ()>) -> ServerResult<()> {
        let addr = self.local_addr()?;
        info!(%addr, "notification server listening");
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                () = &mut shutdown => {
                    info!(%addr, "notification server stopping");
                    return Ok(());
                }
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        match Connection::from_stream(stream, self.max_frame_len) {
                            Ok(conn) => {
                                tokio::spawn(serve_client(Arc::clone(&self.hub), conn));
                            }
                            Err(e) => warn!(%peer, error = %e, "failed to set up connection"),
                        }
                    }
                    Err(e) => warn!(error = %e, "accept failed"),
                },
            }
        }
    }
}

async fn serve_client(hub: Arc<NotificationHub>, conn: Connection) {
    let peer = conn.peer_addr();
    let (mut reader, writer) = conn.into_split();
    let (id, writer) = hub.register(writer);
    info!(%peer, client = id, "notification client connected");

    loop {
        match reader.receive().await {
            Ok(Some(message)) => {
                let kind = message.name();
                if let Err(e) = hub.handle(&writer, message).await {
                    warn!(%peer, kind, error = %e, "notification request failed");
                    if matches!(e, ServerError::Protocol(_)) {
                        break;
                    }
                }
            }
            Ok(None) => break,
            Err(e) => {
                warn!(%peer, error = %e, "dropping notification client after read error");
                break;
            }
        }
    }

    hub.unregister(id);
    info!(%peer, client = id, "notification client disconnected");
}

#[cfg(test)]
mod tests {
    use super::*;
    use campus_core::NaiveDate;
    use tempfile::TempDir;

    #[test]
    fn deadlines_filter_and_skip_bad_dates() {
        let dir = TempDir::new().unwrap();
        let hub = NotificationHub::new(dir.path());
        let due = NaiveDate::from_ymd_opt(2030, 1, 1).unwrap();
        assert!(hub.save_deadline(&Deadline::new("CSE101", "HW1", "Assignment", due)).is_saved());
        hub.save_deadline(&Deadline::new("MAT201", "Quiz", "Quiz", due));
        hub.store
            .append_line(&hub.layout.deadlines(), "CSE101;Broken;Exam;soon")
            .unwrap();

        let found = hub.deadlines_for("cse101").unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].task_name, "HW1");
    }

    #[test]
    fn uploads_are_confined_to_course_dir() {
        let dir = TempDir::new().unwrap();
        let hub = NotificationHub::new(dir.path());
        let path = hub.store_upload("CSE101", "../../notes.pdf", b"pdf").unwrap();
        assert_eq!(path, dir.path().join("uploaded_files/CSE101/notes.pdf"));
        hub.store_upload("CSE101", "notes.pdf", b"pdf2").unwrap();

        let index = hub.store.read_lines(&hub.layout.upload_index()).unwrap();
        assert_eq!(index, vec!["CSE101;notes.pdf"]);
        assert_eq!(std::fs::read(path).unwrap(), b"pdf2");

        assert!(hub.store_upload("CSE101", "..", b"x").is_err());
        assert!(hub.store_upload("../etc", "x.txt", b"x").is_err());
    }

    #[tokio::test]
    async fn blank_announcements_are_dropped() {
        let dir = TempDir::new().unwrap();
        let hub = NotificationHub::new(dir.path());
        assert_eq!(hub.announce("   ").await, 0);
        assert!(hub.store.read_lines(&hub.layout.announcements()).unwrap().is_empty());

        hub.announce(" CSE101;Bob;Hi;2030-01-01T10:00 ").await;
        assert_eq!(
            hub.store.read_lines(&hub.layout.announcements()).unwrap(),
            vec!["CSE101;Bob;Hi;2030-01-01T10:00"]
        );
    }
}
