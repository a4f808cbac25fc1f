//! Request handling for the sync channel.

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use campus_core::{Catalog, Coordinator};
use campus_storage::{write_mode_for, DataLayout, FlatFileStore, WriteMode};
use campus_sync_protocol::WireMessage;
use std::sync::Arc;
use tracing::{debug, info};

/// State shared by every sync connection.
#[derive(Debug)]
pub struct HandlerContext {
    /// Server configuration.
    pub config: ServerConfig,
    /// Store over the data root; serializes writes from all connections.
    pub store: FlatFileStore,
    /// Record file locations.
    pub layout: DataLayout,
}

impl HandlerContext {
    /// Creates a context over `config.data_root`.
    pub fn new(config: ServerConfig) -> Self {
        let store = FlatFileStore::new(&config.data_root);
        let layout = DataLayout::new(&config.data_root);
        Self {
            config,
            store,
            layout,
        }
    }
}

/// Executes sync requests.
#[derive(Debug, Clone)]
pub struct RequestHandler {
    context: Arc<HandlerContext>,
}

impl RequestHandler {
    /// Creates a new request handler.
    pub fn new(context: Arc<HandlerContext>) -> Self {
        Self { context }
    }

    /// Shared context.
    pub fn context(&self) -> &HandlerContext {
        &self.context
    }

    /// Rebuilds the catalog from the files on disk.
    pub fn fetch_all(&self) -> Catalog {
        Coordinator::new(&self.context.store, &self.context.layout).build()
    }

    /// Writes one line, choosing upsert or append by file name.
    ///
    /// # Errors
    ///
    /// Fails if `path` escapes the data root or the write fails.
    pub fn write_line(&self, path: &str, line: &str) -> ServerResult<WriteMode> {
        let resolved = self.context.store.resolve(path)?;
        let mode = write_mode_for(&resolved, self.context.config.upsert_files.as_slice());
        self.context.store.write_line(&resolved, line, mode)?;
        debug!(%path, ?mode, "line written");
        Ok(mode)
    }

    /// Handles one request and returns the replies to send, in order.
    ///
    /// # Errors
    ///
    /// Fails for messages that are not sync requests, and for failed writes.
    pub fn handle(&self, request: WireMessage) -> ServerResult<Vec<WireMessage>> {
        match request {
            WireMessage::FetchAll => {
                let catalog = self.fetch_all();
                info!(
                    students = catalog.students.len(),
                    teachers = catalog.teachers.len(),
                    courses = catalog.courses.len(),
                    "serving fetch-all"
                );
                Ok(vec![
                    WireMessage::StudentCollection(catalog.students),
                    WireMessage::TeacherCollection(catalog.teachers),
                    WireMessage::CourseCollection(catalog.courses),
                ])
            }
            WireMessage::WriteLine { path, line } => {
                self.write_line(&path, &line)?;
                Ok(Vec::new())
            }
            other => Err(ServerError::UnexpectedRequest(other.name())),
        }
    }
}
