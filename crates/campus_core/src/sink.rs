//! Where domain operations send the lines they produce.

use crate::error::CoreResult;
use campus_storage::{write_mode_for, FlatFileStore, DEFAULT_UPSERT_FILES};
use std::future::{ready, Future};

/// Destination for record lines.
///
/// `path` is relative to the data root, e.g. `database/enrollments.txt`.
/// The sink decides between append and upsert from the file name, exactly
/// as the sync server does.
pub trait LineSink {
    /// Writes one line to the named file.
    fn write_line(&self, path: &str, line: &str) -> impl Future<Output = CoreResult<()>> + Send;
}

/// A sink that writes straight into a local store.
#[derive(Debug, Clone, Copy)]
pub struct LocalSink<'a> {
    store: &'a FlatFileStore,
}

impl<'a> LocalSink<'a> {
    /// Creates a sink over `store`.
    pub fn new(store: &'a FlatFileStore) -> Self {
        Self { store }
    }

    fn write_now(&self, path: &str, line: &str) -> CoreResult<()> {
        let resolved = self.store.resolve(path)?;
        let mode = write_mode_for(&resolved, DEFAULT_UPSERT_FILES.as_slice());
        self.store.write_line(&resolved, line, mode)?;
        Ok(())
    }
}

impl LineSink for LocalSink<'_> {
    fn write_line(&self, path: &str, line: &str) -> impl Future<Output = CoreResult<()>> + Send {
        ready(self.write_now(path, line))
    }
}
