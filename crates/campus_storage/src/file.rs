//! Flat-file line store.

use crate::error::{StorageError, StorageResult};
use parking_lot::Mutex;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Component, Path, PathBuf};
use tempfile::NamedTempFile;

/// What an upsert did to the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// A line with the same key was replaced.
    Replaced,
    /// No line had the key, so the new line was appended.
    Appended,
}

/// How a line is written to its target file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Plain append.
    Append,
    /// Replace the line with the same first field, else append.
    UpsertByKey,
}

/// File names that are written with [`WriteMode::UpsertByKey`] by default.
pub const DEFAULT_UPSERT_FILES: [&str; 4] = [
    crate::layout::STUDENT_PROFILES,
    crate::layout::TEACHER_PROFILES,
    crate::layout::STUDENT_CREDENTIALS,
    crate::layout::TEACHER_CREDENTIALS,
];

/// Picks the write mode for `path` by its file name.
///
/// Names are compared case-insensitively against `upsert_files`.
pub fn write_mode_for<S: AsRef<str>>(path: &Path, upsert_files: &[S]) -> WriteMode {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return WriteMode::Append;
    };
    if upsert_files
        .iter()
        .any(|f| f.as_ref().eq_ignore_ascii_case(name))
    {
        WriteMode::UpsertByKey
    } else {
        WriteMode::Append
    }
}

/// A store of delimited text files, one record per line.
///
/// Every file is addressed by path. Relative paths that arrive from the
/// network go through [`FlatFileStore::resolve`] first so they stay below
/// the data root.
///
/// # Concurrency
///
/// All writes issued through one store are serialized by an internal lock,
/// so two connections served by the same process never interleave a
/// rewrite. Nothing is locked across processes: two processes upserting the
/// same key at the same moment can still lose one of the updates.
///
/// # Durability
///
/// Rewrites (upsert, removal) go to a temp file in the target directory
/// which is synced and then renamed over the original. Readers see either
/// the old or the new contents, never a torn file.
///
/// # Example
///
/// ```no_run
/// use campus_storage::FlatFileStore;
/// use std::path::Path;
///
/// let store = FlatFileStore::new(".");
/// let path = store.resolve("database/StudentCredentials.txt").unwrap();
/// store.upsert_by_key(&path, "1001,Alice,pw,true", ',').unwrap();
/// ```
#[derive(Debug)]
pub struct FlatFileStore {
    root: PathBuf,
    write_lock: Mutex<()>,
}

impl FlatFileStore {
    /// Creates a store rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Returns the data root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolves a relative path beneath the data root.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InvalidPath`] if the path is empty, absolute,
    /// or contains a `..` component.
    pub fn resolve(&self, relative: impl AsRef<Path>) -> StorageResult<PathBuf> {
        let relative = relative.as_ref();
        let mut resolved = self.root.clone();
        let mut depth = 0usize;

        for component in relative.components() {
            match component {
                Component::Normal(part) => {
                    resolved.push(part);
                    depth += 1;
                }
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                    return Err(StorageError::InvalidPath(relative.to_path_buf()));
                }
            }
        }

        if depth == 0 {
            return Err(StorageError::InvalidPath(relative.to_path_buf()));
        }
        Ok(resolved)
    }

    /// Reads every line of a file.
    ///
    /// A file that does not exist reads as empty. Invalid UTF-8 is replaced
    /// rather than rejected.
    ///
    /// # Errors
    ///
    /// Returns an error for I/O failures other than a missing file.
    pub fn read_lines(&self, path: &Path) -> StorageResult<Vec<String>> {
        match fs::read(path) {
            Ok(bytes) => Ok(String::from_utf8_lossy(&bytes)
                .lines()
                .map(str::to_owned)
                .collect()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// Writes one line with the given mode.
    ///
    /// Upserts key on the text before the first comma.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying append or upsert fails.
    pub fn write_line(&self, path: &Path, line: &str, mode: WriteMode) -> StorageResult<()> {
        match mode {
            WriteMode::Append => self.append_line(path, line),
            WriteMode::UpsertByKey => self.upsert_by_key(path, line, ',').map(|_| ()),
        }
    }

    /// Appends one line, creating the file and its parents if needed.
    ///
    /// Duplicate detection is the caller's responsibility.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or written.
    pub fn append_line(&self, path: &Path, line: &str) -> StorageResult<()> {
        let _guard = self.write_lock.lock();
        Self::append_unlocked(path, line)
    }

    /// Appends a line unless an identical (trimmed) line already exists.
    ///
    /// Returns `true` if the line was written.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or written.
    pub fn append_unique(&self, path: &Path, line: &str) -> StorageResult<bool> {
        let _guard = self.write_lock.lock();
        let wanted = line.trim();
        if self.read_lines(path)?.iter().any(|l| l.trim() == wanted) {
            return Ok(false);
        }
        Self::append_unlocked(path, line)?;
        Ok(true)
    }

    /// Replaces the line whose first field equals the new line's first
    /// field, or appends the new line if none does.
    ///
    /// Keys are compared after trimming. Blank lines are dropped during the
    /// rewrite, and any further lines with the same key are removed so the
    /// file ends up with exactly one row for that key. A line with a blank
    /// key is simply appended.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, written or replaced.
    pub fn upsert_by_key(
        &self,
        path: &Path,
        line: &str,
        delimiter: char,
    ) -> StorageResult<UpsertOutcome> {
        let _guard = self.write_lock.lock();
        let line = single_line(line);
        let key = first_field(&line, delimiter);
        if key.is_empty() {
            Self::append_unlocked(path, &line)?;
            return Ok(UpsertOutcome::Appended);
        }

        let existing = self.read_lines(path)?;
        let mut out = Vec::with_capacity(existing.len() + 1);
        let mut replaced = false;

        for current in existing {
            if current.trim().is_empty() {
                continue;
            }
            if first_field(&current, delimiter) == key {
                if !replaced {
                    out.push(line.clone());
                    replaced = true;
                }
                continue;
            }
            out.push(current);
        }

        if !replaced {
            out.push(line);
        }
        Self::rewrite(path, &out)?;

        Ok(if replaced {
            UpsertOutcome::Replaced
        } else {
            UpsertOutcome::Appended
        })
    }

    /// Rewrites a file without the lines matching `remove`.
    ///
    /// The predicate sees each line trimmed; blank lines are dropped. A
    /// missing file is left missing. Returns the number of lines removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, written or replaced.
    pub fn remove_lines<F>(&self, path: &Path, mut remove: F) -> StorageResult<usize>
    where
        F: FnMut(&str) -> bool,
    {
        let _guard = self.write_lock.lock();
        if !path.exists() {
            return Ok(0);
        }

        let mut removed = 0usize;
        let mut out = Vec::new();
        for current in self.read_lines(path)? {
            let trimmed = current.trim();
            if trimmed.is_empty() {
                continue;
            }
            if remove(trimmed) {
                removed += 1;
            } else {
                out.push(current);
            }
        }

        if removed > 0 {
            Self::rewrite(path, &out)?;
        }
        Ok(removed)
    }

    /// Removes every line whose first field equals `key`.
    ///
    /// # Errors
    ///
    /// See [`FlatFileStore::remove_lines`].
    pub fn remove_by_key(&self, path: &Path, key: &str, delimiter: char) -> StorageResult<usize> {
        let key = key.trim();
        self.remove_lines(path, |line| first_field(line, delimiter) == key)
    }

    /// Writes a binary blob, replacing any existing file.
    ///
    /// # Errors
    ///
    /// Returns an error if directories cannot be created or the file written.
    pub fn write_blob(&self, path: &Path, bytes: &[u8]) -> StorageResult<()> {
        let _guard = self.write_lock.lock();
        ensure_parent(path)?;
        let mut tmp = NamedTempFile::new_in(parent_of(path))?;
        tmp.write_all(bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| StorageError::Replace {
            path: path.to_path_buf(),
            source: e.error,
        })?;
        Ok(())
    }

    fn append_unlocked(path: &Path, line: &str) -> StorageResult<()> {
        ensure_parent(path)?;
        let mut file = OpenOptions::new()
            .read(true)
            .append(true)
            .create(true)
            .open(path)?;

        let mut record = String::with_capacity(line.len() + 2);
        if !ends_with_newline(&mut file)? {
            record.push('\n');
        }
        record.push_str(&single_line(line));
        record.push('\n');

        file.write_all(record.as_bytes())?;
        file.flush()?;
        Ok(())
    }

    fn rewrite(path: &Path, lines: &[String]) -> StorageResult<()> {
        ensure_parent(path)?;
        let mut tmp = NamedTempFile::new_in(parent_of(path))?;
        for line in lines {
            tmp.write_all(line.as_bytes())?;
            tmp.write_all(b"\n")?;
        }
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| StorageError::Replace {
            path: path.to_path_buf(),
            source: e.error,
        })?;
        Ok(())
    }
}

/// Returns the trimmed text before the first `delimiter`.
pub fn first_field(line: &str, delimiter: char) -> &str {
    line.split(delimiter).next().unwrap_or("").trim()
}

/// Collapses embedded line breaks so a record stays on one line.
fn single_line(line: &str) -> String {
    line.trim_end_matches(['\r', '\n'])
        .replace(['\r', '\n'], " ")
}

fn parent_of(path: &Path) -> &Path {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    }
}

fn ensure_parent(path: &Path) -> io::Result<()> {
    fs::create_dir_all(parent_of(path))
}

fn ends_with_newline(file: &mut File) -> io::Result<bool> {
    let len = file.metadata()?.len();
    if len == 0 {
        return Ok(true);
    }
    file.seek(SeekFrom::Start(len - 1))?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last)?;
    Ok(last[0] == b'\n')
}
