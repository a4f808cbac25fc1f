//! # Campus Storage
//!
//! Flat-file storage for the campus sync layer.
//!
//! Entity collections and relations are plain delimited text files, one
//! record per line, with no escaping. This crate knows how to read and
//! write lines; it does not interpret the fields beyond the leading key
//! used for upserts.
//!
//! ## Write modes
//!
//! - **Append**: add a line at the end of a file.
//! - **Upsert-by-key**: replace the line whose first field matches, else
//!   append. Used for credential and profile files.
//! - **Remove**: rewrite a file without the matching lines.
//!
//! Rewrites go through a temp file and an atomic rename. A file that does
//! not exist yet reads as empty.
//!
//! ## Example
//!
//! ```rust
//! use campus_storage::{DataLayout, FlatFileStore};
//!
//! let dir = tempfile::tempdir().unwrap();
//! let store = FlatFileStore::new(dir.path());
//! let layout = DataLayout::new(dir.path());
//!
//! store.append_line(&layout.courses(), "CSE101,Intro to CS,3.0").unwrap();
//! assert_eq!(store.read_lines(&layout.courses()).unwrap().len(), 1);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod file;
mod layout;

pub use error::{StorageError, StorageResult};
pub use file::{
    first_field, write_mode_for, FlatFileStore, UpsertOutcome, WriteMode, DEFAULT_UPSERT_FILES,
};
pub use layout::{
    safe_file_name, DataLayout, ANNOUNCEMENTS, COURSES, COURSE_APPLICATIONS, DATABASE_DIR,
    DEADLINES, ENROLLMENTS, STUDENT_COURSES, STUDENT_CREDENTIALS, STUDENT_PROFILES,
    TEACHER_ASSIGNMENTS, TEACHER_CREDENTIALS, TEACHER_PROFILES, UPLOAD_DIR, UPLOAD_INDEX,
};
