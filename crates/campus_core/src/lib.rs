//! # Campus Core
//!
//! Domain model and coordination engine for the campus sync layer.
//!
//! Three collections (students, teachers, courses) and two relations
//! (enrollment, assignment) are stored as flat text files. The
//! [`Coordinator`] rebuilds them into a [`Catalog`] in five steps:
//!
//! 1. approved students and teachers from the credential files
//! 2. courses, first id or name wins
//! 3. profile overrides, blank fields ignored
//! 4. relation files, linking both sides when both ids resolve
//! 5. the finished catalog
//!
//! Mutations that must reach the server go through a [`LineSink`]; those
//! that rewrite local files use a [`FlatFileStore`] directly.
//!
//! ```rust
//! use campus_core::{Coordinator, RosterMember};
//! use campus_storage::{DataLayout, FlatFileStore};
//!
//! let dir = tempfile::tempdir().unwrap();
//! let store = FlatFileStore::new(dir.path());
//! let layout = DataLayout::new(dir.path());
//! store.append_line(&layout.student_credentials(), "1001,Alice,pw,true").unwrap();
//!
//! let catalog = Coordinator::new(&store, &layout).build();
//! assert_eq!(catalog.students.get(1001).unwrap().name(), "Alice");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod accounts;
mod applications;
mod catalog;
mod coordinator;
mod error;
mod model;
mod notices;
mod records;
mod sink;

pub use accounts::{
    approve_registration, authenticate, pending_registrations, register, remove_course,
    remove_student, remove_teacher, AdminCredentials, CurrentUser, Role,
};
pub use applications::{
    apply_for_course, approve, assign_course, pending_applications, pending_for_course, withdraw,
    Application,
};
pub use catalog::Catalog;
pub use coordinator::Coordinator;
pub use error::{CoreError, CoreResult};
pub use model::{
    Course, CourseList, MemberList, Profile, RosterMember, Student, StudentList, Teacher,
    TeacherList,
};
pub use notices::{Announcement, Deadline, UploadEntry};
pub use records::{
    application_line, course_line, credential_line, parse_course, profile_line, relation_line,
    sanitize_field, CredentialRecord, ProfileOverride, RelationRecord,
};
pub use sink::{LineSink, LocalSink};

// Re-export for downstream crates that only need the date type.
pub use chrono::NaiveDate;
