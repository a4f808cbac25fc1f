//! The closed set of messages carried on both channels.

use bytes::Bytes;
use campus_core::{CourseList, Deadline, StudentList, TeacherList};
use serde::{Deserialize, Serialize};

/// Reply to a deadline submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AckStatus {
    /// The deadline was persisted.
    Saved,
    /// Persisting the deadline failed.
    SaveFailed,
}

impl AckStatus {
    /// Returns true for [`AckStatus::Saved`].
    pub fn is_saved(self) -> bool {
        self == Self::Saved
    }
}

/// One message on the wire.
///
/// The sync channel uses `FetchAll`, `WriteLine` and the three collection
/// replies. The notification channel uses the rest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum WireMessage {
    /// Ask for every coordinated collection.
    FetchAll,
    /// Append or upsert one line in a file below the data root.
    WriteLine {
        /// Relative path, e.g. `database/enrollments.txt`.
        path: String,
        /// Record line without a trailing newline.
        line: String,
    },
    /// First reply to `FetchAll`.
    StudentCollection(StudentList),
    /// Second reply to `FetchAll`.
    TeacherCollection(TeacherList),
    /// Third reply to `FetchAll`.
    CourseCollection(CourseList),
    /// Announcement text, `courseId;teacherName;message;timestamp`.
    Announcement {
        /// Raw announcement line.
        text: String,
    },
    /// A deadline to persist.
    Deadline(Deadline),
    /// A course file.
    FileUpload {
        /// Owning course.
        course_id: String,
        /// Client-supplied file name.
        file_name: String,
        /// File contents.
        bytes: Bytes,
    },
    /// Ask for the deadlines of one course.
    DeadlineQuery {
        /// Course to filter on.
        course_id: String,
    },
    /// Reply to `DeadlineQuery`.
    DeadlineList(Vec<Deadline>),
    /// Reply to `Deadline`.
    Ack(AckStatus),
}

impl WireMessage {
    /// Message name, used in logs and protocol errors.
    pub fn name(&self) -> &'static str {
        match self {
            Self::FetchAll => "FetchAll",
            Self::WriteLine { .. } => "WriteLine",
            Self::StudentCollection(_) => "StudentCollection",
            Self::TeacherCollection(_) => "TeacherCollection",
            Self::CourseCollection(_) => "CourseCollection",
            Self::Announcement { .. } => "Announcement",
            Self::Deadline(_) => "Deadline",
            Self::FileUpload { .. } => "FileUpload",
            Self::DeadlineQuery { .. } => "DeadlineQuery",
            Self::DeadlineList(_) => "DeadlineList",
            Self::Ack(_) => "Ack",
        }
    }

    /// Creates a write request.
    pub fn write_line(path: impl Into<String>, line: impl Into<String>) -> Self {
        Self::WriteLine {
            path: path.into(),
            line: line.into(),
        }
    }

    /// Creates an announcement.
    pub fn announcement(text: impl Into<String>) -> Self {
        Self::Announcement { text: text.into() }
    }

    /// True for requests handled by the sync server.
    pub fn is_sync_request(&self) -> bool {
        matches!(self, Self::FetchAll | Self::WriteLine { .. })
    }
}
