//! Announcement, deadline and upload index records.
//!
//! All three are `;`-separated and append-only.

use crate::records::sanitize_field;
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// A course announcement: `courseId;teacherName;message;timestamp`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Announcement {
    /// Course the announcement belongs to.
    pub course_id: String,
    /// Name of the posting teacher.
    pub author: String,
    /// Body text.
    pub message: String,
    /// Local time of posting, ISO-8601 without offset.
    pub timestamp: String,
}

impl Announcement {
    /// Creates an announcement stamped with the current local time.
    pub fn new(course_id: &str, author: &str, message: &str) -> Self {
        Self::with_timestamp(
            course_id,
            author,
            message,
            &Local::now().format("%Y-%m-%dT%H:%M:%S").to_string(),
        )
    }

    /// Creates an announcement with an explicit timestamp.
    pub fn with_timestamp(course_id: &str, author: &str, message: &str, timestamp: &str) -> Self {
        Self {
            course_id: sanitize_field(course_id, ';'),
            author: sanitize_field(author, ';'),
            message: sanitize_field(message, ';'),
            timestamp: sanitize_field(timestamp, ';'),
        }
    }

    /// Parses announcement text. Needs all four fields.
    pub fn parse(text: &str) -> Option<Self> {
        let parts: Vec<&str> = text.trim().splitn(4, ';').map(str::trim).collect();
        match parts.as_slice() {
            [course, author, message, timestamp] if !course.is_empty() => Some(Self {
                course_id: (*course).to_string(),
                author: (*author).to_string(),
                message: (*message).to_string(),
                timestamp: (*timestamp).to_string(),
            }),
            _ => None,
        }
    }

    /// True if this announcement is for `course_id`.
    pub fn is_for(&self, course_id: &str) -> bool {
        self.course_id.eq_ignore_ascii_case(course_id.trim())
    }

    /// Serializes the record.
    pub fn to_line(&self) -> String {
        format!(
            "{};{};{};{}",
            self.course_id, self.author, self.message, self.timestamp
        )
    }
}

/// A task deadline: `courseId;taskName;type;YYYY-MM-DD`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deadline {
    /// Course id.
    pub course_id: String,
    /// Task title.
    pub task_name: String,
    /// Kind of task, e.g. `Assignment` or `Quiz`.
    pub kind: String,
    /// Due date.
    pub due_date: NaiveDate,
}

impl Deadline {
    /// Creates a deadline. Free-text fields have `;` substituted.
    pub fn new(course_id: &str, task_name: &str, kind: &str, due_date: NaiveDate) -> Self {
        Self {
            course_id: sanitize_field(course_id, ';'),
            task_name: sanitize_field(task_name, ';'),
            kind: sanitize_field(kind, ';'),
            due_date,
        }
    }

    /// Parses a date written as `YYYY-MM-DD`.
    pub fn parse_date(text: &str) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(text.trim(), DATE_FORMAT).ok()
    }

    /// Parses a deadline row. Rows with a bad date are rejected.
    pub fn parse(line: &str) -> Option<Self> {
        let parts: Vec<&str> = line.trim().splitn(4, ';').map(str::trim).collect();
        let [course, task, kind, date] = parts.as_slice() else {
            return None;
        };
        if course.is_empty() {
            return None;
        }
        Some(Self {
            course_id: (*course).to_string(),
            task_name: (*task).to_string(),
            kind: (*kind).to_string(),
            due_date: Self::parse_date(date)?,
        })
    }

    /// True if this deadline is for `course_id`.
    pub fn is_for(&self, course_id: &str) -> bool {
        self.course_id.eq_ignore_ascii_case(course_id.trim())
    }

    /// Serializes the record. Free-text fields have `;` substituted, so
    /// values that did not come through [`Deadline::new`] stay one row.
    pub fn to_line(&self) -> String {
        format!(
            "{};{};{};{}",
            sanitize_field(&self.course_id, ';'),
            sanitize_field(&self.task_name, ';'),
            sanitize_field(&self.kind, ';'),
            self.due_date.format(DATE_FORMAT)
        )
    }
}

/// One uploaded file: `courseId;fileName`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadEntry {
    /// Course the file belongs to.
    pub course_id: String,
    /// Bare file name.
    pub file_name: String,
}

impl UploadEntry {
    /// Parses an index row.
    pub fn parse(line: &str) -> Option<Self> {
        let (course, file) = line.trim().split_once(';')?;
        let (course, file) = (course.trim(), file.trim());
        if course.is_empty() || file.is_empty() {
            return None;
        }
        Some(Self {
            course_id: course.to_string(),
            file_name: file.to_string(),
        })
    }

    /// Serializes the record.
    pub fn to_line(&self) -> String {
        format!("{};{}", self.course_id, self.file_name)
    }
}
