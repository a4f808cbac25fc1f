//! Error types for the campus domain.

use campus_storage::StorageError;
use thiserror::Error;

/// Result type for domain operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors raised by domain operations.
///
/// Loading never fails with these: unreadable files and malformed lines are
/// logged and skipped. They surface from mutations (enrolling, approving,
/// removing) where the caller asked for a specific change.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Storage failure.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// No student with this id.
    #[error("unknown student: {0}")]
    UnknownStudent(i64),

    /// No teacher with this id.
    #[error("unknown teacher: {0}")]
    UnknownTeacher(i64),

    /// No course with this id.
    #[error("unknown course: {0}")]
    UnknownCourse(String),

    /// An entity with the same id (or course name) already exists.
    #[error("duplicate entry: {0}")]
    Duplicate(String),

    /// A record could not be built from the given fields.
    #[error("invalid record: {0}")]
    InvalidRecord(String),

    /// A line sink refused or failed a write.
    #[error("write failed: {0}")]
    Sink(String),
}

impl CoreError {
    /// Create a sink error from any displayable failure.
    pub fn sink(err: impl std::fmt::Display) -> Self {
        Self::Sink(err.to_string())
    }

    /// Returns true if the error names an entity that does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::UnknownStudent(_) | Self::UnknownTeacher(_) | Self::UnknownCourse(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        assert_eq!(
            CoreError::UnknownCourse("CSE101".into()).to_string(),
            "unknown course: CSE101"
        );
        assert_eq!(CoreError::UnknownStudent(7).to_string(), "unknown student: 7");
    }

    #[test]
    fn not_found_classification() {
        assert!(CoreError::UnknownTeacher(1).is_not_found());
        assert!(!CoreError::sink("closed").is_not_found());
    }
}
