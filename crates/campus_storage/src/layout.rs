//! Well-known file locations beneath a data root.

use std::path::{Path, PathBuf};

/// Directory holding every record file.
pub const DATABASE_DIR: &str = "database";
/// Directory holding uploaded course files.
pub const UPLOAD_DIR: &str = "uploaded_files";

/// Student credentials: `id,name,password,approved`.
pub const STUDENT_CREDENTIALS: &str = "StudentCredentials.txt";
/// Teacher credentials: `id,name,password,approved`.
pub const TEACHER_CREDENTIALS: &str = "TeacherCredentials.txt";
/// Courses: `id,name,credit`.
pub const COURSES: &str = "Courses.txt";
/// Student profile overrides: `id,name,password,imagePath`.
pub const STUDENT_PROFILES: &str = "StudentProfiles.txt";
/// Teacher profile overrides: `id,name,password,imagePath`.
pub const TEACHER_PROFILES: &str = "TeacherProfiles.txt";
/// Approved enrollments: `studentId,courseId`.
pub const ENROLLMENTS: &str = "enrollments.txt";
/// Legacy enrollments: `studentId;courseId`.
pub const STUDENT_COURSES: &str = "StudentCourses.txt";
/// Teacher assignments: `teacherId,courseId`.
pub const TEACHER_ASSIGNMENTS: &str = "AssignedCoursesTeacher.txt";
/// Pending course applications: `studentId;courseId`.
pub const COURSE_APPLICATIONS: &str = "CourseApplications.txt";
/// Announcements: `courseId;teacherName;message;timestamp`.
pub const ANNOUNCEMENTS: &str = "CourseAnnouncements.txt";
/// Deadlines: `courseId;taskName;type;isoDate`.
pub const DEADLINES: &str = "deadlines.txt";
/// Upload index: `courseId;fileName`.
pub const UPLOAD_INDEX: &str = "UploadedFiles.txt";

/// Resolves the record files used by the servers and the local loader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataLayout {
    root: PathBuf,
}

impl DataLayout {
    /// Creates a layout rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the data root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of a file in the `database/` directory.
    pub fn database_file(&self, name: &str) -> PathBuf {
        self.root.join(DATABASE_DIR).join(name)
    }

    /// Relative path (as sent in a `WriteLine` request) of a database file.
    pub fn relative(name: &str) -> String {
        format!("{DATABASE_DIR}/{name}")
    }

    /// Student credentials file.
    pub fn student_credentials(&self) -> PathBuf {
        self.database_file(STUDENT_CREDENTIALS)
    }

    /// Teacher credentials file.
    pub fn teacher_credentials(&self) -> PathBuf {
        self.database_file(TEACHER_CREDENTIALS)
    }

    /// Courses file.
    pub fn courses(&self) -> PathBuf {
        self.database_file(COURSES)
    }

    /// Student profile override file.
    pub fn student_profiles(&self) -> PathBuf {
        self.database_file(STUDENT_PROFILES)
    }

    /// Teacher profile override file.
    pub fn teacher_profiles(&self) -> PathBuf {
        self.database_file(TEACHER_PROFILES)
    }

    /// Both student-course relation files, in the order they are applied.
    pub fn enrollment_files(&self) -> [PathBuf; 2] {
        [
            self.database_file(ENROLLMENTS),
            self.database_file(STUDENT_COURSES),
        ]
    }

    /// Teacher-course relation file.
    pub fn teacher_assignments(&self) -> PathBuf {
        self.database_file(TEACHER_ASSIGNMENTS)
    }

    /// Pending application file.
    pub fn course_applications(&self) -> PathBuf {
        self.database_file(COURSE_APPLICATIONS)
    }

    /// Announcement log.
    pub fn announcements(&self) -> PathBuf {
        self.database_file(ANNOUNCEMENTS)
    }

    /// Deadline log.
    pub fn deadlines(&self) -> PathBuf {
        self.database_file(DEADLINES)
    }

    /// Upload index.
    pub fn upload_index(&self) -> PathBuf {
        self.database_file(UPLOAD_INDEX)
    }

    /// Location of an uploaded file.
    ///
    /// Callers must pass a course id and a bare file name; see
    /// [`safe_file_name`].
    pub fn upload_path(&self, course_id: &str, file_name: &str) -> PathBuf {
        self.root.join(UPLOAD_DIR).join(course_id).join(file_name)
    }
}

impl Default for DataLayout {
    fn default() -> Self {
        Self::new(".")
    }
}

/// Reduces a client-supplied name to a single safe path component.
///
/// Returns `None` for names that are empty or resolve to `.` or `..`.
pub fn safe_file_name(name: &str) -> Option<&str> {
    let base = name
        .trim()
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or("")
        .trim();
    match base {
        "" | "." | ".." => None,
        _ => Some(base),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn files_live_under_database_dir() {
        let layout = DataLayout::new("/srv/campus");
        assert_eq!(
            layout.courses(),
            PathBuf::from("/srv/campus/database/Courses.txt")
        );
        assert_eq!(
            layout.upload_path("CSE101", "notes.pdf"),
            PathBuf::from("/srv/campus/uploaded_files/CSE101/notes.pdf")
        );
    }

    #[test]
    fn relative_matches_wire_paths() {
        assert_eq!(
            DataLayout::relative(ENROLLMENTS),
            "database/enrollments.txt"
        );
    }

    #[test]
    fn file_names_are_reduced_to_base() {
        assert_eq!(safe_file_name("notes.pdf"), Some("notes.pdf"));
        assert_eq!(safe_file_name("../../etc/passwd"), Some("passwd"));
        assert_eq!(safe_file_name("C:\\tmp\\x.doc"), Some("x.doc"));
        assert_eq!(safe_file_name(".."), None);
        assert_eq!(safe_file_name("dir/"), None);
        assert_eq!(safe_file_name("  "), None);
    }
}
