//! Temporary data roots seeded with record files.

use campus_storage::{DataLayout, FlatFileStore, DATABASE_DIR};
use std::fs;
use std::net::{SocketAddr, TcpListener};
use std::path::Path;
use tempfile::TempDir;

/// The sample data set written by [`TestDataRoot::seeded`].
///
/// It mixes valid rows with every kind of row the loader must skip:
/// unapproved and malformed credentials, duplicate ids, colliding course
/// ids and names, unparsable credits, overrides for unknown ids, and
/// relations naming unknown entities.
pub const SEED_FILES: &[(&str, &str)] = &[
    (
        "StudentCredentials.txt",
        "1001,Alice Smith,alice123,true\n\
         1002,Bob Jones,bob456,TRUE\n\
         1003,Carl Pending,carl789,false\n\
         notanumber,Broken,pw,true\n\
         1004,Short,pw\n\
         5000000001,Dana Big,dana000,true\n\
         1001,Alice Duplicate,dup,true\n",
    ),
    (
        "TeacherCredentials.txt",
        "2001,Dr Carol,carolpw,true\n\
         2002,Prof Dave,davepw,false\n\
         2003,Erin Lee,erinpw,true\n",
    ),
    (
        "Courses.txt",
        "CSE101,Intro to Programming,3\n\
         MAT201,Calculus II,4.5\n\
         cse101,Shadow Course,2\n\
         PHY150,intro to programming,3\n\
         BIO110,Biology,zero\n\
         ENG105,Technical Writing,1.5\n",
    ),
    (
        "StudentProfiles.txt",
        "1001,,alicenew,images/alice.png\n\
         1002,Robert Jones,,\n\
         9999,Ghost,,\n",
    ),
    ("TeacherProfiles.txt", "2003,Dr Erin Lee,,images/erin.png\n"),
    (
        "enrollments.txt",
        "1001,CSE101\n\
         1002,mat201\n\
         1003,CSE101\n\
         1001,NOPE101\n",
    ),
    (
        "StudentCourses.txt",
        "5000000001;ENG105\n\
         1001;CSE101\n\
         1002;CSE101\n",
    ),
    (
        "AssignedCoursesTeacher.txt",
        "2001,CSE101\n\
         2003,MAT201\n\
         2002,ENG105\n\
         2001,ENG105\n",
    ),
    (
        "CourseApplications.txt",
        "5000000001;CSE101\n\
         1002;ENG105\n",
    ),
];

/// A data root in a temporary directory, removed on drop.
pub struct TestDataRoot {
    dir: TempDir,
    store: FlatFileStore,
    layout: DataLayout,
}

impl TestDataRoot {
    /// Creates an empty data root with a `database/` directory.
    pub fn empty() -> Self {
        let dir = TempDir::new().expect("Failed to create temp directory");
        fs::create_dir_all(dir.path().join(DATABASE_DIR)).expect("Failed to create database dir");
        let store = FlatFileStore::new(dir.path());
        let layout = DataLayout::new(dir.path());
        Self { dir, store, layout }
    }

    /// Creates a data root holding [`SEED_FILES`].
    pub fn seeded() -> Self {
        let root = Self::empty();
        for (name, body) in SEED_FILES {
            root.write_file(name, body);
        }
        root
    }

    /// Root directory.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Store over the root.
    pub fn store(&self) -> &FlatFileStore {
        &self.store
    }

    /// Layout over the root.
    pub fn layout(&self) -> &DataLayout {
        &self.layout
    }

    /// Replaces a file in `database/`.
    pub fn write_file(&self, name: &str, body: &str) {
        fs::write(self.layout.database_file(name), body).expect("Failed to write record file");
    }

    /// Lines of a file in `database/`.
    pub fn read_file(&self, name: &str) -> Vec<String> {
        self.store
            .read_lines(&self.layout.database_file(name))
            .expect("Failed to read record file")
    }

    /// Copies every file in `database/` into another root.
    pub fn copy_database_to(&self, other: &TestDataRoot) {
        let src = self.dir.path().join(DATABASE_DIR);
        for entry in fs::read_dir(src).expect("Failed to list database dir") {
            let entry = entry.expect("Failed to read dir entry");
            fs::copy(entry.path(), other.layout.database_file(&entry.file_name().to_string_lossy()))
                .expect("Failed to copy record file");
        }
    }
}

/// A loopback address with a port that nothing was listening on a moment
/// ago.
pub fn unused_local_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind probe listener");
    listener.local_addr().expect("Failed to read probe address")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_root_has_every_file() {
        let root = TestDataRoot::seeded();
        for (name, _) in SEED_FILES {
            assert!(!root.read_file(name).is_empty(), "{name} is empty");
        }
    }

    #[test]
    fn copy_between_roots() {
        let a = TestDataRoot::seeded();
        let b = TestDataRoot::empty();
        a.copy_database_to(&b);
        assert_eq!(a.read_file("Courses.txt"), b.read_file("Courses.txt"));
    }
}
