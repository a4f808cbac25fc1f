//! The coordination engine: files in, one consistent [`Catalog`] out.
//!
//! Loading is lenient. A file that cannot be read contributes nothing and is
//! logged at `warn`; a line that does not parse is logged at `debug` and
//! skipped.

use crate::catalog::Catalog;
use crate::model::{
    CourseList, MemberList, Profile, RosterMember, Student, StudentList, Teacher, TeacherList,
};
use crate::records::{parse_course, CredentialRecord, ProfileOverride, RelationRecord};
use campus_storage::{DataLayout, FlatFileStore};
use std::path::Path;
use tracing::{debug, warn};

/// Rebuilds collections from the record files under one data root.
#[derive(Debug, Clone, Copy)]
pub struct Coordinator<'a> {
    store: &'a FlatFileStore,
    layout: &'a DataLayout,
}

impl<'a> Coordinator<'a> {
    /// Creates a coordinator over `store`, reading files from `layout`.
    pub fn new(store: &'a FlatFileStore, layout: &'a DataLayout) -> Self {
        Self { store, layout }
    }

    /// Runs all five steps and returns the rebuilt catalog.
    pub fn build(&self) -> Catalog {
        let mut catalog = Catalog {
            students: self.load_students(),
            teachers: self.load_teachers(),
            courses: self.load_courses(),
        };
        self.apply_profiles(&mut catalog);
        self.apply_relations(&mut catalog);
        debug!(
            students = catalog.students.len(),
            teachers = catalog.teachers.len(),
            courses = catalog.courses.len(),
            "catalog rebuilt"
        );
        catalog
    }

    /// Approved students from the student credential file.
    pub fn load_students(&self) -> StudentList {
        self.load_members(&self.layout.student_credentials(), Student::new)
    }

    /// Approved teachers from the teacher credential file.
    pub fn load_teachers(&self) -> TeacherList {
        self.load_members(&self.layout.teacher_credentials(), Teacher::new)
    }

    fn load_members<T: RosterMember>(
        &self,
        path: &Path,
        make: impl Fn(Profile) -> T,
    ) -> MemberList<T> {
        let mut members = MemberList::new();
        for line in self.lines(path) {
            let Some(record) = CredentialRecord::parse(&line) else {
                if !line.trim().is_empty() {
                    debug!(file = %path.display(), %line, "skipping malformed credential row");
                }
                continue;
            };
            if !record.approved {
                continue;
            }
            if !members.add(make(record.to_profile())) {
                debug!(id = record.id, "skipping duplicate credential row");
            }
        }
        members
    }

    /// Courses from the course file. The first row with a given id or name
    /// wins.
    pub fn load_courses(&self) -> CourseList {
        let path = self.layout.courses();
        let mut courses = CourseList::new();
        for line in self.lines(&path) {
            if line.trim().is_empty() {
                continue;
            }
            match parse_course(&line) {
                Some(course) => {
                    let id = course.id.clone();
                    if !courses.add(course) {
                        debug!(%id, "skipping duplicate course row");
                    }
                }
                None => debug!(%line, "skipping malformed course row"),
            }
        }
        courses
    }

    /// Applies both profile override files. Blank fields keep the current
    /// value; overrides for unknown ids are ignored.
    pub fn apply_profiles(&self, catalog: &mut Catalog) {
        for over in self.overrides(&self.layout.student_profiles()) {
            if let Some(student) = catalog.students.get_mut(over.id) {
                over.apply(student.profile_mut());
            }
        }
        for over in self.overrides(&self.layout.teacher_profiles()) {
            if let Some(teacher) = catalog.teachers.get_mut(over.id) {
                over.apply(teacher.profile_mut());
            }
        }
    }

    fn overrides(&self, path: &Path) -> Vec<ProfileOverride> {
        self.lines(path)
            .iter()
            .filter(|l| !l.trim().is_empty())
            .filter_map(|l| {
                let parsed = ProfileOverride::parse(l);
                if parsed.is_none() {
                    debug!(file = %path.display(), line = %l, "skipping malformed profile row");
                }
                parsed
            })
            .collect()
    }

    /// Links students and teachers to courses from the relation files.
    ///
    /// A row links both sides only when both ids resolve. Applying the same
    /// files twice is a no-op.
    pub fn apply_relations(&self, catalog: &mut Catalog) {
        for path in self.layout.enrollment_files() {
            for line in self.lines(&path) {
                if let Some(rel) = RelationRecord::parse_enrollment(&line) {
                    catalog.enroll(rel.member_id, &rel.course_id);
                }
            }
        }
        for line in self.lines(&self.layout.teacher_assignments()) {
            if let Some(rel) = RelationRecord::parse(&line, ',') {
                catalog.assign(rel.member_id, &rel.course_id);
            }
        }
    }

    fn lines(&self, path: &Path) -> Vec<String> {
        match self.store.read_lines(path) {
            Ok(lines) => lines,
            Err(e) => {
                warn!(file = %path.display(), error = %e, "failed to read record file");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn seed(files: &[(&str, &str)]) -> (TempDir, FlatFileStore, DataLayout) {
        let dir = TempDir::new().unwrap();
        let layout = DataLayout::new(dir.path());
        fs::create_dir_all(dir.path().join("database")).unwrap();
        for (name, body) in files {
            fs::write(layout.database_file(name), body).unwrap();
        }
        let store = FlatFileStore::new(dir.path());
        (dir, store, layout)
    }

    #[test]
    fn only_approved_integer_rows_are_included() {
        let (_dir, store, layout) = seed(&[(
            "StudentCredentials.txt",
            "1001,Alice,a,true\n\
             garbage\n\
             x12,Bad,b,true\n\
             1002,Bob,b,false\n\
             1003,Cara,c,True\n\
             5000000001,Big,p,true\n",
        )]);
        let students = Coordinator::new(&store, &layout).load_students();
        let ids: Vec<i64> = students.iter().map(|s| s.id()).collect();
        assert_eq!(ids, vec![1001, 1003, 5_000_000_001]);
    }

    #[test]
    fn first_course_wins() {
        let (_dir, store, layout) = seed(&[(
            "Courses.txt",
            "CSE101,Intro,3\n\
             cse101,Other,2\n\
             MAT201,intro,4\n\
             PHY101,Physics,abc\n\
             MAT202,Linear Algebra,3.5\n",
        )]);
        let courses = Coordinator::new(&store, &layout).load_courses();
        let ids: Vec<&str> = courses.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["CSE101", "MAT202"]);
        assert_eq!(courses.get("cse101").unwrap().name, "Intro");
    }

    #[test]
    fn overrides_apply_non_blank_fields() {
        let (_dir, store, layout) = seed(&[
            ("StudentCredentials.txt", "1001,Alice,a,true\n"),
            ("TeacherCredentials.txt", "2001,Carol,c,true\n"),
            ("StudentProfiles.txt", "1001,,newpw,alice.png\n9999,Ghost,,\n"),
            ("TeacherProfiles.txt", "2001,Dr Carol,,\n"),
        ]);
        let catalog = Coordinator::new(&store, &layout).build();
        let alice = catalog.students.get(1001).unwrap().profile();
        assert_eq!(alice.name, "Alice");
        assert_eq!(alice.password, "newpw");
        assert_eq!(alice.image_path.as_deref(), Some("alice.png"));
        let carol = catalog.teachers.get(2001).unwrap().profile();
        assert_eq!(carol.name, "Dr Carol");
        assert_eq!(carol.password, "c");
    }

    #[test]
    fn relations_from_both_formats_are_bidirectional() {
        let (_dir, store, layout) = seed(&[
            ("StudentCredentials.txt", "1001,Alice,a,true\n1002,Bob,b,true\n"),
            ("TeacherCredentials.txt", "2001,Carol,c,true\n"),
            ("Courses.txt", "CSE101,Intro,3\nMAT201,Calculus,4\n"),
            ("enrollments.txt", "1001,CSE101\n1001,NOPE\n4242,CSE101\n"),
            ("StudentCourses.txt", "1002;mat201\n1001;CSE101\n"),
            ("AssignedCoursesTeacher.txt", "2001,CSE101\nbad line\n"),
        ]);
        let catalog = Coordinator::new(&store, &layout).build();
        assert!(catalog.roster_is_consistent());
        assert_eq!(catalog.students.get(1001).unwrap().course_ids(), ["CSE101"]);
        assert_eq!(catalog.students.get(1002).unwrap().course_ids(), ["MAT201"]);
        assert_eq!(catalog.courses.get("CSE101").unwrap().student_ids(), [1001]);
        assert_eq!(catalog.courses.get("CSE101").unwrap().teacher_ids(), [2001]);
    }

    #[test]
    fn missing_files_load_empty() {
        let (_dir, store, layout) = seed(&[]);
        let catalog = Coordinator::new(&store, &layout).build();
        assert!(catalog.students.is_empty());
        assert!(catalog.courses.is_empty());
    }

    #[test]
    fn reapplying_relations_is_idempotent() {
        let (_dir, store, layout) = seed(&[
            ("StudentCredentials.txt", "1001,Alice,a,true\n"),
            ("Courses.txt", "CSE101,Intro,3\n"),
            ("enrollments.txt", "1001,CSE101\n"),
        ]);
        let coordinator = Coordinator::new(&store, &layout);
        let mut catalog = coordinator.build();
        coordinator.apply_relations(&mut catalog);
        assert_eq!(catalog.courses.get("CSE101").unwrap().student_ids(), [1001]);
        assert_eq!(catalog.render(), coordinator.build().render());
    }
}
