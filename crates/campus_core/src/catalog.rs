//! The combined student, teacher and course collections.

use crate::model::{CourseList, RosterMember, StudentList, TeacherList};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

/// One consistent snapshot of every collection.
///
/// Every mutation here keeps the relations bidirectional: a student lists a
/// course exactly when that course lists the student, and likewise for
/// teachers.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalog {
    /// All students.
    pub students: StudentList,
    /// All teachers.
    pub teachers: TeacherList,
    /// All courses.
    pub courses: CourseList,
}

impl Catalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a catalog from three collections and repairs their links.
    pub fn from_parts(students: StudentList, teachers: TeacherList, courses: CourseList) -> Self {
        let mut catalog = Self {
            students,
            teachers,
            courses,
        };
        catalog.restore_relations();
        catalog
    }

    /// Links a student and a course on both sides.
    ///
    /// Returns `false` if either side is unknown or the link already existed.
    pub fn enroll(&mut self, student_id: i64, course_id: &str) -> bool {
        let (Some(student), Some(course)) = (
            self.students.get_mut(student_id),
            self.courses.get_mut(course_id),
        ) else {
            return false;
        };
        let added = student.link(&course.id);
        course.link_student(student_id);
        added
    }

    /// Links a teacher and a course on both sides.
    pub fn assign(&mut self, teacher_id: i64, course_id: &str) -> bool {
        let (Some(teacher), Some(course)) = (
            self.teachers.get_mut(teacher_id),
            self.courses.get_mut(course_id),
        ) else {
            return false;
        };
        let added = teacher.link(&course.id);
        course.link_teacher(teacher_id);
        added
    }

    /// Removes a student and every link to them.
    pub fn remove_student(&mut self, id: i64) -> bool {
        let removed = self.students.remove(id).is_some();
        for course in self.courses.iter_mut() {
            course.unlink_student(id);
        }
        removed
    }

    /// Removes a teacher and every link to them.
    pub fn remove_teacher(&mut self, id: i64) -> bool {
        let removed = self.teachers.remove(id).is_some();
        for course in self.courses.iter_mut() {
            course.unlink_teacher(id);
        }
        removed
    }

    /// Removes a course and every link to it.
    pub fn remove_course(&mut self, id: &str) -> bool {
        let Some(course) = self.courses.remove(id) else {
            return false;
        };
        for student in self.students.iter_mut() {
            student.unlink(&course.id);
        }
        for teacher in self.teachers.iter_mut() {
            teacher.unlink(&course.id);
        }
        true
    }

    /// Rebuilds the member-side lists from the course-side lists.
    ///
    /// Used after a snapshot arrives over the wire, where the member lists
    /// may be stale or missing. The course side wins: member links the
    /// course does not confirm are dropped, and course links to unknown
    /// members are dropped. Surviving member links keep their order.
    pub fn restore_relations(&mut self) {
        let courses = &self.courses;
        for student in self.students.iter_mut() {
            let id = student.id();
            student.retain_links(|cid| {
                courses
                    .get(cid)
                    .is_some_and(|c| c.student_ids().contains(&id))
            });
        }
        for teacher in self.teachers.iter_mut() {
            let id = teacher.id();
            teacher.retain_links(|cid| {
                courses
                    .get(cid)
                    .is_some_and(|c| c.teacher_ids().contains(&id))
            });
        }

        let mut pairs = Vec::new();
        for course in self.courses.iter_mut() {
            let students = course.student_ids().to_vec();
            let teachers = course.teacher_ids().to_vec();
            course.clear_links();
            pairs.push((course.id.clone(), students, teachers));
        }

        for (course_id, students, teachers) in pairs {
            for id in students {
                self.enroll(id, &course_id);
            }
            for id in teachers {
                self.assign(id, &course_id);
            }
        }
    }

    /// Checks that every link appears on both sides.
    pub fn roster_is_consistent(&self) -> bool {
        let students_ok = self.students.iter().all(|s| {
            s.course_ids().iter().all(|cid| {
                self.courses
                    .get(cid)
                    .is_some_and(|c| c.student_ids().contains(&s.id()))
            })
        });
        let teachers_ok = self.teachers.iter().all(|t| {
            t.course_ids().iter().all(|cid| {
                self.courses
                    .get(cid)
                    .is_some_and(|c| c.teacher_ids().contains(&t.id()))
            })
        });
        let courses_ok = self.courses.iter().all(|c| {
            c.student_ids()
                .iter()
                .all(|id| self.students.get(*id).is_some_and(|s| s.has_course(&c.id)))
                && c.teacher_ids()
                    .iter()
                    .all(|id| self.teachers.get(*id).is_some_and(|t| t.has_course(&c.id)))
        });
        students_ok && teachers_ok && courses_ok
    }

    /// Rounded credit total for a student, or `None` if unknown.
    pub fn total_credits(&self, student_id: i64) -> Option<i64> {
        self.students
            .get(student_id)
            .map(|s| s.total_credits(&self.courses))
    }

    /// Deterministic text dump, one entity per line.
    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str("students:\n");
        for s in &self.students {
            let p = s.profile();
            let _ = writeln!(
                out,
                "  {} {:?} pw={:?} image={} courses=[{}]",
                p.id,
                p.name,
                p.password,
                p.image_path.as_deref().unwrap_or("-"),
                s.course_ids().join(", ")
            );
        }
        out.push_str("teachers:\n");
        for t in &self.teachers {
            let p = t.profile();
            let _ = writeln!(
                out,
                "  {} {:?} pw={:?} image={} courses=[{}]",
                p.id,
                p.name,
                p.password,
                p.image_path.as_deref().unwrap_or("-"),
                t.course_ids().join(", ")
            );
        }
        out.push_str("courses:\n");
        for c in &self.courses {
            let _ = writeln!(
                out,
                "  {} {:?} credit={} students=[{}] teachers=[{}]",
                c.id,
                c.name,
                c.credit,
                join_ids(c.student_ids()),
                join_ids(c.teacher_ids())
            );
        }
        out
    }
}

fn join_ids(ids: &[i64]) -> String {
    ids.iter()
        .map(i64::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Course, Profile, Student, Teacher};

    fn sample() -> Catalog {
        let mut catalog = Catalog::new();
        catalog
            .students
            .add(Student::new(Profile::new(1001, "Alice", "a")));
        catalog
            .students
            .add(Student::new(Profile::new(1002, "Bob", "b")));
        catalog
            .teachers
            .add(Teacher::new(Profile::new(2001, "Carol", "c")));
        catalog
            .courses
            .add(Course::new("CSE101", "Intro", 3.0).unwrap());
        catalog
            .courses
            .add(Course::new("MAT201", "Calculus", 4.0).unwrap());
        catalog
    }

    #[test]
    fn enroll_links_both_sides() {
        let mut catalog = sample();
        assert!(catalog.enroll(1001, "cse101"));
        assert!(!catalog.enroll(1001, "CSE101"));
        assert_eq!(catalog.students.get(1001).unwrap().course_ids(), ["CSE101"]);
        assert_eq!(catalog.courses.get("CSE101").unwrap().student_ids(), [1001]);
        assert!(catalog.roster_is_consistent());
    }

    #[test]
    fn unknown_sides_are_ignored() {
        let mut catalog = sample();
        assert!(!catalog.enroll(9999, "CSE101"));
        assert!(!catalog.assign(2001, "NOPE"));
        assert!(catalog.courses.get("CSE101").unwrap().student_ids().is_empty());
    }

    #[test]
    fn restore_rebuilds_member_lists() {
        let mut catalog = sample();
        catalog.enroll(1001, "CSE101");
        catalog.assign(2001, "MAT201");

        // Simulate a wire snapshot: member lists arrive empty, courses keep
        // their ids, and one course references a member that no longer exists.
        for s in catalog.students.iter_mut() {
            s.clear_links();
        }
        for t in catalog.teachers.iter_mut() {
            t.clear_links();
        }
        catalog.courses.get_mut("CSE101").unwrap().link_student(4242);
        assert!(!catalog.roster_is_consistent());

        catalog.restore_relations();
        assert!(catalog.roster_is_consistent());
        assert_eq!(catalog.students.get(1001).unwrap().course_ids(), ["CSE101"]);
        assert_eq!(catalog.teachers.get(2001).unwrap().course_ids(), ["MAT201"]);
        assert_eq!(catalog.courses.get("CSE101").unwrap().student_ids(), [1001]);
    }

    #[test]
    fn restore_keeps_member_order_and_drops_unconfirmed_links() {
        let mut catalog = sample();
        catalog.enroll(1001, "MAT201");
        catalog.enroll(1001, "CSE101");
        catalog.courses.get_mut("MAT201").unwrap().unlink_student(1001);
        catalog.students.get_mut(1002).unwrap().link("CSE101");

        catalog.restore_relations();
        assert!(catalog.roster_is_consistent());
        assert_eq!(catalog.students.get(1001).unwrap().course_ids(), ["CSE101"]);
        assert!(catalog.students.get(1002).unwrap().course_ids().is_empty());

        catalog.enroll(1001, "MAT201");
        let order = catalog.students.get(1001).unwrap().course_ids().to_vec();
        catalog.restore_relations();
        assert_eq!(catalog.students.get(1001).unwrap().course_ids(), order);
    }

    #[test]
    fn removing_entities_drops_links() {
        let mut catalog = sample();
        catalog.enroll(1001, "CSE101");
        catalog.enroll(1002, "CSE101");
        catalog.assign(2001, "CSE101");

        assert!(catalog.remove_student(1001));
        assert_eq!(catalog.courses.get("CSE101").unwrap().student_ids(), [1002]);

        assert!(catalog.remove_course("CSE101"));
        assert!(catalog.students.get(1002).unwrap().course_ids().is_empty());
        assert!(catalog.teachers.get(2001).unwrap().course_ids().is_empty());
        assert!(catalog.roster_is_consistent());
    }

    #[test]
    fn credits_and_render() {
        let mut catalog = sample();
        catalog.enroll(1001, "CSE101");
        catalog.enroll(1001, "MAT201");
        assert_eq!(catalog.total_credits(1001), Some(7));
        assert_eq!(catalog.total_credits(5), None);

        let text = catalog.render();
        assert!(text.contains("1001 \"Alice\" pw=\"a\" image=- courses=[CSE101, MAT201]"));
        assert!(text.contains("CSE101 \"Intro\" credit=3 students=[1001] teachers=[]"));
    }
}
