//! Entities and their collections.
//!
//! Students and teachers share a [`Profile`] and carry a list of course ids.
//! Courses carry the reverse lists. The two sides are kept in step by
//! [`Catalog`](crate::Catalog); the link lists are not writable from outside
//! this crate.

use serde::{Deserialize, Serialize};

/// Identity and login fields shared by students and teachers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// Numeric id. Unique within its collection.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Plain-text password as stored in the credential file.
    pub password: String,
    /// Optional profile picture path.
    pub image_path: Option<String>,
}

impl Profile {
    /// Creates a profile without an image.
    pub fn new(id: i64, name: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            password: password.into(),
            image_path: None,
        }
    }
}

/// Common view of anything that has a profile and a set of courses.
pub trait RosterMember {
    /// Shared profile fields.
    fn profile(&self) -> &Profile;

    /// Mutable access to the profile, used for overrides.
    fn profile_mut(&mut self) -> &mut Profile;

    /// Ids of the courses this member is linked to.
    fn course_ids(&self) -> &[String];

    /// Numeric id.
    fn id(&self) -> i64 {
        self.profile().id
    }

    /// Display name.
    fn name(&self) -> &str {
        &self.profile().name
    }

    /// Number of linked courses.
    fn course_count(&self) -> usize {
        self.course_ids().len()
    }

    /// True if linked to `course_id` (case-insensitive).
    fn has_course(&self, course_id: &str) -> bool {
        self.course_ids()
            .iter()
            .any(|c| c.eq_ignore_ascii_case(course_id.trim()))
    }
}

macro_rules! roster_member {
    ($ty:ident, $doc:literal) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Serialize, Deserialize)]
        pub struct $ty {
            profile: Profile,
            courses: Vec<String>,
        }

        impl $ty {
            /// Creates a member with no linked courses.
            pub fn new(profile: Profile) -> Self {
                Self {
                    profile,
                    courses: Vec::new(),
                }
            }

            pub(crate) fn link(&mut self, course_id: &str) -> bool {
                if self.has_course(course_id) {
                    return false;
                }
                self.courses.push(course_id.to_string());
                true
            }

            pub(crate) fn unlink(&mut self, course_id: &str) -> bool {
                let before = self.courses.len();
                self.courses.retain(|c| !c.eq_ignore_ascii_case(course_id));
                self.courses.len() != before
            }

            pub(crate) fn retain_links(&mut self, mut keep: impl FnMut(&str) -> bool) {
                self.courses.retain(|c| keep(c));
            }

            #[cfg(test)]
            pub(crate) fn clear_links(&mut self) {
                self.courses.clear();
            }
        }

        impl RosterMember for $ty {
            fn profile(&self) -> &Profile {
                &self.profile
            }

            fn profile_mut(&mut self) -> &mut Profile {
                &mut self.profile
            }

            fn course_ids(&self) -> &[String] {
                &self.courses
            }
        }

        impl PartialEq for $ty {
            fn eq(&self, other: &Self) -> bool {
                self.profile.id == other.profile.id
            }
        }

        impl Eq for $ty {}
    };
}

roster_member!(Student, "A student and the courses they are enrolled in.");
roster_member!(Teacher, "A teacher and the courses assigned to them.");

impl Student {
    /// Sum of the credits of the enrolled courses, rounded to the nearest
    /// whole credit.
    pub fn total_credits(&self, courses: &CourseList) -> i64 {
        let sum: f64 = self
            .courses
            .iter()
            .filter_map(|id| courses.get(id))
            .map(|c| c.credit)
            .sum();
        sum.round() as i64
    }
}

/// A course with its enrolled students and assigned teachers.
///
/// Course ids compare case-insensitively.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Course {
    /// Course code, e.g. `CSE101`.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Credit value, always positive.
    pub credit: f64,
    students: Vec<i64>,
    teachers: Vec<i64>,
}

impl Course {
    /// Creates a course after validating its fields.
    ///
    /// Returns `None` when the trimmed id or name is empty, or the credit is
    /// not a positive finite number.
    pub fn new(id: &str, name: &str, credit: f64) -> Option<Self> {
        let (id, name) = (id.trim(), name.trim());
        if id.is_empty() || name.is_empty() || !credit.is_finite() || credit <= 0.0 {
            return None;
        }
        Some(Self {
            id: id.to_string(),
            name: name.to_string(),
            credit,
            students: Vec::new(),
            teachers: Vec::new(),
        })
    }

    /// True if `id` names this course.
    pub fn is(&self, id: &str) -> bool {
        self.id.eq_ignore_ascii_case(id.trim())
    }

    /// Ids of enrolled students.
    pub fn student_ids(&self) -> &[i64] {
        &self.students
    }

    /// Ids of assigned teachers.
    pub fn teacher_ids(&self) -> &[i64] {
        &self.teachers
    }

    pub(crate) fn link_student(&mut self, id: i64) -> bool {
        link_id(&mut self.students, id)
    }

    pub(crate) fn link_teacher(&mut self, id: i64) -> bool {
        link_id(&mut self.teachers, id)
    }

    pub(crate) fn unlink_student(&mut self, id: i64) {
        self.students.retain(|s| *s != id);
    }

    pub(crate) fn unlink_teacher(&mut self, id: i64) {
        self.teachers.retain(|t| *t != id);
    }

    pub(crate) fn clear_links(&mut self) {
        self.students.clear();
        self.teachers.clear();
    }
}

fn link_id(ids: &mut Vec<i64>, id: i64) -> bool {
    if ids.contains(&id) {
        return false;
    }
    ids.push(id);
    true
}

impl PartialEq for Course {
    fn eq(&self, other: &Self) -> bool {
        self.id.eq_ignore_ascii_case(&other.id)
    }
}

impl Eq for Course {}

/// An ordered collection of students or teachers with unique ids.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberList<T> {
    members: Vec<T>,
}

/// All known students.
pub type StudentList = MemberList<Student>;
/// All known teachers.
pub type TeacherList = MemberList<Teacher>;

impl<T: RosterMember> MemberList<T> {
    /// Creates an empty collection.
    pub fn new() -> Self {
        Self {
            members: Vec::new(),
        }
    }

    /// Adds a member. Returns `false` and drops it if the id is taken.
    pub fn add(&mut self, member: T) -> bool {
        if self.contains(member.id()) {
            return false;
        }
        self.members.push(member);
        true
    }

    /// True if the id is present.
    pub fn contains(&self, id: i64) -> bool {
        self.get(id).is_some()
    }

    /// Looks up a member by id.
    pub fn get(&self, id: i64) -> Option<&T> {
        self.members.iter().find(|m| m.id() == id)
    }

    /// Looks up a member by id for modification.
    pub fn get_mut(&mut self, id: i64) -> Option<&mut T> {
        self.members.iter_mut().find(|m| m.id() == id)
    }

    /// Removes a member by id.
    pub fn remove(&mut self, id: i64) -> Option<T> {
        let pos = self.members.iter().position(|m| m.id() == id)?;
        Some(self.members.remove(pos))
    }

    /// Iterates in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.members.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> std::slice::IterMut<'_, T> {
        self.members.iter_mut()
    }

    /// Number of members.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// True if empty.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

impl<T: RosterMember> Default for MemberList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, T> IntoIterator for &'a MemberList<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.members.iter()
    }
}

/// All known courses. Ids and names are unique, ignoring case.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CourseList {
    courses: Vec<Course>,
}

impl CourseList {
    /// Creates an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a course. Returns `false` if the id or the name is taken.
    pub fn add(&mut self, course: Course) -> bool {
        let taken = self.courses.iter().any(|c| {
            c.id.eq_ignore_ascii_case(&course.id) || c.name.eq_ignore_ascii_case(&course.name)
        });
        if taken {
            return false;
        }
        self.courses.push(course);
        true
    }

    /// Looks up a course by id, ignoring case.
    pub fn get(&self, id: &str) -> Option<&Course> {
        self.courses.iter().find(|c| c.is(id))
    }

    /// Looks up a course by id for modification.
    pub fn get_mut(&mut self, id: &str) -> Option<&mut Course> {
        self.courses.iter_mut().find(|c| c.is(id))
    }

    /// Removes a course by id.
    pub fn remove(&mut self, id: &str) -> Option<Course> {
        let pos = self.courses.iter().position(|c| c.is(id))?;
        Some(self.courses.remove(pos))
    }

    /// Iterates in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, Course> {
        self.courses.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> std::slice::IterMut<'_, Course> {
        self.courses.iter_mut()
    }

    /// Number of courses.
    pub fn len(&self) -> usize {
        self.courses.len()
    }

    /// True if empty.
    pub fn is_empty(&self) -> bool {
        self.courses.is_empty()
    }
}

impl<'a> IntoIterator for &'a CourseList {
    type Item = &'a Course;
    type IntoIter = std::slice::Iter<'a, Course>;

    fn into_iter(self) -> Self::IntoIter {
        self.courses.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn student(id: i64, name: &str) -> Student {
        Student::new(Profile::new(id, name, "pw"))
    }

    #[test]
    fn course_validation() {
        assert!(Course::new("CSE101", "Intro", 3.0).is_some());
        assert!(Course::new(" ", "Intro", 3.0).is_none());
        assert!(Course::new("CSE101", "", 3.0).is_none());
        assert!(Course::new("CSE101", "Intro", 0.0).is_none());
        assert!(Course::new("CSE101", "Intro", f64::NAN).is_none());
    }

    #[test]
    fn course_ids_ignore_case() {
        let a = Course::new("cse101", "Intro", 3.0).unwrap();
        let b = Course::new("CSE101", "Other", 1.0).unwrap();
        assert_eq!(a, b);
        assert!(a.is(" CSE101 "));
    }

    #[test]
    fn duplicate_ids_rejected() {
        let mut list = StudentList::new();
        assert!(list.add(student(1, "Alice")));
        assert!(!list.add(student(1, "Alias")));
        assert_eq!(list.len(), 1);
        assert_eq!(list.get(1).unwrap().name(), "Alice");
    }

    #[test]
    fn duplicate_course_name_rejected() {
        let mut list = CourseList::new();
        assert!(list.add(Course::new("CSE101", "Intro", 3.0).unwrap()));
        assert!(!list.add(Course::new("CSE102", "intro", 3.0).unwrap()));
        assert!(!list.add(Course::new("cse101", "Different", 3.0).unwrap()));
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn links_are_deduplicated() {
        let mut s = student(1, "Alice");
        assert!(s.link("CSE101"));
        assert!(!s.link("cse101"));
        assert_eq!(s.course_count(), 1);
        assert!(s.unlink("CSE101"));
        assert_eq!(s.course_count(), 0);
    }

    #[test]
    fn total_credits_round() {
        let mut courses = CourseList::new();
        courses.add(Course::new("A", "A", 1.5).unwrap());
        courses.add(Course::new("B", "B", 1.75).unwrap());
        let mut s = student(1, "Alice");
        s.link("A");
        s.link("B");
        assert_eq!(s.total_credits(&courses), 3);
    }
}
