//! Course applications, approvals and teacher assignment.

use crate::catalog::Catalog;
use crate::error::{CoreError, CoreResult};
use crate::model::RosterMember;
use crate::records::{application_line, relation_line, RelationRecord};
use crate::sink::LineSink;
use campus_storage::{
    DataLayout, FlatFileStore, COURSE_APPLICATIONS, ENROLLMENTS, TEACHER_ASSIGNMENTS,
};
use tracing::{debug, info};

/// A student's request to join a course, not yet approved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Application {
    /// Applying student.
    pub student_id: i64,
    /// Requested course.
    pub course_id: String,
}

impl Application {
    /// Creates an application.
    pub fn new(student_id: i64, course_id: impl Into<String>) -> Self {
        Self {
            student_id,
            course_id: course_id.into(),
        }
    }

    fn matches(&self, line: &str) -> bool {
        RelationRecord::parse_enrollment(line).is_some_and(|r| {
            r.member_id == self.student_id && r.course_id.eq_ignore_ascii_case(&self.course_id)
        })
    }
}

/// All applications in the pending file, in file order.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read.
pub fn pending_applications(
    store: &FlatFileStore,
    layout: &DataLayout,
) -> CoreResult<Vec<Application>> {
    let lines = store.read_lines(&layout.course_applications())?;
    Ok(lines
        .iter()
        .filter_map(|l| RelationRecord::parse_enrollment(l))
        .map(|r| Application::new(r.member_id, r.course_id))
        .collect())
}

/// Pending applications for one course, excluding students who are
/// already enrolled in it.
///
/// # Errors
///
/// Returns an error if the pending file cannot be read.
pub fn pending_for_course(
    store: &FlatFileStore,
    layout: &DataLayout,
    catalog: &Catalog,
    course_id: &str,
) -> CoreResult<Vec<Application>> {
    let enrolled = |id: i64| {
        catalog
            .students
            .get(id)
            .is_some_and(|s| s.has_course(course_id))
    };
    let mut out: Vec<Application> = Vec::new();
    for app in pending_applications(store, layout)? {
        if !app.course_id.eq_ignore_ascii_case(course_id.trim()) || enrolled(app.student_id) {
            continue;
        }
        if !out.contains(&app) {
            out.push(app);
        }
    }
    Ok(out)
}

/// Files a new application.
///
/// # Errors
///
/// Fails if the student or course is unknown, or the sink write fails.
pub async fn apply_for_course<S: LineSink + Sync>(
    sink: &S,
    catalog: &Catalog,
    student_id: i64,
    course_id: &str,
) -> CoreResult<()> {
    let course = catalog
        .courses
        .get(course_id)
        .ok_or_else(|| CoreError::UnknownCourse(course_id.to_string()))?;
    let student = catalog
        .students
        .get(student_id)
        .ok_or(CoreError::UnknownStudent(student_id))?;
    if student.has_course(&course.id) {
        return Err(CoreError::Duplicate(format!("{student_id} in {}", course.id)));
    }
    let path = DataLayout::relative(COURSE_APPLICATIONS);
    sink.write_line(&path, &application_line(student_id, &course.id))
        .await
}

/// Approves an application.
///
/// Appends the enrollment through `sink`, drops the application from the
/// local pending file, and links both sides in `catalog`.
///
/// # Errors
///
/// Fails if the student or course is unknown, or either write fails. The
/// application is kept if the enrollment write fails.
pub async fn approve<S: LineSink + Sync>(
    sink: &S,
    store: &FlatFileStore,
    layout: &DataLayout,
    catalog: &mut Catalog,
    app: &Application,
) -> CoreResult<()> {
    let course_id = catalog
        .courses
        .get(&app.course_id)
        .map(|c| c.id.clone())
        .ok_or_else(|| CoreError::UnknownCourse(app.course_id.clone()))?;
    if !catalog.students.contains(app.student_id) {
        return Err(CoreError::UnknownStudent(app.student_id));
    }

    let path = DataLayout::relative(ENROLLMENTS);
    sink.write_line(&path, &relation_line(app.student_id, &course_id))
        .await?;
    withdraw(store, layout, app)?;
    catalog.enroll(app.student_id, &course_id);
    info!(student = app.student_id, course = %course_id, "application approved");
    Ok(())
}

/// Removes an application without enrolling. Returns the number of lines
/// removed.
///
/// # Errors
///
/// Returns an error if the pending file cannot be rewritten.
pub fn withdraw(
    store: &FlatFileStore,
    layout: &DataLayout,
    app: &Application,
) -> CoreResult<usize> {
    let removed = store.remove_lines(&layout.course_applications(), |l| app.matches(l))?;
    debug!(student = app.student_id, course = %app.course_id, removed, "application withdrawn");
    Ok(removed)
}

/// Assigns a teacher to a course.
///
/// Returns `false` without writing if the assignment already exists.
///
/// # Errors
///
/// Fails if the teacher or course is unknown, or the sink write fails.
pub async fn assign_course<S: LineSink + Sync>(
    sink: &S,
    catalog: &mut Catalog,
    teacher_id: i64,
    course_id: &str,
) -> CoreResult<bool> {
    let course_id = catalog
        .courses
        .get(course_id)
        .map(|c| c.id.clone())
        .ok_or_else(|| CoreError::UnknownCourse(course_id.to_string()))?;
    let teacher = catalog
        .teachers
        .get(teacher_id)
        .ok_or(CoreError::UnknownTeacher(teacher_id))?;
    if teacher.has_course(&course_id) {
        return Ok(false);
    }

    let path = DataLayout::relative(TEACHER_ASSIGNMENTS);
    sink.write_line(&path, &relation_line(teacher_id, &course_id))
        .await?;
    Ok(catalog.assign(teacher_id, &course_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinator::Coordinator;
    use crate::sink::LocalSink;
    use std::fs;
    use tempfile::TempDir;

    fn seeded() -> (TempDir, FlatFileStore, DataLayout) {
        let dir = TempDir::new().unwrap();
        let layout = DataLayout::new(dir.path());
        fs::create_dir_all(dir.path().join("database")).unwrap();
        fs::write(
            layout.student_credentials(),
            "1001,Alice,a,true\n1002,Bob,b,true\n",
        )
        .unwrap();
        fs::write(layout.teacher_credentials(), "2001,Carol,c,true\n").unwrap();
        fs::write(layout.courses(), "CSE101,Intro,3\nMAT201,Calculus,4\n").unwrap();
        fs::write(layout.database_file("enrollments.txt"), "1002,CSE101\n").unwrap();
        fs::write(
            layout.course_applications(),
            "1001;CSE101\n1002;CSE101\n1001,MAT201\n",
        )
        .unwrap();
        let store = FlatFileStore::new(dir.path());
        (dir, store, layout)
    }

    #[test]
    fn pending_excludes_enrolled_students() {
        let (_dir, store, layout) = seeded();
        let catalog = Coordinator::new(&store, &layout).build();
        let pending = pending_for_course(&store, &layout, &catalog, "cse101").unwrap();
        assert_eq!(pending, vec![Application::new(1001, "CSE101")]);
    }

    #[tokio::test]
    async fn approve_enrolls_and_clears_application() {
        let (_dir, store, layout) = seeded();
        let mut catalog = Coordinator::new(&store, &layout).build();
        let sink = LocalSink::new(&store);

        approve(&sink, &store, &layout, &mut catalog, &Application::new(1001, "CSE101"))
            .await
            .unwrap();

        assert!(catalog.students.get(1001).unwrap().has_course("CSE101"));
        assert!(catalog.roster_is_consistent());
        assert!(pending_for_course(&store, &layout, &catalog, "CSE101")
            .unwrap()
            .is_empty());

        let reloaded = Coordinator::new(&store, &layout).build();
        assert_eq!(
            reloaded.courses.get("CSE101").unwrap().student_ids(),
            [1002, 1001]
        );
        assert_eq!(pending_applications(&store, &layout).unwrap().len(), 2);
    }

    #[tokio::test]
    async fn approve_unknown_course_fails() {
        let (_dir, store, layout) = seeded();
        let mut catalog = Coordinator::new(&store, &layout).build();
        let sink = LocalSink::new(&store);
        let err = approve(&sink, &store, &layout, &mut catalog, &Application::new(1001, "NOPE"))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn withdraw_accepts_either_format() {
        let (_dir, store, layout) = seeded();
        assert_eq!(
            withdraw(&store, &layout, &Application::new(1001, "mat201")).unwrap(),
            1
        );
        assert_eq!(pending_applications(&store, &layout).unwrap().len(), 2);
    }

    #[tokio::test]
    async fn apply_then_assign() {
        let (_dir, store, layout) = seeded();
        let mut catalog = Coordinator::new(&store, &layout).build();
        let sink = LocalSink::new(&store);

        apply_for_course(&sink, &catalog, 1002, "MAT201").await.unwrap();
        let err = apply_for_course(&sink, &catalog, 1002, "CSE101")
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Duplicate(_)));

        assert!(assign_course(&sink, &mut catalog, 2001, "MAT201").await.unwrap());
        assert!(!assign_course(&sink, &mut catalog, 2001, "mat201").await.unwrap());

        let reloaded = Coordinator::new(&store, &layout).build();
        assert_eq!(reloaded.teachers.get(2001).unwrap().course_ids(), ["MAT201"]);
        assert_eq!(
            pending_for_course(&store, &layout, &reloaded, "MAT201").unwrap(),
            vec![Application::new(1001, "MAT201"), Application::new(1002, "MAT201")]
        );
    }
}
