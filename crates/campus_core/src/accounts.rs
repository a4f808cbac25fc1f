//! Login, registration and account removal.

use crate::catalog::Catalog;
use crate::error::{CoreError, CoreResult};
use crate::model::RosterMember;
use crate::records::{credential_line, CredentialRecord, RelationRecord};
use crate::sink::LineSink;
use campus_storage::{
    first_field, DataLayout, FlatFileStore, STUDENT_CREDENTIALS, TEACHER_CREDENTIALS,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use tracing::info;

/// Account kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// A student account.
    Student,
    /// A teacher account.
    Teacher,
    /// The single administrator.
    Admin,
}

impl Role {
    /// Credential file name for this role, if it has one.
    pub fn credentials_file(self) -> Option<&'static str> {
        match self {
            Self::Student => Some(STUDENT_CREDENTIALS),
            Self::Teacher => Some(TEACHER_CREDENTIALS),
            Self::Admin => None,
        }
    }

    fn credentials_path(self, layout: &DataLayout) -> Option<PathBuf> {
        self.credentials_file().map(|f| layout.database_file(f))
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Student => write!(f, "student"),
            Self::Teacher => write!(f, "teacher"),
            Self::Admin => write!(f, "admin"),
        }
    }
}

/// The administrator login, which is not stored in any record file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminCredentials {
    /// Admin id.
    pub id: i64,
    /// Admin password.
    pub password: String,
}

impl Default for AdminCredentials {
    fn default() -> Self {
        Self {
            id: 707070,
            password: "csedu30".to_string(),
        }
    }
}

/// Who is logged in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    /// Account kind.
    pub role: Role,
    /// Account id.
    pub id: i64,
}

/// Checks a login against the loaded catalog (or the admin credentials).
///
/// Passwords are compared as plain text.
pub fn authenticate(
    catalog: &Catalog,
    role: Role,
    id: i64,
    password: &str,
    admin: &AdminCredentials,
) -> Option<CurrentUser> {
    let ok = match role {
        Role::Student => catalog
            .students
            .get(id)
            .is_some_and(|s| s.profile().password == password),
        Role::Teacher => catalog
            .teachers
            .get(id)
            .is_some_and(|t| t.profile().password == password),
        Role::Admin => admin.id == id && admin.password == password,
    };
    ok.then_some(CurrentUser { role, id })
}

/// Requests a new account. The row stays unapproved until
/// [`approve_registration`] runs.
///
/// # Errors
///
/// Fails for [`Role::Admin`] or if the sink write fails.
pub async fn register<S: LineSink + Sync>(
    sink: &S,
    role: Role,
    id: i64,
    name: &str,
    password: &str,
) -> CoreResult<()> {
    write_credential(sink, role, &CredentialRecord {
        id,
        name: name.to_string(),
        password: password.to_string(),
        approved: false,
    })
    .await
}

/// Marks a registration as approved.
///
/// # Errors
///
/// Fails for [`Role::Admin`] or if the sink write fails.
pub async fn approve_registration<S: LineSink + Sync>(
    sink: &S,
    role: Role,
    record: &CredentialRecord,
) -> CoreResult<()> {
    let approved = CredentialRecord {
        approved: true,
        ..record.clone()
    };
    write_credential(sink, role, &approved).await?;
    info!(%role, id = record.id, "registration approved");
    Ok(())
}

async fn write_credential<S: LineSink + Sync>(
    sink: &S,
    role: Role,
    record: &CredentialRecord,
) -> CoreResult<()> {
    let file = role
        .credentials_file()
        .ok_or_else(|| CoreError::InvalidRecord("admin has no credential file".into()))?;
    let line = credential_line(record.id, &record.name, &record.password, record.approved);
    sink.write_line(&DataLayout::relative(file), &line).await
}

/// Credential rows still waiting for approval.
///
/// # Errors
///
/// Returns an error if the credential file cannot be read.
pub fn pending_registrations(
    store: &FlatFileStore,
    layout: &DataLayout,
    role: Role,
) -> CoreResult<Vec<CredentialRecord>> {
    let Some(path) = role.credentials_path(layout) else {
        return Ok(Vec::new());
    };
    Ok(store
        .read_lines(&path)?
        .iter()
        .filter_map(|l| CredentialRecord::parse(l))
        .filter(|r| !r.approved)
        .collect())
}

/// Deletes a student's credential, profile, enrollment and application rows,
/// and drops them from `catalog`. Returns the number of lines removed.
///
/// # Errors
///
/// Returns an error if any file cannot be rewritten. Files already
/// rewritten stay rewritten.
pub fn remove_student(
    store: &FlatFileStore,
    layout: &DataLayout,
    catalog: &mut Catalog,
    id: i64,
) -> CoreResult<usize> {
    let key = id.to_string();
    let mut removed = store.remove_by_key(&layout.student_credentials(), &key, ',')?;
    removed += store.remove_by_key(&layout.student_profiles(), &key, ',')?;
    let names_student =
        |l: &str| RelationRecord::parse_enrollment(l).is_some_and(|r| r.member_id == id);
    for path in layout.enrollment_files() {
        removed += store.remove_lines(&path, names_student)?;
    }
    removed += store.remove_lines(&layout.course_applications(), names_student)?;
    catalog.remove_student(id);
    info!(id, removed, "student removed");
    Ok(removed)
}

/// Deletes a teacher's credential, profile and assignment rows, and drops
/// them from `catalog`.
///
/// # Errors
///
/// Returns an error if any file cannot be rewritten.
pub fn remove_teacher(
    store: &FlatFileStore,
    layout: &DataLayout,
    catalog: &mut Catalog,
    id: i64,
) -> CoreResult<usize> {
    let key = id.to_string();
    let mut removed = store.remove_by_key(&layout.teacher_credentials(), &key, ',')?;
    removed += store.remove_by_key(&layout.teacher_profiles(), &key, ',')?;
    removed += store.remove_lines(&layout.teacher_assignments(), |l| {
        RelationRecord::parse(l, ',').is_some_and(|r| r.member_id == id)
    })?;
    catalog.remove_teacher(id);
    info!(id, removed, "teacher removed");
    Ok(removed)
}

/// Deletes a course row and every relation or application naming it.
///
/// # Errors
///
/// Returns an error if any file cannot be rewritten.
pub fn remove_course(
    store: &FlatFileStore,
    layout: &DataLayout,
    catalog: &mut Catalog,
    course_id: &str,
) -> CoreResult<usize> {
    let course_id = course_id.trim();
    let names_course = |l: &str| {
        RelationRecord::parse_enrollment(l)
            .is_some_and(|r| r.course_id.eq_ignore_ascii_case(course_id))
    };
    let mut removed = store.remove_lines(&layout.courses(), |l| {
        first_field(l, ',').eq_ignore_ascii_case(course_id)
    })?;
    for path in layout.enrollment_files() {
        removed += store.remove_lines(&path, names_course)?;
    }
    removed += store.remove_lines(&layout.teacher_assignments(), names_course)?;
    removed += store.remove_lines(&layout.course_applications(), names_course)?;
    catalog.remove_course(course_id);
    info!(course = course_id, removed, "course removed");
    Ok(removed)
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
        fs::write(layout.student_credentials(), "1001,Alice,a,true\n1002,Bob,b,true\n").unwrap();
        fs::write(layout.teacher_credentials(), "2001,Carol,c,true\n").unwrap();
        fs::write(layout.courses(), "CSE101,Intro,3\nMAT201,Calculus,4\n").unwrap();
        fs::write(layout.student_profiles(), "1001,,newpw,\n").unwrap();
        fs::write(layout.database_file("enrollments.txt"), "1001,CSE101\n1002,MAT201\n").unwrap();
        fs::write(layout.database_file("StudentCourses.txt"), "1001;MAT201\n").unwrap();
        fs::write(layout.teacher_assignments(), "2001,CSE101\n").unwrap();
        fs::write(layout.course_applications(), "1002;CSE101\n").unwrap();
        let store = FlatFileStore::new(dir.path());
        (dir, store, layout)
    }

    #[test]
    fn authenticate_by_role() {
        let (_dir, store, layout) = seeded();
        let catalog = Coordinator::new(&store, &layout).build();
        let admin = AdminCredentials::default();

        assert_eq!(
            authenticate(&catalog, Role::Student, 1001, "newpw", &admin),
            Some(CurrentUser { role: Role::Student, id: 1001 })
        );
        assert!(authenticate(&catalog, Role::Student, 1001, "a", &admin).is_none());
        assert!(authenticate(&catalog, Role::Teacher, 1001, "newpw", &admin).is_none());
        assert!(authenticate(&catalog, Role::Admin, 707070, "csedu30", &admin).is_some());
    }

    #[tokio::test]
    async fn registration_becomes_visible_after_approval() {
        let (_dir, store, layout) = seeded();
        let sink = LocalSink::new(&store);

        register(&sink, Role::Student, 5_000_000_001, "Dana", "pw").await.unwrap();
        let catalog = Coordinator::new(&store, &layout).build();
        assert!(!catalog.students.contains(5_000_000_001));

        let pending = pending_registrations(&store, &layout, Role::Student).unwrap();
        assert_eq!(pending.len(), 1);
        approve_registration(&sink, Role::Student, &pending[0]).await.unwrap();

        let catalog = Coordinator::new(&store, &layout).build();
        assert!(catalog.students.contains(5_000_000_001));
        let rows = store.read_lines(&layout.student_credentials()).unwrap();
        assert_eq!(rows.iter().filter(|l| l.starts_with("5000000001,")).count(), 1);
    }

    #[tokio::test]
    async fn admin_cannot_register() {
        let (_dir, store, _layout) = seeded();
        let sink = LocalSink::new(&store);
        assert!(register(&sink, Role::Admin, 1, "x", "y").await.is_err());
    }

    #[test]
    fn remove_student_rewrites_every_file() {
        let (_dir, store, layout) = seeded();
        let mut catalog = Coordinator::new(&store, &layout).build();
        assert_eq!(remove_student(&store, &layout, &mut catalog, 1001).unwrap(), 4);
        assert!(!catalog.students.contains(1001));
        assert!(catalog.roster_is_consistent());

        let reloaded = Coordinator::new(&store, &layout).build();
        assert_eq!(reloaded.render(), catalog.render());
    }

    #[test]
    fn remove_course_rewrites_relations() {
        let (_dir, store, layout) = seeded();
        let mut catalog = Coordinator::new(&store, &layout).build();
        assert_eq!(remove_course(&store, &layout, &mut catalog, "cse101").unwrap(), 4);
        let reloaded = Coordinator::new(&store, &layout).build();
        assert!(reloaded.courses.get("CSE101").is_none());
        assert!(reloaded.teachers.get(2001).unwrap().course_ids().is_empty());
        assert_eq!(reloaded.render(), catalog.render());
    }

    #[test]
    fn remove_teacher_drops_assignments() {
        let (_dir, store, layout) = seeded();
        let mut catalog = Coordinator::new(&store, &layout).build();
        assert_eq!(remove_teacher(&store, &layout, &mut catalog, 2001).unwrap(), 2);
        assert!(catalog.courses.get("CSE101").unwrap().teacher_ids().is_empty());
    }
}
