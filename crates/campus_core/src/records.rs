//! Parsing and building the lines of the record files.
//!
//! Fields are comma-separated with no escaping, so builders strip the
//! delimiter and line breaks out of free-text fields before joining.
//! Parsers return `None` for malformed lines; callers skip them.

use crate::model::{Course, Profile};

/// One row of a credential file: `id,name,password,approved`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialRecord {
    /// Numeric id.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Password.
    pub password: String,
    /// Whether an administrator has approved the account.
    pub approved: bool,
}

impl CredentialRecord {
    /// Parses a credential row.
    ///
    /// Needs at least four fields and an integer id. `approved` is true
    /// only for a case-insensitive `true`.
    pub fn parse(line: &str) -> Option<Self> {
        let parts: Vec<&str> = line.trim().split(',').collect();
        if parts.len() < 4 {
            return None;
        }
        let id = parts[0].trim().parse().ok()?;
        Some(Self {
            id,
            name: parts[1].trim().to_string(),
            password: parts[2].trim().to_string(),
            approved: parts[3].trim().eq_ignore_ascii_case("true"),
        })
    }

    /// The profile this row describes.
    pub fn to_profile(&self) -> Profile {
        Profile::new(self.id, self.name.clone(), self.password.clone())
    }

    /// Serializes the row.
    pub fn to_line(&self) -> String {
        credential_line(self.id, &self.name, &self.password, self.approved)
    }
}

/// One row of a profile file: `id,name,password,imagePath`.
///
/// Blank fields mean "keep the current value".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileOverride {
    /// Id of the member to update.
    pub id: i64,
    /// Replacement name.
    pub name: Option<String>,
    /// Replacement password.
    pub password: Option<String>,
    /// Replacement image path.
    pub image_path: Option<String>,
}

impl ProfileOverride {
    /// Parses a profile row. Needs at least an integer id and one more field.
    pub fn parse(line: &str) -> Option<Self> {
        let parts: Vec<&str> = line.trim().splitn(4, ',').collect();
        if parts.len() < 2 {
            return None;
        }
        let id = parts[0].trim().parse().ok()?;
        let field = |i: usize| {
            parts
                .get(i)
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };
        Some(Self {
            id,
            name: field(1),
            password: field(2),
            image_path: field(3),
        })
    }

    /// Applies the non-blank fields to `profile`.
    pub fn apply(&self, profile: &mut Profile) {
        if let Some(name) = &self.name {
            profile.name.clone_from(name);
        }
        if let Some(password) = &self.password {
            profile.password.clone_from(password);
        }
        if let Some(image) = &self.image_path {
            profile.image_path = Some(image.clone());
        }
    }
}

/// Parses a course row: `id,name,credit`.
///
/// The name may not contain commas; anything after the second comma is
/// the credit field.
pub fn parse_course(line: &str) -> Option<Course> {
    let parts: Vec<&str> = line.trim().splitn(3, ',').collect();
    if parts.len() != 3 {
        return None;
    }
    let credit: f64 = parts[2].trim().parse().ok()?;
    Course::new(parts[0], parts[1], credit)
}

/// A `memberId<delim>courseId` relation row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationRecord {
    /// Student or teacher id.
    pub member_id: i64,
    /// Course id as written.
    pub course_id: String,
}

impl RelationRecord {
    /// Parses a relation row split on `delimiter`.
    pub fn parse(line: &str, delimiter: char) -> Option<Self> {
        let (member, course) = line.trim().split_once(delimiter)?;
        let member_id = member.trim().parse().ok()?;
        let course_id = course.trim();
        if course_id.is_empty() {
            return None;
        }
        Some(Self {
            member_id,
            course_id: course_id.to_string(),
        })
    }

    /// Parses a student relation row in either format.
    ///
    /// A row containing `;` is split on `;`, otherwise on `,`.
    pub fn parse_enrollment(line: &str) -> Option<Self> {
        let delimiter = if line.contains(';') { ';' } else { ',' };
        Self::parse(line, delimiter)
    }
}

/// Strips a delimiter and line breaks out of a free-text field.
pub fn sanitize_field(value: &str, delimiter: char) -> String {
    value
        .chars()
        .map(|c| {
            if c == delimiter || c == '\n' || c == '\r' {
                ' '
            } else {
                c
            }
        })
        .collect::<String>()
        .trim()
        .to_string()
}

/// Builds a credential row.
pub fn credential_line(id: i64, name: &str, password: &str, approved: bool) -> String {
    format!(
        "{id},{},{},{approved}",
        sanitize_field(name, ','),
        sanitize_field(password, ',')
    )
}

/// Builds a profile row. `None` fields are left blank.
pub fn profile_line(
    id: i64,
    name: Option<&str>,
    password: Option<&str>,
    image_path: Option<&str>,
) -> String {
    let field = |v: Option<&str>| v.map(|s| sanitize_field(s, ',')).unwrap_or_default();
    format!(
        "{id},{},{},{}",
        field(name),
        field(password),
        field(image_path)
    )
}

/// Builds a course row.
pub fn course_line(id: &str, name: &str, credit: f64) -> String {
    format!(
        "{},{},{credit}",
        sanitize_field(id, ','),
        sanitize_field(name, ',')
    )
}

/// Builds a comma-separated relation row.
pub fn relation_line(member_id: i64, course_id: &str) -> String {
    format!("{member_id},{}", sanitize_field(course_id, ','))
}

/// Builds a pending application row.
pub fn application_line(student_id: i64, course_id: &str) -> String {
    format!("{student_id};{}", sanitize_field(course_id, ';'))
}
