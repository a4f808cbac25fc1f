//! Property-based test generators using proptest.

use proptest::prelude::*;

/// A generated credential row and whether the loader should keep it.
#[derive(Debug, Clone)]
pub struct CredentialCase {
    /// The row as written to the file.
    pub line: String,
    /// Id the row parses to, if any.
    pub id: Option<i64>,
    /// Whether the row carries an approved flag of `true`.
    pub approved: bool,
}

impl CredentialCase {
    /// True if the row must appear in the rebuilt collection.
    pub fn expected_included(&self) -> bool {
        self.id.is_some() && self.approved
    }
}

fn approved_flag_strategy() -> impl Strategy<Value = (String, bool)> {
    prop_oneof![
        Just(("true".to_string(), true)),
        Just(("TRUE".to_string(), true)),
        Just((" True ".to_string(), true)),
        Just(("false".to_string(), false)),
        Just(("yes".to_string(), false)),
        Just(("1".to_string(), false)),
        Just((String::new(), false)),
    ]
}

/// Strategy for one credential row whose id, when valid, is `id`.
///
/// Rows may have a non-numeric id or too few fields.
pub fn credential_case_strategy(id: i64) -> impl Strategy<Value = CredentialCase> {
    (
        prop::bool::weighted(0.8),
        prop::bool::weighted(0.9),
        "[A-Za-z][A-Za-z ]{0,11}",
        "[a-z0-9]{1,8}",
        approved_flag_strategy(),
    )
        .prop_map(move |(valid_id, full, name, password, (flag, approved))| {
            let id_text = if valid_id { id.to_string() } else { format!("x{id}") };
            let line = if full {
                format!("{id_text},{name},{password},{flag}")
            } else {
                format!("{id_text},{name},{password}")
            };
            CredentialCase {
                line,
                id: valid_id.then_some(id),
                approved: full && approved,
            }
        })
}

/// Strategy for a credential file of up to `max` rows with distinct ids.
///
/// Ids start at `base` and may exceed the 32-bit range.
pub fn credential_file_strategy(
    base: i64,
    max: usize,
) -> impl Strategy<Value = Vec<CredentialCase>> {
    (0..=max).prop_flat_map(move |len| {
        (0..len)
            .map(|i| credential_case_strategy(base + i as i64).boxed())
            .collect::<Vec<_>>()
    })
}

/// Strategy for course rows drawn from small id and name pools, so that
/// collisions are common.
pub fn course_row_strategy() -> impl Strategy<Value = (String, String, String)> {
    (
        prop::sample::select(vec!["CSE101", "cse101", "MAT201", "PHY150", "ENG105"]),
        prop::sample::select(vec!["Intro", "intro", "Calculus", "Physics", "Writing"]),
        prop_oneof![
            (1u8..=5).prop_map(|c| c.to_string()),
            Just("2.5".to_string()),
            Just("zero".to_string()),
            Just("0".to_string()),
        ],
    )
        .prop_map(|(id, name, credit)| (id.to_string(), name.to_string(), credit))
}
