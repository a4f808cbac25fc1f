//! Property tests for the load rules of the coordination engine.

use campus_core::{Coordinator, RosterMember};
use campus_testkit::{course_row_strategy, credential_file_strategy, TestDataRoot};
use proptest::prelude::*;
use std::collections::HashSet;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn credential_row_included_iff_integer_id_and_approved(
        cases in credential_file_strategy(4_999_999_990, 24)
    ) {
        let root = TestDataRoot::empty();
        let body: String = cases.iter().map(|c| format!("{}\n", c.line)).collect();
        root.write_file("StudentCredentials.txt", &body);

        let students = Coordinator::new(root.store(), root.layout()).load_students();
        let loaded: Vec<i64> = students.iter().map(|s| s.id()).collect();
        let expected: Vec<i64> = cases
            .iter()
            .filter(|c| c.expected_included())
            .filter_map(|c| c.id)
            .collect();
        prop_assert_eq!(loaded, expected);
    }

    #[test]
    fn first_course_with_id_or_name_survives(
        rows in prop::collection::vec(course_row_strategy(), 0..16)
    ) {
        let root = TestDataRoot::empty();
        let body: String = rows
            .iter()
            .map(|(id, name, credit)| format!("{id},{name},{credit}\n"))
            .collect();
        root.write_file("Courses.txt", &body);

        let courses = Coordinator::new(root.store(), root.layout()).load_courses();

        let mut seen_ids = HashSet::new();
        let mut seen_names = HashSet::new();
        let mut expected = Vec::new();
        for (id, name, credit) in &rows {
            let valid = credit.parse::<f64>().map(|c| c > 0.0).unwrap_or(false);
            if !valid {
                continue;
            }
            let (id_key, name_key) = (id.to_lowercase(), name.to_lowercase());
            if seen_ids.contains(&id_key) || seen_names.contains(&name_key) {
                continue;
            }
            seen_ids.insert(id_key);
            seen_names.insert(name_key);
            expected.push((id.clone(), name.clone()));
        }

        let actual: Vec<(String, String)> = courses
            .iter()
            .map(|c| (c.id.clone(), c.name.clone()))
            .collect();
        prop_assert_eq!(actual, expected);
    }
}

#[test]
fn seeded_catalog_keeps_both_sides_linked() {
    let root = TestDataRoot::seeded();
    let catalog = Coordinator::new(root.store(), root.layout()).build();
    assert!(catalog.roster_is_consistent());
    for student in &catalog.students {
        for course_id in student.course_ids() {
            let course = catalog.courses.get(course_id).unwrap();
            assert!(course.student_ids().contains(&student.id()));
        }
    }
    for course in &catalog.courses {
        for id in course.student_ids() {
            assert!(catalog.students.get(*id).unwrap().has_course(&course.id));
        }
    }
}
