//! Tests for roster-model types.

use roster_model::{
    AcademicCatalog, DestStudent, FieldMapping, NameFallback, OtherNameTarget, SourceEnrollment,
    StudentNumber, YearGroup,
};

#[test]
fn mapping_overrides_from_toml() {
    let text = r#"
        other_name_target = "nickname"

        [grades]
        ignored_year_groups = [11, 12]

        [[parents.guardians]]
        label = "Mother"
        email = "tables.students.mother_school_email"
        role = "Mother"
        gender = "Female"
        name_fallback = "underscore_last_first"
    "#;
    let mapping: FieldMapping = toml::from_str(text).expect("parse mapping");

    assert_eq!(mapping.other_name_target, OtherNameTarget::Nickname);
    assert_eq!(mapping.grades.ignored_year_groups, vec![11, 12]);
    assert_eq!(mapping.grades.labels.get("KG"), Some(&1));
    assert_eq!(mapping.students.grade, "tables.students.grade");

    let mother = &mapping.parents.guardians[0];
    assert_eq!(mapping.parents.guardians.len(), 1);
    assert_eq!(mother.default_role(), "Mother");
    assert_eq!(mother.name_fallback, NameFallback::UnderscoreLastFirst);
    assert!(mother.relationship.is_none());
}

#[test]
fn destination_student_ignores_unknown_fields() {
    let json = r#"{"id": 42, "student_id": "1001", "archived": true, "photo_url": "x"}"#;
    let student: DestStudent = serde_json::from_str(json).expect("deserialize student");
    assert_eq!(student.id.get(), 42);
    assert_eq!(student.student_id.as_deref(), Some("1001"));
    assert!(student.archived);
    assert!(student.birthday.is_none());
}

#[test]
fn year_group_label_prefers_name() {
    let json = r#"{"id": 7, "grade": "Grade 6", "grade_number": 7, "student_ids": [3, 1]}"#;
    let group: YearGroup = serde_json::from_str(json).expect("deserialize year group");
    assert_eq!(group.label(), "Grade 6");
    assert_eq!(group.student_ids.len(), 2);
}

#[test]
fn catalog_resolves_term_start_across_years() {
    let json = r#"{
        "ib": {"academic_years": [
            {"id": 1, "academic_terms": [{"id": 10, "starts_on": "2023-08-15"}]},
            {"id": 2, "academic_terms": [{"id": 20, "starts_on": "2024-08-14"}]}
        ]}
    }"#;
    let catalog: AcademicCatalog = serde_json::from_str(json).expect("deserialize catalog");
    let start = catalog.term_start("ib", 20).expect("term start");
    assert_eq!(start.to_string(), "2024-08-14");
    assert!(catalog.term_start("ib", 99).is_none());
    assert!(catalog.term_start("myp", 10).is_none());
}

#[test]
fn lettered_section_is_folded_into_class_id() {
    let student = StudentNumber::new("1001").expect("student number");
    let enrollment =
        SourceEnrollment::from_section(student, "ENG9", Some("B")).expect("enrollment");
    assert_eq!(enrollment.class.as_str(), "ENG9B");
    assert!(enrollment.sectioned);
}
