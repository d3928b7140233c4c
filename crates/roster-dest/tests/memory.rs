//! Behaviour of the in-memory destination.

use chrono::NaiveDate;
use roster_dest::{Destination, MemoryDestination, created_id};
use roster_model::{
    ClassUid, DestClass, DestStudent, EntityId, FieldValue, Operation, StudentField,
    StudentNumber,
};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn class(id: i64, uniq: &str, archived: bool) -> DestClass {
    DestClass {
        id: EntityId(id),
        uniq_id: Some(uniq.to_string()),
        name: None,
        program_code: Some("ib".to_string()),
        start_term_id: Some(1),
        archived,
    }
}

fn number(value: &str) -> StudentNumber {
    StudentNumber::new(value).unwrap()
}

#[test]
fn class_enrollment_round_trips_through_memberships() {
    let mut destination = MemoryDestination::new()
        .with_student(DestStudent::new(EntityId(1), "1001"))
        .with_class(class(40, "MATH7", false))
        .with_class(class(41, "OLD7", true));

    let add = Operation::AddStudentToClass {
        student: number("1001"),
        student_id: EntityId(1),
        class: ClassUid::new("MATH7").unwrap(),
        class_id: EntityId(40),
    };
    destination.apply(&add).expect("enroll");
    destination.apply(&add).expect("enroll twice");

    let rows = destination.memberships(date(2024, 9, 1)).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].uniq_class_id, "MATH7");
    assert_eq!(destination.classes(true).unwrap().len(), 1);

    let remove = Operation::RemoveStudentFromClass {
        student: number("1001"),
        student_id: EntityId(1),
        class: ClassUid::new("MATH7").unwrap(),
        class_id: EntityId(40),
    };
    destination.apply(&remove).expect("remove");
    assert!(destination.memberships(date(2024, 9, 1)).unwrap().is_empty());
}

#[test]
fn field_updates_and_archival_mutate_the_record() {
    let mut destination =
        MemoryDestination::new().with_student(DestStudent::new(EntityId(1), "1001"));

    destination
        .apply(&Operation::UpdateStudentField {
            student: number("1001"),
            id: EntityId(1),
            field: StudentField::Birthday,
            value: Some(FieldValue::Date(date(2010, 3, 5))),
        })
        .expect("update");
    destination
        .apply(&Operation::ArchiveStudent {
            student: number("1001"),
            id: EntityId(1),
            withdrawn_on: date(2024, 9, 1),
        })
        .expect("archive");

    let student = destination.student("1001").expect("student");
    assert_eq!(student.birthday.as_deref(), Some("2010-03-05"));
    assert!(student.archived);
    assert_eq!(destination.applied.len(), 2);
}

#[test]
fn injected_failures_and_missing_ids() {
    let mut destination = MemoryDestination::new();
    destination.fail_action("archive_a_student");
    destination.answer_without_id("create_teacher");

    let archive = Operation::ArchiveStudent {
        student: number("1001"),
        id: EntityId(1),
        withdrawn_on: date(2024, 9, 1),
    };
    assert!(destination.apply(&archive).is_err());

    let create = Operation::CreateTeacher {
        payload: roster_model::TeacherPayload {
            email: roster_model::Email::new("t@school.org").unwrap(),
            first_name: None,
            last_name: None,
            middle_name: None,
        },
    };
    let response = destination.apply(&create).expect("response");
    assert_eq!(created_id(&response, "teacher"), None);
    assert!(destination.teachers.is_empty());
    assert!(destination.applied.is_empty());
}
