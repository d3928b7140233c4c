//! Report assembly from an audit log.

use roster_ingest::{FlatTable, SourceEntity};
use roster_model::{AuditLog, ClassUid, MissingClass, OperationRecord, StudentNumber, actions};
use roster_report::{ExportKind, RunReport};
use serde_json::json;

fn record(action: &str, error: bool, change: bool) -> OperationRecord {
    OperationRecord {
        description: "1001".to_string(),
        action: action.to_string(),
        error,
        change,
        response: None,
        body: None,
    }
}

fn busy_log() -> AuditLog {
    let mut log = AuditLog::new();
    log.push(record("create_student", false, true));
    log.push(record("add_to_year_group", false, true));
    log.push(record("create_student", false, true));
    log.push(OperationRecord::problem(actions::FIELD_CHECK, "Kim, Bo", None));
    log.push(record("archive_a_student", true, false));
    log.push(OperationRecord::note(actions::MISSING_EMAIL, "", "1001 has no parent email for guardian2"));
    log.push_missing_class(MissingClass::new(
        ClassUid::new("ART7").unwrap(),
        StudentNumber::new("1001").unwrap(),
    ));
    log
}

#[test]
fn summary_lists_errors_then_changes() {
    let report = RunReport::build(&busy_log(), &[]).unwrap();
    assert_eq!(report.subject(), "Sync Output (2 errors 3 changes)");
    insta::assert_snapshot!(report.body(), @r"
    Executed, but some errors happened:
    archive_a_student  1
    field_check        1

    Summary of changes made:
    create_student     2
    add_to_year_group  1
    ");
}

#[test]
fn changes_only_subject() {
    let mut log = AuditLog::new();
    log.push(record("create_teacher", false, true));
    let report = RunReport::build(&log, &[]).unwrap();
    assert_eq!(report.subject(), "Sync Output (1 changes)");
    assert!(report.body().starts_with("Summary of changes made:\n"));
}

#[test]
fn exports_are_written_with_stamp() {
    let table = FlatTable::from_records(&[json!({"tables": {"students": {"student_number": "1001"}}})]);
    let report = RunReport::build(&busy_log(), &[(SourceEntity::Students, table)]).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let written = report.write_to(dir.path(), "2024-09-01-test").unwrap();
    let names: Vec<String> = written
        .iter()
        .map(|path| path.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(
        names,
        [
            "executions_2024-09-01-test.csv",
            "missing_classes_2024-09-01-test.csv",
            "source_students.csv",
        ]
    );

    let missing = std::fs::read_to_string(dir.path().join("missing_classes_2024-09-01-test.csv")).unwrap();
    assert_eq!(missing, "description,error,body\nART7,true,1001\n");

    let source = report.exports.get(ExportKind::Source(SourceEntity::Students)).unwrap();
    assert_eq!(
        String::from_utf8(source.content.clone()).unwrap(),
        "tables.students.student_number\n1001\n"
    );
    assert_eq!(ExportKind::Executions.attachment_name(), "sync_output.csv");
}
