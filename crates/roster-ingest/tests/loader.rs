//! Snapshot loading against a canned source.

use std::cell::RefCell;
use std::collections::HashMap;

use roster_ingest::{SnapshotLoader, SourceApi, SourceEntity, SourceQueries};
use roster_model::{FieldMapping, LoadError, StudentNumber};
use serde_json::{Value, json};

/// Serves fixed pages per query and remembers every request.
#[derive(Default)]
struct CannedSource {
    pages: HashMap<String, Vec<Vec<Value>>>,
    requests: RefCell<Vec<(String, u32, u32)>>,
}

impl CannedSource {
    fn with_pages(mut self, query: &str, pages: Vec<Vec<Value>>) -> Self {
        self.pages.insert(query.to_string(), pages);
        self
    }
}

impl SourceApi for CannedSource {
    fn fetch_page(
        &self,
        query: &str,
        page: u32,
        page_size: u32,
    ) -> Result<Option<Vec<Value>>, LoadError> {
        self.requests
            .borrow_mut()
            .push((query.to_string(), page, page_size));
        Ok(self
            .pages
            .get(query)
            .and_then(|pages| pages.get(page as usize - 1))
            .cloned())
    }
}

fn student(number: &str, grade: &str) -> Value {
    json!({"tables": {"students": {"student_number": number, "grade": grade, "first_name": "Kid"}}})
}

fn teacher(id: &str) -> Value {
    json!({"tables": {"teachers": {"id": id, "first_name": "Ann", "last_name": "Lee"}}})
}

fn parent(number: &str) -> Value {
    json!({"tables": {
        "students": {"student_number": number},
        "emailaddress": {"guardian1_email": "mum@home.org"}
    }})
}

fn section(number: &str, class_id: &str, section: &str) -> Value {
    json!({"tables": {
        "students": {"student_number": number},
        "sections": {"class_id": class_id, "section_number": section}
    }})
}

fn full_source() -> CannedSource {
    let queries = SourceQueries::default();
    CannedSource::default()
        .with_pages(
            &queries.students.name,
            vec![vec![student("1001", "5")], vec![student("1002", "KG")]],
        )
        .with_pages(&queries.teachers.name, vec![vec![teacher("Ann.Lee@School.org"), teacher("")]])
        .with_pages(&queries.parents.name, vec![vec![parent("1001")]])
        .with_pages(
            &queries.enrollments.name,
            vec![vec![
                section("1001", "MATH7", "1"),
                section("1001", "ENG7", "B"),
                section("1002", "MATH7", "1"),
            ]],
        )
}

#[test]
fn loads_all_pages_of_every_entity() {
    let source = full_source();
    let queries = SourceQueries::default();
    let mapping = FieldMapping::default();
    let snapshot = SnapshotLoader::new(&source, &queries, &mapping)
        .load()
        .expect("load snapshot");

    assert_eq!(snapshot.students.len(), 2);
    assert_eq!(snapshot.teachers.len(), 1);
    assert!(snapshot.teachers.keys().all(|email| email.as_str() == "ann.lee@school.org"));
    assert_eq!(snapshot.parents.len(), 1);

    let first = StudentNumber::new("1001").unwrap();
    let classes: Vec<_> = snapshot
        .classes_of(&first)
        .expect("classes")
        .iter()
        .map(|class| class.as_str().to_string())
        .collect();
    assert_eq!(classes, ["MATH7", "ENG7B"]);
    assert_eq!(snapshot.mapped_classes.len(), 1);

    let students_table = snapshot.table(SourceEntity::Students).expect("students table");
    assert_eq!(students_table.len(), 2);

    let requests = source.requests.borrow();
    let student_pages: Vec<_> = requests
        .iter()
        .filter(|(query, _, _)| *query == queries.students.name)
        .map(|(_, page, size)| (*page, *size))
        .collect();
    assert_eq!(student_pages, [(1, 2000), (2, 2000), (3, 2000)]);
}

#[test]
fn empty_required_entity_fails_the_load() {
    let queries = SourceQueries::default();
    let source = CannedSource::default()
        .with_pages(&queries.students.name, vec![vec![student("1001", "5")]]);
    let mapping = FieldMapping::default();

    let err = SnapshotLoader::new(&source, &queries, &mapping)
        .load()
        .unwrap_err();
    match err {
        LoadError::Empty { entity } => assert_eq!(entity, "teachers"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn empty_enrollments_are_allowed() {
    let queries = SourceQueries::default();
    let source = CannedSource::default()
        .with_pages(&queries.students.name, vec![vec![student("1001", "5")]])
        .with_pages(&queries.teachers.name, vec![vec![teacher("a@school.org")]])
        .with_pages(&queries.parents.name, vec![vec![parent("1001")]]);
    let mapping = FieldMapping::default();

    let snapshot = SnapshotLoader::new(&source, &queries, &mapping)
        .load()
        .expect("load snapshot");
    assert!(snapshot.enrollments.is_empty());
    assert!(snapshot.table(SourceEntity::Enrollments).unwrap().is_empty());
}

#[test]
fn snapshot_tables_export_to_csv() {
    let source = full_source();
    let queries = SourceQueries::default();
    let mapping = FieldMapping::default();
    let snapshot = SnapshotLoader::new(&source, &queries, &mapping)
        .load()
        .expect("load snapshot");

    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("source_teachers.csv");
    snapshot
        .table(SourceEntity::Teachers)
        .unwrap()
        .write_csv_file(&path)
        .expect("write csv");

    let text = std::fs::read_to_string(&path).expect("read csv");
    let mut lines = text.lines();
    let mut header: Vec<_> = lines.next().expect("header").split(',').collect();
    header.sort_unstable();
    assert_eq!(
        header,
        ["tables.teachers.first_name", "tables.teachers.id", "tables.teachers.last_name"]
    );
    assert_eq!(lines.count(), 2);
}
