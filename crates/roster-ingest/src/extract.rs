//! Typed record extraction driven by the deployment field mapping.

use roster_model::{
    Email, EnrollmentPaths, GuardianEntry, LoadError, ParentPaths, SourceEnrollment,
    SourceParentLink, SourceStudent, SourceTeacher, StudentNumber, StudentPaths, TeacherPaths,
};
use serde_json::Value;

use crate::flatten::lookup;

/// Reads mapped paths out of one record, attributing failures to
/// `entity` record `index`.
struct RecordReader<'a> {
    entity: &'a str,
    index: usize,
    record: &'a Value,
}

impl<'a> RecordReader<'a> {
    fn new(entity: &'a str, index: usize, record: &'a Value) -> Self {
        Self {
            entity,
            index,
            record,
        }
    }

    fn field(&self, path: &str) -> Result<Option<String>, LoadError> {
        lookup(self.record, path).map_err(|mismatch| LoadError::UnexpectedShape {
            entity: self.entity.to_string(),
            index: self.index,
            path: path.to_string(),
            found: mismatch.found,
        })
    }

    fn optional(&self, path: Option<&str>) -> Result<Option<String>, LoadError> {
        match path {
            Some(path) => self.field(path),
            None => Ok(None),
        }
    }

    fn key(&self, path: &str) -> Result<String, LoadError> {
        self.field(path)?.ok_or_else(|| self.missing_key(path))
    }

    fn student_number(&self, path: &str) -> Result<StudentNumber, LoadError> {
        StudentNumber::new(self.key(path)?).map_err(|_| self.missing_key(path))
    }

    fn missing_key(&self, path: &str) -> LoadError {
        LoadError::MissingKey {
            entity: self.entity.to_string(),
            index: self.index,
            path: path.to_string(),
        }
    }
}

pub fn student(index: usize, record: &Value, paths: &StudentPaths) -> Result<SourceStudent, LoadError> {
    let reader = RecordReader::new("students", index, record);
    let mut student = SourceStudent::new(reader.student_number(&paths.key)?);
    student.first_name = reader.field(&paths.first_name)?;
    student.middle_name = reader.field(&paths.middle_name)?;
    student.last_name = reader.field(&paths.last_name)?;
    student.email = reader.field(&paths.email)?;
    student.birth_date = reader.field(&paths.birth_date)?;
    student.gender = reader.field(&paths.gender)?;
    student.grade = reader.field(&paths.grade)?;
    student.home_room = reader.field(&paths.home_room)?;
    student.other_name = reader.optional(paths.other_name.as_deref())?;
    Ok(student)
}

/// Teachers without an e-mail key are not synchronised and yield `None`.
pub fn teacher(
    index: usize,
    record: &Value,
    paths: &TeacherPaths,
) -> Result<Option<SourceTeacher>, LoadError> {
    let reader = RecordReader::new("teachers", index, record);
    let Some(email) = reader.field(&paths.key)?.and_then(|raw| Email::new(raw).ok()) else {
        return Ok(None);
    };
    let mut teacher = SourceTeacher::new(email);
    teacher.first_name = reader.field(&paths.first_name)?;
    teacher.middle_name = reader.field(&paths.middle_name)?;
    teacher.last_name = reader.field(&paths.last_name)?;
    Ok(Some(teacher))
}

pub fn parent_link(
    index: usize,
    record: &Value,
    paths: &ParentPaths,
) -> Result<SourceParentLink, LoadError> {
    let reader = RecordReader::new("parents", index, record);
    let student = reader.student_number(&paths.key)?;
    let guardians = paths
        .guardians
        .iter()
        .map(|slot| {
            Ok(GuardianEntry {
                slot: slot.label.clone(),
                email: reader.field(&slot.email)?,
                relationship: reader.optional(slot.relationship.as_deref())?,
                first_name: reader.optional(slot.first_name.as_deref())?,
                last_name: reader.optional(slot.last_name.as_deref())?,
            })
        })
        .collect::<Result<Vec<_>, LoadError>>()?;
    Ok(SourceParentLink { student, guardians })
}

pub fn enrollment(
    index: usize,
    record: &Value,
    paths: &EnrollmentPaths,
) -> Result<SourceEnrollment, LoadError> {
    let reader = RecordReader::new("enrollments", index, record);
    let student = reader.student_number(&paths.student)?;
    let class_id = reader.key(&paths.class_id)?;
    let section = reader.field(&paths.section_number)?;
    SourceEnrollment::from_section(student, &class_id, section.as_deref())
        .map_err(|_| reader.missing_key(&paths.class_id))
}

#[cfg(test)]
mod tests {
    use roster_model::FieldMapping;
    use serde_json::json;

    use super::*;

    #[test]
    fn student_fields_follow_paths() {
        let mapping = FieldMapping::default();
        let record = json!({"tables": {"students": {
            "student_number": 1001,
            "first_name": "Ann",
            "last_name": "Lee",
            "grade": "5",
            "dateofbirth": "05-03-2010",
            "gender": "F",
            "house_name": "Red"
        }}});
        let student = student(0, &record, &mapping.students).unwrap();
        assert_eq!(student.number.as_str(), "1001");
        assert_eq!(student.first_name.as_deref(), Some("Ann"));
        assert_eq!(student.middle_name, None);
        assert_eq!(student.birth_date.as_deref(), Some("05-03-2010"));
        assert_eq!(student.other_name.as_deref(), Some("Red"));
    }

    #[test]
    fn student_without_number_is_rejected() {
        let mapping = FieldMapping::default();
        let record = json!({"tables": {"students": {"first_name": "Ann"}}});
        let err = student(4, &record, &mapping.students).unwrap_err();
        assert!(matches!(err, LoadError::MissingKey { index: 4, .. }));
    }

    #[test]
    fn nested_value_at_scalar_path_is_flagged() {
        let mapping = FieldMapping::default();
        let record = json!({"tables": {"students": {
            "student_number": "1001",
            "grade": {"value": "5"}
        }}});
        let err = student(0, &record, &mapping.students).unwrap_err();
        match err {
            LoadError::UnexpectedShape { path, found, .. } => {
                assert_eq!(path, "tables.students.grade");
                assert_eq!(found, "object");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn teacher_key_is_lower_cased_and_blank_dropped() {
        let mapping = FieldMapping::default();
        let record = json!({"tables": {"teachers": {"id": "Ann.Lee@School.org", "last_name": "Lee"}}});
        let teacher = teacher(0, &record, &mapping.teachers).unwrap().unwrap();
        assert_eq!(teacher.email.as_str(), "ann.lee@school.org");

        let blank = json!({"tables": {"teachers": {"id": ""}}});
        assert!(super::teacher(1, &blank, &mapping.teachers).unwrap().is_none());
    }

    #[test]
    fn parent_link_reads_each_slot() {
        let mapping = FieldMapping::default();
        let record = json!({"tables": {
            "students": {"student_number": "1001"},
            "emailaddress": {"guardian1_email": "mum@home.org"},
            "codeset": {"guardian1_relationship": "Mother"}
        }});
        let link = parent_link(0, &record, &mapping.parents).unwrap();
        assert_eq!(link.guardians.len(), 2);
        assert_eq!(link.guardians[0].email.as_deref(), Some("mum@home.org"));
        assert_eq!(link.guardians[0].relationship.as_deref(), Some("Mother"));
        assert_eq!(link.guardians[1].email, None);
    }
}
