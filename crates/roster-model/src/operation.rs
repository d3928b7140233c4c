//! Decided mutations against the destination.
//!
//! An [`Operation`] carries everything the destination client needs to send
//! the request and everything the audit trail needs to describe it.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::ids::{ClassUid, Email, EntityId, StudentNumber};

/// Profile fields kept in sync for existing students.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StudentField {
    Email,
    FirstName,
    LastName,
    MiddleName,
    OtherName,
    Nickname,
    Gender,
    HomeroomAdvisorId,
    Birthday,
}

impl StudentField {
    /// Attribute name on the destination student resource.
    pub fn key(self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::FirstName => "first_name",
            Self::LastName => "last_name",
            Self::MiddleName => "middle_name",
            Self::OtherName => "other_name",
            Self::Nickname => "nickname",
            Self::Gender => "gender",
            Self::HomeroomAdvisorId => "homeroom_advisor_id",
            Self::Birthday => "birthday",
        }
    }
}

impl fmt::Display for StudentField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// A decided field value. `None` in an update clears the field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Id(EntityId),
    Date(NaiveDate),
    Text(String),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "{id}"),
            Self::Date(date) => write!(f, "{}", date.format("%Y-%m-%d")),
            Self::Text(text) => f.write_str(text),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StudentPayload {
    pub student_id: StudentNumber,
    pub birthday: Option<NaiveDate>,
    pub first_name: Option<String>,
    pub middle_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub gender: Option<String>,
    pub class_grade_number: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub other_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub homeroom_advisor_id: Option<EntityId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TeacherPayload {
    pub email: Email,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub middle_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParentPayload {
    pub email: Email,
    pub first_name: String,
    pub last_name: String,
    pub gender: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Operation {
    CreateStudent {
        payload: StudentPayload,
    },
    UnarchiveStudent {
        student: StudentNumber,
        id: EntityId,
    },
    ArchiveStudent {
        student: StudentNumber,
        id: EntityId,
        withdrawn_on: NaiveDate,
    },
    UpdateStudentField {
        student: StudentNumber,
        id: EntityId,
        field: StudentField,
        value: Option<FieldValue>,
    },
    AddToYearGroup {
        student: StudentNumber,
        student_id: EntityId,
        year_group: EntityId,
        year_group_label: String,
    },
    RemoveFromYearGroup {
        student: StudentNumber,
        student_id: EntityId,
        year_group: EntityId,
        year_group_label: String,
    },
    CreateTeacher {
        payload: TeacherPayload,
    },
    CreateParent {
        payload: ParentPayload,
    },
    UnarchiveParent {
        email: Email,
        id: EntityId,
    },
    LinkChild {
        parent: EntityId,
        parent_email: Email,
        child: EntityId,
        student: StudentNumber,
        relationship: String,
    },
    UpdateChildRelationship {
        parent: EntityId,
        parent_email: Email,
        child: EntityId,
        relationship: String,
    },
    AddStudentToClass {
        student: StudentNumber,
        student_id: EntityId,
        class: ClassUid,
        class_id: EntityId,
    },
    RemoveStudentFromClass {
        student: StudentNumber,
        student_id: EntityId,
        class: ClassUid,
        class_id: EntityId,
    },
}

impl Operation {
    /// Action name recorded in the audit trail.
    pub fn action(&self) -> &'static str {
        match self {
            Self::CreateStudent { .. } => "create_student",
            Self::UnarchiveStudent { .. } => "unarchive_a_student",
            Self::ArchiveStudent { .. } => "archive_a_student",
            Self::UpdateStudentField { .. } => "update_a_student",
            Self::AddToYearGroup { .. } => "add_to_year_group",
            Self::RemoveFromYearGroup { .. } => "remove_from_year_group",
            Self::CreateTeacher { .. } => "create_teacher",
            Self::CreateParent { .. } => "create_parent",
            Self::UnarchiveParent { .. } => "unarchive_a_parent",
            Self::LinkChild { .. } => "add_child_association",
            Self::UpdateChildRelationship { .. } => "update_child",
            Self::AddStudentToClass { .. } => "add_student_to_class",
            Self::RemoveStudentFromClass { .. } => "remove_students_from_class",
        }
    }

    /// Human-readable description of the target.
    pub fn description(&self) -> String {
        match self {
            Self::CreateStudent { payload } => payload.student_id.to_string(),
            Self::UnarchiveStudent { student, .. } | Self::ArchiveStudent { student, .. } => {
                student.to_string()
            }
            Self::UpdateStudentField {
                student,
                field,
                value,
                ..
            } => match value {
                Some(value) => format!("{student}.{field} = {value}"),
                None => format!("{student}.{field} = None"),
            },
            Self::AddToYearGroup {
                student,
                year_group_label,
                ..
            } => format!("{student} > {year_group_label}"),
            Self::RemoveFromYearGroup {
                student,
                year_group_label,
                ..
            } => format!("{year_group_label} < {student}"),
            Self::CreateTeacher { payload } => payload.email.to_string(),
            Self::CreateParent { payload } => payload.email.to_string(),
            Self::UnarchiveParent { email, .. } => email.to_string(),
            Self::LinkChild {
                parent_email,
                student,
                ..
            } => format!("{student} -> {parent_email}"),
            Self::UpdateChildRelationship { parent_email, .. } => parent_email.to_string(),
            Self::AddStudentToClass { student, class, .. } => format!("{student} > {class}"),
            Self::RemoveStudentFromClass { student, class, .. } => format!("{class} < {student}"),
        }
    }

    /// Request body sent to the destination, or `None` for body-less calls.
    pub fn payload(&self) -> Option<Value> {
        match self {
            Self::CreateStudent { payload } => Some(json!({ "student": payload })),
            Self::UnarchiveStudent { .. } | Self::UnarchiveParent { .. } => None,
            Self::ArchiveStudent { withdrawn_on, .. } => Some(json!({
                "withdrawn_on": withdrawn_on.format("%Y-%m-%d").to_string()
            })),
            Self::UpdateStudentField { field, value, .. } => {
                let mut student = serde_json::Map::new();
                student.insert(field.key().to_string(), json!(value));
                Some(json!({ "student": student }))
            }
            Self::AddToYearGroup { student_id, .. }
            | Self::RemoveFromYearGroup { student_id, .. }
            | Self::AddStudentToClass { student_id, .. }
            | Self::RemoveStudentFromClass { student_id, .. } => {
                Some(json!({ "student_ids": [student_id] }))
            }
            Self::CreateTeacher { payload } => Some(json!({ "teacher": payload })),
            Self::CreateParent { payload } => Some(json!({ "parent": payload })),
            Self::LinkChild {
                child,
                relationship,
                ..
            } => Some(json!({ "child": { "id": child, "relationship": relationship } })),
            Self::UpdateChildRelationship { relationship, .. } => {
                Some(json!({ "child": { "relationship": relationship } }))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn number(value: &str) -> StudentNumber {
        StudentNumber::new(value).unwrap()
    }

    #[test]
    fn update_payload_uses_field_key() {
        let op = Operation::UpdateStudentField {
            student: number("1001"),
            id: EntityId(5),
            field: StudentField::Birthday,
            value: Some(FieldValue::Date(NaiveDate::from_ymd_opt(2010, 3, 5).unwrap())),
        };
        assert_eq!(op.action(), "update_a_student");
        assert_eq!(op.description(), "1001.birthday = 2010-03-05");
        assert_eq!(
            op.payload(),
            Some(json!({ "student": { "birthday": "2010-03-05" } }))
        );
    }

    #[test]
    fn clearing_update_sends_null() {
        let op = Operation::UpdateStudentField {
            student: number("1001"),
            id: EntityId(5),
            field: StudentField::MiddleName,
            value: None,
        };
        assert_eq!(op.description(), "1001.middle_name = None");
        assert_eq!(
            op.payload(),
            Some(json!({ "student": { "middle_name": null } }))
        );
    }

    #[test]
    fn year_group_descriptions_point_in_opposite_directions() {
        let add = Operation::AddToYearGroup {
            student: number("1001"),
            student_id: EntityId(5),
            year_group: EntityId(9),
            year_group_label: "Grade 6".to_string(),
        };
        let remove = Operation::RemoveFromYearGroup {
            student: number("1001"),
            student_id: EntityId(5),
            year_group: EntityId(8),
            year_group_label: "Grade 5".to_string(),
        };
        assert_eq!(add.description(), "1001 > Grade 6");
        assert_eq!(remove.description(), "Grade 5 < 1001");
        assert_eq!(add.payload(), Some(json!({ "student_ids": [5] })));
    }
}
