//! Per-deployment field mapping.
//!
//! Each logical field of a source entity is read from a dotted path into the
//! nested source payload (`tables.students.grade`). The field list itself is
//! fixed; only the paths and a few conventions vary between deployments.
//! [`FieldMapping::default`] describes the standard deployment.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::operation::StudentField;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldMapping {
    pub students: StudentPaths,
    pub teachers: TeacherPaths,
    pub parents: ParentPaths,
    pub enrollments: EnrollmentPaths,
    pub grades: GradeRules,
    /// Destination attribute that receives the source "other name".
    pub other_name_target: OtherNameTarget,
}

impl Default for FieldMapping {
    fn default() -> Self {
        Self {
            students: StudentPaths::default(),
            teachers: TeacherPaths::default(),
            parents: ParentPaths::default(),
            enrollments: EnrollmentPaths::default(),
            grades: GradeRules::default(),
            other_name_target: OtherNameTarget::OtherName,
        }
    }
}

impl FieldMapping {
    /// Student profile fields compared for existing students, in decision order.
    pub fn tracked_student_fields(&self) -> Vec<StudentField> {
        vec![
            StudentField::Email,
            StudentField::LastName,
            StudentField::FirstName,
            StudentField::MiddleName,
            self.other_name_target.field(),
            StudentField::Gender,
            StudentField::HomeroomAdvisorId,
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OtherNameTarget {
    OtherName,
    Nickname,
}

impl OtherNameTarget {
    pub fn field(self) -> StudentField {
        match self {
            Self::OtherName => StudentField::OtherName,
            Self::Nickname => StudentField::Nickname,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StudentPaths {
    pub key: String,
    pub first_name: String,
    pub middle_name: String,
    pub last_name: String,
    pub email: String,
    pub birth_date: String,
    pub gender: String,
    pub grade: String,
    pub home_room: String,
    pub other_name: Option<String>,
}

impl Default for StudentPaths {
    fn default() -> Self {
        Self {
            key: "tables.students.student_number".to_string(),
            first_name: "tables.students.first_name".to_string(),
            middle_name: "tables.students.middle_name".to_string(),
            last_name: "tables.students.last_name".to_string(),
            email: "tables.students.email".to_string(),
            birth_date: "tables.students.dateofbirth".to_string(),
            gender: "tables.students.gender".to_string(),
            grade: "tables.students.grade".to_string(),
            home_room: "tables.students.home_room".to_string(),
            other_name: Some("tables.students.house_name".to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TeacherPaths {
    pub key: String,
    pub first_name: String,
    pub middle_name: String,
    pub last_name: String,
}

impl Default for TeacherPaths {
    fn default() -> Self {
        Self {
            key: "tables.teachers.id".to_string(),
            first_name: "tables.teachers.first_name".to_string(),
            middle_name: "tables.teachers.middle_name".to_string(),
            last_name: "tables.teachers.last_name".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParentPaths {
    pub key: String,
    pub guardians: Vec<GuardianSlot>,
}

impl Default for ParentPaths {
    fn default() -> Self {
        Self {
            key: "tables.students.student_number".to_string(),
            guardians: vec![
                GuardianSlot::standard("guardian1"),
                GuardianSlot::standard("guardian2"),
            ],
        }
    }
}

/// How parent names are derived when the record carries none.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NameFallback {
    /// Both names become the e-mail local part.
    #[default]
    Handle,
    /// Local part is `last_first`.
    UnderscoreLastFirst,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuardianSlot {
    /// Slot label, used in audit records and as the default role.
    pub label: String,
    pub email: String,
    #[serde(default)]
    pub relationship: Option<String>,
    /// Fixed role sent to the destination when no relationship path resolves.
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    /// Gender sent when creating the parent.
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub name_fallback: NameFallback,
}

impl GuardianSlot {
    fn standard(label: &str) -> Self {
        Self {
            label: label.to_string(),
            email: format!("tables.emailaddress.{label}_email"),
            relationship: Some(format!("tables.codeset.{label}_relationship")),
            role: None,
            first_name: Some(format!("tables.person.{label}_firstname")),
            last_name: Some(format!("tables.person.{label}_lastname")),
            gender: None,
            name_fallback: NameFallback::Handle,
        }
    }

    /// Role used when the record carries no relationship value.
    pub fn default_role(&self) -> &str {
        self.role.as_deref().unwrap_or(&self.label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnrollmentPaths {
    pub student: String,
    pub class_id: String,
    pub section_number: String,
}

impl Default for EnrollmentPaths {
    fn default() -> Self {
        Self {
            student: "tables.students.student_number".to_string(),
            class_id: "tables.sections.class_id".to_string(),
            section_number: "tables.sections.section_number".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GradeRules {
    /// Non-numeric grade labels with an explicit grade number.
    pub labels: BTreeMap<String, u32>,
    /// Year groups left out of membership reconciliation.
    pub ignored_year_groups: Vec<i64>,
}

impl Default for GradeRules {
    fn default() -> Self {
        Self {
            labels: BTreeMap::from([("KG".to_string(), 1)]),
            ignored_year_groups: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_guardians_use_label_paths() {
        let mapping = FieldMapping::default();
        let first = &mapping.parents.guardians[0];
        assert_eq!(first.email, "tables.emailaddress.guardian1_email");
        assert_eq!(first.default_role(), "guardian1");
    }

    #[test]
    fn tracked_fields_follow_other_name_target() {
        let mapping = FieldMapping {
            other_name_target: OtherNameTarget::Nickname,
            ..FieldMapping::default()
        };
        let fields = mapping.tracked_student_fields();
        assert!(fields.contains(&StudentField::Nickname));
        assert!(!fields.contains(&StudentField::OtherName));
    }
}
