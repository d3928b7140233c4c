//! Destination records as returned by the listing endpoints.
//!
//! Unknown fields are ignored. Records are updated in place by the
//! executor's successful operations.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::ids::EntityId;
use crate::operation::{FieldValue, StudentField, StudentPayload};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DestStudent {
    pub id: EntityId,
    #[serde(default)]
    pub student_id: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub middle_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    /// ISO date (`YYYY-MM-DD`).
    #[serde(default)]
    pub birthday: Option<String>,
    #[serde(default)]
    pub other_name: Option<String>,
    #[serde(default)]
    pub nickname: Option<String>,
    #[serde(default)]
    pub homeroom_advisor_id: Option<EntityId>,
    #[serde(default)]
    pub archived: bool,
}

impl DestStudent {
    pub fn new(id: EntityId, student_id: impl Into<String>) -> Self {
        Self {
            id,
            student_id: Some(student_id.into()),
            first_name: None,
            middle_name: None,
            last_name: None,
            email: None,
            gender: None,
            birthday: None,
            other_name: None,
            nickname: None,
            homeroom_advisor_id: None,
            archived: false,
        }
    }

    /// Record as created from `payload` under the assigned `id`.
    pub fn from_payload(id: EntityId, payload: &StudentPayload) -> Self {
        Self {
            id,
            student_id: Some(payload.student_id.to_string()),
            first_name: payload.first_name.clone(),
            middle_name: payload.middle_name.clone(),
            last_name: payload.last_name.clone(),
            email: payload.email.clone(),
            gender: payload.gender.clone(),
            birthday: payload
                .birthday
                .map(|date| date.format("%Y-%m-%d").to_string()),
            other_name: payload.other_name.clone(),
            nickname: payload.nickname.clone(),
            homeroom_advisor_id: payload.homeroom_advisor_id,
            archived: false,
        }
    }

    /// Current value of a tracked field, blank text read as `None`.
    pub fn field(&self, field: StudentField) -> Option<String> {
        let value = match field {
            StudentField::Email => self.email.clone(),
            StudentField::FirstName => self.first_name.clone(),
            StudentField::LastName => self.last_name.clone(),
            StudentField::MiddleName => self.middle_name.clone(),
            StudentField::OtherName => self.other_name.clone(),
            StudentField::Nickname => self.nickname.clone(),
            StudentField::Gender => self.gender.clone(),
            StudentField::Birthday => self.birthday.clone(),
            StudentField::HomeroomAdvisorId => self.homeroom_advisor_id.map(|id| id.to_string()),
        };
        value.filter(|text| !text.trim().is_empty())
    }

    /// Overwrite one tracked field with a decided value.
    pub fn set_field(&mut self, field: StudentField, value: Option<&FieldValue>) {
        let text = value.map(ToString::to_string);
        match field {
            StudentField::Email => self.email = text,
            StudentField::FirstName => self.first_name = text,
            StudentField::LastName => self.last_name = text,
            StudentField::MiddleName => self.middle_name = text,
            StudentField::OtherName => self.other_name = text,
            StudentField::Nickname => self.nickname = text,
            StudentField::Gender => self.gender = text,
            StudentField::Birthday => self.birthday = text,
            StudentField::HomeroomAdvisorId => {
                self.homeroom_advisor_id = match value {
                    Some(FieldValue::Id(id)) => Some(*id),
                    Some(other) => other.to_string().parse().ok().map(EntityId),
                    None => None,
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DestTeacher {
    pub id: EntityId,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub middle_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub archived: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DestParent {
    pub id: EntityId,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub archived: bool,
}

/// A child link as listed for one parent; `id` is the student's id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildRelationship {
    pub id: EntityId,
    #[serde(default)]
    pub relationship: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DestClass {
    pub id: EntityId,
    #[serde(default)]
    pub uniq_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub program_code: Option<String>,
    #[serde(default)]
    pub start_term_id: Option<i64>,
    /// Set by the loader from the listing pass the class came from.
    #[serde(default)]
    pub archived: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearGroup {
    pub id: EntityId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub grade: Option<String>,
    #[serde(default)]
    pub grade_number: Option<u32>,
    #[serde(default)]
    pub student_ids: BTreeSet<EntityId>,
}

impl YearGroup {
    pub fn label(&self) -> String {
        self.name
            .clone()
            .or_else(|| self.grade.clone())
            .unwrap_or_else(|| self.id.to_string())
    }
}

/// Class membership row from the membership listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Membership {
    #[serde(default)]
    pub uniq_student_id: String,
    #[serde(default)]
    pub uniq_class_id: String,
    #[serde(default)]
    pub role: String,
}

impl Membership {
    pub fn is_student(&self) -> bool {
        self.role == "Student"
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcademicTerm {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
    pub starts_on: NaiveDate,
    #[serde(default)]
    pub ends_on: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcademicYear {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub academic_terms: Vec<AcademicTerm>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramYears {
    #[serde(default)]
    pub academic_years: Vec<AcademicYear>,
}

/// Academic years keyed by program code.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AcademicCatalog(pub BTreeMap<String, ProgramYears>);

impl AcademicCatalog {
    /// Start date of the term `term_id` within `program_code`.
    ///
    /// When several years list the same term id the last one wins.
    pub fn term_start(&self, program_code: &str, term_id: i64) -> Option<NaiveDate> {
        self.0
            .get(program_code)?
            .academic_years
            .iter()
            .flat_map(|year| year.academic_terms.iter())
            .filter(|term| term.id == term_id)
            .map(|term| term.starts_on)
            .last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn student_deserializes_with_missing_fields() {
        let student: DestStudent =
            serde_json::from_str(r#"{"id": 7, "student_id": "1001", "extra": true}"#).unwrap();
        assert_eq!(student.id, EntityId(7));
        assert_eq!(student.student_id.as_deref(), Some("1001"));
        assert!(!student.archived);
        assert!(student.birthday.is_none());
    }

    #[test]
    fn catalog_resolves_term_start() {
        let catalog: AcademicCatalog = serde_json::from_str(
            r#"{"myp": {"academic_years": [
                {"id": 1, "academic_terms": [
                    {"id": 10, "starts_on": "2026-08-20"},
                    {"id": 11, "starts_on": "2027-01-10"}
                ]}
            ]}}"#,
        )
        .unwrap();
        assert_eq!(
            catalog.term_start("myp", 11),
            NaiveDate::from_ymd_opt(2027, 1, 10)
        );
        assert_eq!(catalog.term_start("myp", 12), None);
        assert_eq!(catalog.term_start("dp", 10), None);
    }
}
