//! Typed source records.
//!
//! Populated once during ingestion from the mapped dotted paths and never
//! mutated afterwards. Blank strings are stored as `None`.

use serde::Serialize;

use crate::ids::{ClassUid, Email, StudentNumber};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceStudent {
    pub number: StudentNumber,
    pub first_name: Option<String>,
    pub middle_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    /// Birth date as delivered by the source (`DD-MM-YYYY`).
    pub birth_date: Option<String>,
    /// Gender code (`F`/`M`).
    pub gender: Option<String>,
    pub grade: Option<String>,
    /// Home-room label, formatted like a teacher full name.
    pub home_room: Option<String>,
    pub other_name: Option<String>,
}

impl SourceStudent {
    pub fn new(number: StudentNumber) -> Self {
        Self {
            number,
            first_name: None,
            middle_name: None,
            last_name: None,
            email: None,
            birth_date: None,
            gender: None,
            grade: None,
            home_room: None,
            other_name: None,
        }
    }

    /// Destination gender label for the source code.
    pub fn gender_label(&self) -> Option<&'static str> {
        match self.gender.as_deref() {
            Some("F") => Some("Female"),
            Some("M") => Some("Male"),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceTeacher {
    pub email: Email,
    pub first_name: Option<String>,
    pub middle_name: Option<String>,
    pub last_name: Option<String>,
}

impl SourceTeacher {
    pub fn new(email: Email) -> Self {
        Self {
            email,
            first_name: None,
            middle_name: None,
            last_name: None,
        }
    }

    /// `last, first[ middle]`, the format used for home-room labels.
    pub fn full_name(&self) -> String {
        let mut name = format!(
            "{}, {}",
            self.last_name.as_deref().unwrap_or_default(),
            self.first_name.as_deref().unwrap_or_default()
        );
        if let Some(middle) = self.middle_name.as_deref() {
            name.push(' ');
            name.push_str(middle);
        }
        name
    }
}

/// One guardian slot of a parent-link record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GuardianEntry {
    /// Slot label from the deployment mapping (e.g. `guardian1`, `mother`).
    pub slot: String,
    pub email: Option<String>,
    pub relationship: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// Parents of one student.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceParentLink {
    pub student: StudentNumber,
    pub guardians: Vec<GuardianEntry>,
}

/// One scheduled class of one student.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceEnrollment {
    pub student: StudentNumber,
    pub class: ClassUid,
    /// The section number was folded into the class id.
    pub sectioned: bool,
}

impl SourceEnrollment {
    /// Build an enrollment, folding a non-numeric section into the class id.
    pub fn from_section(
        student: StudentNumber,
        class_id: &str,
        section_number: Option<&str>,
    ) -> Result<Self, crate::ModelError> {
        let section = section_number.unwrap_or_default();
        let sectioned = !section.chars().all(|ch| ch.is_ascii_digit());
        let class = if sectioned {
            ClassUid::new(format!("{class_id}{section}"))?
        } else {
            ClassUid::new(class_id)?
        };
        Ok(Self {
            student,
            class,
            sectioned,
        })
    }
}
