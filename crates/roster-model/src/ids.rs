#![deny(unsafe_code)]

//! Natural keys and destination identifiers.
//!
//! Natural keys are the business identifiers used to match records across
//! the two systems. They are trimmed on construction and never empty.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ModelError;

/// Student number shared by both systems (`student_id` at the destination).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StudentNumber(String);

impl StudentNumber {
    pub fn new(value: impl Into<String>) -> Result<Self, ModelError> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ModelError::InvalidStudentNumber(value));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Placeholder numbers such as `0000` are made of a single repeated
    /// character and never belong to a real student.
    pub fn is_placeholder(&self) -> bool {
        let mut chars = self.0.chars();
        match chars.next() {
            Some(first) => chars.all(|ch| ch == first),
            None => true,
        }
    }
}

impl fmt::Display for StudentNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lower-cased e-mail address used as the key for teachers and parents.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Email(String);

impl Email {
    pub fn new(value: impl Into<String>) -> Result<Self, ModelError> {
        let value = value.into();
        let normalized = value.trim().to_lowercase();
        if normalized.is_empty() {
            return Err(ModelError::InvalidEmail(value));
        }
        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Local part of the address (everything before `@`).
    pub fn handle(&self) -> &str {
        self.0.split('@').next().unwrap_or(&self.0)
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Unique class identifier (`uniq_id` at the destination).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClassUid(String);

impl ClassUid {
    pub fn new(value: impl Into<String>) -> Result<Self, ModelError> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(ModelError::InvalidClassUid(value));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClassUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier assigned by the destination system.
///
/// Dry runs hand out negative ids for records that were never created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub i64);

impl EntityId {
    pub fn get(self) -> i64 {
        self.0
    }

    pub fn is_synthetic(self) -> bool {
        self.0 < 0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn student_number_is_trimmed() {
        let number = StudentNumber::new("  12345 ").unwrap();
        assert_eq!(number.as_str(), "12345");
        assert!(StudentNumber::new("   ").is_err());
    }

    #[test]
    fn placeholder_student_numbers() {
        assert!(StudentNumber::new("0000").unwrap().is_placeholder());
        assert!(StudentNumber::new("9").unwrap().is_placeholder());
        assert!(!StudentNumber::new("1001").unwrap().is_placeholder());
    }

    #[test]
    fn email_is_lower_cased() {
        let email = Email::new(" Jane.Doe@School.ORG").unwrap();
        assert_eq!(email.as_str(), "jane.doe@school.org");
        assert_eq!(email.handle(), "jane.doe");
    }

    #[test]
    fn class_uid_keeps_whitespace() {
        let uid = ClassUid::new("MATH7 ").unwrap();
        assert_eq!(uid.as_str(), "MATH7 ");
        assert!(ClassUid::new(" ").is_err());
    }
}
