//! Field updates decided during the student pass, applied in a later batch.

use std::collections::BTreeMap;

use roster_model::{FieldValue, StudentField, StudentNumber};

/// Decided value per (student, field). `None` clears the field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PendingUpdates {
    entries: BTreeMap<(StudentNumber, StudentField), Option<FieldValue>>,
}

impl PendingUpdates {
    pub fn new() -> Self {
        Self::default()
    }

    /// Later decisions for the same key replace earlier ones.
    pub fn insert(&mut self, student: StudentNumber, field: StudentField, value: Option<FieldValue>) {
        self.entries.insert((student, field), value);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&StudentNumber, StudentField, &Option<FieldValue>)> {
        self.entries
            .iter()
            .map(|((student, field), value)| (student, *field, value))
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn number(value: &str) -> StudentNumber {
        StudentNumber::new(value).unwrap()
    }

    fn text(value: &str) -> Option<FieldValue> {
        Some(FieldValue::Text(value.to_string()))
    }

    #[test]
    fn later_decision_replaces_earlier_one() {
        let mut pending = PendingUpdates::new();
        pending.insert(number("1001"), StudentField::Email, text("old@school.org"));
        pending.insert(number("1001"), StudentField::Email, text("new@school.org"));

        assert_eq!(pending.len(), 1);
        let (student, field, value) = pending.iter().next().unwrap();
        assert_eq!(student.as_str(), "1001");
        assert_eq!(field, StudentField::Email);
        assert_eq!(value, &text("new@school.org"));
    }

    #[test]
    fn clears_are_kept_next_to_values() {
        let mut pending = PendingUpdates::new();
        assert!(pending.is_empty());
        pending.insert(number("1002"), StudentField::MiddleName, None);
        pending.insert(
            number("1001"),
            StudentField::Birthday,
            Some(FieldValue::Date(NaiveDate::from_ymd_opt(2010, 3, 5).unwrap())),
        );

        assert!(!pending.is_empty());
        let decided: Vec<(String, StudentField, bool)> = pending
            .iter()
            .map(|(student, field, value)| (student.to_string(), field, value.is_none()))
            .collect();
        assert_eq!(
            decided,
            [
                ("1001".to_string(), StudentField::Birthday, false),
                ("1002".to_string(), StudentField::MiddleName, true),
            ]
        );
    }
}
