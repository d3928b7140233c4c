//! Audit trail of one reconciliation run.
//!
//! Every attempted [`Operation`] produces exactly one [`OperationRecord`].
//! Decisions that are not mutations (missing e-mail, class not yet started,
//! ambiguous home-room teacher) produce informational records.

use serde::Serialize;
use serde_json::Value;

use crate::ids::{ClassUid, StudentNumber};
use crate::operation::Operation;

/// Action names of the non-mutating audit entries.
pub mod actions {
    pub const FIELD_CHECK: &str = "field_check";
    pub const MISSING_EMAIL: &str = "missing_email";
    pub const NOT_YET_STARTED: &str = "Enrol into class not yet started";
    pub const SKIPPED_CREATE: &str = "skipped_create";
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperationRecord {
    pub description: String,
    pub action: String,
    pub error: bool,
    pub change: bool,
    pub response: Option<String>,
    pub body: Option<String>,
}

impl OperationRecord {
    /// Record of a call the destination accepted.
    ///
    /// `error` mirrors any error indicator embedded in the response.
    pub fn applied(operation: &Operation, response: &Value) -> Self {
        Self {
            description: operation.description(),
            action: operation.action().to_string(),
            error: response_has_error(response),
            change: true,
            response: Some(response.to_string()),
            body: operation.payload().map(|body| body.to_string()),
        }
    }

    /// Record of a call that failed before producing a response.
    pub fn failed(operation: &Operation, cause: impl Into<String>) -> Self {
        Self {
            description: operation.description(),
            action: operation.action().to_string(),
            error: true,
            change: false,
            response: Some(cause.into()),
            body: operation.payload().map(|body| body.to_string()),
        }
    }

    /// Non-mutating entry that documents a decision.
    pub fn note(
        action: impl Into<String>,
        description: impl Into<String>,
        response: impl Into<String>,
    ) -> Self {
        Self {
            description: description.into(),
            action: action.into(),
            error: false,
            change: false,
            response: Some(response.into()),
            body: None,
        }
    }

    /// Non-mutating entry that reports a data problem.
    pub fn problem(
        action: impl Into<String>,
        description: impl Into<String>,
        response: Option<String>,
    ) -> Self {
        Self {
            description: description.into(),
            action: action.into(),
            error: true,
            change: false,
            response,
            body: None,
        }
    }
}

/// Whether a response carries an `error` indicator (truthy value).
pub fn response_has_error(response: &Value) -> bool {
    match response.get("error") {
        None | Some(Value::Null) => false,
        Some(Value::Bool(flag)) => *flag,
        Some(Value::String(text)) => !text.is_empty(),
        Some(Value::Number(number)) => number.as_f64().is_some_and(|n| n != 0.0),
        Some(Value::Array(items)) => !items.is_empty(),
        Some(Value::Object(map)) => !map.is_empty(),
    }
}

/// A class referenced by the source schedule but absent at the destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MissingClass {
    #[serde(rename = "description")]
    pub class: ClassUid,
    pub error: bool,
    #[serde(rename = "body")]
    pub student: StudentNumber,
}

impl MissingClass {
    pub fn new(class: ClassUid, student: StudentNumber) -> Self {
        Self {
            class,
            error: true,
            student,
        }
    }
}

/// Accumulated audit records of one run.
#[derive(Debug, Clone, Default)]
pub struct AuditLog {
    pub records: Vec<OperationRecord>,
    pub missing_classes: Vec<MissingClass>,
}

impl AuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: OperationRecord) {
        self.records.push(record);
    }

    pub fn push_missing_class(&mut self, missing: MissingClass) {
        self.missing_classes.push(missing);
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn error_count(&self) -> usize {
        self.records.iter().filter(|record| record.error).count()
    }

    pub fn change_count(&self) -> usize {
        self.records.iter().filter(|record| record.change).count()
    }

    /// Records for a given action name.
    pub fn by_action<'a>(&'a self, action: &'a str) -> impl Iterator<Item = &'a OperationRecord> {
        self.records
            .iter()
            .filter(move |record| record.action == action)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn error_indicator_follows_truthiness() {
        assert!(!response_has_error(&json!({ "id": 1 })));
        assert!(!response_has_error(&json!({ "error": null })));
        assert!(!response_has_error(&json!({ "error": "" })));
        assert!(!response_has_error(&json!({ "error": false })));
        assert!(response_has_error(&json!({ "error": true })));
        assert!(response_has_error(&json!({ "error": "duplicate" })));
        assert!(response_has_error(&json!({ "error": { "code": 1 } })));
    }

    #[test]
    fn log_counts_errors_and_changes() {
        let mut log = AuditLog::new();
        log.push(OperationRecord::note(actions::MISSING_EMAIL, "", "no email"));
        log.push(OperationRecord::problem(actions::FIELD_CHECK, "Lee, Ann", None));
        assert_eq!(log.error_count(), 1);
        assert_eq!(log.change_count(), 0);
        assert_eq!(log.by_action(actions::MISSING_EMAIL).count(), 1);
    }
}
