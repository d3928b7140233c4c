use thiserror::Error;

/// Invalid natural key or identifier.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("invalid student number: {0:?}")]
    InvalidStudentNumber(String),
    #[error("invalid e-mail address: {0:?}")]
    InvalidEmail(String),
    #[error("invalid class identifier: {0:?}")]
    InvalidClassUid(String),
}

/// Failure while loading the source snapshot. Always fatal.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("{url} => {status}\n{body}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },

    #[error("source returned no access token")]
    MissingToken,

    #[error("malformed {entity} payload: {message}")]
    Malformed { entity: String, message: String },

    #[error(
        "No {entity} records found? Must be an issue with the source system. \
         Exiting with no actions taken"
    )]
    Empty { entity: String },

    #[error("{entity} record {index}: expected a scalar at `{path}`, found {found}")]
    UnexpectedShape {
        entity: String,
        index: usize,
        path: String,
        found: &'static str,
    },

    #[error("{entity} record {index}: missing natural key at `{path}`")]
    MissingKey {
        entity: String,
        index: usize,
        path: String,
    },
}

/// Data-integrity violation detected during reconciliation. Always fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntegrityError {
    #[error("class unique id {uniq_id} appears in both active and archived classes")]
    DuplicateClass { uniq_id: String },

    #[error("no year group mapping for grade {grade:?}")]
    UnmappedGrade { grade: String },

    #[error("no year group for grade number {grade_number} (grade {grade:?})")]
    MissingYearGroup { grade_number: u32, grade: String },

    #[error("class {uniq_id} has no resolvable start date")]
    UnresolvedStartDate { uniq_id: String },

    #[error("student {student} has an invalid birth date {value:?}")]
    InvalidBirthDate { student: String, value: String },
}
