//! Data model for roster synchronisation.
//!
//! Source records, destination records, decided operations and the audit
//! trail shared by the loader, reconciler, executor and reporter crates.

pub mod audit;
pub mod destination;
pub mod error;
pub mod ids;
pub mod mapping;
pub mod operation;
pub mod options;
pub mod source;

pub use audit::{AuditLog, MissingClass, OperationRecord, actions, response_has_error};
pub use destination::{
    AcademicCatalog, AcademicTerm, AcademicYear, ChildRelationship, DestClass, DestParent,
    DestStudent, DestTeacher, Membership, ProgramYears, YearGroup,
};
pub use error::{IntegrityError, LoadError, ModelError};
pub use ids::{ClassUid, Email, EntityId, StudentNumber};
pub use mapping::{
    EnrollmentPaths, FieldMapping, GradeRules, GuardianSlot, NameFallback, OtherNameTarget,
    ParentPaths, StudentPaths, TeacherPaths,
};
pub use operation::{
    FieldValue, Operation, ParentPayload, StudentField, StudentPayload, TeacherPayload,
};
pub use options::SyncOptions;
pub use source::{GuardianEntry, SourceEnrollment, SourceParentLink, SourceStudent, SourceTeacher};
