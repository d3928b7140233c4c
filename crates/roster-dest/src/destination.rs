//! Destination trait.
//!
//! # Architecture
//!
//! The reconciler reads the destination once through the listing methods,
//! then sends every decided mutation through [`Destination::apply`]. Listings
//! return plain records; mutations return the raw JSON response so the
//! executor can record it verbatim.
//!
//! # Example
//!
//! ```ignore
//! use roster_dest::{Destination, MemoryDestination};
//!
//! let mut destination = MemoryDestination::new();
//! let response = destination.apply(&operation)?;
//! ```

use chrono::NaiveDate;
use roster_model::{
    AcademicCatalog, ChildRelationship, DestClass, DestParent, DestStudent, DestTeacher,
    EntityId, Membership, Operation, YearGroup,
};
use serde_json::Value;

use crate::error::DestinationError;

/// Read and write access to the destination roster.
///
/// Student and parent listings include archived records with their
/// `archived` flag set. Class listings are split by archival state so that
/// the caller can check unique ids across both sets.
pub trait Destination {
    fn year_groups(&self) -> Result<Vec<YearGroup>, DestinationError>;

    fn students(&self) -> Result<Vec<DestStudent>, DestinationError>;

    fn teachers(&self) -> Result<Vec<DestTeacher>, DestinationError>;

    fn parents(&self) -> Result<Vec<DestParent>, DestinationError>;

    /// Active classes, or archived classes when `archived` is set.
    fn classes(&self, archived: bool) -> Result<Vec<DestClass>, DestinationError>;

    /// Memberships of active users in active classes that meet on `on`.
    fn memberships(&self, on: NaiveDate) -> Result<Vec<Membership>, DestinationError>;

    /// Children currently linked to `parent`.
    fn child_relationships(
        &self,
        parent: EntityId,
    ) -> Result<Vec<ChildRelationship>, DestinationError>;

    /// Academic years and terms keyed by program code.
    fn academic_years(&self) -> Result<AcademicCatalog, DestinationError>;

    /// Send one mutation and return the destination's response body.
    fn apply(&mut self, operation: &Operation) -> Result<Value, DestinationError>;
}

/// Destination id carried by a create response, whether wrapped in the
/// entity key (`{"student": {"id": 1}}`) or bare (`{"id": 1}`).
pub fn created_id(response: &Value, entity: &str) -> Option<EntityId> {
    response
        .get(entity)
        .and_then(|inner| inner.get("id"))
        .or_else(|| response.get("id"))
        .and_then(Value::as_i64)
        .map(EntityId)
}
