//! Dry-run wrapper: reads pass through, mutations are only logged.

use chrono::NaiveDate;
use roster_model::{
    AcademicCatalog, ChildRelationship, DestClass, DestParent, DestStudent, DestTeacher,
    EntityId, Membership, Operation, YearGroup,
};
use serde_json::{Value, json};

use crate::destination::Destination;
use crate::error::DestinationError;

/// Wraps a destination so that no mutation is ever sent.
///
/// Create operations are answered with a negative synthetic id so that
/// decisions depending on the new record (linking a freshly created parent,
/// adding a new student to its year group) still play out.
#[derive(Debug)]
pub struct DryRunDestination<D> {
    inner: D,
    next_id: i64,
}

impl<D: Destination> DryRunDestination<D> {
    pub fn new(inner: D) -> Self {
        Self { inner, next_id: -1 }
    }

    pub fn into_inner(self) -> D {
        self.inner
    }

    fn synthetic_id(&mut self) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id -= 1;
        id
    }
}

impl<D: Destination> Destination for DryRunDestination<D> {
    fn year_groups(&self) -> Result<Vec<YearGroup>, DestinationError> {
        self.inner.year_groups()
    }

    fn students(&self) -> Result<Vec<DestStudent>, DestinationError> {
        self.inner.students()
    }

    fn teachers(&self) -> Result<Vec<DestTeacher>, DestinationError> {
        self.inner.teachers()
    }

    fn parents(&self) -> Result<Vec<DestParent>, DestinationError> {
        self.inner.parents()
    }

    fn classes(&self, archived: bool) -> Result<Vec<DestClass>, DestinationError> {
        self.inner.classes(archived)
    }

    fn memberships(&self, on: NaiveDate) -> Result<Vec<Membership>, DestinationError> {
        self.inner.memberships(on)
    }

    fn child_relationships(
        &self,
        parent: EntityId,
    ) -> Result<Vec<ChildRelationship>, DestinationError> {
        // Synthetic parents exist only in this run.
        if parent.is_synthetic() {
            return Ok(Vec::new());
        }
        self.inner.child_relationships(parent)
    }

    fn academic_years(&self) -> Result<AcademicCatalog, DestinationError> {
        self.inner.academic_years()
    }

    fn apply(&mut self, operation: &Operation) -> Result<Value, DestinationError> {
        tracing::info!(
            action = operation.action(),
            description = %operation.description(),
            "dry run, not sent"
        );
        let response = match operation {
            Operation::CreateStudent { .. } => json!({ "student": { "id": self.synthetic_id() } }),
            Operation::CreateTeacher { .. } => json!({ "teacher": { "id": self.synthetic_id() } }),
            Operation::CreateParent { .. } => json!({ "parent": { "id": self.synthetic_id() } }),
            _ => json!({}),
        };
        Ok(response)
    }
}
