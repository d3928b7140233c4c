use std::collections::BTreeMap;

use roster_dest::{Destination, created_id};
use roster_model::{
    ChildRelationship, DestParent, Email, EntityId, GuardianEntry, GuardianSlot, NameFallback,
    Operation, OperationRecord, ParentPayload, StudentNumber, actions,
};
use tracing::{debug, info_span, warn};

use super::Reconciler;
use crate::error::SyncError;
use crate::executor::ExecutionOutcome;

/// One guardian of one student, with a usable e-mail.
struct Candidate<'a> {
    email: Email,
    role: String,
    slot: &'a GuardianSlot,
    guardian: &'a GuardianEntry,
}

/// Per-run bookkeeping of the parent pass.
#[derive(Default)]
struct ParentPass {
    /// Child links known so far, per parent: listed from the destination,
    /// or seeded with the link made right after creating the parent.
    relationships: BTreeMap<EntityId, Vec<ChildRelationship>>,
}

impl<D: Destination> Reconciler<'_, D> {
    pub(super) fn reconcile_parents(&mut self) -> Result<(), SyncError> {
        let _span = info_span!("reconcile", entity = "parents").entered();
        let source = self.source;
        let context = self.context;
        let slots = &context.mapping.parents.guardians;
        let mut pass = ParentPass::default();

        for link in source.parents.values() {
            for (slot, guardian) in slots.iter().zip(&link.guardians) {
                let Some(email) = guardian.email.as_deref().and_then(|raw| Email::new(raw).ok())
                else {
                    self.executor.record(OperationRecord::note(
                        actions::MISSING_EMAIL,
                        "",
                        format!("{} has no parent email for {}", link.student, slot.label),
                    ));
                    continue;
                };
                let Some(child) = self.live_student_id(&link.student) else {
                    debug!(student = %link.student, %email, "student not at destination, parent skipped");
                    continue;
                };
                let role = guardian
                    .relationship
                    .clone()
                    .unwrap_or_else(|| slot.default_role().to_string());
                let candidate = Candidate {
                    email,
                    role,
                    slot,
                    guardian,
                };
                self.reconcile_parent(&candidate, &link.student, child, &mut pass)?;
            }
        }
        Ok(())
    }

    fn live_student_id(&self, number: &StudentNumber) -> Option<EntityId> {
        self.state
            .students
            .get(number)
            .filter(|student| !student.archived)
            .map(|student| student.id)
    }

    fn reconcile_parent(
        &mut self,
        candidate: &Candidate<'_>,
        student: &StudentNumber,
        child: EntityId,
        pass: &mut ParentPass,
    ) -> Result<(), SyncError> {
        let Some(existing) = self.state.parents.get(&candidate.email) else {
            self.create_parent(candidate, student, child, pass);
            return Ok(());
        };
        let parent = existing.id;

        if existing.archived {
            let operation = Operation::UnarchiveParent {
                email: candidate.email.clone(),
                id: parent,
            };
            if self.executor.execute(&operation).is_applied()
                && let Some(record) = self.state.parents.get_mut(&candidate.email)
            {
                record.archived = false;
            }
        }

        if self.context.options.associations {
            self.reconcile_association(candidate, student, parent, child, pass)?;
        }
        Ok(())
    }

    /// Create the parent and link it to `child` straight away.
    fn create_parent(
        &mut self,
        candidate: &Candidate<'_>,
        student: &StudentNumber,
        child: EntityId,
        pass: &mut ParentPass,
    ) {
        let (first_name, last_name) = parent_names(candidate.guardian, candidate.slot, &candidate.email);
        let payload = ParentPayload {
            email: candidate.email.clone(),
            first_name,
            last_name,
            gender: candidate.slot.gender.clone(),
        };
        let operation = Operation::CreateParent {
            payload: payload.clone(),
        };
        let ExecutionOutcome::Applied(response) = self.executor.execute(&operation) else {
            return;
        };
        let Some(parent) = created_id(&response, "parent") else {
            warn!(email = %candidate.email, "parent creation returned no id, not linking");
            self.executor.record(OperationRecord::note(
                actions::SKIPPED_CREATE,
                candidate.email.to_string(),
                "creation response carried no id",
            ));
            return;
        };

        self.state.parents.insert(
            candidate.email.clone(),
            DestParent {
                id: parent,
                email: Some(payload.email.to_string()),
                first_name: Some(payload.first_name),
                last_name: Some(payload.last_name),
                gender: payload.gender,
                archived: false,
            },
        );
        pass.relationships.entry(parent).or_default();

        let link = Operation::LinkChild {
            parent,
            parent_email: candidate.email.clone(),
            child,
            student: student.clone(),
            relationship: candidate.role.clone(),
        };
        if self.executor.execute(&link).is_applied() {
            pass.relationships.entry(parent).or_default().push(ChildRelationship {
                id: child,
                relationship: Some(candidate.role.clone()),
            });
        }
    }

    /// Link `child` to an existing parent, or correct the role of the link.
    fn reconcile_association(
        &mut self,
        candidate: &Candidate<'_>,
        student: &StudentNumber,
        parent: EntityId,
        child: EntityId,
        pass: &mut ParentPass,
    ) -> Result<(), SyncError> {
        if !pass.relationships.contains_key(&parent) {
            let listed = self
                .executor
                .destination()
                .child_relationships(parent)
                .map_err(SyncError::listing("child relationships"))?;
            pass.relationships.insert(parent, listed);
        }
        let current = pass
            .relationships
            .get(&parent)
            .and_then(|links| links.iter().find(|link| link.id == child))
            .map(|link| link.relationship.clone());

        let operation = match current {
            None => Operation::LinkChild {
                parent,
                parent_email: candidate.email.clone(),
                child,
                student: student.clone(),
                relationship: candidate.role.clone(),
            },
            Some(role) if role.as_deref() != Some(candidate.role.as_str()) => {
                Operation::UpdateChildRelationship {
                    parent,
                    parent_email: candidate.email.clone(),
                    child,
                    relationship: candidate.role.clone(),
                }
            }
            Some(_) => return Ok(()),
        };

        if self.executor.execute(&operation).is_applied() {
            let links = pass.relationships.entry(parent).or_default();
            match links.iter_mut().find(|link| link.id == child) {
                Some(link) => link.relationship = Some(candidate.role.clone()),
                None => links.push(ChildRelationship {
                    id: child,
                    relationship: Some(candidate.role.clone()),
                }),
            }
        }
        Ok(())
    }
}

/// First and last name of a new parent, title-cased.
///
/// Names missing from the record are derived from the e-mail local part.
fn parent_names(guardian: &GuardianEntry, slot: &GuardianSlot, email: &Email) -> (String, String) {
    let handle = email.handle();
    let (fallback_first, fallback_last) = match slot.name_fallback {
        NameFallback::Handle => (handle, handle),
        NameFallback::UnderscoreLastFirst => match handle.split_once('_') {
            Some((last, rest)) => (rest.split('_').next().unwrap_or(rest), last),
            None => (handle, handle),
        },
    };
    let first = guardian.first_name.as_deref().unwrap_or(fallback_first);
    let last = guardian.last_name.as_deref().unwrap_or(fallback_last);
    (title_case(first), title_case(last))
}

/// Upper-case the first letter of every alphabetic run, lower-case the rest.
fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut at_word_start = true;
    for ch in text.chars() {
        if ch.is_alphabetic() {
            if at_word_start {
                out.extend(ch.to_uppercase());
            } else {
                out.extend(ch.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(ch);
            at_word_start = true;
        }
    }
    out
}
