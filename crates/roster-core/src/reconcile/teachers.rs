use roster_dest::{Destination, created_id};
use roster_model::{DestTeacher, Operation, OperationRecord, TeacherPayload, actions};
use tracing::{info_span, warn};

use super::Reconciler;
use crate::executor::ExecutionOutcome;

impl<D: Destination> Reconciler<'_, D> {
    /// Create every source teacher unknown to the destination.
    pub(super) fn reconcile_teachers(&mut self) {
        let _span = info_span!("reconcile", entity = "teachers").entered();
        let source = self.source;

        for (email, teacher) in &source.teachers {
            if self.state.teachers.contains_key(email) {
                continue;
            }
            let payload = TeacherPayload {
                email: email.clone(),
                first_name: teacher.first_name.clone(),
                last_name: teacher.last_name.clone(),
                middle_name: teacher.middle_name.clone(),
            };
            let operation = Operation::CreateTeacher { payload };
            let ExecutionOutcome::Applied(response) = self.executor.execute(&operation) else {
                continue;
            };
            let Some(id) = created_id(&response, "teacher") else {
                warn!(%email, "teacher creation returned no id, not adding");
                self.executor.record(OperationRecord::note(
                    actions::SKIPPED_CREATE,
                    email.to_string(),
                    "creation response carried no id",
                ));
                continue;
            };
            self.state.teachers.insert(
                email.clone(),
                DestTeacher {
                    id,
                    email: Some(email.to_string()),
                    first_name: teacher.first_name.clone(),
                    middle_name: teacher.middle_name.clone(),
                    last_name: teacher.last_name.clone(),
                    archived: false,
                },
            );
        }
    }
}
