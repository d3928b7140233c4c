//! Operation executor.
//!
//! Sends each decided [`Operation`] to the destination and appends exactly
//! one [`OperationRecord`] per attempt. A failing call never aborts the run:
//! it comes back as [`ExecutionOutcome::Failed`] and the caller skips the
//! steps that depended on it.

use roster_dest::Destination;
use roster_model::{AuditLog, MissingClass, Operation, OperationRecord};
use serde_json::Value;
use tracing::{debug, warn};

/// Result of one attempted mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionOutcome {
    /// The destination answered; the body may still carry an error flag.
    Applied(Value),
    /// The call failed before a response was produced.
    Failed(String),
}

impl ExecutionOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied(_))
    }
}

pub struct Executor<'a, D: Destination> {
    destination: &'a mut D,
    log: AuditLog,
}

impl<'a, D: Destination> Executor<'a, D> {
    pub fn new(destination: &'a mut D) -> Self {
        Self {
            destination,
            log: AuditLog::new(),
        }
    }

    /// Read access for listings.
    pub fn destination(&self) -> &D {
        self.destination
    }

    pub fn execute(&mut self, operation: &Operation) -> ExecutionOutcome {
        match self.destination.apply(operation) {
            Ok(response) => {
                let record = OperationRecord::applied(operation, &response);
                if record.error {
                    warn!(
                        action = operation.action(),
                        description = %record.description,
                        "destination reported an error"
                    );
                } else {
                    debug!(
                        action = operation.action(),
                        description = %record.description,
                        "applied"
                    );
                }
                self.log.push(record);
                ExecutionOutcome::Applied(response)
            }
            Err(err) => {
                let cause = err.to_string();
                warn!(
                    action = operation.action(),
                    description = %operation.description(),
                    error = %cause,
                    "operation failed"
                );
                self.log.push(OperationRecord::failed(operation, cause.clone()));
                ExecutionOutcome::Failed(cause)
            }
        }
    }

    /// Append a record that documents a decision rather than a call.
    pub fn record(&mut self, record: OperationRecord) {
        self.log.push(record);
    }

    pub fn missing_class(&mut self, missing: MissingClass) {
        self.log.push_missing_class(missing);
    }

    pub fn log(&self) -> &AuditLog {
        &self.log
    }

    pub fn into_log(self) -> AuditLog {
        self.log
    }
}
