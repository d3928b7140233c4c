//! Entity reconciliation.
//!
//! A run walks the entities in dependency order:
//!
//! 1. year groups and students are loaded, departed students archived;
//! 2. teachers are loaded and missing ones created;
//! 3. students are created, unarchived, regrouped and diffed;
//! 4. parents are created, unarchived and linked;
//! 5. classes and memberships are loaded and checked;
//! 6. outside provision-only runs, class removals, the batched field
//!    updates and the gated enrollments are applied.
//!
//! Every operation goes through the [`Executor`]; fatal errors stop the run
//! but the audit log gathered so far is always returned.

mod enrollments;
mod parents;
mod students;
mod teachers;

use roster_dest::Destination;
use roster_ingest::SourceSnapshot;
use roster_model::AuditLog;
use tracing::{error, info, info_span};

use crate::context::SyncContext;
use crate::error::SyncError;
use crate::executor::Executor;
use crate::pending::PendingUpdates;
use crate::state::DestinationState;

pub use students::profile_diff;

/// Audit log of a run plus its fatal error, if any.
#[derive(Debug)]
pub struct SyncOutcome {
    pub log: AuditLog,
    pub result: Result<(), SyncError>,
}

impl SyncOutcome {
    /// A run that never reached the destination.
    pub fn aborted(error: SyncError) -> Self {
        Self {
            log: AuditLog::new(),
            result: Err(error),
        }
    }

    pub fn is_success(&self) -> bool {
        self.result.is_ok() && self.log.error_count() == 0
    }
}

pub struct Reconciler<'a, D: Destination> {
    context: &'a SyncContext,
    source: &'a SourceSnapshot,
    executor: Executor<'a, D>,
    state: DestinationState,
    pending: PendingUpdates,
}

impl<'a, D: Destination> Reconciler<'a, D> {
    pub fn new(context: &'a SyncContext, source: &'a SourceSnapshot, destination: &'a mut D) -> Self {
        Self {
            context,
            source,
            executor: Executor::new(destination),
            state: DestinationState::default(),
            pending: PendingUpdates::new(),
        }
    }

    pub fn run(mut self) -> SyncOutcome {
        let result = self.reconcile_all();
        if let Err(err) = &result {
            error!(error = %err, "reconciliation aborted");
        }
        let log = self.executor.into_log();
        info!(
            records = log.records.len(),
            errors = log.error_count(),
            changes = log.change_count(),
            missing_classes = log.missing_classes.len(),
            "reconciliation finished"
        );
        SyncOutcome { log, result }
    }

    fn reconcile_all(&mut self) -> Result<(), SyncError> {
        let context = self.context;
        let options = &context.options;

        {
            let _span = info_span!("load_destination", entity = "students").entered();
            self.state.load_students(
                self.executor.destination(),
                &context.mapping.grades.ignored_year_groups,
            )?;
        }
        self.archive_departed_students();

        {
            let _span = info_span!("load_destination", entity = "teachers").entered();
            self.state.load_teachers(self.executor.destination())?;
        }
        self.reconcile_teachers();

        self.reconcile_students()?;

        {
            let _span = info_span!("load_destination", entity = "parents").entered();
            self.state.load_parents(self.executor.destination())?;
        }
        self.reconcile_parents()?;

        {
            let _span = info_span!("load_destination", entity = "classes").entered();
            self.state.load_classes(self.executor.destination())?;
            self.state
                .load_memberships(self.executor.destination(), options.run_date)?;
        }

        if options.provision_only {
            info!(
                pending_updates = self.pending.len(),
                "provision-only run, skipping class changes and field updates"
            );
            return Ok(());
        }

        self.remove_stale_enrollments();
        self.apply_pending_updates();
        self.enroll_students()?;
        Ok(())
    }
}

/// Run a full reconciliation of `source` into `destination`.
pub fn reconcile<D: Destination>(
    context: &SyncContext,
    source: &SourceSnapshot,
    destination: &mut D,
) -> SyncOutcome {
    Reconciler::new(context, source, destination).run()
}
