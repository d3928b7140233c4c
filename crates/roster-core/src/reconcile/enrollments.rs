use chrono::NaiveDate;
use roster_dest::Destination;
use roster_model::{
    AcademicCatalog, ClassUid, DestClass, EntityId, IntegrityError, MissingClass, Operation,
    OperationRecord, StudentNumber, actions,
};
use tracing::{debug, info, info_span, warn};

use super::Reconciler;
use crate::error::SyncError;

impl<D: Destination> Reconciler<'_, D> {
    /// Remove students from classes the source no longer schedules them in.
    ///
    /// Only students present in the source are considered, and nothing is
    /// removed when the source schedule came back empty. Membership rows whose
    /// keys carry surrounding whitespace are reported but left in place.
    pub(super) fn remove_stale_enrollments(&mut self) {
        let _span = info_span!("reconcile", entity = "class_removals").entered();
        let source = self.source;
        if source.enrollments.is_empty() {
            warn!("source schedule is empty, not removing any class memberships");
            return;
        }

        let mut removals = Vec::new();
        for membership in &self.state.memberships {
            let student_key = membership.uniq_student_id.trim();
            let class_key = membership.uniq_class_id.trim();
            let Ok(number) = StudentNumber::new(student_key) else {
                continue;
            };
            if !source.students.contains_key(&number) {
                continue;
            }
            let scheduled = source
                .classes_of(&number)
                .is_some_and(|classes| classes.iter().any(|class| class.as_str() == class_key));
            if scheduled {
                continue;
            }
            if student_key != membership.uniq_student_id || class_key != membership.uniq_class_id {
                warn!(
                    student = %membership.uniq_student_id,
                    class = %membership.uniq_class_id,
                    "membership keys carry whitespace, not removing"
                );
                continue;
            }
            let Some(student_id) = self.state.students.get(&number).map(|student| student.id)
            else {
                continue;
            };
            let Some(class_id) = self.state.classes.get(class_key).map(|class| class.id) else {
                debug!(class = class_key, "membership of an unlisted class, not removing");
                continue;
            };
            let Ok(class) = ClassUid::new(class_key) else {
                continue;
            };
            removals.push(Operation::RemoveStudentFromClass {
                student: number,
                student_id,
                class,
                class_id,
            });
        }

        info!(count = removals.len(), "removing stale class memberships");
        for operation in removals {
            if self.executor.execute(&operation).is_applied()
                && let Operation::RemoveStudentFromClass { student, class, .. } = &operation
                && let Some(classes) = self.state.enrolled.get_mut(student.as_str())
            {
                classes.remove(class.as_str());
            }
        }
    }

    /// Enroll students into scheduled classes whose term has begun.
    pub(super) fn enroll_students(&mut self) -> Result<(), SyncError> {
        let _span = info_span!("reconcile", entity = "enrollments").entered();
        let source = self.source;
        let run_date = self.context.options.run_date;
        let catalog = self
            .executor
            .destination()
            .academic_years()
            .map_err(SyncError::listing("academic years"))?;

        for (number, classes) in &source.enrollments {
            let Some(student_id) = self
                .state
                .students
                .get(number)
                .filter(|student| !student.archived)
                .map(|student| student.id)
            else {
                debug!(student = %number, "student not at destination, enrollments skipped");
                continue;
            };

            for class in classes {
                if self.state.is_enrolled(number.as_str(), class.as_str()) {
                    continue;
                }
                let Some(destination_class) = self.state.classes.get(class.as_str()) else {
                    self.executor
                        .missing_class(MissingClass::new(class.clone(), number.clone()));
                    continue;
                };
                let starts_on = class_start(&catalog, destination_class, class)?;
                let class_id = destination_class.id;
                if starts_on > run_date {
                    debug!(student = %number, %class, %starts_on, "class has not begun");
                    self.executor.record(OperationRecord::note(
                        actions::NOT_YET_STARTED,
                        format!("{number} > {class}"),
                        "Not enrolling as class has not begun",
                    ));
                    continue;
                }
                self.enroll(number, student_id, class, class_id);
            }
        }
        Ok(())
    }

    fn enroll(&mut self, number: &StudentNumber, student_id: EntityId, class: &ClassUid, class_id: EntityId) {
        let operation = Operation::AddStudentToClass {
            student: number.clone(),
            student_id,
            class: class.clone(),
            class_id,
        };
        if self.executor.execute(&operation).is_applied() {
            self.state
                .enrolled
                .entry(number.to_string())
                .or_default()
                .insert(class.to_string());
        }
    }
}

/// Start date of the term a class begins in. Unresolvable dates are fatal.
fn class_start(
    catalog: &AcademicCatalog,
    class: &DestClass,
    uid: &ClassUid,
) -> Result<NaiveDate, IntegrityError> {
    class
        .program_code
        .as_deref()
        .zip(class.start_term_id)
        .and_then(|(program, term)| catalog.term_start(program, term))
        .ok_or_else(|| IntegrityError::UnresolvedStartDate {
            uniq_id: uid.to_string(),
        })
}
