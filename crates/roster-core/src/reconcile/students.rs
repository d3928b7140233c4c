use roster_dest::{Destination, created_id};
use roster_model::{
    DestStudent, EntityId, FieldValue, IntegrityError, Operation, OperationRecord,
    OtherNameTarget, SourceStudent, StudentField, StudentNumber, StudentPayload, actions,
};
use tracing::{debug, info, info_span, warn};

use super::Reconciler;
use crate::advisor::{AdvisorMatch, resolve_advisor};
use crate::dates::{parse_destination_date, parse_source_date};
use crate::error::SyncError;
use crate::executor::ExecutionOutcome;
use crate::grade::grade_bucket;

/// Target year group of one student.
struct Placement {
    bucket: u32,
    year_group: EntityId,
    label: String,
}

impl<D: Destination> Reconciler<'_, D> {
    /// Archive destination students the source no longer lists.
    ///
    /// Already archived students and placeholder numbers are left alone.
    pub(super) fn archive_departed_students(&mut self) {
        let _span = info_span!("reconcile", entity = "departed_students").entered();
        let source = self.source;
        let withdrawn_on = self.context.options.run_date;

        let departed: Vec<(StudentNumber, EntityId)> = self
            .state
            .students
            .iter()
            .filter(|(number, student)| {
                !source.students.contains_key(*number)
                    && !student.archived
                    && !number.is_placeholder()
            })
            .map(|(number, student)| (number.clone(), student.id))
            .collect();

        info!(count = departed.len(), "archiving departed students");
        for (number, id) in departed {
            let operation = Operation::ArchiveStudent {
                student: number.clone(),
                id,
                withdrawn_on,
            };
            if self.executor.execute(&operation).is_applied()
                && let Some(student) = self.state.students.get_mut(&number)
            {
                student.archived = true;
            }
        }
    }

    pub(super) fn reconcile_students(&mut self) -> Result<(), SyncError> {
        let _span = info_span!("reconcile", entity = "students").entered();
        let source = self.source;

        for student in source.students.values() {
            let placement = self.placement(student)?;
            if self.state.students.contains_key(&student.number) {
                self.reconcile_existing(student, &placement);
            } else {
                self.create_student(student, &placement)?;
            }
        }
        debug!(pending_updates = self.pending.len(), "student pass complete");
        Ok(())
    }

    /// Grade bucket and its year group; both must resolve.
    fn placement(&self, student: &SourceStudent) -> Result<Placement, IntegrityError> {
        let bucket = grade_bucket(student.grade.as_deref(), &self.context.mapping.grades)?;
        let group =
            self.state
                .year_group_for(bucket)
                .ok_or_else(|| IntegrityError::MissingYearGroup {
                    grade_number: bucket,
                    grade: student.grade.clone().unwrap_or_default(),
                })?;
        Ok(Placement {
            bucket,
            year_group: group.id,
            label: group.label(),
        })
    }

    /// Resolve the home-room advisor, recording ambiguous or unknown teachers.
    fn advisor_for(&mut self, student: &SourceStudent) -> Option<EntityId> {
        let home_room = student.home_room.as_deref();
        match resolve_advisor(home_room, &self.source.teachers, &self.state.teachers) {
            AdvisorMatch::Found(id) => Some(id),
            AdvisorMatch::Unassigned => None,
            AdvisorMatch::Ambiguous(emails) => {
                warn!(student = %student.number, home_room, "ambiguous home-room teacher");
                let listed = emails
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", ");
                self.executor.record(OperationRecord::problem(
                    actions::FIELD_CHECK,
                    home_room.unwrap_or_default(),
                    Some(listed),
                ));
                None
            }
            AdvisorMatch::NotInDestination(email) => {
                warn!(student = %student.number, %email, "home-room teacher not in destination");
                self.executor.record(OperationRecord::problem(
                    actions::FIELD_CHECK,
                    format!("{email} not in destination"),
                    None,
                ));
                None
            }
        }
    }

    fn create_student(
        &mut self,
        student: &SourceStudent,
        placement: &Placement,
    ) -> Result<(), SyncError> {
        let birthday = match student.birth_date.as_deref() {
            Some(raw) => Some(parse_source_date(raw).ok_or_else(|| {
                IntegrityError::InvalidBirthDate {
                    student: student.number.to_string(),
                    value: raw.to_string(),
                }
            })?),
            None => None,
        };
        let advisor = self.advisor_for(student);

        let mut payload = StudentPayload {
            student_id: student.number.clone(),
            birthday,
            first_name: student.first_name.clone(),
            middle_name: student.middle_name.clone(),
            last_name: student.last_name.clone(),
            email: student.email.clone(),
            gender: student.gender_label().map(str::to_string),
            class_grade_number: placement.bucket,
            other_name: None,
            nickname: None,
            homeroom_advisor_id: advisor,
        };
        match self.context.mapping.other_name_target {
            OtherNameTarget::OtherName => payload.other_name = student.other_name.clone(),
            OtherNameTarget::Nickname => payload.nickname = student.other_name.clone(),
        }

        let operation = Operation::CreateStudent {
            payload: payload.clone(),
        };
        let ExecutionOutcome::Applied(response) = self.executor.execute(&operation) else {
            return Ok(());
        };
        let Some(id) = created_id(&response, "student") else {
            warn!(student = %student.number, "student creation returned no id, not adding");
            self.executor.record(OperationRecord::note(
                actions::SKIPPED_CREATE,
                student.number.to_string(),
                "creation response carried no id",
            ));
            return Ok(());
        };

        self.state
            .students
            .insert(student.number.clone(), DestStudent::from_payload(id, &payload));
        self.join_year_group(&student.number, id, placement);
        Ok(())
    }

    fn reconcile_existing(&mut self, student: &SourceStudent, placement: &Placement) {
        let Some(current) = self.state.students.get(&student.number) else {
            return;
        };
        let id = current.id;

        if current.archived {
            let operation = Operation::UnarchiveStudent {
                student: student.number.clone(),
                id,
            };
            if self.executor.execute(&operation).is_applied()
                && let Some(record) = self.state.students.get_mut(&student.number)
            {
                record.archived = false;
            }
        }

        self.join_year_group(&student.number, id, placement);
        self.leave_other_year_groups(&student.number, id, placement);

        if self.context.options.profiles {
            let advisor = self.advisor_for(student);
            let target = self.context.mapping.other_name_target;
            if let Some(current) = self.state.students.get(&student.number) {
                for (field, value) in profile_diff(student, current, advisor, target) {
                    debug!(student = %student.number, %field, "field differs");
                    self.pending.insert(student.number.clone(), field, value);
                }
            }
        }
    }

    fn join_year_group(&mut self, number: &StudentNumber, id: EntityId, placement: &Placement) {
        let member = self
            .state
            .year_group_mut(placement.year_group)
            .is_some_and(|group| group.student_ids.contains(&id));
        if member {
            return;
        }
        let operation = Operation::AddToYearGroup {
            student: number.clone(),
            student_id: id,
            year_group: placement.year_group,
            year_group_label: placement.label.clone(),
        };
        if self.executor.execute(&operation).is_applied()
            && let Some(group) = self.state.year_group_mut(placement.year_group)
        {
            group.student_ids.insert(id);
        }
    }

    fn leave_other_year_groups(
        &mut self,
        number: &StudentNumber,
        id: EntityId,
        placement: &Placement,
    ) {
        let stale: Vec<(EntityId, String)> = self
            .state
            .year_groups
            .iter()
            .filter(|group| group.grade_number != Some(placement.bucket))
            .filter(|group| group.student_ids.contains(&id))
            .map(|group| (group.id, group.label()))
            .collect();

        for (year_group, label) in stale {
            let operation = Operation::RemoveFromYearGroup {
                student: number.clone(),
                student_id: id,
                year_group,
                year_group_label: label,
            };
            if self.executor.execute(&operation).is_applied()
                && let Some(group) = self.state.year_group_mut(year_group)
            {
                group.student_ids.remove(&id);
            }
        }
    }

    /// Send the field updates decided during the student pass.
    pub(super) fn apply_pending_updates(&mut self) {
        let _span = info_span!("reconcile", entity = "student_fields").entered();
        let pending = std::mem::take(&mut self.pending);
        info!(count = pending.len(), "applying field updates");

        for (number, field, value) in pending.iter() {
            let Some(id) = self.state.students.get(number).map(|student| student.id) else {
                continue;
            };
            let operation = Operation::UpdateStudentField {
                student: number.clone(),
                id,
                field,
                value: value.clone(),
            };
            if self.executor.execute(&operation).is_applied()
                && let Some(student) = self.state.students.get_mut(number)
            {
                student.set_field(field, value.as_ref());
            }
        }
    }
}

/// Tracked fields whose destination value differs from the source.
///
/// A source value replaces a different or blank destination value; a blank
/// source value clears a set destination value. The advisor is compared only
/// when it resolved. Birth dates are compared as dates.
pub fn profile_diff(
    source: &SourceStudent,
    destination: &DestStudent,
    advisor: Option<EntityId>,
    other_name_target: OtherNameTarget,
) -> Vec<(StudentField, Option<FieldValue>)> {
    let mut changes = Vec::new();

    match source.birth_date.as_deref() {
        Some(raw) => match parse_source_date(raw) {
            Some(date) => {
                let current = destination
                    .field(StudentField::Birthday)
                    .and_then(|value| parse_destination_date(&value));
                if current != Some(date) {
                    changes.push((StudentField::Birthday, Some(FieldValue::Date(date))));
                }
            }
            None => warn!(student = %source.number, value = raw, "unreadable birth date, not compared"),
        },
        None => {
            if destination.field(StudentField::Birthday).is_some() {
                changes.push((StudentField::Birthday, None));
            }
        }
    }

    let text_fields = [
        (StudentField::Email, source.email.clone()),
        (StudentField::LastName, source.last_name.clone()),
        (StudentField::FirstName, source.first_name.clone()),
        (StudentField::MiddleName, source.middle_name.clone()),
        (other_name_target.field(), source.other_name.clone()),
        (StudentField::Gender, source.gender_label().map(str::to_string)),
    ];
    for (field, wanted) in text_fields {
        let wanted = wanted.filter(|value| !value.trim().is_empty());
        let current = destination.field(field);
        match wanted {
            Some(value) if current.as_deref() != Some(value.as_str()) => {
                changes.push((field, Some(FieldValue::Text(value))));
            }
            Some(_) => {}
            None if current.is_some() => changes.push((field, None)),
            None => {}
        }
    }

    if let Some(advisor) = advisor
        && destination.homeroom_advisor_id != Some(advisor)
    {
        changes.push((StudentField::HomeroomAdvisorId, Some(FieldValue::Id(advisor))));
    }

    changes
}
