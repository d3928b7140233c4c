//! In-run view of the destination.
//!
//! Loaded stage by stage from the listings, then kept current by the
//! reconcilers after each applied operation so that later decisions in the
//! same run see earlier changes.

use std::collections::{BTreeMap, BTreeSet};

use indexmap::IndexMap;
use roster_dest::Destination;
use roster_model::{
    DestClass, DestParent, DestStudent, DestTeacher, Email, EntityId, IntegrityError, Membership,
    StudentNumber, YearGroup,
};
use tracing::{debug, warn};

use crate::error::SyncError;

#[derive(Debug, Clone, Default)]
pub struct DestinationState {
    pub year_groups: Vec<YearGroup>,
    pub students: IndexMap<StudentNumber, DestStudent>,
    pub teachers: BTreeMap<Email, DestTeacher>,
    pub parents: BTreeMap<Email, DestParent>,
    /// Active and archived classes by unique id.
    pub classes: IndexMap<String, DestClass>,
    /// Student-role membership rows as listed.
    pub memberships: Vec<Membership>,
    /// Trimmed class ids per trimmed student id.
    pub enrolled: BTreeMap<String, BTreeSet<String>>,
}

impl DestinationState {
    /// Year groups (minus `ignored`) and students, archived ones included.
    pub fn load_students<D: Destination>(
        &mut self,
        destination: &D,
        ignored: &[i64],
    ) -> Result<(), SyncError> {
        self.year_groups = destination
            .year_groups()
            .map_err(SyncError::listing("year groups"))?
            .into_iter()
            .filter(|group| !ignored.contains(&group.id.get()))
            .collect();

        for student in destination
            .students()
            .map_err(SyncError::listing("students"))?
        {
            let key = student
                .student_id
                .as_deref()
                .and_then(|raw| StudentNumber::new(raw).ok());
            match key {
                Some(key) => {
                    self.students.insert(key, student);
                }
                None => warn!(id = %student.id, "destination student without student_id skipped"),
            }
        }
        debug!(
            year_groups = self.year_groups.len(),
            students = self.students.len(),
            "destination students loaded"
        );
        Ok(())
    }

    pub fn load_teachers<D: Destination>(&mut self, destination: &D) -> Result<(), SyncError> {
        for teacher in destination
            .teachers()
            .map_err(SyncError::listing("teachers"))?
        {
            if let Some(email) = teacher.email.as_deref().and_then(|raw| Email::new(raw).ok()) {
                self.teachers.insert(email, teacher);
            }
        }
        debug!(teachers = self.teachers.len(), "destination teachers loaded");
        Ok(())
    }

    pub fn load_parents<D: Destination>(&mut self, destination: &D) -> Result<(), SyncError> {
        for parent in destination
            .parents()
            .map_err(SyncError::listing("parents"))?
        {
            if let Some(email) = parent.email.as_deref().and_then(|raw| Email::new(raw).ok()) {
                self.parents.insert(email, parent);
            }
        }
        debug!(parents = self.parents.len(), "destination parents loaded");
        Ok(())
    }

    /// Active then archived classes. A unique id seen twice is fatal.
    pub fn load_classes<D: Destination>(&mut self, destination: &D) -> Result<(), SyncError> {
        for archived in [false, true] {
            for mut class in destination
                .classes(archived)
                .map_err(SyncError::listing("classes"))?
            {
                class.archived = archived;
                let Some(uniq_id) = class.uniq_id.clone() else {
                    debug!(id = %class.id, "class without unique id skipped");
                    continue;
                };
                if self.classes.contains_key(&uniq_id) {
                    return Err(IntegrityError::DuplicateClass { uniq_id }.into());
                }
                self.classes.insert(uniq_id, class);
            }
        }
        debug!(classes = self.classes.len(), "destination classes loaded");
        Ok(())
    }

    /// Student memberships on `on`. Keys with surrounding whitespace are
    /// indexed trimmed and reported.
    pub fn load_memberships<D: Destination>(
        &mut self,
        destination: &D,
        on: chrono::NaiveDate,
    ) -> Result<(), SyncError> {
        for membership in destination
            .memberships(on)
            .map_err(SyncError::listing("memberships"))?
        {
            if !membership.is_student() {
                continue;
            }
            let student = membership.uniq_student_id.trim();
            let class = membership.uniq_class_id.trim();
            if student != membership.uniq_student_id {
                warn!(student = %membership.uniq_student_id, "whitespace in membership student id");
            }
            if class != membership.uniq_class_id {
                warn!(class = %membership.uniq_class_id, "whitespace in membership class id");
            }
            self.enrolled
                .entry(student.to_string())
                .or_default()
                .insert(class.to_string());
            self.memberships.push(membership);
        }
        debug!(
            memberships = self.memberships.len(),
            students = self.enrolled.len(),
            "destination memberships loaded"
        );
        Ok(())
    }

    /// Year group for a grade bucket. The last listed group wins when
    /// several share a grade number.
    pub fn year_group_for(&self, bucket: u32) -> Option<&YearGroup> {
        self.year_groups
            .iter()
            .rev()
            .find(|group| group.grade_number == Some(bucket))
    }

    pub fn year_group_mut(&mut self, id: EntityId) -> Option<&mut YearGroup> {
        self.year_groups.iter_mut().find(|group| group.id == id)
    }

    pub fn is_enrolled(&self, student: &str, class: &str) -> bool {
        self.enrolled
            .get(student)
            .is_some_and(|classes| classes.contains(class))
    }
}

#[cfg(test)]
mod tests {
    use roster_dest::MemoryDestination;

    use super::*;

    fn class(id: i64, uniq: &str, archived: bool) -> DestClass {
        DestClass {
            id: EntityId(id),
            uniq_id: Some(uniq.to_string()),
            name: None,
            program_code: None,
            start_term_id: None,
            archived,
        }
    }

    #[test]
    fn duplicate_class_across_archival_sets_is_fatal() {
        let destination = MemoryDestination::new()
            .with_class(class(1, "MATH7", false))
            .with_class(class(2, "MATH7", true));
        let mut state = DestinationState::default();
        let err = state.load_classes(&destination).unwrap_err();
        assert!(matches!(
            err,
            SyncError::Integrity(IntegrityError::DuplicateClass { ref uniq_id }) if uniq_id == "MATH7"
        ));
    }

    #[test]
    fn ignored_year_groups_are_dropped() {
        let destination = MemoryDestination::new()
            .with_year_group(1, 6, "Grade 5")
            .with_year_group(2, 7, "Grade 6");
        let mut state = DestinationState::default();
        state.load_students(&destination, &[2]).unwrap();
        assert_eq!(state.year_groups.len(), 1);
        assert!(state.year_group_for(7).is_none());
        assert_eq!(state.year_group_for(6).map(|group| group.id), Some(EntityId(1)));
    }
}
