//! In-process destination.
//!
//! Applies operations to plain collections and answers with responses shaped
//! like the REST API's. Used as the destination in reconciliation tests,
//! including repeated runs against the same state.

use std::cell::Cell;
use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use roster_model::{
    AcademicCatalog, ChildRelationship, DestClass, DestParent, DestStudent, DestTeacher,
    EntityId, Membership, Operation, YearGroup,
};
use serde_json::{Value, json};

use crate::destination::Destination;
use crate::error::DestinationError;

const FIRST_ID: i64 = 10_000;

#[derive(Debug, Default)]
pub struct MemoryDestination {
    pub year_groups: Vec<YearGroup>,
    pub students: Vec<DestStudent>,
    pub teachers: Vec<DestTeacher>,
    pub parents: Vec<DestParent>,
    pub children: BTreeMap<EntityId, Vec<ChildRelationship>>,
    pub classes: Vec<DestClass>,
    pub memberships: Vec<Membership>,
    pub catalog: AcademicCatalog,
    /// Every operation accepted so far, in order.
    pub applied: Vec<Operation>,
    next_id: i64,
    failing: BTreeSet<String>,
    without_id: BTreeSet<String>,
    relationship_listings: Cell<usize>,
}

impl MemoryDestination {
    pub fn new() -> Self {
        Self {
            next_id: FIRST_ID,
            ..Self::default()
        }
    }

    pub fn with_year_group(mut self, id: i64, grade_number: u32, name: &str) -> Self {
        self.year_groups.push(YearGroup {
            id: EntityId(id),
            name: Some(name.to_string()),
            grade: Some(name.to_string()),
            grade_number: Some(grade_number),
            student_ids: BTreeSet::new(),
        });
        self
    }

    pub fn with_student(mut self, student: DestStudent) -> Self {
        self.students.push(student);
        self
    }

    pub fn with_teacher(mut self, id: i64, email: &str) -> Self {
        self.teachers.push(DestTeacher {
            id: EntityId(id),
            email: Some(email.to_string()),
            first_name: None,
            middle_name: None,
            last_name: None,
            archived: false,
        });
        self
    }

    pub fn with_parent(mut self, parent: DestParent) -> Self {
        self.parents.push(parent);
        self
    }

    pub fn with_class(mut self, class: DestClass) -> Self {
        self.classes.push(class);
        self
    }

    pub fn with_membership(mut self, student: &str, class: &str) -> Self {
        self.memberships.push(Membership {
            uniq_student_id: student.to_string(),
            uniq_class_id: class.to_string(),
            role: "Student".to_string(),
        });
        self
    }

    pub fn with_child(mut self, parent: i64, child: i64, relationship: &str) -> Self {
        self.children
            .entry(EntityId(parent))
            .or_default()
            .push(ChildRelationship {
                id: EntityId(child),
                relationship: Some(relationship.to_string()),
            });
        self
    }

    pub fn with_catalog(mut self, catalog: AcademicCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    /// Make every later operation with this action name fail.
    pub fn fail_action(&mut self, action: &str) {
        self.failing.insert(action.to_string());
    }

    /// Answer later create operations with this action name with an
    /// error body lacking an id, without creating anything.
    pub fn answer_without_id(&mut self, action: &str) {
        self.without_id.insert(action.to_string());
    }

    /// How many times child relationships were listed.
    pub fn relationship_listings(&self) -> usize {
        self.relationship_listings.get()
    }

    pub fn student(&self, student_id: &str) -> Option<&DestStudent> {
        self.students
            .iter()
            .find(|student| student.student_id.as_deref() == Some(student_id))
    }

    pub fn year_group(&self, id: i64) -> Option<&YearGroup> {
        self.year_groups.iter().find(|group| group.id == EntityId(id))
    }

    fn allocate_id(&mut self) -> EntityId {
        let id = EntityId(self.next_id.max(FIRST_ID));
        self.next_id = id.get() + 1;
        id
    }

    fn student_mut(&mut self, id: EntityId) -> Result<&mut DestStudent, DestinationError> {
        self.students
            .iter_mut()
            .find(|student| student.id == id)
            .ok_or_else(|| DestinationError::not_found(format!("student {id}")))
    }

    fn year_group_mut(&mut self, id: EntityId) -> Result<&mut YearGroup, DestinationError> {
        self.year_groups
            .iter_mut()
            .find(|group| group.id == id)
            .ok_or_else(|| DestinationError::not_found(format!("year group {id}")))
    }

    fn parent_mut(&mut self, id: EntityId) -> Result<&mut DestParent, DestinationError> {
        self.parents
            .iter_mut()
            .find(|parent| parent.id == id)
            .ok_or_else(|| DestinationError::not_found(format!("parent {id}")))
    }

    /// Unique ids of a student and a class, as memberships carry them.
    fn membership_keys(
        &self,
        student_id: EntityId,
        class_id: EntityId,
    ) -> Result<(String, String), DestinationError> {
        let student = self
            .students
            .iter()
            .find(|student| student.id == student_id)
            .and_then(|student| student.student_id.clone())
            .ok_or_else(|| DestinationError::not_found(format!("student {student_id}")))?;
        let class = self
            .classes
            .iter()
            .find(|class| class.id == class_id)
            .and_then(|class| class.uniq_id.clone())
            .ok_or_else(|| DestinationError::not_found(format!("class {class_id}")))?;
        Ok((student, class))
    }

    fn dispatch(&mut self, operation: &Operation) -> Result<Value, DestinationError> {
        match operation {
            Operation::CreateStudent { payload } => {
                let taken = self
                    .students
                    .iter()
                    .any(|student| student.student_id.as_deref() == Some(payload.student_id.as_str()));
                if taken {
                    return Err(DestinationError::Rejected {
                        action: operation.action().to_string(),
                        message: format!("student_id {} has already been taken", payload.student_id),
                    });
                }
                let student = DestStudent::from_payload(self.allocate_id(), payload);
                let response = json!({ "student": student });
                self.students.push(student);
                Ok(response)
            }
            Operation::UnarchiveStudent { id, .. } => {
                let student = self.student_mut(*id)?;
                student.archived = false;
                Ok(json!({ "student": student }))
            }
            Operation::ArchiveStudent { id, .. } => {
                let student = self.student_mut(*id)?;
                student.archived = true;
                Ok(json!({ "student": student }))
            }
            Operation::UpdateStudentField {
                id, field, value, ..
            } => {
                let student = self.student_mut(*id)?;
                student.set_field(*field, value.as_ref());
                Ok(json!({ "student": student }))
            }
            Operation::AddToYearGroup {
                student_id,
                year_group,
                ..
            } => {
                let group = self.year_group_mut(*year_group)?;
                group.student_ids.insert(*student_id);
                Ok(json!({ "year_group": group }))
            }
            Operation::RemoveFromYearGroup {
                student_id,
                year_group,
                ..
            } => {
                let group = self.year_group_mut(*year_group)?;
                group.student_ids.remove(student_id);
                Ok(json!({ "year_group": group }))
            }
            Operation::CreateTeacher { payload } => {
                let teacher = DestTeacher {
                    id: self.allocate_id(),
                    email: Some(payload.email.to_string()),
                    first_name: payload.first_name.clone(),
                    middle_name: payload.middle_name.clone(),
                    last_name: payload.last_name.clone(),
                    archived: false,
                };
                let response = json!({ "teacher": teacher });
                self.teachers.push(teacher);
                Ok(response)
            }
            Operation::CreateParent { payload } => {
                let parent = DestParent {
                    id: self.allocate_id(),
                    email: Some(payload.email.to_string()),
                    first_name: Some(payload.first_name.clone()),
                    last_name: Some(payload.last_name.clone()),
                    gender: payload.gender.clone(),
                    archived: false,
                };
                let response = json!({ "parent": parent });
                self.parents.push(parent);
                Ok(response)
            }
            Operation::UnarchiveParent { id, .. } => {
                let parent = self.parent_mut(*id)?;
                parent.archived = false;
                Ok(json!({ "parent": parent }))
            }
            Operation::LinkChild {
                parent,
                child,
                relationship,
                ..
            } => {
                self.parent_mut(*parent)?;
                let links = self.children.entry(*parent).or_default();
                links.retain(|link| link.id != *child);
                links.push(ChildRelationship {
                    id: *child,
                    relationship: Some(relationship.clone()),
                });
                Ok(json!({ "child": { "id": child, "relationship": relationship } }))
            }
            Operation::UpdateChildRelationship {
                parent,
                child,
                relationship,
                ..
            } => {
                let link = self
                    .children
                    .get_mut(parent)
                    .and_then(|links| links.iter_mut().find(|link| link.id == *child))
                    .ok_or_else(|| {
                        DestinationError::not_found(format!("child {child} of parent {parent}"))
                    })?;
                link.relationship = Some(relationship.clone());
                Ok(json!({ "child": link }))
            }
            Operation::AddStudentToClass {
                student_id,
                class_id,
                ..
            } => {
                let (student, class) = self.membership_keys(*student_id, *class_id)?;
                let present = self
                    .memberships
                    .iter()
                    .any(|row| row.uniq_student_id == student && row.uniq_class_id == class);
                if !present {
                    self.memberships.push(Membership {
                        uniq_student_id: student,
                        uniq_class_id: class,
                        role: "Student".to_string(),
                    });
                }
                Ok(json!({ "student_ids": [student_id] }))
            }
            Operation::RemoveStudentFromClass {
                student_id,
                class_id,
                ..
            } => {
                let (student, class) = self.membership_keys(*student_id, *class_id)?;
                self.memberships
                    .retain(|row| !(row.uniq_student_id == student && row.uniq_class_id == class));
                Ok(json!({ "student_ids": [student_id] }))
            }
        }
    }
}

impl Destination for MemoryDestination {
    fn year_groups(&self) -> Result<Vec<YearGroup>, DestinationError> {
        Ok(self.year_groups.clone())
    }

    fn students(&self) -> Result<Vec<DestStudent>, DestinationError> {
        Ok(self.students.clone())
    }

    fn teachers(&self) -> Result<Vec<DestTeacher>, DestinationError> {
        Ok(self.teachers.clone())
    }

    fn parents(&self) -> Result<Vec<DestParent>, DestinationError> {
        Ok(self.parents.clone())
    }

    fn classes(&self, archived: bool) -> Result<Vec<DestClass>, DestinationError> {
        Ok(self
            .classes
            .iter()
            .filter(|class| class.archived == archived)
            .cloned()
            .collect())
    }

    fn memberships(&self, _on: NaiveDate) -> Result<Vec<Membership>, DestinationError> {
        let active_class = |uniq: &str| {
            self.classes
                .iter()
                .any(|class| !class.archived && class.uniq_id.as_deref() == Some(uniq))
        };
        let active_student = |uniq: &str| {
            self.students
                .iter()
                .any(|student| !student.archived && student.student_id.as_deref() == Some(uniq))
        };
        Ok(self
            .memberships
            .iter()
            .filter(|row| {
                active_class(row.uniq_class_id.trim()) && active_student(row.uniq_student_id.trim())
            })
            .cloned()
            .collect())
    }

    fn child_relationships(
        &self,
        parent: EntityId,
    ) -> Result<Vec<ChildRelationship>, DestinationError> {
        self.relationship_listings
            .set(self.relationship_listings.get() + 1);
        Ok(self.children.get(&parent).cloned().unwrap_or_default())
    }

    fn academic_years(&self) -> Result<AcademicCatalog, DestinationError> {
        Ok(self.catalog.clone())
    }

    fn apply(&mut self, operation: &Operation) -> Result<Value, DestinationError> {
        let action = operation.action();
        if self.failing.contains(action) {
            return Err(DestinationError::Rejected {
                action: action.to_string(),
                message: "simulated failure".to_string(),
            });
        }
        if self.without_id.contains(action) {
            return Ok(json!({ "error": "record could not be created" }));
        }
        let response = self.dispatch(operation)?;
        self.applied.push(operation.clone());
        Ok(response)
    }
}
