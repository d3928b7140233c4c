//! Source snapshot loading.

use std::collections::BTreeSet;

use indexmap::{IndexMap, IndexSet};
use roster_model::{
    ClassUid, Email, FieldMapping, LoadError, SourceParentLink, SourceStudent, SourceTeacher,
    StudentNumber,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, info_span};

use crate::client::SourceApi;
use crate::extract;
use crate::table::FlatTable;

/// Source entities, in load order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceEntity {
    Students,
    Teachers,
    Parents,
    Enrollments,
}

impl SourceEntity {
    pub const ALL: [SourceEntity; 4] = [
        SourceEntity::Students,
        SourceEntity::Teachers,
        SourceEntity::Parents,
        SourceEntity::Enrollments,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Students => "students",
            Self::Teachers => "teachers",
            Self::Parents => "parents",
            Self::Enrollments => "enrollments",
        }
    }

    /// Enrollments may legitimately be empty (e.g. between terms).
    pub fn required(self) -> bool {
        !matches!(self, Self::Enrollments)
    }
}

/// Query name and page size for one entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuerySpec {
    pub name: String,
    pub page_size: u32,
}

impl QuerySpec {
    fn new(name: &str, page_size: u32) -> Self {
        Self {
            name: name.to_string(),
            page_size,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceQueries {
    pub students: QuerySpec,
    pub teachers: QuerySpec,
    pub parents: QuerySpec,
    pub enrollments: QuerySpec,
}

impl Default for SourceQueries {
    fn default() -> Self {
        Self {
            students: QuerySpec::new("mk.ManageBac_Stu", 2000),
            teachers: QuerySpec::new("mk.ManageBac_Tea", 2000),
            parents: QuerySpec::new("mk.ManageBac_Par", 2000),
            enrollments: QuerySpec::new("mk.ManageBac_Stu_Class", 10000),
        }
    }
}

impl SourceQueries {
    pub fn get(&self, entity: SourceEntity) -> &QuerySpec {
        match entity {
            SourceEntity::Students => &self.students,
            SourceEntity::Teachers => &self.teachers,
            SourceEntity::Parents => &self.parents,
            SourceEntity::Enrollments => &self.enrollments,
        }
    }
}

/// Everything loaded from the source for one run. Immutable once built.
#[derive(Debug, Clone, Default)]
pub struct SourceSnapshot {
    pub students: IndexMap<StudentNumber, SourceStudent>,
    pub teachers: IndexMap<Email, SourceTeacher>,
    pub parents: IndexMap<StudentNumber, SourceParentLink>,
    /// Scheduled classes per student.
    pub enrollments: IndexMap<StudentNumber, IndexSet<ClassUid>>,
    /// Class ids built by folding a lettered section into the class id.
    pub mapped_classes: BTreeSet<ClassUid>,
    /// Flat export of each loaded entity.
    pub tables: Vec<(SourceEntity, FlatTable)>,
}

impl SourceSnapshot {
    pub fn table(&self, entity: SourceEntity) -> Option<&FlatTable> {
        self.tables
            .iter()
            .find(|(candidate, _)| *candidate == entity)
            .map(|(_, table)| table)
    }

    /// Classes the source schedules for `student`.
    pub fn classes_of(&self, student: &StudentNumber) -> Option<&IndexSet<ClassUid>> {
        self.enrollments.get(student)
    }
}

pub struct SnapshotLoader<'a, A: SourceApi> {
    api: &'a A,
    queries: &'a SourceQueries,
    mapping: &'a FieldMapping,
}

impl<'a, A: SourceApi> SnapshotLoader<'a, A> {
    pub fn new(api: &'a A, queries: &'a SourceQueries, mapping: &'a FieldMapping) -> Self {
        Self {
            api,
            queries,
            mapping,
        }
    }

    /// Load every entity. Any failure aborts the load.
    pub fn load(&self) -> Result<SourceSnapshot, LoadError> {
        let span = info_span!("load_source");
        let _guard = span.enter();

        let mut snapshot = SourceSnapshot::default();
        for entity in SourceEntity::ALL {
            let records = self.fetch_all(entity)?;
            self.index(entity, &records, &mut snapshot)?;
            snapshot
                .tables
                .push((entity, FlatTable::from_records(&records)));
        }

        info!(
            students = snapshot.students.len(),
            teachers = snapshot.teachers.len(),
            parents = snapshot.parents.len(),
            enrolled_students = snapshot.enrollments.len(),
            mapped_classes = snapshot.mapped_classes.len(),
            "source snapshot loaded"
        );
        Ok(snapshot)
    }

    /// Request pages until one comes back without records.
    fn fetch_all(&self, entity: SourceEntity) -> Result<Vec<Value>, LoadError> {
        let query = self.queries.get(entity);
        let mut records = Vec::new();
        let mut page = 1;
        while let Some(batch) = self.api.fetch_page(&query.name, page, query.page_size)? {
            if batch.is_empty() {
                break;
            }
            tracing::debug!(entity = entity.name(), page, count = batch.len(), "page received");
            records.extend(batch);
            page += 1;
        }

        if records.is_empty() && entity.required() {
            return Err(LoadError::Empty {
                entity: entity.name().to_string(),
            });
        }
        info!(entity = entity.name(), count = records.len(), "records fetched");
        Ok(records)
    }

    fn index(
        &self,
        entity: SourceEntity,
        records: &[Value],
        snapshot: &mut SourceSnapshot,
    ) -> Result<(), LoadError> {
        for (index, record) in records.iter().enumerate() {
            match entity {
                SourceEntity::Students => {
                    let student = extract::student(index, record, &self.mapping.students)?;
                    snapshot.students.insert(student.number.clone(), student);
                }
                SourceEntity::Teachers => {
                    if let Some(teacher) = extract::teacher(index, record, &self.mapping.teachers)?
                    {
                        snapshot.teachers.insert(teacher.email.clone(), teacher);
                    }
                }
                SourceEntity::Parents => {
                    let link = extract::parent_link(index, record, &self.mapping.parents)?;
                    snapshot.parents.insert(link.student.clone(), link);
                }
                SourceEntity::Enrollments => {
                    let enrollment =
                        extract::enrollment(index, record, &self.mapping.enrollments)?;
                    if enrollment.sectioned {
                        snapshot.mapped_classes.insert(enrollment.class.clone());
                    }
                    snapshot
                        .enrollments
                        .entry(enrollment.student)
                        .or_default()
                        .insert(enrollment.class);
                }
            }
        }
        Ok(())
    }
}
