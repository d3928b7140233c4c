//! Run context shared by the reconcilers.

use roster_model::{FieldMapping, SyncOptions};

/// Options and deployment mapping for one run.
#[derive(Debug, Clone)]
pub struct SyncContext {
    pub options: SyncOptions,
    pub mapping: FieldMapping,
}

impl SyncContext {
    pub fn new(options: SyncOptions) -> Self {
        Self {
            options,
            mapping: FieldMapping::default(),
        }
    }

    pub fn with_mapping(mut self, mapping: FieldMapping) -> Self {
        self.mapping = mapping;
        self
    }
}
