//! Run options for one reconciliation.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Options controlling what a run decides and applies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncOptions {
    /// Date the run acts on: class start gating, membership listing,
    /// and `withdrawn_on` for archived students.
    pub run_date: NaiveDate,

    /// List every parent's child links and fix missing or wrong ones.
    ///
    /// Expensive: one listing call per parent.
    pub associations: bool,

    /// Keep tracked profile fields of existing students in sync.
    pub profiles: bool,

    /// Create and archive only; suppress class enrollment, class removal,
    /// and field updates.
    pub provision_only: bool,
}

impl SyncOptions {
    pub fn new(run_date: NaiveDate) -> Self {
        Self {
            run_date,
            associations: false,
            profiles: true,
            provision_only: false,
        }
    }

    pub fn with_associations(mut self, enable: bool) -> Self {
        self.associations = enable;
        self
    }

    pub fn with_profiles(mut self, enable: bool) -> Self {
        self.profiles = enable;
        self
    }

    pub fn with_provision_only(mut self, enable: bool) -> Self {
        self.provision_only = enable;
        self
    }
}
