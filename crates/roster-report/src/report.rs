//! The reporting stage of a run.

use std::path::{Path, PathBuf};

use roster_ingest::{FlatTable, SourceEntity};
use roster_model::AuditLog;
use tracing::info_span;

use crate::error::ReportError;
use crate::export::ExportSet;
use crate::notify::Notifier;
use crate::summary::RunSummary;

/// Summary and exports of one finished (or aborted) run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub summary: RunSummary,
    pub exports: ExportSet,
}

impl RunReport {
    pub fn build(log: &AuditLog, tables: &[(SourceEntity, FlatTable)]) -> Result<Self, ReportError> {
        let _span = info_span!("report").entered();
        Ok(Self {
            summary: RunSummary::from_log(log),
            exports: ExportSet::build(log, tables)?,
        })
    }

    pub fn subject(&self) -> String {
        self.summary.subject()
    }

    pub fn body(&self) -> String {
        self.summary.body()
    }

    pub fn write_to(&self, dir: &Path, stamp: &str) -> Result<Vec<PathBuf>, ReportError> {
        let _span = info_span!("report").entered();
        self.exports.write_to(dir, stamp)
    }

    pub fn send(&self, notifier: &dyn Notifier) -> Result<(), ReportError> {
        let _span = info_span!("report").entered();
        notifier.notify(&self.subject(), &self.body(), &self.exports)
    }
}
