use std::path::PathBuf;

use chrono::NaiveDate;
use roster_report::RunSummary;

#[derive(Debug)]
pub struct SyncResult {
    pub run_date: NaiveDate,
    pub dry_run: bool,
    pub summary: RunSummary,
    pub missing_classes: usize,
    pub exports: Vec<PathBuf>,
    /// Fatal error that ended the run early.
    pub fatal: Option<String>,
    /// Reporting problems; the run itself may have succeeded.
    pub report_errors: Vec<String>,
    /// Body text, kept when no notification was sent.
    pub body: Option<String>,
}

impl SyncResult {
    pub fn has_errors(&self) -> bool {
        self.fatal.is_some() || self.summary.errors > 0 || !self.report_errors.is_empty()
    }
}
