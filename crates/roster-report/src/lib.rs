//! Reporting for roster synchronisation runs.
//!
//! Turns a run's audit log into a [`RunSummary`] (subject line and body
//! text), renders the CSV exports, writes them to disk and optionally
//! e-mails everything through a [`Notifier`].

pub mod error;
pub mod export;
pub mod notify;
pub mod report;
pub mod summary;

pub use error::ReportError;
pub use export::{ExportFile, ExportKind, ExportSet, executions_csv, missing_classes_csv};
pub use notify::{DEFAULT_SMTP_HOST, DEFAULT_SMTP_PORT, Notifier, SmtpNotifier, SmtpSettings};
pub use report::RunReport;
pub use summary::RunSummary;
