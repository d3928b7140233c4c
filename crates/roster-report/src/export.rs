//! CSV exports of a run.
//!
//! Every run produces the audit records, the missing classes and one table
//! per loaded source entity. The same bytes are written to the output
//! directory and attached to the notification e-mail.

use std::fs;
use std::path::{Path, PathBuf};

use roster_ingest::{FlatTable, SourceEntity};
use roster_model::{AuditLog, MissingClass, OperationRecord};
use serde::Serialize;
use tracing::{debug, info};

use crate::error::ReportError;

const RECORD_HEADER: [&str; 6] = ["description", "action", "error", "change", "response", "body"];
const MISSING_CLASS_HEADER: [&str; 3] = ["description", "error", "body"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportKind {
    Executions,
    MissingClasses,
    Source(SourceEntity),
}

impl ExportKind {
    /// File name in the output directory; run exports carry `stamp`.
    pub fn file_name(self, stamp: &str) -> String {
        match self {
            Self::Executions => format!("executions_{stamp}.csv"),
            Self::MissingClasses => format!("missing_classes_{stamp}.csv"),
            Self::Source(entity) => format!("source_{}.csv", entity.name()),
        }
    }

    /// File name of the e-mail attachment.
    pub fn attachment_name(self) -> String {
        match self {
            Self::Executions => "sync_output.csv".to_string(),
            Self::MissingClasses => "missing_classes.csv".to_string(),
            Self::Source(entity) => format!("source_{}.csv", entity.name()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportFile {
    pub kind: ExportKind,
    pub content: Vec<u8>,
}

/// Rendered CSV exports of one run.
#[derive(Debug, Clone, Default)]
pub struct ExportSet {
    pub files: Vec<ExportFile>,
}

impl ExportSet {
    pub fn build(log: &AuditLog, tables: &[(SourceEntity, FlatTable)]) -> Result<Self, ReportError> {
        let mut files = vec![
            ExportFile {
                kind: ExportKind::Executions,
                content: executions_csv(log)?,
            },
            ExportFile {
                kind: ExportKind::MissingClasses,
                content: missing_classes_csv(&log.missing_classes)?,
            },
        ];
        for (entity, table) in tables {
            files.push(ExportFile {
                kind: ExportKind::Source(*entity),
                content: table.to_csv_bytes()?,
            });
        }
        Ok(Self { files })
    }

    pub fn get(&self, kind: ExportKind) -> Option<&ExportFile> {
        self.files.iter().find(|file| file.kind == kind)
    }

    /// Write every export into `dir`, creating it when needed.
    pub fn write_to(&self, dir: &Path, stamp: &str) -> Result<Vec<PathBuf>, ReportError> {
        fs::create_dir_all(dir).map_err(|source| ReportError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        let mut written = Vec::with_capacity(self.files.len());
        for file in &self.files {
            let path = dir.join(file.kind.file_name(stamp));
            fs::write(&path, &file.content).map_err(|source| ReportError::Io {
                path: path.clone(),
                source,
            })?;
            debug!(path = %path.display(), bytes = file.content.len(), "export written");
            written.push(path);
        }
        info!(files = written.len(), dir = %dir.display(), "exports written");
        Ok(written)
    }
}

/// Audit records as CSV, changes first, otherwise in run order.
pub fn executions_csv(log: &AuditLog) -> Result<Vec<u8>, ReportError> {
    let mut records: Vec<&OperationRecord> = log.records.iter().collect();
    records.sort_by_key(|record| !record.change);
    render(&RECORD_HEADER, records)
}

pub fn missing_classes_csv(missing: &[MissingClass]) -> Result<Vec<u8>, ReportError> {
    render(&MISSING_CLASS_HEADER, missing)
}

fn render<T: Serialize>(
    header: &[&str],
    rows: impl IntoIterator<Item = T>,
) -> Result<Vec<u8>, ReportError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    writer.write_record(header)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer
        .into_inner()
        .map_err(|err| ReportError::Csv(csv::Error::from(err.into_error())))
}
