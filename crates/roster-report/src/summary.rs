//! Run summary: counts, e-mail subject and body text.

use std::collections::BTreeMap;

use roster_model::{AuditLog, OperationRecord};

/// Counts of one run's audit records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub errors: usize,
    pub changes: usize,
    /// Error records per action, most frequent first.
    pub error_actions: Vec<(String, usize)>,
    /// Change records per action, most frequent first.
    pub change_actions: Vec<(String, usize)>,
}

impl RunSummary {
    pub fn from_log(log: &AuditLog) -> Self {
        Self {
            errors: log.error_count(),
            changes: log.change_count(),
            error_actions: action_counts(&log.records, |record| record.error),
            change_actions: action_counts(&log.records, |record| record.change),
        }
    }

    pub fn is_clean(&self) -> bool {
        self.errors == 0 && self.changes == 0
    }

    /// `Sync Output (<n> errors <m> changes)`, each part only when non-zero.
    pub fn subject(&self) -> String {
        let mut parts = Vec::new();
        if self.errors > 0 {
            parts.push(format!("{} errors", self.errors));
        }
        if self.changes > 0 {
            parts.push(format!("{} changes", self.changes));
        }
        if parts.is_empty() {
            "Sync Output".to_string()
        } else {
            format!("Sync Output ({})", parts.join(" "))
        }
    }

    pub fn body(&self) -> String {
        let mut body = String::new();
        if self.is_clean() {
            body.push_str("Executed successfully. No changes needed, nor any errors encountered.");
        }
        if self.errors > 0 {
            body.push_str("Executed, but some errors happened:\n");
            body.push_str(&render_counts(&self.error_actions));
            body.push_str("\n\n");
        }
        if self.changes > 0 {
            body.push_str("Summary of changes made:\n");
            body.push_str(&render_counts(&self.change_actions));
        }
        body
    }
}

/// Per-action counts of the records matching `keep`, descending by count
/// and then by action name.
fn action_counts(
    records: &[OperationRecord],
    keep: impl Fn(&OperationRecord) -> bool,
) -> Vec<(String, usize)> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for record in records.iter().filter(|record| keep(record)) {
        *counts.entry(record.action.as_str()).or_default() += 1;
    }
    let mut counts: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(action, count)| (action.to_string(), count))
        .collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    counts
}

fn render_counts(counts: &[(String, usize)]) -> String {
    let width = counts.iter().map(|(action, _)| action.len()).max().unwrap_or(0);
    counts
        .iter()
        .map(|(action, count)| format!("{action:<width$}  {count}"))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use roster_model::actions;

    use super::*;

    #[test]
    fn clean_run_has_bare_subject() {
        let summary = RunSummary::from_log(&AuditLog::new());
        assert_eq!(summary.subject(), "Sync Output");
        assert_eq!(
            summary.body(),
            "Executed successfully. No changes needed, nor any errors encountered."
        );
    }

    #[test]
    fn notes_count_as_neither() {
        let mut log = AuditLog::new();
        log.push(OperationRecord::note(actions::MISSING_EMAIL, "", "1001 has no parent email"));
        let summary = RunSummary::from_log(&log);
        assert!(summary.is_clean());
        assert_eq!(summary.subject(), "Sync Output");
    }
}
