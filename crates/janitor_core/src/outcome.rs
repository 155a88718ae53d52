use serde::Serialize;

/// Why a version survived the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SkipReason {
    Protected,
    WithinRetentionWindow,
}

/// What happened to one version during the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum VersionDisposition {
    Deleted,
    Skipped(SkipReason),
    Failed(String),
}

/// In-memory aggregate for one run. The pipeline contract is binary, so the
/// only externally visible bit is `succeeded()`; the rest feeds the final
/// structured log line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub functions_processed: usize,
    pub layers_processed: usize,
    pub versions_deleted: usize,
    pub versions_skipped_protected: usize,
    pub versions_skipped_recent: usize,
    pub delete_failures: usize,
    pub unit_errors: Vec<String>,
}

impl RunReport {
    pub fn record_version(&mut self, disposition: &VersionDisposition) {
        match disposition {
            VersionDisposition::Deleted => self.versions_deleted += 1,
            VersionDisposition::Skipped(SkipReason::Protected) => {
                self.versions_skipped_protected += 1
            }
            VersionDisposition::Skipped(SkipReason::WithinRetentionWindow) => {
                self.versions_skipped_recent += 1
            }
            VersionDisposition::Failed(_) => self.delete_failures += 1,
        }
    }

    /// Records a failure that escaped one unit of work (one function or one
    /// layer). Sibling units keep processing; the run as a whole will report
    /// failure.
    pub fn record_unit_error(&mut self, unit: &str, message: &str) {
        self.unit_errors.push(format!("{unit}: {message}"));
    }

    /// Folds the report of a sibling cleanup task into this one.
    pub fn absorb(&mut self, other: RunReport) {
        self.functions_processed += other.functions_processed;
        self.layers_processed += other.layers_processed;
        self.versions_deleted += other.versions_deleted;
        self.versions_skipped_protected += other.versions_skipped_protected;
        self.versions_skipped_recent += other.versions_skipped_recent;
        self.delete_failures += other.delete_failures;
        self.unit_errors.extend(other.unit_errors);
    }

    pub fn succeeded(&self) -> bool {
        self.unit_errors.is_empty() && self.delete_failures == 0
    }

    pub fn error_summary(&self) -> String {
        let mut parts = Vec::new();
        if self.delete_failures > 0 {
            parts.push(format!("{} version delete(s) failed", self.delete_failures));
        }
        parts.extend(self.unit_errors.iter().cloned());
        parts.join("; ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_report_counts_as_success() {
        assert!(RunReport::default().succeeded());
    }

    #[test]
    fn dispositions_land_in_their_buckets() {
        let mut report = RunReport::default();
        report.record_version(&VersionDisposition::Deleted);
        report.record_version(&VersionDisposition::Skipped(SkipReason::Protected));
        report.record_version(&VersionDisposition::Skipped(
            SkipReason::WithinRetentionWindow,
        ));
        report.record_version(&VersionDisposition::Failed("throttled".to_string()));

        assert_eq!(report.versions_deleted, 1);
        assert_eq!(report.versions_skipped_protected, 1);
        assert_eq!(report.versions_skipped_recent, 1);
        assert_eq!(report.delete_failures, 1);
        assert!(!report.succeeded());
    }

    #[test]
    fn unit_errors_flip_the_run_to_failed() {
        let mut report = RunReport::default();
        report.record_unit_error("arn:aws:lambda:eu-west-1:1:function:a", "access denied");
        assert!(!report.succeeded());
        assert!(report.error_summary().contains("access denied"));
    }

    #[test]
    fn report_serializes_for_the_run_log() {
        let mut report = RunReport::default();
        report.record_version(&VersionDisposition::Deleted);
        report.record_unit_error("shared-deps", "timeout");

        let value = serde_json::to_value(&report).expect("report should serialize");
        assert_eq!(value["versions_deleted"], 1);
        assert_eq!(value["unit_errors"][0], "shared-deps: timeout");
    }

    #[test]
    fn absorb_merges_both_task_halves() {
        let mut functions = RunReport {
            functions_processed: 2,
            versions_deleted: 5,
            ..RunReport::default()
        };
        let layers = RunReport {
            layers_processed: 1,
            versions_deleted: 2,
            unit_errors: vec!["layer-a: timeout".to_string()],
            ..RunReport::default()
        };

        functions.absorb(layers);
        assert_eq!(functions.functions_processed, 2);
        assert_eq!(functions.layers_processed, 1);
        assert_eq!(functions.versions_deleted, 7);
        assert!(!functions.succeeded());
    }
}
