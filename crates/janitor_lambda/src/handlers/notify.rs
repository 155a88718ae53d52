use janitor_core::outcome::RunReport;
use janitor_core::retry::RemoteError;
use serde_json::json;

use crate::adapters::pipeline::PipelineNotifier;
use crate::logging::log_info;

/// Fixed pipeline-facing summary; per-unit detail goes after it.
pub const PIPELINE_FAILURE_SUMMARY: &str = "Failed to clean old versions of lambda";

/// Reports the run outcome to the triggering pipeline. The contract is
/// binary: success only when no error escaped any unit of work.
pub async fn notify_pipeline(
    notifier: &impl PipelineNotifier,
    job_id: &str,
    report: &RunReport,
) -> Result<(), RemoteError> {
    if report.succeeded() {
        log_info("notifier", "reporting_success", json!({ "job_id": job_id }));
        notifier.report_success(job_id).await
    } else {
        let message = failure_message(report);
        log_info(
            "notifier",
            "reporting_failure",
            json!({ "job_id": job_id, "message": message }),
        );
        notifier.report_failure(job_id, &message).await
    }
}

fn failure_message(report: &RunReport) -> String {
    let summary = report.error_summary();
    if summary.is_empty() {
        PIPELINE_FAILURE_SUMMARY.to_string()
    } else {
        format!("{PIPELINE_FAILURE_SUMMARY}: {summary}")
    }
}
