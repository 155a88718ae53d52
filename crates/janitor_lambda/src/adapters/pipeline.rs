use aws_sdk_codepipeline::types::{FailureDetails, FailureType};
use janitor_core::retry::RemoteError;

use super::classify_sdk_error;

/// Completion callback to the pipeline that triggered the run. Exactly one
/// of the two methods is called exactly once per run.
#[allow(async_fn_in_trait)]
pub trait PipelineNotifier {
    async fn report_success(&self, job_id: &str) -> Result<(), RemoteError>;

    async fn report_failure(&self, job_id: &str, message: &str) -> Result<(), RemoteError>;
}

pub struct CodePipelineNotifier {
    client: aws_sdk_codepipeline::Client,
}

impl CodePipelineNotifier {
    pub fn new(client: aws_sdk_codepipeline::Client) -> Self {
        Self { client }
    }
}

impl PipelineNotifier for CodePipelineNotifier {
    async fn report_success(&self, job_id: &str) -> Result<(), RemoteError> {
        self.client
            .put_job_success_result()
            .job_id(job_id)
            .send()
            .await
            .map(|_| ())
            .map_err(|error| classify_sdk_error("putJobSuccessResult", error))
    }

    async fn report_failure(&self, job_id: &str, message: &str) -> Result<(), RemoteError> {
        let details = FailureDetails::builder()
            .r#type(FailureType::JobFailed)
            .message(message)
            .build()
            .map_err(|error| {
                RemoteError::terminal(format!("failed to build failure details: {error}"))
            })?;

        self.client
            .put_job_failure_result()
            .job_id(job_id)
            .failure_details(details)
            .send()
            .await
            .map(|_| ())
            .map_err(|error| classify_sdk_error("putJobFailureResult", error))
    }
}
