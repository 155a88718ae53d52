use janitor_core::config::JanitorConfig;
use janitor_lambda::adapters::lambda_api::AwsLambdaApi;
use janitor_lambda::adapters::pipeline::CodePipelineNotifier;
use janitor_lambda::handlers::cleanup::run_cleanup;
use janitor_lambda::handlers::notify::notify_pipeline;
use janitor_lambda::logging::log_info;
use lambda_runtime::{service_fn, Error, LambdaEvent};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::{json, Value};

fn extract_job_id(event: &Value) -> Result<String, Error> {
    event
        .get("CodePipeline.job")
        .and_then(|job| job.get("id"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| Error::from("event must carry a CodePipeline.job id"))
}

async fn handle_request(event: LambdaEvent<Value>) -> Result<Value, Error> {
    // Without a job id there is nothing to report the outcome against.
    let job_id = extract_job_id(&event.payload)?;
    let config = JanitorConfig::from_env_map(&std::env::vars().collect());

    log_info(
        "janitor",
        "run_started",
        json!({
            "job_id": job_id,
            "function_prefix": config.function_prefix,
            "layer_prefix": config.layer_prefix,
            "versions_to_keep": config.versions_to_keep,
            "retry_attempts": config.retry.max_attempts,
        }),
    );

    let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let lambda_api = AwsLambdaApi::new(aws_sdk_lambda::Client::new(&aws_config));
    let notifier = CodePipelineNotifier::new(aws_sdk_codepipeline::Client::new(&aws_config));
    let mut rng = StdRng::from_entropy();

    let report = run_cleanup(&config, &lambda_api, &lambda_api, &mut rng).await;
    notify_pipeline(&notifier, &job_id, &report)
        .await
        .map_err(|error| Error::from(error.to_string()))?;

    Ok(json!({
        "job_id": job_id,
        "status": if report.succeeded() { "succeeded" } else { "failed" },
    }))
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    lambda_runtime::run(service_fn(handle_request)).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_the_codepipeline_job_id() {
        let event = json!({
            "CodePipeline.job": { "id": "11111111-abcd-1111-abcd-111111abcdef" }
        });

        let job_id = extract_job_id(&event).expect("job id should parse");
        assert_eq!(job_id, "11111111-abcd-1111-abcd-111111abcdef");
    }

    #[test]
    fn rejects_events_without_a_job_id() {
        let error = extract_job_id(&json!({})).expect_err("missing job should fail");
        assert!(error.to_string().contains("CodePipeline.job"));

        let error = extract_job_id(&json!({ "CodePipeline.job": { "id": 42 } }))
            .expect_err("non-string id should fail");
        assert!(error.to_string().contains("CodePipeline.job"));
    }
}
