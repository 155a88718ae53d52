//! Trait seams over the remote AWS collaborators, plus their production
//! implementations. Handlers and resolvers only ever see these traits.

pub mod lambda_api;
pub mod pipeline;

use aws_sdk_lambda::error::{ProvideErrorMetadata, SdkError};
use janitor_core::retry::RemoteError;

/// Error codes the backing APIs emit for transient conditions. Everything
/// else from a service response (not-found, access-denied, validation) is
/// terminal.
const RETRYABLE_ERROR_CODES: &[&str] = &[
    "TooManyRequestsException",
    "ThrottlingException",
    "Throttling",
    "ThrottledException",
    "RequestThrottled",
    "RequestTimeout",
    "RequestTimeoutException",
    "ServiceException",
    "ServiceUnavailableException",
];

fn is_retryable_code(code: &str) -> bool {
    RETRYABLE_ERROR_CODES.contains(&code)
}

/// Maps an SDK failure to a classified [`RemoteError`]. Transport-level
/// failures (timeouts, connection drops, unparsable responses) are retryable;
/// service responses are classified by their error code.
pub(crate) fn classify_sdk_error<E, R>(label: &str, error: SdkError<E, R>) -> RemoteError
where
    E: ProvideErrorMetadata,
{
    match &error {
        SdkError::ServiceError(context) => {
            let service_error = context.err();
            let code = service_error.code().unwrap_or("Unknown");
            let message = format!(
                "{label} failed: {} ({code})",
                service_error.message().unwrap_or("service error")
            );
            if is_retryable_code(code) {
                RemoteError::retryable(message)
            } else {
                RemoteError::terminal(message)
            }
        }
        SdkError::TimeoutError(_) => RemoteError::retryable(format!("{label} timed out")),
        SdkError::DispatchFailure(_) => {
            RemoteError::retryable(format!("{label} failed to reach the service"))
        }
        SdkError::ResponseError(_) => {
            RemoteError::retryable(format!("{label} received a malformed response"))
        }
        _ => RemoteError::terminal(format!("{label} failed before dispatch")),
    }
}
