//! Maps SDK failures onto [`CallError`] so the retry policy can tell them apart.

use aws_sdk_cloudformation::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use cdkreport_core::ports::CallError;
use std::error::Error;
use std::fmt::Debug;

/// Service error codes that indicate throttling or a temporary outage.
const TRANSIENT_CODES: &[&str] = &[
    "Throttling",
    "ThrottlingException",
    "RequestLimitExceeded",
    "RequestThrottled",
    "TooManyRequestsException",
    "ServiceUnavailable",
    "InternalFailure",
    "InternalError",
    "RequestTimeout",
    "RequestTimeoutException",
    "IDPCommunicationError",
];

pub(crate) fn classify<E, R>(err: &SdkError<E, R>) -> CallError
where
    E: ProvideErrorMetadata + Error + 'static,
    R: Debug,
{
    match err {
        SdkError::TimeoutError(_) | SdkError::DispatchFailure(_) => {
            CallError::Transient(DisplayErrorContext(err).to_string())
        }
        SdkError::ServiceError(context) => {
            classify_service(context.err().code(), context.err().message())
        }
        // A reply arrived but could not be read. Asking again gets the same reply.
        SdkError::ResponseError(_) => CallError::Rejected(DisplayErrorContext(err).to_string()),
        _ => CallError::Rejected(DisplayErrorContext(err).to_string()),
    }
}

pub(crate) fn classify_service(code: Option<&str>, message: Option<&str>) -> CallError {
    let code = code.unwrap_or("UnknownError");
    let text = match message {
        Some(message) => format!("{code}: {message}"),
        None => code.to_string(),
    };
    if TRANSIENT_CODES.contains(&code) {
        CallError::Transient(text)
    } else {
        CallError::Rejected(text)
    }
}

/// CloudFormation reports a missing stack as a generic validation error.
pub(crate) fn is_missing_resource(code: Option<&str>, message: Option<&str>) -> bool {
    code == Some("ValidationError") && message.is_some_and(|m| m.contains("does not exist"))
}
