//! Error translation.
//!
//! A pipeline run fails in one of two ways, and they are handled
//! differently:
//!
//! - A validation failure is turned into the host error by the configured
//!   message and error factory ([`Failure::Rejected`]).
//! - Anything else is forwarded untouched ([`Failure::Unexpected`]); the
//!   error factory is never called for it.

use crate::options::Options;
use crate::types::{Response, ResponseExt};
use http::StatusCode;
use reqparams_core::{FailureSet, PipelineError, UnexpectedError};
use reqparams_extract::{ExtractionContext, ExtractionError};
use serde::Serialize;
use thiserror::Error;

/// The default error for rejected parameters.
///
/// Serializes as `{"message": ..., "status": 400, "errors": {...}}`.
///
/// # Example
///
/// ```
/// use reqparams_core::{FailureSet, RuleFailure};
/// use reqparams_middleware::BadRequest;
///
/// let mut failures = FailureSet::new();
/// failures.add("name", RuleFailure::new("required", "name is required"));
///
/// let error = BadRequest::new("Bad Request", failures);
/// assert_eq!(error.status, 400);
/// assert_eq!(error.to_string(), "Bad Request");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("{message}")]
pub struct BadRequest {
    /// Human-readable message.
    pub message: String,
    /// HTTP status, always 400 unless changed by the caller.
    pub status: u16,
    /// Failing fields and their rule failures.
    pub errors: FailureSet,
}

impl BadRequest {
    /// Creates a 400 error carrying a failure set.
    #[must_use]
    pub fn new(message: impl Into<String>, errors: FailureSet) -> Self {
        Self {
            message: message.into(),
            status: StatusCode::BAD_REQUEST.as_u16(),
            errors,
        }
    }

    /// Returns the status as a [`StatusCode`], falling back to 400 if the
    /// stored value is not a valid status.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.status).unwrap_or(StatusCode::BAD_REQUEST)
    }
}

/// The failure side of handling a request's parameters.
#[derive(Debug, Error)]
pub enum Failure<E> {
    /// Validation failed; carries the error built by the error factory.
    #[error("{0}")]
    Rejected(E),

    /// Something other than user input went wrong.
    #[error(transparent)]
    Unexpected(#[from] UnexpectedError),
}

impl<E> Failure<E> {
    /// Returns the rejection error, if this is one.
    #[must_use]
    pub fn rejected(&self) -> Option<&E> {
        match self {
            Self::Rejected(error) => Some(error),
            Self::Unexpected(_) => None,
        }
    }

    /// Returns the unexpected error, if this is one.
    #[must_use]
    pub fn unexpected(&self) -> Option<&UnexpectedError> {
        match self {
            Self::Rejected(_) => None,
            Self::Unexpected(error) => Some(error),
        }
    }

    /// Returns true for validation rejections.
    #[must_use]
    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected(_))
    }
}

/// Translates a pipeline error.
///
/// Validation failures go through the message and error factory of
/// `options`; unexpected errors pass through unchanged.
pub fn translate<E>(error: PipelineError, request: &ExtractionContext, options: &Options<E>) -> Failure<E> {
    match error {
        PipelineError::Validation(failures) => {
            let message = options.error_message().render(request);
            Failure::Rejected(options.make_error(message, failures))
        }
        PipelineError::Unexpected(error) => Failure::Unexpected(error),
    }
}

/// Errors that know how to render themselves as an HTTP response.
pub trait IntoErrorResponse {
    /// Builds the response sent when this error short-circuits the chain.
    fn to_error_response(&self) -> Response;
}

impl IntoErrorResponse for BadRequest {
    fn to_error_response(&self) -> Response {
        Response::json(self.status_code(), self)
    }
}

impl<E: IntoErrorResponse> IntoErrorResponse for Failure<E> {
    fn to_error_response(&self) -> Response {
        match self {
            Self::Rejected(error) => error.to_error_response(),
            Self::Unexpected(error) => unexpected_response(error),
        }
    }
}

/// Unparseable input keeps its own status; everything else is a 500 that
/// does not leak details.
fn unexpected_response(error: &UnexpectedError) -> Response {
    match error.downcast_ref::<ExtractionError>() {
        Some(extraction) => Response::json_error(
            extraction.status_code(),
            extraction.error_code(),
            &extraction.to_string(),
        ),
        None => Response::json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "INTERNAL_ERROR",
            "internal server error",
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::OptionOverrides;
    use http_body_util::BodyExt;
    use reqparams_core::RuleFailure;
    use reqparams_extract::ExtractionContextBuilder;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn name_failures() -> FailureSet {
        let mut failures = FailureSet::new();
        failures.add("name", RuleFailure::new("required", "name is required"));
        failures
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_validation_goes_through_factory() {
        let options: Options = Options::resolve(
            &OptionOverrides::new(),
            &OptionOverrides::new().error_message("Invalid book"),
        )
        .unwrap();
        let request = ExtractionContextBuilder::new().build();

        let failure = translate(PipelineError::Validation(name_failures()), &request, &options);
        let error = failure.rejected().unwrap();
        assert_eq!(error.message, "Invalid book");
        assert_eq!(error.status, 400);
        assert!(error.errors.contains("name"));
    }

    #[test]
    fn test_unexpected_skips_factory() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let options: Options = Options::resolve(
            &OptionOverrides::new().error_factory(move |message, failures| {
                counter.fetch_add(1, Ordering::SeqCst);
                BadRequest::new(message, failures)
            }),
            &OptionOverrides::new(),
        )
        .unwrap();
        let request = ExtractionContextBuilder::new().build();

        let error = PipelineError::Unexpected(UnexpectedError::UnknownRule {
            field: "name".into(),
            rule: "shiny".into(),
        });
        let failure = translate(error, &request, &options);

        assert!(matches!(
            failure.unexpected(),
            Some(UnexpectedError::UnknownRule { rule, .. }) if rule == "shiny"
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_bad_request_response() {
        let failure: Failure<BadRequest> = Failure::Rejected(BadRequest::new("Bad Request", name_failures()));
        let response = failure.to_error_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_json(response).await;
        assert_eq!(body["message"], "Bad Request");
        assert_eq!(body["status"], 400);
        assert_eq!(body["errors"]["name"][0]["rule"], "required");
    }

    #[tokio::test]
    async fn test_unexpected_response_hides_details() {
        let failure: Failure<BadRequest> = Failure::Unexpected(UnexpectedError::UnknownRule {
            field: "name".into(),
            rule: "shiny".into(),
        });
        let response = failure.to_error_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(response).await;
        assert_eq!(body, json!({ "error": { "code": "INTERNAL_ERROR", "message": "internal server error" } }));
    }

    #[tokio::test]
    async fn test_extraction_errors_keep_their_status() {
        let failure: Failure<BadRequest> =
            Failure::Unexpected(UnexpectedError::other(ExtractionError::NotAnObject { found: "array" }));
        let response = failure.to_error_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"]["code"], "INVALID_BODY");
    }
}
