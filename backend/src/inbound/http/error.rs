//! HTTP mapping for domain errors.
//!
//! Converts the domain error currency into HTTP responses: stable status
//! codes per error code, JSON bodies, and redaction of fatal errors so
//! backend detail never reaches a client.

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};

use crate::domain::ports::{SnippetStoreError, UserStoreError};
use crate::domain::{Error, ErrorCode, Validator};

/// Build the 422 payload for a failed form submission.
///
/// The validator's accumulated messages travel in `details` as
/// `{ "fieldErrors": {...}, "nonFieldErrors": [...] }`.
pub(crate) fn unprocessable_form(validator: &Validator) -> Error {
    match serde_json::to_value(validator) {
        Ok(details) => {
            Error::unprocessable("the submission failed validation").with_details(details)
        }
        Err(err) => Error::internal(format!("failed to serialise validation errors: {err}")),
    }
}

impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        match self.code {
            ErrorCode::InvalidRequest => StatusCode::BAD_REQUEST,
            ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::UnprocessableEntity => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorCode::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if self.is_fatal() {
            tracing::error!(
                code = ?self.code,
                message = %self.message,
                trace_id = self.trace_id.as_deref().unwrap_or("-"),
                "request failed"
            );
            let redacted = Error {
                code: self.code,
                message: redacted_message(self.code).to_owned(),
                trace_id: self.trace_id.clone(),
                details: None,
            };
            return HttpResponse::build(self.status_code()).json(redacted);
        }
        HttpResponse::build(self.status_code()).json(self)
    }
}

fn redacted_message(code: ErrorCode) -> &'static str {
    match code {
        ErrorCode::ServiceUnavailable => "Service temporarily unavailable",
        _ => "Internal server error",
    }
}

impl From<UserStoreError> for Error {
    fn from(err: UserStoreError) -> Self {
        match err {
            UserStoreError::DuplicateEmail | UserStoreError::InvalidCredentials => {
                Error::unprocessable(err.to_string())
            }
            UserStoreError::NoRecord => Error::not_found("user not found"),
            UserStoreError::Connection { .. } => Error::service_unavailable(err.to_string()),
            UserStoreError::Query { .. } | UserStoreError::Hashing { .. } => {
                Error::internal(err.to_string())
            }
        }
    }
}

impl From<SnippetStoreError> for Error {
    fn from(err: SnippetStoreError) -> Self {
        match err {
            SnippetStoreError::NoRecord => Error::not_found("snippet not found"),
            SnippetStoreError::Connection { .. } => Error::service_unavailable(err.to_string()),
            SnippetStoreError::Query { .. } => Error::internal(err.to_string()),
        }
    }
}
