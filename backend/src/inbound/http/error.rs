//! Domain-to-HTTP error mapping.
//!
//! Every handler failure funnels through [`ApiError`], which fixes the
//! status code per error category and renders the
//! `{"success": false, ...}` envelope. Internal errors are logged with
//! their real message and redacted on the wire.

use actix_web::error::JsonPayloadError;
use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, ResponseError};
use serde_json::json;
use tracing::{debug, error};

use crate::domain::ports::UserPersistenceError;
use crate::domain::{DomainError, ErrorCode};

/// Handler result alias.
pub type ApiResult<T> = Result<T, ApiError>;

/// A [`DomainError`] carried across the handler boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError(DomainError);

impl ApiError {
    /// The wrapped domain error.
    pub fn domain(&self) -> &DomainError {
        &self.0
    }
}

impl From<DomainError> for ApiError {
    fn from(error: DomainError) -> Self {
        Self(error)
    }
}

impl From<UserPersistenceError> for ApiError {
    fn from(error: UserPersistenceError) -> Self {
        Self(DomainError::internal(format!(
            "user repository error: {error}"
        )))
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self.0.code() {
            ErrorCode::BadRequest => StatusCode::BAD_REQUEST,
            ErrorCode::ValidationFailed => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let mut builder = HttpResponse::build(self.status_code());
        match self.0.code() {
            ErrorCode::Internal => {
                error!(message = self.0.message(), "internal error");
                builder.json(json!({
                    "success": false,
                    "error": "Internal server error",
                }))
            }
            ErrorCode::ValidationFailed => builder.json(json!({
                "success": false,
                "errors": self.0.violations(),
            })),
            _ => builder.json(json!({
                "success": false,
                "error": self.0.message(),
            })),
        }
    }
}

/// JSON extractor failures become a flat 400, never a deserializer trace.
pub fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    debug!(%err, "rejected malformed request body");
    ApiError::from(DomainError::bad_request("Bad request")).into()
}
