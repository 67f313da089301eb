//! Domain-level error type.
//!
//! These errors are transport agnostic. The HTTP adapter maps them to
//! status codes and the `{success: false, ...}` envelope in
//! `inbound/http/error.rs`.

use serde::{Deserialize, Serialize};

/// Stable machine-readable error code describing the failure category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// The request payload is malformed.
    BadRequest,
    /// One or more field constraints were violated.
    ValidationFailed,
    /// Authentication failed or is missing.
    Unauthorized,
    /// The requested resource does not exist.
    NotFound,
    /// The client exceeded an admission quota or is blocklisted.
    RateLimited,
    /// An unexpected error occurred inside the domain.
    Internal,
}

/// Domain error payload.
///
/// Validation failures may carry several violations; `message` always holds
/// a human-readable summary and `violations` lists one message per violated
/// constraint.
///
/// # Examples
/// ```
/// use podium::domain::{DomainError, ErrorCode};
///
/// let err = DomainError::not_found("User not found");
/// assert_eq!(err.code(), ErrorCode::NotFound);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainError {
    code: ErrorCode,
    message: String,
    violations: Vec<String>,
}

impl DomainError {
    fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            violations: Vec::new(),
        }
    }

    /// Malformed request payload.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::BadRequest, message)
    }

    /// A single violated constraint.
    pub fn validation(message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            code: ErrorCode::ValidationFailed,
            violations: vec![message.clone()],
            message,
        }
    }

    /// Several violated constraints, one message each.
    pub fn validation_all(violations: Vec<String>) -> Self {
        Self {
            code: ErrorCode::ValidationFailed,
            message: "Validation failed".to_owned(),
            violations,
        }
    }

    /// Missing or incorrect credentials.
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unauthorized, message)
    }

    /// Unknown resource.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    /// Quota exceeded or blocklisted client.
    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::RateLimited, message)
    }

    /// Unexpected internal failure. The HTTP adapter redacts the message.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Internal, message)
    }

    /// Stable machine-readable error code.
    pub fn code(&self) -> ErrorCode {
        self.code
    }

    /// Human-readable summary.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// One message per violated constraint; empty for non-validation errors.
    pub fn violations(&self) -> &[String] {
        &self.violations
    }
}

impl std::fmt::Display for DomainError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for DomainError {}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(DomainError::not_found("missing"), ErrorCode::NotFound)]
    #[case(DomainError::unauthorized("nope"), ErrorCode::Unauthorized)]
    #[case(DomainError::rate_limited("slow down"), ErrorCode::RateLimited)]
    #[case(DomainError::bad_request("bad"), ErrorCode::BadRequest)]
    #[case(DomainError::internal("boom"), ErrorCode::Internal)]
    fn constructors_set_codes(#[case] err: DomainError, #[case] code: ErrorCode) {
        assert_eq!(err.code(), code);
        assert!(err.violations().is_empty());
    }

    #[test]
    fn single_validation_failure_is_also_a_violation() {
        let err = DomainError::validation("score must be greater than 0");
        assert_eq!(err.code(), ErrorCode::ValidationFailed);
        assert_eq!(err.violations(), ["score must be greater than 0"]);
        assert_eq!(err.to_string(), "score must be greater than 0");
    }

    #[test]
    fn multiple_violations_keep_their_order() {
        let err = DomainError::validation_all(vec![
            "name can't be blank".to_owned(),
            "device can't be blank".to_owned(),
        ]);
        assert_eq!(err.violations().len(), 2);
        assert_eq!(err.message(), "Validation failed");
    }
}
