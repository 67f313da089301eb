//! Score model and value coercion.
//!
//! A persisted score value is always an integer strictly greater than zero.
//! Submissions arrive as untyped text (the original wire format carries the
//! value as a path segment), so [`ScoreValue::parse`] accepts integer
//! strings, truncates decimal input toward zero, and rejects everything
//! else before persistence.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::user::UserId;

/// Validation errors for submitted score values.
///
/// Display strings are the exact per-constraint messages surfaced in 422
/// responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ScoreValidationError {
    #[error("score can't be blank")]
    Missing,
    #[error("score is not a number")]
    NotANumber,
    #[error("score must be greater than 0")]
    NotPositive,
}

/// Store-assigned score identifier.
///
/// Ids are a monotonic sequence, so they double as insertion order for the
/// stable tie-break in ranking queries.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ScoreId(u64);

impl ScoreId {
    /// Wrap a raw sequence number.
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    /// The underlying sequence number.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ScoreId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A validated, strictly positive score value.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ScoreValue(i64);

impl ScoreValue {
    /// Coerce raw submission text into a score value.
    ///
    /// Integer strings parse directly; decimal input truncates toward zero
    /// before the positivity check, so `"100.7"` becomes 100 and `"0.9"`
    /// fails as non-positive.
    ///
    /// # Examples
    /// ```
    /// use podium::domain::ScoreValue;
    ///
    /// assert_eq!(ScoreValue::parse("100").unwrap().get(), 100);
    /// assert_eq!(ScoreValue::parse("100.7").unwrap().get(), 100);
    /// assert!(ScoreValue::parse("abc").is_err());
    /// ```
    pub fn parse(raw: &str) -> Result<Self, ScoreValidationError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ScoreValidationError::Missing);
        }
        if let Ok(value) = trimmed.parse::<i64>() {
            return Self::try_from(value);
        }
        let float: f64 = trimmed
            .parse()
            .map_err(|_| ScoreValidationError::NotANumber)?;
        if !float.is_finite() {
            return Err(ScoreValidationError::NotANumber);
        }
        Self::try_from(float.trunc() as i64)
    }

    /// The underlying integer value.
    pub fn get(self) -> i64 {
        self.0
    }
}

impl TryFrom<i64> for ScoreValue {
    type Error = ScoreValidationError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        if value > 0 {
            Ok(Self(value))
        } else {
            Err(ScoreValidationError::NotPositive)
        }
    }
}

impl fmt::Display for ScoreValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A persisted score. Immutable once created; the owner is never
/// reassigned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Score {
    id: ScoreId,
    value: ScoreValue,
    owner: UserId,
    created_at: DateTime<Utc>,
}

impl Score {
    /// Assemble a score record. Called by the store at commit time.
    pub fn new(id: ScoreId, value: ScoreValue, owner: UserId, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            value,
            owner,
            created_at,
        }
    }

    /// Store-assigned identifier.
    pub fn id(&self) -> ScoreId {
        self.id
    }

    /// The submitted value.
    pub fn value(&self) -> ScoreValue {
        self.value
    }

    /// Owning user.
    pub fn owner(&self) -> UserId {
        self.owner
    }

    /// Submission timestamp.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
