//! Port abstraction for score persistence adapters.
//!
//! Every read method excludes orphan scores (owner reference no longer
//! resolving to a user), whether or not a purge has run. Ordering
//! contracts: "top" means value descending with ties broken by insertion
//! order, earlier score first.

use async_trait::async_trait;

use crate::domain::score::{Score, ScoreValue};
use crate::domain::user::UserId;

/// Persistence errors raised by score repository adapters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScorePersistenceError {
    /// The owner vanished between lookup and commit.
    #[error("score owner no longer exists")]
    OwnerMissing,
    #[error("score repository query failed: {message}")]
    Query { message: String },
}

/// Durable, ordered collection of score records.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ScoreRepository: Send + Sync {
    /// Atomic insert-if-owner-exists. Assigns the id and timestamp; either
    /// the whole record becomes visible to subsequent reads or nothing
    /// does.
    async fn insert(
        &self,
        owner: UserId,
        value: ScoreValue,
    ) -> Result<Score, ScorePersistenceError>;

    /// Top `n` scores across all users.
    async fn top_n(&self, n: usize) -> Result<Vec<Score>, ScorePersistenceError>;

    /// Top `n` scores owned by `owner`.
    async fn top_n_by_owner(
        &self,
        owner: UserId,
        n: usize,
    ) -> Result<Vec<Score>, ScorePersistenceError>;

    /// All scores owned by `owner` in insertion order.
    async fn by_owner(&self, owner: UserId) -> Result<Vec<Score>, ScorePersistenceError>;

    /// `owner`'s most recent `n` scores, creation time descending.
    async fn recent_by_owner(
        &self,
        owner: UserId,
        n: usize,
    ) -> Result<Vec<Score>, ScorePersistenceError>;

    /// Number of live scores.
    async fn count(&self) -> Result<u64, ScorePersistenceError>;

    /// Number of live scores owned by `owner`.
    async fn count_by_owner(&self, owner: UserId) -> Result<u64, ScorePersistenceError>;

    /// Number of live scores with a value strictly greater than `value`.
    async fn count_greater_than(&self, value: i64) -> Result<u64, ScorePersistenceError>;

    /// All live score values, unordered.
    async fn values(&self) -> Result<Vec<i64>, ScorePersistenceError>;

    /// Per-owner maximum values for every user owning at least one score.
    async fn best_per_owner(&self) -> Result<Vec<(UserId, i64)>, ScorePersistenceError>;

    /// Delete orphan scores; idempotent. Returns the removed count.
    async fn purge_orphans(&self) -> Result<u64, ScorePersistenceError>;
}
