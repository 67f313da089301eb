//! Ranking and aggregation engine.
//!
//! Stateless computation over a snapshot of the score store, reached only
//! through the repository ports. Ranks are dense: tied values share the
//! rank given by the strictly-greater count plus one, and the tie itself
//! introduces no gap.
//!
//! Numeric contract: only the percentile is rounded (two decimals); the
//! average and median are returned unrounded, and the median of an even
//! count is the mean of the two central elements, so halves survive.

use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::error::DomainError;
use crate::domain::ports::{
    ScorePersistenceError, ScoreRepository, UserPersistenceError, UserRepository,
};
use crate::domain::score::Score;
use crate::domain::user::{User, UserId};

/// Derived per-user aggregates used by the user serializer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UserStats {
    pub score_count: u64,
    pub best_score: i64,
    pub average_score: f64,
}

fn map_score_error(error: ScorePersistenceError) -> DomainError {
    DomainError::internal(format!("score repository error: {error}"))
}

fn map_user_error(error: UserPersistenceError) -> DomainError {
    DomainError::internal(format!("user repository error: {error}"))
}

/// Mean of a value set; 0 when empty.
fn mean_of(values: &[i64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let sum: i64 = values.iter().sum();
    sum as f64 / values.len() as f64
}

/// Median of a value set; the exact middle element for odd counts, the
/// mean of the two central elements for even counts, 0 when empty.
fn median_of(mut values: Vec<i64>) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.sort_unstable();
    let mid = values.len() / 2;
    if values.len() % 2 == 1 {
        values[mid] as f64
    } else {
        (values[mid - 1] + values[mid]) as f64 / 2.0
    }
}

/// Round to exactly two decimal places.
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Ranking queries over the score store.
pub struct RankingEngine {
    scores: Arc<dyn ScoreRepository>,
    users: Arc<dyn UserRepository>,
}

impl RankingEngine {
    /// Build an engine over the repository ports.
    pub fn new(scores: Arc<dyn ScoreRepository>, users: Arc<dyn UserRepository>) -> Self {
        Self { scores, users }
    }

    /// Top `n` scores across all users, value descending, stable ties.
    /// Empty when the store is empty or `n` is zero.
    pub async fn global_high_scores(&self, n: usize) -> Result<Vec<Score>, DomainError> {
        if n == 0 {
            return Ok(Vec::new());
        }
        self.scores.top_n(n).await.map_err(map_score_error)
    }

    /// Top `n` scores owned by `user`; empty when the user owns none.
    pub async fn user_high_scores(
        &self,
        user: UserId,
        n: usize,
    ) -> Result<Vec<Score>, DomainError> {
        if n == 0 {
            return Ok(Vec::new());
        }
        self.scores
            .top_n_by_owner(user, n)
            .await
            .map_err(map_score_error)
    }

    /// 1-based dense rank of a value among all scores.
    pub async fn rank(&self, value: i64) -> Result<u64, DomainError> {
        let better = self
            .scores
            .count_greater_than(value)
            .await
            .map_err(map_score_error)?;
        Ok(better + 1)
    }

    /// Percentile of a value among all scores, rounded to two decimals.
    ///
    /// An empty store yields 100; a unique maximum yields exactly 100.0.
    pub async fn percentile(&self, value: i64) -> Result<f64, DomainError> {
        let total = self.scores.count().await.map_err(map_score_error)?;
        if total == 0 {
            return Ok(100.0);
        }
        let better = self
            .scores
            .count_greater_than(value)
            .await
            .map_err(map_score_error)?;
        Ok(round2((total - better) as f64 / total as f64 * 100.0))
    }

    /// Arithmetic mean of all score values, unrounded; 0 when empty.
    pub async fn average(&self) -> Result<f64, DomainError> {
        let values = self.scores.values().await.map_err(map_score_error)?;
        Ok(mean_of(&values))
    }

    /// Median of all score values; 0 when empty.
    pub async fn median(&self) -> Result<f64, DomainError> {
        let values = self.scores.values().await.map_err(map_score_error)?;
        Ok(median_of(values))
    }

    /// Users ordered descending by their own maximum score, limited to
    /// `n`. Scoreless users are excluded, never zero-filled.
    pub async fn top_players(&self, n: usize) -> Result<Vec<(User, i64)>, DomainError> {
        if n == 0 {
            return Ok(Vec::new());
        }
        let bests: HashMap<UserId, i64> = self
            .scores
            .best_per_owner()
            .await
            .map_err(map_score_error)?
            .into_iter()
            .collect();
        let mut players: Vec<(User, i64)> = Vec::with_capacity(bests.len());
        for user in self.users.list().await.map_err(map_user_error)? {
            if let Some(best) = bests.get(&user.id()) {
                players.push((user, *best));
            }
        }
        // Registration order is the secondary key; sort_by is stable.
        players.sort_by(|a, b| b.1.cmp(&a.1));
        players.truncate(n);
        Ok(players)
    }

    /// `user`'s best value; 0 when the user owns no scores.
    pub async fn best_score(&self, user: UserId) -> Result<i64, DomainError> {
        let top = self
            .scores
            .top_n_by_owner(user, 1)
            .await
            .map_err(map_score_error)?;
        Ok(top.first().map_or(0, |s| s.value().get()))
    }

    /// Mean of `user`'s values; 0 when the user owns no scores.
    pub async fn average_for(&self, user: UserId) -> Result<f64, DomainError> {
        let owned = self.scores.by_owner(user).await.map_err(map_score_error)?;
        let values: Vec<i64> = owned.iter().map(|s| s.value().get()).collect();
        Ok(mean_of(&values))
    }

    /// Number of scores `user` owns.
    pub async fn score_count(&self, user: UserId) -> Result<u64, DomainError> {
        self.scores
            .count_by_owner(user)
            .await
            .map_err(map_score_error)
    }

    /// `user`'s most recent `n` scores, creation time descending.
    pub async fn recent_scores(
        &self,
        user: UserId,
        n: usize,
    ) -> Result<Vec<Score>, DomainError> {
        self.scores
            .recent_by_owner(user, n)
            .await
            .map_err(map_score_error)
    }

    /// Bundle of the derived fields the user serializer needs.
    pub async fn user_stats(&self, user: UserId) -> Result<UserStats, DomainError> {
        let owned = self.scores.by_owner(user).await.map_err(map_score_error)?;
        let values: Vec<i64> = owned.iter().map(|s| s.value().get()).collect();
        Ok(UserStats {
            score_count: values.len() as u64,
            best_score: values.iter().copied().max().unwrap_or(0),
            average_score: mean_of(&values),
        })
    }
}
