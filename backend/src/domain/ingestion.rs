//! Score ingestion coordinator and user registration.
//!
//! Submissions for different owners proceed independently; submissions for
//! the same owner are serialized through a per-owner async mutex so that
//! `k` concurrent successful submissions grow that owner's score count by
//! exactly `k`. Lock entries live only while a submission is in flight.
//! The coordinator performs no blocking I/O of its own.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, warn};

use crate::domain::error::DomainError;
use crate::domain::ports::{
    ScorePersistenceError, ScoreRepository, UserPersistenceError, UserRepository,
};
use crate::domain::score::{Score, ScoreValue};
use crate::domain::user::{NewUser, User, UserId};

fn map_conflict(error: UserPersistenceError) -> DomainError {
    match error {
        UserPersistenceError::Conflict { fields } => DomainError::validation_all(
            fields
                .into_iter()
                .map(|f| f.taken_message().to_owned())
                .collect(),
        ),
        UserPersistenceError::Query { message } => {
            DomainError::internal(format!("user repository error: {message}"))
        }
    }
}

/// Serializes same-owner score submissions and owns the registration path.
pub struct IngestionCoordinator {
    users: Arc<dyn UserRepository>,
    scores: Arc<dyn ScoreRepository>,
    locks: Mutex<HashMap<UserId, Arc<tokio::sync::Mutex<()>>>>,
}

impl IngestionCoordinator {
    /// Build a coordinator over the repository ports.
    pub fn new(users: Arc<dyn UserRepository>, scores: Arc<dyn ScoreRepository>) -> Self {
        Self {
            users,
            scores,
            locks: Mutex::new(HashMap::new()),
        }
    }

    fn owner_lock(&self, owner: UserId) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        locks.entry(owner).or_default().clone()
    }

    /// Drop the owner's map entry once no submission holds it, keeping the
    /// map bounded by in-flight owners rather than the historical user
    /// population.
    fn prune_owner_lock(&self, owner: UserId) {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        if locks
            .get(&owner)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(&owner);
        }
    }

    #[cfg(test)]
    fn owner_lock_count(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Validate and persist one score for `owner`.
    ///
    /// Fails with the validation taxonomy for absent, non-numeric, or
    /// non-positive values and with not-found when the owner is unknown,
    /// including the case where the owner is deleted between lookup and
    /// commit.
    pub async fn submit(&self, owner: UserId, raw: &str) -> Result<Score, DomainError> {
        let value =
            ScoreValue::parse(raw).map_err(|err| DomainError::validation(err.to_string()))?;

        self.users
            .find_by_id(owner)
            .await
            .map_err(map_conflict)?
            .ok_or_else(|| DomainError::not_found("User not found"))?;

        let lock = self.owner_lock(owner);
        let result = {
            let _serialized = lock.lock().await;
            self.scores
                .insert(owner, value)
                .await
                .map_err(|err| match err {
                    ScorePersistenceError::OwnerMissing => {
                        DomainError::not_found("User not found")
                    }
                    ScorePersistenceError::Query { message } => {
                        DomainError::internal(format!("score repository error: {message}"))
                    }
                })
        };
        drop(lock);
        self.prune_owner_lock(owner);
        result
    }

    /// Register a new user, converting uniqueness conflicts (including
    /// insert races) into the validation taxonomy.
    pub async fn register(&self, input: NewUser) -> Result<User, DomainError> {
        let draft = input.validate().map_err(|violations| {
            DomainError::validation_all(violations.iter().map(ToString::to_string).collect())
        })?;
        self.users.insert(draft).await.map_err(map_conflict)
    }

    /// Atomic get-or-insert keyed by device. Returns the user and whether a
    /// row was created.
    pub async fn register_or_fetch(&self, input: NewUser) -> Result<(User, bool), DomainError> {
        let draft = input.validate().map_err(|violations| {
            DomainError::validation_all(violations.iter().map(ToString::to_string).collect())
        })?;
        self.users
            .get_or_insert_by_device(draft)
            .await
            .map_err(map_conflict)
    }

    /// Best-effort orphan cleanup. Idempotent; failures are logged and
    /// never propagate to the enclosing read.
    pub async fn purge_orphans(&self) {
        match self.scores.purge_orphans().await {
            Ok(0) => {}
            Ok(removed) => debug!(removed, "purged orphan scores"),
            Err(error) => warn!(%error, "orphan score purge failed"),
        }
    }
}
