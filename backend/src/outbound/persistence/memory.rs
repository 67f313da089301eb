//! In-memory store implementing both repository ports.
//!
//! A single `RwLock` guards all tables, so every write commits the whole
//! record atomically and every read observes a snapshot as of call time.
//! Unique-key indexes back the name/device constraints; score ids are a
//! monotonic sequence that doubles as insertion order.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use mockable::Clock;

use crate::domain::ports::{
    ScorePersistenceError, ScoreRepository, UniqueField, UserPersistenceError, UserRepository,
};
use crate::domain::score::{Score, ScoreId, ScoreValue};
use crate::domain::user::{DeviceId, User, UserDraft, UserId};

#[derive(Default)]
struct Tables {
    users: HashMap<UserId, User>,
    user_order: Vec<UserId>,
    by_name: HashMap<String, UserId>,
    by_device: HashMap<String, UserId>,
    scores: Vec<Score>,
    next_score_id: u64,
}

impl Tables {
    fn conflicts(&self, draft: &UserDraft) -> Vec<UniqueField> {
        let mut fields = Vec::new();
        if self.by_name.contains_key(draft.name.as_str()) {
            fields.push(UniqueField::Name);
        }
        if self.by_device.contains_key(draft.device.as_str()) {
            fields.push(UniqueField::Device);
        }
        fields
    }

    fn insert_user(&mut self, draft: UserDraft, now: chrono::DateTime<chrono::Utc>) -> User {
        let user = User::new(
            UserId::random(),
            draft.name,
            draft.device,
            draft.email,
            now,
        );
        self.by_name.insert(user.name().as_str().to_owned(), user.id());
        self.by_device
            .insert(user.device().as_str().to_owned(), user.id());
        self.user_order.push(user.id());
        self.users.insert(user.id(), user.clone());
        user
    }

    fn live_scores(&self) -> impl Iterator<Item = &Score> + '_ {
        self.scores
            .iter()
            .filter(|score| self.users.contains_key(&score.owner()))
    }

    fn top_of(&self, mut scores: Vec<Score>, n: usize) -> Vec<Score> {
        // Stable sort keeps insertion order within equal values, which is
        // exactly the tie rule: earlier score first.
        scores.sort_by(|a, b| b.value().cmp(&a.value()));
        scores.truncate(n);
        scores
    }
}

/// Shared in-memory score store.
pub struct InMemoryStore {
    clock: Arc<dyn Clock>,
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    /// Create an empty store around a clock.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            tables: RwLock::new(Tables::default()),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Tables> {
        self.tables.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Tables> {
        self.tables.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Drop a user row without cascading, leaving its scores orphaned.
    /// Orphans cannot be produced through the public API (deletion
    /// cascades), so orphan-handling tests fabricate them here.
    #[cfg(test)]
    pub(crate) fn drop_user_row_for_test(&self, id: UserId) {
        let mut tables = self.write();
        if let Some(user) = tables.users.remove(&id) {
            tables.by_name.remove(user.name().as_str());
            tables.by_device.remove(user.device().as_str());
            tables.user_order.retain(|other| *other != id);
        }
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn insert(&self, draft: UserDraft) -> Result<User, UserPersistenceError> {
        let mut tables = self.write();
        let fields = tables.conflicts(&draft);
        if !fields.is_empty() {
            return Err(UserPersistenceError::Conflict { fields });
        }
        Ok(tables.insert_user(draft, self.clock.utc()))
    }

    async fn get_or_insert_by_device(
        &self,
        draft: UserDraft,
    ) -> Result<(User, bool), UserPersistenceError> {
        let mut tables = self.write();
        if let Some(id) = tables.by_device.get(draft.device.as_str()) {
            let user = tables
                .users
                .get(id)
                .cloned()
                .ok_or_else(|| UserPersistenceError::Query {
                    message: "device index points at a missing user".to_owned(),
                })?;
            return Ok((user, false));
        }
        let fields = tables.conflicts(&draft);
        if !fields.is_empty() {
            return Err(UserPersistenceError::Conflict { fields });
        }
        Ok((tables.insert_user(draft, self.clock.utc()), true))
    }

    async fn find_by_device(
        &self,
        device: &DeviceId,
    ) -> Result<Option<User>, UserPersistenceError> {
        let tables = self.read();
        Ok(tables
            .by_device
            .get(device.as_str())
            .and_then(|id| tables.users.get(id))
            .cloned())
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, UserPersistenceError> {
        Ok(self.read().users.get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<User>, UserPersistenceError> {
        let tables = self.read();
        Ok(tables
            .user_order
            .iter()
            .filter_map(|id| tables.users.get(id))
            .cloned()
            .collect())
    }

    async fn delete(&self, id: UserId) -> Result<bool, UserPersistenceError> {
        let mut tables = self.write();
        let Some(user) = tables.users.remove(&id) else {
            return Ok(false);
        };
        tables.by_name.remove(user.name().as_str());
        tables.by_device.remove(user.device().as_str());
        tables.user_order.retain(|other| *other != id);
        // Cascade: a user's scores do not outlive it.
        tables.scores.retain(|score| score.owner() != id);
        Ok(true)
    }
}

#[async_trait]
impl ScoreRepository for InMemoryStore {
    async fn insert(
        &self,
        owner: UserId,
        value: ScoreValue,
    ) -> Result<Score, ScorePersistenceError> {
        let mut tables = self.write();
        if !tables.users.contains_key(&owner) {
            return Err(ScorePersistenceError::OwnerMissing);
        }
        let id = ScoreId::new(tables.next_score_id);
        tables.next_score_id += 1;
        let score = Score::new(id, value, owner, self.clock.utc());
        tables.scores.push(score.clone());
        Ok(score)
    }

    async fn top_n(&self, n: usize) -> Result<Vec<Score>, ScorePersistenceError> {
        let tables = self.read();
        let live = tables.live_scores().cloned().collect();
        Ok(tables.top_of(live, n))
    }

    async fn top_n_by_owner(
        &self,
        owner: UserId,
        n: usize,
    ) -> Result<Vec<Score>, ScorePersistenceError> {
        let tables = self.read();
        let owned = tables
            .live_scores()
            .filter(|score| score.owner() == owner)
            .cloned()
            .collect();
        Ok(tables.top_of(owned, n))
    }

    async fn by_owner(&self, owner: UserId) -> Result<Vec<Score>, ScorePersistenceError> {
        Ok(self
            .read()
            .live_scores()
            .filter(|score| score.owner() == owner)
            .cloned()
            .collect())
    }

    async fn recent_by_owner(
        &self,
        owner: UserId,
        n: usize,
    ) -> Result<Vec<Score>, ScorePersistenceError> {
        let tables = self.read();
        let mut owned: Vec<Score> = tables
            .live_scores()
            .filter(|score| score.owner() == owner)
            .cloned()
            .collect();
        owned.sort_by(|a, b| {
            b.created_at()
                .cmp(&a.created_at())
                .then(b.id().cmp(&a.id()))
        });
        owned.truncate(n);
        Ok(owned)
    }

    async fn count(&self) -> Result<u64, ScorePersistenceError> {
        Ok(self.read().live_scores().count() as u64)
    }

    async fn count_by_owner(&self, owner: UserId) -> Result<u64, ScorePersistenceError> {
        Ok(self
            .read()
            .live_scores()
            .filter(|score| score.owner() == owner)
            .count() as u64)
    }

    async fn count_greater_than(&self, value: i64) -> Result<u64, ScorePersistenceError> {
        Ok(self
            .read()
            .live_scores()
            .filter(|score| score.value().get() > value)
            .count() as u64)
    }

    async fn values(&self) -> Result<Vec<i64>, ScorePersistenceError> {
        Ok(self
            .read()
            .live_scores()
            .map(|score| score.value().get())
            .collect())
    }

    async fn best_per_owner(&self) -> Result<Vec<(UserId, i64)>, ScorePersistenceError> {
        let tables = self.read();
        let mut bests: HashMap<UserId, i64> = HashMap::new();
        for score in tables.live_scores() {
            let entry = bests.entry(score.owner()).or_insert(i64::MIN);
            *entry = (*entry).max(score.value().get());
        }
        Ok(bests.into_iter().collect())
    }

    async fn purge_orphans(&self) -> Result<u64, ScorePersistenceError> {
        let mut tables = self.write();
        let before = tables.scores.len();
        let users = std::mem::take(&mut tables.users);
        tables.scores.retain(|score| users.contains_key(&score.owner()));
        tables.users = users;
        Ok((before - tables.scores.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::user::{NewUser, PlayerName};
    use chrono::{TimeZone, Utc};
    use mockable::MockClock;

    fn store() -> InMemoryStore {
        let mut clock = MockClock::new();
        clock
            .expect_utc()
            .return_const(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).single().expect("valid"));
        InMemoryStore::new(Arc::new(clock))
    }

    fn draft(name: &str, device: &str) -> UserDraft {
        NewUser {
            name: name.to_owned(),
            device: device.to_owned(),
            email: None,
        }
        .validate()
        .expect("valid draft")
    }

    async fn submit(store: &InMemoryStore, owner: UserId, value: i64) -> Score {
        ScoreRepository::insert(store, owner, ScoreValue::try_from(value).expect("positive"))
            .await
            .expect("inserted")
    }

    #[tokio::test]
    async fn duplicate_name_and_device_report_both_fields() {
        let store = store();
        UserRepository::insert(&store, draft("Ada", "device-1"))
            .await
            .expect("first insert");
        let err = UserRepository::insert(&store, draft("Ada", "device-1"))
            .await
            .expect_err("conflict");
        assert_eq!(
            err,
            UserPersistenceError::Conflict {
                fields: vec![UniqueField::Name, UniqueField::Device],
            }
        );
    }

    #[tokio::test]
    async fn uniqueness_is_case_sensitive() {
        let store = store();
        UserRepository::insert(&store, draft("Ada", "device-1"))
            .await
            .expect("first insert");
        UserRepository::insert(&store, draft("ada", "DEVICE-1"))
            .await
            .expect("different case is a different key");
    }

    #[tokio::test]
    async fn get_or_insert_returns_the_existing_row() {
        let store = store();
        let (created, was_created) = store
            .get_or_insert_by_device(draft("Ada", "device-1"))
            .await
            .expect("created");
        assert!(was_created);
        let (fetched, was_created) = store
            .get_or_insert_by_device(draft("Someone Else", "device-1"))
            .await
            .expect("fetched");
        assert!(!was_created);
        assert_eq!(fetched.id(), created.id());
        assert_eq!(fetched.name(), &PlayerName::new("Ada").expect("name"));
    }

    #[tokio::test]
    async fn list_preserves_registration_order() {
        let store = store();
        let a = UserRepository::insert(&store, draft("A", "d-a")).await.expect("a");
        let b = UserRepository::insert(&store, draft("B", "d-b")).await.expect("b");
        let listed: Vec<UserId> = store
            .list()
            .await
            .expect("list")
            .iter()
            .map(User::id)
            .collect();
        assert_eq!(listed, vec![a.id(), b.id()]);
    }

    #[tokio::test]
    async fn top_n_orders_by_value_with_stable_ties() {
        let store = store();
        let user = UserRepository::insert(&store, draft("Ada", "device-1"))
            .await
            .expect("user");
        let first_200 = submit(&store, user.id(), 200).await;
        submit(&store, user.id(), 100).await;
        let second_200 = submit(&store, user.id(), 200).await;
        let top = store.top_n(10).await.expect("top");
        let ids: Vec<ScoreId> = top.iter().map(Score::id).collect();
        assert_eq!(ids[..2], [first_200.id(), second_200.id()]);
        assert_eq!(top.len(), 3);
    }

    #[tokio::test]
    async fn deleting_a_user_cascades_to_scores() {
        let store = store();
        let user = UserRepository::insert(&store, draft("Ada", "device-1"))
            .await
            .expect("user");
        submit(&store, user.id(), 100).await;
        submit(&store, user.id(), 200).await;
        assert!(store.delete(user.id()).await.expect("deleted"));
        assert_eq!(ScoreRepository::count(&store).await.expect("count"), 0);
        // The unique keys are released too.
        UserRepository::insert(&store, draft("Ada", "device-1"))
            .await
            .expect("re-register");
    }

    #[tokio::test]
    async fn insert_without_owner_is_rejected() {
        let store = store();
        let err = ScoreRepository::insert(
            &store,
            UserId::random(),
            ScoreValue::try_from(100).expect("positive"),
        )
        .await
        .expect_err("no owner");
        assert_eq!(err, ScorePersistenceError::OwnerMissing);
    }

    #[tokio::test]
    async fn orphans_are_invisible_to_reads_before_any_purge() {
        let store = store();
        let keeper = UserRepository::insert(&store, draft("Keeper", "d-keep"))
            .await
            .expect("keeper");
        let goner = UserRepository::insert(&store, draft("Goner", "d-gone"))
            .await
            .expect("goner");
        submit(&store, keeper.id(), 100).await;
        submit(&store, goner.id(), 999).await;
        store.drop_user_row_for_test(goner.id());

        let top = store.top_n(10).await.expect("top");
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].value().get(), 100);
        assert_eq!(ScoreRepository::count(&store).await.expect("count"), 1);
        assert_eq!(store.values().await.expect("values"), vec![100]);
    }

    #[tokio::test]
    async fn purge_removes_orphans_and_is_idempotent() {
        let store = store();
        let goner = UserRepository::insert(&store, draft("Goner", "d-gone"))
            .await
            .expect("goner");
        submit(&store, goner.id(), 999).await;
        store.drop_user_row_for_test(goner.id());

        assert_eq!(store.purge_orphans().await.expect("purge"), 1);
        assert_eq!(store.purge_orphans().await.expect("purge again"), 0);
    }

    #[tokio::test]
    async fn best_per_owner_reports_maxima_only_for_scored_users() {
        let store = store();
        let scored = UserRepository::insert(&store, draft("Scored", "d-s"))
            .await
            .expect("scored");
        UserRepository::insert(&store, draft("Scoreless", "d-z"))
            .await
            .expect("scoreless");
        submit(&store, scored.id(), 100).await;
        submit(&store, scored.id(), 300).await;
        submit(&store, scored.id(), 200).await;
        let bests = store.best_per_owner().await.expect("bests");
        assert_eq!(bests, vec![(scored.id(), 300)]);
    }

    #[tokio::test]
    async fn concurrent_submissions_for_one_owner_all_commit() {
        let store = Arc::new(store());
        let user = UserRepository::insert(store.as_ref(), draft("Ada", "device-1"))
            .await
            .expect("user");
        let tasks: Vec<_> = (1..=5i64)
            .map(|i| {
                let store = Arc::clone(&store);
                let owner = user.id();
                tokio::spawn(async move { submit(store.as_ref(), owner, i * 100).await })
            })
            .collect();
        for outcome in futures::future::join_all(tasks).await {
            outcome.expect("task finished");
        }
        assert_eq!(
            store.count_by_owner(user.id()).await.expect("count"),
            5
        );
        let ids: Vec<u64> = store
            .by_owner(user.id())
            .await
            .expect("owned")
            .iter()
            .map(|s| s.id().get())
            .collect();
        let mut deduped = ids.clone();
        deduped.sort_unstable();
        deduped.dedup();
        assert_eq!(deduped.len(), ids.len(), "no duplicate ids");
    }
}
