//! Port abstraction for user persistence adapters.

use async_trait::async_trait;

use crate::domain::user::{DeviceId, User, UserDraft, UserId};

/// Unique columns on the user table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniqueField {
    Name,
    Device,
}

impl UniqueField {
    /// The per-constraint message surfaced when the field collides.
    pub fn taken_message(self) -> &'static str {
        match self {
            Self::Name => "name has already been taken",
            Self::Device => "device has already been taken",
        }
    }
}

impl std::fmt::Display for UniqueField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Name => f.write_str("name"),
            Self::Device => f.write_str("device"),
        }
    }
}

/// Persistence errors raised by user repository adapters.
///
/// `Conflict` covers unique-constraint violations, including the losing
/// side of a concurrent insert race; callers convert it to the validation
/// taxonomy rather than surfacing an internal error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UserPersistenceError {
    #[error("unique constraint violated")]
    Conflict { fields: Vec<UniqueField> },
    #[error("user repository query failed: {message}")]
    Query { message: String },
}

/// Durable collection of user records.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new user, enforcing `name`/`device` uniqueness atomically
    /// with the insert.
    async fn insert(&self, draft: UserDraft) -> Result<User, UserPersistenceError>;

    /// Atomic get-or-insert keyed by device: returns the existing user when
    /// the device is already registered, otherwise inserts. The flag
    /// reports whether a row was created.
    async fn get_or_insert_by_device(
        &self,
        draft: UserDraft,
    ) -> Result<(User, bool), UserPersistenceError>;

    /// Fetch a user by device identifier.
    async fn find_by_device(&self, device: &DeviceId)
        -> Result<Option<User>, UserPersistenceError>;

    /// Fetch a user by identifier.
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, UserPersistenceError>;

    /// All users in registration order.
    async fn list(&self) -> Result<Vec<User>, UserPersistenceError>;

    /// Delete a user and cascade to every owned score. Returns whether a
    /// row existed.
    async fn delete(&self, id: UserId) -> Result<bool, UserPersistenceError>;
}
