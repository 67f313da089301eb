//! User identity model.
//!
//! `name` and `device` are globally unique among users (case sensitive) and
//! must be non-empty once trimmed. Identity fields are immutable after
//! creation; deleting a user cascades to every score it owns.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Validation errors for user registration input.
///
/// The display strings double as the per-constraint messages surfaced in
/// 422 responses.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UserValidationError {
    #[error("name can't be blank")]
    EmptyName,
    #[error("device can't be blank")]
    EmptyDevice,
}

/// Stable user identifier.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct UserId(Uuid);

impl UserId {
    /// Generate a new random identifier.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// The underlying UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for UserId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl From<Uuid> for UserId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

/// Validated, trimmed player name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PlayerName(String);

impl PlayerName {
    /// Validate and construct a player name.
    pub fn new(value: impl AsRef<str>) -> Result<Self, UserValidationError> {
        let trimmed = value.as_ref().trim();
        if trimmed.is_empty() {
            return Err(UserValidationError::EmptyName);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Borrow the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for PlayerName {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PlayerName> for String {
    fn from(value: PlayerName) -> Self {
        value.0
    }
}

/// Validated, trimmed device identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DeviceId(String);

impl DeviceId {
    /// Validate and construct a device identifier.
    pub fn new(value: impl AsRef<str>) -> Result<Self, UserValidationError> {
        let trimmed = value.as_ref().trim();
        if trimmed.is_empty() {
            return Err(UserValidationError::EmptyDevice);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Borrow the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for DeviceId {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<DeviceId> for String {
    fn from(value: DeviceId) -> Self {
        value.0
    }
}

/// A registered user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    id: UserId,
    name: PlayerName,
    device: DeviceId,
    email: Option<String>,
    created_at: DateTime<Utc>,
}

impl User {
    /// Assemble a user record. Called by the store once identity fields are
    /// validated and uniqueness is established.
    pub fn new(
        id: UserId,
        name: PlayerName,
        device: DeviceId,
        email: Option<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name,
            device,
            email,
            created_at,
        }
    }

    /// Stable identifier.
    pub fn id(&self) -> UserId {
        self.id
    }

    /// Unique display name.
    pub fn name(&self) -> &PlayerName {
        &self.name
    }

    /// Unique device identifier.
    pub fn device(&self) -> &DeviceId {
        &self.device
    }

    /// Optional contact address; never validated (the original system
    /// carried the column without a format constraint).
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    /// Registration timestamp.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Raw registration input as received from the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub name: String,
    pub device: String,
    pub email: Option<String>,
}

impl NewUser {
    /// Validate field constraints, collecting every violation rather than
    /// stopping at the first.
    pub fn validate(self) -> Result<UserDraft, Vec<UserValidationError>> {
        let mut violations = Vec::new();
        let name = PlayerName::new(&self.name).map_err(|e| violations.push(e)).ok();
        let device = DeviceId::new(&self.device).map_err(|e| violations.push(e)).ok();
        match (name, device) {
            (Some(name), Some(device)) => Ok(UserDraft {
                name,
                device,
                email: self.email,
            }),
            _ => Err(violations),
        }
    }
}

/// Field-validated registration input, ready for a uniqueness-checked
/// insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserDraft {
    pub name: PlayerName,
    pub device: DeviceId,
    pub email: Option<String>,
}
