//! Domain layer: entities, services, and the ports they depend on.
//!
//! Everything here is transport agnostic. Inbound adapters translate
//! [`DomainError`] into HTTP envelopes; outbound adapters implement the
//! repository ports.

pub mod admission;
pub mod error;
pub mod ingestion;
pub mod ports;
pub mod ranking;
pub mod score;
pub mod user;

pub use admission::{AdmissionController, Decision, RouteGroup};
pub use error::{DomainError, ErrorCode};
pub use ingestion::IngestionCoordinator;
pub use ranking::{RankingEngine, UserStats};
pub use score::{Score, ScoreId, ScoreValidationError, ScoreValue};
pub use user::{DeviceId, NewUser, PlayerName, User, UserDraft, UserId, UserValidationError};
