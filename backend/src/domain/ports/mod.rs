//! Repository ports for the hexagonal boundary.
//!
//! The ranking engine and ingestion coordinator depend only on these
//! traits; the concrete store lives under `outbound/persistence`.

mod score_repository;
mod user_repository;

#[cfg(test)]
pub use score_repository::MockScoreRepository;
pub use score_repository::{ScorePersistenceError, ScoreRepository};
#[cfg(test)]
pub use user_repository::MockUserRepository;
pub use user_repository::{UniqueField, UserPersistenceError, UserRepository};
