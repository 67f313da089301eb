//! Shared handler state.

use std::sync::Arc;

use crate::domain::ports::UserRepository;
use crate::domain::{IngestionCoordinator, RankingEngine};

/// Domain services reachable from the HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub ranking: Arc<RankingEngine>,
    pub ingestion: Arc<IngestionCoordinator>,
    pub users: Arc<dyn UserRepository>,
}
