//! Server assembly: wires the store, domain services, middleware, and
//! routes, then runs the actix server.

pub mod config;

use std::sync::Arc;

use actix_web::{web, App, HttpResponse, HttpServer};
use mockable::{Clock, DefaultClock};
use tracing::info;
use utoipa::OpenApi;

use crate::doc::ApiDoc;
use crate::domain::ports::{ScoreRepository, UserRepository};
use crate::domain::{AdmissionController, IngestionCoordinator, RankingEngine};
use crate::inbound::http::{self, error, health, HttpState};
use crate::middleware::{AdmissionGate, ApiKeyAuth, Trace};
use crate::outbound::persistence::InMemoryStore;

pub use config::{Cli, ConfigError, ServerConfig};

async fn openapi_doc() -> HttpResponse {
    HttpResponse::Ok().json(ApiDoc::openapi())
}

/// Wire the domain services over one shared store.
fn build_state(clock: Arc<dyn Clock>) -> HttpState {
    let store = Arc::new(InMemoryStore::new(clock));
    let users: Arc<dyn UserRepository> = store.clone();
    let scores: Arc<dyn ScoreRepository> = store;
    HttpState {
        ranking: Arc::new(RankingEngine::new(scores.clone(), users.clone())),
        ingestion: Arc::new(IngestionCoordinator::new(users.clone(), scores)),
        users,
    }
}

/// Run the server until shutdown.
pub async fn run(config: ServerConfig) -> std::io::Result<()> {
    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);
    let state = build_state(clock.clone());
    let controller = Arc::new(AdmissionController::new(clock));
    let key = Arc::new(config.api_key);
    let health_state = web::Data::new(health::HealthState::new());

    // Middleware runs outermost-first: tracing, then the key gate, then
    // admission, so rejected requests still carry a trace id.
    let server = HttpServer::new({
        let health_state = health_state.clone();
        move || {
            App::new()
                .wrap(AdmissionGate::new(controller.clone()))
                .wrap(ApiKeyAuth::new(key.clone()))
                .wrap(Trace)
                .app_data(web::Data::new(state.clone()))
                .app_data(health_state.clone())
                .app_data(
                    web::JsonConfig::default().error_handler(error::json_error_handler),
                )
                .route("/health/live", web::get().to(health::live))
                .route("/health/ready", web::get().to(health::ready))
                .route("/api-docs/openapi.json", web::get().to(openapi_doc))
                .configure(http::configure)
        }
    })
    .bind(config.bind)?;

    health_state.mark_ready();
    info!(bind = %config.bind, "listening");
    server.run().await
}
