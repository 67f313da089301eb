//! HTTP adapter: handlers, response envelope, and error mapping.

pub mod envelope;
pub mod error;
pub mod health;
pub mod scores;
pub mod state;
pub mod users;

use actix_web::web;

pub use error::{ApiError, ApiResult};
pub use state::HttpState;

/// Mount the authenticated API routes.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/users", web::get().to(users::list_users))
        .route("/users", web::post().to(users::create_user))
        .route("/users/{device}", web::get().to(users::get_user))
        .route("/scores/{device}", web::get().to(scores::scoreboard))
        .route(
            "/scores/new/{user}/{device}/{score}",
            web::post().to(scores::submit_score),
        );
}
