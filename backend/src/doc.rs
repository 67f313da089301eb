//! OpenAPI document for the HTTP surface.

use utoipa::OpenApi;

use crate::inbound::http::scores::{HighScoreEntry, ScoreResource};
use crate::inbound::http::users::{CreateUserRequest, UserResource};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Podium",
        description = "Leaderboard service: user registration, score ingestion, and ranking queries."
    ),
    paths(
        crate::inbound::http::users::list_users,
        crate::inbound::http::users::get_user,
        crate::inbound::http::users::create_user,
        crate::inbound::http::scores::scoreboard,
        crate::inbound::http::scores::submit_score,
        crate::inbound::http::health::live,
        crate::inbound::http::health::ready,
    ),
    components(schemas(CreateUserRequest, UserResource, HighScoreEntry, ScoreResource))
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_route() {
        let doc = ApiDoc::openapi();
        for path in [
            "/users",
            "/users/{device}",
            "/scores/{device}",
            "/scores/new/{user}/{device}/{score}",
            "/health/live",
            "/health/ready",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }
}
