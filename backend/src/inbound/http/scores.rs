//! Scoreboard and score submission endpoints.

use std::collections::HashMap;
use std::str::FromStr;

use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;
use utoipa::ToSchema;

use crate::domain::user::{DeviceId, User, UserId};
use crate::domain::DomainError;

use super::envelope;
use super::error::ApiResult;
use super::state::HttpState;

/// Entries returned on the public scoreboard.
const HIGH_SCORE_LIMIT: usize = 20;

/// One scoreboard row.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct HighScoreEntry {
    pub name: String,
    pub score: i64,
    pub device: String,
}

/// A persisted score as returned from submission.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ScoreResource {
    pub id: u64,
    pub score: i64,
    pub user_name: String,
    pub device: String,
    pub created_at: DateTime<Utc>,
}

/// The global top-20 plus the requesting device's best score.
///
/// Unknown devices are not an error: the board is public and the caller
/// simply gets a zero `user_score`.
#[utoipa::path(
    get,
    path = "/scores/{device}",
    params(("device" = String, Path, description = "Device identifier")),
    responses((status = 200, description = "Scoreboard with the caller's best", body = [HighScoreEntry]))
)]
pub async fn scoreboard(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    state.ingestion.purge_orphans().await;

    let top = state.ranking.global_high_scores(HIGH_SCORE_LIMIT).await?;
    let users: HashMap<UserId, User> = state
        .users
        .list()
        .await?
        .into_iter()
        .map(|user| (user.id(), user))
        .collect();
    let high_scores: Vec<HighScoreEntry> = top
        .iter()
        .filter_map(|score| {
            users.get(&score.owner()).map(|owner| HighScoreEntry {
                name: owner.name().as_str().to_owned(),
                score: score.value().get(),
                device: owner.device().as_str().to_owned(),
            })
        })
        .collect();

    let user_score = match DeviceId::new(path.into_inner()) {
        Ok(device) => match state.users.find_by_device(&device).await? {
            Some(user) => state.ranking.best_score(user.id()).await?,
            None => 0,
        },
        Err(_) => 0,
    };

    Ok(envelope::ok(json!({
        "high_scores": high_scores,
        "user_score": user_score,
    })))
}

/// Submit one score for a user.
///
/// The device segment is accepted for wire compatibility but carries no
/// meaning: ownership comes from the user id alone.
#[utoipa::path(
    post,
    path = "/scores/new/{user}/{device}/{score}",
    params(
        ("user" = String, Path, description = "Owning user id"),
        ("device" = String, Path, description = "Submitting device (ignored)"),
        ("score" = String, Path, description = "Score value"),
    ),
    responses(
        (status = 201, description = "Score recorded", body = ScoreResource),
        (status = 404, description = "Unknown user"),
        (status = 422, description = "Invalid score value"),
    )
)]
pub async fn submit_score(
    state: web::Data<HttpState>,
    path: web::Path<(String, String, String)>,
) -> ApiResult<HttpResponse> {
    let (user, _device, raw) = path.into_inner();
    let owner =
        UserId::from_str(&user).map_err(|_| DomainError::not_found("User not found"))?;
    let score = state.ingestion.submit(owner, &raw).await?;
    let user = state
        .users
        .find_by_id(owner)
        .await?
        .ok_or_else(|| DomainError::not_found("User not found"))?;
    Ok(envelope::created(ScoreResource {
        id: score.id().get(),
        score: score.value().get(),
        user_name: user.name().as_str().to_owned(),
        device: user.device().as_str().to_owned(),
        created_at: score.created_at(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::{ScoreRepository, UserRepository};
    use crate::domain::user::NewUser;
    use crate::domain::{IngestionCoordinator, RankingEngine};
    use crate::outbound::persistence::InMemoryStore;
    use actix_web::http::StatusCode;
    use actix_web::{test as actix_test, App};
    use chrono::TimeZone;
    use mockable::MockClock;
    use serde_json::Value;
    use std::sync::Arc;

    fn state() -> web::Data<HttpState> {
        let mut clock = MockClock::new();
        clock
            .expect_utc()
            .return_const(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).single().expect("valid"));
        let store = Arc::new(InMemoryStore::new(Arc::new(clock)));
        let users: Arc<dyn UserRepository> = store.clone();
        let scores: Arc<dyn ScoreRepository> = store;
        web::Data::new(HttpState {
            ranking: Arc::new(RankingEngine::new(scores.clone(), users.clone())),
            ingestion: Arc::new(IngestionCoordinator::new(users.clone(), scores)),
            users,
        })
    }

    macro_rules! score_app {
        ($state:expr) => {
            actix_test::init_service(
                App::new()
                    .app_data($state.clone())
                    .route("/scores/{device}", web::get().to(scoreboard))
                    .route(
                        "/scores/new/{user}/{device}/{score}",
                        web::post().to(submit_score),
                    ),
            )
            .await
        };
    }

    async fn registered(state: &HttpState, name: &str, device: &str) -> User {
        state
            .ingestion
            .register(NewUser {
                name: name.to_owned(),
                device: device.to_owned(),
                email: None,
            })
            .await
            .expect("registered")
    }

    #[actix_web::test]
    async fn submission_returns_the_created_score() {
        let state = state();
        let app = score_app!(state);
        let user = registered(&state, "Ada", "device-1").await;
        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri(&format!("/scores/new/{}/device-1/150", user.id()))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::CREATED);
        let body: Value = actix_test::read_body_json(res).await;
        assert_eq!(body["success"], Value::Bool(true));
        assert_eq!(body["data"]["score"], Value::from(150));
        assert_eq!(body["data"]["user_name"], Value::String("Ada".into()));
        assert_eq!(body["data"]["device"], Value::String("device-1".into()));
    }

    #[actix_web::test]
    async fn unparseable_user_id_is_not_found() {
        let state = state();
        let app = score_app!(state);
        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/scores/new/not-a-uuid/device-1/150")
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        let body: Value = actix_test::read_body_json(res).await;
        assert_eq!(body["error"], Value::String("User not found".into()));
    }

    #[actix_web::test]
    async fn unknown_user_id_is_not_found() {
        let state = state();
        let app = score_app!(state);
        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri(&format!("/scores/new/{}/device-1/150", UserId::random()))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn non_positive_score_fails_validation() {
        let state = state();
        let app = score_app!(state);
        let user = registered(&state, "Ada", "device-1").await;
        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri(&format!("/scores/new/{}/device-1/0", user.id()))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body: Value = actix_test::read_body_json(res).await;
        assert_eq!(body["errors"], serde_json::json!(["score must be greater than 0"]));
    }

    #[actix_web::test]
    async fn scoreboard_orders_scores_and_reports_the_callers_best() {
        let state = state();
        let app = score_app!(state);
        let ada = registered(&state, "Ada", "device-1").await;
        let grace = registered(&state, "Grace", "device-2").await;
        state.ingestion.submit(ada.id(), "100").await.expect("submitted");
        state.ingestion.submit(grace.id(), "300").await.expect("submitted");
        state.ingestion.submit(ada.id(), "200").await.expect("submitted");

        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::get().uri("/scores/device-1").to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = actix_test::read_body_json(res).await;
        let board = body["data"]["high_scores"].as_array().expect("array");
        assert_eq!(board.len(), 3);
        assert_eq!(board[0]["score"], Value::from(300));
        assert_eq!(board[0]["name"], Value::String("Grace".into()));
        assert_eq!(board[1]["score"], Value::from(200));
        assert_eq!(body["data"]["user_score"], Value::from(200));
    }

    #[actix_web::test]
    async fn unknown_device_gets_a_zero_user_score() {
        let state = state();
        let app = score_app!(state);
        let ada = registered(&state, "Ada", "device-1").await;
        state.ingestion.submit(ada.id(), "100").await.expect("submitted");

        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::get().uri("/scores/ghost").to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = actix_test::read_body_json(res).await;
        assert_eq!(body["data"]["user_score"], Value::from(0));
        assert_eq!(body["data"]["high_scores"].as_array().expect("array").len(), 1);
    }
}
