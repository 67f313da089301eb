//! User registration and listing endpoints.

use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::user::{DeviceId, NewUser, User};
use crate::domain::DomainError;

use super::envelope;
use super::error::ApiResult;
use super::state::HttpState;

/// Registration request body.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateUserRequest {
    pub name: String,
    pub device: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// User representation with the derived score aggregates.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserResource {
    pub id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub device: String,
    pub created_at: DateTime<Utc>,
    pub score_count: u64,
    pub best_score: i64,
}

async fn resource_for(state: &HttpState, user: &User) -> Result<UserResource, DomainError> {
    let stats = state.ranking.user_stats(user.id()).await?;
    Ok(UserResource {
        id: user.id().as_uuid(),
        name: user.name().as_str().to_owned(),
        email: user.email().map(ToOwned::to_owned),
        device: user.device().as_str().to_owned(),
        created_at: user.created_at(),
        score_count: stats.score_count,
        best_score: stats.best_score,
    })
}

/// List every registered user in registration order.
#[utoipa::path(
    get,
    path = "/users",
    responses((status = 200, description = "All registered users", body = [UserResource]))
)]
pub async fn list_users(state: web::Data<HttpState>) -> ApiResult<HttpResponse> {
    let users = state.users.list().await?;
    let mut resources = Vec::with_capacity(users.len());
    for user in &users {
        resources.push(resource_for(&state, user).await?);
    }
    Ok(envelope::ok(resources))
}

/// Look a user up by device identifier.
#[utoipa::path(
    get,
    path = "/users/{device}",
    params(("device" = String, Path, description = "Device identifier")),
    responses(
        (status = 200, description = "The matching user", body = UserResource),
        (status = 404, description = "No user owns this device"),
    )
)]
pub async fn get_user(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let user = match DeviceId::new(path.into_inner()) {
        Ok(device) => state.users.find_by_device(&device).await?,
        Err(_) => None,
    };
    let user = user.ok_or_else(|| DomainError::not_found("User not found"))?;
    Ok(envelope::ok(resource_for(&state, &user).await?))
}

/// Register a new user.
#[utoipa::path(
    post,
    path = "/users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = UserResource),
        (status = 422, description = "One message per violated constraint"),
        (status = 400, description = "Malformed body"),
    )
)]
pub async fn create_user(
    state: web::Data<HttpState>,
    body: web::Json<CreateUserRequest>,
) -> ApiResult<HttpResponse> {
    let input = body.into_inner();
    let user = state
        .ingestion
        .register(NewUser {
            name: input.name,
            device: input.device,
            email: input.email,
        })
        .await?;
    Ok(envelope::created(resource_for(&state, &user).await?))
}
