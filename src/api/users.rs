//! User endpoints
//!
//! Endpoints:
//!   POST   /                   -> Register
//!   POST   /login              -> Check credentials
//!   GET    /                   -> List users (admin)
//!   PATCH  /profile            -> Update own profile
//!   GET    /{id}               -> Get user
//!   PATCH  /{id}               -> Update user (admin)
//!   DELETE /{id}               -> Delete user (admin)
//!   POST   /{id}/verify-email  -> Mark email verified

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, patch, post},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::api::{AdminAccess, ApiState, RequestIdentity};
use crate::error::AppResult;
use crate::models::User;
use crate::services::{CreateUser, UpdateUser};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

async fn register(
    State(state): State<ApiState>,
    Json(request): Json<CreateUser>,
) -> AppResult<(StatusCode, Json<User>)> {
    let user = state.users.create(request).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

async fn login(
    State(state): State<ApiState>,
    Json(request): Json<LoginRequest>,
) -> AppResult<Json<User>> {
    Ok(Json(state.users.login(&request.email, &request.password).await?))
}

async fn list_users(State(state): State<ApiState>, _admin: AdminAccess) -> AppResult<Json<Vec<User>>> {
    Ok(Json(state.users.list().await?))
}

async fn get_user(State(state): State<ApiState>, Path(id): Path<Uuid>) -> AppResult<Json<User>> {
    Ok(Json(state.users.find(id).await?))
}

async fn update_profile(
    State(state): State<ApiState>,
    identity: RequestIdentity,
    Json(changes): Json<UpdateUser>,
) -> AppResult<Json<User>> {
    Ok(Json(state.users.update(identity.user_id, changes).await?))
}

async fn update_user(
    State(state): State<ApiState>,
    _admin: AdminAccess,
    Path(id): Path<Uuid>,
    Json(changes): Json<UpdateUser>,
) -> AppResult<Json<User>> {
    Ok(Json(state.users.update(id, changes).await?))
}

async fn delete_user(
    State(state): State<ApiState>,
    _admin: AdminAccess,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    state.users.remove(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn verify_email(State(state): State<ApiState>, Path(id): Path<Uuid>) -> AppResult<Json<User>> {
    Ok(Json(state.users.verify_email(id).await?))
}

pub fn create_router(state: ApiState) -> Router {
    Router::new()
        .route("/", post(register).get(list_users))
        .route("/login", post(login))
        .route("/profile", patch(update_profile))
        .route("/{id}", get(get_user).patch(update_user).delete(delete_user))
        .route("/{id}/verify-email", post(verify_email))
        .with_state(state)
}
