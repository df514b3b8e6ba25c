//! Creator endpoints
//!
//! Endpoints:
//!   POST   /              -> Create creator profile
//!   GET    /              -> List creators (admin)
//!   GET    /top           -> Verified creators by earnings
//!   GET    /search?q=     -> Search by code, username or name
//!   GET    /me            -> Caller's creator profile
//!   PATCH  /me            -> Update caller's profile
//!   GET    /code/{code}   -> Lookup by creator code
//!   GET    /{id}          -> Get creator
//!   PATCH  /{id}          -> Update profile (admin)
//!   PATCH  /{id}/status   -> Change status (admin)
//!   PATCH  /{id}/tier     -> Change tier (admin)
//!   PATCH  /{id}/stats    -> Apply counter deltas (admin)
//!   DELETE /{id}          -> Delete creator (admin)

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::api::{AdminAccess, ApiState, RequestIdentity};
use crate::error::AppResult;
use crate::models::{Creator, CreatorStatus, CreatorTier};
use crate::services::{CreateCreator, CreatorStatsDelta, UpdateCreator};

#[derive(Debug, Deserialize)]
pub struct TopQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: String,
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: CreatorStatus,
}

#[derive(Debug, Deserialize)]
pub struct TierRequest {
    pub tier: CreatorTier,
}

async fn create_creator(
    State(state): State<ApiState>,
    Json(request): Json<CreateCreator>,
) -> AppResult<(StatusCode, Json<Creator>)> {
    let creator = state.creators.create(request).await?;
    Ok((StatusCode::CREATED, Json(creator)))
}

async fn list_creators(
    State(state): State<ApiState>,
    _admin: AdminAccess,
) -> AppResult<Json<Vec<Creator>>> {
    Ok(Json(state.creators.list().await?))
}

async fn top_creators(
    State(state): State<ApiState>,
    Query(query): Query<TopQuery>,
) -> AppResult<Json<Vec<Creator>>> {
    Ok(Json(state.creators.top(query.limit).await?))
}

async fn search_creators(
    State(state): State<ApiState>,
    Query(query): Query<SearchQuery>,
) -> AppResult<Json<Vec<Creator>>> {
    Ok(Json(state.creators.search(&query.q).await?))
}

async fn my_profile(
    State(state): State<ApiState>,
    identity: RequestIdentity,
) -> AppResult<Json<Creator>> {
    Ok(Json(state.creators.find_by_user(identity.user_id).await?))
}

async fn update_my_profile(
    State(state): State<ApiState>,
    identity: RequestIdentity,
    Json(changes): Json<UpdateCreator>,
) -> AppResult<Json<Creator>> {
    let creator = state.creators.find_by_user(identity.user_id).await?;
    Ok(Json(state.creators.update(creator.id, changes).await?))
}

async fn get_by_code(
    State(state): State<ApiState>,
    Path(code): Path<String>,
) -> AppResult<Json<Creator>> {
    Ok(Json(state.creators.find_by_code(&code).await?))
}

async fn get_creator(
    State(state): State<ApiState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Creator>> {
    Ok(Json(state.creators.find(id).await?))
}

async fn update_creator(
    State(state): State<ApiState>,
    _admin: AdminAccess,
    Path(id): Path<Uuid>,
    Json(changes): Json<UpdateCreator>,
) -> AppResult<Json<Creator>> {
    Ok(Json(state.creators.update(id, changes).await?))
}

async fn update_status(
    State(state): State<ApiState>,
    _admin: AdminAccess,
    Path(id): Path<Uuid>,
    Json(request): Json<StatusRequest>,
) -> AppResult<Json<Creator>> {
    Ok(Json(state.creators.update_status(id, request.status).await?))
}

async fn update_tier(
    State(state): State<ApiState>,
    _admin: AdminAccess,
    Path(id): Path<Uuid>,
    Json(request): Json<TierRequest>,
) -> AppResult<Json<Creator>> {
    Ok(Json(state.creators.update_tier(id, request.tier).await?))
}

async fn update_stats(
    State(state): State<ApiState>,
    _admin: AdminAccess,
    Path(id): Path<Uuid>,
    Json(delta): Json<CreatorStatsDelta>,
) -> AppResult<Json<Creator>> {
    Ok(Json(state.creators.update_stats(id, delta).await?))
}

async fn delete_creator(
    State(state): State<ApiState>,
    _admin: AdminAccess,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    state.creators.remove(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn create_router(state: ApiState) -> Router {
    Router::new()
        .route("/", get(list_creators).post(create_creator))
        .route("/top", get(top_creators))
        .route("/search", get(search_creators))
        .route("/me", get(my_profile).patch(update_my_profile))
        .route("/code/{code}", get(get_by_code))
        .route(
            "/{id}",
            get(get_creator).patch(update_creator).delete(delete_creator),
        )
        .route("/{id}/status", patch(update_status))
        .route("/{id}/tier", patch(update_tier))
        .route("/{id}/stats", patch(update_stats))
        .with_state(state)
}
