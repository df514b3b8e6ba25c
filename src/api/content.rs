//! Content endpoints
//!
//! Endpoints:
//!   POST   /                        -> Create content
//!   GET    /?creator_id&status      -> List content
//!   GET    /top?limit&timeframe     -> Published content by engagement
//!   GET    /search?q=               -> Search published content
//!   GET    /my-content              -> Caller's content
//!   GET    /analytics?creator_id    -> Creator content analytics
//!   GET    /platform/{platform}     -> Content on one platform
//!   GET    /{id}                    -> Get content
//!   PATCH  /{id}                    -> Update (owner)
//!   DELETE /{id}                    -> Delete (owner)
//!   PATCH  /{id}/status             -> Change status (admin)
//!   PATCH  /{id}/stats              -> Apply counter deltas

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::api::{AdminAccess, ApiState, RequestIdentity};
use crate::database::ContentFilter;
use crate::error::{AppError, AppResult};
use crate::models::{Content, ContentStatus, Platform};
use crate::rewards::Timeframe;
use crate::services::{ContentAnalytics, ContentStatsDelta, CreateContent, UpdateContent};

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub creator_id: Option<Uuid>,
    pub status: Option<ContentStatus>,
}

#[derive(Debug, Deserialize)]
pub struct TopQuery {
    pub limit: Option<usize>,
    pub timeframe: Option<Timeframe>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: String,
}

#[derive(Debug, Deserialize)]
pub struct AnalyticsQuery {
    pub creator_id: Option<Uuid>,
    pub timeframe: Option<Timeframe>,
}

#[derive(Debug, Deserialize)]
pub struct PlatformQuery {
    pub creator_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: ContentStatus,
}

async fn create_content(
    State(state): State<ApiState>,
    Json(request): Json<CreateContent>,
) -> AppResult<(StatusCode, Json<Content>)> {
    let content = state.content.create(request).await?;
    Ok((StatusCode::CREATED, Json(content)))
}

async fn list_content(
    State(state): State<ApiState>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Vec<Content>>> {
    let filter = ContentFilter {
        creator_id: query.creator_id,
        status: query.status,
        ..Default::default()
    };
    Ok(Json(state.content.list(&filter).await?))
}

async fn top_content(
    State(state): State<ApiState>,
    Query(query): Query<TopQuery>,
) -> AppResult<Json<Vec<Content>>> {
    Ok(Json(state.content.top(query.limit, query.timeframe).await?))
}

async fn search_content(
    State(state): State<ApiState>,
    Query(query): Query<SearchQuery>,
) -> AppResult<Json<Vec<Content>>> {
    Ok(Json(state.content.search(&query.q).await?))
}

async fn my_content(
    State(state): State<ApiState>,
    identity: RequestIdentity,
) -> AppResult<Json<Vec<Content>>> {
    Ok(Json(state.content.list_for_user(identity.user_id).await?))
}

async fn content_analytics(
    State(state): State<ApiState>,
    identity: Option<RequestIdentity>,
    Query(query): Query<AnalyticsQuery>,
) -> AppResult<Json<ContentAnalytics>> {
    let creator_id = match (query.creator_id, identity) {
        (Some(id), _) => id,
        (None, Some(identity)) => state.creators.find_by_user(identity.user_id).await?.id,
        (None, None) => {
            return Err(AppError::validation(
                "creator_id is required without an x-user-id header",
            ));
        }
    };
    Ok(Json(
        state.content.analytics(creator_id, query.timeframe).await?,
    ))
}

async fn by_platform(
    State(state): State<ApiState>,
    Path(platform): Path<Platform>,
    Query(query): Query<PlatformQuery>,
) -> AppResult<Json<Vec<Content>>> {
    Ok(Json(
        state
            .content
            .list_by_platform(platform, query.creator_id)
            .await?,
    ))
}

async fn get_content(
    State(state): State<ApiState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Content>> {
    Ok(Json(state.content.find(id).await?))
}

async fn update_content(
    State(state): State<ApiState>,
    identity: RequestIdentity,
    Path(id): Path<Uuid>,
    Json(changes): Json<UpdateContent>,
) -> AppResult<Json<Content>> {
    Ok(Json(
        state.content.update(id, identity.user_id, changes).await?,
    ))
}

async fn delete_content(
    State(state): State<ApiState>,
    identity: RequestIdentity,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    state.content.remove(id, identity.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn update_status(
    State(state): State<ApiState>,
    _admin: AdminAccess,
    Path(id): Path<Uuid>,
    Json(request): Json<StatusRequest>,
) -> AppResult<Json<Content>> {
    Ok(Json(state.content.update_status(id, request.status).await?))
}

async fn update_stats(
    State(state): State<ApiState>,
    Path(id): Path<Uuid>,
    Json(delta): Json<ContentStatsDelta>,
) -> AppResult<Json<Content>> {
    Ok(Json(state.content.update_stats(id, delta).await?))
}

pub fn create_router(state: ApiState) -> Router {
    Router::new()
        .route("/", get(list_content).post(create_content))
        .route("/top", get(top_content))
        .route("/search", get(search_content))
        .route("/my-content", get(my_content))
        .route("/analytics", get(content_analytics))
        .route("/platform/{platform}", get(by_platform))
        .route(
            "/{id}",
            get(get_content).patch(update_content).delete(delete_content),
        )
        .route("/{id}/status", patch(update_status))
        .route("/{id}/stats", patch(update_stats))
        .with_state(state)
}
