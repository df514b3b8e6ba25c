//! Audit endpoints (admin)
//!
//! Endpoints:
//!   GET /?limit          -> Most recent entries, newest first
//!   GET /entity/{id}     -> Entries about one entity

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::api::{AdminAccess, ApiState};
use crate::models::AuditLog;

const DEFAULT_LIMIT: usize = 50;
const MAX_LIMIT: usize = 500;

#[derive(Debug, Deserialize)]
pub struct RecentQuery {
    pub limit: Option<usize>,
}

async fn recent_entries(
    State(state): State<ApiState>,
    _admin: AdminAccess,
    Query(query): Query<RecentQuery>,
) -> Json<Vec<AuditLog>> {
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT);
    Json(state.audit.get_recent(limit).await)
}

async fn entity_entries(
    State(state): State<ApiState>,
    _admin: AdminAccess,
    Path(id): Path<Uuid>,
) -> Json<Vec<AuditLog>> {
    Json(state.audit.get_for_entity(id).await)
}

pub fn create_router(state: ApiState) -> Router {
    Router::new()
        .route("/", get(recent_entries))
        .route("/entity/{id}", get(entity_entries))
        .with_state(state)
}
