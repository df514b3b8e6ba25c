//! Engagement endpoints
//!
//! Endpoints:
//!   POST /                       -> Record one engagement
//!   GET  /content/{content_id}   -> Engagements for a content item

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderMap, StatusCode, header},
    routing::{get, post},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::api::middleware::get_client_ip;
use crate::api::{ApiState, RequestIdentity};
use crate::error::AppResult;
use crate::models::{Engagement, EngagementType};

#[derive(Debug, Deserialize)]
pub struct RecordEngagementRequest {
    pub content_id: Uuid,
    pub engagement_type: EngagementType,
    pub referrer: Option<String>,
    pub metadata: Option<serde_json::Value>,
}

async fn record_engagement(
    State(state): State<ApiState>,
    identity: Option<RequestIdentity>,
    headers: HeaderMap,
    Json(request): Json<RecordEngagementRequest>,
) -> AppResult<(StatusCode, Json<Engagement>)> {
    let mut engagement = Engagement::new(request.content_id, request.engagement_type);
    engagement.user_id = identity.map(|i| i.user_id);
    engagement.referrer = request.referrer;
    engagement.metadata = request.metadata;
    engagement.user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let ip = get_client_ip(&headers, None);
    engagement.ip_address = (ip != "unknown").then_some(ip);

    let recorded = state.content.record_engagement(engagement).await?;
    Ok((StatusCode::CREATED, Json(recorded)))
}

async fn list_engagements(
    State(state): State<ApiState>,
    Path(content_id): Path<Uuid>,
) -> AppResult<Json<Vec<Engagement>>> {
    Ok(Json(state.content.list_engagements(content_id).await?))
}

pub fn create_router(state: ApiState) -> Router {
    Router::new()
        .route("/", post(record_engagement))
        .route("/content/{content_id}", get(list_engagements))
        .with_state(state)
}
