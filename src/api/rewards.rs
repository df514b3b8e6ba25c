//! Reward endpoints
//!
//! Endpoints:
//!   POST  /content/{content_id}   -> Content reward from engagement
//!   POST  /milestone              -> Milestone reward
//!   POST  /engagement-bonus       -> Engagement bonus
//!   POST  /                       -> Manual reward (admin)
//!   GET   /?creator_id&status     -> List rewards
//!   GET   /my-rewards             -> Caller's rewards
//!   GET   /analytics              -> Totals, breakdowns and recent rewards
//!   GET   /calculate/{content_id} -> Quote without writing
//!   GET   /{id}                   -> Get reward
//!   PATCH /{id}/status            -> Generic transition (admin)
//!   PATCH /{id}/approve           -> Approve (admin)
//!   PATCH /{id}/pay               -> Mark paid (admin)
//!   PATCH /{id}/reject            -> Reject with reason (admin)
//!   PATCH /{id}/cancel            -> Cancel (admin)
//!   POST  /process-automatic      -> Run the sweep now (admin)

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch, post},
};
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use crate::api::{AdminAccess, ApiState, RequestIdentity};
use crate::database::RewardFilter;
use crate::error::{AppError, AppResult};
use crate::models::{Reward, RewardStatus};
use crate::rewards::{
    ManualReward, RewardAnalytics, RewardCommand, RewardQuote, SweepReport, Timeframe,
};

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub creator_id: Option<Uuid>,
    pub status: Option<RewardStatus>,
}

#[derive(Debug, Deserialize)]
pub struct AnalyticsQuery {
    pub creator_id: Option<Uuid>,
    pub timeframe: Option<Timeframe>,
}

#[derive(Debug, Deserialize)]
pub struct MilestoneRequest {
    pub creator_id: Uuid,
    pub milestone: String,
    pub amount: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct EngagementBonusRequest {
    pub creator_id: Uuid,
    pub amount: Decimal,
    pub period: String,
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: RewardStatus,
    pub transaction_reference: Option<String>,
    pub reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PayRequest {
    pub transaction_reference: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RejectRequest {
    pub reason: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct CancelRequest {
    pub reason: Option<String>,
}

fn actor(identity: Option<RequestIdentity>) -> Option<Uuid> {
    identity.map(|i| i.user_id)
}

/// Map a requested status onto the lifecycle command that reaches it.
fn command_for(request: StatusRequest) -> AppResult<RewardCommand> {
    match request.status {
        RewardStatus::Approved => Ok(RewardCommand::Approve),
        RewardStatus::Paid => Ok(RewardCommand::Pay {
            transaction_reference: request.transaction_reference,
        }),
        RewardStatus::Rejected => {
            let reason = request
                .reason
                .filter(|r| !r.trim().is_empty())
                .ok_or_else(|| AppError::validation("reason is required to reject a reward"))?;
            Ok(RewardCommand::Reject { reason })
        }
        RewardStatus::Cancelled => Ok(RewardCommand::Cancel {
            reason: request.reason,
        }),
        other => Err(AppError::validation(format!(
            "unsupported target status '{}'",
            other
        ))),
    }
}

async fn create_content_reward(
    State(state): State<ApiState>,
    identity: Option<RequestIdentity>,
    Path(content_id): Path<Uuid>,
) -> AppResult<(StatusCode, Json<Reward>)> {
    let reward = state
        .ledger
        .create_content_reward(content_id, actor(identity))
        .await?;
    Ok((StatusCode::CREATED, Json(reward)))
}

async fn create_milestone_reward(
    State(state): State<ApiState>,
    identity: Option<RequestIdentity>,
    Json(request): Json<MilestoneRequest>,
) -> AppResult<(StatusCode, Json<Reward>)> {
    let reward = state
        .ledger
        .create_milestone_reward(
            request.creator_id,
            request.milestone,
            request.amount,
            actor(identity),
        )
        .await?;
    Ok((StatusCode::CREATED, Json(reward)))
}

async fn create_engagement_bonus(
    State(state): State<ApiState>,
    identity: Option<RequestIdentity>,
    Json(request): Json<EngagementBonusRequest>,
) -> AppResult<(StatusCode, Json<Reward>)> {
    let reward = state
        .ledger
        .create_engagement_bonus(
            request.creator_id,
            request.amount,
            request.period,
            actor(identity),
        )
        .await?;
    Ok((StatusCode::CREATED, Json(reward)))
}

async fn create_manual_reward(
    State(state): State<ApiState>,
    admin: AdminAccess,
    Json(request): Json<ManualReward>,
) -> AppResult<(StatusCode, Json<Reward>)> {
    let reward = state
        .ledger
        .create_manual_reward(request, admin.actor)
        .await?;
    Ok((StatusCode::CREATED, Json(reward)))
}

async fn list_rewards(
    State(state): State<ApiState>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Vec<Reward>>> {
    let filter = RewardFilter {
        creator_id: query.creator_id,
        status: query.status,
        ..RewardFilter::default()
    };
    Ok(Json(state.ledger.list(&filter).await?))
}

async fn my_rewards(
    State(state): State<ApiState>,
    identity: RequestIdentity,
) -> AppResult<Json<Vec<Reward>>> {
    let filter = RewardFilter {
        user_id: Some(identity.user_id),
        ..RewardFilter::default()
    };
    Ok(Json(state.ledger.list(&filter).await?))
}

async fn reward_analytics(
    State(state): State<ApiState>,
    Query(query): Query<AnalyticsQuery>,
) -> AppResult<Json<RewardAnalytics>> {
    Ok(Json(
        state
            .ledger
            .analytics(query.creator_id, query.timeframe)
            .await?,
    ))
}

async fn calculate_reward(
    State(state): State<ApiState>,
    Path(content_id): Path<Uuid>,
) -> AppResult<Json<RewardQuote>> {
    Ok(Json(state.ledger.calculate_content_reward(content_id).await?))
}

async fn get_reward(
    State(state): State<ApiState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Reward>> {
    Ok(Json(state.ledger.find(id).await?))
}

async fn update_status(
    State(state): State<ApiState>,
    admin: AdminAccess,
    Path(id): Path<Uuid>,
    Json(request): Json<StatusRequest>,
) -> AppResult<Json<Reward>> {
    let command = command_for(request)?;
    Ok(Json(state.ledger.apply(id, command, admin.actor).await?))
}

async fn approve_reward(
    State(state): State<ApiState>,
    admin: AdminAccess,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Reward>> {
    Ok(Json(state.ledger.approve(id, admin.actor).await?))
}

async fn pay_reward(
    State(state): State<ApiState>,
    admin: AdminAccess,
    Path(id): Path<Uuid>,
    request: Option<Json<PayRequest>>,
) -> AppResult<Json<Reward>> {
    let request = request.map(|Json(r)| r).unwrap_or_default();
    Ok(Json(
        state
            .ledger
            .mark_paid(id, request.transaction_reference, admin.actor)
            .await?,
    ))
}

async fn reject_reward(
    State(state): State<ApiState>,
    admin: AdminAccess,
    Path(id): Path<Uuid>,
    Json(request): Json<RejectRequest>,
) -> AppResult<Json<Reward>> {
    if request.reason.trim().is_empty() {
        return Err(AppError::validation("reason is required to reject a reward"));
    }
    Ok(Json(
        state.ledger.reject(id, request.reason, admin.actor).await?,
    ))
}

async fn cancel_reward(
    State(state): State<ApiState>,
    admin: AdminAccess,
    Path(id): Path<Uuid>,
    request: Option<Json<CancelRequest>>,
) -> AppResult<Json<Reward>> {
    let request = request.map(|Json(r)| r).unwrap_or_default();
    Ok(Json(
        state.ledger.cancel(id, request.reason, admin.actor).await?,
    ))
}

async fn process_automatic(
    State(state): State<ApiState>,
    _admin: AdminAccess,
) -> AppResult<Json<SweepReport>> {
    Ok(Json(state.sweeper.run().await?))
}

pub fn create_router(state: ApiState) -> Router {
    Router::new()
        .route("/", get(list_rewards).post(create_manual_reward))
        .route("/content/{content_id}", post(create_content_reward))
        .route("/milestone", post(create_milestone_reward))
        .route("/engagement-bonus", post(create_engagement_bonus))
        .route("/my-rewards", get(my_rewards))
        .route("/analytics", get(reward_analytics))
        .route("/calculate/{content_id}", get(calculate_reward))
        .route("/process-automatic", post(process_automatic))
        .route("/{id}", get(get_reward))
        .route("/{id}/status", patch(update_status))
        .route("/{id}/approve", patch(approve_reward))
        .route("/{id}/pay", patch(pay_reward))
        .route("/{id}/reject", patch(reject_reward))
        .route("/{id}/cancel", patch(cancel_reward))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(status: RewardStatus, reason: Option<&str>) -> StatusRequest {
        StatusRequest {
            status,
            transaction_reference: None,
            reason: reason.map(str::to_string),
        }
    }

    #[test]
    fn test_pending_is_not_a_target() {
        let err = command_for(request(RewardStatus::Pending, None)).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_reject_needs_reason() {
        assert!(command_for(request(RewardStatus::Rejected, None)).is_err());
        assert!(command_for(request(RewardStatus::Rejected, Some("  "))).is_err());
        assert_eq!(
            command_for(request(RewardStatus::Rejected, Some("spam"))).unwrap(),
            RewardCommand::Reject {
                reason: "spam".to_string()
            }
        );
    }

    #[test]
    fn test_status_maps_to_command() {
        assert_eq!(
            command_for(request(RewardStatus::Approved, None)).unwrap(),
            RewardCommand::Approve
        );
        assert_eq!(
            command_for(request(RewardStatus::Cancelled, None))
                .unwrap()
                .target(),
            RewardStatus::Cancelled
        );
    }
}
