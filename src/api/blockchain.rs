//! Blockchain endpoints
//!
//! Endpoints:
//!   POST /process-reward                -> Pay a reward on chain (admin)
//!   POST /verify-creator                -> Stake and verify a creator (admin)
//!   POST /sync-earnings/{creator_id}    -> Copy on-chain earnings
//!   GET  /stats                         -> Contract platform stats
//!   GET  /verify-transaction/{hash}     -> Receipt status check
//!   POST /add-reward-tokens             -> Fund the contract (admin)
//!   GET  /contract-balance              -> Token balance held by the contract
//!   GET  /token-address                 -> Reward token address

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use uuid::Uuid;

use crate::api::{AdminAccess, ApiState};
use crate::blockchain::{PaymentOutcome, PlatformStats};
use crate::error::AppResult;

#[derive(Debug, Deserialize)]
pub struct ProcessRewardRequest {
    pub reward_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct VerifyCreatorRequest {
    pub creator_id: Uuid,
    pub stake_amount: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct AddTokensRequest {
    pub amount: Decimal,
}

#[derive(Debug, Serialize)]
pub struct TransactionCheck {
    pub transaction_hash: String,
    pub is_valid: bool,
    pub message: &'static str,
}

async fn process_reward(
    State(state): State<ApiState>,
    admin: AdminAccess,
    Json(request): Json<ProcessRewardRequest>,
) -> Json<PaymentOutcome> {
    Json(
        state
            .blockchain
            .process_reward_payment(request.reward_id, admin.actor)
            .await,
    )
}

async fn verify_creator(
    State(state): State<ApiState>,
    _admin: AdminAccess,
    Json(request): Json<VerifyCreatorRequest>,
) -> Json<PaymentOutcome> {
    Json(
        state
            .blockchain
            .verify_creator_on_chain(request.creator_id, request.stake_amount)
            .await,
    )
}

async fn sync_earnings(
    State(state): State<ApiState>,
    Path(creator_id): Path<Uuid>,
) -> AppResult<Json<Value>> {
    let earnings = state.blockchain.sync_creator_earnings(creator_id).await?;
    Ok(Json(json!({
        "creator_id": creator_id,
        "blockchain_earnings": earnings,
    })))
}

async fn platform_stats(State(state): State<ApiState>) -> AppResult<Json<PlatformStats>> {
    Ok(Json(state.blockchain.platform_stats().await?))
}

async fn verify_transaction(
    State(state): State<ApiState>,
    Path(hash): Path<String>,
) -> Json<TransactionCheck> {
    let is_valid = state.blockchain.verify_transaction(&hash).await;
    Json(TransactionCheck {
        transaction_hash: hash,
        is_valid,
        message: if is_valid {
            "Transaction is valid"
        } else {
            "Transaction is invalid or failed"
        },
    })
}

async fn add_reward_tokens(
    State(state): State<ApiState>,
    admin: AdminAccess,
    Json(request): Json<AddTokensRequest>,
) -> Json<PaymentOutcome> {
    Json(
        state
            .blockchain
            .add_reward_tokens(request.amount, admin.actor)
            .await,
    )
}

async fn contract_balance(State(state): State<ApiState>) -> AppResult<Json<Value>> {
    let balance = state.blockchain.contract_balance().await?;
    Ok(Json(json!({ "balance": balance })))
}

async fn token_address(State(state): State<ApiState>) -> AppResult<Json<Value>> {
    let address = state.blockchain.token_address().await?;
    Ok(Json(json!({ "token_address": address })))
}

pub fn create_router(state: ApiState) -> Router {
    Router::new()
        .route("/process-reward", post(process_reward))
        .route("/verify-creator", post(verify_creator))
        .route("/sync-earnings/{creator_id}", post(sync_earnings))
        .route("/stats", get(platform_stats))
        .route("/verify-transaction/{hash}", get(verify_transaction))
        .route("/add-reward-tokens", post(add_reward_tokens))
        .route("/contract-balance", get(contract_balance))
        .route("/token-address", get(token_address))
        .with_state(state)
}
