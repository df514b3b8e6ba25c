//! Transaction endpoints
//!
//! Endpoints:
//!   GET /?user_id   -> List transactions, newest first
//!   GET /{id}       -> Get transaction

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::api::ApiState;
use crate::error::AppResult;
use crate::models::Transaction;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub user_id: Option<Uuid>,
}

async fn list_transactions(
    State(state): State<ApiState>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Vec<Transaction>>> {
    Ok(Json(state.transactions.list(query.user_id).await?))
}

async fn get_transaction(
    State(state): State<ApiState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Transaction>> {
    Ok(Json(state.transactions.find(id).await?))
}

pub fn create_router(state: ApiState) -> Router {
    Router::new()
        .route("/", get(list_transactions))
        .route("/{id}", get(get_transaction))
        .with_state(state)
}
