//! HTTP API for the rewards service
//!
//! Provides REST APIs for:
//! - Users, creators and content
//! - Engagement tracking
//! - The reward ledger and the automatic sweep
//! - Transactions and blockchain payouts
//! - Audit history
//! - Security middleware (auth, rate limiting, headers)

pub mod audit;
pub mod blockchain;
pub mod content;
pub mod creators;
pub mod engagements;
pub mod identity;
pub mod middleware;
pub mod rewards;
pub mod transactions;
pub mod users;

use axum::{Json, Router, middleware as axum_middleware, routing::get};
use serde_json::json;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::audit::AuditLogger;
use crate::blockchain::{ContractGateway, SmartContractService};
use crate::database::Store;
use crate::rewards::{RewardLedger, RewardSweeper, ScoringConfig, TransitionPolicy};
use crate::services::{ContentService, CreatorService, TransactionService, UserService};

pub use identity::{AdminAccess, RequestIdentity};
pub use middleware::{
    RateLimiter, SecurityMiddlewareConfig, SecurityState, auth_middleware, body_size_middleware,
    logging_middleware, rate_limit_middleware, security_headers_middleware,
};

/// Services shared by every router
#[derive(Clone)]
pub struct ApiState {
    pub users: Arc<UserService>,
    pub creators: Arc<CreatorService>,
    pub content: Arc<ContentService>,
    pub transactions: Arc<TransactionService>,
    pub ledger: Arc<RewardLedger>,
    pub sweeper: Arc<RewardSweeper>,
    pub blockchain: Arc<SmartContractService>,
    pub audit: Arc<AuditLogger>,
    pub admin_api_key: Option<String>,
}

impl ApiState {
    /// Wires every service over one store.
    pub fn new(
        store: Arc<dyn Store>,
        scoring: ScoringConfig,
        policy: TransitionPolicy,
        gateway: Arc<dyn ContractGateway>,
        admin_api_key: Option<String>,
    ) -> Self {
        let audit = Arc::new(AuditLogger::new().with_store(store.clone()));
        let users = Arc::new(UserService::new(store.clone(), audit.clone()));
        let creators = Arc::new(CreatorService::new(store.clone(), audit.clone()));
        let content = Arc::new(ContentService::new(
            store.clone(),
            creators.clone(),
            audit.clone(),
        ));
        let transactions = Arc::new(TransactionService::new(store.clone()));
        let ledger = Arc::new(RewardLedger::new(
            store.clone(),
            scoring,
            policy,
            audit.clone(),
        ));
        let sweeper = Arc::new(RewardSweeper::new(store.clone(), ledger.clone()));
        let blockchain = Arc::new(SmartContractService::new(
            gateway,
            store,
            ledger.clone(),
            creators.clone(),
            transactions.clone(),
            audit.clone(),
        ));

        Self {
            users,
            creators,
            content,
            transactions,
            ledger,
            sweeper,
            blockchain,
            audit,
            admin_api_key: admin_api_key.filter(|k| !k.is_empty()),
        }
    }
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok", "service": env!("CARGO_PKG_NAME") }))
}

/// Full application router with security middleware applied
pub fn create_app(state: ApiState, security: SecurityState) -> Router {
    Router::new()
        .nest("/users", users::create_router(state.clone()))
        .nest("/creators", creators::create_router(state.clone()))
        .nest("/content", content::create_router(state.clone()))
        .nest("/engagements", engagements::create_router(state.clone()))
        .nest("/rewards", rewards::create_router(state.clone()))
        .nest("/transactions", transactions::create_router(state.clone()))
        .nest("/blockchain", blockchain::create_router(state.clone()))
        .nest("/audit", audit::create_router(state))
        .route("/health", get(health))
        // order matters: the last layer runs first
        .layer(axum_middleware::from_fn_with_state(
            security.clone(),
            body_size_middleware,
        ))
        .layer(axum_middleware::from_fn_with_state(
            security.clone(),
            auth_middleware,
        ))
        .layer(axum_middleware::from_fn_with_state(
            security.clone(),
            rate_limit_middleware,
        ))
        .layer(axum_middleware::from_fn_with_state(
            security,
            logging_middleware,
        ))
        .layer(axum_middleware::from_fn(security_headers_middleware))
        .layer(TraceLayer::new_for_http())
}
