//! Caller identity extractors
//!
//! `x-user-id` names the acting user. `x-admin-key` unlocks admin-only
//! operations when it matches the configured admin key.

use axum::extract::{FromRequestParts, OptionalFromRequestParts};
use axum::http::request::Parts;
use uuid::Uuid;

use crate::api::ApiState;
use crate::error::AppError;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const ADMIN_KEY_HEADER: &str = "x-admin-key";

/// The user a request acts for
#[derive(Debug, Clone, Copy)]
pub struct RequestIdentity {
    pub user_id: Uuid,
}

fn identity_from_parts(parts: &Parts) -> Result<Option<RequestIdentity>, AppError> {
    let Some(value) = parts.headers.get(USER_ID_HEADER) else {
        return Ok(None);
    };
    let user_id = value
        .to_str()
        .ok()
        .and_then(|v| Uuid::parse_str(v.trim()).ok())
        .ok_or_else(|| AppError::Unauthorized("x-user-id must be a UUID".to_string()))?;
    Ok(Some(RequestIdentity { user_id }))
}

impl<S: Send + Sync> FromRequestParts<S> for RequestIdentity {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        identity_from_parts(parts)?
            .ok_or_else(|| AppError::Unauthorized("x-user-id header required".to_string()))
    }
}

impl<S: Send + Sync> OptionalFromRequestParts<S> for RequestIdentity {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> Result<Option<Self>, Self::Rejection> {
        identity_from_parts(parts)
    }
}

/// Proof the caller holds the admin key
#[derive(Debug, Clone, Copy)]
pub struct AdminAccess {
    /// Acting user, when the admin also sent `x-user-id`
    pub actor: Option<Uuid>,
}

impl FromRequestParts<ApiState> for AdminAccess {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ApiState,
    ) -> Result<Self, Self::Rejection> {
        let Some(expected) = state.admin_api_key.as_deref() else {
            return Err(AppError::Forbidden(
                "Admin API key not configured".to_string(),
            ));
        };
        let provided = parts
            .headers
            .get(ADMIN_KEY_HEADER)
            .and_then(|v| v.to_str().ok());
        if provided != Some(expected) {
            return Err(AppError::Forbidden("Admin access required".to_string()));
        }
        let actor = identity_from_parts(parts)?.map(|identity| identity.user_id);
        Ok(AdminAccess { actor })
    }
}
