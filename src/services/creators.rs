//! Creator profiles
//!
//! Everything about a creator except the balance, which only the reward
//! ledger writes.

use chrono::Utc;
use rand::Rng;
use rand::distributions::Alphanumeric;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::audit::{AuditLogger, AuditSeverity};
use crate::database::Store;
use crate::error::{AppError, AppResult};
use crate::models::{AuditAction, AuditLog, Creator, CreatorStatus, CreatorTier, SocialMediaLinks};

pub const DEFAULT_TOP_LIMIT: usize = 10;
const CODE_PREFIX: &str = "CR";
const CODE_SUFFIX_LEN: usize = 8;
const MAX_CODE_ATTEMPTS: usize = 16;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateCreator {
    pub user_id: Uuid,
    #[serde(default)]
    pub content_categories: Vec<String>,
    pub social_media_links: Option<SocialMediaLinks>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateCreator {
    pub content_categories: Option<Vec<String>>,
    pub social_media_links: Option<SocialMediaLinks>,
    pub analytics: Option<serde_json::Value>,
}

/// Counter deltas reported by a platform sync
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct CreatorStatsDelta {
    #[serde(default)]
    pub views: i64,
    #[serde(default)]
    pub likes: i64,
    #[serde(default)]
    pub shares: i64,
    #[serde(default)]
    pub content: i64,
}

/// Adds a signed delta to a counter. Counters never go below zero.
pub(crate) fn apply_counter(current: i64, delta: i64, field: &str) -> AppResult<i64> {
    match current.checked_add(delta) {
        Some(value) if value >= 0 => Ok(value),
        Some(_) => Err(AppError::validation(format!("{} cannot go below zero", field))),
        None => Err(AppError::validation(format!("{} delta is out of range", field))),
    }
}

impl CreatorStatsDelta {
    fn apply(&self, creator: &mut Creator) -> AppResult<()> {
        creator.total_views = apply_counter(creator.total_views, self.views, "views")?;
        creator.total_likes = apply_counter(creator.total_likes, self.likes, "likes")?;
        creator.total_shares = apply_counter(creator.total_shares, self.shares, "shares")?;
        creator.total_content = apply_counter(creator.total_content, self.content, "content")?;
        Ok(())
    }
}

fn generate_creator_code() -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(CODE_SUFFIX_LEN)
        .map(|b| (b as char).to_ascii_uppercase())
        .collect();
    format!("{}{}", CODE_PREFIX, suffix)
}

pub struct CreatorService {
    store: Arc<dyn Store>,
    audit: Arc<AuditLogger>,
}

impl CreatorService {
    pub fn new(store: Arc<dyn Store>, audit: Arc<AuditLogger>) -> Self {
        Self { store, audit }
    }

    pub async fn create(&self, request: CreateCreator) -> AppResult<Creator> {
        if self.store.get_user(request.user_id).await?.is_none() {
            return Err(AppError::not_found("User"));
        }
        if self
            .store
            .get_creator_by_user(request.user_id)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(
                "Creator profile already exists for this user".to_string(),
            ));
        }

        let code = self.unique_code().await?;
        let mut creator = Creator::new(request.user_id, code);
        creator.content_categories = request.content_categories;
        creator.social_media_links = request.social_media_links;
        self.store.insert_creator(&creator).await?;

        info!(
            creator_id = %creator.id,
            user_id = %creator.user_id,
            creator_code = %creator.creator_code,
            "Creator profile created"
        );
        self.audit
            .log(
                AuditLog::new(AuditAction::Create, "creator", Some(creator.id))
                    .with_user(Some(creator.user_id)),
                AuditSeverity::Info,
            )
            .await;
        Ok(creator)
    }

    async fn unique_code(&self) -> AppResult<String> {
        for _ in 0..MAX_CODE_ATTEMPTS {
            let code = generate_creator_code();
            if self.store.get_creator_by_code(&code).await?.is_none() {
                return Ok(code);
            }
            warn!(creator_code = %code, "Creator code collision, regenerating");
        }
        Err(AppError::Internal(
            "could not generate a unique creator code".to_string(),
        ))
    }

    pub async fn list(&self) -> AppResult<Vec<Creator>> {
        self.store.list_creators().await
    }

    pub async fn find(&self, id: Uuid) -> AppResult<Creator> {
        self.store
            .get_creator(id)
            .await?
            .ok_or_else(|| AppError::not_found("Creator"))
    }

    pub async fn find_by_user(&self, user_id: Uuid) -> AppResult<Creator> {
        self.store
            .get_creator_by_user(user_id)
            .await?
            .ok_or_else(|| AppError::not_found("Creator profile"))
    }

    pub async fn find_by_code(&self, code: &str) -> AppResult<Creator> {
        self.store
            .get_creator_by_code(code)
            .await?
            .ok_or_else(|| AppError::not_found("Creator"))
    }

    pub async fn search(&self, query: &str) -> AppResult<Vec<Creator>> {
        let query = query.trim();
        if query.is_empty() {
            return Err(AppError::validation("search query is required"));
        }
        self.store.search_creators(query).await
    }

    pub async fn top(&self, limit: Option<usize>) -> AppResult<Vec<Creator>> {
        self.store
            .top_creators(limit.unwrap_or(DEFAULT_TOP_LIMIT))
            .await
    }

    pub async fn update(&self, id: Uuid, changes: UpdateCreator) -> AppResult<Creator> {
        let mut creator = self.find(id).await?;
        if let Some(categories) = changes.content_categories {
            creator.content_categories = categories;
        }
        if let Some(links) = changes.social_media_links {
            creator.social_media_links = Some(links);
        }
        if let Some(analytics) = changes.analytics {
            creator.analytics = Some(analytics);
        }
        creator.updated_at = Utc::now();
        self.store.update_creator(&creator).await?;
        Ok(creator)
    }

    pub async fn update_status(&self, id: Uuid, status: CreatorStatus) -> AppResult<Creator> {
        let mut creator = self.find(id).await?;
        let previous = creator.status;
        let now = Utc::now();
        creator.status = status;
        if status == CreatorStatus::Verified {
            creator.verified_at = Some(now);
        }
        creator.updated_at = now;
        self.store.update_creator(&creator).await?;

        info!(creator_id = %id, from = %previous, to = %status, "Creator status changed");
        self.audit
            .log(
                AuditLog::new(AuditAction::Update, "creator", Some(id)).with_values(
                    Some(serde_json::json!({ "status": previous })),
                    Some(serde_json::json!({ "status": status })),
                ),
                AuditSeverity::Info,
            )
            .await;
        Ok(creator)
    }

    pub async fn update_tier(&self, id: Uuid, tier: CreatorTier) -> AppResult<Creator> {
        if !tier.is_known() {
            return Err(AppError::validation(
                "tier must be one of bronze, silver, gold, platinum",
            ));
        }
        let mut creator = self.find(id).await?;
        creator.tier = tier;
        creator.updated_at = Utc::now();
        self.store.update_creator(&creator).await?;
        info!(creator_id = %id, tier = %tier, "Creator tier changed");
        Ok(creator)
    }

    pub async fn update_stats(&self, id: Uuid, delta: CreatorStatsDelta) -> AppResult<Creator> {
        let mut creator = self.find(id).await?;
        delta.apply(&mut creator)?;
        creator.recompute_engagement_rate();
        let now = Utc::now();
        creator.last_active_at = Some(now);
        creator.updated_at = now;
        self.store.update_creator(&creator).await?;
        Ok(creator)
    }

    pub async fn remove(&self, id: Uuid) -> AppResult<()> {
        if !self.store.delete_creator(id).await? {
            return Err(AppError::not_found("Creator"));
        }
        info!(creator_id = %id, "Creator removed");
        self.audit
            .log(
                AuditLog::new(AuditAction::Delete, "creator", Some(id)),
                AuditSeverity::Warning,
            )
            .await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryStore;
    use crate::services::users::{CreateUser, UserService};
    use rust_decimal::Decimal;

    async fn setup() -> (CreatorService, Uuid) {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let audit = Arc::new(AuditLogger::new());
        let user = UserService::new(store.clone(), audit.clone())
            .create(CreateUser {
                email: "maker@example.com".to_string(),
                username: "maker".to_string(),
                password: "sesame-open".to_string(),
                first_name: Some("Mia".to_string()),
                last_name: Some("Maker".to_string()),
                phone_number: None,
                bio: None,
                role: None,
                wallet_address: None,
            })
            .await
            .unwrap();
        (CreatorService::new(store, audit), user.id)
    }

    fn request(user_id: Uuid) -> CreateCreator {
        CreateCreator {
            user_id,
            content_categories: vec!["music".to_string()],
            social_media_links: None,
        }
    }

    #[test]
    fn test_creator_code_shape() {
        let code = generate_creator_code();
        assert_eq!(code.len(), 10);
        assert!(code.starts_with("CR"));
        assert!(
            code[2..]
                .chars()
                .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
        );
    }

    #[tokio::test]
    async fn test_one_creator_per_user() {
        let (creators, user_id) = setup().await;
        let creator = creators.create(request(user_id)).await.unwrap();
        assert_eq!(creator.status, CreatorStatus::PendingVerification);
        assert_eq!(creator.tier, CreatorTier::Bronze);

        let err = creators.create(request(user_id)).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        let err = creators.create(request(Uuid::new_v4())).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_verify_and_search() {
        let (creators, user_id) = setup().await;
        let creator = creators.create(request(user_id)).await.unwrap();

        let verified = creators
            .update_status(creator.id, CreatorStatus::Verified)
            .await
            .unwrap();
        assert!(verified.verified_at.is_some());
        assert_eq!(creators.top(None).await.unwrap().len(), 1);

        assert_eq!(creators.search("MIA").await.unwrap().len(), 1);
        assert!(creators.search("nobody").await.unwrap().is_empty());
        let by_code = creators.find_by_code(&creator.creator_code).await.unwrap();
        assert_eq!(by_code.id, creator.id);
    }

    #[tokio::test]
    async fn test_update_stats_recomputes_rate() {
        let (creators, user_id) = setup().await;
        let creator = creators.create(request(user_id)).await.unwrap();
        let updated = creators
            .update_stats(
                creator.id,
                CreatorStatsDelta {
                    views: 100,
                    likes: 5,
                    shares: 5,
                    content: 1,
                },
            )
            .await
            .unwrap();
        // (5 + 5 + 10) / 100 * 100
        assert_eq!(updated.engagement_rate, Decimal::from(20));
        assert_eq!(updated.total_content, 1);
        assert!(updated.last_active_at.is_some());
        assert_eq!(updated.balance.pending_earnings, Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_update_stats_rejects_negative_totals() {
        let (creators, user_id) = setup().await;
        let creator = creators.create(request(user_id)).await.unwrap();
        let err = creators
            .update_stats(
                creator.id,
                CreatorStatsDelta {
                    views: -1,
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(creators.find(creator.id).await.unwrap().total_views, 0);
    }

    #[test]
    fn test_apply_counter_bounds() {
        assert_eq!(apply_counter(10, -4, "views").unwrap(), 6);
        assert!(apply_counter(3, -4, "views").is_err());
        assert!(apply_counter(1, i64::MAX, "views").is_err());
    }

    #[tokio::test]
    async fn test_unknown_tier_rejected() {
        let (creators, user_id) = setup().await;
        let creator = creators.create(request(user_id)).await.unwrap();
        let err = creators
            .update_tier(creator.id, CreatorTier::Other)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
