//! Database Connection Pool using sqlx

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::str::FromStr;
use tracing::info;
use uuid::Uuid;

use crate::database::audit::AuditRepository;
use crate::database::content::ContentRepository;
use crate::database::creators::CreatorRepository;
use crate::database::engagements::EngagementRepository;
use crate::database::rewards::RewardRepository;
use crate::database::transactions::TransactionRepository;
use crate::database::users::UserRepository;
use crate::database::{
    AppliedTransition, ContentClaim, ContentFilter, RewardFilter, Store, TransitionPlanner,
};
use crate::error::{AppError, AppResult};
use crate::models::{
    AuditLog, Content, Creator, CreatorBalance, Engagement, Reward, Transaction, User,
};

/// Parse a text column into one of the model enums.
pub(crate) fn parse_text<T>(value: String) -> AppResult<T>
where
    T: FromStr<Err = String>,
{
    value.parse().map_err(AppError::Database)
}

const SCHEMA: &[(&str, &str)] = &[
    (
        "users",
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id UUID PRIMARY KEY,
            email TEXT NOT NULL UNIQUE,
            username TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL,
            first_name TEXT,
            last_name TEXT,
            role TEXT NOT NULL DEFAULT 'user',
            status TEXT NOT NULL DEFAULT 'pending',
            profile_image TEXT,
            bio TEXT,
            phone_number TEXT,
            wallet_address TEXT,
            email_verified_at TIMESTAMPTZ,
            last_login_at TIMESTAMPTZ,
            metadata JSONB,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    ),
    (
        "creators",
        r#"
        CREATE TABLE IF NOT EXISTS creators (
            id UUID PRIMARY KEY,
            user_id UUID NOT NULL UNIQUE REFERENCES users(id) ON DELETE CASCADE,
            creator_code TEXT NOT NULL UNIQUE,
            status TEXT NOT NULL DEFAULT 'pending_verification',
            tier TEXT NOT NULL DEFAULT 'bronze',
            total_earnings NUMERIC(14, 2) NOT NULL DEFAULT 0 CHECK (total_earnings >= 0),
            pending_earnings NUMERIC(14, 2) NOT NULL DEFAULT 0 CHECK (pending_earnings >= 0),
            total_content BIGINT NOT NULL DEFAULT 0,
            total_views BIGINT NOT NULL DEFAULT 0,
            total_likes BIGINT NOT NULL DEFAULT 0,
            total_shares BIGINT NOT NULL DEFAULT 0,
            engagement_rate NUMERIC(10, 2) NOT NULL DEFAULT 0,
            social_media_links JSONB,
            content_categories TEXT[] NOT NULL DEFAULT '{}',
            analytics JSONB,
            verified_at TIMESTAMPTZ,
            last_active_at TIMESTAMPTZ,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    ),
    (
        "content",
        r#"
        CREATE TABLE IF NOT EXISTS content (
            id UUID PRIMARY KEY,
            creator_id UUID NOT NULL REFERENCES creators(id) ON DELETE CASCADE,
            title TEXT NOT NULL,
            description TEXT,
            content_type TEXT NOT NULL,
            platform TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'draft',
            external_id TEXT,
            external_url TEXT,
            thumbnail_url TEXT,
            content_url TEXT,
            views BIGINT NOT NULL DEFAULT 0,
            likes BIGINT NOT NULL DEFAULT 0,
            shares BIGINT NOT NULL DEFAULT 0,
            comments BIGINT NOT NULL DEFAULT 0,
            duration INTEGER,
            tags TEXT[] NOT NULL DEFAULT '{}',
            categories TEXT[] NOT NULL DEFAULT '{}',
            metadata JSONB,
            engagement_rate NUMERIC(10, 2) NOT NULL DEFAULT 0,
            reward_amount NUMERIC(14, 2) NOT NULL DEFAULT 0,
            published_at TIMESTAMPTZ,
            last_analyzed_at TIMESTAMPTZ,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    ),
    (
        "content_unrewarded_idx",
        "CREATE INDEX IF NOT EXISTS content_unrewarded_idx ON content (status, reward_amount)",
    ),
    (
        "engagements",
        r#"
        CREATE TABLE IF NOT EXISTS engagements (
            id UUID PRIMARY KEY,
            user_id UUID,
            content_id UUID NOT NULL REFERENCES content(id) ON DELETE CASCADE,
            engagement_type TEXT NOT NULL,
            ip_address TEXT,
            user_agent TEXT,
            referrer TEXT,
            metadata JSONB,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    ),
    (
        "rewards",
        r#"
        CREATE TABLE IF NOT EXISTS rewards (
            id UUID PRIMARY KEY,
            creator_id UUID NOT NULL REFERENCES creators(id),
            user_id UUID NOT NULL,
            content_id UUID REFERENCES content(id) ON DELETE SET NULL,
            reward_type TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'pending',
            amount NUMERIC(14, 2) NOT NULL CHECK (amount >= 0),
            currency TEXT NOT NULL DEFAULT 'USD',
            description TEXT,
            criteria JSONB NOT NULL,
            metadata JSONB NOT NULL DEFAULT '{}',
            approved_at TIMESTAMPTZ,
            paid_at TIMESTAMPTZ,
            transaction_reference TEXT,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    ),
    (
        "rewards_creator_idx",
        "CREATE INDEX IF NOT EXISTS rewards_creator_idx ON rewards (creator_id, created_at DESC)",
    ),
    (
        "transactions",
        r#"
        CREATE TABLE IF NOT EXISTS transactions (
            id UUID PRIMARY KEY,
            user_id UUID NOT NULL,
            transaction_type TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'pending',
            amount NUMERIC(14, 2) NOT NULL,
            currency TEXT NOT NULL DEFAULT 'USD',
            payment_method TEXT,
            external_transaction_id TEXT,
            description TEXT,
            metadata JSONB,
            failure_reason TEXT,
            processed_at TIMESTAMPTZ,
            completed_at TIMESTAMPTZ,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    ),
    (
        "audit_logs",
        r#"
        CREATE TABLE IF NOT EXISTS audit_logs (
            id UUID PRIMARY KEY,
            user_id UUID,
            entity_type TEXT NOT NULL,
            entity_id UUID,
            action TEXT NOT NULL,
            old_values JSONB,
            new_values JSONB,
            ip_address TEXT,
            description TEXT,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    ),
];

pub struct DatabasePool {
    pool: PgPool,
    users: UserRepository,
    creators: CreatorRepository,
    content: ContentRepository,
    engagements: EngagementRepository,
    rewards: RewardRepository,
    transactions: TransactionRepository,
    audit: AuditRepository,
}

impl DatabasePool {
    pub async fn new(connection_string: &str, max_connections: u32) -> AppResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(connection_string)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to PostgreSQL: {}", e)))?;

        info!(max_connections, "Connected to PostgreSQL");

        Ok(Self {
            users: UserRepository::new(pool.clone()),
            creators: CreatorRepository::new(pool.clone()),
            content: ContentRepository::new(pool.clone()),
            engagements: EngagementRepository::new(pool.clone()),
            rewards: RewardRepository::new(pool.clone()),
            transactions: TransactionRepository::new(pool.clone()),
            audit: AuditRepository::new(pool.clone()),
            pool,
        })
    }

    pub async fn init_schema(&self) -> AppResult<()> {
        info!("Initializing database schema...");

        for (name, ddl) in SCHEMA {
            sqlx::query(ddl).execute(&self.pool).await.map_err(|e| {
                AppError::Database(format!("Failed to create {}: {}", name, e))
            })?;
        }

        info!("Database schema initialized");
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Store for DatabasePool {
    async fn insert_user(&self, user: &User) -> AppResult<()> {
        self.users.insert(user).await
    }

    async fn get_user(&self, id: Uuid) -> AppResult<Option<User>> {
        self.users.get(id).await
    }

    async fn list_users(&self) -> AppResult<Vec<User>> {
        self.users.list().await
    }

    async fn update_user(&self, user: &User) -> AppResult<()> {
        self.users.update(user).await
    }

    async fn delete_user(&self, id: Uuid) -> AppResult<bool> {
        self.users.delete(id).await
    }

    async fn insert_creator(&self, creator: &Creator) -> AppResult<()> {
        self.creators.insert(creator).await
    }

    async fn get_creator(&self, id: Uuid) -> AppResult<Option<Creator>> {
        self.creators.get(id).await
    }

    async fn get_creator_by_user(&self, user_id: Uuid) -> AppResult<Option<Creator>> {
        self.creators.get_by_user(user_id).await
    }

    async fn get_creator_by_code(&self, code: &str) -> AppResult<Option<Creator>> {
        self.creators.get_by_code(code).await
    }

    async fn list_creators(&self) -> AppResult<Vec<Creator>> {
        self.creators.list().await
    }

    async fn update_creator(&self, creator: &Creator) -> AppResult<()> {
        self.creators.update_profile(creator).await
    }

    async fn delete_creator(&self, id: Uuid) -> AppResult<bool> {
        self.creators.delete(id).await
    }

    async fn search_creators(&self, query: &str) -> AppResult<Vec<Creator>> {
        self.creators.search(query).await
    }

    async fn top_creators(&self, limit: usize) -> AppResult<Vec<Creator>> {
        self.creators.top(limit).await
    }

    async fn insert_content(&self, content: &Content) -> AppResult<()> {
        self.content.insert(content).await
    }

    async fn get_content(&self, id: Uuid) -> AppResult<Option<Content>> {
        self.content.get(id).await
    }

    async fn list_content(&self, filter: &ContentFilter) -> AppResult<Vec<Content>> {
        self.content.list(filter).await
    }

    async fn update_content(&self, content: &Content) -> AppResult<()> {
        self.content.update(content).await
    }

    async fn delete_content(&self, id: Uuid) -> AppResult<bool> {
        self.content.delete(id).await
    }

    async fn search_content(&self, query: &str) -> AppResult<Vec<Content>> {
        self.content.search(query).await
    }

    async fn top_content(
        &self,
        limit: usize,
        published_since: Option<DateTime<Utc>>,
    ) -> AppResult<Vec<Content>> {
        self.content.top(limit, published_since).await
    }

    async fn list_unrewarded_content(&self) -> AppResult<Vec<Content>> {
        self.content.list_unrewarded().await
    }

    async fn insert_engagement(&self, engagement: &Engagement) -> AppResult<()> {
        self.engagements.insert(engagement).await
    }

    async fn list_engagements(&self, content_id: Uuid) -> AppResult<Vec<Engagement>> {
        self.engagements.list_for_content(content_id).await
    }

    async fn insert_reward(&self, reward: &Reward) -> AppResult<CreatorBalance> {
        self.rewards.insert(reward).await
    }

    async fn insert_content_reward(
        &self,
        reward: &Reward,
        claim: ContentClaim,
    ) -> AppResult<Option<CreatorBalance>> {
        self.rewards.insert_for_content(reward, claim).await
    }

    async fn transition_reward(
        &self,
        id: Uuid,
        planner: TransitionPlanner<'_>,
    ) -> AppResult<AppliedTransition> {
        self.rewards.transition(id, planner).await
    }

    async fn get_reward(&self, id: Uuid) -> AppResult<Option<Reward>> {
        self.rewards.get(id).await
    }

    async fn list_rewards(&self, filter: &RewardFilter) -> AppResult<Vec<Reward>> {
        self.rewards.list(filter).await
    }

    async fn insert_transaction(&self, transaction: &Transaction) -> AppResult<()> {
        self.transactions.insert(transaction).await
    }

    async fn get_transaction(&self, id: Uuid) -> AppResult<Option<Transaction>> {
        self.transactions.get(id).await
    }

    async fn list_transactions(&self, user_id: Option<Uuid>) -> AppResult<Vec<Transaction>> {
        self.transactions.list(user_id).await
    }

    async fn insert_audit_log(&self, entry: &AuditLog) -> AppResult<()> {
        self.audit.insert(entry).await
    }

    async fn list_audit_logs(&self, limit: usize) -> AppResult<Vec<AuditLog>> {
        self.audit.recent(limit).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RewardStatus, UserRole};

    #[test]
    fn test_parse_text_round_trips_enum_columns() {
        let status: RewardStatus = parse_text("approved".to_string()).unwrap();
        assert_eq!(status, RewardStatus::Approved);
        let role: UserRole = parse_text("admin".to_string()).unwrap();
        assert_eq!(role, UserRole::Admin);
    }

    #[test]
    fn test_parse_text_rejects_unknown_values() {
        let err = parse_text::<RewardStatus>("settled".to_string()).unwrap_err();
        assert!(matches!(err, AppError::Database(_)));
    }

    #[test]
    fn test_schema_has_every_table() {
        let names: Vec<&str> = SCHEMA.iter().map(|(name, _)| *name).collect();
        for table in [
            "users",
            "creators",
            "content",
            "engagements",
            "rewards",
            "transactions",
            "audit_logs",
        ] {
            assert!(names.contains(&table), "missing table {}", table);
        }
    }
}
