//! Persistence
//!
//! The `Store` trait is the only way services reach persistent state.
//! `DatabasePool` implements it on PostgreSQL with sqlx; `MemoryStore` keeps
//! everything in process for local runs and tests.
//!
//! Creator balances and content reward stamps are written only by the reward
//! methods (`insert_reward`, `insert_content_reward`, `transition_reward`), each
//! of which applies the reward row and the balance change atomically.

pub mod audit;
pub mod content;
pub mod creators;
pub mod engagements;
pub mod memory;
pub mod pool;
pub mod rewards;
pub mod transactions;
pub mod users;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::{
    AuditLog, Content, ContentStatus, Creator, CreatorBalance, Engagement, Platform, Reward,
    RewardStatus, Transaction, User,
};
use crate::rewards::RewardUpdate;

pub use memory::MemoryStore;
pub use pool::DatabasePool;

#[derive(Debug, Clone, Default)]
pub struct ContentFilter {
    pub creator_id: Option<Uuid>,
    pub status: Option<ContentStatus>,
    pub platform: Option<Platform>,
}

impl ContentFilter {
    pub fn matches(&self, content: &Content) -> bool {
        self.creator_id.is_none_or(|id| content.creator_id == id)
            && self.status.is_none_or(|s| content.status == s)
            && self.platform.is_none_or(|p| content.platform == p)
    }
}

#[derive(Debug, Clone, Default)]
pub struct RewardFilter {
    pub creator_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
    pub status: Option<RewardStatus>,
    pub since: Option<DateTime<Utc>>,
}

impl RewardFilter {
    pub fn matches(&self, reward: &Reward) -> bool {
        self.creator_id.is_none_or(|id| reward.creator_id == id)
            && self.user_id.is_none_or(|id| reward.user_id == id)
            && self.status.is_none_or(|s| reward.status == s)
            && self.since.is_none_or(|since| reward.created_at >= since)
    }
}

/// How a content reward claims its content item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentClaim {
    /// Only while the item's reward stamp is still zero; otherwise nothing is written
    IfUnrewarded,
    /// Overwrite the stamp unconditionally
    Always,
}

/// Outcome of a committed reward transition
#[derive(Debug, Clone)]
pub struct AppliedTransition {
    pub previous: RewardStatus,
    pub reward: Reward,
    pub balance: CreatorBalance,
}

/// Computes the next state of a reward from its locked current state
pub type TransitionPlanner<'a> = &'a (dyn Fn(&Reward) -> AppResult<RewardUpdate> + Send + Sync);

#[async_trait]
pub trait Store: Send + Sync {
    // users
    async fn insert_user(&self, user: &User) -> AppResult<()>;
    async fn get_user(&self, id: Uuid) -> AppResult<Option<User>>;
    async fn list_users(&self) -> AppResult<Vec<User>>;
    async fn update_user(&self, user: &User) -> AppResult<()>;
    async fn delete_user(&self, id: Uuid) -> AppResult<bool>;

    // creators
    async fn insert_creator(&self, creator: &Creator) -> AppResult<()>;
    async fn get_creator(&self, id: Uuid) -> AppResult<Option<Creator>>;
    async fn get_creator_by_user(&self, user_id: Uuid) -> AppResult<Option<Creator>>;
    async fn get_creator_by_code(&self, code: &str) -> AppResult<Option<Creator>>;
    async fn list_creators(&self) -> AppResult<Vec<Creator>>;
    /// Writes every field except the balance.
    async fn update_creator(&self, creator: &Creator) -> AppResult<()>;
    async fn delete_creator(&self, id: Uuid) -> AppResult<bool>;
    /// Case-insensitive match on creator code, username and names.
    async fn search_creators(&self, query: &str) -> AppResult<Vec<Creator>>;
    /// Verified creators by total earnings, highest first.
    async fn top_creators(&self, limit: usize) -> AppResult<Vec<Creator>>;

    // content
    async fn insert_content(&self, content: &Content) -> AppResult<()>;
    async fn get_content(&self, id: Uuid) -> AppResult<Option<Content>>;
    async fn list_content(&self, filter: &ContentFilter) -> AppResult<Vec<Content>>;
    /// Writes every field except the reward stamp.
    async fn update_content(&self, content: &Content) -> AppResult<()>;
    async fn delete_content(&self, id: Uuid) -> AppResult<bool>;
    /// Published content matching title, description or tags, by engagement rate.
    async fn search_content(&self, query: &str) -> AppResult<Vec<Content>>;
    /// Published content by engagement rate then views.
    async fn top_content(
        &self,
        limit: usize,
        published_since: Option<DateTime<Utc>>,
    ) -> AppResult<Vec<Content>>;
    /// Published content whose reward stamp is zero.
    async fn list_unrewarded_content(&self) -> AppResult<Vec<Content>>;

    // engagements
    async fn insert_engagement(&self, engagement: &Engagement) -> AppResult<()>;
    async fn list_engagements(&self, content_id: Uuid) -> AppResult<Vec<Engagement>>;

    // rewards
    /// Inserts a pending reward and credits the creator's pending earnings.
    async fn insert_reward(&self, reward: &Reward) -> AppResult<CreatorBalance>;
    /// As `insert_reward`, also stamping the content's reward amount. Returns
    /// `None` when the claim fails and nothing was written.
    async fn insert_content_reward(
        &self,
        reward: &Reward,
        claim: ContentClaim,
    ) -> AppResult<Option<CreatorBalance>>;
    /// Locks the reward and its creator, plans the transition, writes both.
    async fn transition_reward(
        &self,
        id: Uuid,
        planner: TransitionPlanner<'_>,
    ) -> AppResult<AppliedTransition>;
    async fn get_reward(&self, id: Uuid) -> AppResult<Option<Reward>>;
    /// Newest first.
    async fn list_rewards(&self, filter: &RewardFilter) -> AppResult<Vec<Reward>>;

    // transactions
    async fn insert_transaction(&self, transaction: &Transaction) -> AppResult<()>;
    async fn get_transaction(&self, id: Uuid) -> AppResult<Option<Transaction>>;
    async fn list_transactions(&self, user_id: Option<Uuid>) -> AppResult<Vec<Transaction>>;

    // audit
    async fn insert_audit_log(&self, entry: &AuditLog) -> AppResult<()>;
    async fn list_audit_logs(&self, limit: usize) -> AppResult<Vec<AuditLog>>;
}
