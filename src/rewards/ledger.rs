//! Reward Ledger - the single writer of rewards and creator balances
//!
//! Every reward creation credits the creator's pending earnings in the same
//! store operation, and every transition is planned against the locked
//! current row so duplicate or out-of-order commands leave balances alone.

use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::audit::AuditLogger;
use crate::database::{AppliedTransition, ContentClaim, RewardFilter, Store};
use crate::error::{AppError, AppResult};
use crate::models::{Content, Creator, Reward, RewardCriteria, RewardType};
use crate::rewards::analytics::{RewardAnalytics, Timeframe, aggregate};
use crate::rewards::lifecycle::{RewardCommand, TransitionPolicy, plan_transition};
use crate::rewards::scoring::{ContentMetrics, ScoringConfig, compute_reward_amount, round_amount};

/// Computed amount for a content item, without writing anything
#[derive(Debug, Clone, Serialize)]
pub struct RewardQuote {
    pub content_id: Uuid,
    pub creator_id: Uuid,
    pub amount: Decimal,
    pub metrics: ContentMetrics,
}

/// Admin-issued reward outside the scoring formula
#[derive(Debug, Clone, Deserialize)]
pub struct ManualReward {
    pub creator_id: Uuid,
    pub content_id: Option<Uuid>,
    pub reward_type: RewardType,
    pub amount: Decimal,
    pub description: Option<String>,
}

pub struct RewardLedger {
    store: Arc<dyn Store>,
    scoring: ScoringConfig,
    policy: TransitionPolicy,
    audit: Arc<AuditLogger>,
}

fn checked_amount(amount: Decimal) -> AppResult<Decimal> {
    if amount <= Decimal::ZERO {
        return Err(AppError::validation("amount must be greater than zero"));
    }
    Ok(round_amount(amount))
}

impl RewardLedger {
    pub fn new(
        store: Arc<dyn Store>,
        scoring: ScoringConfig,
        policy: TransitionPolicy,
        audit: Arc<AuditLogger>,
    ) -> Self {
        Self {
            store,
            scoring,
            policy,
            audit,
        }
    }

    pub fn scoring(&self) -> &ScoringConfig {
        &self.scoring
    }

    pub fn policy(&self) -> &TransitionPolicy {
        &self.policy
    }

    async fn creator(&self, creator_id: Uuid) -> AppResult<Creator> {
        self.store
            .get_creator(creator_id)
            .await?
            .ok_or_else(|| AppError::not_found("Creator"))
    }

    async fn content_with_creator(&self, content_id: Uuid) -> AppResult<(Content, Creator)> {
        let content = self
            .store
            .get_content(content_id)
            .await?
            .ok_or_else(|| AppError::not_found("Content"))?;
        let creator = self.creator(content.creator_id).await?;
        Ok((content, creator))
    }

    fn content_reward(&self, content: &Content, creator: &Creator) -> Reward {
        let metrics = content.metrics(creator.tier);
        let amount = compute_reward_amount(&metrics, &self.scoring);
        Reward::new(
            creator.id,
            creator.user_id,
            RewardType::ContentCreation,
            amount,
            RewardCriteria::Content(metrics),
        )
        .with_content(content.id)
        .with_description(format!("Reward for content: {}", content.title))
    }

    /// Amount the content would earn right now.
    pub async fn calculate_content_reward(&self, content_id: Uuid) -> AppResult<RewardQuote> {
        let (content, creator) = self.content_with_creator(content_id).await?;
        let metrics = content.metrics(creator.tier);
        let amount = compute_reward_amount(&metrics, &self.scoring);
        debug!(content_id = %content_id, amount = %amount, "Content reward calculated");
        Ok(RewardQuote {
            content_id,
            creator_id: creator.id,
            amount,
            metrics,
        })
    }

    /// Create a content reward and stamp the content with its amount.
    pub async fn create_content_reward(
        &self,
        content_id: Uuid,
        actor: Option<Uuid>,
    ) -> AppResult<Reward> {
        let (content, creator) = self.content_with_creator(content_id).await?;
        let reward = self.content_reward(&content, &creator);
        self.store
            .insert_content_reward(&reward, ContentClaim::Always)
            .await?
            .ok_or_else(|| AppError::not_found("Content"))?;
        self.record_creation(&reward, actor).await;
        Ok(reward)
    }

    /// Create a content reward only if the item has never been rewarded.
    pub async fn claim_content_reward(
        &self,
        content: &Content,
        creator: &Creator,
    ) -> AppResult<Option<Reward>> {
        let reward = self
            .content_reward(content, creator)
            .with_description(format!("Automatic reward for content: {}", content.title));
        let claimed = self
            .store
            .insert_content_reward(&reward, ContentClaim::IfUnrewarded)
            .await?;
        if claimed.is_none() {
            debug!(content_id = %content.id, "Content already rewarded, skipping");
            return Ok(None);
        }
        self.record_creation(&reward, None).await;
        Ok(Some(reward))
    }

    pub async fn create_milestone_reward(
        &self,
        creator_id: Uuid,
        milestone: String,
        amount: Decimal,
        actor: Option<Uuid>,
    ) -> AppResult<Reward> {
        let amount = checked_amount(amount)?;
        let creator = self.creator(creator_id).await?;
        let description = format!("Milestone achievement: {}", milestone);
        let reward = Reward::new(
            creator.id,
            creator.user_id,
            RewardType::MilestoneAchievement,
            amount,
            RewardCriteria::Milestone { milestone },
        )
        .with_description(description);
        self.insert(reward, actor).await
    }

    pub async fn create_engagement_bonus(
        &self,
        creator_id: Uuid,
        amount: Decimal,
        period: String,
        actor: Option<Uuid>,
    ) -> AppResult<Reward> {
        let amount = checked_amount(amount)?;
        let creator = self.creator(creator_id).await?;
        let description = format!("Engagement bonus for {}", period);
        let reward = Reward::new(
            creator.id,
            creator.user_id,
            RewardType::EngagementBonus,
            amount,
            RewardCriteria::EngagementPeriod { period },
        )
        .with_description(description);
        self.insert(reward, actor).await
    }

    pub async fn create_manual_reward(
        &self,
        request: ManualReward,
        actor: Option<Uuid>,
    ) -> AppResult<Reward> {
        let amount = checked_amount(request.amount)?;
        let creator = self.creator(request.creator_id).await?;
        if let Some(content_id) = request.content_id {
            let content = self
                .store
                .get_content(content_id)
                .await?
                .ok_or_else(|| AppError::not_found("Content"))?;
            if content.creator_id != creator.id {
                return Err(AppError::validation("content belongs to another creator"));
            }
        }

        let mut reward = Reward::new(
            creator.id,
            creator.user_id,
            request.reward_type,
            amount,
            RewardCriteria::Manual {
                note: request.description.clone(),
            },
        );
        reward.content_id = request.content_id;
        reward.description = request.description;
        self.insert(reward, actor).await
    }

    async fn insert(&self, reward: Reward, actor: Option<Uuid>) -> AppResult<Reward> {
        self.store.insert_reward(&reward).await?;
        self.record_creation(&reward, actor).await;
        Ok(reward)
    }

    async fn record_creation(&self, reward: &Reward, actor: Option<Uuid>) {
        info!(
            reward_id = %reward.id,
            creator_id = %reward.creator_id,
            reward_type = %reward.reward_type,
            amount = %reward.amount,
            "Reward created"
        );
        self.audit.log_reward_created(reward, actor).await;
    }

    /// Run one lifecycle command against a reward.
    pub async fn apply(
        &self,
        reward_id: Uuid,
        command: RewardCommand,
        actor: Option<Uuid>,
    ) -> AppResult<Reward> {
        let policy = self.policy;
        let now = Utc::now();
        let planner = |current: &Reward| plan_transition(current, &command, &policy, now);

        let AppliedTransition {
            previous,
            reward,
            balance,
        } = self.store.transition_reward(reward_id, &planner).await?;

        info!(
            reward_id = %reward.id,
            creator_id = %reward.creator_id,
            from = %previous,
            to = %reward.status,
            pending = %balance.pending_earnings,
            total = %balance.total_earnings,
            "Reward status changed"
        );
        self.audit
            .log_reward_transition(previous, &reward, actor)
            .await;
        Ok(reward)
    }

    pub async fn approve(&self, reward_id: Uuid, actor: Option<Uuid>) -> AppResult<Reward> {
        self.apply(reward_id, RewardCommand::Approve, actor).await
    }

    pub async fn mark_paid(
        &self,
        reward_id: Uuid,
        transaction_reference: Option<String>,
        actor: Option<Uuid>,
    ) -> AppResult<Reward> {
        self.apply(
            reward_id,
            RewardCommand::Pay {
                transaction_reference,
            },
            actor,
        )
        .await
    }

    pub async fn reject(
        &self,
        reward_id: Uuid,
        reason: String,
        actor: Option<Uuid>,
    ) -> AppResult<Reward> {
        self.apply(reward_id, RewardCommand::Reject { reason }, actor)
            .await
    }

    pub async fn cancel(
        &self,
        reward_id: Uuid,
        reason: Option<String>,
        actor: Option<Uuid>,
    ) -> AppResult<Reward> {
        self.apply(reward_id, RewardCommand::Cancel { reason }, actor)
            .await
    }

    pub async fn find(&self, reward_id: Uuid) -> AppResult<Reward> {
        self.store
            .get_reward(reward_id)
            .await?
            .ok_or_else(|| AppError::not_found("Reward"))
    }

    pub async fn list(&self, filter: &RewardFilter) -> AppResult<Vec<Reward>> {
        self.store.list_rewards(filter).await
    }

    pub async fn analytics(
        &self,
        creator_id: Option<Uuid>,
        timeframe: Option<Timeframe>,
    ) -> AppResult<RewardAnalytics> {
        let filter = RewardFilter {
            creator_id,
            since: timeframe.map(|t| t.since(Utc::now())),
            ..RewardFilter::default()
        };
        let rewards = self.store.list_rewards(&filter).await?;
        Ok(aggregate(&rewards))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryStore;
    use crate::models::{ContentStatus, ContentType, CreatorTier, Platform, RewardStatus};

    async fn setup(policy: TransitionPolicy) -> (Arc<MemoryStore>, RewardLedger, Creator) {
        let store = Arc::new(MemoryStore::new());
        let mut creator = Creator::new(Uuid::new_v4(), "CRLEDGER01".to_string());
        creator.tier = CreatorTier::Gold;
        store.insert_creator(&creator).await.unwrap();
        let ledger = RewardLedger::new(
            store.clone(),
            ScoringConfig::default(),
            policy,
            Arc::new(AuditLogger::new()),
        );
        (store, ledger, creator)
    }

    #[tokio::test]
    async fn test_content_reward_uses_worked_example() {
        let (store, ledger, creator) = setup(TransitionPolicy::default()).await;
        let mut content = Content::new(
            creator.id,
            "Launch video".to_string(),
            ContentType::Video,
            Platform::Youtube,
        );
        content.status = ContentStatus::Published;
        content.views = 1000;
        content.likes = 50;
        content.shares = 10;
        content.comments = 5;
        content.engagement_rate = Decimal::new(12, 0);
        store.insert_content(&content).await.unwrap();

        let quote = ledger.calculate_content_reward(content.id).await.unwrap();
        assert_eq!(quote.amount, Decimal::new(8438, 2));

        let reward = ledger.create_content_reward(content.id, None).await.unwrap();
        assert_eq!(reward.amount, Decimal::new(8438, 2));
        assert_eq!(
            reward.criteria.recompute(ledger.scoring()),
            Some(reward.amount)
        );

        let stamped = store.get_content(content.id).await.unwrap().unwrap();
        assert_eq!(stamped.reward_amount, Decimal::new(8438, 2));
        let balance = store.get_creator(creator.id).await.unwrap().unwrap().balance;
        assert_eq!(balance.pending_earnings, Decimal::new(8438, 2));
    }

    #[tokio::test]
    async fn test_require_approval_blocks_direct_payment() {
        let (_store, ledger, creator) = setup(TransitionPolicy {
            require_approval: true,
        })
        .await;
        let reward = ledger
            .create_milestone_reward(creator.id, "first upload".to_string(), Decimal::TEN, None)
            .await
            .unwrap();

        let err = ledger.mark_paid(reward.id, None, None).await.unwrap_err();
        assert!(matches!(
            err,
            AppError::InvalidTransition {
                from: RewardStatus::Pending,
                to: RewardStatus::Paid
            }
        ));

        ledger.approve(reward.id, None).await.unwrap();
        let paid = ledger
            .mark_paid(reward.id, Some("ref-1".to_string()), None)
            .await
            .unwrap();
        assert_eq!(paid.status, RewardStatus::Paid);
    }

    #[tokio::test]
    async fn test_non_positive_amount_rejected() {
        let (_store, ledger, creator) = setup(TransitionPolicy::default()).await;
        let err = ledger
            .create_engagement_bonus(creator.id, Decimal::ZERO, "week".to_string(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_unknown_reward_is_not_found() {
        let (_store, ledger, _creator) = setup(TransitionPolicy::default()).await;
        let err = ledger.approve(Uuid::new_v4(), None).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
