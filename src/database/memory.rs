//! In-process store
//!
//! Every table lives behind one `RwLock`, so a reward write and its balance
//! change are applied under the same guard.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::database::{
    AppliedTransition, ContentClaim, ContentFilter, RewardFilter, Store, TransitionPlanner,
};
use crate::error::{AppError, AppResult};
use crate::models::{
    AuditLog, Content, ContentStatus, Creator, CreatorBalance, CreatorStatus, Engagement, Reward,
    Transaction, User,
};
use crate::rewards::{BalanceEffect, settle_balance};

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    creators: HashMap<Uuid, Creator>,
    content: HashMap<Uuid, Content>,
    engagements: Vec<Engagement>,
    rewards: HashMap<Uuid, Reward>,
    transactions: HashMap<Uuid, Transaction>,
    audit_logs: Vec<AuditLog>,
}

impl Tables {
    fn credit_creator(&mut self, reward: &Reward) -> AppResult<CreatorBalance> {
        let creator = self
            .creators
            .get_mut(&reward.creator_id)
            .ok_or_else(|| AppError::not_found("Creator"))?;
        creator.balance = settle_balance(
            creator.id,
            &creator.balance,
            &BalanceEffect::for_creation(reward.amount),
        );
        creator.updated_at = Utc::now();
        Ok(creator.balance)
    }
}

#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn newest_first<T>(items: &mut [T], created_at: impl Fn(&T) -> DateTime<Utc>) {
    items.sort_by_key(|item| std::cmp::Reverse(created_at(item)));
}

#[async_trait]
impl Store for MemoryStore {
    async fn insert_user(&self, user: &User) -> AppResult<()> {
        let mut tables = self.tables.write().await;
        if tables
            .users
            .values()
            .any(|u| u.email == user.email || u.username == user.username)
        {
            return Err(AppError::Conflict(
                "User with this email or username already exists".to_string(),
            ));
        }
        tables.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn get_user(&self, id: Uuid) -> AppResult<Option<User>> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn list_users(&self) -> AppResult<Vec<User>> {
        let mut users: Vec<User> = self.tables.read().await.users.values().cloned().collect();
        newest_first(&mut users, |u| u.created_at);
        Ok(users)
    }

    async fn update_user(&self, user: &User) -> AppResult<()> {
        let mut tables = self.tables.write().await;
        if tables.users.values().any(|u| {
            u.id != user.id && (u.email == user.email || u.username == user.username)
        }) {
            return Err(AppError::Conflict(
                "User with this email or username already exists".to_string(),
            ));
        }
        let existing = tables
            .users
            .get_mut(&user.id)
            .ok_or_else(|| AppError::not_found("User"))?;
        *existing = user.clone();
        Ok(())
    }

    async fn delete_user(&self, id: Uuid) -> AppResult<bool> {
        Ok(self.tables.write().await.users.remove(&id).is_some())
    }

    async fn insert_creator(&self, creator: &Creator) -> AppResult<()> {
        let mut tables = self.tables.write().await;
        if tables
            .creators
            .values()
            .any(|c| c.user_id == creator.user_id || c.creator_code == creator.creator_code)
        {
            return Err(AppError::Conflict(
                "Creator profile already exists for this user".to_string(),
            ));
        }
        tables.creators.insert(creator.id, creator.clone());
        Ok(())
    }

    async fn get_creator(&self, id: Uuid) -> AppResult<Option<Creator>> {
        Ok(self.tables.read().await.creators.get(&id).cloned())
    }

    async fn get_creator_by_user(&self, user_id: Uuid) -> AppResult<Option<Creator>> {
        Ok(self
            .tables
            .read()
            .await
            .creators
            .values()
            .find(|c| c.user_id == user_id)
            .cloned())
    }

    async fn get_creator_by_code(&self, code: &str) -> AppResult<Option<Creator>> {
        Ok(self
            .tables
            .read()
            .await
            .creators
            .values()
            .find(|c| c.creator_code == code)
            .cloned())
    }

    async fn list_creators(&self) -> AppResult<Vec<Creator>> {
        let mut creators: Vec<Creator> =
            self.tables.read().await.creators.values().cloned().collect();
        newest_first(&mut creators, |c| c.created_at);
        Ok(creators)
    }

    async fn update_creator(&self, creator: &Creator) -> AppResult<()> {
        let mut tables = self.tables.write().await;
        let existing = tables
            .creators
            .get_mut(&creator.id)
            .ok_or_else(|| AppError::not_found("Creator"))?;
        let balance = existing.balance;
        *existing = creator.clone();
        existing.balance = balance;
        Ok(())
    }

    async fn delete_creator(&self, id: Uuid) -> AppResult<bool> {
        let mut tables = self.tables.write().await;
        if !tables.creators.contains_key(&id) {
            return Ok(false);
        }
        if tables.rewards.values().any(|r| r.creator_id == id) {
            return Err(AppError::Conflict(
                "still referenced: creator has rewards".to_string(),
            ));
        }
        let owned: Vec<Uuid> = tables
            .content
            .values()
            .filter(|c| c.creator_id == id)
            .map(|c| c.id)
            .collect();
        tables.content.retain(|_, c| c.creator_id != id);
        tables.engagements.retain(|e| !owned.contains(&e.content_id));
        tables.creators.remove(&id);
        Ok(true)
    }

    async fn search_creators(&self, query: &str) -> AppResult<Vec<Creator>> {
        let needle = query.to_lowercase();
        let tables = self.tables.read().await;
        let mut found: Vec<Creator> = tables
            .creators
            .values()
            .filter(|c| {
                c.creator_code.to_lowercase().contains(&needle)
                    || tables
                        .users
                        .get(&c.user_id)
                        .is_some_and(|u| u.matches(&needle))
            })
            .cloned()
            .collect();
        found.sort_by(|a, b| b.balance.total_earnings.cmp(&a.balance.total_earnings));
        Ok(found)
    }

    async fn top_creators(&self, limit: usize) -> AppResult<Vec<Creator>> {
        let mut verified: Vec<Creator> = self
            .tables
            .read()
            .await
            .creators
            .values()
            .filter(|c| c.status == CreatorStatus::Verified)
            .cloned()
            .collect();
        verified.sort_by(|a, b| b.balance.total_earnings.cmp(&a.balance.total_earnings));
        verified.truncate(limit);
        Ok(verified)
    }

    async fn insert_content(&self, content: &Content) -> AppResult<()> {
        let mut tables = self.tables.write().await;
        if !tables.creators.contains_key(&content.creator_id) {
            return Err(AppError::not_found("Creator"));
        }
        tables.content.insert(content.id, content.clone());
        Ok(())
    }

    async fn get_content(&self, id: Uuid) -> AppResult<Option<Content>> {
        Ok(self.tables.read().await.content.get(&id).cloned())
    }

    async fn list_content(&self, filter: &ContentFilter) -> AppResult<Vec<Content>> {
        let mut items: Vec<Content> = self
            .tables
            .read()
            .await
            .content
            .values()
            .filter(|c| filter.matches(c))
            .cloned()
            .collect();
        newest_first(&mut items, |c| c.created_at);
        Ok(items)
    }

    async fn update_content(&self, content: &Content) -> AppResult<()> {
        let mut tables = self.tables.write().await;
        let existing = tables
            .content
            .get_mut(&content.id)
            .ok_or_else(|| AppError::not_found("Content"))?;
        let reward_amount = existing.reward_amount;
        *existing = content.clone();
        existing.reward_amount = reward_amount;
        Ok(())
    }

    async fn delete_content(&self, id: Uuid) -> AppResult<bool> {
        Ok(self.tables.write().await.content.remove(&id).is_some())
    }

    async fn search_content(&self, query: &str) -> AppResult<Vec<Content>> {
        let needle = query.to_lowercase();
        let mut found: Vec<Content> = self
            .tables
            .read()
            .await
            .content
            .values()
            .filter(|c| c.status == ContentStatus::Published && c.matches(&needle))
            .cloned()
            .collect();
        found.sort_by(|a, b| b.engagement_rate.cmp(&a.engagement_rate));
        Ok(found)
    }

    async fn top_content(
        &self,
        limit: usize,
        published_since: Option<DateTime<Utc>>,
    ) -> AppResult<Vec<Content>> {
        let mut items: Vec<Content> = self
            .tables
            .read()
            .await
            .content
            .values()
            .filter(|c| c.status == ContentStatus::Published)
            .filter(|c| {
                published_since
                    .is_none_or(|since| c.published_at.is_some_and(|at| at >= since))
            })
            .cloned()
            .collect();
        items.sort_by(|a, b| {
            b.engagement_rate
                .cmp(&a.engagement_rate)
                .then(b.views.cmp(&a.views))
        });
        items.truncate(limit);
        Ok(items)
    }

    async fn list_unrewarded_content(&self) -> AppResult<Vec<Content>> {
        let mut items: Vec<Content> = self
            .tables
            .read()
            .await
            .content
            .values()
            .filter(|c| c.status == ContentStatus::Published && !c.is_rewarded())
            .cloned()
            .collect();
        items.sort_by_key(|c| c.created_at);
        Ok(items)
    }

    async fn insert_engagement(&self, engagement: &Engagement) -> AppResult<()> {
        self.tables.write().await.engagements.push(engagement.clone());
        Ok(())
    }

    async fn list_engagements(&self, content_id: Uuid) -> AppResult<Vec<Engagement>> {
        let mut items: Vec<Engagement> = self
            .tables
            .read()
            .await
            .engagements
            .iter()
            .filter(|e| e.content_id == content_id)
            .cloned()
            .collect();
        newest_first(&mut items, |e| e.created_at);
        Ok(items)
    }

    async fn insert_reward(&self, reward: &Reward) -> AppResult<CreatorBalance> {
        let mut tables = self.tables.write().await;
        let balance = tables.credit_creator(reward)?;
        tables.rewards.insert(reward.id, reward.clone());
        Ok(balance)
    }

    async fn insert_content_reward(
        &self,
        reward: &Reward,
        claim: ContentClaim,
    ) -> AppResult<Option<CreatorBalance>> {
        let content_id = reward
            .content_id
            .ok_or_else(|| AppError::validation("content reward requires a content id"))?;

        let mut tables = self.tables.write().await;
        if !tables.creators.contains_key(&reward.creator_id) {
            return Err(AppError::not_found("Creator"));
        }
        let content = tables
            .content
            .get_mut(&content_id)
            .ok_or_else(|| AppError::not_found("Content"))?;
        if claim == ContentClaim::IfUnrewarded && content.is_rewarded() {
            return Ok(None);
        }
        content.reward_amount = reward.amount;
        content.updated_at = Utc::now();

        let balance = tables.credit_creator(reward)?;
        tables.rewards.insert(reward.id, reward.clone());
        Ok(Some(balance))
    }

    async fn transition_reward(
        &self,
        id: Uuid,
        planner: TransitionPlanner<'_>,
    ) -> AppResult<AppliedTransition> {
        let mut tables = self.tables.write().await;
        let current = tables
            .rewards
            .get(&id)
            .ok_or_else(|| AppError::not_found("Reward"))?;
        let previous = current.status;
        let update = planner(current)?;

        let creator = tables
            .creators
            .get_mut(&update.reward.creator_id)
            .ok_or_else(|| AppError::not_found("Creator"))?;
        if !update.effect.is_noop() {
            creator.balance = settle_balance(creator.id, &creator.balance, &update.effect);
            creator.updated_at = update.reward.updated_at;
        }
        let balance = creator.balance;

        tables.rewards.insert(id, update.reward.clone());
        Ok(AppliedTransition {
            previous,
            reward: update.reward,
            balance,
        })
    }

    async fn get_reward(&self, id: Uuid) -> AppResult<Option<Reward>> {
        Ok(self.tables.read().await.rewards.get(&id).cloned())
    }

    async fn list_rewards(&self, filter: &RewardFilter) -> AppResult<Vec<Reward>> {
        let mut items: Vec<Reward> = self
            .tables
            .read()
            .await
            .rewards
            .values()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect();
        newest_first(&mut items, |r| r.created_at);
        Ok(items)
    }

    async fn insert_transaction(&self, transaction: &Transaction) -> AppResult<()> {
        self.tables
            .write()
            .await
            .transactions
            .insert(transaction.id, transaction.clone());
        Ok(())
    }

    async fn get_transaction(&self, id: Uuid) -> AppResult<Option<Transaction>> {
        Ok(self.tables.read().await.transactions.get(&id).cloned())
    }

    async fn list_transactions(&self, user_id: Option<Uuid>) -> AppResult<Vec<Transaction>> {
        let mut items: Vec<Transaction> = self
            .tables
            .read()
            .await
            .transactions
            .values()
            .filter(|t| user_id.is_none_or(|id| t.user_id == id))
            .cloned()
            .collect();
        newest_first(&mut items, |t| t.created_at);
        Ok(items)
    }

    async fn insert_audit_log(&self, entry: &AuditLog) -> AppResult<()> {
        self.tables.write().await.audit_logs.push(entry.clone());
        Ok(())
    }

    async fn list_audit_logs(&self, limit: usize) -> AppResult<Vec<AuditLog>> {
        let tables = self.tables.read().await;
        Ok(tables.audit_logs.iter().rev().take(limit).cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ContentType, Platform, RewardCriteria, RewardType};
    use crate::rewards::{RewardCommand, TransitionPolicy, plan_transition};
    use rust_decimal::Decimal;

    async fn seeded() -> (MemoryStore, Creator) {
        let store = MemoryStore::new();
        let creator = Creator::new(Uuid::new_v4(), "CRMEMORY01".to_string());
        store.insert_creator(&creator).await.unwrap();
        (store, creator)
    }

    #[tokio::test]
    async fn test_delete_creator_with_rewards_conflicts() {
        let (store, creator) = seeded().await;
        let reward = Reward::new(
            creator.id,
            creator.user_id,
            RewardType::QualityBonus,
            Decimal::new(5, 0),
            RewardCriteria::Manual { note: None },
        );
        store.insert_reward(&reward).await.unwrap();

        let err = store.delete_creator(creator.id).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        assert!(store.get_creator(creator.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_delete_creator_removes_owned_content() {
        let (store, creator) = seeded().await;
        let content = Content::new(
            creator.id,
            "Clip".to_string(),
            ContentType::Video,
            Platform::Youtube,
        );
        store.insert_content(&content).await.unwrap();

        assert!(store.delete_creator(creator.id).await.unwrap());
        assert!(store.get_content(content.id).await.unwrap().is_none());
        assert!(!store.delete_creator(creator.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_update_creator_never_touches_balance() {
        let (store, creator) = seeded().await;
        let reward = Reward::new(
            creator.id,
            creator.user_id,
            RewardType::QualityBonus,
            Decimal::new(10, 0),
            RewardCriteria::Manual { note: None },
        );
        store.insert_reward(&reward).await.unwrap();

        let mut edited = creator.clone();
        edited.balance.total_earnings = Decimal::new(1_000_000, 0);
        edited.content_categories = vec!["music".to_string()];
        store.update_creator(&edited).await.unwrap();

        let stored = store.get_creator(creator.id).await.unwrap().unwrap();
        assert_eq!(stored.balance.total_earnings, Decimal::ZERO);
        assert_eq!(stored.balance.pending_earnings, Decimal::new(10, 0));
        assert_eq!(stored.content_categories, vec!["music".to_string()]);
    }

    #[tokio::test]
    async fn test_content_claim_only_once() {
        let (store, creator) = seeded().await;
        let content = Content::new(
            creator.id,
            "Clip".to_string(),
            ContentType::Video,
            Platform::Tiktok,
        );
        store.insert_content(&content).await.unwrap();

        let reward = |amount| {
            Reward::new(
                creator.id,
                creator.user_id,
                RewardType::ContentCreation,
                Decimal::new(amount, 0),
                RewardCriteria::Manual { note: None },
            )
            .with_content(content.id)
        };

        let first = store
            .insert_content_reward(&reward(3), ContentClaim::IfUnrewarded)
            .await
            .unwrap();
        assert!(first.is_some());
        let second = store
            .insert_content_reward(&reward(4), ContentClaim::IfUnrewarded)
            .await
            .unwrap();
        assert!(second.is_none());

        let stored = store.get_content(content.id).await.unwrap().unwrap();
        assert_eq!(stored.reward_amount, Decimal::new(3, 0));
        let balance = store.get_creator(creator.id).await.unwrap().unwrap().balance;
        assert_eq!(balance.pending_earnings, Decimal::new(3, 0));
    }

    #[tokio::test]
    async fn test_failed_plan_writes_nothing() {
        let (store, creator) = seeded().await;
        let reward = Reward::new(
            creator.id,
            creator.user_id,
            RewardType::QualityBonus,
            Decimal::new(7, 0),
            RewardCriteria::Manual { note: None },
        );
        store.insert_reward(&reward).await.unwrap();

        let policy = TransitionPolicy {
            require_approval: true,
        };
        let pay = RewardCommand::Pay {
            transaction_reference: None,
        };
        let planner = |r: &Reward| plan_transition(r, &pay, &policy, Utc::now());
        let err = store.transition_reward(reward.id, &planner).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidTransition { .. }));

        let stored = store.get_reward(reward.id).await.unwrap().unwrap();
        assert_eq!(stored.status, crate::models::RewardStatus::Pending);
        let balance = store.get_creator(creator.id).await.unwrap().unwrap().balance;
        assert_eq!(balance.pending_earnings, Decimal::new(7, 0));
    }
}
