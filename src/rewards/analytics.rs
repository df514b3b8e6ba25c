//! Reward analytics aggregation (read-only)

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::models::{Reward, RewardStatus};
use crate::rewards::scoring::round_amount;

pub const RECENT_REWARDS_LIMIT: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Timeframe {
    Day,
    Week,
    Month,
}

impl Timeframe {
    pub fn since(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            Timeframe::Day => now - Duration::hours(24),
            Timeframe::Week => now - Duration::days(7),
            Timeframe::Month => now - Duration::days(30),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RewardAnalytics {
    pub total_rewards: usize,
    pub total_amount: Decimal,
    pub paid_amount: Decimal,
    pub pending_amount: Decimal,
    pub approved_amount: Decimal,
    pub rewards_by_type: BTreeMap<String, Decimal>,
    pub recent_rewards: Vec<Reward>,
}

pub fn aggregate(rewards: &[Reward]) -> RewardAnalytics {
    let mut analytics = RewardAnalytics {
        total_rewards: rewards.len(),
        ..RewardAnalytics::default()
    };

    for reward in rewards {
        analytics.total_amount += reward.amount;
        match reward.status {
            RewardStatus::Paid => analytics.paid_amount += reward.amount,
            RewardStatus::Pending => analytics.pending_amount += reward.amount,
            RewardStatus::Approved => analytics.approved_amount += reward.amount,
            RewardStatus::Rejected | RewardStatus::Cancelled => {}
        }
        *analytics
            .rewards_by_type
            .entry(reward.reward_type.to_string())
            .or_insert(Decimal::ZERO) += reward.amount;
    }

    analytics.total_amount = round_amount(analytics.total_amount);
    analytics.paid_amount = round_amount(analytics.paid_amount);
    analytics.pending_amount = round_amount(analytics.pending_amount);
    analytics.approved_amount = round_amount(analytics.approved_amount);
    for amount in analytics.rewards_by_type.values_mut() {
        *amount = round_amount(*amount);
    }

    let mut recent: Vec<&Reward> = rewards.iter().collect();
    recent.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    analytics.recent_rewards = recent
        .into_iter()
        .take(RECENT_REWARDS_LIMIT)
        .cloned()
        .collect();

    analytics
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RewardCriteria, RewardType};
    use uuid::Uuid;

    fn reward(amount: i64, status: RewardStatus, reward_type: RewardType, age_mins: i64) -> Reward {
        let mut reward = Reward::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            reward_type,
            Decimal::new(amount, 2),
            RewardCriteria::Manual { note: None },
        );
        reward.status = status;
        reward.created_at = Utc::now() - Duration::minutes(age_mins);
        reward
    }

    #[test]
    fn test_aggregate_by_status_and_type() {
        let rewards = vec![
            reward(1050, RewardStatus::Paid, RewardType::ContentCreation, 1),
            reward(250, RewardStatus::Pending, RewardType::ContentCreation, 2),
            reward(700, RewardStatus::Approved, RewardType::EngagementBonus, 3),
            reward(100, RewardStatus::Rejected, RewardType::QualityBonus, 4),
        ];
        let analytics = aggregate(&rewards);

        assert_eq!(analytics.total_rewards, 4);
        assert_eq!(analytics.total_amount, Decimal::new(2100, 2));
        assert_eq!(analytics.paid_amount, Decimal::new(1050, 2));
        assert_eq!(analytics.pending_amount, Decimal::new(250, 2));
        assert_eq!(analytics.approved_amount, Decimal::new(700, 2));
        assert_eq!(
            analytics.rewards_by_type.get("content_creation"),
            Some(&Decimal::new(1300, 2))
        );
        assert_eq!(
            analytics.rewards_by_type.get("quality_bonus"),
            Some(&Decimal::new(100, 2))
        );
    }

    #[test]
    fn test_recent_rewards_newest_first_and_capped() {
        let rewards: Vec<Reward> = (0..15)
            .map(|i| reward(100, RewardStatus::Pending, RewardType::ContentCreation, 15 - i))
            .collect();
        let analytics = aggregate(&rewards);

        assert_eq!(analytics.recent_rewards.len(), RECENT_REWARDS_LIMIT);
        assert_eq!(analytics.recent_rewards[0].id, rewards[14].id);
        assert!(
            analytics
                .recent_rewards
                .windows(2)
                .all(|w| w[0].created_at >= w[1].created_at)
        );
    }

    #[test]
    fn test_empty_input() {
        let analytics = aggregate(&[]);
        assert_eq!(analytics.total_rewards, 0);
        assert_eq!(analytics.total_amount, Decimal::ZERO);
        assert!(analytics.recent_rewards.is_empty());
    }

    #[test]
    fn test_timeframe_windows() {
        let now = Utc::now();
        assert_eq!(now - Timeframe::Day.since(now), Duration::hours(24));
        assert_eq!(now - Timeframe::Week.since(now), Duration::days(7));
        assert_eq!(now - Timeframe::Month.since(now), Duration::days(30));
    }
}
