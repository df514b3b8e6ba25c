//! Reward Scoring
//!
//! Deterministic reward amount for a piece of content:
//!
//! ```text
//! amount = base + views*0.01 + likes*0.1 + shares*0.2 + comments*0.15
//! amount *= 1.5 if engagement_rate > 10, 1.2 if > 5
//! amount *= tier multiplier * content type multiplier
//! round to 2 decimals, half away from zero
//! ```
//!
//! All arithmetic is exact decimal, so the same metrics always give the same amount.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::models::{ContentType, CreatorTier};

/// Engagement counters and categories a content reward is computed from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentMetrics {
    pub views: u64,
    pub likes: u64,
    pub shares: u64,
    pub comments: u64,
    /// Percentage, 2 decimals
    pub engagement_rate: Decimal,
    pub content_type: ContentType,
    pub creator_tier: CreatorTier,
}

/// Per-tier multipliers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierMultipliers {
    pub bronze: Decimal,
    pub silver: Decimal,
    pub gold: Decimal,
    pub platinum: Decimal,
}

impl Default for TierMultipliers {
    fn default() -> Self {
        Self {
            bronze: Decimal::ONE,
            silver: Decimal::new(15, 1),
            gold: Decimal::TWO,
            platinum: Decimal::new(3, 0),
        }
    }
}

impl TierMultipliers {
    pub fn for_tier(&self, tier: CreatorTier) -> Decimal {
        match tier {
            CreatorTier::Bronze => self.bronze,
            CreatorTier::Silver => self.silver,
            CreatorTier::Gold => self.gold,
            CreatorTier::Platinum => self.platinum,
            CreatorTier::Other => Decimal::ONE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoringConfig {
    pub base_reward_amount: Decimal,
    pub tier_multipliers: TierMultipliers,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            base_reward_amount: Decimal::ONE,
            tier_multipliers: TierMultipliers::default(),
        }
    }
}

pub fn content_type_multiplier(content_type: ContentType) -> Decimal {
    match content_type {
        ContentType::Video => Decimal::new(15, 1),
        ContentType::Livestream => Decimal::TWO,
        ContentType::Image => Decimal::ONE,
        ContentType::Text => Decimal::new(8, 1),
        ContentType::Audio => Decimal::new(12, 1),
        ContentType::Other => Decimal::ONE,
    }
}

/// Weighted sum of the raw engagement counters
pub fn engagement_score(metrics: &ContentMetrics) -> Decimal {
    Decimal::from(metrics.views) * Decimal::new(1, 2)
        + Decimal::from(metrics.likes) * Decimal::new(1, 1)
        + Decimal::from(metrics.shares) * Decimal::new(2, 1)
        + Decimal::from(metrics.comments) * Decimal::new(15, 2)
}

fn engagement_bonus(engagement_rate: Decimal) -> Decimal {
    if engagement_rate > Decimal::TEN {
        Decimal::new(15, 1)
    } else if engagement_rate > Decimal::new(5, 0) {
        Decimal::new(12, 1)
    } else {
        Decimal::ONE
    }
}

pub fn round_amount(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Reward amount for `metrics`. Never negative.
pub fn compute_reward_amount(metrics: &ContentMetrics, config: &ScoringConfig) -> Decimal {
    let mut amount = config.base_reward_amount + engagement_score(metrics);
    amount *= engagement_bonus(metrics.engagement_rate);
    amount *= config.tier_multipliers.for_tier(metrics.creator_tier);
    amount *= content_type_multiplier(metrics.content_type);
    round_amount(amount).max(Decimal::ZERO)
}
