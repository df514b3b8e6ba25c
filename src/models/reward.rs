use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::rewards::{ContentMetrics, ScoringConfig, compute_reward_amount};

string_enum!(RewardType {
    ContentCreation => "content_creation",
    EngagementBonus => "engagement_bonus",
    MilestoneAchievement => "milestone_achievement",
    ReferralBonus => "referral_bonus",
    QualityBonus => "quality_bonus",
    ConsistencyBonus => "consistency_bonus",
});

string_enum!(RewardStatus {
    Pending => "pending",
    Approved => "approved",
    Paid => "paid",
    Rejected => "rejected",
    Cancelled => "cancelled",
});

impl RewardStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RewardStatus::Paid | RewardStatus::Rejected | RewardStatus::Cancelled
        )
    }

    /// Amount still counted in the creator's pending earnings.
    pub fn is_outstanding(&self) -> bool {
        matches!(self, RewardStatus::Pending | RewardStatus::Approved)
    }
}

/// Snapshot of the inputs that produced a reward amount. Never changes after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RewardCriteria {
    Content(ContentMetrics),
    Milestone { milestone: String },
    EngagementPeriod { period: String },
    Manual { note: Option<String> },
}

impl RewardCriteria {
    /// Re-derive the amount from the snapshot. Only scored rewards can be recomputed.
    pub fn recompute(&self, config: &ScoringConfig) -> Option<Decimal> {
        match self {
            RewardCriteria::Content(metrics) => Some(compute_reward_amount(metrics, config)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Reward {
    pub id: Uuid,
    pub creator_id: Uuid,
    pub user_id: Uuid,
    pub content_id: Option<Uuid>,
    pub reward_type: RewardType,
    pub status: RewardStatus,
    pub amount: Decimal,
    pub currency: String,
    pub description: Option<String>,
    pub criteria: RewardCriteria,
    pub metadata: serde_json::Map<String, serde_json::Value>,
    pub approved_at: Option<DateTime<Utc>>,
    pub paid_at: Option<DateTime<Utc>>,
    pub transaction_reference: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Reward {
    pub const DEFAULT_CURRENCY: &'static str = "USD";

    pub fn new(
        creator_id: Uuid,
        user_id: Uuid,
        reward_type: RewardType,
        amount: Decimal,
        criteria: RewardCriteria,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            creator_id,
            user_id,
            content_id: None,
            reward_type,
            status: RewardStatus::Pending,
            amount,
            currency: Self::DEFAULT_CURRENCY.to_string(),
            description: None,
            criteria,
            metadata: serde_json::Map::new(),
            approved_at: None,
            paid_at: None,
            transaction_reference: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_content(mut self, content_id: Uuid) -> Self {
        self.content_id = Some(content_id);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}
