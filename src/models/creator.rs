use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

string_enum!(CreatorStatus {
    Active => "active",
    Suspended => "suspended",
    PendingVerification => "pending_verification",
    Verified => "verified",
});

/// Ranked creator category. Multiplies content reward amounts.
///
/// `Other` absorbs tier names this build does not know (old rows, foreign
/// snapshots) and scores with the neutral multiplier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreatorTier {
    #[default]
    Bronze,
    Silver,
    Gold,
    Platinum,
    #[serde(other)]
    Other,
}

impl CreatorTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            CreatorTier::Bronze => "bronze",
            CreatorTier::Silver => "silver",
            CreatorTier::Gold => "gold",
            CreatorTier::Platinum => "platinum",
            CreatorTier::Other => "other",
        }
    }

    /// Parse stored text; unrecognised values become `Other`.
    pub fn from_stored(s: &str) -> Self {
        match s {
            "bronze" => CreatorTier::Bronze,
            "silver" => CreatorTier::Silver,
            "gold" => CreatorTier::Gold,
            "platinum" => CreatorTier::Platinum,
            _ => CreatorTier::Other,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, CreatorTier::Other)
    }
}

impl std::fmt::Display for CreatorTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Earnings owed and earnings paid. Written only by the reward ledger.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatorBalance {
    pub total_earnings: Decimal,
    pub pending_earnings: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocialMediaLinks {
    pub youtube: Option<String>,
    pub instagram: Option<String>,
    pub tiktok: Option<String>,
    pub twitter: Option<String>,
    pub facebook: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Creator {
    pub id: Uuid,
    pub user_id: Uuid,
    pub creator_code: String,
    pub status: CreatorStatus,
    pub tier: CreatorTier,
    #[serde(flatten)]
    pub balance: CreatorBalance,
    pub total_content: i64,
    pub total_views: i64,
    pub total_likes: i64,
    pub total_shares: i64,
    pub engagement_rate: Decimal,
    pub social_media_links: Option<SocialMediaLinks>,
    pub content_categories: Vec<String>,
    pub analytics: Option<serde_json::Value>,
    pub verified_at: Option<DateTime<Utc>>,
    pub last_active_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Creator {
    pub fn new(user_id: Uuid, creator_code: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            creator_code,
            status: CreatorStatus::PendingVerification,
            tier: CreatorTier::Bronze,
            balance: CreatorBalance::default(),
            total_content: 0,
            total_views: 0,
            total_likes: 0,
            total_shares: 0,
            engagement_rate: Decimal::ZERO,
            social_media_links: None,
            content_categories: Vec::new(),
            analytics: None,
            verified_at: None,
            last_active_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// `(likes + shares + views * 0.1) / views * 100`, 2 decimals. Zero views keeps the old rate.
    pub fn recompute_engagement_rate(&mut self) {
        if self.total_views <= 0 {
            return;
        }
        let weighted = Decimal::from(self.total_likes)
            + Decimal::from(self.total_shares)
            + Decimal::from(self.total_views) * Decimal::new(1, 1);
        self.engagement_rate = (weighted / Decimal::from(self.total_views) * Decimal::ONE_HUNDRED)
            .round_dp(2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_parsing_falls_back_to_other() {
        assert_eq!(CreatorTier::from_stored("gold"), CreatorTier::Gold);
        assert_eq!(CreatorTier::from_stored("diamond"), CreatorTier::Other);
        let tier: CreatorTier = serde_json::from_str("\"diamond\"").unwrap();
        assert_eq!(tier, CreatorTier::Other);
        assert!(!tier.is_known());
    }

    #[test]
    fn test_creator_engagement_rate() {
        let mut creator = Creator::new(Uuid::new_v4(), "CRTEST0001".to_string());
        creator.total_views = 200;
        creator.total_likes = 10;
        creator.total_shares = 10;
        creator.recompute_engagement_rate();
        // (10 + 10 + 20) / 200 * 100
        assert_eq!(creator.engagement_rate, Decimal::from(20));
    }
}
