use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::CreatorTier;
use crate::rewards::ContentMetrics;

string_enum!(ContentStatus {
    Draft => "draft",
    Published => "published",
    PendingReview => "pending_review",
    Rejected => "rejected",
    Archived => "archived",
});

string_enum!(Platform {
    Youtube => "youtube",
    Instagram => "instagram",
    Tiktok => "tiktok",
    Twitter => "twitter",
    Facebook => "facebook",
    PlatformNative => "platform_native",
});

/// Media kind. Scales content reward amounts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    #[default]
    Video,
    Image,
    Text,
    Audio,
    Livestream,
    #[serde(other)]
    Other,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Video => "video",
            ContentType::Image => "image",
            ContentType::Text => "text",
            ContentType::Audio => "audio",
            ContentType::Livestream => "livestream",
            ContentType::Other => "other",
        }
    }

    pub fn from_stored(s: &str) -> Self {
        match s {
            "video" => ContentType::Video,
            "image" => ContentType::Image,
            "text" => ContentType::Text,
            "audio" => ContentType::Audio,
            "livestream" => ContentType::Livestream,
            _ => ContentType::Other,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, ContentType::Other)
    }
}

impl std::fmt::Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Content {
    pub id: Uuid,
    pub creator_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub content_type: ContentType,
    pub platform: Platform,
    pub status: ContentStatus,
    pub external_id: Option<String>,
    pub external_url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub content_url: Option<String>,
    pub views: i64,
    pub likes: i64,
    pub shares: i64,
    pub comments: i64,
    pub duration: Option<i32>,
    pub tags: Vec<String>,
    pub categories: Vec<String>,
    pub metadata: Option<serde_json::Value>,
    pub engagement_rate: Decimal,
    /// Amount of the content reward issued for this item; zero means never rewarded
    pub reward_amount: Decimal,
    pub published_at: Option<DateTime<Utc>>,
    pub last_analyzed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Content {
    pub fn new(creator_id: Uuid, title: String, content_type: ContentType, platform: Platform) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            creator_id,
            title,
            description: None,
            content_type,
            platform,
            status: ContentStatus::Draft,
            external_id: None,
            external_url: None,
            thumbnail_url: None,
            content_url: None,
            views: 0,
            likes: 0,
            shares: 0,
            comments: 0,
            duration: None,
            tags: Vec::new(),
            categories: Vec::new(),
            metadata: None,
            engagement_rate: Decimal::ZERO,
            reward_amount: Decimal::ZERO,
            published_at: None,
            last_analyzed_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// `(likes + shares + comments * 2) / views * 100`, 2 decimals. Zero views keeps the old rate.
    pub fn recompute_engagement_rate(&mut self) {
        if self.views <= 0 {
            return;
        }
        let weighted = Decimal::from(self.likes)
            + Decimal::from(self.shares)
            + Decimal::from(self.comments) * Decimal::TWO;
        self.engagement_rate =
            (weighted / Decimal::from(self.views) * Decimal::ONE_HUNDRED).round_dp(2);
    }

    pub fn is_rewarded(&self) -> bool {
        !self.reward_amount.is_zero()
    }

    /// Crossed the automatic reward threshold.
    pub fn is_reward_eligible(&self) -> bool {
        self.status == ContentStatus::Published
            && !self.is_rewarded()
            && (self.views > 10 || self.likes > 1)
    }

    pub fn metrics(&self, creator_tier: CreatorTier) -> ContentMetrics {
        ContentMetrics {
            views: self.views.max(0) as u64,
            likes: self.likes.max(0) as u64,
            shares: self.shares.max(0) as u64,
            comments: self.comments.max(0) as u64,
            engagement_rate: self.engagement_rate,
            content_type: self.content_type,
            creator_tier,
        }
    }

    pub fn matches(&self, needle_lower: &str) -> bool {
        self.title.to_lowercase().contains(needle_lower)
            || self
                .description
                .as_deref()
                .is_some_and(|d| d.to_lowercase().contains(needle_lower))
            || self
                .tags
                .iter()
                .any(|t| t.to_lowercase().contains(needle_lower))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Content {
        Content::new(
            Uuid::new_v4(),
            "Sample".to_string(),
            ContentType::Video,
            Platform::Youtube,
        )
    }

    #[test]
    fn test_engagement_rate_weights_comments() {
        let mut content = sample();
        content.views = 400;
        content.likes = 20;
        content.shares = 4;
        content.comments = 3;
        content.recompute_engagement_rate();
        // (20 + 4 + 6) / 400 * 100
        assert_eq!(content.engagement_rate, Decimal::new(750, 2));
    }

    #[test]
    fn test_zero_views_keeps_rate() {
        let mut content = sample();
        content.engagement_rate = Decimal::new(5, 0);
        content.recompute_engagement_rate();
        assert_eq!(content.engagement_rate, Decimal::new(5, 0));
    }

    #[test]
    fn test_reward_eligibility() {
        let mut content = sample();
        content.views = 11;
        assert!(!content.is_reward_eligible(), "draft content is never eligible");

        content.status = ContentStatus::Published;
        assert!(content.is_reward_eligible());

        content.views = 10;
        content.likes = 1;
        assert!(!content.is_reward_eligible());

        content.likes = 2;
        assert!(content.is_reward_eligible());

        content.reward_amount = Decimal::ONE;
        assert!(!content.is_reward_eligible());
    }

    #[test]
    fn test_unknown_content_type_is_other() {
        assert_eq!(ContentType::from_stored("podcast"), ContentType::Other);
        assert_eq!(ContentType::from_stored("audio"), ContentType::Audio);
    }
}
