use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

string_enum!(EngagementType {
    View => "view",
    Like => "like",
    Share => "share",
    Comment => "comment",
    Subscribe => "subscribe",
    Follow => "follow",
});

#[derive(Debug, Clone, Serialize)]
pub struct Engagement {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub content_id: Uuid,
    pub engagement_type: EngagementType,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub referrer: Option<String>,
    pub metadata: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

impl Engagement {
    pub fn new(content_id: Uuid, engagement_type: EngagementType) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: None,
            content_id,
            engagement_type,
            ip_address: None,
            user_agent: None,
            referrer: None,
            metadata: None,
            created_at: Utc::now(),
        }
    }
}
