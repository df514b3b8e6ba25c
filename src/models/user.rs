use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

string_enum!(UserRole {
    User => "user",
    Creator => "creator",
    Admin => "admin",
});

string_enum!(UserStatus {
    Active => "active",
    Suspended => "suspended",
    Pending => "pending",
});

#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: UserRole,
    pub status: UserStatus,
    pub profile_image: Option<String>,
    pub bio: Option<String>,
    pub phone_number: Option<String>,
    /// Wallet that receives on-chain reward payouts
    pub wallet_address: Option<String>,
    pub email_verified_at: Option<DateTime<Utc>>,
    pub last_login_at: Option<DateTime<Utc>>,
    pub metadata: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Case-insensitive match on username and names, used by creator search.
    pub fn matches(&self, needle_lower: &str) -> bool {
        self.username.to_lowercase().contains(needle_lower)
            || self
                .first_name
                .as_deref()
                .is_some_and(|n| n.to_lowercase().contains(needle_lower))
            || self
                .last_name
                .as_deref()
                .is_some_and(|n| n.to_lowercase().contains(needle_lower))
    }
}
