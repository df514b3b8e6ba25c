use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

string_enum!(AuditAction {
    Create => "create",
    Update => "update",
    Delete => "delete",
    Login => "login",
    Logout => "logout",
    FraudDetection => "fraud_detection",
    RewardCalculation => "reward_calculation",
    PaymentProcessed => "payment_processed",
});

#[derive(Debug, Clone, Serialize)]
pub struct AuditLog {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub entity_type: String,
    pub entity_id: Option<Uuid>,
    pub action: AuditAction,
    pub old_values: Option<serde_json::Value>,
    pub new_values: Option<serde_json::Value>,
    pub ip_address: Option<String>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}
