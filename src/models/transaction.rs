use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

string_enum!(TransactionType {
    RewardPayment => "reward_payment",
    Withdrawal => "withdrawal",
    Refund => "refund",
    Penalty => "penalty",
    Bonus => "bonus",
});

string_enum!(TransactionStatus {
    Pending => "pending",
    Processing => "processing",
    Completed => "completed",
    Failed => "failed",
    Cancelled => "cancelled",
});

string_enum!(PaymentMethod {
    Blockchain => "blockchain",
    BankTransfer => "bank_transfer",
    Paypal => "paypal",
    Stripe => "stripe",
});

#[derive(Debug, Clone, Serialize)]
pub struct Transaction {
    pub id: Uuid,
    pub user_id: Uuid,
    pub transaction_type: TransactionType,
    pub status: TransactionStatus,
    pub amount: Decimal,
    pub currency: String,
    pub payment_method: Option<PaymentMethod>,
    pub external_transaction_id: Option<String>,
    pub description: Option<String>,
    pub metadata: Option<serde_json::Value>,
    pub failure_reason: Option<String>,
    pub processed_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    /// A settled on-chain reward payout.
    pub fn completed_reward_payment(
        user_id: Uuid,
        amount: Decimal,
        currency: &str,
        tx_hash: &str,
        reward_id: Uuid,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            transaction_type: TransactionType::RewardPayment,
            status: TransactionStatus::Completed,
            amount,
            currency: currency.to_string(),
            payment_method: Some(PaymentMethod::Blockchain),
            external_transaction_id: Some(tx_hash.to_string()),
            description: Some(format!("Payout for reward {}", reward_id)),
            metadata: Some(serde_json::json!({ "reward_id": reward_id })),
            failure_reason: None,
            processed_at: Some(now),
            completed_at: Some(now),
            created_at: now,
            updated_at: now,
        }
    }
}
