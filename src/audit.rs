//! Audit logging for ledger writes and administrative operations
//!
//! Entries are mirrored to tracing, kept in a bounded in-memory ring for the
//! `/audit` endpoint, and persisted through the store when one is attached.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::warn;
use uuid::Uuid;

use crate::database::Store;
use crate::models::{AuditAction, AuditLog, Reward, RewardStatus};

const DEFAULT_MAX_ENTRIES: usize = 10_000;

/// Severity levels for audit events
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub enum AuditSeverity {
    Debug = 0,
    Info = 1,
    Warning = 2,
    Critical = 3,
}

impl AuditLog {
    pub fn new(action: AuditAction, entity_type: &str, entity_id: Option<Uuid>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: None,
            entity_type: entity_type.to_string(),
            entity_id,
            action,
            old_values: None,
            new_values: None,
            ip_address: None,
            description: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_user(mut self, user_id: Option<Uuid>) -> Self {
        self.user_id = user_id;
        self
    }

    pub fn with_values(
        mut self,
        old_values: Option<serde_json::Value>,
        new_values: Option<serde_json::Value>,
    ) -> Self {
        self.old_values = old_values;
        self.new_values = new_values;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

pub struct AuditLogger {
    entries: Arc<RwLock<VecDeque<AuditLog>>>,
    max_entries: usize,
    store: Option<Arc<dyn Store>>,
}

impl Default for AuditLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl AuditLogger {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(RwLock::new(VecDeque::new())),
            max_entries: DEFAULT_MAX_ENTRIES,
            store: None,
        }
    }

    pub fn with_store(mut self, store: Arc<dyn Store>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries.max(1);
        self
    }

    pub async fn log(&self, entry: AuditLog, severity: AuditSeverity) {
        let entity_id = entry.entity_id.map(|id| id.to_string()).unwrap_or_default();
        match severity {
            AuditSeverity::Debug => {
                tracing::debug!(action = %entry.action, entity = %entry.entity_type, entity_id = %entity_id, "AUDIT")
            }
            AuditSeverity::Info => {
                tracing::info!(action = %entry.action, entity = %entry.entity_type, entity_id = %entity_id, "AUDIT")
            }
            AuditSeverity::Warning => {
                tracing::warn!(action = %entry.action, entity = %entry.entity_type, entity_id = %entity_id, "AUDIT")
            }
            AuditSeverity::Critical => {
                tracing::error!(action = %entry.action, entity = %entry.entity_type, entity_id = %entity_id, "AUDIT CRITICAL")
            }
        }

        if let Some(store) = &self.store
            && let Err(e) = store.insert_audit_log(&entry).await
        {
            warn!(error = %e, audit_id = %entry.id, "Failed to persist audit entry");
        }

        let mut entries = self.entries.write().await;
        entries.push_back(entry);
        while entries.len() > self.max_entries {
            entries.pop_front();
        }
    }

    pub async fn log_reward_created(&self, reward: &Reward, actor: Option<Uuid>) {
        let entry = AuditLog::new(AuditAction::RewardCalculation, "reward", Some(reward.id))
            .with_user(actor)
            .with_values(
                None,
                Some(serde_json::json!({
                    "creator_id": reward.creator_id,
                    "reward_type": reward.reward_type,
                    "amount": reward.amount,
                    "status": reward.status,
                })),
            )
            .with_description(format!("{} reward created", reward.reward_type));
        self.log(entry, AuditSeverity::Info).await;
    }

    pub async fn log_reward_transition(
        &self,
        previous: RewardStatus,
        reward: &Reward,
        actor: Option<Uuid>,
    ) {
        let action = if reward.status == RewardStatus::Paid {
            AuditAction::PaymentProcessed
        } else {
            AuditAction::Update
        };
        let severity = match reward.status {
            RewardStatus::Rejected | RewardStatus::Cancelled => AuditSeverity::Warning,
            _ => AuditSeverity::Info,
        };
        let entry = AuditLog::new(action, "reward", Some(reward.id))
            .with_user(actor)
            .with_values(
                Some(serde_json::json!({ "status": previous })),
                Some(serde_json::json!({
                    "status": reward.status,
                    "amount": reward.amount,
                    "transaction_reference": reward.transaction_reference,
                })),
            )
            .with_description(format!("reward {} -> {}", previous, reward.status));
        self.log(entry, severity).await;
    }

    pub async fn get_recent(&self, count: usize) -> Vec<AuditLog> {
        let entries = self.entries.read().await;
        entries.iter().rev().take(count).cloned().collect()
    }

    pub async fn get_for_entity(&self, entity_id: Uuid) -> Vec<AuditLog> {
        let entries = self.entries.read().await;
        entries
            .iter()
            .filter(|e| e.entity_id == Some(entity_id))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryStore;

    #[tokio::test]
    async fn test_ring_is_bounded() {
        let logger = AuditLogger::new().with_max_entries(3);
        for _ in 0..5 {
            logger
                .log(
                    AuditLog::new(AuditAction::Create, "user", Some(Uuid::new_v4())),
                    AuditSeverity::Debug,
                )
                .await;
        }
        assert_eq!(logger.get_recent(10).await.len(), 3);
    }

    #[tokio::test]
    async fn test_entries_are_persisted() {
        let store = Arc::new(MemoryStore::new());
        let logger = AuditLogger::new().with_store(store.clone());
        let entity = Uuid::new_v4();
        logger
            .log(
                AuditLog::new(AuditAction::Delete, "content", Some(entity)),
                AuditSeverity::Warning,
            )
            .await;

        let persisted = store.list_audit_logs(10).await.unwrap();
        assert_eq!(persisted.len(), 1);
        assert_eq!(persisted[0].entity_id, Some(entity));
        assert_eq!(logger.get_for_entity(entity).await.len(), 1);
    }
}
