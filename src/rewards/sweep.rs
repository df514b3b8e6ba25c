//! Automatic Reward Sweep
//!
//! Scans published, never-rewarded content and issues a content reward for
//! every item past the engagement threshold (`views > 10 || likes > 1`).
//! Each item is claimed in the same store operation that inserts its reward,
//! so reruns and overlapping manual rewards cannot pay an item twice.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::interval;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::database::Store;
use crate::error::{AppError, AppResult};
use crate::models::Creator;
use crate::rewards::ledger::RewardLedger;

#[derive(Debug, Clone, Serialize)]
pub struct SweepReport {
    /// Unrewarded published items examined
    pub scanned: usize,
    pub eligible: usize,
    pub rewarded: usize,
    /// Claimed by someone else between scan and claim
    pub skipped: usize,
    pub failed: usize,
    pub total_amount: Decimal,
    pub reward_ids: Vec<Uuid>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

pub struct RewardSweeper {
    store: Arc<dyn Store>,
    ledger: Arc<RewardLedger>,
    running: Mutex<()>,
}

impl RewardSweeper {
    pub fn new(store: Arc<dyn Store>, ledger: Arc<RewardLedger>) -> Self {
        Self {
            store,
            ledger,
            running: Mutex::new(()),
        }
    }

    /// One pass over the unrewarded content. Fails with `Conflict` while another pass runs.
    pub async fn run(&self) -> AppResult<SweepReport> {
        let _guard = self
            .running
            .try_lock()
            .map_err(|_| AppError::Conflict("reward sweep already running".to_string()))?;

        let started_at = Utc::now();
        let candidates = self.store.list_unrewarded_content().await?;
        let mut report = SweepReport {
            scanned: candidates.len(),
            eligible: 0,
            rewarded: 0,
            skipped: 0,
            failed: 0,
            total_amount: Decimal::ZERO,
            reward_ids: Vec::new(),
            started_at,
            finished_at: started_at,
        };

        let mut creators: HashMap<Uuid, Option<Creator>> = HashMap::new();

        for content in candidates.iter().filter(|c| c.is_reward_eligible()) {
            report.eligible += 1;

            if !creators.contains_key(&content.creator_id) {
                let creator = self.store.get_creator(content.creator_id).await?;
                creators.insert(content.creator_id, creator);
            }
            let Some(Some(creator)) = creators.get(&content.creator_id) else {
                warn!(
                    content_id = %content.id,
                    creator_id = %content.creator_id,
                    "Skipping content with missing creator"
                );
                report.failed += 1;
                continue;
            };

            match self.ledger.claim_content_reward(content, creator).await {
                Ok(Some(reward)) => {
                    report.rewarded += 1;
                    report.total_amount += reward.amount;
                    report.reward_ids.push(reward.id);
                }
                Ok(None) => report.skipped += 1,
                Err(e) => {
                    warn!(content_id = %content.id, error = %e, "Automatic reward failed");
                    report.failed += 1;
                }
            }
        }

        report.finished_at = Utc::now();
        info!(
            scanned = report.scanned,
            eligible = report.eligible,
            rewarded = report.rewarded,
            skipped = report.skipped,
            failed = report.failed,
            total_amount = %report.total_amount,
            "Automatic reward sweep finished"
        );
        Ok(report)
    }

    /// Run the sweep every `period` until the task is aborted.
    pub fn spawn_periodic(self: Arc<Self>, period: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            info!(period_secs = period.as_secs(), "Starting periodic reward sweep");
            let mut ticker = interval(period);
            // the first tick completes immediately
            ticker.tick().await;

            loop {
                ticker.tick().await;
                match self.run().await {
                    Ok(report) => {
                        debug!(rewarded = report.rewarded, "Periodic sweep complete");
                    }
                    Err(AppError::Conflict(_)) => {
                        debug!("Previous sweep still running, skipping tick");
                    }
                    Err(e) => {
                        error!(error = %e, "Periodic reward sweep failed");
                    }
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::AuditLogger;
    use crate::database::MemoryStore;
    use crate::rewards::{ScoringConfig, TransitionPolicy};

    fn sweeper() -> RewardSweeper {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let ledger = Arc::new(RewardLedger::new(
            store.clone(),
            ScoringConfig::default(),
            TransitionPolicy::default(),
            Arc::new(AuditLogger::new()),
        ));
        RewardSweeper::new(store, ledger)
    }

    #[tokio::test]
    async fn test_overlapping_run_conflicts() {
        let sweeper = sweeper();

        let held = sweeper.running.try_lock().unwrap();
        let err = sweeper.run().await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        drop(held);

        let report = sweeper.run().await.unwrap();
        assert_eq!(report.scanned, 0);
        assert_eq!(report.rewarded, 0);
    }
}
