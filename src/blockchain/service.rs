//! Ledger-aware contract operations
//!
//! Chain first, ledger second: a reward is only marked paid after its
//! payout transaction is confirmed, so any failure before that point leaves
//! the ledger as it was.

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::audit::{AuditLogger, AuditSeverity};
use crate::blockchain::contract::{ContractGateway, PlatformStats};
use crate::database::Store;
use crate::error::{AppError, AppResult};
use crate::models::{AuditAction, AuditLog, CreatorStatus, RewardStatus, Transaction};
use crate::rewards::RewardLedger;
use crate::services::{CreatorService, TransactionService, UpdateCreator};

const BLOCKCHAIN_EARNINGS_KEY: &str = "blockchain_earnings";

#[derive(Debug, Clone, Serialize)]
pub struct PaymentOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PaymentOutcome {
    fn confirmed(hash: String) -> Self {
        Self {
            success: true,
            transaction_hash: Some(hash),
            error: None,
        }
    }

    fn failed(hash: Option<String>, error: &AppError) -> Self {
        Self {
            success: false,
            transaction_hash: hash,
            error: Some(error.to_string()),
        }
    }
}

/// Marks a reward as having a payout in flight until dropped
struct PayoutClaim<'a> {
    in_flight: &'a DashMap<Uuid, ()>,
    reward_id: Uuid,
}

impl Drop for PayoutClaim<'_> {
    fn drop(&mut self) {
        self.in_flight.remove(&self.reward_id);
    }
}

pub struct SmartContractService {
    gateway: Arc<dyn ContractGateway>,
    in_flight: DashMap<Uuid, ()>,
    store: Arc<dyn Store>,
    ledger: Arc<RewardLedger>,
    creators: Arc<CreatorService>,
    transactions: Arc<TransactionService>,
    audit: Arc<AuditLogger>,
}

impl SmartContractService {
    pub fn new(
        gateway: Arc<dyn ContractGateway>,
        store: Arc<dyn Store>,
        ledger: Arc<RewardLedger>,
        creators: Arc<CreatorService>,
        transactions: Arc<TransactionService>,
        audit: Arc<AuditLogger>,
    ) -> Self {
        Self {
            gateway,
            in_flight: DashMap::new(),
            store,
            ledger,
            creators,
            transactions,
            audit,
        }
    }

    async fn wallet_for_user(&self, user_id: Uuid) -> AppResult<String> {
        self.store
            .get_user(user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User"))?
            .wallet_address
            .ok_or_else(|| AppError::validation("Creator wallet address not found"))
    }

    async fn wallet_for_creator(&self, creator_id: Uuid) -> AppResult<String> {
        let creator = self.creators.find(creator_id).await?;
        self.wallet_for_user(creator.user_id).await
    }

    fn claim_payout(&self, reward_id: Uuid) -> AppResult<PayoutClaim<'_>> {
        match self.in_flight.entry(reward_id) {
            Entry::Occupied(_) => Err(AppError::Conflict(
                "payout already in progress for this reward".to_string(),
            )),
            Entry::Vacant(slot) => {
                slot.insert(());
                Ok(PayoutClaim {
                    in_flight: &self.in_flight,
                    reward_id,
                })
            }
        }
    }

    /// Pays a reward on chain, then settles it in the ledger.
    /// The claim is held from the status check until the ledger is settled.
    pub async fn process_reward_payment(
        &self,
        reward_id: Uuid,
        actor: Option<Uuid>,
    ) -> PaymentOutcome {
        let _claim = match self.claim_payout(reward_id) {
            Ok(claim) => claim,
            Err(e) => {
                warn!(reward_id = %reward_id, "Concurrent payout refused");
                return PaymentOutcome::failed(None, &e);
            }
        };

        let hash = match self.send_payout(reward_id).await {
            Ok(hash) => hash,
            Err(e) => {
                warn!(reward_id = %reward_id, error = %e, "Reward payout not sent");
                return PaymentOutcome::failed(None, &e);
            }
        };

        match self.settle_payout(reward_id, &hash, actor).await {
            Ok(()) => PaymentOutcome::confirmed(hash),
            Err(e) => {
                error!(
                    reward_id = %reward_id,
                    tx_hash = %hash,
                    error = %e,
                    "Payout confirmed on chain but ledger update failed"
                );
                PaymentOutcome::failed(Some(hash), &e)
            }
        }
    }

    async fn send_payout(&self, reward_id: Uuid) -> AppResult<String> {
        let reward = self.ledger.find(reward_id).await?;
        self.ledger
            .policy()
            .check(reward.status, RewardStatus::Paid)?;
        let wallet = self.wallet_for_creator(reward.creator_id).await?;

        info!(
            reward_id = %reward_id,
            amount = %reward.amount,
            wallet = %wallet,
            "Sending reward payout"
        );
        self.gateway
            .distribute_reward(&wallet, reward.amount, &reward_id.to_string())
            .await
    }

    async fn settle_payout(&self, reward_id: Uuid, hash: &str, actor: Option<Uuid>) -> AppResult<()> {
        let reward = self
            .ledger
            .mark_paid(reward_id, Some(hash.to_string()), actor)
            .await?;
        self.transactions
            .record(Transaction::completed_reward_payment(
                reward.user_id,
                reward.amount,
                &reward.currency,
                hash,
                reward.id,
            ))
            .await?;
        Ok(())
    }

    /// Stakes on behalf of the creator, then marks them verified.
    pub async fn verify_creator_on_chain(
        &self,
        creator_id: Uuid,
        stake_amount: Decimal,
    ) -> PaymentOutcome {
        let result: AppResult<String> = async {
            if stake_amount <= Decimal::ZERO {
                return Err(AppError::validation("stake amount must be positive"));
            }
            let wallet = self.wallet_for_creator(creator_id).await?;
            let hash = self
                .gateway
                .stake_for_verification(&wallet, stake_amount)
                .await?;
            self.creators
                .update_status(creator_id, CreatorStatus::Verified)
                .await?;
            Ok(hash)
        }
        .await;

        match result {
            Ok(hash) => {
                info!(creator_id = %creator_id, tx_hash = %hash, "Creator verified on chain");
                PaymentOutcome::confirmed(hash)
            }
            Err(e) => {
                warn!(creator_id = %creator_id, error = %e, "On-chain verification failed");
                PaymentOutcome::failed(None, &e)
            }
        }
    }

    /// Copies on-chain lifetime earnings into the creator's analytics.
    pub async fn sync_creator_earnings(&self, creator_id: Uuid) -> AppResult<Decimal> {
        let creator = self.creators.find(creator_id).await?;
        let wallet = self.wallet_for_user(creator.user_id).await?;
        let earnings = self.gateway.creator_earnings(&wallet).await?;

        let mut analytics = match creator.analytics {
            Some(serde_json::Value::Object(map)) => map,
            _ => serde_json::Map::new(),
        };
        analytics.insert(
            BLOCKCHAIN_EARNINGS_KEY.to_string(),
            serde_json::to_value(earnings)?,
        );
        self.creators
            .update(
                creator_id,
                UpdateCreator {
                    analytics: Some(serde_json::Value::Object(analytics)),
                    ..Default::default()
                },
            )
            .await?;

        info!(creator_id = %creator_id, earnings = %earnings, "Synced on-chain earnings");
        Ok(earnings)
    }

    pub async fn platform_stats(&self) -> AppResult<PlatformStats> {
        self.gateway.platform_stats().await
    }

    pub async fn add_reward_tokens(&self, amount: Decimal, actor: Option<Uuid>) -> PaymentOutcome {
        if amount <= Decimal::ZERO {
            return PaymentOutcome::failed(
                None,
                &AppError::validation("token amount must be positive"),
            );
        }
        match self.gateway.add_reward_tokens(amount).await {
            Ok(hash) => {
                self.audit
                    .log(
                        AuditLog::new(AuditAction::PaymentProcessed, "contract", None)
                            .with_user(actor)
                            .with_description(format!("Deposited {} reward tokens ({})", amount, hash)),
                        AuditSeverity::Warning,
                    )
                    .await;
                PaymentOutcome::confirmed(hash)
            }
            Err(e) => PaymentOutcome::failed(None, &e),
        }
    }

    pub async fn contract_balance(&self) -> AppResult<Decimal> {
        self.gateway.contract_balance().await
    }

    pub async fn token_address(&self) -> AppResult<String> {
        self.gateway.token_address().await
    }

    /// Unreachable nodes count as "not verified".
    pub async fn verify_transaction(&self, hash: &str) -> bool {
        match self.gateway.verify_transaction(hash).await {
            Ok(valid) => valid,
            Err(e) => {
                warn!(tx_hash = %hash, error = %e, "Transaction verification failed");
                false
            }
        }
    }
}
