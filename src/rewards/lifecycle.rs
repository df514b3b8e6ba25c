//! Reward Lifecycle
//!
//! ```text
//!            approve           pay
//!  pending ──────────► approved ──────► paid
//!     │ │                  │
//!     │ └─ pay (lenient)───┼──────────► paid
//!     │ reject             │ cancel
//!     ▼                    ▼
//!  rejected            cancelled ◄──── cancel (from pending)
//! ```
//!
//! Planning a transition is pure: the store applies the returned reward and
//! balance effect inside the same lock or database transaction.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{CreatorBalance, Reward, RewardStatus};

pub const REJECTION_REASON_KEY: &str = "rejection_reason";
pub const CANCELLATION_REASON_KEY: &str = "cancellation_reason";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RewardCommand {
    Approve,
    Pay { transaction_reference: Option<String> },
    Reject { reason: String },
    Cancel { reason: Option<String> },
}

impl RewardCommand {
    pub fn target(&self) -> RewardStatus {
        match self {
            RewardCommand::Approve => RewardStatus::Approved,
            RewardCommand::Pay { .. } => RewardStatus::Paid,
            RewardCommand::Reject { .. } => RewardStatus::Rejected,
            RewardCommand::Cancel { .. } => RewardStatus::Cancelled,
        }
    }
}

/// Which edges of the lifecycle are open
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransitionPolicy {
    /// Close the pending -> paid shortcut
    pub require_approval: bool,
}

impl TransitionPolicy {
    pub fn allows(&self, from: RewardStatus, to: RewardStatus) -> bool {
        use RewardStatus::*;
        match (from, to) {
            (Pending, Approved) => true,
            (Approved, Paid) => true,
            (Pending, Paid) => !self.require_approval,
            (Pending, Rejected) => true,
            (Pending | Approved, Cancelled) => true,
            _ => false,
        }
    }

    pub fn check(&self, from: RewardStatus, to: RewardStatus) -> AppResult<()> {
        if self.allows(from, to) {
            Ok(())
        } else {
            Err(AppError::InvalidTransition { from, to })
        }
    }
}

/// Signed change to a creator's balance
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BalanceEffect {
    pub pending_delta: Decimal,
    pub total_delta: Decimal,
}

impl BalanceEffect {
    pub fn for_creation(amount: Decimal) -> Self {
        Self {
            pending_delta: amount,
            total_delta: Decimal::ZERO,
        }
    }

    pub fn for_transition(to: RewardStatus, amount: Decimal) -> Self {
        match to {
            RewardStatus::Paid => Self {
                pending_delta: -amount,
                total_delta: amount,
            },
            RewardStatus::Rejected | RewardStatus::Cancelled => Self {
                pending_delta: -amount,
                total_delta: Decimal::ZERO,
            },
            RewardStatus::Pending | RewardStatus::Approved => Self::default(),
        }
    }

    pub fn is_noop(&self) -> bool {
        self.pending_delta.is_zero() && self.total_delta.is_zero()
    }
}

impl CreatorBalance {
    /// New balance after `effect`. Both fields floor at zero; the flag reports a clamp.
    pub fn apply(&self, effect: &BalanceEffect) -> (CreatorBalance, bool) {
        let pending = self.pending_earnings + effect.pending_delta;
        let total = self.total_earnings + effect.total_delta;
        let clamped = pending < Decimal::ZERO || total < Decimal::ZERO;
        (
            CreatorBalance {
                total_earnings: total.max(Decimal::ZERO),
                pending_earnings: pending.max(Decimal::ZERO),
            },
            clamped,
        )
    }
}

/// Apply `effect` and log when a floor clamps.
pub fn settle_balance(
    creator_id: Uuid,
    balance: &CreatorBalance,
    effect: &BalanceEffect,
) -> CreatorBalance {
    let (next, clamped) = balance.apply(effect);
    if clamped {
        warn!(
            creator_id = %creator_id,
            pending = %balance.pending_earnings,
            pending_delta = %effect.pending_delta,
            "Creator balance clamped at zero"
        );
    }
    next
}

/// Reward after a transition together with its balance effect
#[derive(Debug, Clone)]
pub struct RewardUpdate {
    pub reward: Reward,
    pub effect: BalanceEffect,
}

pub fn plan_transition(
    current: &Reward,
    command: &RewardCommand,
    policy: &TransitionPolicy,
    now: DateTime<Utc>,
) -> AppResult<RewardUpdate> {
    let target = command.target();
    policy.check(current.status, target)?;

    let mut reward = current.clone();
    reward.status = target;
    reward.updated_at = now;

    match command {
        RewardCommand::Approve => {
            reward.approved_at = Some(now);
        }
        RewardCommand::Pay {
            transaction_reference,
        } => {
            reward.paid_at = Some(now);
            if transaction_reference.is_some() {
                reward.transaction_reference = transaction_reference.clone();
            }
        }
        RewardCommand::Reject { reason } => {
            reward
                .metadata
                .insert(REJECTION_REASON_KEY.to_string(), reason.clone().into());
        }
        RewardCommand::Cancel { reason } => {
            if let Some(reason) = reason {
                reward
                    .metadata
                    .insert(CANCELLATION_REASON_KEY.to_string(), reason.clone().into());
            }
        }
    }

    Ok(RewardUpdate {
        effect: BalanceEffect::for_transition(target, current.amount),
        reward,
    })
}
