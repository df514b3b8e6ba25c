//! Reward Ledger Engine
//!
//! ```text
//! ┌──────────────┐     ┌──────────────────┐     ┌─────────────────┐
//! │ scoring      │────►│ RewardLedger     │◄────│ lifecycle       │
//! │ (amounts)    │     │ (single writer)  │     │ (state machine) │
//! └──────────────┘     └──────────────────┘     └─────────────────┘
//!                        ▲              │
//!                        │              ▼
//!              ┌──────────────┐   ┌──────────────┐
//!              │ RewardSweeper│   │ Store        │
//!              │ (automatic)  │   │ (atomic      │
//!              └──────────────┘   │  balances)   │
//!                                 └──────────────┘
//! ```
//!
//! ## Balance Model
//!
//! - Creating a reward adds its amount to the creator's pending earnings
//! - Paying moves the amount from pending to total earnings
//! - Rejecting or cancelling removes it from pending
//! - Pending earnings floor at zero; a clamp is logged

pub mod analytics;
pub mod ledger;
pub mod lifecycle;
pub mod scoring;
pub mod sweep;

pub use analytics::{RewardAnalytics, Timeframe, aggregate};
pub use ledger::{ManualReward, RewardLedger, RewardQuote};
pub use lifecycle::{
    BalanceEffect, RewardCommand, RewardUpdate, TransitionPolicy, plan_transition, settle_balance,
};
pub use scoring::{ContentMetrics, ScoringConfig, TierMultipliers, compute_reward_amount};
pub use sweep::{RewardSweeper, SweepReport};
