//! On-chain reward payouts
//!
//! `abi` encodes contract calls, `client` speaks Ethereum JSON-RPC,
//! `contract` binds the rewards contract behind the `ContractGateway` trait and
//! `service` ties confirmed payouts back into the reward ledger.

pub mod abi;
pub mod client;
pub mod contract;
pub mod service;

pub use contract::{ContractGateway, DisabledGateway, PlatformStats, RewardsContract};
pub use service::{PaymentOutcome, SmartContractService};
