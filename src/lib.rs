//! Creator Rewards
//!
//! Backend for a creator rewards platform: users publish content, engagement
//! on that content earns token rewards, and approved rewards are paid out
//! through an on-chain rewards contract.
//!
//! ## Module Structure
//!
//! ```text
//! src/
//! ├── lib.rs         - Crate root with re-exports
//! ├── main.rs        - Server entrypoint
//! ├── config.rs      - Environment configuration
//! ├── error.rs       - Service error type and HTTP mapping
//! ├── audit.rs       - Audit trail (tracing + store + recent ring)
//! ├── models/        - Users, creators, content, engagements, rewards
//! ├── rewards/       - Reward ledger engine
//! │   ├── scoring.rs   - Engagement score to token amount
//! │   ├── lifecycle.rs - Status transitions and balance effects
//! │   ├── ledger.rs    - Single writer of rewards and balances
//! │   ├── sweep.rs     - Automatic rewards for eligible content
//! │   └── analytics.rs - Reward aggregation
//! ├── services/      - User, creator, content and transaction services
//! ├── blockchain/    - JSON-RPC client and rewards contract
//! │   ├── abi.rs       - Call encoding and wei conversion
//! │   ├── client.rs    - Ethereum JSON-RPC transport
//! │   ├── contract.rs  - Contract gateway
//! │   └── service.rs   - Ledger-aware payouts
//! ├── api/           - HTTP routers and security middleware
//! └── database/      - Store trait, PostgreSQL and in-memory stores
//! ```

pub mod api;
pub mod audit;
pub mod blockchain;
pub mod config;
pub mod database;
pub mod error;
pub mod models;
pub mod rewards;
pub mod services;

pub use api::{ApiState, SecurityMiddlewareConfig, SecurityState, create_app};
pub use audit::{AuditLogger, AuditSeverity};
pub use blockchain::{ContractGateway, DisabledGateway, RewardsContract, SmartContractService};
pub use config::RewardsConfig;
pub use database::{DatabasePool, MemoryStore, Store};
pub use error::{AppError, AppResult};
pub use rewards::{
    RewardAnalytics, RewardLedger, RewardSweeper, ScoringConfig, SweepReport, TransitionPolicy,
};
