//! Entity services
//!
//! CRUD over users, creators, content, engagements and transactions. Reward
//! state lives in [`crate::rewards`]; nothing here writes a creator balance.

pub mod content;
pub mod creators;
pub mod transactions;
pub mod users;

pub use content::{ContentAnalytics, ContentService, ContentStatsDelta, CreateContent, UpdateContent};
pub use creators::{CreateCreator, CreatorService, CreatorStatsDelta, UpdateCreator};
pub use transactions::TransactionService;
pub use users::{CreateUser, UpdateUser, UserService};
