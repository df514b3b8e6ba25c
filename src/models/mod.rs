//! Entity types shared by the store, the services and the HTTP layer.

/// Declares a text-backed enum with serde names, `as_str`, `Display` and `FromStr`.
///
/// The text form is what the database stores and what the API exchanges.
macro_rules! string_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord,
            serde::Serialize, serde::Deserialize,
        )]
        pub enum $name {
            $(#[serde(rename = $text)] $variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(format!("unknown {} value '{}'", stringify!($name), other)),
                }
            }
        }
    };
}

mod audit;
mod content;
mod creator;
mod engagement;
mod reward;
mod transaction;
mod user;

pub use audit::{AuditAction, AuditLog};
pub use content::{Content, ContentStatus, ContentType, Platform};
pub use creator::{Creator, CreatorBalance, CreatorStatus, CreatorTier, SocialMediaLinks};
pub use engagement::{Engagement, EngagementType};
pub use reward::{Reward, RewardCriteria, RewardStatus, RewardType};
pub use transaction::{PaymentMethod, Transaction, TransactionStatus, TransactionType};
pub use user::{User, UserRole, UserStatus};
