//! # Shop Error Types
//!
//! All errors that can occur while loading a catalog or running a purchase.
//!
//! Two audiences:
//! - **Players** see the expected rejections (`AlreadyHigherTier`,
//!   `AlreadyBought`, `InsufficientFunds`, `InsufficientSpace`,
//!   `EconomyUnavailable`). These never mutate state.
//! - **Operators** see configuration and corruption faults in the log.

use thiserror::Error;

use crate::currency::CurrencyKind;
use crate::inventory::PlayerId;
use crate::notice::ShopNotice;

/// Errors that can occur in the shop system.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ShopError {
    /// A required configuration key is absent or empty. The entry is disabled.
    #[error("missing configuration at {path}: {what}")]
    MissingConfig {
        /// Configuration path of the content.
        path: String,
        /// The key that was missing.
        what: &'static str,
    },

    /// Configuration is present but malformed. The entry is disabled.
    #[error("invalid configuration at {path}: {reason}")]
    InvalidConfig {
        /// Configuration path (or file) that failed.
        path: String,
        /// What was wrong with it.
        reason: String,
    },

    /// The cache claims more tiers than the entry has.
    #[error("wrong tier order at {entry}: cache holds tier {owned} but only {available} tiers exist")]
    TierOrder {
        /// Entry identifier.
        entry: String,
        /// Owned tier count found in the cache.
        owned: usize,
        /// Number of tiers the entry defines.
        available: usize,
    },

    /// A heavier entry of the same category was already bought.
    #[error("category {category} already holds weight {held}, entry weight is {weight}")]
    AlreadyHigherTier {
        /// Category identifier.
        category: String,
        /// Weight watermark held by the player.
        held: u8,
        /// Weight of the entry being bought.
        weight: u8,
    },

    /// Permanent entry is maxed and cannot be bought again.
    #[error("{entry} is permanent and already bought")]
    AlreadyBought {
        /// Entry identifier.
        entry: String,
    },

    /// Player cannot pay for the candidate tier.
    #[error("insufficient {currency}: price {price}, available {available}")]
    InsufficientFunds {
        /// Currency of the candidate tier.
        currency: CurrencyKind,
        /// Price of the candidate tier.
        price: u32,
        /// Amount the player holds.
        available: u64,
    },

    /// Inventory has no free slot for the granted items.
    #[error("inventory has no free slot")]
    InsufficientSpace,

    /// Virtual balance purchase without a working economy backend.
    #[error("virtual balance purchases require an economy backend")]
    EconomyUnavailable,

    /// Entry is not in the catalog or failed to load.
    #[error("unknown or disabled shop entry: {0}")]
    UnknownEntry(String),

    /// Purchase for a player without an open session.
    #[error("no open shop session for player {0}")]
    NoSession(PlayerId),

    /// A purchase for this player is already in flight on this thread.
    #[error("player {0} already has a purchase in flight")]
    ReentrantPurchase(PlayerId),
}

impl ShopError {
    /// Returns true for the expected, player-facing rejections.
    #[must_use]
    pub const fn is_user_facing(&self) -> bool {
        matches!(
            self,
            Self::AlreadyHigherTier { .. }
                | Self::AlreadyBought { .. }
                | Self::InsufficientFunds { .. }
                | Self::InsufficientSpace
                | Self::EconomyUnavailable
        )
    }

    /// Missing currency for an `InsufficientFunds` rejection.
    #[must_use]
    pub fn shortfall(&self) -> Option<u64> {
        match self {
            Self::InsufficientFunds {
                price, available, ..
            } => Some(u64::from(*price).saturating_sub(*available)),
            _ => None,
        }
    }

    /// The notice shown to the player, if this error is shown at all.
    #[must_use]
    pub fn notice(&self) -> Option<ShopNotice> {
        match self {
            Self::AlreadyHigherTier { .. } => Some(ShopNotice::AlreadyHigherTier),
            Self::AlreadyBought { .. } => Some(ShopNotice::AlreadyBought),
            Self::InsufficientFunds {
                currency, price, ..
            } => Some(ShopNotice::InsufficientFunds {
                currency_key: currency.name_key(*price),
                shortfall: self.shortfall().unwrap_or_default(),
            }),
            Self::InsufficientSpace => Some(ShopNotice::InsufficientSpace),
            Self::EconomyUnavailable => Some(ShopNotice::EconomyUnavailable),
            _ => None,
        }
    }
}

/// Failure reported by a presentation collaborator. Always swallowed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("presentation failed: {0}")]
pub struct NoticeError(pub String);

/// Result type for shop operations.
pub type ShopResult<T> = Result<T, ShopError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shortfall() {
        let err = ShopError::InsufficientFunds {
            currency: CurrencyKind::Gold,
            price: 8,
            available: 3,
        };
        assert_eq!(err.shortfall(), Some(5));
        assert_eq!(ShopError::InsufficientSpace.shortfall(), None);
    }

    #[test]
    fn test_user_facing_classification() {
        assert!(ShopError::InsufficientSpace.is_user_facing());
        assert!(ShopError::EconomyUnavailable.is_user_facing());
        assert!(!ShopError::UnknownEntry("blocks.wool".into()).is_user_facing());
        assert!(!ShopError::TierOrder {
            entry: "tools.pickaxe".into(),
            owned: 5,
            available: 4,
        }
        .is_user_facing());
    }

    #[test]
    fn test_operator_faults_have_no_notice() {
        let err = ShopError::TierOrder {
            entry: "tools.pickaxe".into(),
            owned: 5,
            available: 4,
        };
        assert!(err.notice().is_none());
        assert!(ShopError::ReentrantPurchase(7).notice().is_none());
    }

    #[test]
    fn test_insufficient_funds_notice() {
        let err = ShopError::InsufficientFunds {
            currency: CurrencyKind::Iron,
            price: 1,
            available: 0,
        };
        assert_eq!(
            err.notice(),
            Some(ShopNotice::InsufficientFunds {
                currency_key: "meaning-iron-singular",
                shortfall: 1,
            })
        );
    }
}
