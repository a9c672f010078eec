//! # Shop Listing
//!
//! What the shop menu shows for one entry and one player: the tier on
//! offer, its price and whether the player can buy it right now. Rendering
//! the listing is up to the platform.

use std::borrow::Cow;

use crate::cache::PlayerPurchaseCache;
use crate::currency::{CurrencyColor, CurrencyKind};
use crate::entry::PurchasableEntry;
use crate::inventory::Buyer;
use crate::ledger::CurrencyLedger;

/// Whether the displayed tier can be bought.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BuyStatus {
    /// Permanent entry, every tier owned.
    Maxed,
    /// The player lacks the currency (or the economy is down).
    CantAfford {
        /// Currency that is short.
        currency: CurrencyKind,
    },
    /// Purchase would pass the funds check.
    CanBuy,
}

/// Menu view of one entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShopListing {
    /// Entry identifier.
    pub identifier: String,
    /// Display slot.
    pub slot: u32,
    /// Ordinal of the displayed tier.
    pub ordinal: u32,
    /// Displayed tier as a numeral; empty for single-tier entries.
    pub numeral: Cow<'static, str>,
    /// Price of the displayed tier.
    pub price: u32,
    /// Currency of the displayed tier.
    pub currency: CurrencyKind,
    /// Display colour of the price.
    pub color: CurrencyColor,
    /// Buy status.
    pub status: BuyStatus,
}

impl ShopListing {
    /// Builds the listing of `entry` for the player behind `buyer`.
    ///
    /// Category weights are not considered here; a blocked entry still
    /// lists as buyable and is rejected when bought.
    #[must_use]
    pub fn for_entry(
        entry: &PurchasableEntry,
        cache: &PlayerPurchaseCache,
        ledger: &CurrencyLedger<'_>,
        buyer: &Buyer<'_>,
    ) -> Self {
        let tier = entry.display_tier(cache);
        let owned = cache.owned_tier(entry.identifier());

        let status = if entry.is_permanent() && owned >= entry.tiers().len() {
            BuyStatus::Maxed
        } else {
            match ledger.query(buyer, tier.currency) {
                Ok(funds) if funds >= u64::from(tier.price) => BuyStatus::CanBuy,
                _ => BuyStatus::CantAfford {
                    currency: tier.currency,
                },
            }
        };

        Self {
            identifier: entry.identifier().to_string(),
            slot: entry.slot(),
            ordinal: tier.ordinal,
            numeral: if entry.is_upgradable() {
                tier.numeral()
            } else {
                Cow::Borrowed("")
            },
            price: tier.price,
            currency: tier.currency,
            color: tier.currency.color(),
            status,
        }
    }
}
