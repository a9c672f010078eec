//! # Purchasable Entries
//!
//! One shop line item: an identifier, the category it competes in, and its
//! tier ladder. Entries are built once when the catalog loads and are
//! immutable afterwards.

use crate::cache::PlayerPurchaseCache;
use crate::error::{ShopError, ShopResult};
use crate::tier::{Candidate, Tier, TierLadder};

/// Behaviour flags of an entry.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EntryFlags {
    /// Kept across deaths; cannot be bought again once maxed.
    pub permanent: bool,
    /// Loses one tier on death instead of being forgotten.
    pub downgradable: bool,
    /// Granted items ignore durability loss.
    pub unbreakable: bool,
}

/// A shop line item.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PurchasableEntry {
    identifier: String,
    category: String,
    slot: u32,
    weight: u8,
    flags: EntryFlags,
    tiers: TierLadder,
}

impl PurchasableEntry {
    /// Creates an entry with weight 0 and no flags.
    ///
    /// # Errors
    ///
    /// Returns `MissingConfig` if `tiers` is empty.
    pub fn new(
        identifier: impl Into<String>,
        category: impl Into<String>,
        slot: u32,
        tiers: Vec<Tier>,
    ) -> ShopResult<Self> {
        let identifier = identifier.into();
        let tiers = TierLadder::new(tiers).ok_or_else(|| ShopError::MissingConfig {
            path: identifier.clone(),
            what: "tiers",
        })?;

        Ok(Self {
            identifier,
            category: category.into(),
            slot,
            weight: 0,
            flags: EntryFlags::default(),
            tiers,
        })
    }

    /// Sets the category weight.
    #[must_use]
    pub const fn with_weight(mut self, weight: u8) -> Self {
        self.weight = weight;
        self
    }

    /// Sets the behaviour flags.
    #[must_use]
    pub const fn with_flags(mut self, flags: EntryFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Stable key of this entry, unique within the shop.
    #[inline]
    #[must_use]
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Identifier of the category this entry competes in.
    #[inline]
    #[must_use]
    pub fn category(&self) -> &str {
        &self.category
    }

    /// Display slot.
    #[inline]
    #[must_use]
    pub const fn slot(&self) -> u32 {
        self.slot
    }

    /// Weight within the category.
    #[inline]
    #[must_use]
    pub const fn weight(&self) -> u8 {
        self.weight
    }

    /// Behaviour flags.
    #[inline]
    #[must_use]
    pub const fn flags(&self) -> EntryFlags {
        self.flags
    }

    /// Returns true if the entry is permanent.
    #[inline]
    #[must_use]
    pub const fn is_permanent(&self) -> bool {
        self.flags.permanent
    }

    /// Returns true if the entry is downgradable.
    #[inline]
    #[must_use]
    pub const fn is_downgradable(&self) -> bool {
        self.flags.downgradable
    }

    /// The tier ladder.
    #[inline]
    #[must_use]
    pub const fn tiers(&self) -> &TierLadder {
        &self.tiers
    }

    /// Returns true if there is more than one tier.
    #[must_use]
    pub fn is_upgradable(&self) -> bool {
        self.tiers.len() > 1
    }

    /// Resolves the tier a player owning `owned` tiers would buy next.
    ///
    /// # Errors
    ///
    /// Returns `TierOrder` if `owned` exceeds the number of tiers.
    pub fn resolve_candidate(&self, owned: usize) -> ShopResult<Candidate<'_>> {
        self.tiers.resolve(owned).ok_or_else(|| ShopError::TierOrder {
            entry: self.identifier.clone(),
            owned,
            available: self.tiers.len(),
        })
    }

    /// The tier shown in the shop menu for this player.
    ///
    /// Same as the purchase candidate; a corrupted cache shows the last tier.
    #[must_use]
    pub fn display_tier(&self, cache: &PlayerPurchaseCache) -> &Tier {
        let owned = cache.owned_tier(&self.identifier);
        self.tiers
            .resolve(owned)
            .map_or_else(|| self.tiers.last(), |c| c.tier)
    }
}
