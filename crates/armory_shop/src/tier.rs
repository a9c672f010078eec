//! # Tier Ladder
//!
//! An ordered sequence of purchase tiers for one shop entry.
//!
//! Tiers are 1-indexed when talking to players (`tier1`, `tier2`, ...) and
//! 0-indexed in the ladder. A player who owns `n` tiers owns ladder indices
//! `0..n`.
//!
//! ## Candidate resolution
//!
//! ```text
//! owned == len   -> index len-1   (re-affirm the maxed tier, no increment)
//! owned == 0     -> index 0
//! otherwise      -> index owned   (the next tier up)
//! owned >  len   -> corrupted cache, no candidate
//! ```

use serde::{Deserialize, Serialize};

use crate::currency::{roman_numeral, CurrencyKind};
use crate::inventory::ItemId;

fn default_amount() -> u32 {
    1
}

/// One item handed to the player when a tier is bought.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemGrant {
    /// Item type to give.
    #[serde(rename = "item")]
    pub item_id: ItemId,
    /// Quantity to give.
    #[serde(default = "default_amount")]
    pub amount: u32,
}

impl ItemGrant {
    /// Creates a new item grant.
    #[must_use]
    pub fn new(item_id: impl Into<ItemId>, amount: u32) -> Self {
        Self {
            item_id: item_id.into(),
            amount,
        }
    }
}

/// One purchasable level of an entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tier {
    /// Price in `currency` units.
    pub price: u32,
    /// Currency the price is paid in.
    pub currency: CurrencyKind,
    /// Items granted when this tier is bought.
    pub grants: Vec<ItemGrant>,
    /// Tier number shown to players (the `N` of `tierN`).
    pub ordinal: u32,
}

impl Tier {
    /// Creates a tier with no granted items.
    #[must_use]
    pub const fn new(ordinal: u32, price: u32, currency: CurrencyKind) -> Self {
        Self {
            price,
            currency,
            grants: Vec::new(),
            ordinal,
        }
    }

    /// Adds a granted item.
    #[must_use]
    pub fn with_grant(mut self, item_id: impl Into<ItemId>, amount: u32) -> Self {
        self.grants.push(ItemGrant::new(item_id, amount));
        self
    }

    /// The ordinal as a Roman numeral.
    #[must_use]
    pub fn numeral(&self) -> std::borrow::Cow<'static, str> {
        roman_numeral(self.ordinal)
    }
}

/// The tier a purchase attempt would buy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Candidate<'a> {
    /// Ladder index of the candidate (0-based).
    pub index: usize,
    /// The candidate tier.
    pub tier: &'a Tier,
    /// True when the entry is maxed and the purchase only re-affirms it.
    pub reaffirm: bool,
}

impl Candidate<'_> {
    /// Owned tier count after this candidate is committed.
    ///
    /// One more than before, or unchanged on a re-affirm.
    #[inline]
    #[must_use]
    pub const fn owned_after(&self) -> usize {
        self.index + 1
    }
}

/// An ordered, non-empty sequence of tiers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TierLadder {
    tiers: Vec<Tier>,
}

#[allow(clippy::len_without_is_empty)]
impl TierLadder {
    /// Creates a ladder. Returns `None` for an empty tier list.
    #[must_use]
    pub fn new(tiers: Vec<Tier>) -> Option<Self> {
        if tiers.is_empty() {
            None
        } else {
            Some(Self { tiers })
        }
    }

    /// Number of tiers. Never zero.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.tiers.len()
    }

    /// Gets a tier by ladder index.
    #[inline]
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Tier> {
        self.tiers.get(index)
    }

    /// The highest tier.
    #[must_use]
    pub fn last(&self) -> &Tier {
        &self.tiers[self.tiers.len() - 1]
    }

    /// Iterates tiers from lowest to highest.
    pub fn iter(&self) -> impl Iterator<Item = &Tier> {
        self.tiers.iter()
    }

    /// Ladder index of the candidate tier for a player owning `owned` tiers.
    ///
    /// `None` if `owned` exceeds the ladder (corrupted cache or config).
    #[must_use]
    pub fn candidate_index(&self, owned: usize) -> Option<usize> {
        let len = self.tiers.len();
        if owned > len {
            None
        } else if owned == len {
            Some(len - 1)
        } else {
            Some(owned)
        }
    }

    /// Resolves the candidate tier for a player owning `owned` tiers.
    #[must_use]
    pub fn resolve(&self, owned: usize) -> Option<Candidate<'_>> {
        let index = self.candidate_index(owned)?;
        Some(Candidate {
            index,
            tier: &self.tiers[index],
            reaffirm: owned == self.tiers.len(),
        })
    }
}
