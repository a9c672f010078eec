//! # Player Purchase Cache
//!
//! Per-player, per-session purchase state:
//! - how many tiers of each entry the player owns (0 = none)
//! - the highest weight bought in each category, which blocks buying a
//!   lighter entry of the same category afterwards
//!
//! Entries and categories are referenced by identifier only; the cache owns
//! no catalog data. A cache belongs to exactly one session and is never
//! shared between threads.

use std::collections::HashMap;

use crate::catalog::ShopCatalog;
use crate::entry::PurchasableEntry;
use crate::error::{ShopError, ShopResult};

/// Owned tiers and category weights of one player.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PlayerPurchaseCache {
    /// Owned tier count by entry identifier. Absent means 0.
    owned: HashMap<String, usize>,
    /// Highest weight bought by category identifier. Absent means 0.
    category_weights: HashMap<String, u8>,
}

impl PlayerPurchaseCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tiers owned of an entry. 0 if none.
    #[inline]
    #[must_use]
    pub fn owned_tier(&self, identifier: &str) -> usize {
        self.owned.get(identifier).copied().unwrap_or(0)
    }

    /// Returns true if the player owns at least one tier of `entry`.
    #[inline]
    #[must_use]
    pub fn has_any(&self, entry: &PurchasableEntry) -> bool {
        self.owned_tier(entry.identifier()) > 0
    }

    /// Highest weight bought in a category. 0 if none.
    #[inline]
    #[must_use]
    pub fn category_weight(&self, category: &str) -> u8 {
        self.category_weights.get(category).copied().unwrap_or(0)
    }

    /// Records that the player now owns `owned` tiers of `entry`.
    ///
    /// # Errors
    ///
    /// Returns `TierOrder` if `owned` exceeds the ladder or would lower the
    /// currently owned tier. Lowering only happens through
    /// [`Self::apply_death_policy`].
    pub fn commit_upgrade(&mut self, entry: &PurchasableEntry, owned: usize) -> ShopResult<()> {
        let available = entry.tiers().len();
        let current = self.owned_tier(entry.identifier());

        if owned > available || owned < current {
            return Err(ShopError::TierOrder {
                entry: entry.identifier().to_string(),
                owned,
                available,
            });
        }

        self.record_owned(entry.identifier(), owned);
        Ok(())
    }

    /// Stores an owned tier count that the caller already validated.
    pub(crate) fn record_owned(&mut self, identifier: &str, owned: usize) {
        self.owned.insert(identifier.to_string(), owned);
    }

    /// Raises the weight watermark of a category. Never lowers it.
    pub fn set_category_weight(&mut self, category: &str, weight: u8) {
        let held = self.category_weights.entry(category.to_string()).or_insert(0);
        *held = (*held).max(weight);
    }

    /// Iterates `(identifier, owned tiers)` for every entry with a tier.
    pub fn owned_entries(&self) -> impl Iterator<Item = (&str, usize)> {
        self.owned
            .iter()
            .filter(|(_, &owned)| owned > 0)
            .map(|(id, &owned)| (id.as_str(), owned))
    }

    /// Applies the respawn rules after the player dies.
    ///
    /// - permanent and downgradable entries are kept
    /// - downgradable entries lose one tier, never dropping below tier 1,
    ///   whether or not they are also permanent
    /// - everything else is forgotten, as are entries missing from `catalog`
    ///
    /// Category weights are rebuilt from the surviving entries.
    pub fn apply_death_policy(&mut self, catalog: &ShopCatalog) {
        let mut kept = HashMap::with_capacity(self.owned.len());
        let mut weights: HashMap<String, u8> = HashMap::new();

        for (identifier, &owned) in &self.owned {
            if owned == 0 {
                continue;
            }
            let Some(entry) = catalog.entry(identifier) else {
                continue;
            };

            if !entry.is_permanent() && !entry.is_downgradable() {
                continue;
            }
            let survived = if entry.is_downgradable() {
                owned.saturating_sub(1).max(1)
            } else {
                owned
            };

            kept.insert(identifier.clone(), survived);
            let held = weights.entry(entry.category().to_string()).or_insert(0);
            *held = (*held).max(entry.weight());
        }

        tracing::debug!(
            "Death policy kept {} of {} cached entries",
            kept.len(),
            self.owned.len()
        );

        self.owned = kept;
        self.category_weights = weights;
    }

    /// Forgets everything. Used when the session ends.
    pub fn clear(&mut self) {
        self.owned.clear();
        self.category_weights.clear();
    }
}
