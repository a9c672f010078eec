//! # Purchase Transaction
//!
//! **One buy attempt, all or nothing.**
//!
//! ## States
//!
//! ```text
//! Init -> WeightChecked -> TierResolved -> AffordabilityChecked
//!      -> EventApproved -> CapacityChecked -> Debited -> Committed -> Granted
//! ```
//!
//! Every check runs before the first mutation. A rejection at any checked
//! state leaves the cache, the inventory and the balance exactly as they
//! were. Once `Debited` is reached nothing can abort the purchase, so there
//! is never a debit to roll back.
//!
//! ## Collaborators
//!
//! Everything outside the engine is injected through [`ShopServices`]:
//! the economy backend, the pre-commit hook, the inventory grant service and
//! the presentation services. None of them is looked up from global state.

use std::borrow::Cow;
use std::fmt;

use crate::cache::PlayerPurchaseCache;
use crate::currency::CurrencyKind;
use crate::entry::{EntryFlags, PurchasableEntry};
use crate::error::{ShopError, ShopResult};
use crate::inventory::{Buyer, PlayerId, PlayerInventory};
use crate::ledger::{CurrencyLedger, EconomyService};
use crate::notice::{present, LocalizedMessageService, ShopNotice, Silent, SoundService};
use crate::tier::{ItemGrant, Tier};

/// Progress of a purchase through its state machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum TransactionStage {
    /// Nothing checked yet.
    Init,
    /// Category weight allows this entry.
    WeightChecked,
    /// Candidate tier resolved.
    TierResolved,
    /// Player can pay for the candidate.
    AffordabilityChecked,
    /// Pre-commit hook approved.
    EventApproved,
    /// Inventory has room.
    CapacityChecked,
    /// Currency taken.
    Debited,
    /// Cache updated.
    Committed,
    /// Items handed out.
    Granted,
}

impl TransactionStage {
    /// Returns the stage name for logging.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Init => "INIT",
            Self::WeightChecked => "WEIGHT_CHECKED",
            Self::TierResolved => "TIER_RESOLVED",
            Self::AffordabilityChecked => "AFFORDABILITY_CHECKED",
            Self::EventApproved => "EVENT_APPROVED",
            Self::CapacityChecked => "CAPACITY_CHECKED",
            Self::Debited => "DEBITED",
            Self::Committed => "COMMITTED",
            Self::Granted => "GRANTED",
        }
    }

    /// Returns true once player state has been changed.
    #[must_use]
    pub const fn has_mutated(self) -> bool {
        matches!(self, Self::Debited | Self::Committed | Self::Granted)
    }
}

impl fmt::Display for TransactionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Everything the pre-commit hook gets to see.
#[derive(Clone, Copy, Debug)]
pub struct PurchaseContext<'a> {
    /// The buying player.
    pub player: PlayerId,
    /// The entry being bought.
    pub entry: &'a PurchasableEntry,
    /// The candidate tier.
    pub tier: &'a Tier,
    /// Ladder index of the candidate tier.
    pub tier_index: usize,
    /// True if the purchase re-affirms a maxed entry.
    pub reaffirm: bool,
    /// The player's purchase cache, before any change.
    pub cache: &'a PlayerPurchaseCache,
    /// Menu slot the purchase was made from, if any.
    pub slot: Option<u32>,
}

/// Answer of a pre-commit hook.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HookVerdict {
    /// Let the purchase continue.
    Approve,
    /// Abort silently, without mutation and without a message.
    Cancel,
}

/// Synchronous veto point between the affordability and capacity checks.
///
/// Called exactly once per transaction that gets that far.
pub trait PreCommitHook: Send + Sync {
    /// Inspects the pending purchase.
    fn notify(&self, context: &PurchaseContext<'_>) -> HookVerdict;
}

/// Hook that approves everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct ApproveAll;

impl PreCommitHook for ApproveAll {
    fn notify(&self, _context: &PurchaseContext<'_>) -> HookVerdict {
        HookVerdict::Approve
    }
}

/// Materialises bought items in the player's inventory.
pub trait InventoryGrantService: Send + Sync {
    /// Returns true if the inventory can take at least one more stack.
    fn has_free_slot(&self, inventory: &dyn PlayerInventory) -> bool {
        inventory.has_free_slot()
    }

    /// Gives `items` to the player.
    fn grant(
        &self,
        player: PlayerId,
        inventory: &mut dyn PlayerInventory,
        items: &[ItemGrant],
        flags: EntryFlags,
    );
}

/// Grants items straight into the inventory.
#[derive(Clone, Copy, Debug, Default)]
pub struct DirectGrant;

impl InventoryGrantService for DirectGrant {
    fn grant(
        &self,
        player: PlayerId,
        inventory: &mut dyn PlayerInventory,
        items: &[ItemGrant],
        flags: EntryFlags,
    ) {
        for item in items {
            let leftover = inventory.give(item, flags.unbreakable);
            if leftover > 0 {
                tracing::warn!(
                    "Player {} could not fit {} of {}x{}",
                    player,
                    leftover,
                    item.amount,
                    item.item_id
                );
            }
        }
    }
}

/// The collaborators a purchase runs against.
#[derive(Clone, Copy)]
pub struct ShopServices<'a> {
    /// Economy backend for virtual balances. `None` if not configured.
    pub economy: Option<&'a dyn EconomyService>,
    /// Pre-commit veto hook.
    pub hook: &'a dyn PreCommitHook,
    /// Item grant service.
    pub grants: &'a dyn InventoryGrantService,
    /// Message service.
    pub messages: &'a dyn LocalizedMessageService,
    /// Sound service.
    pub sounds: &'a dyn SoundService,
}

impl<'a> ShopServices<'a> {
    /// No economy, approve everything, grant directly, show nothing.
    #[must_use]
    pub fn silent() -> Self {
        Self {
            economy: None,
            hook: &ApproveAll,
            grants: &DirectGrant,
            messages: &Silent,
            sounds: &Silent,
        }
    }

    /// Sets the economy backend.
    #[must_use]
    pub fn with_economy(mut self, economy: &'a dyn EconomyService) -> Self {
        self.economy = Some(economy);
        self
    }

    /// Sets the pre-commit hook.
    #[must_use]
    pub fn with_hook(mut self, hook: &'a dyn PreCommitHook) -> Self {
        self.hook = hook;
        self
    }

    /// Sets the grant service.
    #[must_use]
    pub fn with_grants(mut self, grants: &'a dyn InventoryGrantService) -> Self {
        self.grants = grants;
        self
    }

    /// Sets the message and sound services.
    #[must_use]
    pub fn with_presentation(
        mut self,
        messages: &'a dyn LocalizedMessageService,
        sounds: &'a dyn SoundService,
    ) -> Self {
        self.messages = messages;
        self.sounds = sounds;
        self
    }
}

impl Default for ShopServices<'_> {
    fn default() -> Self {
        Self::silent()
    }
}

/// What a committed purchase did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PurchaseReceipt {
    /// Identifier of the bought entry.
    pub entry: String,
    /// Owned tier count after the purchase.
    pub owned_tier: usize,
    /// Ordinal of the bought tier.
    pub ordinal: u32,
    /// Price paid.
    pub price: u32,
    /// Currency paid in.
    pub currency: CurrencyKind,
    /// Amount actually taken by the ledger.
    pub debited: u64,
    /// Items handed to the player.
    pub granted: Vec<ItemGrant>,
    /// True if the purchase re-affirmed a maxed entry.
    pub reaffirmed: bool,
}

/// Terminal result of a purchase that did not fail.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PurchaseOutcome {
    /// Purchase committed and items granted.
    Completed(PurchaseReceipt),
    /// The pre-commit hook cancelled. Nothing changed.
    Vetoed,
}

impl PurchaseOutcome {
    /// The receipt, if the purchase completed.
    #[must_use]
    pub const fn receipt(&self) -> Option<&PurchaseReceipt> {
        match self {
            Self::Completed(receipt) => Some(receipt),
            Self::Vetoed => None,
        }
    }
}

/// One purchase attempt of one entry.
pub struct PurchaseTransaction<'a> {
    entry: &'a PurchasableEntry,
    services: ShopServices<'a>,
    slot: Option<u32>,
    stage: TransactionStage,
}

impl<'a> PurchaseTransaction<'a> {
    /// Creates a transaction for `entry`.
    #[must_use]
    pub fn new(entry: &'a PurchasableEntry, services: ShopServices<'a>) -> Self {
        Self {
            entry,
            services,
            slot: None,
            stage: TransactionStage::Init,
        }
    }

    /// Records the menu slot the purchase was made from.
    #[must_use]
    pub const fn from_slot(mut self, slot: u32) -> Self {
        self.slot = Some(slot);
        self
    }

    /// Current stage.
    #[must_use]
    pub const fn stage(&self) -> TransactionStage {
        self.stage
    }

    /// Runs the purchase to a terminal state and notifies the player.
    ///
    /// # Errors
    ///
    /// - `AlreadyHigherTier` if a heavier entry of the category is owned
    /// - `TierOrder` if the cache holds more tiers than the entry has
    /// - `AlreadyBought` if the entry is permanent and maxed
    /// - `EconomyUnavailable` for virtual balance without a backend
    /// - `InsufficientFunds` if the player can't pay
    /// - `InsufficientSpace` if the inventory is full
    ///
    /// None of these leave any trace in `cache` or `buyer`.
    pub fn execute(
        mut self,
        cache: &mut PlayerPurchaseCache,
        buyer: &mut Buyer<'_>,
    ) -> ShopResult<PurchaseOutcome> {
        let result = self.run(cache, buyer);
        self.report(buyer.id, &result);
        result
    }

    fn advance(&mut self, next: TransactionStage) {
        tracing::trace!(
            "Purchase {}: {} -> {}",
            self.entry.identifier(),
            self.stage,
            next
        );
        self.stage = next;
    }

    fn run(
        &mut self,
        cache: &mut PlayerPurchaseCache,
        buyer: &mut Buyer<'_>,
    ) -> ShopResult<PurchaseOutcome> {
        let entry = self.entry;

        // 1. Category weight
        let held = cache.category_weight(entry.category());
        if held > entry.weight() {
            return Err(ShopError::AlreadyHigherTier {
                category: entry.category().to_string(),
                held,
                weight: entry.weight(),
            });
        }
        self.advance(TransactionStage::WeightChecked);

        // 2. Candidate tier
        let owned = cache.owned_tier(entry.identifier());
        let candidate = entry.resolve_candidate(owned).map_err(|e| {
            tracing::error!("Wrong tier order at {}: {}", entry.identifier(), e);
            e
        })?;
        if candidate.reaffirm && entry.is_permanent() && cache.has_any(entry) {
            return Err(ShopError::AlreadyBought {
                entry: entry.identifier().to_string(),
            });
        }
        let tier = candidate.tier;
        self.advance(TransactionStage::TierResolved);

        // 3. Affordability
        let ledger = CurrencyLedger::new(self.services.economy);
        let funds = ledger.query(buyer, tier.currency)?;
        if funds < u64::from(tier.price) {
            return Err(ShopError::InsufficientFunds {
                currency: tier.currency,
                price: tier.price,
                available: funds,
            });
        }
        self.advance(TransactionStage::AffordabilityChecked);

        // 4. Pre-commit hook
        let context = PurchaseContext {
            player: buyer.id,
            entry,
            tier,
            tier_index: candidate.index,
            reaffirm: candidate.reaffirm,
            cache,
            slot: self.slot,
        };
        if self.services.hook.notify(&context) == HookVerdict::Cancel {
            tracing::debug!(
                "Purchase of {} by player {} cancelled by hook",
                entry.identifier(),
                buyer.id
            );
            return Ok(PurchaseOutcome::Vetoed);
        }
        self.advance(TransactionStage::EventApproved);

        // 5. Capacity
        if !self.services.grants.has_free_slot(&*buyer.inventory) {
            return Err(ShopError::InsufficientSpace);
        }
        self.advance(TransactionStage::CapacityChecked);

        // 6. Debit - no way back after this point
        let debited = ledger.debit(buyer, tier.currency, tier.price)?;
        self.advance(TransactionStage::Debited);

        // 7. Commit
        // The candidate rule keeps owned_after within owned..=len
        let owned_after = candidate.owned_after();
        debug_assert!(owned_after >= owned && owned_after <= entry.tiers().len());
        cache.record_owned(entry.identifier(), owned_after);
        cache.set_category_weight(entry.category(), entry.weight());
        self.advance(TransactionStage::Committed);

        // 8. Grant the tier that is now owned
        self.services
            .grants
            .grant(buyer.id, buyer.inventory, &tier.grants, entry.flags());
        self.advance(TransactionStage::Granted);

        tracing::info!(
            "Player {} bought {} tier {} for {} {}",
            buyer.id,
            entry.identifier(),
            tier.ordinal,
            tier.price,
            tier.currency
        );

        Ok(PurchaseOutcome::Completed(PurchaseReceipt {
            entry: entry.identifier().to_string(),
            owned_tier: owned_after,
            ordinal: tier.ordinal,
            price: tier.price,
            currency: tier.currency,
            debited,
            granted: tier.grants.clone(),
            reaffirmed: candidate.reaffirm,
        }))
    }

    /// Presents the terminal outcome. Veto and operator faults stay silent.
    fn report(&self, player: PlayerId, result: &ShopResult<PurchaseOutcome>) {
        let notice = match result {
            Ok(PurchaseOutcome::Completed(receipt)) => Some(ShopNotice::Purchased {
                entry: receipt.entry.clone(),
                tier: if self.entry.is_upgradable() {
                    crate::currency::roman_numeral(receipt.ordinal)
                } else {
                    Cow::Borrowed("")
                },
            }),
            Ok(PurchaseOutcome::Vetoed) => None,
            Err(e) => {
                tracing::debug!(
                    "Purchase of {} by player {} rejected after {}: {}",
                    self.entry.identifier(),
                    player,
                    self.stage,
                    e
                );
                e.notice()
            }
        };

        if let Some(notice) = notice {
            present(self.services.messages, self.services.sounds, player, &notice);
        }
    }
}
