//! # ARMORY Shop
//!
//! Tiered purchase engine for the ARMORY arena game.
//!
//! ## Design Principles
//!
//! 1. **Validate, then mutate** - Every check runs before the first debit
//! 2. **All-or-nothing** - A purchase either debits, commits and grants, or
//!    leaves no trace
//! 3. **Monotonic tiers** - Owned tiers only move up during a session
//! 4. **External configuration** - All shop data in TOML files
//!
//! ## Purchase Flow
//!
//! ```text
//! weight check -> candidate tier -> funds -> pre-commit hook
//!              -> free slot -> debit -> commit -> grant -> notice
//! ```
//!
//! ## Thread Safety
//!
//! Catalogs are immutable and shared. Each player's purchases are serialised
//! through their [`ShopSession`]; different players never contend.
//!
//! ## Example
//!
//! ```rust,ignore
//! use armory_shop::{Shop, ShopServices, TomlConfigSource};
//!
//! let shop = Shop::load(&TomlConfigSource::from_file("data/shop.toml")?);
//! shop.open_session(player);
//!
//! let outcome = shop.purchase(
//!     player,
//!     "melee.sword",
//!     &mut inventory,
//!     ShopServices::silent().with_economy(&economy),
//! )?;
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod cache;
pub mod catalog;
pub mod currency;
pub mod entry;
pub mod error;
pub mod inventory;
pub mod ledger;
pub mod listing;
pub mod notice;
pub mod session;
pub mod tier;
pub mod transaction;

pub use cache::PlayerPurchaseCache;
pub use catalog::{
    ConfigSource, ContentConfig, ContentPath, DisabledEntry, ShopCatalog, TierConfig,
    TomlConfigSource,
};
pub use currency::{roman_numeral, CurrencyColor, CurrencyKind};
pub use entry::{EntryFlags, PurchasableEntry};
pub use error::{NoticeError, ShopError, ShopResult};
pub use inventory::{Buyer, ItemId, ItemStack, PlayerId, PlayerInventory, SlotInventory};
pub use ledger::{CurrencyLedger, EconomyService};
pub use listing::{BuyStatus, ShopListing};
pub use notice::{LocalizedMessageService, ShopNotice, ShopSound, Silent, SoundService};
pub use session::{SessionRegistry, Shop, ShopSession};
pub use tier::{Candidate, ItemGrant, Tier, TierLadder};
pub use transaction::{
    ApproveAll, DirectGrant, HookVerdict, InventoryGrantService, PreCommitHook, PurchaseContext,
    PurchaseOutcome, PurchaseReceipt, PurchaseTransaction, ShopServices, TransactionStage,
};
