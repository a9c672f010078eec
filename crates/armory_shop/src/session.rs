//! # Shop Sessions
//!
//! The server-facing entry point. [`Shop`] holds the current catalog and one
//! [`ShopSession`] per player, and runs purchases against them.
//!
//! ## Thread Safety
//!
//! - The catalog is an immutable `Arc<ShopCatalog>` behind a
//!   `parking_lot::RwLock`. A reload swaps the `Arc`; purchases in flight
//!   keep the snapshot they started with.
//! - Each session sits behind a `ReentrantMutex<RefCell<_>>`. Purchases of
//!   different players run in parallel, purchases of one player are
//!   serialised. A nested call for the same player on the same thread (from
//!   a pre-commit hook, say) fails the `RefCell` borrow and is rejected with
//!   `ReentrantPurchase` instead of deadlocking.

use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::ReentrantMutex;

use crate::cache::PlayerPurchaseCache;
use crate::catalog::{ConfigSource, ShopCatalog};
use crate::error::{ShopError, ShopResult};
use crate::inventory::{Buyer, PlayerId, PlayerInventory};
use crate::ledger::CurrencyLedger;
use crate::listing::ShopListing;
use crate::transaction::{PurchaseOutcome, PurchaseTransaction, ShopServices};

/// One player's shop state for the length of a game.
#[derive(Clone, Debug)]
pub struct ShopSession {
    player: PlayerId,
    cache: PlayerPurchaseCache,
}

impl ShopSession {
    /// Creates an empty session.
    #[must_use]
    pub fn new(player: PlayerId) -> Self {
        Self {
            player,
            cache: PlayerPurchaseCache::new(),
        }
    }

    /// Owner of the session.
    #[must_use]
    pub const fn player(&self) -> PlayerId {
        self.player
    }

    /// Purchase cache.
    #[must_use]
    pub const fn cache(&self) -> &PlayerPurchaseCache {
        &self.cache
    }

    /// Mutable purchase cache.
    pub fn cache_mut(&mut self) -> &mut PlayerPurchaseCache {
        &mut self.cache
    }
}

type SessionHandle = Arc<ReentrantMutex<RefCell<ShopSession>>>;

/// Open sessions by player.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: parking_lot::RwLock<HashMap<PlayerId, SessionHandle>>,
}

impl SessionRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a session for `player`. Returns false if one was already open;
    /// the existing session is kept.
    pub fn open(&self, player: PlayerId) -> bool {
        let mut sessions = self.sessions.write();
        if sessions.contains_key(&player) {
            return false;
        }
        sessions.insert(
            player,
            Arc::new(ReentrantMutex::new(RefCell::new(ShopSession::new(player)))),
        );
        tracing::debug!("Opened shop session for player {}", player);
        true
    }

    /// Closes the session of `player` and returns its final cache.
    ///
    /// Returns `None` if no session is open, or if called from inside a
    /// purchase of the same player. In the latter case the session stays
    /// open.
    pub fn close(&self, player: PlayerId) -> Option<PlayerPurchaseCache> {
        let handle = self.handle(player).ok()?;

        // Waits for a purchase in flight on another thread
        let guard = handle.lock();
        let Ok(mut session) = guard.try_borrow_mut() else {
            tracing::warn!("Refused to close session of player {} during its purchase", player);
            return None;
        };

        let mut sessions = self.sessions.write();
        // Closed by another thread while this one waited
        if !sessions
            .get(&player)
            .is_some_and(|current| Arc::ptr_eq(current, &handle))
        {
            return None;
        }
        sessions.remove(&player);
        drop(sessions);

        tracing::debug!("Closed shop session for player {}", player);
        Some(std::mem::take(&mut session.cache))
    }

    /// Returns true if `player` has an open session.
    #[must_use]
    pub fn is_open(&self, player: PlayerId) -> bool {
        self.sessions.read().contains_key(&player)
    }

    /// Number of open sessions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    /// Returns true if no session is open.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }

    fn handle(&self, player: PlayerId) -> ShopResult<SessionHandle> {
        self.sessions
            .read()
            .get(&player)
            .cloned()
            .ok_or(ShopError::NoSession(player))
    }

    /// Runs `f` with exclusive access to the session of `player`.
    ///
    /// Blocks while another thread works on the same session.
    ///
    /// # Errors
    ///
    /// - `NoSession` if no session is open
    /// - `ReentrantPurchase` if this thread is already inside the session
    pub fn with_session<R>(
        &self,
        player: PlayerId,
        f: impl FnOnce(&mut ShopSession) -> R,
    ) -> ShopResult<R> {
        // The registry lock is released before the session is locked
        let handle = self.handle(player)?;
        let guard = handle.lock();
        let mut session = guard
            .try_borrow_mut()
            .map_err(|_| ShopError::ReentrantPurchase(player))?;
        Ok(f(&mut session))
    }

    /// Copy of the cache of `player`.
    ///
    /// # Errors
    ///
    /// - `NoSession` if no session is open
    /// - `ReentrantPurchase` if called from inside a purchase of the player
    pub fn snapshot(&self, player: PlayerId) -> ShopResult<PlayerPurchaseCache> {
        let handle = self.handle(player)?;
        let guard = handle.lock();
        let session = guard
            .try_borrow()
            .map_err(|_| ShopError::ReentrantPurchase(player))?;
        Ok(session.cache.clone())
    }
}

/// Catalog plus player sessions.
///
/// ```rust,ignore
/// let shop = Shop::load(&TomlConfigSource::from_file("data/shop.toml")?);
/// shop.open_session(player);
///
/// let mut buyer_inventory = platform.inventory_of(player);
/// match shop.purchase(player, "melee.sword", &mut buyer_inventory, services) {
///     Ok(PurchaseOutcome::Completed(receipt)) => log_receipt(receipt),
///     Ok(PurchaseOutcome::Vetoed) => {}
///     Err(e) if e.is_user_facing() => {} // already shown to the player
///     Err(e) => tracing::warn!("Shop fault: {e}"),
/// }
/// ```
pub struct Shop {
    catalog: parking_lot::RwLock<Arc<ShopCatalog>>,
    sessions: SessionRegistry,
}

impl Shop {
    /// Creates a shop around a catalog.
    #[must_use]
    pub fn new(catalog: ShopCatalog) -> Self {
        Self {
            catalog: parking_lot::RwLock::new(Arc::new(catalog)),
            sessions: SessionRegistry::new(),
        }
    }

    /// Loads the catalog from `source`.
    #[must_use]
    pub fn load(source: &dyn ConfigSource) -> Self {
        Self::new(ShopCatalog::load(source))
    }

    /// Replaces the catalog with a fresh load of `source`.
    ///
    /// Sessions are kept; cache entries of removed entries are ignored until
    /// the next death or session end.
    pub fn reload(&self, source: &dyn ConfigSource) -> Arc<ShopCatalog> {
        let catalog = Arc::new(ShopCatalog::load(source));
        *self.catalog.write() = Arc::clone(&catalog);
        tracing::info!("Shop catalog reloaded ({} entries)", catalog.len());
        catalog
    }

    /// Current catalog snapshot.
    #[must_use]
    pub fn catalog(&self) -> Arc<ShopCatalog> {
        Arc::clone(&self.catalog.read())
    }

    /// Player sessions.
    #[must_use]
    pub const fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }

    /// Opens a session for `player`.
    pub fn open_session(&self, player: PlayerId) -> bool {
        self.sessions.open(player)
    }

    /// Closes the session of `player`.
    pub fn close_session(&self, player: PlayerId) -> Option<PlayerPurchaseCache> {
        self.sessions.close(player)
    }

    /// Buys the next tier of `entry_id` for `player`.
    ///
    /// # Errors
    ///
    /// - `UnknownEntry` if the entry is not loaded
    /// - `NoSession` if the player has no open session
    /// - `ReentrantPurchase` if the player already has a purchase in flight
    ///   on this thread
    /// - any error of [`PurchaseTransaction::execute`]
    pub fn purchase(
        &self,
        player: PlayerId,
        entry_id: &str,
        inventory: &mut dyn PlayerInventory,
        services: ShopServices<'_>,
    ) -> ShopResult<PurchaseOutcome> {
        let catalog = self.catalog();
        let entry = catalog
            .entry(entry_id)
            .ok_or_else(|| ShopError::UnknownEntry(entry_id.to_string()))?;

        self.sessions.with_session(player, |session| {
            let mut buyer = Buyer::new(player, inventory);
            PurchaseTransaction::new(entry, services).execute(&mut session.cache, &mut buyer)
        })?
    }

    /// Menu listing of `entry_id` for `player`.
    ///
    /// # Errors
    ///
    /// `UnknownEntry`, `NoSession` or `ReentrantPurchase`.
    pub fn listing(
        &self,
        player: PlayerId,
        entry_id: &str,
        inventory: &mut dyn PlayerInventory,
        ledger: &CurrencyLedger<'_>,
    ) -> ShopResult<ShopListing> {
        let catalog = self.catalog();
        let entry = catalog
            .entry(entry_id)
            .ok_or_else(|| ShopError::UnknownEntry(entry_id.to_string()))?;

        let cache = self.sessions.snapshot(player)?;
        let buyer = Buyer::new(player, inventory);
        Ok(ShopListing::for_entry(entry, &cache, ledger, &buyer))
    }

    /// Owned tier count of `entry_id` for `player`.
    ///
    /// # Errors
    ///
    /// `NoSession` or `ReentrantPurchase`.
    pub fn owned_tier(&self, player: PlayerId, entry_id: &str) -> ShopResult<usize> {
        Ok(self.sessions.snapshot(player)?.owned_tier(entry_id))
    }

    /// Applies the death policy to the cache of `player`.
    ///
    /// # Errors
    ///
    /// `NoSession` or `ReentrantPurchase`.
    pub fn on_death(&self, player: PlayerId) -> ShopResult<()> {
        let catalog = self.catalog();
        self.sessions
            .with_session(player, |session| session.cache.apply_death_policy(&catalog))
    }
}
