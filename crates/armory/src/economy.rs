//! # In-Memory Economy
//!
//! Virtual balances kept in process memory. Stands in for an external
//! economy plugin on test servers and in the simulator.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use armory_shop::{EconomyService, PlayerId};

/// Balances by player.
pub struct InMemoryEconomy {
    balances: parking_lot::RwLock<HashMap<PlayerId, u64>>,
    available: AtomicBool,
}

impl InMemoryEconomy {
    /// Creates an available economy with no balances.
    #[must_use]
    pub fn new() -> Self {
        Self {
            balances: parking_lot::RwLock::new(HashMap::new()),
            available: AtomicBool::new(true),
        }
    }

    /// Adds `amount` to a player's balance. Returns the new balance.
    pub fn deposit(&self, player: PlayerId, amount: u64) -> u64 {
        let mut balances = self.balances.write();
        let balance = balances.entry(player).or_insert(0);
        *balance = balance.saturating_add(amount);
        *balance
    }

    /// Takes the backend up or down.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::Release);
        tracing::info!(
            "Economy backend {}",
            if available { "online" } else { "offline" }
        );
    }
}

impl Default for InMemoryEconomy {
    fn default() -> Self {
        Self::new()
    }
}

impl EconomyService for InMemoryEconomy {
    fn is_available(&self) -> bool {
        self.available.load(Ordering::Acquire)
    }

    fn balance(&self, player: PlayerId) -> u64 {
        self.balances.read().get(&player).copied().unwrap_or(0)
    }

    fn withdraw(&self, player: PlayerId, amount: u64) {
        let mut balances = self.balances.write();
        let balance = balances.entry(player).or_insert(0);
        *balance = balance.saturating_sub(amount);
    }
}
