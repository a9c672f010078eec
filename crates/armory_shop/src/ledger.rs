//! # Currency Ledger
//!
//! Reads and debits the currency a tier is priced in.
//!
//! - **Item currencies** are counted across the player's inventory and
//!   removed stack by stack in slot order.
//! - **Virtual balance** is delegated to an [`EconomyService`]. Without a
//!   working backend every query fails with `EconomyUnavailable`, so a
//!   transaction aborts at its affordability check, before any mutation.
//!
//! The ledger never validates on its own: the transaction checks funds
//! first and debits only after every check has passed.

use crate::currency::CurrencyKind;
use crate::error::{ShopError, ShopResult};
use crate::inventory::{Buyer, PlayerId, PlayerInventory};

/// External economy backend holding virtual balances.
pub trait EconomyService: Send + Sync {
    /// Returns true if the backend is up and usable.
    fn is_available(&self) -> bool;

    /// Current balance of a player.
    fn balance(&self, player: PlayerId) -> u64;

    /// Withdraws `amount` from a player's balance.
    fn withdraw(&self, player: PlayerId, amount: u64);
}

/// Currency access for one purchase.
#[derive(Clone, Copy, Default)]
pub struct CurrencyLedger<'a> {
    economy: Option<&'a dyn EconomyService>,
}

impl<'a> CurrencyLedger<'a> {
    /// Creates a ledger. `None` means no economy backend is configured.
    #[must_use]
    pub fn new(economy: Option<&'a dyn EconomyService>) -> Self {
        Self { economy }
    }

    /// The economy backend, if one is configured and available.
    fn backend(&self) -> ShopResult<&'a dyn EconomyService> {
        match self.economy {
            Some(economy) if economy.is_available() => Ok(economy),
            _ => Err(ShopError::EconomyUnavailable),
        }
    }

    /// How much of `currency` the buyer holds.
    ///
    /// # Errors
    ///
    /// Returns `EconomyUnavailable` for the virtual balance when no backend
    /// is available.
    pub fn query(&self, buyer: &Buyer<'_>, currency: CurrencyKind) -> ShopResult<u64> {
        match currency.material() {
            Some(material) => Ok(buyer.inventory.count_item(material)),
            None => Ok(self.backend()?.balance(buyer.id)),
        }
    }

    /// Takes `amount` of `currency` from the buyer. Returns the amount taken.
    ///
    /// Item debits are best effort: they never take more than the player
    /// holds and never fail.
    ///
    /// # Errors
    ///
    /// Returns `EconomyUnavailable` for the virtual balance when no backend
    /// is available.
    pub fn debit(&self, buyer: &mut Buyer<'_>, currency: CurrencyKind, amount: u32) -> ShopResult<u64> {
        match currency.material() {
            Some(material) => Ok(take_items(buyer.inventory, material, amount)),
            None => {
                let economy = self.backend()?;
                economy.withdraw(buyer.id, u64::from(amount));
                Ok(u64::from(amount))
            }
        }
    }
}

/// Removes up to `amount` items of `material`, draining matching stacks in
/// slot order. Returns how many were removed.
pub fn take_items(inventory: &mut dyn PlayerInventory, material: &str, amount: u32) -> u64 {
    let mut remaining = amount;

    for slot in 0..inventory.capacity() {
        if remaining == 0 {
            break;
        }
        let matches = inventory
            .stack(slot)
            .is_some_and(|stack| stack.item_id == material);
        if matches {
            remaining -= inventory.take_from_slot(slot, remaining).min(remaining);
        }
    }

    u64::from(amount - remaining)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::{ItemStack, SlotInventory};
    use crate::tier::ItemGrant;
    use parking_lot::Mutex;

    struct FixedEconomy {
        balance: Mutex<u64>,
        available: bool,
    }

    impl EconomyService for FixedEconomy {
        fn is_available(&self) -> bool {
            self.available
        }

        fn balance(&self, _player: PlayerId) -> u64 {
            *self.balance.lock()
        }

        fn withdraw(&self, _player: PlayerId, amount: u64) {
            let mut balance = self.balance.lock();
            *balance = balance.saturating_sub(amount);
        }
    }

    fn iron_in_slots(counts: &[(usize, u32)]) -> SlotInventory {
        let mut inv = SlotInventory::with_capacity(9);
        for &(slot, count) in counts {
            inv.set(slot, Some(ItemStack::new("iron_ingot", count)));
        }
        inv
    }

    #[test]
    fn test_query_items() {
        let mut inv = iron_in_slots(&[(0, 3), (4, 10)]);
        inv.add("gold_ingot", 2, false);
        let buyer = Buyer::new(1, &mut inv);
        let ledger = CurrencyLedger::new(None);

        assert_eq!(ledger.query(&buyer, CurrencyKind::Iron).unwrap(), 13);
        assert_eq!(ledger.query(&buyer, CurrencyKind::Gold).unwrap(), 2);
        assert_eq!(ledger.query(&buyer, CurrencyKind::Emerald).unwrap(), 0);
    }

    #[test]
    fn test_debit_spills_across_stacks_in_slot_order() {
        let mut inv = iron_in_slots(&[(1, 3), (5, 10), (7, 4)]);
        let taken = take_items(&mut inv, "iron_ingot", 8);

        assert_eq!(taken, 8);
        assert!(inv.stack(1).is_none());
        assert_eq!(inv.stack(5).map(|s| s.count), Some(5));
        // Later stacks are untouched once the amount is covered
        assert_eq!(inv.stack(7).map(|s| s.count), Some(4));
    }

    #[test]
    fn test_debit_is_best_effort() {
        let mut inv = iron_in_slots(&[(0, 2)]);
        assert_eq!(take_items(&mut inv, "iron_ingot", 5), 2);
        assert_eq!(inv.count_item("iron_ingot"), 0);
    }

    #[test]
    fn test_virtual_balance_without_backend() {
        let mut inv = SlotInventory::new();
        let mut buyer = Buyer::new(1, &mut inv);
        let ledger = CurrencyLedger::new(None);

        assert_eq!(
            ledger.query(&buyer, CurrencyKind::VirtualBalance),
            Err(ShopError::EconomyUnavailable)
        );
        assert_eq!(
            ledger.debit(&mut buyer, CurrencyKind::VirtualBalance, 5),
            Err(ShopError::EconomyUnavailable)
        );
    }

    #[test]
    fn test_virtual_balance_backend_down() {
        let economy = FixedEconomy {
            balance: Mutex::new(100),
            available: false,
        };
        let mut inv = SlotInventory::new();
        let buyer = Buyer::new(1, &mut inv);
        let ledger = CurrencyLedger::new(Some(&economy));

        assert_eq!(
            ledger.query(&buyer, CurrencyKind::VirtualBalance),
            Err(ShopError::EconomyUnavailable)
        );
    }

    #[test]
    fn test_virtual_balance_debit() {
        let economy = FixedEconomy {
            balance: Mutex::new(100),
            available: true,
        };
        let mut inv = SlotInventory::new();
        let mut buyer = Buyer::new(1, &mut inv);
        let ledger = CurrencyLedger::new(Some(&economy));

        assert_eq!(ledger.query(&buyer, CurrencyKind::VirtualBalance).unwrap(), 100);
        assert_eq!(ledger.debit(&mut buyer, CurrencyKind::VirtualBalance, 30).unwrap(), 30);
        assert_eq!(ledger.query(&buyer, CurrencyKind::VirtualBalance).unwrap(), 70);
    }

    /// Empties the whole slot whatever amount is asked for.
    struct WholeStackInventory(SlotInventory);

    impl PlayerInventory for WholeStackInventory {
        fn capacity(&self) -> usize {
            self.0.capacity()
        }

        fn stack(&self, slot: usize) -> Option<&ItemStack> {
            self.0.stack(slot)
        }

        fn take_from_slot(&mut self, slot: usize, _amount: u32) -> u32 {
            let count = self.0.stack(slot).map_or(0, |stack| stack.count);
            self.0.set(slot, None);
            count
        }

        fn give(&mut self, grant: &ItemGrant, unbreakable: bool) -> u32 {
            self.0.give(grant, unbreakable)
        }
    }

    #[test]
    fn test_take_items_caps_at_requested_amount() {
        let mut inv = WholeStackInventory(iron_in_slots(&[(0, 3), (2, 10)]));

        assert_eq!(take_items(&mut inv, "iron_ingot", 5), 5);
        assert_eq!(inv.count_item("iron_ingot"), 0);
    }
}
