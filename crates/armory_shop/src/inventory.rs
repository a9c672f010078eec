//! # Inventory Boundary
//!
//! The shop never owns a player's inventory. The platform exposes it through
//! [`PlayerInventory`], a slot-level view just wide enough to count currency
//! stacks, remove currency, probe for a free slot and hand out items.
//!
//! [`SlotInventory`] is the in-memory implementation used by the simulator
//! and by tests.

use crate::tier::ItemGrant;

/// Unique identifier for a player.
pub type PlayerId = u64;

/// Identifier of an item type (`"iron_ingot"`, `"stone_sword"`, ...).
pub type ItemId = String;

/// Default maximum stack size.
pub const DEFAULT_MAX_STACK: u32 = 64;

/// Default number of inventory slots.
pub const DEFAULT_INVENTORY_SLOTS: usize = 36;

/// A stack of items in an inventory slot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ItemStack {
    /// The item type.
    pub item_id: ItemId,
    /// Number of items in this stack.
    pub count: u32,
    /// Whether the item ignores durability loss.
    pub unbreakable: bool,
}

impl ItemStack {
    /// Creates a new breakable item stack.
    #[must_use]
    pub fn new(item_id: impl Into<ItemId>, count: u32) -> Self {
        Self {
            item_id: item_id.into(),
            count,
            unbreakable: false,
        }
    }
}

/// Platform view of one player's item inventory.
///
/// Slots are visited in index order; that order decides which currency
/// stacks are drained first.
pub trait PlayerInventory {
    /// Total number of slots.
    fn capacity(&self) -> usize;

    /// The stack at `slot`, or `None` when the slot is empty or out of range.
    fn stack(&self, slot: usize) -> Option<&ItemStack>;

    /// Removes up to `amount` items from `slot`. Returns how many were removed.
    fn take_from_slot(&mut self, slot: usize, amount: u32) -> u32;

    /// Adds granted items. Returns the quantity that did not fit.
    fn give(&mut self, grant: &ItemGrant, unbreakable: bool) -> u32;

    /// Returns true if at least one slot is empty.
    fn has_free_slot(&self) -> bool {
        (0..self.capacity()).any(|slot| self.stack(slot).is_none())
    }

    /// Counts the total number of a specific item across all slots.
    fn count_item(&self, item_id: &str) -> u64 {
        (0..self.capacity())
            .filter_map(|slot| self.stack(slot))
            .filter(|stack| stack.item_id == item_id)
            .map(|stack| u64::from(stack.count))
            .sum()
    }
}

/// The player on the other side of the counter.
pub struct Buyer<'a> {
    /// Player identity, used by the economy backend and presentation.
    pub id: PlayerId,
    /// The player's inventory.
    pub inventory: &'a mut dyn PlayerInventory,
}

impl<'a> Buyer<'a> {
    /// Creates a buyer view over a player's inventory.
    pub fn new(id: PlayerId, inventory: &'a mut dyn PlayerInventory) -> Self {
        Self { id, inventory }
    }
}

/// A fixed-size, in-memory inventory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SlotInventory {
    slots: Vec<Option<ItemStack>>,
    max_stack: u32,
}

impl SlotInventory {
    /// Creates an empty inventory with the default slot count.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_INVENTORY_SLOTS)
    }

    /// Creates an empty inventory with `slots` slots.
    #[must_use]
    pub fn with_capacity(slots: usize) -> Self {
        Self {
            slots: vec![None; slots],
            max_stack: DEFAULT_MAX_STACK,
        }
    }

    /// Returns the number of occupied slots.
    #[must_use]
    pub fn used_slots(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// Adds items, stacking onto existing stacks first and then filling
    /// empty slots. Returns the quantity that couldn't fit.
    pub fn add(&mut self, item_id: &str, mut count: u32, unbreakable: bool) -> u32 {
        let max_stack = self.max_stack;

        // First, try to add to existing stacks
        for stack in self.slots.iter_mut().flatten() {
            if count == 0 {
                break;
            }
            if stack.item_id == item_id && stack.unbreakable == unbreakable && stack.count < max_stack {
                let add = (max_stack - stack.count).min(count);
                stack.count += add;
                count -= add;
            }
        }

        // Then, use empty slots
        for slot in &mut self.slots {
            if count == 0 {
                break;
            }
            if slot.is_none() {
                let add = count.min(max_stack);
                *slot = Some(ItemStack {
                    item_id: item_id.to_string(),
                    count: add,
                    unbreakable,
                });
                count -= add;
            }
        }

        count
    }

    /// Puts a stack into a specific slot, replacing whatever was there.
    pub fn set(&mut self, slot: usize, stack: Option<ItemStack>) {
        if let Some(target) = self.slots.get_mut(slot) {
            *target = stack;
        }
    }
}

impl Default for SlotInventory {
    fn default() -> Self {
        Self::new()
    }
}

impl PlayerInventory for SlotInventory {
    fn capacity(&self) -> usize {
        self.slots.len()
    }

    fn stack(&self, slot: usize) -> Option<&ItemStack> {
        self.slots.get(slot).and_then(Option::as_ref)
    }

    fn take_from_slot(&mut self, slot: usize, amount: u32) -> u32 {
        let Some(entry) = self.slots.get_mut(slot) else {
            return 0;
        };
        let Some(stack) = entry.as_mut() else {
            return 0;
        };

        let removed = stack.count.min(amount);
        stack.count -= removed;
        if stack.count == 0 {
            *entry = None;
        }
        removed
    }

    fn give(&mut self, grant: &ItemGrant, unbreakable: bool) -> u32 {
        self.add(&grant.item_id, grant.amount, unbreakable)
    }
}
