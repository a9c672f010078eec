//! Integration tests for sessions, reentrancy and catalog reloads.

use std::sync::Arc;
use std::thread;

use armory_shop::{
    CurrencyKind, HookVerdict, PlayerId, PlayerInventory, PreCommitHook, PurchasableEntry,
    PurchaseContext, PurchaseOutcome, Shop, ShopCatalog, ShopError, ShopResult, ShopServices,
    SlotInventory, Tier, TomlConfigSource,
};
use parking_lot::Mutex;

const SHOP: &str = r#"
[categories.blocks.contents.wool]
slot = 19
[categories.blocks.contents.wool.tiers.tier1]
price = 1
currency = "iron"
[[categories.blocks.contents.wool.tiers.tier1.items]]
item = "white_wool"
amount = 16

[categories.tools.contents.pickaxe]
slot = 20
downgradable = true
[categories.tools.contents.pickaxe.tiers.tier1]
price = 10
[[categories.tools.contents.pickaxe.tiers.tier1.items]]
item = "wooden_pickaxe"
[categories.tools.contents.pickaxe.tiers.tier2]
price = 3
currency = "gold"
[[categories.tools.contents.pickaxe.tiers.tier2.items]]
item = "iron_pickaxe"

[categories.tools.contents.shears]
slot = 21
"#;

fn temp_catalog_path() -> std::path::PathBuf {
    let id = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("test_shop_catalog_{id}.toml"))
}

fn wool() -> PurchasableEntry {
    PurchasableEntry::new(
        "blocks.wool",
        "blocks",
        19,
        vec![Tier::new(1, 1, CurrencyKind::Iron).with_grant("white_wool", 16)],
    )
    .unwrap()
}

/// Tries to buy again for the same player from inside the hook.
struct Reenter<'a> {
    shop: &'a Shop,
    inner: Mutex<Option<ShopResult<PurchaseOutcome>>>,
}

impl PreCommitHook for Reenter<'_> {
    fn notify(&self, context: &PurchaseContext<'_>) -> HookVerdict {
        let mut inv = SlotInventory::new();
        inv.add("iron_ingot", 64, false);
        let result = self.shop.purchase(
            context.player,
            context.entry.identifier(),
            &mut inv,
            ShopServices::silent(),
        );
        *self.inner.lock() = Some(result);
        HookVerdict::Approve
    }
}

#[test]
fn test_reentrant_purchase_is_rejected() {
    let shop = Shop::new(ShopCatalog::from_entries(vec![wool()]));
    shop.open_session(1);
    let hook = Reenter {
        shop: &shop,
        inner: Mutex::new(None),
    };
    let mut inv = SlotInventory::new();
    inv.add("iron_ingot", 5, false);

    let outcome = shop
        .purchase(1, "blocks.wool", &mut inv, ShopServices::silent().with_hook(&hook))
        .unwrap();

    assert!(outcome.receipt().is_some());
    assert_eq!(*hook.inner.lock(), Some(Err(ShopError::ReentrantPurchase(1))));
    // Only the outer purchase went through
    assert_eq!(shop.owned_tier(1, "blocks.wool").unwrap(), 1);
    assert_eq!(inv.count_item("iron_ingot"), 4);
}

/// Tries to close the buyer's session from inside the hook.
struct CloseFromHook<'a> {
    shop: &'a Shop,
    closed: Mutex<Option<bool>>,
}

impl PreCommitHook for CloseFromHook<'_> {
    fn notify(&self, context: &PurchaseContext<'_>) -> HookVerdict {
        let closed = self.shop.close_session(context.player).is_some();
        *self.closed.lock() = Some(closed);
        HookVerdict::Approve
    }
}

#[test]
fn test_session_cannot_close_during_its_purchase() {
    let shop = Shop::new(ShopCatalog::from_entries(vec![wool()]));
    shop.open_session(1);
    let hook = CloseFromHook {
        shop: &shop,
        closed: Mutex::new(None),
    };
    let mut inv = SlotInventory::new();
    inv.add("iron_ingot", 5, false);

    let outcome = shop
        .purchase(1, "blocks.wool", &mut inv, ShopServices::silent().with_hook(&hook))
        .unwrap();

    assert!(outcome.receipt().is_some());
    assert_eq!(*hook.closed.lock(), Some(false));
    // The debit and the committed tier stay visible in the open session
    assert!(shop.sessions().is_open(1));
    assert_eq!(shop.owned_tier(1, "blocks.wool").unwrap(), 1);
    assert_eq!(inv.count_item("iron_ingot"), 4);

    let cache = shop.close_session(1).unwrap();
    assert_eq!(cache.owned_tier("blocks.wool"), 1);
    assert!(!shop.sessions().is_open(1));
}

#[test]
fn test_players_purchase_in_parallel() {
    let shop = Arc::new(Shop::new(ShopCatalog::from_entries(vec![wool()])));
    let players: Vec<PlayerId> = (1..=8).collect();
    for &player in &players {
        shop.open_session(player);
    }

    let handles: Vec<_> = players
        .iter()
        .map(|&player| {
            let shop = Arc::clone(&shop);
            thread::spawn(move || {
                let mut inv = SlotInventory::new();
                inv.add("iron_ingot", 20, false);
                for _ in 0..20 {
                    shop.purchase(player, "blocks.wool", &mut inv, ShopServices::silent())
                        .unwrap();
                }
                inv.count_item("iron_ingot")
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), 0);
    }
    for &player in &players {
        assert_eq!(shop.owned_tier(player, "blocks.wool").unwrap(), 1);
    }
}

#[test]
fn test_same_player_from_many_threads() {
    let shop = Arc::new(Shop::new(ShopCatalog::from_entries(vec![wool()])));
    shop.open_session(9);

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let shop = Arc::clone(&shop);
            thread::spawn(move || {
                let mut inv = SlotInventory::new();
                inv.add("iron_ingot", 10, false);
                for _ in 0..10 {
                    shop.purchase(9, "blocks.wool", &mut inv, ShopServices::silent())
                        .unwrap();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(shop.owned_tier(9, "blocks.wool").unwrap(), 1);
}

#[test]
fn test_load_and_reload_from_file() {
    let path = temp_catalog_path();
    std::fs::write(&path, SHOP).unwrap();

    let shop = Shop::load(&TomlConfigSource::from_file(&path).unwrap());
    let catalog = shop.catalog();
    assert_eq!(catalog.len(), 2);
    assert_eq!(catalog.disabled().len(), 1);
    assert_eq!(catalog.disabled()[0].identifier, "tools.shears");

    shop.open_session(1);
    let mut inv = SlotInventory::new();
    inv.add("iron_ingot", 10, false);
    inv.add("gold_ingot", 3, false);
    shop.purchase(1, "tools.pickaxe", &mut inv, ShopServices::silent())
        .unwrap();
    shop.purchase(1, "tools.pickaxe", &mut inv, ShopServices::silent())
        .unwrap();
    assert_eq!(inv.count_item("iron_pickaxe"), 1);

    // Reload without the pickaxe
    std::fs::write(
        &path,
        r#"
[categories.blocks.contents.wool]
slot = 19
[categories.blocks.contents.wool.tiers.tier1]
price = 1
"#,
    )
    .unwrap();
    shop.reload(&TomlConfigSource::from_file(&path).unwrap());

    assert!(!shop.catalog().is_loaded("tools.pickaxe"));
    assert_eq!(
        shop.purchase(1, "tools.pickaxe", &mut inv, ShopServices::silent()),
        Err(ShopError::UnknownEntry("tools.pickaxe".into()))
    );
    // The old snapshot is untouched
    assert!(catalog.is_loaded("tools.pickaxe"));

    // Removed entries are forgotten on death
    shop.on_death(1).unwrap();
    assert_eq!(shop.owned_tier(1, "tools.pickaxe").unwrap(), 0);

    std::fs::remove_file(&path).ok();
}

#[test]
fn test_closed_session_rejects_purchases() {
    let shop = Shop::new(ShopCatalog::from_entries(vec![wool()]));
    shop.open_session(5);
    let mut inv = SlotInventory::new();
    inv.add("iron_ingot", 2, false);
    shop.purchase(5, "blocks.wool", &mut inv, ShopServices::silent())
        .unwrap();

    let cache = shop.close_session(5).unwrap();
    assert_eq!(cache.owned_tier("blocks.wool"), 1);
    assert_eq!(
        shop.purchase(5, "blocks.wool", &mut inv, ShopServices::silent()),
        Err(ShopError::NoSession(5))
    );

    // A new session starts from scratch
    shop.open_session(5);
    assert_eq!(shop.owned_tier(5, "blocks.wool").unwrap(), 0);
}
