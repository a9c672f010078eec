//! # ARMORY Shop Simulator
//!
//! Loads a shop catalog and plays a scripted session for one player:
//! purchases, rejections, a blocked purchase, a death and an economy outage.
//!
//! ```bash
//! # Default catalog
//! cargo run --bin shop_sim
//!
//! # Custom catalog, verbose engine logs
//! RUST_LOG=armory_shop=trace cargo run --bin shop_sim -- path/to/shop.toml
//! ```

use std::process::ExitCode;

use armory::shop::{
    CurrencyLedger, PlayerId, PlayerInventory, PurchaseOutcome, Shop, ShopServices,
    SlotInventory, TomlConfigSource,
};
use armory::{EventBus, EventHook, EventPresenter, InMemoryEconomy, ShopEvent};
use tracing_subscriber::EnvFilter;

const DEFAULT_CATALOG: &str = "data/shop.toml";
const PLAYER: PlayerId = 1;

/// One scripted step.
enum Step {
    Buy(&'static str),
    Give(&'static str, u32),
    Block,
    Unblock,
    Die,
    EconomyDown,
    EconomyUp,
}

const SCRIPT: &[Step] = &[
    Step::Give("iron_ingot", 64),
    Step::Buy("blocks.wool"),
    Step::Buy("tools.pickaxe"),
    Step::Buy("tools.pickaxe"),
    Step::Buy("tools.pickaxe"),
    Step::Give("gold_ingot", 20),
    Step::Buy("tools.pickaxe"),
    Step::Buy("melee.iron_sword"),
    Step::Buy("melee.stone_sword"),
    Step::Buy("armor.chainmail"),
    Step::Buy("armor.chainmail"),
    Step::Block,
    Step::Buy("blocks.wool"),
    Step::Unblock,
    Step::Buy("special.tracker"),
    Step::EconomyDown,
    Step::Buy("special.tracker"),
    Step::EconomyUp,
    Step::Die,
    Step::Buy("melee.stone_sword"),
    Step::Buy("tools.pickaxe"),
    Step::Buy("blocks.bedrock"),
];

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("armory=info,armory_shop=info")),
        )
        .init();

    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CATALOG.to_string());

    let source = match TomlConfigSource::from_file(&path) {
        Ok(source) => source,
        Err(e) => {
            tracing::error!("Failed to load shop catalog: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let shop = Shop::load(&source);
    let catalog = shop.catalog();
    tracing::info!(
        "Catalog {}: {} entries, {} disabled",
        path,
        catalog.len(),
        catalog.disabled().len()
    );
    for disabled in catalog.disabled() {
        tracing::warn!("  {} disabled: {}", disabled.identifier, disabled.error);
    }

    let bus = EventBus::new(256);
    let events = bus.receiver();
    let hook = EventHook::new(bus.sender());
    let presenter = EventPresenter::new(bus.sender());
    let economy = InMemoryEconomy::new();
    economy.deposit(PLAYER, 200);

    let services = ShopServices::silent()
        .with_economy(&economy)
        .with_hook(&hook)
        .with_presentation(&presenter, &presenter);

    shop.open_session(PLAYER);
    let mut inventory = SlotInventory::new();

    for step in SCRIPT {
        match step {
            Step::Buy(entry) => buy(&shop, entry, &mut inventory, services, &economy),
            Step::Give(item, amount) => {
                let leftover = inventory.add(item, *amount, false);
                tracing::info!("Gave {} x{} (leftover {})", item, amount, leftover);
            }
            Step::Block => hook.block(PLAYER),
            Step::Unblock => hook.unblock(PLAYER),
            Step::Die => {
                if let Err(e) = shop.on_death(PLAYER) {
                    tracing::error!("Death policy failed: {}", e);
                }
                tracing::info!("Player {} died", PLAYER);
            }
            Step::EconomyDown => economy.set_available(false),
            Step::EconomyUp => economy.set_available(true),
        }

        for event in events.drain() {
            log_event(&event);
        }
    }

    if let Some(cache) = shop.close_session(PLAYER) {
        let mut owned: Vec<_> = cache.owned_entries().collect();
        owned.sort_unstable();
        for (entry, tier) in owned {
            tracing::info!("Final: {} tier {}", entry, tier);
        }
    }
    tracing::info!(
        "Final inventory: {} iron, {} gold, {} slots used",
        inventory.count_item("iron_ingot"),
        inventory.count_item("gold_ingot"),
        inventory.used_slots()
    );

    ExitCode::SUCCESS
}

fn buy(
    shop: &Shop,
    entry: &str,
    inventory: &mut SlotInventory,
    services: ShopServices<'_>,
    economy: &InMemoryEconomy,
) {
    let ledger = CurrencyLedger::new(Some(economy));
    if let Ok(listing) = shop.listing(PLAYER, entry, inventory, &ledger) {
        tracing::info!(
            "Listing {}: tier {} for {} {} ({:?})",
            listing.identifier,
            listing.ordinal,
            listing.price,
            listing.currency,
            listing.status
        );
    }

    match shop.purchase(PLAYER, entry, inventory, services) {
        Ok(PurchaseOutcome::Completed(receipt)) => tracing::info!(
            "Bought {} -> owned tier {}{}",
            receipt.entry,
            receipt.owned_tier,
            if receipt.reaffirmed { " (re-affirmed)" } else { "" }
        ),
        Ok(PurchaseOutcome::Vetoed) => tracing::info!("Purchase of {} was held back", entry),
        Err(e) if e.is_user_facing() => tracing::info!("Rejected {}: {}", entry, e),
        Err(e) => tracing::warn!("Shop fault on {}: {}", entry, e),
    }
}

fn log_event(event: &ShopEvent) {
    match event {
        ShopEvent::Notice { player, notice } => {
            tracing::info!("  [chat -> {}] {} {:?}", player, notice.key(), notice);
        }
        ShopEvent::Sound { player, sound } => {
            tracing::debug!("  [sound -> {}] {}", player, sound.key());
        }
        other => tracing::debug!("  [event] {:?}", other),
    }
}
