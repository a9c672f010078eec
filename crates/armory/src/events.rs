//! # Shop Event Bus
//!
//! Carries shop activity from the purchase engine to the rest of the game.
//!
//! ```text
//! ┌─────────────┐      ┌─────────────┐      ┌─────────────┐
//! │    Shop     │─────>│    Event    │─────>│  Chat / UI  │
//! │  (engine)   │      │   Channel   │      │   Sounds    │
//! └─────────────┘      └─────────────┘      └─────────────┘
//! ```
//!
//! [`EventHook`] publishes every purchase that reaches the pre-commit point
//! and can hold back players. [`EventPresenter`] turns notices and sounds
//! into events instead of talking to a client directly.

use std::collections::HashSet;

use armory_shop::{
    CurrencyKind, HookVerdict, LocalizedMessageService, NoticeError, PlayerId, PreCommitHook,
    PurchaseContext, ShopNotice, ShopSound, SoundService,
};
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};

/// Events emitted by the shop.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ShopEvent {
    /// A purchase passed its checks and is about to be committed.
    PurchaseRequested {
        /// Buying player.
        player: PlayerId,
        /// Entry identifier.
        entry: String,
        /// Ordinal of the tier being bought.
        ordinal: u32,
        /// Price of the tier.
        price: u32,
        /// Currency of the tier.
        currency: CurrencyKind,
        /// True if the purchase only re-affirms a maxed entry.
        reaffirm: bool,
    },

    /// A purchase was held back by the hook.
    PurchaseBlocked {
        /// Blocked player.
        player: PlayerId,
        /// Entry identifier.
        entry: String,
    },

    /// A message for a player.
    Notice {
        /// Receiving player.
        player: PlayerId,
        /// The message.
        notice: ShopNotice,
    },

    /// A sound for a player.
    Sound {
        /// Receiving player.
        player: PlayerId,
        /// The sound.
        sound: ShopSound,
    },
}

/// Bounded channel of shop events.
pub struct EventBus {
    sender: Sender<ShopEvent>,
    receiver: Receiver<ShopEvent>,
}

impl EventBus {
    /// Creates a new event bus holding at most `capacity` events.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = bounded(capacity);
        Self { sender, receiver }
    }

    /// Creates a sender handle.
    #[must_use]
    pub fn sender(&self) -> EventSender {
        EventSender {
            sender: self.sender.clone(),
        }
    }

    /// Creates a receiver handle.
    #[must_use]
    pub fn receiver(&self) -> EventReceiver {
        EventReceiver {
            receiver: self.receiver.clone(),
        }
    }
}

/// Handle for sending events.
#[derive(Clone)]
pub struct EventSender {
    sender: Sender<ShopEvent>,
}

impl EventSender {
    /// Sends an event without blocking.
    ///
    /// # Errors
    ///
    /// Returns `NoticeError` if the channel is full or closed; the event is
    /// dropped.
    pub fn send(&self, event: ShopEvent) -> Result<(), NoticeError> {
        match self.sender.try_send(event) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => Err(NoticeError("shop event channel full".into())),
            Err(TrySendError::Disconnected(_)) => {
                Err(NoticeError("shop event channel closed".into()))
            }
        }
    }
}

/// Handle for receiving events.
#[derive(Clone)]
pub struct EventReceiver {
    receiver: Receiver<ShopEvent>,
}

impl EventReceiver {
    /// Receives all pending events.
    pub fn drain(&self) -> Vec<ShopEvent> {
        self.receiver.try_iter().collect()
    }

    /// Receives one event, if any is pending.
    pub fn try_recv(&self) -> Option<ShopEvent> {
        self.receiver.try_recv().ok()
    }

    /// Number of pending events.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.receiver.len()
    }
}

/// Pre-commit hook that publishes purchases and holds back blocked players.
pub struct EventHook {
    sender: EventSender,
    blocked: parking_lot::RwLock<HashSet<PlayerId>>,
}

impl EventHook {
    /// Creates a hook publishing on `sender`.
    #[must_use]
    pub fn new(sender: EventSender) -> Self {
        Self {
            sender,
            blocked: parking_lot::RwLock::new(HashSet::new()),
        }
    }

    /// Cancels every purchase of `player` until [`Self::unblock`].
    pub fn block(&self, player: PlayerId) {
        self.blocked.write().insert(player);
    }

    /// Lets `player` buy again.
    pub fn unblock(&self, player: PlayerId) {
        self.blocked.write().remove(&player);
    }
}

impl PreCommitHook for EventHook {
    fn notify(&self, context: &PurchaseContext<'_>) -> HookVerdict {
        let entry = context.entry.identifier().to_string();

        if self.blocked.read().contains(&context.player) {
            if let Err(e) = self.sender.send(ShopEvent::PurchaseBlocked {
                player: context.player,
                entry,
            }) {
                tracing::debug!("Dropped shop event: {}", e);
            }
            return HookVerdict::Cancel;
        }

        let event = ShopEvent::PurchaseRequested {
            player: context.player,
            entry,
            ordinal: context.tier.ordinal,
            price: context.tier.price,
            currency: context.tier.currency,
            reaffirm: context.reaffirm,
        };
        if let Err(e) = self.sender.send(event) {
            tracing::debug!("Dropped shop event: {}", e);
        }
        HookVerdict::Approve
    }
}

/// Presentation services that publish events instead of rendering.
#[derive(Clone)]
pub struct EventPresenter {
    sender: EventSender,
}

impl EventPresenter {
    /// Creates a presenter publishing on `sender`.
    #[must_use]
    pub fn new(sender: EventSender) -> Self {
        Self { sender }
    }
}

impl LocalizedMessageService for EventPresenter {
    fn send(&self, player: PlayerId, notice: &ShopNotice) -> Result<(), NoticeError> {
        self.sender.send(ShopEvent::Notice {
            player,
            notice: notice.clone(),
        })
    }
}

impl SoundService for EventPresenter {
    fn play(&self, player: PlayerId, sound: ShopSound) -> Result<(), NoticeError> {
        self.sender.send(ShopEvent::Sound { player, sound })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use armory_shop::{
        PurchasableEntry, PurchaseOutcome, Shop, ShopCatalog, ShopServices, SlotInventory, Tier,
    };

    fn shop() -> Shop {
        let wool = PurchasableEntry::new(
            "blocks.wool",
            "blocks",
            19,
            vec![Tier::new(1, 4, CurrencyKind::Iron).with_grant("white_wool", 16)],
        )
        .unwrap();
        let shop = Shop::new(ShopCatalog::from_entries(vec![wool]));
        shop.open_session(1);
        shop
    }

    #[test]
    fn test_purchase_publishes_events() {
        let bus = EventBus::new(16);
        let hook = EventHook::new(bus.sender());
        let presenter = EventPresenter::new(bus.sender());
        let services = ShopServices::silent()
            .with_hook(&hook)
            .with_presentation(&presenter, &presenter);

        let mut inv = SlotInventory::new();
        inv.add("iron_ingot", 4, false);
        shop().purchase(1, "blocks.wool", &mut inv, services).unwrap();

        let events = bus.receiver().drain();
        assert_eq!(events.len(), 3);
        assert!(matches!(
            &events[0],
            ShopEvent::PurchaseRequested { entry, price: 4, .. } if entry == "blocks.wool"
        ));
        assert_eq!(
            events[1],
            ShopEvent::Sound {
                player: 1,
                sound: ShopSound::Bought
            }
        );
        assert!(matches!(&events[2], ShopEvent::Notice { .. }));
    }

    #[test]
    fn test_blocked_player_is_vetoed() {
        let bus = EventBus::new(16);
        let hook = EventHook::new(bus.sender());
        hook.block(1);
        let services = ShopServices::silent().with_hook(&hook);

        let shop = shop();
        let mut inv = SlotInventory::new();
        inv.add("iron_ingot", 4, false);

        let outcome = shop.purchase(1, "blocks.wool", &mut inv, services).unwrap();
        assert_eq!(outcome, PurchaseOutcome::Vetoed);
        assert_eq!(shop.owned_tier(1, "blocks.wool").unwrap(), 0);
        assert!(matches!(
            bus.receiver().try_recv(),
            Some(ShopEvent::PurchaseBlocked { player: 1, .. })
        ));

        hook.unblock(1);
        assert!(shop.purchase(1, "blocks.wool", &mut inv, services).is_ok());
    }

    #[test]
    fn test_full_channel_does_not_fail_purchase() {
        let bus = EventBus::new(1);
        let presenter = EventPresenter::new(bus.sender());
        let services = ShopServices::silent().with_presentation(&presenter, &presenter);

        let mut inv = SlotInventory::new();
        inv.add("iron_ingot", 4, false);
        assert!(shop().purchase(1, "blocks.wool", &mut inv, services).is_ok());
        assert_eq!(bus.receiver().pending_count(), 1);
    }
}
