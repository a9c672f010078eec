//! # Purchase Notices
//!
//! What the player is told after a purchase attempt, and the narrow
//! presentation services that tell them. Translation and sound playback
//! belong to the platform; the engine only names the message and the sound.
//!
//! Presentation is fire-and-forget. A failing service is logged at `debug`
//! and never changes the outcome of a purchase.

use std::borrow::Cow;

use crate::error::NoticeError;
use crate::inventory::PlayerId;

/// A message shown to the player after a terminal purchase outcome.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ShopNotice {
    /// Purchase committed.
    Purchased {
        /// Identifier of the bought entry (the translation key root).
        entry: String,
        /// Roman numeral of the bought tier; empty for single-tier entries.
        tier: Cow<'static, str>,
    },
    /// A heavier entry of the same category is already owned.
    AlreadyHigherTier,
    /// Permanent entry is already maxed.
    AlreadyBought,
    /// Not enough currency.
    InsufficientFunds {
        /// Message key naming the currency.
        currency_key: &'static str,
        /// Missing amount.
        shortfall: u64,
    },
    /// No free inventory slot.
    InsufficientSpace,
    /// Virtual balance purchase without an economy backend.
    EconomyUnavailable,
}

/// Sound cues played with notices.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShopSound {
    /// Successful purchase.
    Bought,
    /// Any rejected purchase.
    InsufficientMoney,
}

impl ShopNotice {
    /// Localisation key of this message.
    #[must_use]
    pub const fn key(&self) -> &'static str {
        match self {
            Self::Purchased { .. } => "shop-new-purchase",
            Self::AlreadyHigherTier => "shop-already-higher-tier",
            Self::AlreadyBought => "shop-already-bought",
            Self::InsufficientFunds { .. } => "shop-insufficient-money",
            Self::InsufficientSpace => "shop-insufficient-space",
            Self::EconomyUnavailable => "shop-economy-unavailable",
        }
    }

    /// The sound played alongside this notice.
    #[must_use]
    pub const fn sound(&self) -> Option<ShopSound> {
        match self {
            Self::Purchased { .. } => Some(ShopSound::Bought),
            Self::EconomyUnavailable => None,
            _ => Some(ShopSound::InsufficientMoney),
        }
    }
}

impl ShopSound {
    /// Configuration key of this sound.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Bought => "sounds.shop-bought",
            Self::InsufficientMoney => "sounds.insufficient-money",
        }
    }
}

/// Sends translated messages to players.
pub trait LocalizedMessageService: Send + Sync {
    /// Sends `notice` to `player` in their language.
    ///
    /// # Errors
    ///
    /// Any failure; the engine logs and ignores it.
    fn send(&self, player: PlayerId, notice: &ShopNotice) -> Result<(), NoticeError>;
}

/// Plays sounds to players.
pub trait SoundService: Send + Sync {
    /// Plays `sound` to `player`.
    ///
    /// # Errors
    ///
    /// Any failure; the engine logs and ignores it.
    fn play(&self, player: PlayerId, sound: ShopSound) -> Result<(), NoticeError>;
}

/// Presentation that shows nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct Silent;

impl LocalizedMessageService for Silent {
    fn send(&self, _player: PlayerId, _notice: &ShopNotice) -> Result<(), NoticeError> {
        Ok(())
    }
}

impl SoundService for Silent {
    fn play(&self, _player: PlayerId, _sound: ShopSound) -> Result<(), NoticeError> {
        Ok(())
    }
}

/// Shows a notice and plays its sound, swallowing presentation failures.
pub(crate) fn present(
    messages: &dyn LocalizedMessageService,
    sounds: &dyn SoundService,
    player: PlayerId,
    notice: &ShopNotice,
) {
    if let Some(sound) = notice.sound() {
        if let Err(e) = sounds.play(player, sound) {
            tracing::debug!("Sound {} for player {} failed: {}", sound.key(), player, e);
        }
    }
    if let Err(e) = messages.send(player, notice) {
        tracing::debug!("Message {} for player {} failed: {}", notice.key(), player, e);
    }
}
