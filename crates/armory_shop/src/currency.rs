//! # Currencies
//!
//! Every tier is priced in exactly one currency: one of the four resource
//! items dropped by island generators, or the virtual balance held by an
//! external economy backend.

use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Serialize};

/// The currency a tier is priced in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CurrencyKind {
    /// Iron ingots.
    #[default]
    Iron,
    /// Gold ingots.
    Gold,
    /// Diamonds.
    Diamond,
    /// Emeralds.
    Emerald,
    /// Balance held by the economy backend.
    VirtualBalance,
}

/// Display colour of a currency in shop menus.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CurrencyColor {
    /// Iron.
    White,
    /// Gold.
    Gold,
    /// Diamond.
    Aqua,
    /// Emerald and virtual balance.
    DarkGreen,
}

impl CurrencyKind {
    /// Parses the configuration spelling of a currency.
    ///
    /// Unknown names fall back to iron; `"vault"` selects the virtual balance.
    #[must_use]
    pub fn from_config(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "gold" => Self::Gold,
            "diamond" => Self::Diamond,
            "emerald" => Self::Emerald,
            "vault" => Self::VirtualBalance,
            _ => Self::Iron,
        }
    }

    /// The configuration spelling of this currency.
    #[must_use]
    pub const fn config_name(self) -> &'static str {
        match self {
            Self::Iron => "iron",
            Self::Gold => "gold",
            Self::Diamond => "diamond",
            Self::Emerald => "emerald",
            Self::VirtualBalance => "vault",
        }
    }

    /// Item id of the stacks that count as this currency.
    ///
    /// `None` for the virtual balance.
    #[must_use]
    pub const fn material(self) -> Option<&'static str> {
        match self {
            Self::Iron => Some("iron_ingot"),
            Self::Gold => Some("gold_ingot"),
            Self::Diamond => Some("diamond"),
            Self::Emerald => Some("emerald"),
            Self::VirtualBalance => None,
        }
    }

    /// Returns true if this currency is paid with inventory items.
    #[inline]
    #[must_use]
    pub const fn is_item(self) -> bool {
        !matches!(self, Self::VirtualBalance)
    }

    /// Menu colour for prices in this currency.
    #[must_use]
    pub const fn color(self) -> CurrencyColor {
        match self {
            Self::Iron => CurrencyColor::White,
            Self::Gold => CurrencyColor::Gold,
            Self::Diamond => CurrencyColor::Aqua,
            Self::Emerald | Self::VirtualBalance => CurrencyColor::DarkGreen,
        }
    }

    /// Message key naming this currency, singular when `amount == 1`.
    #[must_use]
    pub const fn name_key(self, amount: u32) -> &'static str {
        let singular = amount == 1;
        match (self, singular) {
            (Self::Iron, true) => "meaning-iron-singular",
            (Self::Iron, false) => "meaning-iron-plural",
            (Self::Gold, true) => "meaning-gold-singular",
            (Self::Gold, false) => "meaning-gold-plural",
            (Self::Diamond, true) => "meaning-diamond-singular",
            (Self::Diamond, false) => "meaning-diamond-plural",
            (Self::Emerald, true) => "meaning-emerald-singular",
            (Self::Emerald, false) => "meaning-emerald-plural",
            (Self::VirtualBalance, true) => "meaning-vault-singular",
            (Self::VirtualBalance, false) => "meaning-vault-plural",
        }
    }
}

impl From<String> for CurrencyKind {
    fn from(name: String) -> Self {
        Self::from_config(&name)
    }
}

impl From<CurrencyKind> for String {
    fn from(kind: CurrencyKind) -> Self {
        kind.config_name().to_string()
    }
}

impl fmt::Display for CurrencyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.config_name())
    }
}

/// Renders a tier ordinal: `I` through `X`, decimal beyond that.
#[must_use]
pub fn roman_numeral(n: u32) -> Cow<'static, str> {
    const NUMERALS: [&str; 10] = ["I", "II", "III", "IV", "V", "VI", "VII", "VIII", "IX", "X"];

    match n {
        1..=10 => Cow::Borrowed(NUMERALS[n as usize - 1]),
        _ => Cow::Owned(n.to_string()),
    }
}
