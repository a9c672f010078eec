//! # Shop Catalog
//!
//! Loads shop entries from configuration and keeps them for the life of the
//! catalog. A catalog is immutable once built; reloading builds a new one.
//!
//! Configuration is read through [`ConfigSource`]. The TOML implementation
//! expects:
//!
//! ```toml
//! [categories.tools.contents.pickaxe]
//! slot = 20
//! weight = 0
//! downgradable = true
//!
//! [categories.tools.contents.pickaxe.tiers.tier1]
//! price = 10
//! currency = "iron"
//! [[categories.tools.contents.pickaxe.tiers.tier1.items]]
//! item = "wooden_pickaxe"
//! ```
//!
//! An entry with a missing slot, no tiers, no `tier1` or a malformed tier is
//! disabled and logged; the rest of the catalog still loads.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use serde::Deserialize;

use crate::currency::CurrencyKind;
use crate::entry::{EntryFlags, PurchasableEntry};
use crate::error::{ShopError, ShopResult};
use crate::tier::{ItemGrant, Tier};

/// Location of one content entry in the configuration.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ContentPath {
    /// Category key.
    pub category: String,
    /// Content key within the category.
    pub content: String,
}

impl ContentPath {
    /// Creates a content path.
    #[must_use]
    pub fn new(category: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            content: content.into(),
        }
    }

    /// The entry identifier, `"<category>.<content>"`.
    #[must_use]
    pub fn identifier(&self) -> String {
        format!("{}.{}", self.category, self.content)
    }
}

/// Configuration of one tier.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct TierConfig {
    /// Price. Required.
    pub price: Option<u32>,
    /// Currency. Defaults to iron.
    #[serde(default)]
    pub currency: CurrencyKind,
    /// Granted items.
    #[serde(default)]
    pub items: Vec<ItemGrant>,
}

/// Configuration of one content entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContentConfig {
    /// Display slot.
    pub slot: u32,
    /// Tiers by key (`tier1`, `tier2`, ...), in configuration order.
    pub tiers: Vec<(String, TierConfig)>,
    /// Permanent flag.
    pub permanent: bool,
    /// Downgradable flag.
    pub downgradable: bool,
    /// Unbreakable flag.
    pub unbreakable: bool,
    /// Raw category weight, validated to `0..=255` when the entry is built.
    pub weight: i64,
}

/// Where shop configuration comes from.
pub trait ConfigSource {
    /// Every content entry the source defines.
    fn content_paths(&self) -> Vec<ContentPath>;

    /// The configuration of one content entry.
    ///
    /// # Errors
    ///
    /// Returns `MissingConfig` if the slot or the tiers are absent or empty.
    fn content(&self, path: &ContentPath) -> ShopResult<ContentConfig>;
}

// ============================================================================
// TOML Source
// ============================================================================

#[derive(Debug, Default, Deserialize)]
struct RawShop {
    #[serde(default)]
    categories: BTreeMap<String, RawCategory>,
}

#[derive(Debug, Default, Deserialize)]
struct RawCategory {
    #[serde(default)]
    contents: BTreeMap<String, RawContent>,
}

#[derive(Debug, Deserialize)]
struct RawContent {
    slot: Option<u32>,
    #[serde(default)]
    weight: i64,
    #[serde(default)]
    permanent: bool,
    #[serde(default)]
    downgradable: bool,
    #[serde(default)]
    unbreakable: bool,
    tiers: Option<BTreeMap<String, TierConfig>>,
}

/// Shop configuration parsed from a TOML document.
#[derive(Debug, Default)]
pub struct TomlConfigSource {
    shop: RawShop,
}

impl TomlConfigSource {
    /// Parses a TOML document.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the document is not valid shop TOML.
    pub fn parse(source: &str) -> ShopResult<Self> {
        let shop = toml::from_str(source).map_err(|e| ShopError::InvalidConfig {
            path: "<inline>".to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self { shop })
    }

    /// Reads and parses a TOML file.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the file can't be read or parsed.
    pub fn from_file(path: impl AsRef<Path>) -> ShopResult<Self> {
        let path = path.as_ref();
        let invalid = |reason: String| ShopError::InvalidConfig {
            path: path.display().to_string(),
            reason,
        };

        let contents = std::fs::read_to_string(path).map_err(|e| invalid(e.to_string()))?;
        let shop = toml::from_str(&contents).map_err(|e| invalid(e.to_string()))?;
        Ok(Self { shop })
    }
}

impl ConfigSource for TomlConfigSource {
    fn content_paths(&self) -> Vec<ContentPath> {
        self.shop
            .categories
            .iter()
            .flat_map(|(category, raw)| {
                raw.contents
                    .keys()
                    .map(move |content| ContentPath::new(category.clone(), content.clone()))
            })
            .collect()
    }

    fn content(&self, path: &ContentPath) -> ShopResult<ContentConfig> {
        let raw = self
            .shop
            .categories
            .get(&path.category)
            .and_then(|c| c.contents.get(&path.content))
            .ok_or_else(|| ShopError::MissingConfig {
                path: path.identifier(),
                what: "content",
            })?;

        let slot = raw.slot.ok_or_else(|| ShopError::MissingConfig {
            path: path.identifier(),
            what: "slot",
        })?;

        let tiers = match &raw.tiers {
            Some(tiers) if !tiers.is_empty() => tiers.clone().into_iter().collect(),
            _ => {
                return Err(ShopError::MissingConfig {
                    path: path.identifier(),
                    what: "tiers",
                })
            }
        };

        Ok(ContentConfig {
            slot,
            tiers,
            permanent: raw.permanent,
            downgradable: raw.downgradable,
            unbreakable: raw.unbreakable,
            weight: raw.weight,
        })
    }
}

// ============================================================================
// Catalog
// ============================================================================

/// An entry that failed to load.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DisabledEntry {
    /// Identifier the entry would have had.
    pub identifier: String,
    /// Why it was disabled.
    pub error: ShopError,
}

/// All loaded shop entries.
#[derive(Debug, Default)]
pub struct ShopCatalog {
    entries: HashMap<String, PurchasableEntry>,
    disabled: Vec<DisabledEntry>,
}

impl ShopCatalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a catalog from already constructed entries.
    #[must_use]
    pub fn from_entries(entries: Vec<PurchasableEntry>) -> Self {
        let mut catalog = Self::new();
        for entry in entries {
            catalog.insert(entry);
        }
        catalog
    }

    /// Loads every entry `source` defines.
    ///
    /// Entries that fail are disabled and logged; loading never fails as a
    /// whole.
    #[must_use]
    pub fn load(source: &dyn ConfigSource) -> Self {
        let mut catalog = Self::new();

        for path in source.content_paths() {
            let identifier = path.identifier();
            match source.content(&path).and_then(|config| build_entry(&path, config)) {
                Ok(entry) => {
                    tracing::debug!(
                        "Loaded shop entry {} ({} tiers, weight {})",
                        identifier,
                        entry.tiers().len(),
                        entry.weight()
                    );
                    catalog.insert(entry);
                }
                Err(error) => {
                    tracing::warn!("Disabled shop entry {}: {}", identifier, error);
                    catalog.disabled.push(DisabledEntry { identifier, error });
                }
            }
        }

        tracing::info!(
            "Loaded {} shop entries ({} disabled)",
            catalog.entries.len(),
            catalog.disabled.len()
        );
        catalog
    }

    fn insert(&mut self, entry: PurchasableEntry) {
        if self.entries.contains_key(entry.identifier()) {
            tracing::warn!("Duplicate shop entry '{}', overwriting", entry.identifier());
        }
        self.entries.insert(entry.identifier().to_string(), entry);
    }

    /// Gets a loaded entry by identifier.
    #[must_use]
    pub fn entry(&self, identifier: &str) -> Option<&PurchasableEntry> {
        self.entries.get(identifier)
    }

    /// Returns true if the entry loaded successfully.
    #[must_use]
    pub fn is_loaded(&self, identifier: &str) -> bool {
        self.entries.contains_key(identifier)
    }

    /// Iterates all loaded entries.
    pub fn entries(&self) -> impl Iterator<Item = &PurchasableEntry> {
        self.entries.values()
    }

    /// Entries of a category, ordered by display slot.
    #[must_use]
    pub fn by_category(&self, category: &str) -> Vec<&PurchasableEntry> {
        let mut entries: Vec<_> = self
            .entries
            .values()
            .filter(|e| e.category() == category)
            .collect();
        entries.sort_by_key(|e| (e.slot(), e.identifier().to_string()));
        entries
    }

    /// Entries that failed to load.
    #[must_use]
    pub fn disabled(&self) -> &[DisabledEntry] {
        &self.disabled
    }

    /// Number of loaded entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing loaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Parses the `N` of a `tierN` key.
fn tier_ordinal(key: &str) -> Option<u32> {
    key.strip_prefix("tier")
        .and_then(|n| n.parse::<u32>().ok())
        .filter(|&n| n > 0)
}

fn build_entry(path: &ContentPath, config: ContentConfig) -> ShopResult<PurchasableEntry> {
    let identifier = path.identifier();
    let invalid = |reason: String| ShopError::InvalidConfig {
        path: identifier.clone(),
        reason,
    };

    let weight = u8::try_from(config.weight)
        .map_err(|_| invalid(format!("weight {} is outside 0..=255", config.weight)))?;

    let mut tiers = Vec::with_capacity(config.tiers.len());
    for (key, tier) in config.tiers {
        let ordinal = tier_ordinal(&key).ok_or_else(|| invalid(format!("bad tier key '{key}'")))?;
        let price = tier.price.ok_or_else(|| ShopError::MissingConfig {
            path: format!("{identifier}.{key}"),
            what: "price",
        })?;
        tiers.push(Tier {
            price,
            currency: tier.currency,
            grants: tier.items,
            ordinal,
        });
    }

    tiers.sort_by_key(|t| t.ordinal);
    if tiers.first().map(|t| t.ordinal) != Some(1) {
        return Err(ShopError::MissingConfig {
            path: identifier,
            what: "tier1",
        });
    }

    Ok(PurchasableEntry::new(identifier, path.category.clone(), config.slot, tiers)?
        .with_weight(weight)
        .with_flags(EntryFlags {
            permanent: config.permanent,
            downgradable: config.downgradable,
            unbreakable: config.unbreakable,
        }))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHOP: &str = r#"
[categories.blocks.contents.wool]
slot = 19

[categories.blocks.contents.wool.tiers.tier1]
price = 4
currency = "iron"
[[categories.blocks.contents.wool.tiers.tier1.items]]
item = "white_wool"
amount = 16

[categories.tools.contents.pickaxe]
slot = 20
downgradable = true

[categories.tools.contents.pickaxe.tiers.tier10]
price = 6
currency = "emerald"

[categories.tools.contents.pickaxe.tiers.tier2]
price = 10
currency = "iron"

[categories.tools.contents.pickaxe.tiers.tier1]
price = 10
currency = "iron"
[[categories.tools.contents.pickaxe.tiers.tier1.items]]
item = "wooden_pickaxe"

[categories.tools.contents.broken]
slot = 21

[categories.tools.contents.no_first]
slot = 22
[categories.tools.contents.no_first.tiers.tier2]
price = 1

[categories.armor.contents.iron]
slot = 19
weight = 300
[categories.armor.contents.iron.tiers.tier1]
price = 12
currency = "gold"
"#;

    #[test]
    fn test_load_catalog() {
        let source = TomlConfigSource::parse(SHOP).unwrap();
        let catalog = ShopCatalog::load(&source);

        assert_eq!(catalog.len(), 2);
        assert!(catalog.is_loaded("blocks.wool"));
        assert!(catalog.is_loaded("tools.pickaxe"));

        let wool = catalog.entry("blocks.wool").unwrap();
        assert_eq!(wool.category(), "blocks");
        assert_eq!(wool.slot(), 19);
        assert_eq!(wool.tiers().last().grants, vec![ItemGrant::new("white_wool", 16)]);
    }

    #[test]
    fn test_tiers_sorted_numerically() {
        let source = TomlConfigSource::parse(SHOP).unwrap();
        let catalog = ShopCatalog::load(&source);
        let pickaxe = catalog.entry("tools.pickaxe").unwrap();

        let ordinals: Vec<u32> = pickaxe.tiers().iter().map(|t| t.ordinal).collect();
        assert_eq!(ordinals, vec![1, 2, 10]);
        assert_eq!(pickaxe.tiers().last().currency, CurrencyKind::Emerald);
        // Missing amount defaults to one
        assert_eq!(pickaxe.tiers().get(0).unwrap().grants[0].amount, 1);
        assert!(pickaxe.is_downgradable());
    }

    #[test]
    fn test_bad_entries_are_disabled() {
        let source = TomlConfigSource::parse(SHOP).unwrap();
        let catalog = ShopCatalog::load(&source);

        let disabled: HashMap<&str, &ShopError> = catalog
            .disabled()
            .iter()
            .map(|d| (d.identifier.as_str(), &d.error))
            .collect();

        assert_eq!(disabled.len(), 3);
        assert!(matches!(
            disabled["tools.broken"],
            ShopError::MissingConfig { what: "tiers", .. }
        ));
        assert!(matches!(
            disabled["tools.no_first"],
            ShopError::MissingConfig { what: "tier1", .. }
        ));
        assert!(matches!(disabled["armor.iron"], ShopError::InvalidConfig { .. }));
        assert!(!catalog.is_loaded("armor.iron"));
    }

    #[test]
    fn test_missing_slot() {
        let source = TomlConfigSource::parse(
            r#"
[categories.blocks.contents.wool.tiers.tier1]
price = 4
"#,
        )
        .unwrap();
        let err = source.content(&ContentPath::new("blocks", "wool")).unwrap_err();
        assert_eq!(
            err,
            ShopError::MissingConfig {
                path: "blocks.wool".into(),
                what: "slot",
            }
        );
    }

    #[test]
    fn test_invalid_toml() {
        assert!(matches!(
            TomlConfigSource::parse("categories = 5"),
            Err(ShopError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_from_file() {
        let id = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        let path = std::env::temp_dir().join(format!("test_shop_{id}.toml"));
        std::fs::write(&path, SHOP).unwrap();

        let catalog = ShopCatalog::load(&TomlConfigSource::from_file(&path).unwrap());
        assert_eq!(catalog.len(), 2);

        std::fs::remove_file(&path).ok();
        assert!(TomlConfigSource::from_file(&path).is_err());
    }

    #[test]
    fn test_tier_ordinal() {
        assert_eq!(tier_ordinal("tier1"), Some(1));
        assert_eq!(tier_ordinal("tier12"), Some(12));
        assert_eq!(tier_ordinal("tier0"), None);
        assert_eq!(tier_ordinal("first"), None);
    }

    #[test]
    fn test_by_category_sorted_by_slot() {
        let source = TomlConfigSource::parse(SHOP).unwrap();
        let catalog = ShopCatalog::load(&source);
        let tools = catalog.by_category("tools");
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].identifier(), "tools.pickaxe");
        assert!(catalog.by_category("ranged").is_empty());
    }
}
