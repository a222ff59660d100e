//! Item prototypes referenced by loot templates (items.json).

use std::collections::HashMap;

use serde::Deserialize;

use crate::error::TableError;

/// Item flag: every eligible player may take their own copy.
pub const ITEM_FLAG_MULTI_DROP: u32 = 0x0000_0800;

/// Item quality, ordered from worst to best.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemQuality {
    Poor = 0,
    #[default]
    Normal = 1,
    Uncommon = 2,
    Rare = 3,
    Epic = 4,
    Legendary = 5,
    Artifact = 6,
}

impl ItemQuality {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Poor),
            1 => Some(Self::Normal),
            2 => Some(Self::Uncommon),
            3 => Some(Self::Rare),
            4 => Some(Self::Epic),
            5 => Some(Self::Legendary),
            6 => Some(Self::Artifact),
            _ => None,
        }
    }

    /// Parse a quality name as typed in config files or on the console.
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "poor" => Some(Self::Poor),
            "normal" | "common" => Some(Self::Normal),
            "uncommon" => Some(Self::Uncommon),
            "rare" => Some(Self::Rare),
            "epic" => Some(Self::Epic),
            "legendary" => Some(Self::Legendary),
            "artifact" => Some(Self::Artifact),
            _ => name.parse::<u8>().ok().and_then(Self::from_u8),
        }
    }
}

/// Static item data needed by loot generation and distribution.
#[derive(Debug, Clone, Deserialize)]
pub struct ItemPrototype {
    pub id: u32,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub quality: ItemQuality,
    #[serde(default)]
    pub flags: u32,
    #[serde(default)]
    pub display_id: u32,
    /// Quest started by using this item, 0 if none.
    #[serde(default)]
    pub start_quest: u32,
    /// Disenchant loot id, 0 if the item can't be disenchanted.
    #[serde(default)]
    pub disenchant_id: u32,
    #[serde(default)]
    pub required_disenchant_skill: u32,
    #[serde(default)]
    pub min_money_loot: u32,
    #[serde(default)]
    pub max_money_loot: u32,
}

impl ItemPrototype {
    /// A bare prototype with defaults, mostly useful for tests and tooling.
    pub fn new(id: u32, quality: ItemQuality) -> Self {
        Self {
            id,
            name: String::new(),
            quality,
            flags: 0,
            display_id: 0,
            start_quest: 0,
            disenchant_id: 0,
            required_disenchant_skill: 0,
            min_money_loot: 0,
            max_money_loot: 0,
        }
    }

    pub fn is_multi_drop(&self) -> bool {
        self.flags & ITEM_FLAG_MULTI_DROP != 0
    }
}

/// All known item prototypes, keyed by item id.
#[derive(Debug, Clone, Default)]
pub struct ItemCatalog {
    items: HashMap<u32, ItemPrototype>,
}

impl ItemCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON array of prototypes.
    pub fn parse_json(json: &str) -> Result<Self, TableError> {
        let list: Vec<ItemPrototype> = serde_json::from_str(json)?;
        let mut catalog = Self::new();
        for proto in list {
            catalog.insert(proto);
        }
        Ok(catalog)
    }

    pub fn insert(&mut self, proto: ItemPrototype) {
        self.items.insert(proto.id, proto);
    }

    pub fn get(&self, id: u32) -> Option<&ItemPrototype> {
        self.items.get(&id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ItemPrototype> {
        self.items.values()
    }
}
