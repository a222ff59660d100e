//! Drop-rate multipliers applied while rolling template entries.

use serde::Deserialize;

use crate::item::ItemQuality;

/// `[rates]` section: chance multipliers per item quality plus the
/// reference and quest multipliers.
#[derive(Debug, Clone, Deserialize)]
pub struct DropRates {
    #[serde(default = "default_rate")]
    pub poor: f32,
    #[serde(default = "default_rate")]
    pub normal: f32,
    #[serde(default = "default_rate")]
    pub uncommon: f32,
    #[serde(default = "default_rate")]
    pub rare: f32,
    #[serde(default = "default_rate")]
    pub epic: f32,
    #[serde(default = "default_rate")]
    pub legendary: f32,
    #[serde(default = "default_rate")]
    pub artifact: f32,
    #[serde(default = "default_rate")]
    pub referenced: f32,
    #[serde(default = "default_rate")]
    pub quest: f32,
}

fn default_rate() -> f32 {
    1.0
}

impl Default for DropRates {
    fn default() -> Self {
        Self {
            poor: 1.0,
            normal: 1.0,
            uncommon: 1.0,
            rare: 1.0,
            epic: 1.0,
            legendary: 1.0,
            artifact: 1.0,
            referenced: 1.0,
            quest: 1.0,
        }
    }
}

impl DropRates {
    pub fn for_quality(&self, quality: ItemQuality) -> f32 {
        match quality {
            ItemQuality::Poor => self.poor,
            ItemQuality::Normal => self.normal,
            ItemQuality::Uncommon => self.uncommon,
            ItemQuality::Rare => self.rare,
            ItemQuality::Epic => self.epic,
            ItemQuality::Legendary => self.legendary,
            ItemQuality::Artifact => self.artifact,
        }
    }
}
