use serde::Deserialize;

use crate::defines::LOOT_ROLL_TIMEOUT_MS;

/// Tunables of the loot engine (`[loot]` in the server config).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LootConfig {
    /// Voting time for a group roll.
    pub roll_timeout_ms: u32,
    /// Let non-master owners see over-threshold items under master loot.
    pub show_all_items_in_master_loot: bool,
    /// Sometimes show an empty window on a corpse nobody can loot.
    pub empty_loot_window: bool,
    /// Probability of that empty window, 0.0..=1.0.
    pub empty_loot_window_chance: f64,
    pub rate_drop_money: f32,
    /// Scales the min/max successful opens of a mining vein.
    pub rate_mining_amount: f32,
    /// Scales the chance that a vein refills after its minimum opens.
    pub rate_mining_next: f32,
    /// Mining skill a vein requires when its lock does not say.
    pub vein_default_required_skill: u32,
}

impl Default for LootConfig {
    fn default() -> Self {
        Self {
            roll_timeout_ms: LOOT_ROLL_TIMEOUT_MS,
            show_all_items_in_master_loot: false,
            empty_loot_window: true,
            empty_loot_window_chance: 1.0 / 3.0,
            rate_drop_money: 1.0,
            rate_mining_amount: 1.0,
            rate_mining_next: 1.0,
            vein_default_required_skill: 175,
        }
    }
}
