//! Error types for loot table loading and validation.

use thiserror::Error;

/// Errors raised while loading or validating loot data.
///
/// Row-level problems are reported and the row is skipped; none of these
/// abort a whole load.
#[derive(Debug, Error)]
pub enum TableError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("table '{table}' entry {entry} item {item}: group ({group}) must be less than 128 - skipped")]
    GroupOutOfRange {
        table: &'static str,
        entry: u32,
        item: u32,
        group: u8,
    },

    #[error("table '{table}' entry {entry} item {item}: wrong mincountOrRef ({value}) - skipped")]
    WrongMinCount {
        table: &'static str,
        entry: u32,
        item: u32,
        value: i32,
    },

    #[error("table '{table}' entry {entry} item {item}: maxcount value ({max_count}) too large, must be at most 255 - skipped")]
    MaxCountTooLarge {
        table: &'static str,
        entry: u32,
        item: u32,
        max_count: u32,
    },

    #[error("table '{table}' entry {entry} item {item}: item entry not listed in the item catalog - skipped")]
    UnknownItem {
        table: &'static str,
        entry: u32,
        item: u32,
    },

    #[error("table '{table}' entry {entry} item {item}: equal-chanced grouped entry, but group not defined - skipped")]
    EqualChanceWithoutGroup {
        table: &'static str,
        entry: u32,
        item: u32,
    },

    #[error("table '{table}' entry {entry} item {item}: low chance ({chance}) - skipped")]
    LowChance {
        table: &'static str,
        entry: u32,
        item: u32,
        chance: f32,
    },

    #[error("table '{table}' entry {entry} item {item}: max count ({max}) less than min count ({min}) - skipped")]
    MaxCountBelowMinCount {
        table: &'static str,
        entry: u32,
        item: u32,
        max: u8,
        min: i32,
    },

    #[error("table '{table}' entry {entry} item {item}: negative chance is given for a reference - skipped")]
    QuestChanceReference {
        table: &'static str,
        entry: u32,
        item: u32,
    },

    #[error("table '{table}' entry {entry} item {item}: zero chance is given for a reference, reference will never be used - skipped")]
    ZeroChanceReference {
        table: &'static str,
        entry: u32,
        item: u32,
    },

    #[error("table '{table}' entry {entry} group {group} has total chance > 100% ({chance})")]
    GroupChanceOverflow {
        table: &'static str,
        entry: u32,
        group: usize,
        chance: f32,
    },

    #[error("table '{table}' entry {entry} group {group} has items with chance=0% but group total chance >= 100% ({chance})")]
    EqualChanceShadowed {
        table: &'static str,
        entry: u32,
        group: usize,
        chance: f32,
    },

    #[error("table '{table}' entry {id} ({entry_name}) does not exist but is used as loot id")]
    MissingTemplate {
        table: &'static str,
        entry_name: &'static str,
        id: u32,
    },

    #[error("table '{table}' entry {id} isn't {entry_name} and not referenced from loot, and then useless")]
    UnusedTemplate {
        table: &'static str,
        entry_name: &'static str,
        id: u32,
    },
}
