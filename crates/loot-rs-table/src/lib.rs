//! Loot template storage and weighted random generation.
//!
//! Loads item prototypes and loot templates from JSON, validates them, and
//! rolls a template into any [`LootSink`] (grouped sub-rolls, equal-chance
//! pools, references with a repeat multiplier).

pub mod error;
pub mod item;
pub mod loader;
pub mod rates;
pub mod stats;
pub mod store;
pub mod template;

pub use error::TableError;
pub use item::{ItemCatalog, ItemPrototype, ItemQuality};
pub use loader::{load_item_catalog, load_loot_stores};
pub use rates::DropRates;
pub use stats::{check_drop_stats, DropStats};
pub use store::{LootStore, LootStoreKind, LootStores};
pub use template::{LootRow, LootSink, LootStoreItem, LootTemplate};
