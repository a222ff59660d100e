//! Loot engine: per-target containers, group distribution policies and
//! timed group rolls.

pub mod config;
pub mod container;
pub mod coordinator;
pub mod defines;
pub mod error;
pub mod event;
pub mod guid;
pub mod item;
pub mod policy;
pub mod roll;
pub mod target;
pub mod world;

#[cfg(test)]
pub mod testing;

pub use config::LootConfig;
pub use container::{roll_money, LootContainer, LootContext, LootItemRight};
pub use coordinator::LootCoordinator;
pub use defines::*;
pub use error::LootError;
pub use event::{LootEvent, LootOutbox, LootView};
pub use guid::{HighGuid, ObjectGuid};
pub use item::{LootItem, LootItemType};
pub use policy::{Distribution, LootPolicy};
pub use roll::{GroupRollSession, RollOutcome, RollPhase};
pub use target::{
    CorpseTarget, CreatureTarget, GameObjectKind, GameObjectTarget, ItemTarget, LootTarget,
    MailTarget,
};
pub use world::{GroupInfo, LootWorld};
