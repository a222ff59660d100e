//! The engine's view of everything it does not own: players, groups,
//! inventories, quests and the loot targets' world state.

use loot_rs_table::{ItemPrototype, ItemQuality};

use crate::defines::{
    CreatureLootStatus, GameObjectLootState, InventoryResult, ItemLootState, LootMethod, Skill,
};
use crate::guid::ObjectGuid;

/// Snapshot of a player's group taken when a container picks its owners.
#[derive(Debug, Clone)]
pub struct GroupInfo {
    pub id: u32,
    /// Members in slot order; the looter rotation walks this ring.
    pub members: Vec<ObjectGuid>,
    pub loot_method: LootMethod,
    pub threshold: ItemQuality,
    /// Whose turn it is under round robin.
    pub looter: Option<ObjectGuid>,
    pub master_looter: Option<ObjectGuid>,
}

/// Collaborator interface the host implements.
///
/// Every lookup takes a guid; an offline or unknown player answers false/0.
pub trait LootWorld {
    // players

    fn is_online(&self, player: ObjectGuid) -> bool;
    fn player_level(&self, player: ObjectGuid) -> u32;
    fn skill_value(&self, player: ObjectGuid, skill: Skill) -> u32;
    /// Current target selection, used when a request names no target.
    fn selection(&self, player: ObjectGuid) -> Option<ObjectGuid>;

    // groups

    fn group_of(&self, player: ObjectGuid) -> Option<GroupInfo>;
    /// Advance the group's round-robin pointer.
    fn set_group_looter(&mut self, group_id: u32, looter: ObjectGuid);

    // range

    fn is_at_group_reward_distance(&self, player: ObjectGuid, target: ObjectGuid) -> bool;
    fn is_within_interaction_distance(&self, player: ObjectGuid, target: ObjectGuid) -> bool;
    /// Whether `player` is on `creature`'s threat list.
    fn has_threat(&self, creature: ObjectGuid, player: ObjectGuid) -> bool;

    // quests and conditions

    fn has_quest_for_item(&self, player: ObjectGuid, item_id: u32) -> bool;
    /// Whether the player ever took the quest (any status but none).
    fn has_quest_status(&self, player: ObjectGuid, quest_id: u32) -> bool;
    fn is_condition_satisfied(
        &self,
        condition_id: u16,
        player: ObjectGuid,
        target: ObjectGuid,
    ) -> bool;

    // items

    fn can_use_item(&self, player: ObjectGuid, proto: &ItemPrototype) -> bool;
    /// Random suffix and property rolled for a new item.
    fn random_enchantment(&self, _item_id: u32) -> (u32, i32) {
        (0, 0)
    }
    fn can_store_item(&self, player: ObjectGuid, item_id: u32, count: u32) -> InventoryResult;
    fn store_item(&mut self, player: ObjectGuid, item_id: u32, count: u32, random_property_id: i32);
    fn owns_item(&self, player: ObjectGuid, item: ObjectGuid) -> bool;
    /// Remove `count` from a stack; `None` destroys the whole item.
    fn destroy_item(&mut self, player: ObjectGuid, item: ObjectGuid, count: Option<u32>);
    fn modify_money(&mut self, player: ObjectGuid, amount: u32);

    // targets

    fn set_creature_loot_status(&mut self, creature: ObjectGuid, status: CreatureLootStatus);
    fn set_game_object_loot_state(&mut self, go: ObjectGuid, state: GameObjectLootState);
    fn use_door(&mut self, go: ObjectGuid);
    fn set_corpse_lootable(&mut self, corpse: ObjectGuid, lootable: bool);
    fn set_item_loot_state(&mut self, item: ObjectGuid, state: ItemLootState);
}
