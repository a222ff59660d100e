//! In-memory `LootWorld` for unit tests.

use std::collections::{HashMap, HashSet};

use loot_rs_table::{ItemPrototype, ItemQuality};

use crate::defines::{
    CreatureLootStatus, GameObjectLootState, InventoryResult, ItemLootState, LootMethod, Skill,
};
use crate::guid::ObjectGuid;
use crate::world::{GroupInfo, LootWorld};

#[derive(Debug, Default)]
pub struct MockPlayer {
    pub level: u32,
    pub online: bool,
    pub skills: HashMap<Skill, u32>,
    pub quest_items: HashSet<u32>,
    pub quests: HashSet<u32>,
    pub cannot_use: HashSet<u32>,
    pub bags_full: bool,
    pub bag: Vec<(u32, u32)>,
    pub money: u32,
    pub owned_items: HashSet<ObjectGuid>,
    pub selection: Option<ObjectGuid>,
}

#[derive(Debug, Default)]
pub struct MockWorld {
    pub players: HashMap<ObjectGuid, MockPlayer>,
    pub groups: HashMap<u32, GroupInfo>,
    pub out_of_range: HashSet<(ObjectGuid, ObjectGuid)>,
    pub threat: HashSet<(ObjectGuid, ObjectGuid)>,
    pub conditions: HashSet<(u16, ObjectGuid)>,
    pub creature_status: HashMap<ObjectGuid, CreatureLootStatus>,
    pub go_state: HashMap<ObjectGuid, GameObjectLootState>,
    pub item_state: HashMap<ObjectGuid, ItemLootState>,
    pub corpse_lootable: HashMap<ObjectGuid, bool>,
    pub doors_used: Vec<ObjectGuid>,
    pub destroyed: Vec<(ObjectGuid, ObjectGuid, Option<u32>)>,
}

impl MockWorld {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_player(&mut self, player: ObjectGuid, level: u32) {
        self.players.insert(
            player,
            MockPlayer {
                level,
                online: true,
                ..MockPlayer::default()
            },
        );
    }

    fn player_mut(&mut self, player: ObjectGuid) -> &mut MockPlayer {
        self.players.entry(player).or_default()
    }

    pub fn set_online(&mut self, player: ObjectGuid, online: bool) {
        self.player_mut(player).online = online;
    }

    pub fn set_skill(&mut self, player: ObjectGuid, skill: Skill, value: u32) {
        self.player_mut(player).skills.insert(skill, value);
    }

    pub fn give_quest_item(&mut self, player: ObjectGuid, item_id: u32) {
        self.player_mut(player).quest_items.insert(item_id);
    }

    pub fn set_quest_status(&mut self, player: ObjectGuid, quest_id: u32) {
        self.player_mut(player).quests.insert(quest_id);
    }

    pub fn set_cannot_use(&mut self, player: ObjectGuid, item_id: u32) {
        self.player_mut(player).cannot_use.insert(item_id);
    }

    pub fn set_bags_full(&mut self, player: ObjectGuid, full: bool) {
        self.player_mut(player).bags_full = full;
    }

    pub fn give_item(&mut self, player: ObjectGuid, item: ObjectGuid) {
        self.player_mut(player).owned_items.insert(item);
    }

    pub fn set_selection(&mut self, player: ObjectGuid, target: ObjectGuid) {
        self.player_mut(player).selection = Some(target);
    }

    pub fn make_group(
        &mut self,
        id: u32,
        members: &[ObjectGuid],
        loot_method: LootMethod,
        threshold: ItemQuality,
    ) {
        self.groups.insert(
            id,
            GroupInfo {
                id,
                members: members.to_vec(),
                loot_method,
                threshold,
                looter: None,
                master_looter: None,
            },
        );
    }

    pub fn set_master_looter(&mut self, group_id: u32, player: ObjectGuid) {
        if let Some(group) = self.groups.get_mut(&group_id) {
            group.master_looter = Some(player);
        }
    }

    pub fn group_looter(&self, group_id: u32) -> Option<ObjectGuid> {
        self.groups.get(&group_id).and_then(|group| group.looter)
    }

    pub fn set_out_of_range(&mut self, player: ObjectGuid, target: ObjectGuid) {
        self.out_of_range.insert((player, target));
    }

    pub fn add_threat(&mut self, creature: ObjectGuid, player: ObjectGuid) {
        self.threat.insert((creature, player));
    }

    pub fn satisfy_condition(&mut self, condition_id: u16, player: ObjectGuid) {
        self.conditions.insert((condition_id, player));
    }

    pub fn bag(&self, player: ObjectGuid) -> &[(u32, u32)] {
        self.players
            .get(&player)
            .map(|p| p.bag.as_slice())
            .unwrap_or(&[])
    }

    pub fn money(&self, player: ObjectGuid) -> u32 {
        self.players.get(&player).map(|p| p.money).unwrap_or(0)
    }
}

impl LootWorld for MockWorld {
    fn is_online(&self, player: ObjectGuid) -> bool {
        self.players.get(&player).is_some_and(|p| p.online)
    }

    fn player_level(&self, player: ObjectGuid) -> u32 {
        self.players.get(&player).map(|p| p.level).unwrap_or(0)
    }

    fn skill_value(&self, player: ObjectGuid, skill: Skill) -> u32 {
        self.players
            .get(&player)
            .and_then(|p| p.skills.get(&skill).copied())
            .unwrap_or(0)
    }

    fn selection(&self, player: ObjectGuid) -> Option<ObjectGuid> {
        self.players.get(&player).and_then(|p| p.selection)
    }

    fn group_of(&self, player: ObjectGuid) -> Option<GroupInfo> {
        self.groups
            .values()
            .find(|group| group.members.contains(&player))
            .cloned()
    }

    fn set_group_looter(&mut self, group_id: u32, looter: ObjectGuid) {
        if let Some(group) = self.groups.get_mut(&group_id) {
            group.looter = Some(looter);
        }
    }

    fn is_at_group_reward_distance(&self, player: ObjectGuid, target: ObjectGuid) -> bool {
        !self.out_of_range.contains(&(player, target))
    }

    fn is_within_interaction_distance(&self, player: ObjectGuid, target: ObjectGuid) -> bool {
        !self.out_of_range.contains(&(player, target))
    }

    fn has_threat(&self, creature: ObjectGuid, player: ObjectGuid) -> bool {
        self.threat.contains(&(creature, player))
    }

    fn has_quest_for_item(&self, player: ObjectGuid, item_id: u32) -> bool {
        self.players
            .get(&player)
            .is_some_and(|p| p.quest_items.contains(&item_id))
    }

    fn has_quest_status(&self, player: ObjectGuid, quest_id: u32) -> bool {
        self.players
            .get(&player)
            .is_some_and(|p| p.quests.contains(&quest_id))
    }

    fn is_condition_satisfied(&self, condition_id: u16, player: ObjectGuid, _target: ObjectGuid) -> bool {
        self.conditions.contains(&(condition_id, player))
    }

    fn can_use_item(&self, player: ObjectGuid, proto: &ItemPrototype) -> bool {
        self.players
            .get(&player)
            .is_some_and(|p| !p.cannot_use.contains(&proto.id))
    }

    fn can_store_item(&self, player: ObjectGuid, _item_id: u32, _count: u32) -> InventoryResult {
        match self.players.get(&player) {
            Some(p) if p.bags_full => InventoryResult::InventoryFull,
            Some(_) => InventoryResult::Ok,
            None => InventoryResult::CantDoRightNow,
        }
    }

    fn store_item(&mut self, player: ObjectGuid, item_id: u32, count: u32, _random_property_id: i32) {
        self.player_mut(player).bag.push((item_id, count));
    }

    fn owns_item(&self, player: ObjectGuid, item: ObjectGuid) -> bool {
        self.players
            .get(&player)
            .is_some_and(|p| p.owned_items.contains(&item))
    }

    fn destroy_item(&mut self, player: ObjectGuid, item: ObjectGuid, count: Option<u32>) {
        self.destroyed.push((player, item, count));
    }

    fn modify_money(&mut self, player: ObjectGuid, amount: u32) {
        self.player_mut(player).money += amount;
    }

    fn set_creature_loot_status(&mut self, creature: ObjectGuid, status: CreatureLootStatus) {
        self.creature_status.insert(creature, status);
    }

    fn set_game_object_loot_state(&mut self, go: ObjectGuid, state: GameObjectLootState) {
        self.go_state.insert(go, state);
    }

    fn use_door(&mut self, go: ObjectGuid) {
        self.doors_used.push(go);
    }

    fn set_corpse_lootable(&mut self, corpse: ObjectGuid, lootable: bool) {
        self.corpse_lootable.insert(corpse, lootable);
    }

    fn set_item_loot_state(&mut self, item: ObjectGuid, state: ItemLootState) {
        self.item_state.insert(item, state);
    }
}
