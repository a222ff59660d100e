//! In-memory world the console drives: players, groups and the creatures,
//! objects and items they loot.

use std::collections::{BTreeMap, HashMap, HashSet};

use loot_rs_core::{
    CorpseTarget, CreatureLootStatus, CreatureTarget, GameObjectKind, GameObjectLootState,
    GameObjectTarget, GroupInfo, InventoryResult, ItemLootState, ItemTarget, LootMethod,
    LootWorld, ObjectGuid, Skill,
};
use loot_rs_table::{ItemPrototype, ItemQuality};

/// Distinct stacks a sandbox bag holds unless resized.
pub const DEFAULT_BAG_SLOTS: usize = 16;

#[derive(Debug)]
pub struct SandboxPlayer {
    pub level: u32,
    pub online: bool,
    pub skills: HashMap<Skill, u32>,
    pub quest_items: HashSet<u32>,
    pub bag: Vec<(u32, u32)>,
    pub bag_slots: usize,
    pub money: u32,
    pub selection: Option<ObjectGuid>,
}

impl SandboxPlayer {
    fn new(level: u32) -> Self {
        Self {
            level,
            online: true,
            skills: HashMap::new(),
            quest_items: HashSet::new(),
            bag: Vec::new(),
            bag_slots: DEFAULT_BAG_SLOTS,
            money: 0,
            selection: None,
        }
    }
}

#[derive(Debug)]
pub struct SpawnedCreature {
    pub target: CreatureTarget,
    pub status: CreatureLootStatus,
    pub threat: HashSet<ObjectGuid>,
}

#[derive(Debug)]
pub struct SpawnedObject {
    pub target: GameObjectTarget,
    pub state: GameObjectLootState,
}

#[derive(Debug)]
pub struct HeldItem {
    pub target: ItemTarget,
    pub owner: ObjectGuid,
    pub state: ItemLootState,
}

#[derive(Debug, Default)]
pub struct Sandbox {
    pub players: BTreeMap<ObjectGuid, SandboxPlayer>,
    pub groups: BTreeMap<u32, GroupInfo>,
    pub creatures: BTreeMap<ObjectGuid, SpawnedCreature>,
    pub objects: BTreeMap<ObjectGuid, SpawnedObject>,
    pub items: BTreeMap<ObjectGuid, HeldItem>,
    pub corpses: BTreeMap<ObjectGuid, (CorpseTarget, bool)>,
    out_of_range: HashSet<(ObjectGuid, ObjectGuid)>,
    doors_used: u32,
    next_counter: u32,
}

impl Sandbox {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_counter(&mut self) -> u32 {
        self.next_counter += 1;
        self.next_counter
    }

    // -----------------------------------------------------------------------
    // Players and groups
    // -----------------------------------------------------------------------

    /// Log a player in, creating them on first login.
    pub fn login(&mut self, player: ObjectGuid, level: u32) {
        let entry = self
            .players
            .entry(player)
            .or_insert_with(|| SandboxPlayer::new(level));
        entry.online = true;
        entry.level = level;
    }

    pub fn logout(&mut self, player: ObjectGuid) -> bool {
        match self.players.get_mut(&player) {
            Some(p) => {
                p.online = false;
                true
            }
            None => false,
        }
    }

    pub fn player_mut(&mut self, player: ObjectGuid) -> Option<&mut SandboxPlayer> {
        self.players.get_mut(&player)
    }

    /// Form (or re-form) a group. Members leave any group they were in.
    pub fn form_group(
        &mut self,
        id: u32,
        members: Vec<ObjectGuid>,
        loot_method: LootMethod,
        threshold: ItemQuality,
    ) {
        for group in self.groups.values_mut() {
            group.members.retain(|m| !members.contains(m));
        }
        self.groups.retain(|_, group| !group.members.is_empty());
        self.groups.insert(
            id,
            GroupInfo {
                id,
                members,
                loot_method,
                threshold,
                looter: None,
                master_looter: None,
            },
        );
    }

    pub fn set_master_looter(&mut self, group_id: u32, player: ObjectGuid) -> bool {
        match self.groups.get_mut(&group_id) {
            Some(group) if group.members.contains(&player) => {
                group.master_looter = Some(player);
                true
            }
            _ => false,
        }
    }

    /// Toggle whether `player` is out of range of `target`. Returns the new state.
    pub fn toggle_range(&mut self, player: ObjectGuid, target: ObjectGuid) -> bool {
        if self.out_of_range.remove(&(player, target)) {
            false
        } else {
            self.out_of_range.insert((player, target));
            true
        }
    }

    // -----------------------------------------------------------------------
    // Spawns
    // -----------------------------------------------------------------------

    pub fn spawn_creature(&mut self, mut target: CreatureTarget) -> ObjectGuid {
        let guid = ObjectGuid::unit(self.next_counter());
        target.guid = guid;
        self.creatures.insert(
            guid,
            SpawnedCreature {
                target,
                status: CreatureLootStatus::None,
                threat: HashSet::new(),
            },
        );
        guid
    }

    /// The killer and every group member in range join the threat list.
    pub fn kill(&mut self, killer: ObjectGuid, creature: ObjectGuid) -> Option<CreatureTarget> {
        let mut attackers = vec![killer];
        if let Some(group) = self.group_of(killer) {
            attackers.extend(
                group
                    .members
                    .into_iter()
                    .filter(|&m| m != killer && self.is_at_group_reward_distance(m, creature)),
            );
        }
        let spawned = self.creatures.get_mut(&creature)?;
        spawned.threat.extend(attackers);
        Some(spawned.target.clone())
    }

    pub fn creature(&self, guid: ObjectGuid) -> Option<CreatureTarget> {
        self.creatures.get(&guid).map(|c| c.target.clone())
    }

    pub fn spawn_object(
        &mut self,
        entry: u32,
        kind: GameObjectKind,
        loot_id: u32,
        owner: Option<ObjectGuid>,
        zone_id: u32,
        area_id: u32,
    ) -> ObjectGuid {
        let guid = ObjectGuid::game_object(self.next_counter());
        let target = GameObjectTarget {
            guid,
            entry,
            kind,
            loot_id,
            min_money: 0,
            max_money: 0,
            owner,
            zone_id,
            area_id,
        };
        self.objects.insert(
            guid,
            SpawnedObject {
                target,
                state: GameObjectLootState::Ready,
            },
        );
        guid
    }

    pub fn object(&self, guid: ObjectGuid) -> Option<GameObjectTarget> {
        self.objects.get(&guid).map(|o| o.target.clone())
    }

    /// Hand the player an item instance they can open, disenchant or prospect.
    pub fn give_item(&mut self, player: ObjectGuid, entry: u32, count: u32) -> ObjectGuid {
        let guid = ObjectGuid::item(self.next_counter());
        self.items.insert(
            guid,
            HeldItem {
                target: ItemTarget { guid, entry, count },
                owner: player,
                state: ItemLootState::Temporary,
            },
        );
        guid
    }

    pub fn item(&self, guid: ObjectGuid) -> Option<ItemTarget> {
        self.items.get(&guid).map(|i| i.target.clone())
    }

    /// Leave bones behind for a dead player.
    pub fn spawn_bones(&mut self, owner: ObjectGuid, insignia_loot_id: Option<u32>) -> ObjectGuid {
        let guid = ObjectGuid::corpse(self.next_counter());
        let corpse = CorpseTarget {
            guid,
            owner,
            is_bones: true,
            insignia_loot_id,
        };
        self.corpses.insert(guid, (corpse, true));
        guid
    }

    pub fn corpse(&self, guid: ObjectGuid) -> Option<CorpseTarget> {
        self.corpses.get(&guid).map(|(c, _)| c.clone())
    }

    /// Remove a spawned object of any kind.
    pub fn despawn(&mut self, guid: ObjectGuid) -> bool {
        self.creatures.remove(&guid).is_some()
            || self.objects.remove(&guid).is_some()
            || self.items.remove(&guid).is_some()
            || self.corpses.remove(&guid).is_some()
    }

    pub fn doors_used(&self) -> u32 {
        self.doors_used
    }
}

impl LootWorld for Sandbox {
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
        self.creatures
            .get(&creature)
            .is_some_and(|c| c.threat.contains(&player))
    }

    fn has_quest_for_item(&self, player: ObjectGuid, item_id: u32) -> bool {
        self.players
            .get(&player)
            .is_some_and(|p| p.quest_items.contains(&item_id))
    }

    fn has_quest_status(&self, _player: ObjectGuid, _quest_id: u32) -> bool {
        false
    }

    fn is_condition_satisfied(&self, _condition_id: u16, _player: ObjectGuid, _target: ObjectGuid) -> bool {
        true
    }

    fn can_use_item(&self, player: ObjectGuid, _proto: &ItemPrototype) -> bool {
        self.players.contains_key(&player)
    }

    fn can_store_item(&self, player: ObjectGuid, item_id: u32, _count: u32) -> InventoryResult {
        let Some(p) = self.players.get(&player) else {
            return InventoryResult::CantDoRightNow;
        };
        if p.bag.iter().any(|(id, _)| *id == item_id) || p.bag.len() < p.bag_slots {
            InventoryResult::Ok
        } else {
            InventoryResult::InventoryFull
        }
    }

    fn store_item(&mut self, player: ObjectGuid, item_id: u32, count: u32, _random_property_id: i32) {
        let Some(p) = self.players.get_mut(&player) else {
            return;
        };
        match p.bag.iter_mut().find(|(id, _)| *id == item_id) {
            Some((_, stack)) => *stack += count,
            None => p.bag.push((item_id, count)),
        }
    }

    fn owns_item(&self, player: ObjectGuid, item: ObjectGuid) -> bool {
        self.items.get(&item).is_some_and(|i| i.owner == player)
    }

    fn destroy_item(&mut self, _player: ObjectGuid, item: ObjectGuid, count: Option<u32>) {
        let remaining = match (self.items.get_mut(&item), count) {
            (Some(held), Some(count)) => {
                held.target.count = held.target.count.saturating_sub(count);
                held.target.count
            }
            _ => 0,
        };
        if remaining == 0 {
            self.items.remove(&item);
        }
    }

    fn modify_money(&mut self, player: ObjectGuid, amount: u32) {
        if let Some(p) = self.players.get_mut(&player) {
            p.money = p.money.saturating_add(amount);
        }
    }

    fn set_creature_loot_status(&mut self, creature: ObjectGuid, status: CreatureLootStatus) {
        if let Some(c) = self.creatures.get_mut(&creature) {
            c.status = status;
        }
    }

    fn set_game_object_loot_state(&mut self, go: ObjectGuid, state: GameObjectLootState) {
        if let Some(o) = self.objects.get_mut(&go) {
            o.state = state;
        }
    }

    fn use_door(&mut self, _go: ObjectGuid) {
        self.doors_used += 1;
    }

    fn set_corpse_lootable(&mut self, corpse: ObjectGuid, lootable: bool) {
        if let Some((_, flag)) = self.corpses.get_mut(&corpse) {
            *flag = lootable;
        }
    }

    fn set_item_loot_state(&mut self, item: ObjectGuid, state: ItemLootState) {
        if state == ItemLootState::Removed {
            self.items.remove(&item);
        } else if let Some(held) = self.items.get_mut(&item) {
            held.state = state;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bag_stacks_and_fills() {
        let mut world = Sandbox::new();
        let p1 = ObjectGuid::player(1);
        world.login(p1, 10);
        world.player_mut(p1).unwrap().bag_slots = 1;

        assert_eq!(world.can_store_item(p1, 100, 1), InventoryResult::Ok);
        world.store_item(p1, 100, 1, 0);
        world.store_item(p1, 100, 2, 0);
        assert_eq!(world.players[&p1].bag, vec![(100, 3)]);
        assert_eq!(world.can_store_item(p1, 100, 1), InventoryResult::Ok);
        assert_eq!(world.can_store_item(p1, 200, 1), InventoryResult::InventoryFull);
        assert_eq!(
            world.can_store_item(ObjectGuid::player(9), 100, 1),
            InventoryResult::CantDoRightNow
        );
    }

    #[test]
    fn group_membership_moves() {
        let mut world = Sandbox::new();
        let (p1, p2, p3) = (ObjectGuid::player(1), ObjectGuid::player(2), ObjectGuid::player(3));
        world.form_group(1, vec![p1, p2], LootMethod::GroupLoot, ItemQuality::Uncommon);
        world.form_group(2, vec![p2, p3], LootMethod::RoundRobin, ItemQuality::Uncommon);

        assert_eq!(world.group_of(p1).map(|g| g.members), Some(vec![p1]));
        assert_eq!(world.group_of(p2).map(|g| g.id), Some(2));
        assert!(world.set_master_looter(2, p3));
        assert!(!world.set_master_looter(2, p1));
    }

    #[test]
    fn kill_puts_group_on_threat_list() {
        let mut world = Sandbox::new();
        let (p1, p2, p3) = (ObjectGuid::player(1), ObjectGuid::player(2), ObjectGuid::player(3));
        for p in [p1, p2, p3] {
            world.login(p, 20);
        }
        world.form_group(1, vec![p1, p2, p3], LootMethod::FreeForAll, ItemQuality::Uncommon);
        let mob = world.spawn_creature(CreatureTarget {
            loot_id: 5,
            level: 20,
            ..CreatureTarget::default()
        });
        assert!(world.toggle_range(p3, mob));

        let target = world.kill(p1, mob).unwrap();
        assert_eq!(target.guid, mob);
        assert!(world.has_threat(mob, p1));
        assert!(world.has_threat(mob, p2));
        assert!(!world.has_threat(mob, p3));
    }

    #[test]
    fn partial_destroy_keeps_stack() {
        let mut world = Sandbox::new();
        let p1 = ObjectGuid::player(1);
        world.login(p1, 30);
        let ore = world.give_item(p1, 2770, 7);

        world.destroy_item(p1, ore, Some(5));
        assert_eq!(world.item(ore).map(|i| i.count), Some(2));
        world.destroy_item(p1, ore, Some(5));
        assert!(world.item(ore).is_none());
        assert!(!world.owns_item(p1, ore));
    }
}
