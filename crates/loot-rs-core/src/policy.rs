//! Distribution policies: who owns a container and whose turn it is.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use loot_rs_table::ItemQuality;

use crate::config::LootConfig;
use crate::defines::{LootMethod, Skill};
use crate::guid::ObjectGuid;
use crate::item::SlotRules;
use crate::roll::GroupRollSession;
use crate::target::LootTarget;
use crate::world::LootWorld;

/// Effective distribution once the owners are known.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Distribution {
    /// One owner, or a loot type that ignores groups.
    NotGroup,
    FreeForAll,
    RoundRobin,
    GroupLoot,
    NeedBeforeGreed,
    MasterLoot,
}

#[derive(Debug, Clone, Copy)]
pub struct RoundRobinState {
    pub current_looter: ObjectGuid,
}

/// State shared by the roll-capable variants.
#[derive(Debug, Default)]
pub struct RollingState {
    pub current_looter: ObjectGuid,
    /// At most one session per slot.
    pub rolls: BTreeMap<u8, GroupRollSession>,
    /// Rolls are started when the first window opens.
    pub checked: bool,
}

impl RollingState {
    fn new(current_looter: ObjectGuid) -> Self {
        Self {
            current_looter,
            rolls: BTreeMap::new(),
            checked: false,
        }
    }
}

#[derive(Debug)]
pub struct MasterLootState {
    pub master: ObjectGuid,
    pub rolling: RollingState,
}

#[derive(Debug)]
pub enum LootPolicy {
    /// Everything belongs to the single owner.
    SoloOwner,
    /// Skinning: the skinner first; once they release with items left,
    /// anyone may finish it.
    SkinningSharedRelease { released: bool },
    /// Chest opened outside group rules; later openers join the owners.
    ChestSolo,
    FreeForAll,
    RoundRobin(RoundRobinState),
    GroupRoll(RollingState),
    NeedBeforeGreed(RollingState),
    MasterLoot(MasterLootState),
}

/// Result of picking the owners of a container.
#[derive(Debug)]
pub struct Initialized {
    pub policy: LootPolicy,
    pub owners: BTreeSet<ObjectGuid>,
    pub threshold: ItemQuality,
    pub max_enchant_skill: u32,
}

impl LootPolicy {
    pub fn distribution(&self) -> Distribution {
        match self {
            Self::SoloOwner | Self::SkinningSharedRelease { .. } | Self::ChestSolo => {
                Distribution::NotGroup
            }
            Self::FreeForAll => Distribution::FreeForAll,
            Self::RoundRobin(_) => Distribution::RoundRobin,
            Self::GroupRoll(_) => Distribution::GroupLoot,
            Self::NeedBeforeGreed(_) => Distribution::NeedBeforeGreed,
            Self::MasterLoot(_) => Distribution::MasterLoot,
        }
    }

    /// Whether the variant is driven by a group's rotation.
    pub fn is_group(&self) -> bool {
        !matches!(self.distribution(), Distribution::NotGroup | Distribution::FreeForAll)
    }

    pub fn current_looter(&self) -> Option<ObjectGuid> {
        match self {
            Self::RoundRobin(state) => Some(state.current_looter),
            Self::GroupRoll(state) | Self::NeedBeforeGreed(state) => Some(state.current_looter),
            Self::MasterLoot(state) => Some(state.rolling.current_looter),
            _ => None,
        }
    }

    /// Hand the turn to `player` (after a failed delivery).
    pub fn set_current_looter(&mut self, player: ObjectGuid) {
        match self {
            Self::RoundRobin(state) => state.current_looter = player,
            Self::GroupRoll(state) | Self::NeedBeforeGreed(state) => state.current_looter = player,
            Self::MasterLoot(state) => state.rolling.current_looter = player,
            _ => {}
        }
    }

    pub fn master_looter(&self) -> Option<ObjectGuid> {
        match self {
            Self::MasterLoot(state) => Some(state.master),
            _ => None,
        }
    }

    pub fn rolling(&self) -> Option<&RollingState> {
        match self {
            Self::GroupRoll(state) | Self::NeedBeforeGreed(state) => Some(state),
            Self::MasterLoot(state) => Some(&state.rolling),
            _ => None,
        }
    }

    pub fn rolling_mut(&mut self) -> Option<&mut RollingState> {
        match self {
            Self::GroupRoll(state) | Self::NeedBeforeGreed(state) => Some(state),
            Self::MasterLoot(state) => Some(&mut state.rolling),
            _ => None,
        }
    }

    pub fn roll_for_slot(&self, slot: u8) -> Option<&GroupRollSession> {
        self.rolling().and_then(|state| state.rolls.get(&slot))
    }

    pub fn roll_for_slot_mut(&mut self, slot: u8) -> Option<&mut GroupRollSession> {
        self.rolling_mut().and_then(|state| state.rolls.get_mut(&slot))
    }

    pub fn slot_rules(&self, is_chest: bool, config: &LootConfig, world: &dyn LootWorld) -> SlotRules {
        let master_looter = self.master_looter();
        SlotRules {
            distribution: self.distribution(),
            is_chest,
            current_looter: self.current_looter(),
            master_looter,
            master_present: master_looter.map_or(true, |master| world.is_online(master)),
            show_all_in_master_loot: config.show_all_items_in_master_loot,
        }
    }

    /// Policy for loot that only its opener can take.
    pub fn solo(player: ObjectGuid, target: &LootTarget) -> Initialized {
        let policy = if target.is_chest() {
            Self::ChestSolo
        } else {
            Self::SoloOwner
        };
        Initialized {
            policy,
            owners: BTreeSet::from([player]),
            threshold: ItemQuality::Uncommon,
            max_enchant_skill: 0,
        }
    }

    /// Pick owners and the variant for a kill or group chest.
    ///
    /// Members are walked in slot order starting just after the group's
    /// current looter. The group pointer is advanced so that consecutive
    /// containers cycle through the eligible members.
    pub fn for_group(
        player: ObjectGuid,
        target: &LootTarget,
        world: &mut dyn LootWorld,
    ) -> Initialized {
        if !target.uses_group_rules() {
            return Self::solo(player, target);
        }
        let Some(group) = world.group_of(player) else {
            return Self::solo(player, target);
        };
        if group.members.is_empty() {
            return Self::solo(player, target);
        }

        let target_guid = target.guid();
        let members = &group.members;
        let (start, current) = match group
            .looter
            .and_then(|looter| members.iter().position(|&m| m == looter))
        {
            Some(index) => (index, members[index]),
            None => {
                let first = members[0];
                world.set_group_looter(group.id, first);
                (0, first)
            }
        };

        let mut ordered = Vec::with_capacity(members.len());
        let mut max_enchant_skill = 0;
        for step in 1..=members.len() {
            let member = members[(start + step) % members.len()];
            if !world.is_online(member) {
                continue;
            }
            let eligible = world.is_at_group_reward_distance(member, target_guid)
                || (matches!(target, LootTarget::Creature(_))
                    && world.has_threat(target_guid, member));
            if eligible {
                ordered.push(member);
                max_enchant_skill = max_enchant_skill.max(world.skill_value(member, Skill::Enchanting));
            }
        }
        let mut owners: BTreeSet<ObjectGuid> = ordered.iter().copied().collect();

        let mut method = group.loot_method;
        let mut master = None;
        if method == LootMethod::MasterLoot {
            master = group.master_looter.filter(|m| owners.contains(m));
            if master.is_none() {
                debug!("master looter of group {} not eligible, using group loot", group.id);
                method = LootMethod::GroupLoot;
            }
        }

        if owners.len() > 1 && method != LootMethod::FreeForAll {
            let current_looter = if owners.contains(&current) {
                world.set_group_looter(group.id, ordered[0]);
                current
            } else {
                world.set_group_looter(group.id, ordered[1]);
                ordered[0]
            };

            let policy = match method {
                LootMethod::RoundRobin => Self::RoundRobin(RoundRobinState { current_looter }),
                LootMethod::NeedBeforeGreed => Self::NeedBeforeGreed(RollingState::new(current_looter)),
                LootMethod::MasterLoot => Self::MasterLoot(MasterLootState {
                    master: master.unwrap_or(current_looter),
                    rolling: RollingState::new(current_looter),
                }),
                _ => Self::GroupRoll(RollingState::new(current_looter)),
            };
            return Initialized {
                policy,
                owners,
                threshold: group.threshold,
                max_enchant_skill,
            };
        }

        owners.insert(player);
        let policy = if method == LootMethod::FreeForAll && owners.len() > 1 {
            Self::FreeForAll
        } else if target.is_chest() {
            Self::ChestSolo
        } else {
            Self::SoloOwner
        };
        Initialized {
            policy,
            owners,
            threshold: group.threshold,
            max_enchant_skill,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::target::CreatureTarget;
    use crate::testing::MockWorld;

    const P1: ObjectGuid = ObjectGuid::player(1);
    const P2: ObjectGuid = ObjectGuid::player(2);
    const P3: ObjectGuid = ObjectGuid::player(3);
    const MOB: ObjectGuid = ObjectGuid::unit(50);

    fn mob() -> LootTarget {
        LootTarget::Creature(CreatureTarget {
            guid: MOB,
            ..CreatureTarget::default()
        })
    }

    fn group_world(method: LootMethod) -> MockWorld {
        let mut world = MockWorld::new();
        for p in [P1, P2, P3] {
            world.add_player(p, 60);
        }
        world.make_group(1, &[P1, P2, P3], method, ItemQuality::Uncommon);
        world
    }

    #[test]
    fn solo_without_group() {
        let mut world = MockWorld::new();
        world.add_player(P1, 10);
        let init = LootPolicy::for_group(P1, &mob(), &mut world);
        assert!(matches!(init.policy, LootPolicy::SoloOwner));
        assert_eq!(init.owners, BTreeSet::from([P1]));
        assert_eq!(init.policy.distribution(), Distribution::NotGroup);
    }

    #[test]
    fn round_robin_rotates() {
        let mut world = group_world(LootMethod::RoundRobin);
        let mut looters = Vec::new();
        for _ in 0..4 {
            let init = LootPolicy::for_group(P1, &mob(), &mut world);
            looters.push(init.policy.current_looter().unwrap());
            assert_eq!(init.owners.len(), 3);
        }
        assert_eq!(looters, vec![P1, P2, P3, P1]);
    }

    #[test]
    fn out_of_range_members_are_skipped() {
        let mut world = group_world(LootMethod::GroupLoot);
        world.set_out_of_range(P2, MOB);
        world.set_group_looter(1, P2);

        let init = LootPolicy::for_group(P1, &mob(), &mut world);
        assert_eq!(init.owners, BTreeSet::from([P1, P3]));
        // P2 had the turn but is not eligible: first eligible after P2 takes it
        assert_eq!(init.policy.current_looter(), Some(P3));
        assert_eq!(world.group_looter(1), Some(P1));
        assert!(matches!(init.policy, LootPolicy::GroupRoll(_)));
    }

    #[test]
    fn threat_makes_far_members_eligible() {
        let mut world = group_world(LootMethod::GroupLoot);
        world.set_out_of_range(P3, MOB);
        world.add_threat(MOB, P3);
        let init = LootPolicy::for_group(P1, &mob(), &mut world);
        assert!(init.owners.contains(&P3));
    }

    #[test]
    fn absent_master_demotes_to_group_loot() {
        let mut world = group_world(LootMethod::MasterLoot);
        world.set_master_looter(1, P3);
        world.set_out_of_range(P3, MOB);
        let init = LootPolicy::for_group(P1, &mob(), &mut world);
        assert!(matches!(init.policy, LootPolicy::GroupRoll(_)));

        let mut world = group_world(LootMethod::MasterLoot);
        world.set_master_looter(1, P3);
        let init = LootPolicy::for_group(P1, &mob(), &mut world);
        assert_eq!(init.policy.master_looter(), Some(P3));
        assert_eq!(init.policy.distribution(), Distribution::MasterLoot);
    }

    #[test]
    fn free_for_all_keeps_owners() {
        let mut world = group_world(LootMethod::FreeForAll);
        let init = LootPolicy::for_group(P2, &mob(), &mut world);
        assert!(matches!(init.policy, LootPolicy::FreeForAll));
        assert_eq!(init.owners.len(), 3);
        assert_eq!(init.policy.current_looter(), None);
    }

    #[test]
    fn lone_eligible_member_is_solo() {
        let mut world = group_world(LootMethod::GroupLoot);
        world.set_out_of_range(P2, MOB);
        world.set_out_of_range(P3, MOB);
        let init = LootPolicy::for_group(P1, &mob(), &mut world);
        assert!(matches!(init.policy, LootPolicy::SoloOwner));
        assert_eq!(init.owners, BTreeSet::from([P1]));
    }

    #[test]
    fn enchanting_skill_is_tracked() {
        let mut world = group_world(LootMethod::NeedBeforeGreed);
        world.set_skill(P2, Skill::Enchanting, 225);
        let init = LootPolicy::for_group(P1, &mob(), &mut world);
        assert_eq!(init.max_enchant_skill, 225);
        assert!(matches!(init.policy, LootPolicy::NeedBeforeGreed(_)));
    }
}
