//! A single item inside a loot container and the rules deciding how each
//! player sees it.

use std::collections::BTreeSet;

use tracing::error;

use loot_rs_table::{ItemPrototype, ItemQuality, LootStoreItem};

use crate::defines::LootSlotType;
use crate::guid::ObjectGuid;
use crate::policy::Distribution;
use crate::world::LootWorld;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LootItemType {
    Normal,
    /// Only visible to players on a quest that needs it.
    Quest,
    /// Visible when the attached condition holds.
    Conditional,
}

/// What the slot rules need to know about the container.
#[derive(Debug, Clone, Copy)]
pub struct SlotRules {
    pub distribution: Distribution,
    pub is_chest: bool,
    pub current_looter: Option<ObjectGuid>,
    pub master_looter: Option<ObjectGuid>,
    /// The master looter is online to hand out items.
    pub master_present: bool,
    pub show_all_in_master_loot: bool,
}

#[derive(Debug, Clone)]
pub struct LootItem {
    pub slot: u8,
    pub item_id: u32,
    pub count: u32,
    pub proto: Option<ItemPrototype>,
    pub random_suffix: u32,
    pub random_property_id: i32,
    pub condition_id: u16,
    pub kind: LootItemType,
    /// Every allowed player may take their own copy.
    pub free_for_all: bool,
    pub is_under_threshold: bool,
    /// Withheld while a roll runs.
    pub is_blocked: bool,
    /// Freed from the current looter's claim.
    pub is_released: bool,
    /// The current looter cannot take it, so it is open to the others.
    pub current_looter_pass: bool,
    pub allowed: BTreeSet<ObjectGuid>,
    pub picked_up: BTreeSet<ObjectGuid>,
}

impl LootItem {
    /// Item rolled from a template entry.
    pub fn from_store(
        entry: &LootStoreItem,
        count: u32,
        slot: u8,
        threshold: ItemQuality,
        proto: Option<&ItemPrototype>,
        enchantment: (u32, i32),
    ) -> Self {
        let kind = if entry.needs_quest {
            LootItemType::Quest
        } else if entry.condition_id != 0 {
            LootItemType::Conditional
        } else {
            LootItemType::Normal
        };
        let mut item = Self::new(entry.item_id, count, slot, proto, enchantment);
        item.kind = kind;
        item.condition_id = entry.condition_id;
        item.is_under_threshold = proto.map(|p| p.quality < threshold).unwrap_or(false);
        item
    }

    /// Item restored from storage (item containers, mail).
    pub fn saved(
        item_id: u32,
        count: u32,
        slot: u8,
        proto: Option<&ItemPrototype>,
        enchantment: (u32, i32),
    ) -> Self {
        Self::new(item_id, count, slot, proto, enchantment)
    }

    fn new(
        item_id: u32,
        count: u32,
        slot: u8,
        proto: Option<&ItemPrototype>,
        (random_suffix, random_property_id): (u32, i32),
    ) -> Self {
        if proto.is_none() {
            error!("loot item {} has no prototype", item_id);
        }
        Self {
            slot,
            item_id,
            count,
            free_for_all: proto.map(ItemPrototype::is_multi_drop).unwrap_or(false),
            proto: proto.cloned(),
            random_suffix,
            random_property_id,
            condition_id: 0,
            kind: LootItemType::Normal,
            is_under_threshold: false,
            is_blocked: false,
            is_released: false,
            current_looter_pass: false,
            allowed: BTreeSet::new(),
            picked_up: BTreeSet::new(),
        }
    }

    pub fn quality(&self) -> Option<ItemQuality> {
        self.proto.as_ref().map(|p| p.quality)
    }

    pub fn display_id(&self) -> u32 {
        self.proto.as_ref().map(|p| p.display_id).unwrap_or(0)
    }

    /// Static eligibility: prototype, quest need, condition and already
    /// started quests.
    pub fn allowed_for_player(
        &self,
        player: ObjectGuid,
        target: ObjectGuid,
        world: &dyn LootWorld,
    ) -> bool {
        let Some(proto) = &self.proto else {
            return false;
        };

        match self.kind {
            LootItemType::Normal => {}
            LootItemType::Conditional => {
                if !world.is_condition_satisfied(self.condition_id, player, target) {
                    return false;
                }
            }
            LootItemType::Quest => {
                if !world.has_quest_for_item(player, self.item_id) {
                    return false;
                }
            }
        }

        // quest starters are useless once the quest was taken
        !(proto.start_quest != 0
            && world.has_quest_status(player, proto.start_quest)
            && !world.has_quest_for_item(player, self.item_id))
    }

    /// Allowed and not yet taken by this player.
    pub fn is_allowed(&self, player: ObjectGuid) -> bool {
        self.allowed.contains(&player) && !self.picked_up.contains(&player)
    }

    /// A non-FFA item someone already took.
    pub fn is_taken(&self) -> bool {
        !self.free_for_all && !self.picked_up.is_empty()
    }

    /// Record a successful pickup.
    pub fn mark_picked(&mut self, player: ObjectGuid) {
        if self.free_for_all {
            self.allowed.remove(&player);
        } else {
            self.allowed.clear();
        }
        self.picked_up.insert(player);
    }

    /// Give `player` the right to this item if eligible. An ineligible
    /// current looter passes the item on instead.
    pub fn grant(
        &mut self,
        player: ObjectGuid,
        target: ObjectGuid,
        is_current_looter: bool,
        world: &dyn LootWorld,
    ) {
        if self.is_taken() || self.picked_up.contains(&player) {
            return;
        }
        if world.is_online(player) && self.allowed_for_player(player, target, world) {
            self.allowed.insert(player);
        } else if is_current_looter {
            self.current_looter_pass = true;
        }
    }

    fn is_turn_of(&self, player: ObjectGuid, rules: &SlotRules) -> bool {
        self.is_released || self.current_looter_pass || rules.current_looter == Some(player)
    }

    /// How `player` sees this item; `None` hides it.
    pub fn slot_type(&self, player: ObjectGuid, rules: &SlotRules) -> Option<LootSlotType> {
        use LootSlotType::{Master, Normal, Owner, View};

        let is_master = rules.master_looter == Some(player);

        // the master sees conditional items even without meeting them
        if rules.distribution == Distribution::MasterLoot && self.kind == LootItemType::Conditional
        {
            if self.is_under_threshold {
                if !self.is_allowed(player) {
                    return None;
                }
                if self.is_blocked {
                    return Some(View);
                }
                return self.is_turn_of(player, rules).then_some(Owner);
            }

            if is_master && rules.master_present && !self.allowed.is_empty() {
                return Some(Master);
            }
            if !self.is_allowed(player) {
                return None;
            }
            if self.is_turn_of(player, rules) || !rules.master_present {
                return Some(Owner);
            }
            return rules.show_all_in_master_loot.then_some(View);
        }

        if !self.is_allowed(player) {
            return None;
        }

        if self.free_for_all {
            return Some(match rules.distribution {
                Distribution::NotGroup => Owner,
                _ => Normal,
            });
        }

        if matches!(self.kind, LootItemType::Quest | LootItemType::Conditional) {
            return match rules.distribution {
                Distribution::NotGroup | Distribution::FreeForAll => Some(Owner),
                _ if rules.is_chest => Some(Owner),
                _ if self.is_blocked => Some(View),
                _ => self.is_turn_of(player, rules).then_some(Owner),
            };
        }

        match rules.distribution {
            Distribution::FreeForAll | Distribution::NotGroup => Some(Owner),
            Distribution::GroupLoot | Distribution::NeedBeforeGreed => {
                if self.is_blocked {
                    Some(View)
                } else if rules.is_chest || self.is_turn_of(player, rules) {
                    Some(Normal)
                } else {
                    None
                }
            }
            Distribution::MasterLoot => {
                if self.is_under_threshold {
                    if rules.is_chest {
                        Some(Owner)
                    } else if self.is_blocked {
                        Some(View)
                    } else {
                        self.is_turn_of(player, rules).then_some(Owner)
                    }
                } else if is_master && rules.master_present {
                    Some(Master)
                } else if self.is_blocked {
                    Some(View)
                } else if self.is_released || !rules.master_present {
                    Some(Owner)
                } else if rules.show_all_in_master_loot {
                    Some(View)
                } else {
                    None
                }
            }
            Distribution::RoundRobin => {
                if rules.is_chest {
                    Some(Normal)
                } else {
                    self.is_turn_of(player, rules).then_some(Owner)
                }
            }
        }
    }
}
