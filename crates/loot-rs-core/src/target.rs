//! Descriptions of the world objects loot can be taken from.
//!
//! The engine keeps a copy of the static data it needs (loot ids, money
//! range, chest opens) and reports state changes back through
//! [`crate::LootWorld`]. It never owns the object itself.

use crate::guid::ObjectGuid;

#[derive(Debug, Clone, Default)]
pub struct CreatureTarget {
    pub guid: ObjectGuid,
    pub entry: u32,
    pub level: u32,
    pub loot_id: u32,
    pub pickpocket_loot_id: u32,
    pub skinning_loot_id: u32,
    pub min_gold: u32,
    pub max_gold: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameObjectKind {
    Chest {
        min_success_opens: u32,
        max_success_opens: u32,
        /// Skill the chest's lock requires. Veins use it for refill odds.
        lock_skill: Option<u32>,
        group_loot_rules: bool,
    },
    FishingHole {
        min_success_opens: u32,
        max_success_opens: u32,
    },
    /// Fishing bobber.
    FishingNode,
    Door,
    Other,
}

impl GameObjectKind {
    /// Mining veins are chests that can be opened more than once.
    pub fn is_vein(&self) -> bool {
        matches!(
            self,
            Self::Chest { min_success_opens, max_success_opens, .. }
                if *min_success_opens != 0 && max_success_opens > min_success_opens
        )
    }
}

#[derive(Debug, Clone)]
pub struct GameObjectTarget {
    pub guid: ObjectGuid,
    pub entry: u32,
    pub kind: GameObjectKind,
    pub loot_id: u32,
    pub min_money: u32,
    pub max_money: u32,
    /// Player that spawned the object (fishing bobbers).
    pub owner: Option<ObjectGuid>,
    pub zone_id: u32,
    pub area_id: u32,
}

impl GameObjectTarget {
    pub fn is_chest(&self) -> bool {
        matches!(self.kind, GameObjectKind::Chest { .. })
    }
}

#[derive(Debug, Clone)]
pub struct CorpseTarget {
    pub guid: ObjectGuid,
    pub owner: ObjectGuid,
    /// Only bones can be looted for insignia.
    pub is_bones: bool,
    /// Template rolled into the insignia loot, when the battleground has one.
    pub insignia_loot_id: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct ItemTarget {
    pub guid: ObjectGuid,
    pub entry: u32,
    /// Stack size; prospecting consumes up to five.
    pub count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MailTarget {
    pub mail_id: u32,
    pub template_id: u32,
}

/// What a container is attached to.
#[derive(Debug, Clone)]
pub enum LootTarget {
    Creature(CreatureTarget),
    GameObject(GameObjectTarget),
    Corpse(CorpseTarget),
    Item(ItemTarget),
    Mail(MailTarget),
}

impl LootTarget {
    pub fn guid(&self) -> ObjectGuid {
        match self {
            Self::Creature(c) => c.guid,
            Self::GameObject(go) => go.guid,
            Self::Corpse(c) => c.guid,
            Self::Item(item) => item.guid,
            Self::Mail(mail) => ObjectGuid::mail(mail.mail_id),
        }
    }

    pub fn is_chest(&self) -> bool {
        matches!(self, Self::GameObject(go) if go.is_chest())
    }

    /// Group rules only apply to creatures and to chests flagged for them.
    pub fn uses_group_rules(&self) -> bool {
        match self {
            Self::Creature(_) => true,
            Self::GameObject(go) => {
                matches!(go.kind, GameObjectKind::Chest { group_loot_rules: true, .. })
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chest(min: u32, max: u32, group_loot_rules: bool) -> GameObjectTarget {
        GameObjectTarget {
            guid: ObjectGuid::game_object(1),
            entry: 1731,
            kind: GameObjectKind::Chest {
                min_success_opens: min,
                max_success_opens: max,
                lock_skill: None,
                group_loot_rules,
            },
            loot_id: 1731,
            min_money: 0,
            max_money: 0,
            owner: None,
            zone_id: 1,
            area_id: 1,
        }
    }

    #[test]
    fn vein_detection() {
        assert!(chest(2, 4, false).kind.is_vein());
        assert!(!chest(0, 4, false).kind.is_vein());
        assert!(!chest(3, 3, false).kind.is_vein());
        assert!(!GameObjectKind::Door.is_vein());
    }

    #[test]
    fn group_rules() {
        assert!(LootTarget::GameObject(chest(0, 0, true)).uses_group_rules());
        assert!(!LootTarget::GameObject(chest(0, 0, false)).uses_group_rules());
        assert!(LootTarget::Creature(CreatureTarget::default()).uses_group_rules());
        let mail = LootTarget::Mail(MailTarget { mail_id: 9, template_id: 1 });
        assert!(!mail.uses_group_rules());
        assert_eq!(mail.guid(), ObjectGuid::mail(9));
    }
}
