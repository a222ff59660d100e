//! Loot enums and constants shared by every part of the engine.
//!
//! Numeric values are the ones clients expect on the wire.

/// A container never holds more items than the client can show.
pub const MAX_NR_LOOT_ITEMS: usize = 16;

/// Time players get to vote on a rolled item, in milliseconds.
pub const LOOT_ROLL_TIMEOUT_MS: u32 = 60_000;

/// Roll number/type shown for players that passed or could not vote.
pub const ROLL_HIDDEN: u8 = 128;

/// Group distribution method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LootMethod {
    FreeForAll = 0,
    RoundRobin = 1,
    MasterLoot = 2,
    GroupLoot = 3,
    NeedBeforeGreed = 4,
}

impl LootMethod {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::FreeForAll),
            1 => Some(Self::RoundRobin),
            2 => Some(Self::MasterLoot),
            3 => Some(Self::GroupLoot),
            4 => Some(Self::NeedBeforeGreed),
            _ => None,
        }
    }

    /// Parse a method name as typed on the console.
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "ffa" | "free_for_all" => Some(Self::FreeForAll),
            "rr" | "round_robin" => Some(Self::RoundRobin),
            "master" | "master_loot" => Some(Self::MasterLoot),
            "group" | "group_loot" => Some(Self::GroupLoot),
            "nbg" | "need_before_greed" => Some(Self::NeedBeforeGreed),
            _ => name.parse::<u8>().ok().and_then(Self::from_u8),
        }
    }
}

/// Why a container was created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LootType {
    Corpse = 1,
    Pickpocketing = 2,
    Fishing = 3,
    Disenchanting = 4,
    Item = 5,
    Skinning = 6,
    Prospecting = 7,
    FishingHole = 20,
    FishingFail = 21,
    Insignia = 22,
    Mail = 23,
}

/// Loot window flavour sent to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClientLootType {
    Corpse = 1,
    Pickpocketing = 2,
    Fishing = 3,
    Disenchanting = 4,
}

/// How a slot is shown to one player. Hidden slots are `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LootSlotType {
    /// Can be looted.
    Normal = 0,
    /// Shown but cannot be taken.
    View = 1,
    /// Only the master looter may hand it out.
    Master = 2,
    /// Requirements not met.
    Reqs = 3,
    /// Taken without binding confirmation.
    Owner = 4,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RollVote {
    Pass = 0,
    Need = 1,
    Greed = 2,
    Disenchant = 3,
    NotEmittedYet = 4,
    NotValid = 5,
}

impl RollVote {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Pass),
            1 => Some(Self::Need),
            2 => Some(Self::Greed),
            3 => Some(Self::Disenchant),
            4 => Some(Self::NotEmittedYet),
            5 => Some(Self::NotValid),
            _ => None,
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "pass" => Some(Self::Pass),
            "need" => Some(Self::Need),
            "greed" => Some(Self::Greed),
            "disenchant" | "de" => Some(Self::Disenchant),
            _ => name.parse::<u8>().ok().and_then(Self::from_u8),
        }
    }

    /// The mask bit a player needs to cast this vote.
    pub fn mask_bit(self) -> RollVoteMask {
        match self {
            Self::Pass => RollVoteMask::PASS,
            Self::Need => RollVoteMask::NEED,
            Self::Greed => RollVoteMask::GREED,
            Self::Disenchant => RollVoteMask::DISENCHANT,
            Self::NotEmittedYet | Self::NotValid => RollVoteMask(0),
        }
    }
}

/// Votes offered to a player when a roll starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RollVoteMask(pub u8);

impl RollVoteMask {
    pub const PASS: Self = Self(0x01);
    pub const NEED: Self = Self(0x02);
    pub const GREED: Self = Self(0x04);
    pub const DISENCHANT: Self = Self(0x08);
    pub const ALL: Self = Self(0x0F);

    pub fn contains(self, other: Self) -> bool {
        other.0 != 0 && self.0 & other.0 == other.0
    }

    pub fn without(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }
}

/// Per-player summary of what is left in a container.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct LootStatus(pub u32);

impl LootStatus {
    pub const NOT_FULLY_LOOTED: Self = Self(0x01);
    pub const CONTAIN_FFA: Self = Self(0x02);
    pub const CONTAIN_GOLD: Self = Self(0x04);
    pub const CONTAIN_RELEASED_ITEMS: Self = Self(0x08);
    pub const ONGOING_ROLL: Self = Self(0x10);
    pub const FAKE_LOOT: Self = Self(0x20);

    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

/// Popup shown when a loot action is refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LootErrorCode {
    DidntKill = 0,
    TooFar = 4,
    BadFacing = 5,
    Locked = 6,
    NotStanding = 8,
    Stunned = 9,
    PlayerNotFound = 10,
    PlayTimeExceeded = 11,
    MasterInvFull = 12,
    MasterUniqueItem = 13,
    MasterOther = 14,
    AlreadyPickpocketed = 15,
    NotWhileShapeshifted = 16,
}

/// Result of an inventory check, reported to the player as an equip error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InventoryResult {
    Ok,
    InventoryFull,
    ItemMaxCount,
    ItemNotFound,
    CantDoRightNow,
    OutOfRange,
}

impl InventoryResult {
    pub fn is_ok(self) -> bool {
        self == Self::Ok
    }

    /// Error popup shown to a master looter whose assignment failed.
    pub fn master_error(self) -> LootErrorCode {
        match self {
            Self::InventoryFull => LootErrorCode::MasterInvFull,
            Self::ItemMaxCount => LootErrorCode::MasterUniqueItem,
            _ => LootErrorCode::MasterOther,
        }
    }
}

/// Creature state a loot container moves through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CreatureLootStatus {
    None,
    /// Corpse shows the lootable sparkle.
    Lootable,
    Pickpocketed,
    Looted,
    SkinAvailable,
    Skinned,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameObjectLootState {
    Ready,
    Activated,
    JustDeactivated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemLootState {
    Temporary,
    Changed,
    Removed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Skill {
    Enchanting,
    Mining,
}
