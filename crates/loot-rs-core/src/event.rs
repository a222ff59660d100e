//! Outbound loot messages.
//!
//! The engine never talks to sessions directly. Every message is queued on a
//! [`LootOutbox`] with its recipient and the host drains the queue after each
//! call (see [`crate::LootCoordinator::drain_events`]).

use crate::defines::{
    ClientLootType, InventoryResult, LootErrorCode, LootSlotType, RollVote, RollVoteMask,
};
use crate::guid::ObjectGuid;

/// One visible slot of a loot window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LootView {
    pub slot: u8,
    pub item_id: u32,
    pub count: u32,
    pub display_id: u32,
    pub random_suffix: u32,
    pub random_property_id: i32,
    pub slot_type: LootSlotType,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LootEvent {
    /// Loot window contents.
    LootResponse {
        to: ObjectGuid,
        target: ObjectGuid,
        client_loot_type: ClientLootType,
        gold: u32,
        items: Vec<LootView>,
    },
    /// The window could not be opened.
    LootError {
        to: ObjectGuid,
        target: ObjectGuid,
        code: LootErrorCode,
    },
    /// Close the window.
    ReleaseResponse { to: ObjectGuid, target: ObjectGuid },
    /// A slot was emptied.
    ItemRemoved { to: ObjectGuid, slot: u8 },
    /// The gold was taken.
    ClearMoney { to: ObjectGuid },
    /// Share of gold received.
    MoneyNotify { to: ObjectGuid, amount: u32 },
    /// Item stored in the player's bags.
    NewItem {
        to: ObjectGuid,
        item_id: u32,
        count: u32,
    },
    /// Item could not be stored.
    EquipError {
        to: ObjectGuid,
        item_id: u32,
        result: InventoryResult,
    },
    /// Who may loot right now: master and current looter.
    AllowedLooters {
        to: ObjectGuid,
        target: ObjectGuid,
        master: Option<ObjectGuid>,
        current_looter: Option<ObjectGuid>,
    },
    /// Candidates the master looter can assign items to.
    MasterList {
        to: ObjectGuid,
        target: ObjectGuid,
        candidates: Vec<ObjectGuid>,
    },
    /// A roll started on an item.
    StartRoll {
        to: ObjectGuid,
        target: ObjectGuid,
        slot: u8,
        item_id: u32,
        random_suffix: u32,
        random_property_id: i32,
        countdown_ms: u32,
        vote_mask: RollVoteMask,
    },
    /// A vote or its revealed roll.
    Roll {
        to: ObjectGuid,
        target: ObjectGuid,
        slot: u8,
        roller: ObjectGuid,
        item_id: u32,
        roll_number: u8,
        roll_type: u8,
    },
    /// Roll winner.
    RollWon {
        to: ObjectGuid,
        target: ObjectGuid,
        slot: u8,
        item_id: u32,
        winner: ObjectGuid,
        roll_number: u8,
        vote: RollVote,
    },
    /// Nobody wanted the item.
    AllPassed {
        to: ObjectGuid,
        target: ObjectGuid,
        slot: u8,
        item_id: u32,
    },
}

impl LootEvent {
    /// Player this message is addressed to.
    pub fn recipient(&self) -> ObjectGuid {
        match self {
            Self::LootResponse { to, .. }
            | Self::LootError { to, .. }
            | Self::ReleaseResponse { to, .. }
            | Self::ItemRemoved { to, .. }
            | Self::ClearMoney { to }
            | Self::MoneyNotify { to, .. }
            | Self::NewItem { to, .. }
            | Self::EquipError { to, .. }
            | Self::AllowedLooters { to, .. }
            | Self::MasterList { to, .. }
            | Self::StartRoll { to, .. }
            | Self::Roll { to, .. }
            | Self::RollWon { to, .. }
            | Self::AllPassed { to, .. } => *to,
        }
    }
}

/// Pending outbound messages.
#[derive(Debug, Default)]
pub struct LootOutbox {
    events: Vec<LootEvent>,
}

impl LootOutbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: LootEvent) {
        self.events.push(event);
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn events(&self) -> &[LootEvent] {
        &self.events
    }

    /// Take every pending message.
    pub fn drain(&mut self) -> Vec<LootEvent> {
        std::mem::take(&mut self.events)
    }
}
