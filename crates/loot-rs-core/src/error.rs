use thiserror::Error;

use crate::defines::{InventoryResult, LootErrorCode};
use crate::guid::ObjectGuid;

/// Why a player action on a loot container was refused.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LootError {
    #[error("no loot found for {player} (target {target:?})")]
    NotFound {
        player: ObjectGuid,
        target: Option<ObjectGuid>,
    },

    #[error("{player} has no loot window open on {target}")]
    NotLooting { player: ObjectGuid, target: ObjectGuid },

    #[error("{target} has no item in slot {slot}")]
    SlotNotFound { target: ObjectGuid, slot: u8 },

    #[error("{player} may not loot {target}")]
    NotPermitted { player: ObjectGuid, target: ObjectGuid },

    #[error("{player} may not take slot {slot} of {target}")]
    SlotNotPermitted {
        player: ObjectGuid,
        target: ObjectGuid,
        slot: u8,
    },

    #[error("{target} refused {player}: {code:?}")]
    Refused {
        player: ObjectGuid,
        target: ObjectGuid,
        code: LootErrorCode,
    },

    #[error("{player} could not receive item {item_id}: {result:?}")]
    Inventory {
        player: ObjectGuid,
        item_id: u32,
        result: InventoryResult,
    },

    #[error("no roll running for slot {slot} of {target}")]
    RollNotFound { target: ObjectGuid, slot: u8 },

    #[error("{player} cannot vote on slot {slot}")]
    NotAVoter { player: ObjectGuid, slot: u8 },

    #[error("{player} already voted on slot {slot}")]
    AlreadyVoted { player: ObjectGuid, slot: u8 },

    #[error("vote {vote} is not offered to {player}")]
    VoteNotAllowed { player: ObjectGuid, vote: u8 },

    #[error("{target} has no gold left")]
    NoGold { target: ObjectGuid },

    #[error("{player} is not the master looter of {target}")]
    NotMasterLooter { player: ObjectGuid, target: ObjectGuid },

    #[error("{target} cannot be looted right now")]
    NotReady { target: ObjectGuid },
}

impl LootError {
    /// Popup code to show the acting player, when the error has one.
    pub fn client_code(&self) -> Option<LootErrorCode> {
        match self {
            Self::Refused { code, .. } => Some(*code),
            Self::NotPermitted { .. } => Some(LootErrorCode::DidntKill),
            _ => None,
        }
    }
}
