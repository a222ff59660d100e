//! Object identifiers.

use std::fmt;

/// Kind of world object a guid points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HighGuid {
    Player,
    Unit,
    GameObject,
    Corpse,
    Item,
    Mail,
}

impl HighGuid {
    fn name(self) -> &'static str {
        match self {
            Self::Player => "Player",
            Self::Unit => "Creature",
            Self::GameObject => "GameObject",
            Self::Corpse => "Corpse",
            Self::Item => "Item",
            Self::Mail => "Mail",
        }
    }
}

/// A typed object id. Ordering is by kind, then counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectGuid {
    high: HighGuid,
    counter: u32,
}

impl ObjectGuid {
    pub const fn new(high: HighGuid, counter: u32) -> Self {
        Self { high, counter }
    }

    pub const fn player(counter: u32) -> Self {
        Self::new(HighGuid::Player, counter)
    }

    pub const fn unit(counter: u32) -> Self {
        Self::new(HighGuid::Unit, counter)
    }

    pub const fn game_object(counter: u32) -> Self {
        Self::new(HighGuid::GameObject, counter)
    }

    pub const fn corpse(counter: u32) -> Self {
        Self::new(HighGuid::Corpse, counter)
    }

    pub const fn item(counter: u32) -> Self {
        Self::new(HighGuid::Item, counter)
    }

    pub const fn mail(counter: u32) -> Self {
        Self::new(HighGuid::Mail, counter)
    }

    pub fn high(&self) -> HighGuid {
        self.high
    }

    pub fn counter(&self) -> u32 {
        self.counter
    }

    pub fn is_player(&self) -> bool {
        self.high == HighGuid::Player
    }

    /// Parse `kind:counter` (e.g. `player:3`, `unit:12`) as typed on the console.
    pub fn parse(text: &str) -> Option<Self> {
        let (kind, counter) = text.split_once(':')?;
        let counter = counter.parse().ok()?;
        let high = match kind.to_ascii_lowercase().as_str() {
            "player" | "p" => HighGuid::Player,
            "unit" | "creature" | "u" => HighGuid::Unit,
            "go" | "gameobject" => HighGuid::GameObject,
            "corpse" => HighGuid::Corpse,
            "item" => HighGuid::Item,
            "mail" => HighGuid::Mail,
            _ => return None,
        };
        Some(Self::new(high, counter))
    }
}

impl Default for ObjectGuid {
    /// The empty guid.
    fn default() -> Self {
        Self::new(HighGuid::Unit, 0)
    }
}

impl fmt::Display for ObjectGuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.high.name(), self.counter)
    }
}
