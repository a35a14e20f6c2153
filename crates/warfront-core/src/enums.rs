//! Enumeration types used throughout the engine.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// Allegiance of a unit or stronghold. Entities of different factions are hostile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Faction {
    #[default]
    Player,
    Enemy,
    Neutral,
}

impl Faction {
    pub fn is_hostile_to(self, other: Faction) -> bool {
        self != other
    }
}

/// Battlefield unit type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitType {
    #[default]
    Infantry,
    Cavalry,
    Archer,
    Crossbowman,
    SiegeTower,
    BallistaTower,
    MechanicalBeast,
}

impl UnitType {
    pub const ALL: [UnitType; 7] = [
        UnitType::Infantry,
        UnitType::Cavalry,
        UnitType::Archer,
        UnitType::Crossbowman,
        UnitType::SiegeTower,
        UnitType::BallistaTower,
        UnitType::MechanicalBeast,
    ];

    /// The capability flag for this unit type.
    pub fn class(self) -> UnitClass {
        match self {
            UnitType::Infantry => UnitClass::INFANTRY,
            UnitType::Cavalry => UnitClass::CAVALRY,
            UnitType::Archer => UnitClass::ARCHER,
            UnitType::Crossbowman => UnitClass::CROSSBOWMAN,
            UnitType::SiegeTower => UnitClass::SIEGE_TOWER,
            UnitType::BallistaTower => UnitClass::BALLISTA_TOWER,
            UnitType::MechanicalBeast => UnitClass::MECHANICAL_BEAST,
        }
    }
}

bitflags! {
    /// Set of unit types, used for classification tests such as
    /// "which types must hold an attack slot".
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct UnitClass: u8 {
        const INFANTRY         = 1 << 0;
        const CAVALRY          = 1 << 1;
        const ARCHER           = 1 << 2;
        const CROSSBOWMAN      = 1 << 3;
        const SIEGE_TOWER      = 1 << 4;
        const BALLISTA_TOWER   = 1 << 5;
        const MECHANICAL_BEAST = 1 << 6;

        const MELEE = Self::INFANTRY.bits() | Self::CAVALRY.bits() | Self::MECHANICAL_BEAST.bits();
        const RANGED = Self::ARCHER.bits() | Self::CROSSBOWMAN.bits() | Self::BALLISTA_TOWER.bits();
    }
}

/// Lifecycle of one attack slot.
///
/// `Free -> Reserved -> Occupied -> Free`, and `Reserved -> Free` on early release.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SlotStatus {
    #[default]
    Free,
    /// Claimed by an agent that is still moving toward it.
    Reserved,
    /// The agent has arrived and is fighting from this slot.
    Occupied,
}

/// Which kind of target a candidate refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetKind {
    Unit,
    Stronghold,
}
