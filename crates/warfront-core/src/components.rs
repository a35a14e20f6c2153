//! ECS components for hecs entities.
//!
//! Components are plain data structs with no methods.
//! Engine logic lives in services, not components.

use serde::{Deserialize, Serialize};

/// Liveness and targetability of a unit or stronghold.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vitals {
    /// False once the entity has died, even if it is not yet despawned.
    pub alive: bool,
    /// False while the entity cannot be selected as a target (e.g. stealthed, spawning).
    pub targetable: bool,
}

impl Default for Vitals {
    fn default() -> Self {
        Self {
            alive: true,
            targetable: true,
        }
    }
}

/// Engagement ranges of a combat-capable unit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CombatProfile {
    /// Distance at which the unit can strike.
    pub attack_range: f64,
    /// Distance within which the unit notices hostiles. Also the zero point of
    /// the distance score.
    pub detection_range: f64,
}

/// Marks an entity as a stationary, high-value stronghold.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Stronghold {
    /// Largest half-extent of the stronghold's footprint.
    pub bounding_radius: f64,
}

/// Marks an entity as a mobile combat unit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit;

// Position, Faction and UnitType are attached directly as components too
// (they're defined in types.rs and enums.rs).
