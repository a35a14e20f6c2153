//! Entity spawn factories for units and strongholds.

use hecs::{Entity, World};
use rand::Rng;
use rand_chacha::ChaCha8Rng;

use warfront_core::components::*;
use warfront_core::enums::{Faction, UnitType};
use warfront_core::types::Position;

/// Engagement ranges by unit type: (attack_range, detection_range).
pub fn default_profile(unit_type: UnitType) -> CombatProfile {
    let (attack_range, detection_range) = match unit_type {
        UnitType::Infantry => (150.0, 1500.0),
        UnitType::Cavalry => (180.0, 1800.0),
        UnitType::Archer => (800.0, 1500.0),
        UnitType::Crossbowman => (900.0, 1500.0),
        UnitType::SiegeTower => (200.0, 1200.0),
        UnitType::BallistaTower => (1200.0, 2000.0),
        UnitType::MechanicalBeast => (250.0, 1500.0),
    };
    CombatProfile {
        attack_range,
        detection_range,
    }
}

/// Spawn a living unit with its type's default ranges.
pub fn spawn_unit(world: &mut World, faction: Faction, unit_type: UnitType, position: Position) -> Entity {
    spawn_unit_with_profile(world, faction, unit_type, position, default_profile(unit_type))
}

pub fn spawn_unit_with_profile(
    world: &mut World,
    faction: Faction,
    unit_type: UnitType,
    position: Position,
    profile: CombatProfile,
) -> Entity {
    world.spawn((Unit, position, faction, unit_type, Vitals::default(), profile))
}

pub fn spawn_stronghold(
    world: &mut World,
    faction: Faction,
    position: Position,
    bounding_radius: f64,
) -> Entity {
    world.spawn((
        Stronghold { bounding_radius },
        position,
        faction,
        Vitals::default(),
    ))
}

/// Spawn `count` units scattered uniformly within `spread` of `center` on
/// the ground plane.
pub fn spawn_squad(
    world: &mut World,
    rng: &mut ChaCha8Rng,
    faction: Faction,
    unit_type: UnitType,
    count: usize,
    center: Position,
    spread: f64,
) -> Vec<Entity> {
    (0..count)
        .map(|_| {
            let angle = rng.gen_range(0.0..std::f64::consts::TAU);
            let dist = spread * rng.gen::<f64>().sqrt();
            let position = Position::new(
                center.x + dist * angle.cos(),
                center.y + dist * angle.sin(),
                center.z,
            );
            spawn_unit(world, faction, unit_type, position)
        })
        .collect()
}

/// Mark an entity dead without despawning it. Returns `false` if it has no vitals.
pub fn kill(world: &mut World, entity: Entity) -> bool {
    match world.get::<&mut Vitals>(entity) {
        Ok(mut vitals) => {
            vitals.alive = false;
            vitals.targetable = false;
            true
        }
        Err(_) => false,
    }
}

pub fn set_targetable(world: &mut World, entity: Entity, targetable: bool) -> bool {
    match world.get::<&mut Vitals>(entity) {
        Ok(mut vitals) => {
            vitals.targetable = targetable;
            true
        }
        Err(_) => false,
    }
}

/// Move an entity. Returns `false` if it has no position.
pub fn move_to(world: &mut World, entity: Entity, position: Position) -> bool {
    match world.get::<&mut Position>(entity) {
        Ok(mut pos) => {
            *pos = position;
            true
        }
        Err(_) => false,
    }
}
