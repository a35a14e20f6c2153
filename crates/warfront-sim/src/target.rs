//! Target and agent handles.
//!
//! Everything here holds `hecs::Entity` handles weakly: an entity may be
//! despawned or killed between any two calls, so every read goes back to the
//! world and treats a missing or dead entity as absent.

use std::collections::HashSet;

use hecs::{Entity, World};

use warfront_core::components::{CombatProfile, Stronghold, Unit, Vitals};
use warfront_core::enums::{Faction, TargetKind, UnitType};
use warfront_core::types::Position;

use crate::maintenance::StrongholdCache;
use crate::spatial::{OverlapFilter, WorldView};

/// A hostile entity something can attack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetRef {
    Unit(Entity),
    Stronghold(Entity),
}

impl TargetRef {
    pub fn entity(self) -> Entity {
        match self {
            TargetRef::Unit(e) | TargetRef::Stronghold(e) => e,
        }
    }

    pub fn kind(self) -> TargetKind {
        match self {
            TargetRef::Unit(_) => TargetKind::Unit,
            TargetRef::Stronghold(_) => TargetKind::Stronghold,
        }
    }

    pub fn is_stronghold(self) -> bool {
        matches!(self, TargetRef::Stronghold(_))
    }

    /// Classify an entity by its components. `None` if it is neither a unit
    /// nor a stronghold, or no longer exists.
    pub fn of(world: &World, entity: Entity) -> Option<TargetRef> {
        if world.get::<&Stronghold>(entity).is_ok() {
            Some(TargetRef::Stronghold(entity))
        } else if world.get::<&Unit>(entity).is_ok() {
            Some(TargetRef::Unit(entity))
        } else {
            None
        }
    }
}

/// Point-in-time read of a target's fields.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetView {
    pub target: TargetRef,
    pub position: Position,
    pub faction: Faction,
    pub alive: bool,
    pub targetable: bool,
    /// Footprint radius; zero for units.
    pub bounding_radius: f64,
}

/// Point-in-time read of a live agent's fields.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AgentView {
    pub entity: Entity,
    pub position: Position,
    pub faction: Faction,
    pub unit_type: UnitType,
    pub attack_range: f64,
    pub detection_range: f64,
}

fn component<T: hecs::Component + Copy>(world: &World, entity: Entity) -> Option<T> {
    world.get::<&T>(entity).ok().map(|c| *c)
}

/// Read a target back from the world. `None` if the handle is stale or the
/// entity does not match the variant.
pub fn resolve_target(world: &World, target: TargetRef) -> Option<TargetView> {
    let entity = target.entity();
    let bounding_radius = match target {
        TargetRef::Unit(_) => {
            component::<Unit>(world, entity)?;
            0.0
        }
        TargetRef::Stronghold(_) => component::<Stronghold>(world, entity)?.bounding_radius,
    };
    let vitals = component::<Vitals>(world, entity).unwrap_or(Vitals {
        alive: false,
        targetable: false,
    });
    Some(TargetView {
        target,
        position: component::<Position>(world, entity)?,
        faction: component::<Faction>(world, entity)?,
        alive: vitals.alive,
        targetable: vitals.targetable,
        bounding_radius,
    })
}

/// Like `resolve_target`, but only for targets that are still alive.
pub fn resolve_live_target(world: &World, target: TargetRef) -> Option<TargetView> {
    resolve_target(world, target).filter(|t| t.alive)
}

/// Read a live combat unit. Dead, despawned or incomplete entities yield `None`.
pub fn resolve_agent(world: &World, entity: Entity) -> Option<AgentView> {
    if !is_live_agent(world, entity) {
        return None;
    }
    let profile = component::<CombatProfile>(world, entity)?;
    Some(AgentView {
        entity,
        position: component::<Position>(world, entity)?,
        faction: component::<Faction>(world, entity)?,
        unit_type: component::<UnitType>(world, entity)?,
        attack_range: profile.attack_range,
        detection_range: profile.detection_range,
    })
}

/// Whether a stored agent handle still refers to a living unit.
pub fn is_live_agent(world: &World, entity: Entity) -> bool {
    world.get::<&Unit>(entity).is_ok()
        && component::<Vitals>(world, entity).is_some_and(|v| v.alive)
}

/// Alive, targetable units hostile to `agent` within `radius` of it.
///
/// `ignored` targets are skipped. Order follows the spatial query.
pub fn hostile_units_in_range(
    view: &WorldView<'_>,
    agent: &AgentView,
    radius: f64,
    ignored: Option<&HashSet<TargetRef>>,
) -> Vec<TargetView> {
    view.spatial
        .overlap_sphere(view.world, agent.position, radius, OverlapFilter::Units)
        .into_iter()
        .filter(|&entity| entity != agent.entity)
        .map(TargetRef::Unit)
        .filter(|target| ignored.map_or(true, |set| !set.contains(target)))
        .filter_map(|target| resolve_target(view.world, target))
        .filter(|t| t.alive && t.targetable && agent.faction.is_hostile_to(t.faction))
        .collect()
}

/// Cached strongholds that are alive, targetable and hostile to `agent`,
/// minus `ignored`.
pub fn hostile_strongholds(
    world: &World,
    strongholds: &StrongholdCache,
    agent: &AgentView,
    ignored: Option<&HashSet<TargetRef>>,
) -> Vec<TargetView> {
    strongholds
        .entries()
        .iter()
        .map(|&e| TargetRef::Stronghold(e))
        .filter(|target| ignored.map_or(true, |set| !set.contains(target)))
        .filter_map(|target| resolve_live_target(world, target))
        .filter(|t| t.targetable && agent.faction.is_hostile_to(t.faction))
        .collect()
}

/// Stable numeric id for an entity, for events and snapshots.
pub fn entity_id(entity: Entity) -> u64 {
    entity.to_bits().get()
}
