//! Read-only snapshot of the combat bookkeeping, for debugging front-ends and
//! determinism checks. Entity ids are `Entity::to_bits`.

use hecs::World;
use serde::{Deserialize, Serialize};

use warfront_core::enums::{SlotStatus, TargetKind};
use warfront_core::types::{Position, SimTime};

use crate::maintenance::StrongholdCache;
use crate::registry::AttackerRegistry;
use crate::slots::SlotAllocator;
use crate::target::{entity_id, is_live_agent, TargetRef};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CombatSnapshot {
    pub time: SimTime,
    pub rings: Vec<RingView>,
    pub registry: Vec<RegistryView>,
    pub strongholds: Vec<u64>,
}

/// One target's slot ring in world space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RingView {
    pub target: u64,
    pub slots: Vec<SlotSnapshot>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SlotSnapshot {
    pub index: usize,
    pub status: SlotStatus,
    pub occupant: Option<u64>,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistryView {
    pub target: u64,
    pub kind: TargetKind,
    /// Recorded attackers, stale handles included.
    pub attackers: Vec<u64>,
    pub live_attackers: usize,
}

/// Build a snapshot. Rings and registry entries are ordered by target id.
pub fn build_snapshot(
    world: &World,
    time: &SimTime,
    registry: &AttackerRegistry,
    slots: &SlotAllocator,
    strongholds: &StrongholdCache,
) -> CombatSnapshot {
    CombatSnapshot {
        time: *time,
        rings: build_rings(world, slots),
        registry: build_registry(world, registry),
        strongholds: strongholds.entries().iter().map(|&e| entity_id(e)).collect(),
    }
}

/// Rings whose target has been despawned are omitted until the next sweep.
fn build_rings(world: &World, slots: &SlotAllocator) -> Vec<RingView> {
    let mut rings: Vec<RingView> = slots
        .rings()
        .filter_map(|(target, _)| {
            let ring = slots.slot_ring(world, TargetRef::Unit(target))?;
            Some(RingView {
                target: entity_id(target),
                slots: ring
                    .into_iter()
                    .map(|slot| SlotSnapshot {
                        index: slot.index,
                        status: slot.status,
                        occupant: slot.occupant.map(entity_id),
                        position: slot.position,
                    })
                    .collect(),
            })
        })
        .collect();
    rings.sort_by_key(|r| r.target);
    rings
}

fn build_registry(world: &World, registry: &AttackerRegistry) -> Vec<RegistryView> {
    let mut entries: Vec<RegistryView> = registry
        .iter()
        .map(|(target, attackers)| RegistryView {
            target: entity_id(target.entity()),
            kind: target.kind(),
            attackers: attackers.iter().map(|&a| entity_id(a)).collect(),
            live_attackers: attackers.iter().filter(|&&a| is_live_agent(world, a)).count(),
        })
        .collect();
    entries.sort_by_key(|e| (e.target, e.kind == TargetKind::Stronghold));
    entries
}
