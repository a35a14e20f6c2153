//! Attack slot allocation.
//!
//! Melee agents closing on a unit each claim one of a fixed ring of points
//! around it so they surround the target instead of stacking. Ranged agents
//! and anything attacking a stronghold get a computed stand-off point and
//! never hold a slot.
//!
//! Ring offsets are stored relative to the target; world positions are
//! recomputed from the target's current position on every read.

use std::collections::HashMap;

use glam::DVec3;
use hecs::{Entity, World};

use warfront_core::config::SlotConfig;
use warfront_core::enums::{SlotStatus, UnitType};
use warfront_core::types::Position;
use warfront_scoring::ring::{ranged_standoff, ring_offsets, stronghold_standoff};
use warfront_scoring::score::stronghold_distance;

use crate::maintenance::StrongholdCache;
use crate::spatial::WorldView;
use crate::target::{
    hostile_strongholds, hostile_units_in_range, is_live_agent, resolve_agent,
    resolve_live_target, resolve_target, AgentView, TargetRef, TargetView,
};

/// One position in a target's ring.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttackSlot {
    /// Offset from the target's position.
    pub offset: DVec3,
    pub occupant: Option<Entity>,
    pub status: SlotStatus,
}

impl AttackSlot {
    fn free(offset: DVec3) -> Self {
        Self {
            offset,
            occupant: None,
            status: SlotStatus::Free,
        }
    }

    pub fn world_position(&self, target: Position) -> Position {
        target.offset_by(self.offset)
    }

    fn is_held_by(&self, agent: Entity) -> bool {
        self.status != SlotStatus::Free && self.occupant == Some(agent)
    }

    /// Free, or held by an agent that has since died.
    fn is_available(&self, world: &World) -> bool {
        match (self.status, self.occupant) {
            (SlotStatus::Free, _) | (_, None) => true,
            (_, Some(agent)) => !is_live_agent(world, agent),
        }
    }

    fn clear(&mut self) {
        self.occupant = None;
        self.status = SlotStatus::Free;
    }
}

/// Slot ring for a single unit target.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetCombatInfo {
    slots: Vec<AttackSlot>,
}

impl TargetCombatInfo {
    pub fn new(slot_count: usize, radius: f64) -> Self {
        Self {
            slots: ring_offsets(slot_count, radius)
                .into_iter()
                .map(AttackSlot::free)
                .collect(),
        }
    }

    pub fn slots(&self) -> &[AttackSlot] {
        &self.slots
    }

    pub fn available_count(&self, world: &World) -> usize {
        self.slots.iter().filter(|s| s.is_available(world)).count()
    }

    /// Slots held (reserved or occupied) by living agents.
    pub fn held_count(&self, world: &World) -> usize {
        self.slots.len() - self.available_count(world)
    }

    fn slot_of(&self, agent: Entity) -> Option<usize> {
        self.slots.iter().position(|s| s.is_held_by(agent))
    }

    /// Free every slot whose occupant has died. Returns how many.
    fn reclaim_dead(&mut self, world: &World) -> usize {
        let mut reclaimed = 0;
        for slot in &mut self.slots {
            if slot.status != SlotStatus::Free && slot.is_available(world) {
                slot.clear();
                reclaimed += 1;
            }
        }
        reclaimed
    }
}

/// Read-only view of one slot, positioned in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlotView {
    pub index: usize,
    pub status: SlotStatus,
    pub occupant: Option<Entity>,
    pub position: Position,
}

/// Result of a successful reservation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reservation {
    pub position: Position,
    /// Ring index, or `None` for a computed stand-off point.
    pub slot: Option<usize>,
    /// False when the agent already held this slot.
    pub newly_reserved: bool,
}

/// Counts from a slot sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SlotSweep {
    pub rings_pruned: usize,
    pub slots_reclaimed: usize,
}

/// Owns the slot rings of every unit target that has been engaged.
#[derive(Debug)]
pub struct SlotAllocator {
    config: SlotConfig,
    reachability_limit: usize,
    rings: HashMap<Entity, TargetCombatInfo>,
}

impl SlotAllocator {
    pub fn new(config: SlotConfig, reachability_limit: usize) -> Self {
        Self {
            config,
            reachability_limit,
            rings: HashMap::new(),
        }
    }

    pub fn config(&self) -> &SlotConfig {
        &self.config
    }

    /// Whether `agent` must hold a ring slot to attack. Unknown entities don't.
    pub fn requires_slot(&self, world: &World, agent: Entity) -> bool {
        world
            .get::<&UnitType>(agent)
            .is_ok_and(|t| self.config.requires_slot(*t))
    }

    /// Nearest hostile that `querier` could actually engage: slot-requiring
    /// agents skip targets whose ring is full, and among the closest few
    /// candidates the first with a navigable path wins. Falls back to cached
    /// strongholds, which skip the path check.
    pub fn find_best_target_with_slot(
        &self,
        view: &WorldView<'_>,
        strongholds: &StrongholdCache,
        querier: Entity,
    ) -> Option<TargetRef> {
        let agent = resolve_agent(view.world, querier)?;
        let needs_slot = self.config.requires_slot(agent.unit_type);

        let mut candidates: Vec<(TargetView, f64)> =
            hostile_units_in_range(view, &agent, agent.detection_range, None)
                .into_iter()
                .filter(|t| !needs_slot || self.has_available_slot(view.world, t.target))
                .map(|t| (t, agent.position.range_to(&t.position)))
                .collect();

        if candidates.is_empty() {
            candidates = hostile_strongholds(view.world, strongholds, &agent, None)
                .into_iter()
                .map(|t| {
                    let d = agent.position.range_to(&t.position);
                    (t, stronghold_distance(d, t.bounding_radius))
                })
                .collect();
        }
        candidates.sort_by(|a, b| a.1.total_cmp(&b.1));

        for (candidate, _) in candidates.iter().take(self.reachability_limit) {
            if candidate.target.is_stronghold() {
                return Some(candidate.target);
            }
            if view.navigation.test_path(agent.position, candidate.position) {
                return Some(candidate.target);
            }
            tracing::debug!(agent = ?querier, target_id = ?candidate.target, "no path to candidate");
        }

        if !candidates.is_empty() {
            tracing::warn!(
                agent = ?querier,
                checked = candidates.len().min(self.reachability_limit),
                "no reachable target among nearest candidates"
            );
        }
        None
    }

    /// Reserve a position from which `agent` can attack `target`.
    ///
    /// Ranged agents and stronghold targets get a stand-off point and hold no
    /// slot. Melee agents keep any slot they already hold on this target;
    /// otherwise they get the nearest free, navigable slot. `None` when the
    /// agent or target is gone, or every slot is taken or unreachable.
    pub fn try_reserve(
        &mut self,
        view: &WorldView<'_>,
        agent: Entity,
        target: TargetRef,
    ) -> Option<Reservation> {
        let world = view.world;
        let agent_view = resolve_agent(world, agent)?;
        let target_view = resolve_live_target(world, target)?;

        if let Some(position) = self.standoff_for(&agent_view, &target_view) {
            return Some(Reservation {
                position,
                slot: None,
                newly_reserved: false,
            });
        }

        let target_entity = target.entity();
        let config = &self.config;
        let ring = self.rings.entry(target_entity).or_insert_with(|| {
            tracing::debug!(target_id = ?target_entity, slots = config.slot_count, "slot ring created");
            TargetCombatInfo::new(config.slot_count, config.slot_radius)
        });
        ring.reclaim_dead(world);

        if let Some(index) = ring.slot_of(agent) {
            return Some(Reservation {
                position: ring.slots[index].world_position(target_view.position),
                slot: Some(index),
                newly_reserved: false,
            });
        }

        let tolerance = self.config.navigability_tolerance;
        let mut best: Option<(usize, Position, f64)> = None;
        for (index, slot) in ring.slots.iter().enumerate() {
            if slot.status != SlotStatus::Free {
                continue;
            }
            let position = slot.world_position(target_view.position);
            if view.navigation.project_point(position, tolerance).is_none() {
                continue;
            }
            let dist_sq = agent_view.position.range_sq_to(&position);
            if best.map_or(true, |(_, _, d)| dist_sq < d) {
                best = Some((index, position, dist_sq));
            }
        }

        let Some((index, position, _)) = best else {
            tracing::debug!(?agent, target_id = ?target_entity, "no free navigable slot");
            return None;
        };
        let slot = &mut ring.slots[index];
        slot.occupant = Some(agent);
        slot.status = SlotStatus::Reserved;
        tracing::debug!(?agent, target_id = ?target_entity, slot = index, "slot reserved");
        Some(Reservation {
            position,
            slot: Some(index),
            newly_reserved: true,
        })
    }

    /// Promote the agent's reserved slot on `target` to occupied. Returns the
    /// slot index if a transition happened.
    ///
    /// If the agent or the target has died, the slot is freed instead.
    pub fn mark_occupied(&mut self, world: &World, agent: Entity, target: TargetRef) -> Option<usize> {
        let TargetRef::Unit(target_entity) = target else {
            return None;
        };
        if !self.requires_slot(world, agent) {
            return None;
        }
        let ring = self.rings.get_mut(&target_entity)?;
        let index = ring.slot_of(agent)?;
        let slot = &mut ring.slots[index];
        if !is_live_agent(world, agent) || resolve_live_target(world, target).is_none() {
            slot.clear();
            return None;
        }
        if slot.status != SlotStatus::Reserved {
            return None;
        }
        slot.status = SlotStatus::Occupied;
        Some(index)
    }

    /// Free the agent's slot on `target`. Returns the freed index, `None` if
    /// there was nothing to release.
    pub fn release(&mut self, world: &World, agent: Entity, target: TargetRef) -> Option<usize> {
        let TargetRef::Unit(target_entity) = target else {
            return None;
        };
        if self.is_known_slotless(world, agent) {
            return None;
        }
        let ring = self.rings.get_mut(&target_entity)?;
        let index = ring.slot_of(agent)?;
        ring.slots[index].clear();
        tracing::debug!(?agent, target_id = ?target_entity, slot = index, "slot released");
        Some(index)
    }

    /// Free every slot the agent holds on any target. Returns the
    /// (target, slot) pairs released.
    pub fn release_all(&mut self, world: &World, agent: Entity) -> Vec<(Entity, usize)> {
        if self.is_known_slotless(world, agent) {
            return Vec::new();
        }
        let mut released = Vec::new();
        for (&target, ring) in self.rings.iter_mut() {
            for (index, slot) in ring.slots.iter_mut().enumerate() {
                if slot.is_held_by(agent) {
                    slot.clear();
                    released.push((target, index));
                }
            }
        }
        released.sort_by_key(|(target, index)| (target.to_bits(), *index));
        released
    }

    /// Strongholds and never-engaged targets always have room.
    pub fn has_available_slot(&self, world: &World, target: TargetRef) -> bool {
        match target {
            TargetRef::Stronghold(_) => true,
            TargetRef::Unit(entity) => self
                .rings
                .get(&entity)
                .map_or(true, |ring| ring.available_count(world) > 0),
        }
    }

    pub fn occupied_slot_count(&self, world: &World, target: TargetRef) -> usize {
        match target {
            TargetRef::Stronghold(_) => 0,
            TargetRef::Unit(entity) => self.rings.get(&entity).map_or(0, |r| r.held_count(world)),
        }
    }

    /// Where `agent` should stand to attack `target`, without reserving.
    /// For slot holders this is the held slot's current world position.
    pub fn reserved_slot_position(
        &self,
        world: &World,
        agent: Entity,
        target: TargetRef,
    ) -> Option<Position> {
        let agent_view = resolve_agent(world, agent)?;
        let target_view = resolve_target(world, target)?;
        if let Some(position) = self.standoff_for(&agent_view, &target_view) {
            return Some(position);
        }
        let ring = self.rings.get(&target.entity())?;
        let index = ring.slot_of(agent)?;
        Some(ring.slots[index].world_position(target_view.position))
    }

    /// The target's ring in world space, if it has one.
    pub fn slot_ring(&self, world: &World, target: TargetRef) -> Option<Vec<SlotView>> {
        let TargetRef::Unit(entity) = target else {
            return None;
        };
        let ring = self.rings.get(&entity)?;
        let center = resolve_target(world, target)?.position;
        Some(
            ring.slots
                .iter()
                .enumerate()
                .map(|(index, slot)| SlotView {
                    index,
                    status: slot.status,
                    occupant: slot.occupant,
                    position: slot.world_position(center),
                })
                .collect(),
        )
    }

    pub fn rings(&self) -> impl Iterator<Item = (Entity, &TargetCombatInfo)> {
        self.rings.iter().map(|(e, r)| (*e, r))
    }

    pub fn clear(&mut self) {
        self.rings.clear();
    }

    /// Drop rings of dead or despawned targets and free slots held by dead agents.
    pub fn sweep(&mut self, world: &World) -> SlotSweep {
        let mut report = SlotSweep::default();
        self.rings.retain(|&target, ring| {
            if resolve_live_target(world, TargetRef::Unit(target)).is_none() {
                report.rings_pruned += 1;
                return false;
            }
            report.slots_reclaimed += ring.reclaim_dead(world);
            true
        });
        if report != SlotSweep::default() {
            tracing::debug!(?report, "slot sweep");
        }
        report
    }

    /// Stand-off point for attacks that don't use the ring.
    fn standoff_for(&self, agent: &AgentView, target: &TargetView) -> Option<Position> {
        if !self.config.requires_slot(agent.unit_type) {
            return Some(ranged_standoff(
                target.position,
                agent.position,
                agent.attack_range,
                self.config.ranged_standoff_factor,
            ));
        }
        if target.target.is_stronghold() {
            return Some(stronghold_standoff(
                target.position,
                agent.position,
                target.bounding_radius,
                agent.attack_range,
                self.config.stronghold_standoff_factor,
            ));
        }
        None
    }

    /// A live agent whose type never takes slots. Dead or despawned agents
    /// are not known to be slotless, so their stale slots can still be freed.
    fn is_known_slotless(&self, world: &World, agent: Entity) -> bool {
        world
            .get::<&UnitType>(agent)
            .is_ok_and(|t| !self.config.requires_slot(*t))
    }
}
