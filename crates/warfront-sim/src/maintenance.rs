//! Periodic housekeeping: registry and slot sweeps, stronghold cache refresh.
//!
//! Timers count simulation ticks, so maintenance is deterministic for a given
//! tick sequence.

use hecs::{Entity, World};
use serde::{Deserialize, Serialize};

use warfront_core::components::{Stronghold, Vitals};
use warfront_core::config::MaintenanceConfig;
use warfront_core::constants::TICK_RATE;

use crate::registry::AttackerRegistry;
use crate::slots::SlotAllocator;

/// Fires once every `interval_ticks` ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntervalTimer {
    interval_ticks: u64,
    next_due: u64,
}

impl IntervalTimer {
    pub fn from_secs(secs: f64) -> Self {
        let interval_ticks = ((secs * TICK_RATE as f64).round() as u64).max(1);
        Self {
            interval_ticks,
            next_due: interval_ticks,
        }
    }

    pub fn interval_ticks(&self) -> u64 {
        self.interval_ticks
    }

    /// Returns `true` if the timer is due at `tick`, and rearms it.
    pub fn poll(&mut self, tick: u64) -> bool {
        if tick < self.next_due {
            return false;
        }
        self.next_due = tick + self.interval_ticks;
        true
    }
}

/// Live strongholds, cached so target selection does not rescan the world.
#[derive(Debug, Clone, Default)]
pub struct StrongholdCache {
    entries: Vec<Entity>,
}

impl StrongholdCache {
    /// Rebuild from the world. Returns the new size if the cached set changed.
    pub fn refresh(&mut self, world: &World) -> Option<usize> {
        let mut fresh = Vec::with_capacity(self.entries.len());
        for (entity, (_, vitals)) in world.query::<(&Stronghold, &Vitals)>().iter() {
            if vitals.alive {
                fresh.push(entity);
            }
        }
        let unchanged = fresh.len() == self.entries.len()
            && fresh.iter().all(|e| self.entries.contains(e));
        self.entries = fresh;
        (!unchanged).then_some(self.entries.len())
    }

    pub fn insert(&mut self, entity: Entity) {
        if !self.entries.contains(&entity) {
            self.entries.push(entity);
        }
    }

    pub fn entries(&self) -> &[Entity] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// What one maintenance pass did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaintenanceReport {
    pub registry_targets_removed: usize,
    pub registry_attackers_removed: usize,
    pub slot_rings_pruned: usize,
    pub slots_reclaimed: usize,
    /// Set when a refresh changed the stronghold cache.
    pub strongholds_cached: Option<usize>,
}

impl MaintenanceReport {
    /// True if the pass changed nothing.
    pub fn is_noop(&self) -> bool {
        self.registry_targets_removed == 0
            && self.registry_attackers_removed == 0
            && self.slot_rings_pruned == 0
            && self.slots_reclaimed == 0
            && self.strongholds_cached.is_none()
    }
}

/// Owns the maintenance timers and the stronghold cache.
#[derive(Debug, Clone)]
pub struct Maintenance {
    registry_timer: IntervalTimer,
    slot_timer: IntervalTimer,
    stronghold_timer: IntervalTimer,
    strongholds: StrongholdCache,
}

impl Maintenance {
    pub fn new(config: &MaintenanceConfig) -> Self {
        Self {
            registry_timer: IntervalTimer::from_secs(config.registry_sweep_secs),
            slot_timer: IntervalTimer::from_secs(config.slot_sweep_secs),
            stronghold_timer: IntervalTimer::from_secs(config.stronghold_refresh_secs),
            strongholds: StrongholdCache::default(),
        }
    }

    pub fn strongholds(&self) -> &StrongholdCache {
        &self.strongholds
    }

    pub fn strongholds_mut(&mut self) -> &mut StrongholdCache {
        &mut self.strongholds
    }

    /// Run whichever sweeps are due at `tick`.
    pub fn run_due(
        &mut self,
        tick: u64,
        world: &World,
        registry: &mut AttackerRegistry,
        slots: &mut SlotAllocator,
    ) -> MaintenanceReport {
        let mut report = MaintenanceReport::default();
        if self.registry_timer.poll(tick) {
            self.sweep_registry(world, registry, &mut report);
        }
        if self.slot_timer.poll(tick) {
            self.sweep_slots(world, slots, &mut report);
        }
        if self.stronghold_timer.poll(tick) {
            report.strongholds_cached = self.strongholds.refresh(world);
        }
        report
    }

    /// Run every sweep now, regardless of timers.
    pub fn run_all(
        &mut self,
        world: &World,
        registry: &mut AttackerRegistry,
        slots: &mut SlotAllocator,
    ) -> MaintenanceReport {
        let mut report = MaintenanceReport::default();
        self.sweep_registry(world, registry, &mut report);
        self.sweep_slots(world, slots, &mut report);
        report.strongholds_cached = self.strongholds.refresh(world);
        report
    }

    fn sweep_registry(
        &self,
        world: &World,
        registry: &mut AttackerRegistry,
        report: &mut MaintenanceReport,
    ) {
        let sweep = registry.sweep(world);
        report.registry_targets_removed = sweep.targets_removed;
        report.registry_attackers_removed = sweep.attackers_removed;
    }

    fn sweep_slots(&self, world: &World, slots: &mut SlotAllocator, report: &mut MaintenanceReport) {
        let sweep = slots.sweep(world);
        report.slot_rings_pruned = sweep.rings_pruned;
        report.slots_reclaimed = sweep.slots_reclaimed;
    }
}
