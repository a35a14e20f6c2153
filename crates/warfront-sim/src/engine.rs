//! Combat engine: the public face of the targeting core.
//!
//! `CombatEngine` owns the hecs world, the host-provided spatial and
//! navigation queries, and every piece of combat bookkeeping. All operations
//! run synchronously on the caller's thread; a reservation made for one agent
//! is visible to the next query. No operation returns an error: failures are
//! `None`/`false`/zero.

use std::collections::HashSet;

use hecs::{Entity, World};

use warfront_core::config::EngineConfig;
use warfront_core::enums::{Faction, UnitType};
use warfront_core::error::ConfigError;
use warfront_core::types::{Position, SimTime};

use crate::events::CombatEvent;
use crate::maintenance::{Maintenance, MaintenanceReport};
use crate::registry::AttackerRegistry;
use crate::slots::{SlotAllocator, SlotView};
use crate::snapshot::{self, CombatSnapshot};
use crate::spatial::{NavigationQuery, OpenField, SpatialQuery, WorldScan, WorldView};
use crate::target::{entity_id, TargetRef};
use crate::targeting::{TargetSearch, TargetingService};
use crate::world_setup;

pub struct CombatEngine {
    world: World,
    spatial: Box<dyn SpatialQuery>,
    navigation: Box<dyn NavigationQuery>,
    config: EngineConfig,
    time: SimTime,
    registry: AttackerRegistry,
    targeting: TargetingService,
    slots: SlotAllocator,
    maintenance: Maintenance,
    events: Vec<CombatEvent>,
}

impl Default for CombatEngine {
    fn default() -> Self {
        Self::build(EngineConfig::default())
    }
}

impl CombatEngine {
    /// Create an engine with a validated configuration, an empty world,
    /// brute-force spatial queries and open-field navigation.
    pub fn try_new(config: EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(config))
    }

    /// Parse, validate and apply a JSON configuration.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(Self::build(EngineConfig::from_json(json)?))
    }

    fn build(config: EngineConfig) -> Self {
        Self {
            world: World::new(),
            spatial: Box::new(WorldScan),
            navigation: Box::new(OpenField),
            time: SimTime::default(),
            registry: AttackerRegistry::new(),
            targeting: TargetingService::new(config.targeting.clone()),
            slots: SlotAllocator::new(config.slots.clone(), config.targeting.reachability_check_limit),
            maintenance: Maintenance::new(&config.maintenance),
            events: Vec::new(),
            config,
        }
    }

    pub fn with_spatial(mut self, spatial: impl SpatialQuery + 'static) -> Self {
        self.spatial = Box::new(spatial);
        self
    }

    pub fn with_navigation(mut self, navigation: impl NavigationQuery + 'static) -> Self {
        self.navigation = Box::new(navigation);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn time(&self) -> SimTime {
        self.time
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    /// Mutable world access for the host simulation (movement, damage).
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    fn view(&self) -> WorldView<'_> {
        WorldView {
            world: &self.world,
            spatial: self.spatial.as_ref(),
            navigation: self.navigation.as_ref(),
        }
    }

    // --- World helpers ---

    pub fn spawn_unit(&mut self, faction: Faction, unit_type: UnitType, position: Position) -> Entity {
        world_setup::spawn_unit(&mut self.world, faction, unit_type, position)
    }

    /// Spawn a stronghold and make it visible to target selection immediately.
    pub fn spawn_stronghold(&mut self, faction: Faction, position: Position, bounding_radius: f64) -> Entity {
        let entity = world_setup::spawn_stronghold(&mut self.world, faction, position, bounding_radius);
        self.maintenance.strongholds_mut().insert(entity);
        entity
    }

    /// Mark an entity dead. Its slots and registrations are cleaned up lazily.
    pub fn kill(&mut self, entity: Entity) -> bool {
        world_setup::kill(&mut self.world, entity)
    }

    pub fn despawn(&mut self, entity: Entity) -> bool {
        self.world.despawn(entity).is_ok()
    }

    pub fn target_of(&self, entity: Entity) -> Option<TargetRef> {
        TargetRef::of(&self.world, entity)
    }

    // --- Scheduling ---

    /// Advance one tick and run whichever maintenance jobs are due.
    pub fn tick(&mut self) -> MaintenanceReport {
        self.time.advance();
        let report = self.maintenance.run_due(
            self.time.tick,
            &self.world,
            &mut self.registry,
            &mut self.slots,
        );
        self.record_maintenance(&report);
        report
    }

    /// Run every maintenance job now.
    pub fn run_maintenance(&mut self) -> MaintenanceReport {
        let report = self
            .maintenance
            .run_all(&self.world, &mut self.registry, &mut self.slots);
        self.record_maintenance(&report);
        report
    }

    fn record_maintenance(&mut self, report: &MaintenanceReport) {
        if report.registry_targets_removed > 0 || report.registry_attackers_removed > 0 {
            self.events.push(CombatEvent::RegistryPruned {
                targets: report.registry_targets_removed,
                attackers: report.registry_attackers_removed,
            });
        }
        if report.slot_rings_pruned > 0 {
            self.events.push(CombatEvent::CombatInfoPruned {
                count: report.slot_rings_pruned,
            });
        }
        if report.slots_reclaimed > 0 {
            self.events.push(CombatEvent::SlotsReclaimed {
                count: report.slots_reclaimed,
            });
        }
        if let Some(count) = report.strongholds_cached {
            self.events.push(CombatEvent::StrongholdsRefreshed { count });
        }

        let removed = report.registry_targets_removed
            + report.registry_attackers_removed
            + report.slot_rings_pruned
            + report.slots_reclaimed;
        if removed > 0 {
            tracing::info!(tick = self.time.tick, ?report, "maintenance removed stale entries");
        }
    }

    /// Take all events queued since the last drain.
    pub fn drain_events(&mut self) -> Vec<CombatEvent> {
        std::mem::take(&mut self.events)
    }

    // --- Targeting ---

    pub fn find_best_target(&self, querier: Entity, radius: f64) -> TargetSearch {
        self.targeting.find_best_target(
            &self.view(),
            &self.registry,
            self.maintenance.strongholds(),
            querier,
            radius,
        )
    }

    pub fn find_best_target_excluding(
        &self,
        querier: Entity,
        radius: f64,
        ignored: &HashSet<TargetRef>,
    ) -> TargetSearch {
        self.targeting.find_best_target_excluding(
            &self.view(),
            &self.registry,
            self.maintenance.strongholds(),
            querier,
            radius,
            ignored,
        )
    }

    pub fn find_best_target_with_slot(&self, querier: Entity) -> Option<TargetRef> {
        self.slots
            .find_best_target_with_slot(&self.view(), self.maintenance.strongholds(), querier)
    }

    pub fn register_attacker(&mut self, agent: Entity, target: TargetRef) -> bool {
        let added = self.registry.register(&self.world, agent, target);
        if added {
            self.events.push(CombatEvent::TargetAcquired {
                agent: entity_id(agent),
                target: entity_id(target.entity()),
                kind: target.kind(),
            });
        }
        added
    }

    pub fn unregister_attacker(&mut self, agent: Entity, target: TargetRef) -> bool {
        let removed = self.registry.unregister(agent, target);
        if removed {
            self.events.push(CombatEvent::TargetDropped {
                agent: entity_id(agent),
                target: entity_id(target.entity()),
            });
        }
        removed
    }

    pub fn attacker_count(&self, target: TargetRef) -> usize {
        self.registry.attacker_count(&self.world, target)
    }

    /// Whether `target` has reached the configured default attacker cap.
    pub fn is_target_full(&self, target: TargetRef) -> bool {
        self.is_target_full_at(target, self.config.targeting.default_max_attackers)
    }

    pub fn is_target_full_at(&self, target: TargetRef, max_attackers: usize) -> bool {
        self.registry.is_target_full(&self.world, target, max_attackers)
    }

    // --- Attack slots ---

    pub fn requires_slot(&self, agent: Entity) -> bool {
        self.slots.requires_slot(&self.world, agent)
    }

    /// Reserve an attack position. `None` means try another target.
    pub fn try_reserve_attack_slot(&mut self, agent: Entity, target: TargetRef) -> Option<Position> {
        let view = WorldView {
            world: &self.world,
            spatial: self.spatial.as_ref(),
            navigation: self.navigation.as_ref(),
        };
        let reservation = self.slots.try_reserve(&view, agent, target)?;
        if let (Some(slot), true) = (reservation.slot, reservation.newly_reserved) {
            self.events.push(CombatEvent::SlotReserved {
                agent: entity_id(agent),
                target: entity_id(target.entity()),
                slot,
                position: reservation.position,
            });
        }
        Some(reservation.position)
    }

    pub fn mark_slot_as_occupied(&mut self, agent: Entity, target: TargetRef) -> bool {
        let Some(slot) = self.slots.mark_occupied(&self.world, agent, target) else {
            return false;
        };
        self.events.push(CombatEvent::SlotOccupied {
            agent: entity_id(agent),
            target: entity_id(target.entity()),
            slot,
        });
        true
    }

    pub fn release_attack_slot(&mut self, agent: Entity, target: TargetRef) -> bool {
        let Some(slot) = self.slots.release(&self.world, agent, target) else {
            return false;
        };
        self.events.push(CombatEvent::SlotReleased {
            agent: entity_id(agent),
            target: entity_id(target.entity()),
            slot,
        });
        true
    }

    /// Release every slot `agent` holds. Returns how many were freed.
    pub fn release_all_slots(&mut self, agent: Entity) -> usize {
        let released = self.slots.release_all(&self.world, agent);
        for &(target, slot) in &released {
            self.events.push(CombatEvent::SlotReleased {
                agent: entity_id(agent),
                target: entity_id(target),
                slot,
            });
        }
        released.len()
    }

    pub fn has_available_slot(&self, target: TargetRef) -> bool {
        self.slots.has_available_slot(&self.world, target)
    }

    pub fn occupied_slot_count(&self, target: TargetRef) -> usize {
        self.slots.occupied_slot_count(&self.world, target)
    }

    pub fn reserved_slot_position(&self, agent: Entity, target: TargetRef) -> Option<Position> {
        self.slots.reserved_slot_position(&self.world, agent, target)
    }

    pub fn slot_ring(&self, target: TargetRef) -> Option<Vec<SlotView>> {
        self.slots.slot_ring(&self.world, target)
    }

    pub fn snapshot(&self) -> CombatSnapshot {
        snapshot::build_snapshot(
            &self.world,
            &self.time,
            &self.registry,
            &self.slots,
            self.maintenance.strongholds(),
        )
    }

    /// Drop all combat bookkeeping, keeping the world.
    pub fn reset_bookkeeping(&mut self) {
        self.registry.clear();
        self.slots.clear();
        self.maintenance.strongholds_mut().clear();
        self.events.clear();
    }
}
