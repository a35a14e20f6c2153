//! Tests for target resolution, spatial seams, the attacker registry, target
//! selection, slot allocation and maintenance.

use std::collections::HashSet;

use hecs::World;

use warfront_core::config::EngineConfig;
use warfront_core::enums::{Faction, SlotStatus, UnitType};
use warfront_core::error::ConfigError;
use warfront_core::types::Position;

use crate::engine::CombatEngine;
use crate::events::CombatEvent;
use crate::maintenance::IntervalTimer;
use crate::spatial::{NavigationQuery, Obstacle, ObstacleField, OverlapFilter, SpatialQuery, WorldScan};
use crate::target::{entity_id, resolve_target, TargetRef};
use crate::world_setup;

fn at(x: f64, y: f64) -> Position {
    Position::new(x, y, 0.0)
}

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-6
}

fn approx_pos(a: Position, b: Position) -> bool {
    approx(a.x, b.x) && approx(a.y, b.y) && approx(a.z, b.z)
}

fn enemy_infantry(engine: &mut CombatEngine, x: f64, y: f64) -> TargetRef {
    TargetRef::Unit(engine.spawn_unit(Faction::Enemy, UnitType::Infantry, at(x, y)))
}

// ---- Handles ----

#[test]
fn test_target_ref_classification() {
    let mut world = World::new();
    let unit = world_setup::spawn_unit(&mut world, Faction::Enemy, UnitType::Archer, at(0.0, 0.0));
    let keep = world_setup::spawn_stronghold(&mut world, Faction::Enemy, at(500.0, 0.0), 200.0);

    assert_eq!(TargetRef::of(&world, unit), Some(TargetRef::Unit(unit)));
    assert_eq!(TargetRef::of(&world, keep), Some(TargetRef::Stronghold(keep)));

    world.despawn(unit).unwrap();
    assert_eq!(TargetRef::of(&world, unit), None);
}

#[test]
fn test_resolve_target_rejects_wrong_variant_and_stale_handle() {
    let mut world = World::new();
    let unit = world_setup::spawn_unit(&mut world, Faction::Enemy, UnitType::Infantry, at(0.0, 0.0));
    assert!(resolve_target(&world, TargetRef::Stronghold(unit)).is_none());

    let view = resolve_target(&world, TargetRef::Unit(unit)).unwrap();
    assert!(view.alive && view.targetable);
    assert_eq!(view.bounding_radius, 0.0);

    world.despawn(unit).unwrap();
    // A new entity may reuse the slot, but with a new generation.
    let _reuse = world_setup::spawn_unit(&mut world, Faction::Enemy, UnitType::Infantry, at(0.0, 0.0));
    assert!(resolve_target(&world, TargetRef::Unit(unit)).is_none());
}

// ---- Spatial seams ----

#[test]
fn test_world_scan_filters_by_kind_and_radius() {
    let mut world = World::new();
    let near_unit = world_setup::spawn_unit(&mut world, Faction::Enemy, UnitType::Infantry, at(100.0, 0.0));
    let far_unit = world_setup::spawn_unit(&mut world, Faction::Enemy, UnitType::Infantry, at(900.0, 0.0));
    let keep = world_setup::spawn_stronghold(&mut world, Faction::Enemy, at(0.0, 200.0), 100.0);

    let units = WorldScan.overlap_sphere(&world, at(0.0, 0.0), 500.0, OverlapFilter::Units);
    assert_eq!(units, vec![near_unit]);
    assert!(!units.contains(&far_unit));

    let keeps = WorldScan.overlap_sphere(&world, at(0.0, 0.0), 500.0, OverlapFilter::Strongholds);
    assert_eq!(keeps, vec![keep]);

    let any = WorldScan.overlap_sphere(&world, at(0.0, 0.0), 500.0, OverlapFilter::Any);
    assert_eq!(any.len(), 2);

    assert!(WorldScan
        .overlap_sphere(&world, at(0.0, 0.0), -1.0, OverlapFilter::Any)
        .is_empty());
}

#[test]
fn test_obstacle_field_paths() {
    let field = ObstacleField::new(vec![Obstacle::new(at(500.0, 0.0), 100.0)]);
    assert!(!field.test_path(at(0.0, 0.0), at(1000.0, 0.0)));
    assert!(field.test_path(at(0.0, 0.0), at(0.0, 1000.0)));
    // Passes 150 from the centre.
    assert!(field.test_path(at(0.0, 150.0), at(1000.0, 150.0)));
}

#[test]
fn test_obstacle_field_projection() {
    let field = ObstacleField::new(vec![Obstacle::new(at(500.0, 0.0), 100.0)]);

    // Open ground is returned as-is.
    let open = field.project_point(at(0.0, 0.0), 50.0).unwrap();
    assert!(approx_pos(open, at(0.0, 0.0)));

    // 20 inside the rim: pushed out to the edge.
    let near_edge = field.project_point(at(420.0, 0.0), 50.0).unwrap();
    assert!(near_edge.x < 400.0 && near_edge.x > 399.9);

    // Deep inside: not navigable.
    assert!(field.project_point(at(500.0, 0.0), 50.0).is_none());
}

#[test]
fn test_interval_timer() {
    let mut timer = IntervalTimer::from_secs(1.0);
    assert_eq!(timer.interval_ticks(), 30);
    assert!(!timer.poll(29));
    assert!(timer.poll(30));
    assert!(!timer.poll(31));
    assert!(timer.poll(60));

    // Never zero ticks.
    assert_eq!(IntervalTimer::from_secs(0.0).interval_ticks(), 1);
}

// ---- Attacker registry ----

#[test]
fn test_register_attacker_is_idempotent() {
    let mut engine = CombatEngine::default();
    let agent = engine.spawn_unit(Faction::Player, UnitType::Infantry, at(0.0, 0.0));
    let target = enemy_infantry(&mut engine, 300.0, 0.0);

    assert!(engine.register_attacker(agent, target));
    assert!(!engine.register_attacker(agent, target));
    assert_eq!(engine.attacker_count(target), 1);

    assert!(engine.unregister_attacker(agent, target));
    assert!(!engine.unregister_attacker(agent, target));
    assert_eq!(engine.attacker_count(target), 0);
    assert!(engine.snapshot().registry.is_empty());
}

#[test]
fn test_register_rejects_dead_participants() {
    let mut engine = CombatEngine::default();
    let agent = engine.spawn_unit(Faction::Player, UnitType::Infantry, at(0.0, 0.0));
    let target = enemy_infantry(&mut engine, 300.0, 0.0);

    engine.kill(target.entity());
    assert!(!engine.register_attacker(agent, target));

    let other = enemy_infantry(&mut engine, 400.0, 0.0);
    engine.kill(agent);
    assert!(!engine.register_attacker(agent, other));
}

#[test]
fn test_attacker_count_ignores_dead_attackers() {
    let mut engine = CombatEngine::default();
    let target = enemy_infantry(&mut engine, 0.0, 0.0);
    let agents: Vec<_> = (0..3)
        .map(|i| engine.spawn_unit(Faction::Player, UnitType::Infantry, at(-500.0, i as f64 * 10.0)))
        .collect();
    for &agent in &agents {
        engine.register_attacker(agent, target);
    }
    assert_eq!(engine.attacker_count(target), 3);

    engine.kill(agents[0]);
    engine.despawn(agents[1]);
    assert_eq!(engine.attacker_count(target), 1);
}

#[test]
fn test_is_target_full() {
    let mut engine = CombatEngine::default();
    let target = enemy_infantry(&mut engine, 0.0, 0.0);
    for i in 0..6 {
        let agent = engine.spawn_unit(Faction::Player, UnitType::Infantry, at(-500.0, i as f64));
        engine.register_attacker(agent, target);
        assert_eq!(engine.is_target_full_at(target, 2), i + 1 >= 2);
    }
    assert!(engine.is_target_full(target));
}

// ---- Target selection ----

#[test]
fn test_find_best_target_skips_invalid_candidates() {
    let mut engine = CombatEngine::default();
    let querier = engine.spawn_unit(Faction::Player, UnitType::Infantry, at(0.0, 0.0));
    let friend = engine.spawn_unit(Faction::Player, UnitType::Infantry, at(50.0, 0.0));
    let dead = enemy_infantry(&mut engine, 60.0, 0.0);
    let hidden = enemy_infantry(&mut engine, 70.0, 0.0);
    let valid = enemy_infantry(&mut engine, 400.0, 0.0);

    engine.kill(dead.entity());
    world_setup::set_targetable(engine.world_mut(), hidden.entity(), false);

    let search = engine.find_best_target(querier, 1000.0);
    assert_eq!(search.best, Some(valid));
    assert_eq!(search.candidates.len(), 1);
    assert!(search
        .candidates
        .iter()
        .all(|c| c.target.entity() != friend && c.target.entity() != querier));
}

#[test]
fn test_find_best_target_prefers_nearer_when_uncontested() {
    let mut engine = CombatEngine::default();
    let querier = engine.spawn_unit(Faction::Player, UnitType::Cavalry, at(0.0, 0.0));
    let far = enemy_infantry(&mut engine, 0.0, 600.0);
    let near = enemy_infantry(&mut engine, 200.0, 0.0);

    let search = engine.find_best_target(querier, 1000.0);
    assert_eq!(search.best, Some(near));
    assert_eq!(search.candidates[1].target, far);
    assert!(search.candidates[0].score > search.candidates[1].score);
}

#[test]
fn test_find_best_target_ties_keep_first_found() {
    let mut engine = CombatEngine::default();
    let querier = engine.spawn_unit(Faction::Player, UnitType::Infantry, at(0.0, 0.0));
    let first = enemy_infantry(&mut engine, 300.0, 0.0);
    let _second = enemy_infantry(&mut engine, -300.0, 0.0);

    let search = engine.find_best_target(querier, 1000.0);
    assert_eq!(search.best, Some(first));
}

#[test]
fn test_find_best_target_respects_ignore_list() {
    let mut engine = CombatEngine::default();
    let querier = engine.spawn_unit(Faction::Player, UnitType::Infantry, at(0.0, 0.0));
    let near = enemy_infantry(&mut engine, 100.0, 0.0);
    let far = enemy_infantry(&mut engine, 500.0, 0.0);

    let ignored: HashSet<TargetRef> = [near].into_iter().collect();
    let search = engine.find_best_target_excluding(querier, 1000.0, &ignored);
    assert_eq!(search.best, Some(far));
    assert!(search.candidates.iter().all(|c| c.target != near));
}

#[test]
fn test_find_best_target_dead_querier_finds_nothing() {
    let mut engine = CombatEngine::default();
    let querier = engine.spawn_unit(Faction::Player, UnitType::Infantry, at(0.0, 0.0));
    enemy_infantry(&mut engine, 100.0, 0.0);
    engine.kill(querier);

    let search = engine.find_best_target(querier, 1000.0);
    assert!(search.is_empty());
    assert!(search.candidates.is_empty());
}

#[test]
fn test_find_best_target_does_not_touch_registry() {
    let mut engine = CombatEngine::default();
    let querier = engine.spawn_unit(Faction::Player, UnitType::Infantry, at(0.0, 0.0));
    let target = enemy_infantry(&mut engine, 100.0, 0.0);

    engine.find_best_target(querier, 1000.0);
    assert_eq!(engine.attacker_count(target), 0);
    assert!(engine.drain_events().is_empty());
}

#[test]
fn test_stronghold_fallback_nearest_by_edge_distance() {
    let mut engine = CombatEngine::default();
    let querier = engine.spawn_unit(Faction::Player, UnitType::Infantry, at(0.0, 0.0));
    // Centre 1000 away but 600 wide: edge at 400.
    let big = engine.spawn_stronghold(Faction::Enemy, at(1000.0, 0.0), 600.0);
    // Centre 800 away, edge at 700.
    let small = engine.spawn_stronghold(Faction::Enemy, at(0.0, 800.0), 100.0);
    let _own = engine.spawn_stronghold(Faction::Player, at(10.0, 0.0), 100.0);

    let search = engine.find_best_target(querier, 300.0);
    assert_eq!(search.best, Some(TargetRef::Stronghold(big)));
    assert_eq!(search.candidates.len(), 2);
    assert_eq!(search.candidates[1].target, TargetRef::Stronghold(small));

    let best = search.candidates[0];
    assert!(best.is_stronghold && best.reachable);
    assert!(approx(best.distance, 400.0));
    // Infantry detection range is 1500: 100 · (1100/1500) · 0.8.
    assert!(approx(best.score, 100.0 * (1100.0 / 1500.0) * 0.8));
}

#[test]
fn test_units_take_priority_over_strongholds() {
    let mut engine = CombatEngine::default();
    let querier = engine.spawn_unit(Faction::Player, UnitType::Infantry, at(0.0, 0.0));
    engine.spawn_stronghold(Faction::Enemy, at(50.0, 0.0), 10.0);
    let unit = enemy_infantry(&mut engine, 900.0, 0.0);

    let search = engine.find_best_target(querier, 1000.0);
    assert_eq!(search.best, Some(unit));
    assert!(search.candidates.iter().all(|c| !c.is_stronghold));
}

#[test]
fn test_dead_stronghold_not_selected() {
    let mut engine = CombatEngine::default();
    let querier = engine.spawn_unit(Faction::Player, UnitType::Infantry, at(0.0, 0.0));
    let keep = engine.spawn_stronghold(Faction::Enemy, at(500.0, 0.0), 100.0);
    engine.kill(keep);

    assert!(engine.find_best_target(querier, 1000.0).is_empty());
    engine.run_maintenance();
    assert!(engine.snapshot().strongholds.is_empty());
}

#[test]
fn test_untargetable_stronghold_not_selected() {
    let mut engine = CombatEngine::default();
    let querier = engine.spawn_unit(Faction::Player, UnitType::Infantry, at(0.0, 0.0));
    let keep = engine.spawn_stronghold(Faction::Enemy, at(500.0, 0.0), 100.0);
    world_setup::set_targetable(engine.world_mut(), keep, false);

    assert_eq!(engine.find_best_target(querier, 1000.0).best, None);
    assert_eq!(engine.find_best_target_with_slot(querier), None);

    world_setup::set_targetable(engine.world_mut(), keep, true);
    assert_eq!(
        engine.find_best_target(querier, 1000.0).best,
        Some(TargetRef::Stronghold(keep))
    );
}

#[test]
fn test_externally_spawned_stronghold_found_after_refresh() {
    let mut engine = CombatEngine::default();
    let querier = engine.spawn_unit(Faction::Player, UnitType::Infantry, at(0.0, 0.0));
    let keep = world_setup::spawn_stronghold(engine.world_mut(), Faction::Enemy, at(500.0, 0.0), 100.0);

    assert!(engine.find_best_target(querier, 1000.0).is_empty());
    engine.run_maintenance();
    assert_eq!(
        engine.find_best_target(querier, 1000.0).best,
        Some(TargetRef::Stronghold(keep))
    );
}

// ---- Slot classification and stand-off points ----

#[test]
fn test_requires_slot_by_unit_type() {
    let mut engine = CombatEngine::default();
    let infantry = engine.spawn_unit(Faction::Player, UnitType::Infantry, at(0.0, 0.0));
    let beast = engine.spawn_unit(Faction::Player, UnitType::MechanicalBeast, at(0.0, 0.0));
    let archer = engine.spawn_unit(Faction::Player, UnitType::Archer, at(0.0, 0.0));
    let tower = engine.spawn_unit(Faction::Player, UnitType::SiegeTower, at(0.0, 0.0));

    assert!(engine.requires_slot(infantry));
    assert!(engine.requires_slot(beast));
    assert!(!engine.requires_slot(archer));
    assert!(!engine.requires_slot(tower));
}

#[test]
fn test_empty_slot_set_requires_slot_for_everyone() {
    let mut engine =
        CombatEngine::from_json(r#"{ "slots": { "slot_required": "" } }"#).unwrap();
    let archer = engine.spawn_unit(Faction::Player, UnitType::Archer, at(0.0, 0.0));
    assert!(engine.requires_slot(archer));
}

#[test]
fn test_ranged_reservation_is_standoff_point() {
    let mut engine = CombatEngine::default();
    let archer = engine.spawn_unit(Faction::Player, UnitType::Archer, at(1000.0, 0.0));
    let target = enemy_infantry(&mut engine, 0.0, 0.0);

    // Archer range 800: stands at 720 on its own side.
    let spot = engine.try_reserve_attack_slot(archer, target).unwrap();
    assert!(approx_pos(spot, at(720.0, 0.0)));
    assert_eq!(engine.occupied_slot_count(target), 0);
    assert!(engine.slot_ring(target).is_none());

    let looked_up = engine.reserved_slot_position(archer, target).unwrap();
    assert!(approx_pos(looked_up, spot));
}

#[test]
fn test_melee_stronghold_reservation() {
    let mut engine = CombatEngine::default();
    let agent = engine.spawn_unit(Faction::Player, UnitType::Infantry, at(1000.0, 0.0));
    let keep = TargetRef::Stronghold(engine.spawn_stronghold(Faction::Enemy, at(0.0, 0.0), 200.0));

    // 200 radius + 0.8 · 150 range.
    let spot = engine.try_reserve_attack_slot(agent, keep).unwrap();
    assert!(approx_pos(spot, at(320.0, 0.0)));
    assert!(engine.has_available_slot(keep));
    assert_eq!(engine.occupied_slot_count(keep), 0);
    assert!(!engine.mark_slot_as_occupied(agent, keep));
    assert!(!engine.release_attack_slot(agent, keep));
}

#[test]
fn test_ranged_agent_against_stronghold_uses_ranged_standoff() {
    let mut engine = CombatEngine::default();
    let archer = engine.spawn_unit(Faction::Player, UnitType::Archer, at(0.0, 2000.0));
    let keep = TargetRef::Stronghold(engine.spawn_stronghold(Faction::Enemy, at(0.0, 0.0), 200.0));

    let spot = engine.try_reserve_attack_slot(archer, keep).unwrap();
    assert!(approx_pos(spot, at(0.0, 720.0)));
}

// ---- Slot rings ----

#[test]
fn test_reserve_picks_nearest_slot() {
    let mut engine = CombatEngine::default();
    let target = enemy_infantry(&mut engine, 0.0, 0.0);
    let east = engine.spawn_unit(Faction::Player, UnitType::Infantry, at(1000.0, 0.0));
    let north = engine.spawn_unit(Faction::Player, UnitType::Infantry, at(0.0, 1000.0));

    let east_spot = engine.try_reserve_attack_slot(east, target).unwrap();
    assert!(approx_pos(east_spot, at(120.0, 0.0)));
    let north_spot = engine.try_reserve_attack_slot(north, target).unwrap();
    assert!(approx_pos(north_spot, at(0.0, 120.0)));

    let ring = engine.slot_ring(target).unwrap();
    assert_eq!(ring.len(), 8);
    assert_eq!(ring[0].occupant, Some(east));
    assert_eq!(ring[2].occupant, Some(north));
    assert_eq!(ring[0].status, SlotStatus::Reserved);
    assert_eq!(engine.occupied_slot_count(target), 2);
}

#[test]
fn test_reserve_is_idempotent() {
    let mut engine = CombatEngine::default();
    let target = enemy_infantry(&mut engine, 0.0, 0.0);
    let agent = engine.spawn_unit(Faction::Player, UnitType::Infantry, at(1000.0, 0.0));

    let first = engine.try_reserve_attack_slot(agent, target).unwrap();
    // Moving the agent does not move its claim.
    world_setup::move_to(engine.world_mut(), agent, at(0.0, -1000.0));
    let second = engine.try_reserve_attack_slot(agent, target).unwrap();
    assert!(approx_pos(first, second));
    assert_eq!(engine.occupied_slot_count(target), 1);
}

#[test]
fn test_unnavigable_slots_skipped() {
    // Covers slot 0 at (120, 0) more than the tolerance deep.
    let field = ObstacleField::new(vec![Obstacle::new(at(120.0, 0.0), 80.0)]);
    let mut engine = CombatEngine::default().with_navigation(field);
    let target = enemy_infantry(&mut engine, 0.0, 0.0);
    let agent = engine.spawn_unit(Faction::Player, UnitType::Infantry, at(1000.0, 50.0));

    // Next nearest is slot 1, at 45 degrees.
    let spot = engine.try_reserve_attack_slot(agent, target).unwrap();
    let diag = 120.0 * std::f64::consts::FRAC_1_SQRT_2;
    assert!(approx_pos(spot, at(diag, diag)));
    assert_eq!(engine.slot_ring(target).unwrap()[0].status, SlotStatus::Free);
}

#[test]
fn test_slot_positions_follow_moving_target() {
    let mut engine = CombatEngine::default();
    let target = enemy_infantry(&mut engine, 0.0, 0.0);
    let agent = engine.spawn_unit(Faction::Player, UnitType::Infantry, at(1000.0, 0.0));
    engine.try_reserve_attack_slot(agent, target).unwrap();

    world_setup::move_to(engine.world_mut(), target.entity(), at(500.0, 0.0));
    let moved = engine.reserved_slot_position(agent, target).unwrap();
    assert!(approx_pos(moved, at(620.0, 0.0)));
}

#[test]
fn test_reserve_against_dead_target_fails() {
    let mut engine = CombatEngine::default();
    let target = enemy_infantry(&mut engine, 0.0, 0.0);
    let agent = engine.spawn_unit(Faction::Player, UnitType::Infantry, at(1000.0, 0.0));
    engine.kill(target.entity());

    assert!(engine.try_reserve_attack_slot(agent, target).is_none());
}

#[test]
fn test_mark_occupied_transitions_once() {
    let mut engine = CombatEngine::default();
    let target = enemy_infantry(&mut engine, 0.0, 0.0);
    let agent = engine.spawn_unit(Faction::Player, UnitType::Infantry, at(1000.0, 0.0));

    assert!(!engine.mark_slot_as_occupied(agent, target));
    engine.try_reserve_attack_slot(agent, target).unwrap();
    assert!(engine.mark_slot_as_occupied(agent, target));
    assert!(!engine.mark_slot_as_occupied(agent, target));
    assert_eq!(engine.slot_ring(target).unwrap()[0].status, SlotStatus::Occupied);

    // Still idempotent once occupied.
    let spot = engine.try_reserve_attack_slot(agent, target).unwrap();
    assert!(approx_pos(spot, at(120.0, 0.0)));
}

#[test]
fn test_mark_against_dead_target_frees_slot() {
    let mut engine = CombatEngine::default();
    let target = enemy_infantry(&mut engine, 0.0, 0.0);
    let agent = engine.spawn_unit(Faction::Player, UnitType::Infantry, at(1000.0, 0.0));
    engine.try_reserve_attack_slot(agent, target).unwrap();
    engine.kill(target.entity());

    assert!(!engine.mark_slot_as_occupied(agent, target));
    assert_eq!(engine.slot_ring(target).unwrap()[0].status, SlotStatus::Free);
}

#[test]
fn test_mark_by_dead_agent_frees_slot() {
    let mut engine = CombatEngine::default();
    let target = enemy_infantry(&mut engine, 0.0, 0.0);
    let agent = engine.spawn_unit(Faction::Player, UnitType::Infantry, at(1000.0, 0.0));
    engine.try_reserve_attack_slot(agent, target).unwrap();
    engine.drain_events();
    engine.kill(agent);

    assert!(!engine.mark_slot_as_occupied(agent, target));
    let slot = engine.slot_ring(target).unwrap()[0];
    assert_eq!(slot.status, SlotStatus::Free);
    assert_eq!(slot.occupant, None);
    assert!(engine.drain_events().is_empty());
}

#[test]
fn test_ranged_agent_never_holds_slots() {
    let mut engine = CombatEngine::default();
    let target = enemy_infantry(&mut engine, 0.0, 0.0);
    let melee = engine.spawn_unit(Faction::Player, UnitType::Infantry, at(1000.0, 0.0));
    let archer = engine.spawn_unit(Faction::Player, UnitType::Crossbowman, at(1000.0, 0.0));

    engine.try_reserve_attack_slot(melee, target).unwrap();
    engine.try_reserve_attack_slot(archer, target).unwrap();
    assert!(!engine.mark_slot_as_occupied(archer, target));
    assert!(!engine.release_attack_slot(archer, target));
    assert_eq!(engine.release_all_slots(archer), 0);

    let ring = engine.slot_ring(target).unwrap();
    assert!(ring.iter().all(|s| s.occupant != Some(archer)));
    assert_eq!(engine.occupied_slot_count(target), 1);
}

#[test]
fn test_release_is_idempotent_and_frees_for_others() {
    let mut engine = CombatEngine::default();
    let target = enemy_infantry(&mut engine, 0.0, 0.0);
    let first = engine.spawn_unit(Faction::Player, UnitType::Infantry, at(1000.0, 0.0));
    let second = engine.spawn_unit(Faction::Player, UnitType::Infantry, at(1000.0, 0.0));

    let claimed = engine.try_reserve_attack_slot(first, target).unwrap();
    assert!(engine.release_attack_slot(first, target));
    assert!(!engine.release_attack_slot(first, target));
    assert!(engine.reserved_slot_position(first, target).is_none());

    let reused = engine.try_reserve_attack_slot(second, target).unwrap();
    assert!(approx_pos(claimed, reused));
}

#[test]
fn test_release_all_slots_across_targets() {
    let mut engine = CombatEngine::default();
    let a = enemy_infantry(&mut engine, 0.0, 0.0);
    let b = enemy_infantry(&mut engine, 2000.0, 0.0);
    let agent = engine.spawn_unit(Faction::Player, UnitType::Cavalry, at(1000.0, 0.0));

    engine.try_reserve_attack_slot(agent, a).unwrap();
    engine.try_reserve_attack_slot(agent, b).unwrap();
    engine.mark_slot_as_occupied(agent, b);

    assert_eq!(engine.release_all_slots(agent), 2);
    assert_eq!(engine.release_all_slots(agent), 0);
    assert_eq!(engine.occupied_slot_count(a), 0);
    assert_eq!(engine.occupied_slot_count(b), 0);
}

#[test]
fn test_dead_occupant_counts_as_free_before_sweep() {
    let mut engine = CombatEngine::default();
    let target = enemy_infantry(&mut engine, 0.0, 0.0);
    let agent = engine.spawn_unit(Faction::Player, UnitType::Infantry, at(1000.0, 0.0));
    engine.try_reserve_attack_slot(agent, target).unwrap();
    engine.mark_slot_as_occupied(agent, target);

    engine.kill(agent);
    assert_eq!(engine.occupied_slot_count(target), 0);
    assert!(engine.has_available_slot(target));
    // Raw ring state is healed by the next sweep.
    assert_eq!(engine.slot_ring(target).unwrap()[0].status, SlotStatus::Occupied);

    let report = engine.run_maintenance();
    assert_eq!(report.slots_reclaimed, 1);
    assert_eq!(engine.slot_ring(target).unwrap()[0].status, SlotStatus::Free);
}

#[test]
fn test_custom_slot_count() {
    let mut engine =
        CombatEngine::from_json(r#"{ "slots": { "slot_count": 4, "slot_radius": 50.0 } }"#).unwrap();
    let target = enemy_infantry(&mut engine, 0.0, 0.0);
    let agent = engine.spawn_unit(Faction::Player, UnitType::Infantry, at(0.0, 1000.0));

    let spot = engine.try_reserve_attack_slot(agent, target).unwrap();
    assert!(approx_pos(spot, at(0.0, 50.0)));
    assert_eq!(engine.slot_ring(target).unwrap().len(), 4);
}

// ---- Slot-aware target selection ----

#[test]
fn test_with_slot_skips_full_rings_for_melee_only() {
    let mut engine =
        CombatEngine::from_json(r#"{ "slots": { "slot_count": 2 } }"#).unwrap();
    let full = enemy_infantry(&mut engine, 100.0, 0.0);
    let open = enemy_infantry(&mut engine, 400.0, 0.0);
    for i in 0..2 {
        let holder = engine.spawn_unit(Faction::Player, UnitType::Infantry, at(-3000.0, i as f64));
        engine.try_reserve_attack_slot(holder, full).unwrap();
    }
    assert!(!engine.has_available_slot(full));

    let melee = engine.spawn_unit(Faction::Player, UnitType::Infantry, at(0.0, 0.0));
    let archer = engine.spawn_unit(Faction::Player, UnitType::Archer, at(0.0, 0.0));
    assert_eq!(engine.find_best_target_with_slot(melee), Some(open));
    assert_eq!(engine.find_best_target_with_slot(archer), Some(full));
}

#[test]
fn test_with_slot_skips_unreachable_candidates() {
    let field = ObstacleField::new(vec![Obstacle::new(at(150.0, 0.0), 40.0)]);
    let mut engine = CombatEngine::default().with_navigation(field);
    let querier = engine.spawn_unit(Faction::Player, UnitType::Infantry, at(0.0, 0.0));
    let _walled = enemy_infantry(&mut engine, 300.0, 0.0);
    let open = enemy_infantry(&mut engine, 0.0, 500.0);

    assert_eq!(engine.find_best_target_with_slot(querier), Some(open));
}

#[test]
fn test_with_slot_checks_at_most_five_candidates() {
    let field = ObstacleField::new(vec![Obstacle::new(at(120.0, 0.0), 40.0)]);
    let mut engine = CombatEngine::default().with_navigation(field);
    let querier = engine.spawn_unit(Faction::Player, UnitType::Infantry, at(0.0, 0.0));
    for i in 0..5 {
        enemy_infantry(&mut engine, 200.0 + 100.0 * i as f64, 0.0);
    }
    // Reachable, but sixth nearest.
    let sixth = enemy_infantry(&mut engine, 0.0, 700.0);

    assert_eq!(engine.find_best_target_with_slot(querier), None);

    // Take one blocked candidate away and the reachable one is checked.
    let blocked = engine.find_best_target(querier, 1500.0).best.unwrap();
    engine.kill(blocked.entity());
    assert_eq!(engine.find_best_target_with_slot(querier), Some(sixth));
}

#[test]
fn test_with_slot_falls_back_to_stronghold_without_path_check() {
    let field = ObstacleField::new(vec![Obstacle::new(at(500.0, 0.0), 100.0)]);
    let mut engine = CombatEngine::default().with_navigation(field);
    let querier = engine.spawn_unit(Faction::Player, UnitType::Infantry, at(0.0, 0.0));
    let keep = engine.spawn_stronghold(Faction::Enemy, at(3000.0, 0.0), 300.0);

    assert_eq!(
        engine.find_best_target_with_slot(querier),
        Some(TargetRef::Stronghold(keep))
    );
}

// ---- Maintenance and events ----

#[test]
fn test_tick_runs_slot_sweep_on_schedule() {
    let mut engine = CombatEngine::default();
    let target = enemy_infantry(&mut engine, 0.0, 0.0);
    let agent = engine.spawn_unit(Faction::Player, UnitType::Infantry, at(1000.0, 0.0));
    engine.try_reserve_attack_slot(agent, target).unwrap();
    engine.kill(agent);

    for _ in 0..89 {
        assert!(engine.tick().is_noop());
    }
    // 3 s at 30 Hz.
    let report = engine.tick();
    assert_eq!(engine.time().tick, 90);
    assert_eq!(report.slots_reclaimed, 1);
    assert_eq!(report.strongholds_cached, None);
}

#[test]
fn test_sweep_prunes_rings_of_dead_targets() {
    let mut engine = CombatEngine::default();
    let target = enemy_infantry(&mut engine, 0.0, 0.0);
    let agent = engine.spawn_unit(Faction::Player, UnitType::Infantry, at(1000.0, 0.0));
    engine.try_reserve_attack_slot(agent, target).unwrap();
    engine.register_attacker(agent, target);

    engine.despawn(target.entity());
    let report = engine.run_maintenance();
    assert_eq!(report.slot_rings_pruned, 1);
    assert_eq!(report.registry_targets_removed, 1);
    assert!(engine.snapshot().rings.is_empty());
    assert!(engine.snapshot().registry.is_empty());
}

#[test]
fn test_maintenance_is_idempotent() {
    let mut engine = CombatEngine::default();
    let target = enemy_infantry(&mut engine, 0.0, 0.0);
    let agent = engine.spawn_unit(Faction::Player, UnitType::Infantry, at(1000.0, 0.0));
    engine.register_attacker(agent, target);
    engine.try_reserve_attack_slot(agent, target).unwrap();
    engine.kill(agent);

    let first = engine.run_maintenance();
    assert_eq!(first.registry_attackers_removed, 1);
    assert_eq!(first.slots_reclaimed, 1);

    let second = engine.run_maintenance();
    assert_eq!(second.registry_targets_removed, 0);
    assert_eq!(second.registry_attackers_removed, 0);
    assert_eq!(second.slot_rings_pruned, 0);
    assert_eq!(second.slots_reclaimed, 0);
    assert!(second.is_noop());
}

#[test]
fn test_clean_maintenance_reports_noop() {
    let mut engine = CombatEngine::default();
    engine.spawn_unit(Faction::Player, UnitType::Infantry, at(0.0, 0.0));
    let keep = engine.spawn_stronghold(Faction::Enemy, at(500.0, 0.0), 100.0);

    // Cache already holds the stronghold spawned through the engine.
    assert!(engine.run_maintenance().is_noop());
    assert!(engine.drain_events().is_empty());

    engine.kill(keep);
    let report = engine.run_maintenance();
    assert_eq!(report.strongholds_cached, Some(0));
    assert_eq!(engine.drain_events(), vec![CombatEvent::StrongholdsRefreshed { count: 0 }]);
    assert!(engine.run_maintenance().is_noop());
}

#[test]
fn test_events_drained_once() {
    let mut engine = CombatEngine::default();
    let target = enemy_infantry(&mut engine, 0.0, 0.0);
    let agent = engine.spawn_unit(Faction::Player, UnitType::Infantry, at(1000.0, 0.0));

    engine.register_attacker(agent, target);
    engine.try_reserve_attack_slot(agent, target).unwrap();
    engine.try_reserve_attack_slot(agent, target).unwrap();
    engine.mark_slot_as_occupied(agent, target);
    engine.release_attack_slot(agent, target);

    let events = engine.drain_events();
    let (a, t) = (entity_id(agent), entity_id(target.entity()));
    assert_eq!(events.len(), 4);
    assert!(matches!(events[0], CombatEvent::TargetAcquired { agent, target, .. } if agent == a && target == t));
    assert!(matches!(events[1], CombatEvent::SlotReserved { slot: 0, .. }));
    assert_eq!(events[2], CombatEvent::SlotOccupied { agent: a, target: t, slot: 0 });
    assert_eq!(events[3], CombatEvent::SlotReleased { agent: a, target: t, slot: 0 });
    assert!(engine.drain_events().is_empty());
}

#[test]
fn test_event_json_is_tagged() {
    let event = CombatEvent::SlotsReclaimed { count: 2 };
    let json = serde_json::to_string(&event).unwrap();
    assert_eq!(json, r#"{"type":"SlotsReclaimed","count":2}"#);
}

// ---- Configuration ----

#[test]
fn test_try_new_rejects_invalid_config() {
    let mut config = EngineConfig::default();
    config.slots.slot_count = 0;
    let err = CombatEngine::try_new(config).err().unwrap();
    assert!(matches!(err, ConfigError::InvalidValue { field: "slots.slot_count", .. }));

    assert!(matches!(
        CombatEngine::from_json("{ not json"),
        Err(ConfigError::Parse(_))
    ));
}

#[test]
fn test_reset_bookkeeping_keeps_world() {
    let mut engine = CombatEngine::default();
    let target = enemy_infantry(&mut engine, 0.0, 0.0);
    let agent = engine.spawn_unit(Faction::Player, UnitType::Infantry, at(1000.0, 0.0));
    engine.register_attacker(agent, target);
    engine.try_reserve_attack_slot(agent, target).unwrap();

    engine.reset_bookkeeping();
    assert_eq!(engine.attacker_count(target), 0);
    assert!(engine.slot_ring(target).is_none());
    assert!(engine.world().contains(agent));
}
