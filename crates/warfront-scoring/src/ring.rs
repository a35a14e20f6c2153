//! Attack slot ring layout and stand-off geometry.

use glam::DVec3;

use warfront_core::types::Position;

/// Relative offsets of `slot_count` slots spaced evenly on a horizontal circle.
///
/// Slot `i` sits at angle `i · 360° / slot_count`, measured from +X toward +Y.
pub fn ring_offsets(slot_count: usize, radius: f64) -> Vec<DVec3> {
    if slot_count == 0 {
        return Vec::new();
    }
    let step_degrees = 360.0 / slot_count as f64;
    (0..slot_count)
        .map(|i| {
            let radians = (step_degrees * i as f64).to_radians();
            DVec3::new(radians.cos() * radius, radians.sin() * radius, 0.0)
        })
        .collect()
}

/// Unit vector from `from` toward `to`, or +X when the two coincide.
pub fn direction_toward(from: Position, to: Position) -> DVec3 {
    let delta = DVec3::from(to) - DVec3::from(from);
    let dir = delta.normalize_or_zero();
    if dir == DVec3::ZERO {
        DVec3::X
    } else {
        dir
    }
}

/// Point `distance` away from `target`, on the side facing `agent`.
pub fn standoff_point(target: Position, agent: Position, distance: f64) -> Position {
    target.offset_by(direction_toward(target, agent) * distance)
}

/// Where an agent that does not use slots should stand: just inside its own range edge.
pub fn ranged_standoff(target: Position, agent: Position, attack_range: f64, factor: f64) -> Position {
    standoff_point(target, agent, attack_range * factor)
}

/// Where an agent should stand to strike a stronghold: outside its footprint,
/// within its own range of the edge.
pub fn stronghold_standoff(
    stronghold: Position,
    agent: Position,
    bounding_radius: f64,
    attack_range: f64,
    factor: f64,
) -> Position {
    standoff_point(stronghold, agent, bounding_radius + attack_range * factor)
}
