//! World queries the engine delegates to the host.
//!
//! The engine never walks terrain or navmesh data itself. It asks a
//! `SpatialQuery` for entities near a point and a `NavigationQuery` whether a
//! point can be stood on and whether a path exists. Default implementations
//! cover headless use and tests.

use glam::DVec2;
use hecs::{Entity, World};

use warfront_core::components::{Stronghold, Unit};
use warfront_core::types::Position;

/// Which entities an overlap query should return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlapFilter {
    Units,
    Strongholds,
    Any,
}

/// Sphere overlap against the world.
pub trait SpatialQuery {
    fn overlap_sphere(
        &self,
        world: &World,
        center: Position,
        radius: f64,
        filter: OverlapFilter,
    ) -> Vec<Entity>;
}

/// Navigation-mesh oracle.
pub trait NavigationQuery {
    /// Snap `position` onto navigable ground within `tolerance`, if possible.
    fn project_point(&self, position: Position, tolerance: f64) -> Option<Position>;

    /// Whether a path exists from `start` to `end`.
    fn test_path(&self, start: Position, end: Position) -> bool;
}

/// Borrowed bundle of everything a read-only query needs.
#[derive(Clone, Copy)]
pub struct WorldView<'a> {
    pub world: &'a World,
    pub spatial: &'a dyn SpatialQuery,
    pub navigation: &'a dyn NavigationQuery,
}

/// Brute-force overlap: scans every positioned entity in the world.
#[derive(Debug, Clone, Copy, Default)]
pub struct WorldScan;

impl SpatialQuery for WorldScan {
    fn overlap_sphere(
        &self,
        world: &World,
        center: Position,
        radius: f64,
        filter: OverlapFilter,
    ) -> Vec<Entity> {
        if radius.is_nan() || radius < 0.0 {
            return Vec::new();
        }
        let radius_sq = radius * radius;
        let mut query = world.query::<(&Position, Option<&Unit>, Option<&Stronghold>)>();
        query
            .iter()
            .filter(|(_, (pos, unit, stronghold))| {
                let wanted = match filter {
                    OverlapFilter::Units => unit.is_some(),
                    OverlapFilter::Strongholds => stronghold.is_some(),
                    OverlapFilter::Any => unit.is_some() || stronghold.is_some(),
                };
                wanted && pos.range_sq_to(&center) <= radius_sq
            })
            .map(|(entity, _)| entity)
            .collect()
    }
}

/// Everything is walkable and every path exists.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenField;

impl NavigationQuery for OpenField {
    fn project_point(&self, position: Position, _tolerance: f64) -> Option<Position> {
        Some(position)
    }

    fn test_path(&self, _start: Position, _end: Position) -> bool {
        true
    }
}

/// Circular impassable area on the ground plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Obstacle {
    pub center: Position,
    pub radius: f64,
}

impl Obstacle {
    pub fn new(center: Position, radius: f64) -> Self {
        Self { center, radius }
    }

    fn center_2d(&self) -> DVec2 {
        DVec2::new(self.center.x, self.center.y)
    }

    fn contains(&self, point: DVec2) -> bool {
        point.distance_squared(self.center_2d()) < self.radius * self.radius
    }

    /// Whether the ground-plane segment `a..b` passes through the obstacle.
    fn blocks(&self, a: DVec2, b: DVec2) -> bool {
        let c = self.center_2d();
        let ab = b - a;
        let len_sq = ab.length_squared();
        let t = if len_sq > 0.0 {
            ((c - a).dot(ab) / len_sq).clamp(0.0, 1.0)
        } else {
            0.0
        };
        self.contains(a + ab * t)
    }
}

/// Open ground with circular blockers. Straight-line paths only: a path is
/// reachable when no obstacle lies across it.
#[derive(Debug, Clone, Default)]
pub struct ObstacleField {
    obstacles: Vec<Obstacle>,
}

impl ObstacleField {
    pub fn new(obstacles: Vec<Obstacle>) -> Self {
        Self { obstacles }
    }
}

/// Nudge past the obstacle rim so a projected point is outside it.
const EDGE_CLEARANCE: f64 = 1e-6;

fn ground(p: Position) -> DVec2 {
    DVec2::new(p.x, p.y)
}

impl NavigationQuery for ObstacleField {
    fn project_point(&self, position: Position, tolerance: f64) -> Option<Position> {
        let point = ground(position);
        let Some(obstacle) = self.obstacles.iter().find(|o| o.contains(point)) else {
            return Some(position);
        };

        // Push out to the nearest edge if it is close enough.
        let away = point - obstacle.center_2d();
        let depth = obstacle.radius - away.length();
        if depth > tolerance {
            return None;
        }
        let dir = away.try_normalize().unwrap_or(DVec2::X);
        let edge = obstacle.center_2d() + dir * (obstacle.radius + EDGE_CLEARANCE);
        let projected = Position::new(edge.x, edge.y, position.z);
        if self.obstacles.iter().any(|o| o.contains(ground(projected))) {
            return None;
        }
        Some(projected)
    }

    fn test_path(&self, start: Position, end: Position) -> bool {
        let (a, b) = (ground(start), ground(end));
        !self.obstacles.iter().any(|o| o.blocks(a, b))
    }
}
