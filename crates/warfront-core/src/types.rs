//! Positions and simulation time.

use glam::{DVec2, DVec3};
use serde::{Deserialize, Serialize};

use crate::constants::DT;

/// World-space point. x/y lie on the ground plane, z is up.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Position {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Straight-line distance.
    pub fn range_to(&self, other: &Position) -> f64 {
        DVec3::from(*self).distance(DVec3::from(*other))
    }

    pub fn range_sq_to(&self, other: &Position) -> f64 {
        DVec3::from(*self).distance_squared(DVec3::from(*other))
    }

    /// Distance on the ground plane, ignoring z.
    pub fn horizontal_range_to(&self, other: &Position) -> f64 {
        DVec2::new(self.x, self.y).distance(DVec2::new(other.x, other.y))
    }

    pub fn offset_by(&self, offset: DVec3) -> Position {
        Position::from(DVec3::from(*self) + offset)
    }
}

impl From<Position> for DVec3 {
    fn from(p: Position) -> Self {
        DVec3::new(p.x, p.y, p.z)
    }
}

impl From<DVec3> for Position {
    fn from(v: DVec3) -> Self {
        Position::new(v.x, v.y, v.z)
    }
}

/// Tick counter plus the simulated seconds it represents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SimTime {
    pub tick: u64,
    pub elapsed_secs: f64,
}

impl SimTime {
    pub fn dt(&self) -> f64 {
        DT
    }

    /// Step forward one fixed tick.
    pub fn advance(&mut self) {
        self.tick += 1;
        self.elapsed_secs = self.tick as f64 * DT;
    }
}
