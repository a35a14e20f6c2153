//! Target scoring and attack-position geometry for WARFRONT.
//!
//! Pure functions over plain data: the distance/congestion scoring curve,
//! slot ring layout, and stand-off points for agents that do not use slots.
//! No ECS dependency.

pub mod ring;
pub mod score;

pub use warfront_core as core;
