//! Combat targeting engine for WARFRONT.
//!
//! Owns the hecs ECS world and the per-target bookkeeping that sits on top
//! of it: attacker registry, target selection, attack slot rings and the
//! periodic maintenance that keeps them consistent with a churning world.

pub mod engine;
pub mod events;
pub mod maintenance;
pub mod registry;
pub mod slots;
pub mod snapshot;
pub mod spatial;
pub mod target;
pub mod targeting;
pub mod world_setup;

pub use engine::CombatEngine;
pub use target::TargetRef;
pub use warfront_core as core;

#[cfg(test)]
mod tests;
