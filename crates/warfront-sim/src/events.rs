//! Combat events queued for the host's UI and audio feedback.
//!
//! Events are informational only; nothing in the engine reads them back.

use serde::{Deserialize, Serialize};

use warfront_core::enums::TargetKind;
use warfront_core::types::Position;

/// Something the host may want to react to. Entity ids are `Entity::to_bits`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum CombatEvent {
    /// Agent committed to attacking a target (registered as an attacker).
    TargetAcquired {
        agent: u64,
        target: u64,
        kind: TargetKind,
    },
    /// Agent stopped attacking a target.
    TargetDropped { agent: u64, target: u64 },
    SlotReserved {
        agent: u64,
        target: u64,
        slot: usize,
        position: Position,
    },
    /// Agent arrived at its reserved slot.
    SlotOccupied { agent: u64, target: u64, slot: usize },
    SlotReleased { agent: u64, target: u64, slot: usize },
    /// Slots freed by a sweep because their holders died.
    SlotsReclaimed { count: usize },
    /// Slot rings dropped because their targets died.
    CombatInfoPruned { count: usize },
    /// Registry entries and stale attacker handles removed by a sweep.
    RegistryPruned { targets: usize, attackers: usize },
    StrongholdsRefreshed { count: usize },
}
