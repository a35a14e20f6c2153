//! Engine constants and tuning parameters.
//!
//! Balance values come from playtesting, not from any structural constraint.
//! They seed `EngineConfig::default()` and can be overridden per run.

/// Simulation tick rate (Hz).
pub const TICK_RATE: u32 = 30;

/// Seconds per tick.
pub const DT: f64 = 1.0 / TICK_RATE as f64;

// --- Target scoring ---

/// Score of an uncontested target at zero distance.
pub const BASE_TARGET_SCORE: f64 = 100.0;

/// Detection range assumed when a querier reports a non-positive one.
pub const FALLBACK_DETECTION_RANGE: f64 = 1000.0;

/// Attacker count above which the steep congestion regime applies.
pub const CONGESTION_THRESHOLD: u32 = 4;

/// Penalty added per attacker while at or below the threshold.
pub const LIGHT_CONGESTION_STEP: f64 = 0.5;

/// Penalty base once the threshold is exceeded.
pub const HEAVY_CONGESTION_BASE: f64 = 5.0;

/// Penalty added per attacker beyond the threshold.
pub const HEAVY_CONGESTION_STEP: f64 = 2.0;

/// Multiplier on a stronghold candidate's score (units are preferred).
pub const STRONGHOLD_SCORE_FACTOR: f64 = 0.8;

/// Maximum number of nearest candidates tested for path reachability per query.
pub const REACHABILITY_CHECK_LIMIT: usize = 5;

/// Default cap used by `is_target_full`.
pub const DEFAULT_MAX_ATTACKERS: usize = 6;

// --- Attack slots ---

/// Slots per unit target ring.
pub const SLOT_COUNT: usize = 8;

/// Distance of the slot ring from the target centre.
pub const SLOT_RADIUS: f64 = 120.0;

/// Search extent for projecting a slot onto navigable ground.
pub const NAVIGABILITY_TOLERANCE: f64 = 50.0;

/// Non-slot agents stand at this fraction of their attack range.
pub const RANGED_STANDOFF_FACTOR: f64 = 0.9;

/// Agents attacking a stronghold stand this fraction of their attack range
/// beyond its bounding radius.
pub const STRONGHOLD_STANDOFF_FACTOR: f64 = 0.8;

// --- Maintenance ---

/// Attacker registry sweep interval (seconds).
pub const REGISTRY_SWEEP_SECS: f64 = 5.0;

/// Slot ring sweep interval (seconds).
pub const SLOT_SWEEP_SECS: f64 = 3.0;

/// Stronghold cache refresh interval (seconds).
pub const STRONGHOLD_REFRESH_SECS: f64 = 5.0;
