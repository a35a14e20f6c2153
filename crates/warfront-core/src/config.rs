//! Engine configuration.
//!
//! Every balance value is a field here, defaulted from `constants`.
//! JSON documents may override any subset of fields.

use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::enums::{UnitClass, UnitType};
use crate::error::ConfigError;

/// Complete engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub targeting: TargetingConfig,
    pub slots: SlotConfig,
    pub maintenance: MaintenanceConfig,
}

/// Target scoring and search parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetingConfig {
    pub base_score: f64,
    pub fallback_detection_range: f64,
    pub congestion_threshold: u32,
    pub light_congestion_step: f64,
    pub heavy_congestion_base: f64,
    pub heavy_congestion_step: f64,
    pub stronghold_score_factor: f64,
    /// K: nearest candidates tested for reachability per slot-aware query.
    pub reachability_check_limit: usize,
    pub default_max_attackers: usize,
}

impl Default for TargetingConfig {
    fn default() -> Self {
        Self {
            base_score: BASE_TARGET_SCORE,
            fallback_detection_range: FALLBACK_DETECTION_RANGE,
            congestion_threshold: CONGESTION_THRESHOLD,
            light_congestion_step: LIGHT_CONGESTION_STEP,
            heavy_congestion_base: HEAVY_CONGESTION_BASE,
            heavy_congestion_step: HEAVY_CONGESTION_STEP,
            stronghold_score_factor: STRONGHOLD_SCORE_FACTOR,
            reachability_check_limit: REACHABILITY_CHECK_LIMIT,
            default_max_attackers: DEFAULT_MAX_ATTACKERS,
        }
    }
}

/// Attack slot ring parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlotConfig {
    /// N: slots per ring. Fixed per target once its ring exists.
    pub slot_count: usize,
    pub slot_radius: f64,
    pub navigability_tolerance: f64,
    /// Unit types that must hold a slot. Empty means every type does.
    pub slot_required: UnitClass,
    pub ranged_standoff_factor: f64,
    pub stronghold_standoff_factor: f64,
}

impl Default for SlotConfig {
    fn default() -> Self {
        Self {
            slot_count: SLOT_COUNT,
            slot_radius: SLOT_RADIUS,
            navigability_tolerance: NAVIGABILITY_TOLERANCE,
            slot_required: UnitClass::MELEE,
            ranged_standoff_factor: RANGED_STANDOFF_FACTOR,
            stronghold_standoff_factor: STRONGHOLD_STANDOFF_FACTOR,
        }
    }
}

impl SlotConfig {
    /// Whether agents of this type take part in the slot system.
    ///
    /// An empty `slot_required` set keeps the historical behaviour: every
    /// agent requires a slot.
    pub fn requires_slot(&self, unit_type: UnitType) -> bool {
        self.slot_required.is_empty() || self.slot_required.intersects(unit_type.class())
    }
}

/// Periodic sweep intervals, in seconds of simulated time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaintenanceConfig {
    pub registry_sweep_secs: f64,
    pub slot_sweep_secs: f64,
    pub stronghold_refresh_secs: f64,
}

impl Default for MaintenanceConfig {
    fn default() -> Self {
        Self {
            registry_sweep_secs: REGISTRY_SWEEP_SECS,
            slot_sweep_secs: SLOT_SWEEP_SECS,
            stronghold_refresh_secs: STRONGHOLD_REFRESH_SECS,
        }
    }
}

impl EngineConfig {
    /// Parse a (possibly partial) JSON document and validate it.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check every tuning value against its permitted range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let t = &self.targeting;
        require_positive("targeting.base_score", t.base_score)?;
        require_positive("targeting.fallback_detection_range", t.fallback_detection_range)?;
        require_non_negative("targeting.light_congestion_step", t.light_congestion_step)?;
        require_non_negative("targeting.heavy_congestion_step", t.heavy_congestion_step)?;
        require_positive("targeting.stronghold_score_factor", t.stronghold_score_factor)?;
        if t.reachability_check_limit == 0 {
            return Err(ConfigError::invalid(
                "targeting.reachability_check_limit",
                "must check at least one candidate",
            ));
        }
        // The penalty curve must not dip when crossing into the heavy regime,
        // otherwise score stops being monotone in attacker count.
        let at_threshold = 1.0 + t.light_congestion_step * t.congestion_threshold as f64;
        if t.heavy_congestion_base.is_nan() || t.heavy_congestion_base < at_threshold {
            return Err(ConfigError::invalid(
                "targeting.heavy_congestion_base",
                format!("must be at least {at_threshold} (penalty at the threshold)"),
            ));
        }

        let s = &self.slots;
        if s.slot_count == 0 {
            return Err(ConfigError::invalid("slots.slot_count", "must be at least 1"));
        }
        require_positive("slots.slot_radius", s.slot_radius)?;
        require_positive("slots.navigability_tolerance", s.navigability_tolerance)?;
        require_positive("slots.ranged_standoff_factor", s.ranged_standoff_factor)?;
        require_positive("slots.stronghold_standoff_factor", s.stronghold_standoff_factor)?;

        let m = &self.maintenance;
        require_positive("maintenance.registry_sweep_secs", m.registry_sweep_secs)?;
        require_positive("maintenance.slot_sweep_secs", m.slot_sweep_secs)?;
        require_positive("maintenance.stronghold_refresh_secs", m.stronghold_refresh_secs)?;
        Ok(())
    }
}

fn require_positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, format!("must be positive and finite, got {value}")))
    }
}

fn require_non_negative(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, format!("must be non-negative and finite, got {value}")))
    }
}
