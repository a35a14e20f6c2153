//! Target desirability scoring.
//!
//! `score = base · distance_score / congestion_penalty`, where the distance
//! score falls linearly from 1 at the querier to 0 at its detection range,
//! and the congestion penalty grows gently up to the threshold and steeply
//! beyond it, pushing latecomers toward uncontested targets.

use warfront_core::config::TargetingConfig;

/// Linear closeness in `[0, 1]`: 1 at zero distance, 0 at or beyond `detection_range`.
///
/// Non-positive detection ranges are replaced with the configured fallback.
pub fn distance_score(distance: f64, detection_range: f64, config: &TargetingConfig) -> f64 {
    let max_distance = if detection_range > 0.0 {
        detection_range
    } else {
        config.fallback_detection_range
    };
    ((max_distance - distance) / max_distance).clamp(0.0, 1.0)
}

/// Divisor applied to a target's score for the attackers already on it.
pub fn congestion_penalty(attacker_count: usize, config: &TargetingConfig) -> f64 {
    let threshold = config.congestion_threshold as usize;
    if attacker_count == 0 {
        1.0
    } else if attacker_count <= threshold {
        1.0 + config.light_congestion_step * attacker_count as f64
    } else {
        config.heavy_congestion_base
            + config.heavy_congestion_step * (attacker_count - threshold) as f64
    }
}

/// Full target score (higher is better).
pub fn target_score(
    distance: f64,
    detection_range: f64,
    attacker_count: usize,
    config: &TargetingConfig,
) -> f64 {
    let base = config.base_score * distance_score(distance, detection_range, config);
    base / congestion_penalty(attacker_count, config)
}

/// Straight-line distance to a stronghold, measured to its footprint edge.
pub fn stronghold_distance(center_distance: f64, bounding_radius: f64) -> f64 {
    (center_distance - bounding_radius.max(0.0)).max(0.0)
}
