//! Score-based target selection.
//!
//! Hostile units within the search radius are scored on proximity and
//! discounted by how many allies already attack them. Strongholds are only
//! considered when no unit qualifies. Selection reads the registry but never
//! changes it.

use std::collections::HashSet;

use hecs::Entity;

use warfront_core::config::TargetingConfig;
use warfront_scoring::score::{stronghold_distance, target_score};

use crate::maintenance::StrongholdCache;
use crate::registry::AttackerRegistry;
use crate::spatial::WorldView;
use crate::target::{hostile_strongholds, hostile_units_in_range, resolve_agent, AgentView, TargetRef};

/// One scored option from a target search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetCandidate {
    pub target: TargetRef,
    /// Distance used for scoring; edge distance for strongholds.
    pub distance: f64,
    pub attacker_count: usize,
    pub score: f64,
    pub reachable: bool,
    pub is_stronghold: bool,
}

/// Outcome of a search: the winner plus everything that was considered,
/// best first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TargetSearch {
    pub best: Option<TargetRef>,
    pub candidates: Vec<TargetCandidate>,
}

impl TargetSearch {
    pub fn is_empty(&self) -> bool {
        self.best.is_none()
    }
}

#[derive(Debug, Clone)]
pub struct TargetingService {
    config: TargetingConfig,
}

impl TargetingService {
    pub fn new(config: TargetingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TargetingConfig {
        &self.config
    }

    pub fn find_best_target(
        &self,
        view: &WorldView<'_>,
        registry: &AttackerRegistry,
        strongholds: &StrongholdCache,
        querier: Entity,
        radius: f64,
    ) -> TargetSearch {
        self.find_best_target_excluding(view, registry, strongholds, querier, radius, &HashSet::new())
    }

    /// Best-scoring hostile within `radius` of `querier`, skipping `ignored`.
    ///
    /// Ties keep the candidate the spatial query returned first. A dead or
    /// missing querier finds nothing.
    pub fn find_best_target_excluding(
        &self,
        view: &WorldView<'_>,
        registry: &AttackerRegistry,
        strongholds: &StrongholdCache,
        querier: Entity,
        radius: f64,
        ignored: &HashSet<TargetRef>,
    ) -> TargetSearch {
        let Some(agent) = resolve_agent(view.world, querier) else {
            tracing::debug!(?querier, "target search skipped: querier not alive");
            return TargetSearch::default();
        };

        let mut candidates = self.unit_candidates(view, registry, &agent, radius, ignored);
        if candidates.is_empty() {
            candidates = self.stronghold_candidates(view, registry, strongholds, &agent, ignored);
            candidates.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        } else {
            candidates.sort_by(|a, b| b.score.total_cmp(&a.score));
        }

        let best = candidates.first().map(|c| c.target);
        if let Some(winner) = candidates.first() {
            tracing::debug!(
                ?querier,
                target_id = ?winner.target,
                score = winner.score,
                considered = candidates.len(),
                "target selected"
            );
        }
        TargetSearch { best, candidates }
    }

    fn unit_candidates(
        &self,
        view: &WorldView<'_>,
        registry: &AttackerRegistry,
        agent: &AgentView,
        radius: f64,
        ignored: &HashSet<TargetRef>,
    ) -> Vec<TargetCandidate> {
        if radius.is_nan() || radius <= 0.0 {
            return Vec::new();
        }
        hostile_units_in_range(view, agent, radius, Some(ignored))
            .into_iter()
            .map(|t| {
                let distance = agent.position.range_to(&t.position);
                let attacker_count = registry.attacker_count(view.world, t.target);
                let score = target_score(distance, agent.detection_range, attacker_count, &self.config);
                tracing::trace!(target_id = ?t.target, distance, attacker_count, score, "unit candidate");
                TargetCandidate {
                    target: t.target,
                    distance,
                    attacker_count,
                    score,
                    reachable: true,
                    is_stronghold: false,
                }
            })
            .collect()
    }

    fn stronghold_candidates(
        &self,
        view: &WorldView<'_>,
        registry: &AttackerRegistry,
        strongholds: &StrongholdCache,
        agent: &AgentView,
        ignored: &HashSet<TargetRef>,
    ) -> Vec<TargetCandidate> {
        hostile_strongholds(view.world, strongholds, agent, Some(ignored))
            .into_iter()
            .map(|t| {
                let distance =
                    stronghold_distance(agent.position.range_to(&t.position), t.bounding_radius);
                let attacker_count = registry.attacker_count(view.world, t.target);
                let score = target_score(distance, agent.detection_range, attacker_count, &self.config)
                    * self.config.stronghold_score_factor;
                tracing::trace!(target_id = ?t.target, distance, attacker_count, score, "stronghold candidate");
                TargetCandidate {
                    target: t.target,
                    distance,
                    attacker_count,
                    score,
                    reachable: true,
                    is_stronghold: true,
                }
            })
            .collect()
    }
}
