//! Attacker registry: which agents have declared they are attacking which
//! target. Feeds the congestion term of target scoring.

use std::collections::HashMap;

use hecs::{Entity, World};

use crate::target::{is_live_agent, resolve_live_target, TargetRef};

/// Counts removed by a registry sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegistrySweep {
    pub targets_removed: usize,
    pub attackers_removed: usize,
}

/// Target -> attackers map. Handles are weak; stale ones are tolerated until
/// the next sweep and never counted.
#[derive(Debug, Default)]
pub struct AttackerRegistry {
    entries: HashMap<TargetRef, Vec<Entity>>,
}

impl AttackerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `agent` as attacking `target`. Returns `true` if the agent was
    /// newly added; repeated registration is a no-op.
    pub fn register(&mut self, world: &World, agent: Entity, target: TargetRef) -> bool {
        if !is_live_agent(world, agent) {
            tracing::debug!(?agent, "register rejected: agent not alive");
            return false;
        }
        if resolve_live_target(world, target).is_none() {
            tracing::debug!(?agent, ?target, "register rejected: target invalid");
            return false;
        }

        let attackers = self.entries.entry(target).or_default();
        if attackers.contains(&agent) {
            return false;
        }
        attackers.push(agent);
        tracing::debug!(?agent, ?target, attackers = attackers.len(), "attacker registered");
        true
    }

    /// Remove `agent` from `target`'s attackers. Returns `true` if it was
    /// present. Empty entries are dropped.
    pub fn unregister(&mut self, agent: Entity, target: TargetRef) -> bool {
        let Some(attackers) = self.entries.get_mut(&target) else {
            return false;
        };
        let before = attackers.len();
        attackers.retain(|&a| a != agent);
        let removed = attackers.len() != before;
        if attackers.is_empty() {
            self.entries.remove(&target);
        }
        removed
    }

    /// Number of still-living attackers on `target`.
    pub fn attacker_count(&self, world: &World, target: TargetRef) -> usize {
        self.entries
            .get(&target)
            .map_or(0, |attackers| {
                attackers.iter().filter(|&&a| is_live_agent(world, a)).count()
            })
    }

    pub fn is_target_full(&self, world: &World, target: TargetRef, max_attackers: usize) -> bool {
        self.attacker_count(world, target) >= max_attackers
    }

    pub fn iter(&self) -> impl Iterator<Item = (TargetRef, &[Entity])> {
        self.entries.iter().map(|(t, a)| (*t, a.as_slice()))
    }

    /// Number of targets with at least one recorded attacker.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Drop dead targets, dead attackers and the entries they leave empty.
    pub fn sweep(&mut self, world: &World) -> RegistrySweep {
        let mut report = RegistrySweep::default();
        self.entries.retain(|target, attackers| {
            if resolve_live_target(world, *target).is_none() {
                report.targets_removed += 1;
                report.attackers_removed += attackers.len();
                return false;
            }
            let before = attackers.len();
            attackers.retain(|&a| is_live_agent(world, a));
            report.attackers_removed += before - attackers.len();
            if attackers.is_empty() {
                report.targets_removed += 1;
                return false;
            }
            true
        });
        report
    }
}
