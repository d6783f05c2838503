//! Why true dependencies were missed during skeleton identification

use relpc_domain::{Model, Variable};
use relpc_learner::PairLog;
use serde::Serialize;
use std::collections::BTreeMap;

/// Classification of every true edge by the test that decided its fate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct SkeletonBreakdown {
    /// True edges present in the learned skeleton
    pub detected: usize,

    /// Missed because the marginal test was not significant
    pub missed_marginal: usize,

    /// Missed because a conditional test was not significant
    pub missed_conditional: usize,

    /// Significant marginally but too weak to keep
    pub insubstantive_marginal: usize,

    /// Significant conditionally but too weak to keep
    pub insubstantive_conditional: usize,

    /// Missed without a logged test, e.g. beyond the hop threshold
    pub untested: usize,
}

impl SkeletonBreakdown {
    /// Classify the true edges of `truth`
    ///
    /// `alpha` is the per-test significance level the learner used.
    pub fn compute(
        truth: &Model,
        learned: &Model,
        test_log: &BTreeMap<(Variable, Variable), PairLog>,
        alpha: f64,
        strength_threshold: f64,
    ) -> Self {
        let mut breakdown = Self::default();
        for dep in truth.dependencies() {
            if learned.has_edge(&dep.source, &dep.target) {
                breakdown.detected += 1;
                continue;
            }

            let Some(log) = test_log.get(&dep.key()) else {
                breakdown.untested += 1;
                continue;
            };
            match (log.marginal, log.conditional) {
                (Some(m), _) if m.p_value > alpha => breakdown.missed_marginal += 1,
                (Some(m), _) if m.effect_size <= strength_threshold => breakdown.insubstantive_marginal += 1,
                (_, Some(c)) if c.p_value > alpha => breakdown.missed_conditional += 1,
                (_, Some(c)) if c.effect_size <= strength_threshold => breakdown.insubstantive_conditional += 1,
                _ => breakdown.untested += 1,
            }
        }
        breakdown
    }

    /// Number of true edges classified
    pub fn total(&self) -> usize {
        self.detected
            + self.missed_marginal
            + self.missed_conditional
            + self.insubstantive_marginal
            + self.insubstantive_conditional
            + self.untested
    }
}
