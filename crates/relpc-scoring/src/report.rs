//! Full evaluation of a learner run

use crate::{ErrorCounts, Scores, ScoringError, SkeletonBreakdown};
use relpc_domain::{Model, OrientationRule, Variable};
use relpc_learner::{DSeparationOracle, IndependenceTest, ModelSupport, RelationalPc};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, info};

const ORACLE_SIGNIFICANCE: f64 = 0.01;
const ORACLE_STRENGTH: f64 = 0.1;

/// Correctly oriented learned edges that touch a variable of degree 1
///
/// These orientations follow from little more than background knowledge,
/// so they are reported apart from the rest.
pub fn trivial_orientation_count(truth: &Model, learned: &Model) -> usize {
    learned
        .dependencies()
        .iter()
        .filter(|dep| match (dep.cause(), dep.effect()) {
            (Some(cause), Some(effect)) => truth.is_directed(cause, effect),
            _ => false,
        })
        .filter(|dep| learned.degree(&dep.source) == 1 || learned.degree(&dep.target) == 1)
        .count()
}

/// How many edges of `model` each rule oriented
pub fn rule_frequencies(model: &Model) -> BTreeMap<OrientationRule, usize> {
    let mut frequencies: BTreeMap<OrientationRule, usize> =
        OrientationRule::ALL.iter().map(|rule| (*rule, 0)).collect();
    for rule in model.dependencies().iter().filter_map(|dep| dep.rule) {
        *frequencies.entry(rule).or_insert(0) += 1;
    }
    frequencies
}

/// Conditioning depth that covers the largest candidate neighborhood
fn oracle_depth(support: &ModelSupport) -> usize {
    let mut degrees: BTreeMap<Variable, usize> = BTreeMap::new();
    for (a, b) in support.candidate_pairs() {
        *degrees.entry(a).or_insert(0) += 1;
        *degrees.entry(b).or_insert(0) += 1;
    }
    degrees.values().copied().max().unwrap_or(0)
}

/// Compelled recall reached with perfect independence information
///
/// Runs the learner over `support` with a d-separation oracle on `truth`
/// in place of the statistical test.
pub fn oracle_causal_recall(support: &ModelSupport, truth: &Model) -> Result<f64, ScoringError> {
    let depth = oracle_depth(support);
    let mut pc = RelationalPc::with_test(support, DSeparationOracle::new(truth));
    pc.set_significance_threshold_adjust(ORACLE_SIGNIFICANCE)?;
    pc.set_strength_of_effect_threshold(ORACLE_STRENGTH)?;
    pc.identify_skeleton(depth)?;
    pc.orient_edges()?;

    let oracle_model = pc.model();
    let counts = ErrorCounts::compare(truth, &oracle_model, support.candidate_pairs().len())?;
    debug!(depth, oriented = oracle_model.oriented_count(), "Oracle run complete");
    Ok(counts.compelled_recall())
}

/// Everything known about how a learned model compares to the truth
#[derive(Debug, Clone, Serialize)]
pub struct ScoreReport {
    /// Edge-level counts
    pub counts: ErrorCounts,

    /// Precision, recall and F-measures
    pub scores: Scores,

    /// Correct orientations at degree-1 variables
    pub trivial: usize,

    /// Orientations per rule, keyed by rule code
    pub rules: BTreeMap<String, usize>,

    /// Compelled recall of the oracle run, if requested
    pub oracle_recall: Option<f64>,

    /// Why true edges were missed, if the run logged its tests
    pub breakdown: Option<SkeletonBreakdown>,
}

impl ScoreReport {
    /// Score the current model of `pc` against `truth`
    pub fn score<T: IndependenceTest>(
        truth: &Model,
        pc: &RelationalPc<'_, T>,
        with_oracle: bool,
    ) -> Result<Self, ScoringError> {
        let support = pc.support();
        let learned = pc.model();
        let counts = ErrorCounts::compare(truth, &learned, support.candidate_pairs().len())?;

        let rules = rule_frequencies(&learned)
            .into_iter()
            .map(|(rule, count)| (rule.code().to_string(), count))
            .collect();

        let breakdown = match (pc.significance_level(), pc.strength_of_effect_threshold()) {
            (Some(alpha), Some(strength)) if !pc.test_log().is_empty() => Some(SkeletonBreakdown::compute(
                truth,
                &learned,
                pc.test_log(),
                alpha,
                strength,
            )),
            _ => None,
        };

        let oracle_recall = if with_oracle {
            Some(oracle_causal_recall(support, truth)?)
        } else {
            None
        };

        let report = Self {
            counts,
            scores: counts.scores(),
            trivial: trivial_orientation_count(truth, &learned),
            rules,
            oracle_recall,
            breakdown,
        };
        info!(
            s_precision = report.scores.s_precision,
            s_recall = report.scores.s_recall,
            c_precision = report.scores.c_precision,
            c_recall = report.scores.c_recall,
            "Scored learned model"
        );
        Ok(report)
    }

    /// Plain-text rendering
    pub fn summary(&self) -> String {
        let s = &self.scores;
        let mut lines = vec![
            "Score Report".to_string(),
            "============".to_string(),
            format!("Counts: {:?}", self.counts.as_array()),
            format!("SPrecision: {:.3}  SRecall: {:.3}  SF: {:.3}", s.s_precision, s.s_recall, s.s_f_measure),
            format!("CPrecision: {:.3}  CRecall: {:.3}  CF: {:.3}", s.c_precision, s.c_recall, s.c_f_measure),
            format!("Trivial orientations: {}", self.trivial),
        ];

        let rules: Vec<String> = self.rules.iter().map(|(code, n)| format!("{}={}", code, n)).collect();
        lines.push(format!("Rules: {}", rules.join(" ")));

        if let Some(recall) = self.oracle_recall {
            lines.push(format!("Oracle recall: {:.3}", recall));
        }
        if let Some(b) = &self.breakdown {
            lines.push(format!(
                "Skeleton: {} detected, {}/{} missed marginally, {}/{} missed conditionally, {} untested",
                b.detected,
                b.missed_marginal,
                b.insubstantive_marginal,
                b.missed_conditional,
                b.insubstantive_conditional,
                b.untested
            ));
        }
        lines.join("\n")
    }
}
