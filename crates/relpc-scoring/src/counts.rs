//! Edge-level comparison of a learned model against the truth

use crate::ScoringError;
use relpc_domain::Model;
use serde::Serialize;

/// Counts of each kind of agreement between a true and a learned model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ErrorCounts {
    /// True edges learned with the right orientation (or both undirected)
    pub correct: usize,

    /// Learned edges absent from the truth
    pub false_positives: usize,

    /// Candidate pairs correctly left out
    pub true_negatives: usize,

    /// True edges absent from the learned model
    pub false_negatives: usize,

    /// True edges learned with the opposite (or an unsupported) orientation
    pub direction_wrong: usize,

    /// Directed true edges learned as undirected
    pub undirected_when_directed: usize,

    /// Number of true edges
    pub true_compelled: usize,
}

impl ErrorCounts {
    /// Compare `learned` against `truth`
    ///
    /// `candidate_pairs` is the number of pairs the learner could have
    /// connected; true negatives are what remains after the other counts.
    /// Fails if both models mention variables but share none.
    pub fn compare(truth: &Model, learned: &Model, candidate_pairs: usize) -> Result<Self, ScoringError> {
        let true_vars = truth.variables();
        let learned_vars = learned.variables();
        if !true_vars.is_empty() && !learned_vars.is_empty() && true_vars.is_disjoint(&learned_vars) {
            return Err(ScoringError::Incomparable(
                "true and learned models have no variable in common".to_string(),
            ));
        }

        let mut counts = Self::default();
        for dep in truth.dependencies() {
            counts.true_compelled += 1;
            let Some(found) = learned.dependency(&dep.source, &dep.target) else {
                counts.false_negatives += 1;
                continue;
            };
            match (dep.cause(), dep.effect()) {
                (Some(cause), Some(effect)) => {
                    if found.points(cause, effect) {
                        counts.correct += 1;
                    } else if !found.is_directed() {
                        counts.undirected_when_directed += 1;
                    } else {
                        counts.direction_wrong += 1;
                    }
                }
                _ if !found.is_directed() => counts.correct += 1,
                _ => counts.direction_wrong += 1,
            }
        }

        counts.false_positives = learned
            .dependencies()
            .iter()
            .filter(|d| !truth.has_edge(&d.source, &d.target))
            .count();

        let accounted = counts.correct
            + counts.false_positives
            + counts.false_negatives
            + counts.direction_wrong
            + counts.undirected_when_directed;
        counts.true_negatives = candidate_pairs.saturating_sub(accounted);
        Ok(counts)
    }

    /// The counts in reporting order: correct, FP, TN, FN, direction wrong,
    /// undirected when directed, true compelled
    pub fn as_array(&self) -> [usize; 7] {
        [
            self.correct,
            self.false_positives,
            self.true_negatives,
            self.false_negatives,
            self.direction_wrong,
            self.undirected_when_directed,
            self.true_compelled,
        ]
    }

    fn skeleton_correct(&self) -> usize {
        self.correct + self.direction_wrong + self.undirected_when_directed
    }

    /// Fraction of learned edges present in the truth, ignoring direction
    pub fn skeleton_precision(&self) -> f64 {
        ratio(self.skeleton_correct(), self.skeleton_correct() + self.false_positives)
    }

    /// Fraction of true edges learned, ignoring direction
    pub fn skeleton_recall(&self) -> f64 {
        ratio(self.skeleton_correct(), self.skeleton_correct() + self.false_negatives)
    }

    /// Fraction of learned orientations that are right
    pub fn compelled_precision(&self) -> f64 {
        ratio(self.correct, self.correct + self.direction_wrong)
    }

    /// Fraction of true edges learned with the right orientation
    pub fn compelled_recall(&self) -> f64 {
        ratio(self.correct, self.true_compelled)
    }

    /// All scores at once
    pub fn scores(&self) -> Scores {
        let s_precision = self.skeleton_precision();
        let s_recall = self.skeleton_recall();
        let c_precision = self.compelled_precision();
        let c_recall = self.compelled_recall();
        Scores {
            s_precision,
            s_recall,
            c_precision,
            c_recall,
            s_f_measure: f_measure(s_precision, s_recall),
            c_f_measure: f_measure(c_precision, c_recall),
        }
    }
}

/// Precision, recall and F-measures for skeleton and orientation
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Scores {
    /// Skeleton precision
    pub s_precision: f64,
    /// Skeleton recall
    pub s_recall: f64,
    /// Compelled precision
    pub c_precision: f64,
    /// Compelled recall
    pub c_recall: f64,
    /// Harmonic mean of skeleton precision and recall
    pub s_f_measure: f64,
    /// Harmonic mean of compelled precision and recall
    pub c_f_measure: f64,
}

/// `num / den`, or 1.0 when there is nothing to measure
fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        1.0
    } else {
        num as f64 / den as f64
    }
}

fn f_measure(precision: f64, recall: f64) -> f64 {
    if precision + recall == 0.0 {
        1.0
    } else {
        2.0 * precision * recall / (precision + recall)
    }
}
