//! Chi-square tests of marginal and conditional independence

use crate::contingency::{stratify, ContingencyTable, Observation};
use crate::effect::EffectSize;
use serde::{Deserialize, Serialize};
use statrs::distribution::{ChiSquared, ContinuousCDF};

/// Strata with fewer observations than this are skipped by the stratified test
pub const MIN_STRATUM_SIZE: f64 = 5.0;

/// Outcome of one independence test
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TestResult {
    /// Chi-square statistic
    pub statistic: f64,

    /// Degrees of freedom
    pub degrees_of_freedom: f64,

    /// Probability of a statistic at least this large under independence
    pub p_value: f64,

    /// Strength of association
    pub effect_size: f64,

    /// Observations that contributed to the statistic
    pub sample_size: usize,

    /// True when the data could not support a test
    pub degenerate: bool,
}

impl TestResult {
    /// A result that cannot reject independence
    pub fn degenerate(sample_size: usize) -> Self {
        Self {
            statistic: 0.0,
            degrees_of_freedom: 0.0,
            p_value: 1.0,
            effect_size: 0.0,
            sample_size,
            degenerate: true,
        }
    }

    /// Whether the result counts as independence
    ///
    /// Independence is accepted when the test is not significant at `alpha`
    /// or when the association is too weak to matter, so an edge is removed
    /// unless it is both significant and stronger than `strength_threshold`.
    pub fn is_independent(&self, alpha: f64, strength_threshold: f64) -> bool {
        self.p_value > alpha || self.effect_size <= strength_threshold
    }
}

fn pearson_statistic(table: &ContingencyTable) -> f64 {
    let rows = table.row_totals();
    let cols = table.col_totals();
    let total = table.total();

    let mut statistic = 0.0;
    for (r, row_total) in rows.iter().enumerate() {
        for (c, col_total) in cols.iter().enumerate() {
            let expected = row_total * col_total / total;
            let diff = table.count(r, c) - expected;
            statistic += diff * diff / expected;
        }
    }
    statistic
}

fn p_value(statistic: f64, degrees_of_freedom: f64) -> Option<f64> {
    if !statistic.is_finite() || degrees_of_freedom <= 0.0 {
        return None;
    }
    let dist = ChiSquared::new(degrees_of_freedom).ok()?;
    let p = dist.sf(statistic);
    p.is_finite().then(|| p.clamp(0.0, 1.0))
}

/// Pearson's chi-square test on a two-way table
pub fn chi_square_test(table: &ContingencyTable, effect: EffectSize) -> TestResult {
    let n = table.total() as usize;
    if table.is_degenerate() {
        return TestResult::degenerate(n);
    }

    let statistic = pearson_statistic(table);
    let dof = ((table.rows() - 1) * (table.cols() - 1)) as f64;
    match p_value(statistic, dof) {
        Some(p_value) => TestResult {
            statistic,
            degrees_of_freedom: dof,
            p_value,
            effect_size: effect.compute(statistic, table.total(), table.rows(), table.cols()),
            sample_size: n,
            degenerate: false,
        },
        None => TestResult::degenerate(n),
    }
}

/// Stratified chi-square test across conditioning strata
///
/// Statistics and degrees of freedom are summed over every stratum that has at
/// least [`MIN_STRATUM_SIZE`] observations and is not degenerate. The effect
/// size uses the pooled sample size and the largest stratum shape. If no
/// stratum contributes, the conditioning set explains the association away and
/// the result is degenerate.
pub fn stratified_chi_square_test(strata: &[ContingencyTable], effect: EffectSize) -> TestResult {
    let mut statistic = 0.0;
    let mut dof = 0.0;
    let mut n = 0.0;
    let mut rows = 0;
    let mut cols = 0;

    for table in strata {
        if table.total() < MIN_STRATUM_SIZE || table.is_degenerate() {
            continue;
        }
        statistic += pearson_statistic(table);
        dof += ((table.rows() - 1) * (table.cols() - 1)) as f64;
        n += table.total();
        rows = rows.max(table.rows());
        cols = cols.max(table.cols());
    }

    let total: usize = strata.iter().map(|t| t.total() as usize).sum();
    match p_value(statistic, dof) {
        Some(p_value) => TestResult {
            statistic,
            degrees_of_freedom: dof,
            p_value,
            effect_size: effect.compute(statistic, n, rows, cols),
            sample_size: n as usize,
            degenerate: false,
        },
        None => TestResult::degenerate(total),
    }
}

/// Test `x _||_ y` over paired observations
pub fn test_marginal(pairs: &[(i64, i64)], effect: EffectSize) -> TestResult {
    chi_square_test(&ContingencyTable::from_pairs(pairs.iter().copied()), effect)
}

/// Test `x _||_ y | z`
///
/// With an empty conditioning set this is the marginal test.
pub fn test_conditional(observations: &[Observation], effect: EffectSize) -> TestResult {
    if observations.iter().all(|o| o.z.is_empty()) {
        let pairs: Vec<(i64, i64)> = observations.iter().map(|o| (o.x, o.y)).collect();
        return test_marginal(&pairs, effect);
    }
    stratified_chi_square_test(&stratify(observations), effect)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(cells: &[(i64, i64, usize)]) -> Vec<(i64, i64)> {
        cells
            .iter()
            .flat_map(|&(x, y, n)| std::iter::repeat((x, y)).take(n))
            .collect()
    }

    #[test]
    fn test_known_statistic() {
        // Expected counts 12, 18, 28, 42 -> chi2 = 0.79365
        let pairs = table(&[(0, 0, 10), (0, 1, 20), (1, 0, 30), (1, 1, 40)]);
        let result = test_marginal(&pairs, EffectSize::ContingencyCoefficient);

        assert!((result.statistic - 0.793651).abs() < 1e-5);
        assert_eq!(result.degrees_of_freedom, 1.0);
        assert!(result.p_value > 0.37 && result.p_value < 0.38);
        assert_eq!(result.sample_size, 100);
        assert!(!result.degenerate);
    }

    #[test]
    fn test_weak_or_insignificant_results_count_as_independent() {
        let result = |p_value, effect_size| TestResult {
            statistic: 0.0,
            degrees_of_freedom: 1.0,
            p_value,
            effect_size,
            sample_size: 100,
            degenerate: false,
        };

        // Significant and strong: dependence
        assert!(!result(0.001, 0.3).is_independent(0.01, 0.1));
        // Significant but weak
        assert!(result(0.001, 0.05).is_independent(0.01, 0.1));
        // Strong but not significant
        assert!(result(0.2, 0.3).is_independent(0.01, 0.1));
    }

    #[test]
    fn test_balanced_table_is_independent() {
        let pairs = table(&[(0, 0, 25), (0, 1, 25), (1, 0, 25), (1, 1, 25)]);
        let result = test_marginal(&pairs, EffectSize::ContingencyCoefficient);
        assert!(result.statistic.abs() < 1e-12);
        assert!((result.p_value - 1.0).abs() < 1e-9);
        assert!(result.is_independent(0.05, 0.1));
    }

    #[test]
    fn test_constant_column_is_degenerate() {
        let pairs = table(&[(0, 1, 10), (1, 1, 10)]);
        let result = test_marginal(&pairs, EffectSize::ContingencyCoefficient);
        assert!(result.degenerate);
        assert_eq!(result.p_value, 1.0);
        assert!(result.is_independent(0.05, 0.0));
    }

    #[test]
    fn test_weak_effect_counts_as_independent() {
        // Significant but tiny association
        let result = TestResult {
            statistic: 40.0,
            degrees_of_freedom: 1.0,
            p_value: 1e-9,
            effect_size: 0.05,
            sample_size: 10_000,
            degenerate: false,
        };
        assert!(result.is_independent(0.01, 0.1));
        assert!(!result.is_independent(0.01, 0.01));
    }

    #[test]
    fn test_conditioning_explains_away() {
        // x and y both copy z: dependent marginally, independent given z
        let mut observations = Vec::new();
        for i in 0..200 {
            let z = i % 2;
            let noise = (i / 2) % 2;
            observations.push(Observation { x: z, y: z ^ (noise & (i % 7 == 0) as i64), z: vec![z] });
        }

        let pairs: Vec<(i64, i64)> = observations.iter().map(|o| (o.x, o.y)).collect();
        let marginal = test_marginal(&pairs, EffectSize::ContingencyCoefficient);
        assert!(marginal.p_value < 1e-6);

        // Within each stratum x is constant, so every stratum is degenerate
        let conditional = test_conditional(&observations, EffectSize::ContingencyCoefficient);
        assert!(conditional.degenerate);
        assert!(conditional.is_independent(0.01, 0.1));
    }

    #[test]
    fn test_stratified_detects_dependence_within_strata() {
        let mut observations = Vec::new();
        for z in 0..2 {
            for i in 0..100 {
                let x = i % 2;
                observations.push(Observation { x, y: x, z: vec![z] });
            }
        }
        let result = test_conditional(&observations, EffectSize::ContingencyCoefficient);
        assert!(!result.degenerate);
        assert_eq!(result.degrees_of_freedom, 2.0);
        assert!(result.p_value < 1e-10);
        assert!((result.effect_size - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_small_strata_are_skipped() {
        let observations = vec![
            Observation { x: 0, y: 0, z: vec![0] },
            Observation { x: 1, y: 1, z: vec![0] },
            Observation { x: 0, y: 1, z: vec![1] },
        ];
        let result = test_conditional(&observations, EffectSize::ContingencyCoefficient);
        assert!(result.degenerate);
        assert_eq!(result.sample_size, 3);
    }
}
