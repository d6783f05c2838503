//! Effect-size measures derived from a chi-square statistic

use serde::{Deserialize, Serialize};

/// How strength of association is measured
///
/// Every measure is monotonically non-decreasing in the statistic for a fixed
/// sample size and table shape, and lies in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectSize {
    /// Pearson's contingency coefficient normalized by its maximum for the
    /// table shape
    #[default]
    ContingencyCoefficient,

    /// Cramér's V
    CramersV,
}

impl EffectSize {
    /// Compute the effect size
    ///
    /// Returns 0 for empty or degenerate inputs and for any non-finite result.
    pub fn compute(&self, statistic: f64, sample_size: f64, rows: usize, cols: usize) -> f64 {
        let r = rows.min(cols) as f64;
        if sample_size <= 0.0 || r < 2.0 || !statistic.is_finite() || statistic <= 0.0 {
            return 0.0;
        }

        let value = match self {
            EffectSize::ContingencyCoefficient => {
                let c = (statistic / (sample_size + statistic)).sqrt();
                let c_max = ((r - 1.0) / r).sqrt();
                c / c_max
            }
            EffectSize::CramersV => (statistic / (sample_size * (r - 1.0))).sqrt(),
        };

        if value.is_finite() {
            value.clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}
