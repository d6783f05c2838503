//! Relpc Statistics
//!
//! Contingency-table independence tests used by skeleton identification.
//!
//! # Tests
//!
//! - **Marginal**: Pearson's chi-square test on the two-way table of `x` and `y`
//! - **Conditional**: stratified chi-square; the table is split by the joint
//!   value of the conditioning variables and the per-stratum statistics and
//!   degrees of freedom are summed
//!
//! p-values come from the chi-squared distribution in `statrs`. Effect size is
//! a pluggable [`EffectSize`] computed from the statistic, sample size and
//! table shape.
//!
//! # Degenerate data
//!
//! Tables with a single observed row or column, strata that are too small, and
//! any numerical failure never raise an error. They yield a result that cannot
//! reject independence (`p = 1`, effect `0`), which errs toward sparser
//! skeletons.
//!
//! # Examples
//!
//! ```
//! use relpc_stats::{test_marginal, EffectSize};
//!
//! let pairs: Vec<(i64, i64)> = (0..100).map(|i| (i % 2, i % 2)).collect();
//! let result = test_marginal(&pairs, EffectSize::ContingencyCoefficient);
//!
//! assert!(result.p_value < 1e-6);
//! assert!((result.effect_size - 1.0).abs() < 1e-9);
//! ```

#![warn(missing_docs)]

mod chi_square;
mod contingency;
mod effect;

pub use chi_square::{
    chi_square_test, stratified_chi_square_test, test_conditional, test_marginal, TestResult,
    MIN_STRATUM_SIZE,
};
pub use contingency::{stratify, ContingencyTable, Observation};
pub use effect::EffectSize;
