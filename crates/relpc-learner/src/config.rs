//! Configuration for structure learning
//!
//! Defines the relational neighborhood size, search depth and the two
//! thresholds that decide when an edge is removed.

use crate::LearnerError;
use relpc_stats::EffectSize;
use serde::{Deserialize, Serialize};

/// Configuration for a Relational PC run
///
/// # Examples
///
/// ```
/// use relpc_learner::LearnerConfig;
///
/// // Default configuration (balanced)
/// let config = LearnerConfig::default();
/// assert_eq!(config.hop_threshold, 2);
///
/// // Strict: fewer, stronger dependencies
/// let config = LearnerConfig::strict();
/// assert!(config.significance_threshold < LearnerConfig::default().significance_threshold);
///
/// // Exploratory: keeps weaker dependencies
/// let config = LearnerConfig::exploratory();
/// assert_eq!(config.depth, 3);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearnerConfig {
    /// Maximum relationship traversals between a dependency's endpoints
    /// Default: 2 (one relationship away)
    pub hop_threshold: i64,

    /// Largest conditioning set explored during skeleton identification
    /// Default: 2
    pub depth: usize,

    /// Family-wise significance level, divided across candidate pairs
    /// Default: 0.01
    pub significance_threshold: f64,

    /// Effect size at or below which a dependency is negligible
    /// Default: 0.1
    pub strength_of_effect_threshold: f64,

    /// Effect-size measure
    #[serde(default)]
    pub effect_size: EffectSize,

    /// Run the tests of one depth level in parallel
    #[serde(default = "default_true")]
    pub parallel: bool,

    /// Look for separating sets between dependencies beyond the hop threshold
    #[serde(default = "default_true")]
    pub check_out_of_range: bool,

    /// Relationship counts above this value are pooled into one category
    #[serde(default = "default_count_cap")]
    pub existence_count_cap: i64,
}

fn default_true() -> bool {
    true
}

fn default_count_cap() -> i64 {
    4
}

impl Default for LearnerConfig {
    /// Settings of the reference chain experiment
    ///
    /// - Hop threshold: 2
    /// - Depth: 2
    /// - Significance: 0.01 before correction
    /// - Strength of effect: 0.1
    fn default() -> Self {
        Self {
            hop_threshold: 2,
            depth: 2,
            significance_threshold: 0.01,
            strength_of_effect_threshold: 0.1,
            effect_size: EffectSize::default(),
            parallel: true,
            check_out_of_range: true,
            existence_count_cap: default_count_cap(),
        }
    }
}

impl LearnerConfig {
    /// Strict configuration: a lower significance level and a higher strength
    /// threshold produce sparser skeletons
    pub fn strict() -> Self {
        Self {
            significance_threshold: 0.001,
            strength_of_effect_threshold: 0.2,
            ..Self::default()
        }
    }

    /// Exploratory configuration: deeper search that keeps weaker effects
    pub fn exploratory() -> Self {
        Self {
            depth: 3,
            significance_threshold: 0.05,
            strength_of_effect_threshold: 0.05,
            ..Self::default()
        }
    }

    /// Parse a configuration from TOML text
    pub fn from_toml_str(contents: &str) -> Result<Self, LearnerError> {
        let config: Self = toml::from_str(contents)
            .map_err(|e| LearnerError::Configuration(format!("Invalid learner config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Check every field is in range
    pub fn validate(&self) -> Result<(), LearnerError> {
        if self.hop_threshold < 0 {
            return Err(LearnerError::Configuration(format!(
                "Hop threshold must be non-negative, got {}",
                self.hop_threshold
            )));
        }
        validate_significance(self.significance_threshold)?;
        validate_strength(self.strength_of_effect_threshold)?;
        if self.existence_count_cap < 1 {
            return Err(LearnerError::Configuration(format!(
                "Existence count cap must be at least 1, got {}",
                self.existence_count_cap
            )));
        }
        Ok(())
    }
}

pub(crate) fn validate_significance(alpha: f64) -> Result<(), LearnerError> {
    if !(alpha > 0.0 && alpha <= 1.0) {
        return Err(LearnerError::Configuration(format!(
            "Significance threshold must be in (0, 1], got {}",
            alpha
        )));
    }
    Ok(())
}

pub(crate) fn validate_strength(threshold: f64) -> Result<(), LearnerError> {
    if !(0.0..1.0).contains(&threshold) {
        return Err(LearnerError::Configuration(format!(
            "Strength of effect threshold must be in [0, 1), got {}",
            threshold
        )));
    }
    Ok(())
}
