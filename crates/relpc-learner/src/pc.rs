//! The Relational PC learner

use crate::config::{validate_significance, validate_strength};
use crate::orientation::{pair_key, Orienter, Sepsets};
use crate::skeleton::{search_pair, PairLog, PairOutcome};
use crate::{IndependenceTest, LearnerConfig, LearnerError, LearnerMetrics, ModelSupport, RelationalChiSquare};
use rayon::prelude::*;
use relpc_domain::{Dependency, IndependenceConstraint, Model, Variable};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Initial,
    Skeleton,
    Oriented,
}

/// Relational PC structure learner
///
/// Learning happens in two phases. [`identify_skeleton`](Self::identify_skeleton)
/// removes every candidate dependency that some conditioning set renders
/// independent, and [`orient_edges`](Self::orient_edges) then directs the
/// surviving edges.
///
/// # Examples
///
/// ```no_run
/// use relpc_learner::{RelationalPc, Session};
/// use relpc_store::SqliteSource;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let mut source = SqliteSource::open("chain.db")?;
/// source.load_schema("chain")?;
/// let session = Session::open("chain", &source)?;
/// let support = session.model_support(2)?;
///
/// let mut pc = RelationalPc::new(&support);
/// pc.set_significance_threshold_adjust(0.01)?;
/// pc.set_strength_of_effect_threshold(0.1)?;
/// pc.identify_skeleton(2)?;
/// pc.orient_edges()?;
///
/// for dep in pc.dependencies() {
///     println!("{}", dep);
/// }
/// # Ok(())
/// # }
/// ```
pub struct RelationalPc<'a, T = RelationalChiSquare<'a>> {
    support: &'a ModelSupport,
    test: T,
    significance: Option<f64>,
    strength: Option<f64>,
    parallel: bool,
    check_out_of_range: bool,
    phase: Phase,
    model: Model,
    background: BTreeSet<(Variable, Variable)>,
    test_log: BTreeMap<(Variable, Variable), PairLog>,
    metrics: LearnerMetrics,
}

impl<'a> RelationalPc<'a, RelationalChiSquare<'a>> {
    /// Learner using the relational chi-square test
    pub fn new(support: &'a ModelSupport) -> Self {
        Self::with_test(support, RelationalChiSquare::new(support))
    }

    /// Learner configured from a [`LearnerConfig`], thresholds included
    pub fn from_config(support: &'a ModelSupport, config: &LearnerConfig) -> Result<Self, LearnerError> {
        config.validate()?;
        let test = RelationalChiSquare::new(support)
            .with_effect_size(config.effect_size)
            .with_count_cap(config.existence_count_cap);

        let mut pc = Self::with_test(support, test);
        pc.set_significance_threshold_adjust(config.significance_threshold)?;
        pc.set_strength_of_effect_threshold(config.strength_of_effect_threshold)?;
        pc.set_parallel(config.parallel);
        pc.set_check_out_of_range(config.check_out_of_range);
        Ok(pc)
    }
}

impl<'a, T: IndependenceTest> RelationalPc<'a, T> {
    /// Learner using a custom independence test
    pub fn with_test(support: &'a ModelSupport, test: T) -> Self {
        Self {
            support,
            test,
            significance: None,
            strength: None,
            parallel: true,
            check_out_of_range: true,
            phase: Phase::Initial,
            model: Model::new(),
            background: BTreeSet::new(),
            test_log: BTreeMap::new(),
            metrics: LearnerMetrics::new(),
        }
    }

    /// Set the family-wise significance level
    ///
    /// Each test runs at `alpha` divided by the number of candidate pairs.
    pub fn set_significance_threshold_adjust(&mut self, alpha: f64) -> Result<(), LearnerError> {
        validate_significance(alpha)?;
        let pairs = self.support.candidate_pairs().len().max(1);
        self.significance = Some(alpha / pairs as f64);
        debug!("Per-test significance {} over {} candidate pairs", alpha / pairs as f64, pairs);
        Ok(())
    }

    /// Set the effect size at or below which a dependency is dropped
    pub fn set_strength_of_effect_threshold(&mut self, threshold: f64) -> Result<(), LearnerError> {
        validate_strength(threshold)?;
        self.strength = Some(threshold);
        Ok(())
    }

    /// Run the tests of a depth level on the rayon pool
    pub fn set_parallel(&mut self, parallel: bool) {
        self.parallel = parallel;
    }

    /// Enable or disable the out-of-range constraint search
    pub fn set_check_out_of_range(&mut self, enabled: bool) {
        self.check_out_of_range = enabled;
    }

    /// Per-test significance level, after correction
    pub fn significance_level(&self) -> Option<f64> {
        self.significance
    }

    /// Strength-of-effect threshold
    pub fn strength_of_effect_threshold(&self) -> Option<f64> {
        self.strength
    }

    fn thresholds(&self) -> Result<(f64, f64), LearnerError> {
        match (self.significance, self.strength) {
            (Some(alpha), Some(strength)) => Ok((alpha, strength)),
            (None, _) => Err(LearnerError::Configuration(
                "Significance threshold must be set before identifying the skeleton".to_string(),
            )),
            (_, None) => Err(LearnerError::Configuration(
                "Strength of effect threshold must be set before identifying the skeleton".to_string(),
            )),
        }
    }

    /// Phase I: find the undirected skeleton
    ///
    /// Conditioning sets of size `0..=depth` are drawn from the current
    /// neighbors of each pair. All decisions at one depth are collected
    /// before any is applied, so the result does not depend on parallelism.
    pub fn identify_skeleton(&mut self, depth: usize) -> Result<(), LearnerError> {
        if self.phase != Phase::Initial {
            return Err(LearnerError::Configuration("Skeleton has already been identified".to_string()));
        }
        let (alpha, strength) = self.thresholds()?;

        let mut remaining: BTreeSet<(Variable, Variable)> = self.support.candidate_pairs().into_iter().collect();
        info!(
            "Identifying skeleton over {} candidate pairs (depth {}, alpha {:.3e}, strength {})",
            remaining.len(),
            depth,
            alpha,
            strength
        );
        if remaining.is_empty() {
            warn!("No candidate dependencies within hop threshold {}", self.support.hop_threshold());
        }

        for level in 0..=depth {
            let adjacency = adjacency(&remaining);
            let work: Vec<(Variable, Variable, Vec<Variable>)> = remaining
                .iter()
                .filter_map(|(x, y)| {
                    let pool = conditioning_pool(&adjacency, x, y);
                    (pool.len() >= level).then(|| (x.clone(), y.clone(), pool))
                })
                .collect();
            if work.is_empty() {
                debug!("No pair has {} conditioning candidates; stopping", level);
                break;
            }

            let test = &self.test;
            let run = |(x, y, pool): &(Variable, Variable, Vec<Variable>)| {
                search_pair(test, x, y, pool, level, alpha, strength)
            };
            let outcomes: Vec<PairOutcome> = if self.parallel {
                work.par_iter().map(run).collect()
            } else {
                work.iter().map(run).collect()
            };

            let mut removed = 0;
            for ((x, y, _), outcome) in work.iter().zip(outcomes) {
                self.metrics.record_tests(level, outcome.tests);
                if let Some(last) = outcome.last {
                    self.test_log.entry((x.clone(), y.clone())).or_default().record(level, last);
                }
                if let Some((conditioning, result)) = outcome.separated_by {
                    debug!(
                        "Removing {} --- {} at depth {} given {:?}",
                        x,
                        y,
                        level,
                        conditioning.iter().map(|v| v.to_string()).collect::<Vec<_>>()
                    );
                    remaining.remove(&(x.clone(), y.clone()));
                    self.model.add_constraint(IndependenceConstraint {
                        first: x.clone(),
                        second: y.clone(),
                        conditioning,
                        statistic: result.statistic,
                        p_value: result.p_value,
                        effect_size: result.effect_size,
                    });
                    self.metrics.record_removal(level);
                    removed += 1;
                }
            }
            info!("Depth {}: tested {} pairs, removed {}", level, work.len(), removed);
        }

        for (x, y) in remaining {
            self.model.add_dependency(Dependency::undirected(x, y));
        }

        if self.check_out_of_range {
            self.out_of_range_constraints(alpha, strength);
        }

        self.phase = Phase::Skeleton;
        info!(
            "Skeleton identified: {} dependencies, {} constraints",
            self.model.edge_count(),
            self.model.constraints().len()
        );
        Ok(())
    }

    /// Search for separating sets between skeleton variables that are too far
    /// apart to be candidates but close enough to share a neighbor
    fn out_of_range_constraints(&mut self, alpha: f64, strength: f64) {
        let threshold = self.support.hop_threshold();
        let mut found = Vec::new();

        for v2 in self.model.variables() {
            let neighbors = self.model.neighbors(&v2);
            for (i, v1) in neighbors.iter().enumerate() {
                for v3 in &neighbors[i + 1..] {
                    if self.model.has_edge(v1, v3) || self.model.constraint(v1, v3).is_some() {
                        continue;
                    }
                    if found.iter().any(|c: &IndependenceConstraint| c.separates(v1, v3)) {
                        continue;
                    }
                    match self.support.variable_distance(v1, v3) {
                        Some(d) if d > threshold && d <= 2 * threshold => {}
                        _ => continue,
                    }

                    let candidates = [Vec::new(), vec![v2.clone()]];
                    for conditioning in candidates {
                        let results = self.test.test(v1, v3, &conditioning);
                        if results.iter().all(|r| r.is_independent(alpha, strength)) {
                            let summary = crate::skeleton::strongest(&results)
                                .unwrap_or_else(|| relpc_stats::TestResult::degenerate(0));
                            found.push(IndependenceConstraint {
                                first: (*v1).clone(),
                                second: (*v3).clone(),
                                conditioning,
                                statistic: summary.statistic,
                                p_value: summary.p_value,
                                effect_size: summary.effect_size,
                            });
                            break;
                        }
                    }
                }
            }
        }

        for constraint in found {
            debug!("Out-of-range constraint {}", constraint);
            self.metrics.record_out_of_range();
            self.model.add_constraint(constraint);
        }
    }

    /// Phase II: orient the skeleton's edges
    ///
    /// Running it again on an oriented model changes nothing.
    pub fn orient_edges(&mut self) -> Result<(), LearnerError> {
        if self.phase == Phase::Initial {
            return Err(LearnerError::Configuration(
                "Skeleton must be identified before orienting edges".to_string(),
            ));
        }

        if self.phase == Phase::Skeleton {
            self.background = self.support.trivial_dependencies().into_iter().collect();
        }

        let sepsets = self.sepsets();
        let mut orienter = Orienter::new(
            &mut self.model,
            &mut self.background,
            &sepsets,
            self.support,
            &mut self.metrics,
        );
        orienter.run();

        self.phase = Phase::Oriented;
        info!(
            "Oriented {} of {} dependencies",
            self.model.oriented_count(),
            self.model.edge_count()
        );
        Ok(())
    }

    /// Witnessing sets plus the relationships on each pair's schema path
    fn sepsets(&self) -> Sepsets {
        let mut sepsets = Sepsets::new();
        for c in self.model.constraints() {
            let set = sepsets.entry(pair_key(&c.first, &c.second)).or_default();
            set.extend(c.conditioning.iter().cloned());
            set.extend(self.support.relationships_between(&c.first, &c.second));
        }
        sepsets
    }

    /// A snapshot of the learned model
    pub fn model(&self) -> Model {
        self.model.clone()
    }

    /// Independence constraints in discovery order
    pub fn constraints(&self) -> &[IndependenceConstraint] {
        self.model.constraints()
    }

    /// Dependencies in discovery order
    pub fn dependencies(&self) -> &[Dependency] {
        self.model.dependencies()
    }

    /// Skeleton test outcomes per candidate pair
    pub fn test_log(&self) -> &BTreeMap<(Variable, Variable), PairLog> {
        &self.test_log
    }

    /// Background edges used during orientation
    pub fn background(&self) -> &BTreeSet<(Variable, Variable)> {
        &self.background
    }

    /// Run metrics
    pub fn metrics(&self) -> &LearnerMetrics {
        &self.metrics
    }

    /// The model support the learner runs over
    pub fn support(&self) -> &'a ModelSupport {
        self.support
    }
}

fn adjacency(pairs: &BTreeSet<(Variable, Variable)>) -> BTreeMap<&Variable, BTreeSet<&Variable>> {
    let mut adjacency: BTreeMap<&Variable, BTreeSet<&Variable>> = BTreeMap::new();
    for (x, y) in pairs {
        adjacency.entry(x).or_default().insert(y);
        adjacency.entry(y).or_default().insert(x);
    }
    adjacency
}

/// Current neighbors of `x` or `y`, excluding the pair itself, sorted
fn conditioning_pool(
    adjacency: &BTreeMap<&Variable, BTreeSet<&Variable>>,
    x: &Variable,
    y: &Variable,
) -> Vec<Variable> {
    let mut pool: BTreeSet<&Variable> = BTreeSet::new();
    for v in [x, y] {
        if let Some(neighbors) = adjacency.get(v) {
            pool.extend(neighbors.iter().copied());
        }
    }
    pool.remove(x);
    pool.remove(y);
    pool.into_iter().cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DSeparationOracle, Session};
    use relpc_domain::{OrientationRule, RelationalData, Schema};

    fn var(name: &str) -> Variable {
        name.parse().unwrap()
    }

    /// A collider x --> y <-- z over a star schema
    fn collider_session() -> Session {
        let schema = Schema::new("star")
            .with_entity("x", &["value"])
            .with_entity("y", &["value"])
            .with_entity("z", &["value"])
            .with_relationship("XY", "x", "y", &[])
            .with_relationship("ZY", "z", "y", &[]);
        let mut data = RelationalData::new(schema);
        for t in ["x", "y", "z"] {
            let item = data.add_entity(t, 1).unwrap();
            data.set_value(&item, "value", 0).unwrap();
        }
        data.add_relationship("XY", 1, 1, 1).unwrap();
        data.add_relationship("ZY", 1, 1, 1).unwrap();
        Session::from_data("star", data)
    }

    fn collider_truth() -> Model {
        Model::from_dependencies([
            Dependency::directed(var("x.value"), var("y.value")),
            Dependency::directed(var("z.value"), var("y.value")),
        ])
    }

    fn oracle_pc(support: &ModelSupport) -> RelationalPc<'_, DSeparationOracle> {
        let mut pc = RelationalPc::with_test(support, DSeparationOracle::new(&collider_truth()));
        pc.set_significance_threshold_adjust(0.05).unwrap();
        pc.set_strength_of_effect_threshold(0.1).unwrap();
        pc
    }

    #[test]
    fn test_thresholds_required() {
        let session = collider_session();
        let support = session.model_support(2).unwrap();
        let mut pc = RelationalPc::new(&support);
        assert!(matches!(pc.identify_skeleton(1), Err(LearnerError::Configuration(_))));

        pc.set_significance_threshold_adjust(0.01).unwrap();
        assert!(pc.identify_skeleton(1).is_err());
        assert!(pc.set_strength_of_effect_threshold(1.5).is_err());
        assert!(pc.set_significance_threshold_adjust(0.0).is_err());
    }

    #[test]
    fn test_bonferroni_adjustment() {
        let session = collider_session();
        let support = session.model_support(2).unwrap();
        let pairs = support.candidate_pairs().len() as f64;
        let mut pc = RelationalPc::new(&support);
        pc.set_significance_threshold_adjust(0.05).unwrap();
        assert!((pc.significance_level().unwrap() - 0.05 / pairs).abs() < 1e-12);
    }

    #[test]
    fn test_orient_requires_skeleton() {
        let session = collider_session();
        let support = session.model_support(2).unwrap();
        let mut pc = oracle_pc(&support);
        assert!(matches!(pc.orient_edges(), Err(LearnerError::Configuration(_))));
    }

    #[test]
    fn test_skeleton_runs_once() {
        let session = collider_session();
        let support = session.model_support(2).unwrap();
        let mut pc = oracle_pc(&support);
        pc.identify_skeleton(1).unwrap();
        assert!(pc.identify_skeleton(1).is_err());
    }

    #[test]
    fn test_oracle_recovers_collider() {
        let session = collider_session();
        let support = session.model_support(2).unwrap();
        let mut pc = oracle_pc(&support);
        pc.identify_skeleton(2).unwrap();

        let skeleton = pc.model();
        assert_eq!(skeleton.edge_count(), 2);
        assert!(skeleton.has_edge(&var("x.value"), &var("y.value")));
        assert!(skeleton.has_edge(&var("y.value"), &var("z.value")));
        assert!(pc.constraints().iter().any(|c| c.separates(&var("x.value"), &var("z.value"))));

        pc.orient_edges().unwrap();
        let model = pc.model();
        assert!(model.is_directed(&var("x.value"), &var("y.value")));
        assert!(model.is_directed(&var("z.value"), &var("y.value")));
        assert_eq!(
            model.dependency(&var("x.value"), &var("y.value")).unwrap().rule,
            Some(OrientationRule::ColliderDetection)
        );

        // Same edges, only orientation differs
        let before: BTreeSet<_> = skeleton.dependencies().iter().map(|d| d.key()).collect();
        let after: BTreeSet<_> = model.dependencies().iter().map(|d| d.key()).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_orientation_rerun_is_noop() {
        let session = collider_session();
        let support = session.model_support(2).unwrap();
        let mut pc = oracle_pc(&support);
        pc.identify_skeleton(2).unwrap();
        pc.orient_edges().unwrap();
        let first = pc.model();
        let oriented = pc.metrics().total_orientations();

        pc.orient_edges().unwrap();
        assert_eq!(pc.model(), first);
        assert_eq!(pc.metrics().total_orientations(), oriented);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let session = collider_session();
        let support = session.model_support(2).unwrap();

        let mut parallel = oracle_pc(&support);
        parallel.identify_skeleton(2).unwrap();

        let mut sequential = oracle_pc(&support);
        sequential.set_parallel(false);
        sequential.identify_skeleton(2).unwrap();

        assert_eq!(parallel.model(), sequential.model());
    }

    #[test]
    fn test_conditioning_pool() {
        let pairs: BTreeSet<(Variable, Variable)> = [
            (var("a.value"), var("b.value")),
            (var("b.value"), var("c.value")),
            (var("a.value"), var("d.value")),
        ]
        .into_iter()
        .collect();
        let adjacency = adjacency(&pairs);
        let pool = conditioning_pool(&adjacency, &var("a.value"), &var("b.value"));
        assert_eq!(pool, vec![var("c.value"), var("d.value")]);
    }
}
