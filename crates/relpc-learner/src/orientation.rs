//! Edge orientation rules
//!
//! Rules run in priority order (collider detection, restricted existence
//! models, known non-colliders, cycle avoidance) and the whole pipeline
//! repeats until one pass changes nothing. Rules only ever orient undirected
//! edges; no edge is added to or removed from the model.
//!
//! Background edges are directed edges known before learning, such as a
//! relationship's existence causing each of its own attributes. Rules treat
//! them as adjacency and direction evidence but they are never part of the
//! learned model.

use crate::{LearnerMetrics, ModelSupport};
use petgraph::algo::has_path_connecting;
use petgraph::graph::{DiGraph, NodeIndex};
use relpc_domain::{Model, OrientationRule, Variable};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::debug;

/// Separating sets keyed by canonically ordered pair
pub(crate) type Sepsets = BTreeMap<(Variable, Variable), BTreeSet<Variable>>;

/// Canonical (sorted) key for an unordered pair
pub(crate) fn pair_key(a: &Variable, b: &Variable) -> (Variable, Variable) {
    if a <= b {
        (a.clone(), b.clone())
    } else {
        (b.clone(), a.clone())
    }
}

/// Applies the orientation rules to a model in place
pub(crate) struct Orienter<'m> {
    model: &'m mut Model,
    background: &'m mut BTreeSet<(Variable, Variable)>,
    sepsets: &'m Sepsets,
    support: &'m ModelSupport,
    metrics: &'m mut LearnerMetrics,
}

impl<'m> Orienter<'m> {
    pub(crate) fn new(
        model: &'m mut Model,
        background: &'m mut BTreeSet<(Variable, Variable)>,
        sepsets: &'m Sepsets,
        support: &'m ModelSupport,
        metrics: &'m mut LearnerMetrics,
    ) -> Self {
        Self {
            model,
            background,
            sepsets,
            support,
            metrics,
        }
    }

    /// Run the rule pipeline to a fixed point
    pub(crate) fn run(&mut self) {
        loop {
            self.metrics.record_pass();
            let cd = self.collider_detection();
            let rem = self.restricted_existence();
            let knc = self.known_non_colliders();
            let ca = self.cycle_avoidance();
            if !(cd || rem || knc || ca) {
                break;
            }
        }
    }

    fn adjacent(&self, a: &Variable, b: &Variable) -> bool {
        self.model.has_edge(a, b)
            || self.background.contains(&(a.clone(), b.clone()))
            || self.background.contains(&(b.clone(), a.clone()))
    }

    fn directed(&self, from: &Variable, to: &Variable) -> bool {
        self.model.is_directed(from, to) || self.background.contains(&(from.clone(), to.clone()))
    }

    fn sepset(&self, a: &Variable, b: &Variable) -> Option<&BTreeSet<Variable>> {
        self.sepsets.get(&pair_key(a, b))
    }

    /// Whether `a` and `b` share an existence neighbor that neither edge
    /// points away from, so that it could be their common effect
    fn common_existence_effect(&self, a: &Variable, b: &Variable) -> bool {
        let b_neighbors = self.model.neighbors(b);
        self.model.neighbors(a).into_iter().any(|e| {
            e.is_existence()
                && b_neighbors.contains(&e)
                && !self.model.is_directed(e, a)
                && !self.model.is_directed(e, b)
        })
    }

    fn orient(&mut self, cause: &Variable, effect: &Variable, rule: OrientationRule) -> bool {
        let changed = self.model.orient(cause, effect, rule);
        if changed {
            debug!("Orienting ({}) {} --> {}", rule.code(), cause, effect);
            self.metrics.record_orientation(rule);
        }
        changed
    }

    fn add_background(&mut self, cause: &Variable, effect: &Variable) -> bool {
        if self.adjacent(cause, effect) {
            return false;
        }
        let added = self.background.insert((cause.clone(), effect.clone()));
        if added {
            debug!("Adding background edge {} --> {}", cause, effect);
            self.metrics.record_background();
        }
        added
    }

    fn variables(&self) -> Vec<Variable> {
        self.model.variables().into_iter().collect()
    }

    /// X - Y - Z with X, Z non-adjacent and Y outside sepset(X, Z) becomes
    /// X --> Y <-- Z
    fn collider_detection(&mut self) -> bool {
        let mut changed = false;
        for y in self.variables() {
            let neighbors: Vec<Variable> = self.model.neighbors(&y).into_iter().cloned().collect();
            for (i, x) in neighbors.iter().enumerate() {
                for z in &neighbors[i + 1..] {
                    if self.adjacent(x, z) {
                        continue;
                    }
                    if self.common_existence_effect(x, &y) || self.common_existence_effect(&y, z) {
                        continue;
                    }
                    if self.model.is_directed(&y, x) || self.model.is_directed(&y, z) {
                        continue;
                    }
                    match self.sepset(x, z) {
                        Some(sepset) if !sepset.contains(&y) => {}
                        _ => continue,
                    }
                    changed |= self.orient(x, &y, OrientationRule::ColliderDetection);
                    changed |= self.orient(z, &y, OrientationRule::ColliderDetection);
                }
            }
        }
        changed
    }

    /// Orientations forced by relationship existence along a dependency
    fn restricted_existence(&mut self) -> bool {
        let mut triples = Vec::new();
        for dep in self.model.dependencies() {
            let (v1, v3) = dep.key();
            for e in self.support.relationships_between(&v1, &v3) {
                triples.push((v1.clone(), e, v3.clone()));
            }
        }

        let mut changed = false;
        for (v1, e, v3) in triples {
            if self.directed_either(&v1, &e) && self.directed_either(&v3, &e) && self.directed_either(&v1, &v3) {
                continue;
            }
            changed |= self.existence_case(&v1, &e, &v3);
        }
        changed
    }

    fn directed_either(&self, a: &Variable, b: &Variable) -> bool {
        self.directed(a, b) || self.directed(b, a)
    }

    fn existence_case(&mut self, v1: &Variable, e: &Variable, v3: &Variable) -> bool {
        let rule = OrientationRule::RestrictedExistence;
        match (self.adjacent(v1, e), self.adjacent(e, v3)) {
            (false, false) => {
                if self.directed(v1, v3) {
                    self.add_background(e, v3)
                } else if self.directed(v3, v1) {
                    self.add_background(e, v1)
                } else {
                    false
                }
            }
            (false, true) => {
                if self.directed(v1, v3) {
                    self.model.is_undirected(e, v3) && self.orient(e, v3, rule)
                } else if self.directed(v3, v1) {
                    self.add_background(e, v1)
                } else if self.directed(v3, e) {
                    let oriented = self.orient(v3, v1, rule);
                    self.add_background(e, v1) || oriented
                } else {
                    false
                }
            }
            (true, false) => {
                if self.directed(v3, v1) {
                    self.model.is_undirected(e, v1) && self.orient(e, v1, rule)
                } else if self.directed(v1, v3) {
                    self.add_background(e, v3)
                } else if self.directed(v1, e) {
                    let oriented = self.orient(v1, v3, rule);
                    self.add_background(e, v3) || oriented
                } else {
                    false
                }
            }
            (true, true) => {
                if self.directed(v1, e) && self.directed(v3, e) {
                    // Common existence effect; the edge stays
                    false
                } else if self.directed(v1, v3) {
                    self.model.is_undirected(e, v3) && self.orient(e, v3, rule)
                } else if self.directed(v3, v1) {
                    self.model.is_undirected(e, v1) && self.orient(e, v1, rule)
                } else if self.directed(e, v1) {
                    self.directed(v3, e) && self.orient(v3, v1, rule)
                } else if self.directed(e, v3) {
                    self.directed(v1, e) && self.orient(v1, v3, rule)
                } else {
                    false
                }
            }
        }
    }

    /// X --> Y - Z with X, Z non-adjacent and Y in sepset(X, Z) becomes
    /// Y --> Z
    fn known_non_colliders(&mut self) -> bool {
        let mut changed = false;
        for y in self.variables() {
            let mut parents: Vec<Variable> = self.model.parents(&y).into_iter().cloned().collect();
            parents.extend(self.background.iter().filter(|(_, to)| *to == y).map(|(from, _)| from.clone()));

            let undirected: Vec<Variable> = self
                .model
                .neighbors(&y)
                .into_iter()
                .filter(|z| self.model.is_undirected(&y, z))
                .cloned()
                .collect();

            for x in &parents {
                for z in &undirected {
                    if z == x || self.adjacent(x, z) || self.common_existence_effect(&y, z) {
                        continue;
                    }
                    let separates = self.sepset(x, z).map_or(false, |s| s.contains(&y));
                    if separates && self.model.is_undirected(&y, z) {
                        changed |= self.orient(&y, z, OrientationRule::KnownNonCollider);
                    }
                }
            }
        }
        changed
    }

    /// X - Y with a directed path X --> ... --> Y becomes X --> Y
    fn cycle_avoidance(&mut self) -> bool {
        let mut graph: DiGraph<Variable, ()> = DiGraph::new();
        let mut nodes: HashMap<Variable, NodeIndex> = HashMap::new();
        let mut node = |graph: &mut DiGraph<Variable, ()>, v: &Variable| {
            *nodes.entry(v.clone()).or_insert_with(|| graph.add_node(v.clone()))
        };

        let mut undirected = Vec::new();
        for dep in self.model.dependencies() {
            match (dep.cause(), dep.effect()) {
                (Some(c), Some(e)) => {
                    let (c, e) = (node(&mut graph, c), node(&mut graph, e));
                    graph.add_edge(c, e, ());
                }
                _ => undirected.push(dep.key()),
            }
        }
        for (c, e) in self.background.iter() {
            let (c, e) = (node(&mut graph, c), node(&mut graph, e));
            graph.add_edge(c, e, ());
        }

        let mut changed = false;
        for (a, b) in undirected {
            let (ia, ib) = (node(&mut graph, &a), node(&mut graph, &b));
            let (cause, effect, edge) = if has_path_connecting(&graph, ia, ib, None) {
                (&a, &b, (ia, ib))
            } else if has_path_connecting(&graph, ib, ia, None) {
                (&b, &a, (ib, ia))
            } else {
                continue;
            };
            if self.orient(cause, effect, OrientationRule::CycleAvoidance) {
                graph.add_edge(edge.0, edge.1, ());
                changed = true;
            }
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Session;
    use relpc_domain::{Dependency, IndependenceConstraint, RelationalData, Schema};

    fn var(name: &str) -> Variable {
        name.parse().unwrap()
    }

    fn support() -> ModelSupport {
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
        Session::from_data("star", data).model_support(2).unwrap()
    }

    fn constraint(a: &str, b: &str, z: &[&str]) -> IndependenceConstraint {
        IndependenceConstraint {
            first: var(a),
            second: var(b),
            conditioning: z.iter().map(|v| var(v)).collect(),
            statistic: 0.0,
            p_value: 1.0,
            effect_size: 0.0,
        }
    }

    fn sepsets(model: &Model) -> Sepsets {
        model
            .constraints()
            .iter()
            .map(|c| (pair_key(&c.first, &c.second), c.conditioning.iter().cloned().collect()))
            .collect()
    }

    fn run(model: &mut Model, background: &mut BTreeSet<(Variable, Variable)>) -> LearnerMetrics {
        let support = support();
        let sepsets = sepsets(model);
        let mut metrics = LearnerMetrics::new();
        Orienter::new(model, background, &sepsets, &support, &mut metrics).run();
        metrics
    }

    #[test]
    fn test_collider_detected() {
        let mut model = Model::from_dependencies([
            Dependency::undirected(var("x.value"), var("y.value")),
            Dependency::undirected(var("z.value"), var("y.value")),
        ]);
        model.add_constraint(constraint("x.value", "z.value", &[]));
        let metrics = run(&mut model, &mut BTreeSet::new());

        assert!(model.is_directed(&var("x.value"), &var("y.value")));
        assert!(model.is_directed(&var("z.value"), &var("y.value")));
        assert_eq!(metrics.orientations[&OrientationRule::ColliderDetection], 2);
    }

    #[test]
    fn test_non_collider_left_alone_then_propagated() {
        // x - y - z with y separating x and z, plus a known cause w --> x
        let mut model = Model::from_dependencies([
            Dependency::undirected(var("x.value"), var("y.value")),
            Dependency::undirected(var("y.value"), var("z.value")),
        ]);
        model.add_constraint(constraint("x.value", "z.value", &["y.value"]));
        run(&mut model, &mut BTreeSet::new());
        assert_eq!(model.oriented_count(), 0);

        let mut model = Model::from_dependencies([
            Dependency::directed(var("x.value"), var("y.value")),
            Dependency::undirected(var("y.value"), var("z.value")),
        ]);
        model.add_constraint(constraint("x.value", "z.value", &["y.value"]));
        run(&mut model, &mut BTreeSet::new());
        let dep = model.dependency(&var("y.value"), &var("z.value")).unwrap();
        assert!(dep.points(&var("y.value"), &var("z.value")));
        assert_eq!(dep.rule, Some(OrientationRule::KnownNonCollider));
    }

    #[test]
    fn test_cycle_avoidance() {
        let mut model = Model::from_dependencies([
            Dependency::directed(var("x.value"), var("y.value")),
            Dependency::directed(var("y.value"), var("z.value")),
            Dependency::undirected(var("x.value"), var("z.value")),
        ]);
        run(&mut model, &mut BTreeSet::new());
        let dep = model.dependency(&var("x.value"), &var("z.value")).unwrap();
        assert!(dep.points(&var("x.value"), &var("z.value")));
        assert_eq!(dep.rule, Some(OrientationRule::CycleAvoidance));
    }

    #[test]
    fn test_background_edges_give_direction() {
        // XY --> y.value is known; y.value - z.value with XY _||_ z.value | y.value
        let mut model = Model::from_dependencies([Dependency::undirected(var("y.value"), var("z.value"))]);
        model.add_constraint(constraint("XY", "z.value", &["y.value"]));
        let mut background = BTreeSet::from([(var("XY"), var("y.value"))]);
        run(&mut model, &mut background);
        assert!(model.is_directed(&var("y.value"), &var("z.value")));
        assert_eq!(model.edge_count(), 1);
    }

    #[test]
    fn test_restricted_existence_adds_background() {
        // x.value --> y.value with no XY dependency learned
        let mut model = Model::from_dependencies([Dependency::directed(var("x.value"), var("y.value"))]);
        let mut background = BTreeSet::new();
        run(&mut model, &mut background);
        assert!(background.contains(&(var("XY"), var("y.value"))));
        assert_eq!(model.edge_count(), 1);
    }

    #[test]
    fn test_restricted_existence_orients_existence_edge() {
        // x.value --> y.value and XY - y.value
        let mut model = Model::from_dependencies([
            Dependency::directed(var("x.value"), var("y.value")),
            Dependency::undirected(var("XY"), var("y.value")),
        ]);
        run(&mut model, &mut BTreeSet::new());
        let dep = model.dependency(&var("XY"), &var("y.value")).unwrap();
        assert!(dep.points(&var("XY"), &var("y.value")));
        assert_eq!(dep.rule, Some(OrientationRule::RestrictedExistence));
    }

    #[test]
    fn test_orientation_is_idempotent() {
        let mut model = Model::from_dependencies([
            Dependency::undirected(var("x.value"), var("y.value")),
            Dependency::undirected(var("z.value"), var("y.value")),
        ]);
        model.add_constraint(constraint("x.value", "z.value", &[]));
        let mut background = BTreeSet::new();
        run(&mut model, &mut background);
        let first = model.clone();
        let first_background = background.clone();

        let metrics = run(&mut model, &mut background);
        assert_eq!(model, first);
        assert_eq!(background, first_background);
        assert_eq!(metrics.total_orientations(), 0);
        assert_eq!(metrics.passes, 1);
    }
}
