//! The learned (or ground-truth) model: dependencies plus constraints

use crate::constraint::IndependenceConstraint;
use crate::dependency::{Dependency, OrientationRule};
use crate::unit::Variable;
use std::collections::{BTreeSet, HashMap};

/// Dependencies and independence constraints over a set of variables
///
/// Both sequences preserve discovery order. The model is a plain value:
/// cloning it yields an independent snapshot.
///
/// # Examples
///
/// ```
/// use relpc_domain::{Dependency, Model, Variable};
///
/// let a = Variable::value("a", "value");
/// let b = Variable::value("b", "value");
/// let model = Model::from_dependencies([Dependency::directed(a.clone(), b.clone())]);
///
/// assert!(model.is_directed(&a, &b));
/// assert_eq!(model.parents(&b), vec![&a]);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Model {
    dependencies: Vec<Dependency>,
    constraints: Vec<IndependenceConstraint>,
    index: HashMap<(Variable, Variable), usize>,
}

fn pair(a: &Variable, b: &Variable) -> (Variable, Variable) {
    if a <= b {
        (a.clone(), b.clone())
    } else {
        (b.clone(), a.clone())
    }
}

impl Model {
    /// Create an empty model
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a model from dependencies; later duplicates of a pair are ignored
    pub fn from_dependencies(dependencies: impl IntoIterator<Item = Dependency>) -> Self {
        let mut model = Self::new();
        for dep in dependencies {
            model.add_dependency(dep);
        }
        model
    }

    /// Add a dependency; returns false if the pair is already connected
    pub fn add_dependency(&mut self, dependency: Dependency) -> bool {
        let key = dependency.key();
        if self.index.contains_key(&key) {
            return false;
        }
        self.index.insert(key, self.dependencies.len());
        self.dependencies.push(dependency);
        true
    }

    /// Record an independence constraint
    pub fn add_constraint(&mut self, constraint: IndependenceConstraint) {
        self.constraints.push(constraint);
    }

    /// Dependencies in discovery order
    pub fn dependencies(&self) -> &[Dependency] {
        &self.dependencies
    }

    /// Constraints in discovery order
    pub fn constraints(&self) -> &[IndependenceConstraint] {
        &self.constraints
    }

    /// The dependency joining `a` and `b`, if any
    pub fn dependency(&self, a: &Variable, b: &Variable) -> Option<&Dependency> {
        self.index.get(&pair(a, b)).map(|&i| &self.dependencies[i])
    }

    /// The first constraint recorded for the pair, if any
    pub fn constraint(&self, a: &Variable, b: &Variable) -> Option<&IndependenceConstraint> {
        self.constraints.iter().find(|c| c.separates(a, b))
    }

    /// Whether `a` and `b` are adjacent
    pub fn has_edge(&self, a: &Variable, b: &Variable) -> bool {
        self.index.contains_key(&pair(a, b))
    }

    /// Whether the edge `from --> to` exists
    pub fn is_directed(&self, from: &Variable, to: &Variable) -> bool {
        self.dependency(from, to).map(|d| d.points(from, to)).unwrap_or(false)
    }

    /// Whether `a` and `b` are joined by an undirected edge
    pub fn is_undirected(&self, a: &Variable, b: &Variable) -> bool {
        self.dependency(a, b).map(|d| !d.is_directed()).unwrap_or(false)
    }

    /// Adjacent variables in sorted order
    pub fn neighbors(&self, v: &Variable) -> Vec<&Variable> {
        let mut out: Vec<&Variable> = self.dependencies.iter().filter_map(|d| d.other(v)).collect();
        out.sort();
        out
    }

    /// Variables with an edge directed into `v`
    pub fn parents(&self, v: &Variable) -> Vec<&Variable> {
        let mut out: Vec<&Variable> = self
            .dependencies
            .iter()
            .filter(|d| d.effect() == Some(v))
            .filter_map(|d| d.cause())
            .collect();
        out.sort();
        out
    }

    /// Variables with an edge directed out of `v`
    pub fn children(&self, v: &Variable) -> Vec<&Variable> {
        let mut out: Vec<&Variable> = self
            .dependencies
            .iter()
            .filter(|d| d.cause() == Some(v))
            .filter_map(|d| d.effect())
            .collect();
        out.sort();
        out
    }

    /// Number of edges touching `v`
    pub fn degree(&self, v: &Variable) -> usize {
        self.dependencies.iter().filter(|d| d.other(v).is_some()).count()
    }

    /// Orient the edge between `cause` and `effect` as `cause --> effect`
    ///
    /// Returns true only if an undirected edge was oriented.
    pub fn orient(&mut self, cause: &Variable, effect: &Variable, rule: OrientationRule) -> bool {
        match self.index.get(&pair(cause, effect)) {
            Some(&i) => self.dependencies[i].orient(cause, rule),
            None => false,
        }
    }

    /// Every variable mentioned by a dependency or constraint
    pub fn variables(&self) -> BTreeSet<Variable> {
        let mut vars = BTreeSet::new();
        for dep in &self.dependencies {
            vars.insert(dep.source.clone());
            vars.insert(dep.target.clone());
        }
        for c in &self.constraints {
            vars.insert(c.first.clone());
            vars.insert(c.second.clone());
        }
        vars
    }

    /// Number of edges
    pub fn edge_count(&self) -> usize {
        self.dependencies.len()
    }

    /// Number of directed edges
    pub fn oriented_count(&self) -> usize {
        self.dependencies.iter().filter(|d| d.is_directed()).count()
    }

    /// Number of undirected edges
    pub fn undirected_count(&self) -> usize {
        self.edge_count() - self.oriented_count()
    }

    /// Render the model as a Graphviz digraph
    ///
    /// Undirected edges are drawn with `dir=none`; oriented edges are labelled
    /// with the rule that oriented them.
    pub fn to_dot(&self, name: &str) -> String {
        let mut lines = vec![format!("digraph \"{}\" {{", name)];
        for var in self.dependencies.iter().flat_map(|d| [&d.source, &d.target]).collect::<BTreeSet<_>>() {
            lines.push(format!("  \"{}\";", var));
        }
        for dep in &self.dependencies {
            match (dep.cause(), dep.effect()) {
                (Some(cause), Some(effect)) => {
                    let label = dep.rule.map(|r| format!(" [label=\"{}\"]", r)).unwrap_or_default();
                    lines.push(format!("  \"{}\" -> \"{}\"{};", cause, effect, label));
                }
                _ => lines.push(format!("  \"{}\" -> \"{}\" [dir=none];", dep.source, dep.target)),
            }
        }
        lines.push("}".to_string());
        lines.join("\n")
    }
}
