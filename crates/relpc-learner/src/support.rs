//! Relational neighborhood index
//!
//! `ModelSupport` answers every structural question the learner asks: which
//! items lie within a number of hops of an item, how far apart two item types
//! are in the schema, which variable pairs are candidate dependencies, and
//! which relationships connect them.

use crate::{LearnerError, Session};
use relpc_domain::{Attribute, ItemRef, Schema, Unit, Variable};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use tracing::{debug, info};

/// Index of items, units and relational neighborhoods
///
/// Neighborhoods are precomputed by breadth-first search out to the join
/// horizon (twice the hop threshold), which covers both the public
/// [`neighbors_within_hops`](Self::neighbors_within_hops) queries and the
/// aggregation of conditioning variables. Changing the hop threshold rebuilds
/// them.
#[derive(Debug, Clone)]
pub struct ModelSupport {
    schema: Schema,
    hop_threshold: usize,
    items: Vec<ItemRef>,
    index: HashMap<ItemRef, usize>,
    by_type: BTreeMap<String, Vec<usize>>,
    adjacency: Vec<Vec<usize>>,
    attributes: Vec<Vec<Attribute>>,
    unique: Vec<Variable>,
    columns: HashMap<Variable, Vec<Option<i64>>>,
    type_distances: HashMap<String, HashMap<String, usize>>,
    neighborhoods: Vec<Vec<(usize, usize)>>,
}

fn check_threshold(hop_threshold: i64) -> Result<usize, LearnerError> {
    usize::try_from(hop_threshold).map_err(|_| {
        LearnerError::Configuration(format!(
            "Hop threshold must be non-negative, got {}",
            hop_threshold
        ))
    })
}

fn check_declared(schema: &Schema, unit: &Unit) -> Result<(), LearnerError> {
    let declared = match (schema.item_type(unit.item_type()), &unit.attribute) {
        (Some(t), Attribute::Existence) => t.is_relationship(),
        (Some(t), Attribute::Value(name)) => t.attributes.iter().any(|a| a == name),
        (None, _) => false,
    };
    if declared {
        Ok(())
    } else {
        Err(LearnerError::Configuration(format!(
            "Unit {} is not declared by schema '{}'",
            unit, schema.name
        )))
    }
}

impl ModelSupport {
    /// Build the index
    ///
    /// Fails with [`LearnerError::Configuration`] if the hop threshold is
    /// negative, a unit is not declared by the schema, or a unique unit's
    /// (type, attribute) does not occur among `all_units`.
    pub fn new(
        session: &Session,
        all_units: Vec<Unit>,
        unique_units: Vec<Unit>,
        hop_threshold: i64,
    ) -> Result<Self, LearnerError> {
        let hop_threshold = check_threshold(hop_threshold)?;
        let schema = session.schema().clone();

        let mut items = Vec::new();
        let mut index: HashMap<ItemRef, usize> = HashMap::new();
        let mut attributes: Vec<Vec<Attribute>> = Vec::new();
        let mut known: HashSet<Variable> = HashSet::new();

        for unit in &all_units {
            check_declared(&schema, unit)?;
            let idx = *index.entry(unit.item.clone()).or_insert_with(|| {
                items.push(unit.item.clone());
                attributes.push(Vec::new());
                items.len() - 1
            });
            attributes[idx].push(unit.attribute.clone());
            known.insert(unit.variable());
        }
        for attrs in &mut attributes {
            attrs.sort();
            attrs.dedup();
        }

        let mut unique: Vec<Variable> = Vec::new();
        for unit in &unique_units {
            check_declared(&schema, unit)?;
            let variable = unit.variable();
            if !known.contains(&variable) {
                return Err(LearnerError::Configuration(format!(
                    "Unique unit {} has no counterpart among all units",
                    unit
                )));
            }
            unique.push(variable);
        }
        unique.sort();
        unique.dedup();

        let mut by_type: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        for (idx, item) in items.iter().enumerate() {
            by_type.entry(item.item_type.clone()).or_default().push(idx);
        }
        for ids in by_type.values_mut() {
            ids.sort_by(|a, b| items[*a].cmp(&items[*b]));
        }

        let data = session.data();
        let mut adjacency = vec![Vec::new(); items.len()];
        for (rel, from, to) in data.links() {
            let Some(&r) = index.get(rel) else { continue };
            for end in [from, to] {
                if let Some(&e) = index.get(end) {
                    adjacency[r].push(e);
                    adjacency[e].push(r);
                }
            }
        }
        for adj in &mut adjacency {
            adj.sort_unstable();
            adj.dedup();
        }

        let mut columns = HashMap::new();
        for variable in &unique {
            let column: Vec<Option<i64>> = items
                .iter()
                .map(|item| {
                    if item.item_type != variable.item_type {
                        return None;
                    }
                    match &variable.attribute {
                        Attribute::Existence => Some(1),
                        Attribute::Value(name) => data.value(item, name),
                    }
                })
                .collect();
            columns.insert(variable.clone(), column);
        }

        let type_distances = schema_distances(&schema);

        let mut support = Self {
            schema,
            hop_threshold,
            items,
            index,
            by_type,
            adjacency,
            attributes,
            unique,
            columns,
            type_distances,
            neighborhoods: Vec::new(),
        };
        support.rebuild_neighborhoods();

        info!(
            "Model support ready: {} items, {} unique variables, hop threshold {}",
            support.items.len(),
            support.unique.len(),
            support.hop_threshold
        );
        Ok(support)
    }

    fn rebuild_neighborhoods(&mut self) {
        let horizon = self.join_horizon();
        self.neighborhoods = (0..self.items.len())
            .map(|start| bfs(&self.adjacency, start, horizon))
            .collect();
        debug!("Rebuilt {} neighborhoods out to {} hops", self.neighborhoods.len(), horizon);
    }

    /// The configured hop threshold
    pub fn hop_threshold(&self) -> usize {
        self.hop_threshold
    }

    /// Change the hop threshold, invalidating every cached neighborhood
    pub fn set_hop_threshold(&mut self, hop_threshold: i64) -> Result<(), LearnerError> {
        self.hop_threshold = check_threshold(hop_threshold)?;
        self.rebuild_neighborhoods();
        Ok(())
    }

    /// Radius of precomputed neighborhoods: twice the hop threshold
    pub fn join_horizon(&self) -> usize {
        self.hop_threshold * 2
    }

    /// The schema
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Number of indexed items
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Units reachable from `unit` within `k` hops, excluding `unit` itself
    ///
    /// Other attributes of the same item are reachable at zero hops. Fails if
    /// `k` exceeds the hop threshold or the unit is not indexed.
    pub fn neighbors_within_hops(&self, unit: &Unit, k: usize) -> Result<BTreeSet<Unit>, LearnerError> {
        if k > self.hop_threshold {
            return Err(LearnerError::Configuration(format!(
                "Requested {} hops but the hop threshold is {}",
                k, self.hop_threshold
            )));
        }
        let &start = self.index.get(&unit.item).ok_or_else(|| {
            LearnerError::Configuration(format!("Unit {} is not part of the model support", unit))
        })?;

        let mut out = BTreeSet::new();
        for &(idx, dist) in &self.neighborhoods[start] {
            if dist > k {
                break;
            }
            for attribute in &self.attributes[idx] {
                out.insert(Unit {
                    item: self.items[idx].clone(),
                    attribute: attribute.clone(),
                });
            }
        }
        out.remove(unit);
        Ok(out)
    }

    /// Unique variables in sorted order
    pub fn unique_variables(&self) -> &[Variable] {
        &self.unique
    }

    /// Schema hop distance between the item types of two variables
    pub fn variable_distance(&self, a: &Variable, b: &Variable) -> Option<usize> {
        self.type_distance(&a.item_type, &b.item_type)
    }

    /// Schema hop distance between two item types
    pub fn type_distance(&self, a: &str, b: &str) -> Option<usize> {
        self.type_distances.get(a).and_then(|d| d.get(b)).copied()
    }

    /// Whether `a` and `b` are a relationship's existence and one of its own
    /// attributes
    pub fn is_trivial_pair(&self, a: &Variable, b: &Variable) -> bool {
        a.item_type == b.item_type && a.is_existence() != b.is_existence()
    }

    /// Variable pairs within the hop threshold that may be dependent
    ///
    /// Pairs are ordered and returned in sorted order.
    pub fn candidate_pairs(&self) -> Vec<(Variable, Variable)> {
        let mut pairs = Vec::new();
        for (i, a) in self.unique.iter().enumerate() {
            for b in &self.unique[i + 1..] {
                if self.is_trivial_pair(a, b) {
                    continue;
                }
                match self.variable_distance(a, b) {
                    Some(d) if d <= self.hop_threshold => pairs.push((a.clone(), b.clone())),
                    _ => {}
                }
            }
        }
        pairs
    }

    /// Trivial dependencies: every relationship's existence causes each of
    /// its own attributes
    pub fn trivial_dependencies(&self) -> Vec<(Variable, Variable)> {
        let mut out = Vec::new();
        for existence in self.unique.iter().filter(|v| v.is_existence()) {
            for attr in self
                .unique
                .iter()
                .filter(|v| !v.is_existence() && v.item_type == existence.item_type)
            {
                out.push((existence.clone(), attr.clone()));
            }
        }
        out
    }

    /// Existence variables of the relationships on the shortest schema path
    /// between two variables, excluding the variables themselves
    pub fn relationships_between(&self, a: &Variable, b: &Variable) -> Vec<Variable> {
        let path = self.schema_path(&a.item_type, &b.item_type);
        path.into_iter()
            .filter(|t| self.schema.is_relationship(t))
            .map(Variable::existence)
            .filter(|v| v != a && v != b)
            .collect()
    }

    fn schema_path(&self, from: &str, to: &str) -> Vec<String> {
        let mut parent: HashMap<&str, &str> = HashMap::new();
        let mut visited: HashSet<&str> = HashSet::from([from]);
        let mut queue: VecDeque<&str> = VecDeque::from([from]);

        while let Some(current) = queue.pop_front() {
            if current == to {
                break;
            }
            for next in self.schema.adjacent_types(current) {
                if visited.insert(next) {
                    parent.insert(next, current);
                    queue.push_back(next);
                }
            }
        }

        if !visited.contains(to) {
            return Vec::new();
        }
        let mut path = vec![to.to_string()];
        let mut current = to;
        while let Some(&prev) = parent.get(current) {
            path.push(prev.to_string());
            current = prev;
        }
        path.reverse();
        path
    }

    /// Indices of the items of one type, in item order
    pub(crate) fn items_of(&self, item_type: &str) -> &[usize] {
        self.by_type.get(item_type).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// Items of `item_type` within `hops` of `item` (`hops` ≤ join horizon)
    pub(crate) fn join<'a>(
        &'a self,
        item: usize,
        item_type: &'a str,
        hops: usize,
    ) -> impl Iterator<Item = usize> + 'a {
        self.neighborhoods[item]
            .iter()
            .take_while(move |(_, dist)| *dist <= hops)
            .filter(move |(idx, _)| self.items[*idx].item_type == item_type)
            .map(|(idx, _)| *idx)
    }

    /// Observed values of a unique variable, indexed by item
    pub(crate) fn column(&self, variable: &Variable) -> Option<&[Option<i64>]> {
        self.columns.get(variable).map(|c| c.as_slice())
    }
}

/// Breadth-first search bounded by hop count
///
/// Returns `(item, distance)` pairs sorted by distance then item, the start
/// item included at distance 0.
fn bfs(adjacency: &[Vec<usize>], start: usize, radius: usize) -> Vec<(usize, usize)> {
    let mut visited: HashSet<usize> = HashSet::from([start]);
    let mut queue: VecDeque<(usize, usize)> = VecDeque::from([(start, 0)]);
    let mut out = Vec::new();

    while let Some((current, dist)) = queue.pop_front() {
        out.push((current, dist));
        if dist == radius {
            continue;
        }
        for &next in &adjacency[current] {
            if visited.insert(next) {
                queue.push_back((next, dist + 1));
            }
        }
    }

    out.sort_unstable_by_key(|&(idx, dist)| (dist, idx));
    out
}

fn schema_distances(schema: &Schema) -> HashMap<String, HashMap<String, usize>> {
    let mut all = HashMap::new();
    for start in schema.item_types() {
        let mut dist: HashMap<String, usize> = HashMap::from([(start.name.clone(), 0)]);
        let mut queue: VecDeque<&str> = VecDeque::from([start.name.as_str()]);
        while let Some(current) = queue.pop_front() {
            let d = dist[current];
            for next in schema.adjacent_types(current) {
                if !dist.contains_key(next) {
                    dist.insert(next.to_string(), d + 1);
                    queue.push_back(next);
                }
            }
        }
        all.insert(start.name.clone(), dist);
    }
    all
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;
    use relpc_domain::RelationalData;

    fn random_session(people: u64, links: &[(u64, u64)]) -> Session {
        let schema = Schema::new("social")
            .with_entity("person", &["mood"])
            .with_relationship("KNOWS", "person", "person", &[]);
        let mut data = RelationalData::new(schema);
        for id in 0..people {
            let p = data.add_entity("person", id).unwrap();
            data.set_value(&p, "mood", (id % 3) as i64).unwrap();
        }
        for (i, (from, to)) in links.iter().enumerate() {
            data.add_relationship("KNOWS", i as u64, from % people, to % people).unwrap();
        }
        Session::from_data("social", data)
    }

    proptest! {
        /// Property: raising the hop threshold never shrinks a neighborhood
        #[test]
        fn test_neighborhoods_monotone_in_threshold(
            people in 2u64..12,
            links in prop::collection::vec((0u64..12, 0u64..12), 0..20),
            low in 0i64..4,
            extra in 0i64..4,
        ) {
            let session = random_session(people, &links);
            let small = session.model_support(low).unwrap();
            let large = session.model_support(low + extra).unwrap();

            for unit in session.units() {
                for k in 0..=(low as usize) {
                    let a = small.neighbors_within_hops(unit, k).unwrap();
                    let b = large.neighbors_within_hops(unit, k).unwrap();
                    prop_assert_eq!(&a, &b);
                    if k > 0 {
                        let smaller = small.neighbors_within_hops(unit, k - 1).unwrap();
                        prop_assert!(smaller.is_subset(&a));
                    }
                }
            }
        }
    }
}
