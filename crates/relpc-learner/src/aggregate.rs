//! Flattening relational data into test observations
//!
//! A test of `x _||_ y | z` is run from the perspective of an item type. Every
//! item of that type contributes one observation; variables living on other
//! item types are joined through the relational neighborhood and aggregated.

use crate::ModelSupport;
use relpc_domain::{Attribute, Variable};
use relpc_stats::Observation;
use std::collections::BTreeMap;

/// Builds observations over a [`ModelSupport`]
#[derive(Debug, Clone, Copy)]
pub(crate) struct Aggregator<'a> {
    support: &'a ModelSupport,
    count_cap: i64,
}

impl<'a> Aggregator<'a> {
    pub(crate) fn new(support: &'a ModelSupport, count_cap: i64) -> Self {
        Self { support, count_cap }
    }

    /// Item types a pair is tested from: `y`'s type, then `x`'s if different
    pub(crate) fn perspectives<'v>(x: &'v Variable, y: &'v Variable) -> Vec<&'v str> {
        let mut bases = vec![y.item_type.as_str()];
        if x.item_type != y.item_type {
            bases.push(x.item_type.as_str());
        }
        bases
    }

    /// One observation per item of `base`
    ///
    /// Items for which any variable has no joined value are skipped.
    pub(crate) fn observations(&self, base: &str, x: &Variable, y: &Variable, z: &[Variable]) -> Vec<Observation> {
        self.support
            .items_of(base)
            .iter()
            .filter_map(|&item| {
                let x = self.value_at(item, base, x)?;
                let y = self.value_at(item, base, y)?;
                let z = z
                    .iter()
                    .map(|v| self.value_at(item, base, v))
                    .collect::<Option<Vec<i64>>>()?;
                Some(Observation { x, y, z })
            })
            .collect()
    }

    /// Value of `variable` seen from `item`
    ///
    /// Existence variables on other types aggregate to the capped count of
    /// joined relationship instances; attributes aggregate to their mode,
    /// ties broken towards the smaller value.
    fn value_at(&self, item: usize, base: &str, variable: &Variable) -> Option<i64> {
        let column = self.support.column(variable)?;
        if variable.item_type == base {
            return column[item];
        }

        let hops = self.support.type_distance(base, &variable.item_type)?;
        if hops > self.support.join_horizon() {
            return None;
        }
        let joined = self.support.join(item, &variable.item_type, hops);

        match variable.attribute {
            Attribute::Existence => {
                let count = joined.count() as i64;
                Some(count.min(self.count_cap))
            }
            Attribute::Value(_) => mode(joined.filter_map(|idx| column[idx])),
        }
    }
}

fn mode(values: impl Iterator<Item = i64>) -> Option<i64> {
    let mut counts: BTreeMap<i64, usize> = BTreeMap::new();
    for v in values {
        *counts.entry(v).or_insert(0) += 1;
    }

    let mut best: Option<(i64, usize)> = None;
    for (value, count) in counts {
        if best.map_or(true, |(_, c)| count > c) {
            best = Some((value, count));
        }
    }
    best.map(|(value, _)| value)
}
