//! Relpc Fixtures
//!
//! Synthetic relational datasets with known causal structure, for tests and
//! for the `generate` command.
//!
//! # Chain
//!
//! Four entity types `a`, `b`, `c`, `d`, each with a binary `value`, and
//! three relationships: `AB` (a to b), `BC` (b to c) and `AD` (a to d). The
//! true model is the chain `d.value --> a.value --> b.value --> c.value`.
//!
//! Every `b` links to one random `a` and one random `c`; every `a` links to
//! one random `d`. Values are drawn in causal order, each child leaning
//! towards its parent's value with a logistic strength.
//!
//! # Collider
//!
//! Three entity types `x`, `y`, `z` where every `y` links to one random `x`
//! (`XY`) and one random `z` (`ZY`). The true model is
//! `x.value --> y.value <-- z.value`.
//!
//! ```
//! use relpc_fixtures::chain_fixture;
//!
//! # fn main() -> Result<(), relpc_fixtures::FixtureError> {
//! let fixture = chain_fixture(100, 7)?;
//! assert_eq!(fixture.data.items_of("b").count(), 200);
//! assert_eq!(fixture.truth.edge_count(), 3);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

use rand::prelude::*;
use rand::rngs::StdRng;
use relpc_domain::{Dependency, ItemId, Model, RelationalData, Schema, Variable};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while generating a dataset
#[derive(Error, Debug)]
pub enum FixtureError {
    /// A dependency strength is NaN or infinite
    #[error("Invalid strength: {0}")]
    InvalidStrength(String),

    /// An item, link or value was rejected by the schema
    #[error("Data error: {0}")]
    Data(String),
}

/// Number of items of each chain entity type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainSizes {
    /// Items of type `a`
    pub a: u64,
    /// Items of type `b`
    pub b: u64,
    /// Items of type `c`
    pub c: u64,
    /// Items of type `d`
    pub d: u64,
}

impl ChainSizes {
    /// Sizes scaled from a sample size: `a = d = n`, `b = 2n`, `c = n / 2`
    pub fn from_sample_size(n: u64) -> Self {
        Self {
            a: n,
            b: 2 * n,
            c: (n / 2).max(1),
            d: n,
        }
    }
}

impl Default for ChainSizes {
    fn default() -> Self {
        Self::from_sample_size(800)
    }
}

/// Logistic strength of each true dependency
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Strengths {
    /// `d.value --> a.value`
    pub da: f64,
    /// `a.value --> b.value`
    pub ab: f64,
    /// `b.value --> c.value`
    pub bc: f64,
}

impl Strengths {
    /// Check every strength is a finite number
    pub fn validate(&self) -> Result<(), FixtureError> {
        finite("da", self.da)?;
        finite("ab", self.ab)?;
        finite("bc", self.bc)
    }
}

impl Default for Strengths {
    fn default() -> Self {
        Self {
            da: 1.0,
            ab: 2.0,
            bc: 2.0,
        }
    }
}

/// Generated data and the model it was drawn from
#[derive(Debug, Clone)]
pub struct Fixture {
    /// The data
    pub data: RelationalData,
    /// The true causal model
    pub truth: Model,
}

/// Schema of the chain dataset
pub fn chain_schema() -> Schema {
    Schema::new("chain")
        .with_entity("a", &["value"])
        .with_entity("b", &["value"])
        .with_entity("c", &["value"])
        .with_entity("d", &["value"])
        .with_relationship("AB", "a", "b", &[])
        .with_relationship("BC", "b", "c", &[])
        .with_relationship("AD", "a", "d", &[])
}

/// True model of the chain dataset
pub fn chain_truth() -> Model {
    Model::from_dependencies([
        Dependency::directed(Variable::value("d", "value"), Variable::value("a", "value")),
        Dependency::directed(Variable::value("a", "value"), Variable::value("b", "value")),
        Dependency::directed(Variable::value("b", "value"), Variable::value("c", "value")),
    ])
}

/// Schema of a three-entity star: `x` and `z` both relate to `y`
pub fn collider_schema() -> Schema {
    Schema::new("star")
        .with_entity("x", &["value"])
        .with_entity("y", &["value"])
        .with_entity("z", &["value"])
        .with_relationship("XY", "x", "y", &[])
        .with_relationship("ZY", "z", "y", &[])
}

/// The collider `x.value --> y.value <-- z.value`
pub fn collider_truth() -> Model {
    Model::from_dependencies([
        Dependency::directed(Variable::value("x", "value"), Variable::value("y", "value")),
        Dependency::directed(Variable::value("z", "value"), Variable::value("y", "value")),
    ])
}

/// A small star instance with one item per type, for structure-only tests
pub fn collider_skeleton_data() -> Result<RelationalData, FixtureError> {
    let mut data = RelationalData::new(collider_schema());
    for item_type in ["x", "y", "z"] {
        insert_entities(&mut data, item_type, &[0])?;
    }
    data.add_relationship("XY", 0, 0, 0).map_err(FixtureError::Data)?;
    data.add_relationship("ZY", 0, 0, 0).map_err(FixtureError::Data)?;
    Ok(data)
}

/// Generates chain datasets
#[derive(Debug, Clone)]
pub struct ChainGenerator {
    sizes: ChainSizes,
    strengths: Strengths,
    seed: u64,
}

impl ChainGenerator {
    /// Generator with the given seed and default sizes and strengths
    pub fn new(seed: u64) -> Self {
        Self {
            sizes: ChainSizes::default(),
            strengths: Strengths::default(),
            seed,
        }
    }

    /// Override the sizes
    pub fn with_sizes(mut self, sizes: ChainSizes) -> Self {
        self.sizes = sizes;
        self
    }

    /// Override the dependency strengths
    ///
    /// They are checked when the dataset is drawn.
    pub fn with_strengths(mut self, strengths: Strengths) -> Self {
        self.strengths = strengths;
        self
    }

    /// Draw a dataset
    pub fn generate(&self) -> Result<Fixture, FixtureError> {
        self.strengths.validate()?;
        let strengths = self.strengths;
        let mut rng = StdRng::seed_from_u64(self.seed);
        let sizes = ChainSizes {
            a: self.sizes.a.max(1),
            b: self.sizes.b.max(1),
            c: self.sizes.c.max(1),
            d: self.sizes.d.max(1),
        };
        let mut data = RelationalData::new(chain_schema());

        // Structure: ids are dense from 0, relationship ids follow their
        // owning item
        let a_to_d: Vec<ItemId> = (0..sizes.a).map(|_| rng.gen_range(0..sizes.d)).collect();
        let b_to_a: Vec<ItemId> = (0..sizes.b).map(|_| rng.gen_range(0..sizes.a)).collect();
        let b_to_c: Vec<ItemId> = (0..sizes.b).map(|_| rng.gen_range(0..sizes.c)).collect();

        // Values in causal order
        let d_values: Vec<i64> = (0..sizes.d).map(|_| rng.gen_bool(0.5) as i64).collect();
        let a_values: Vec<i64> = a_to_d
            .iter()
            .map(|&d| draw(&mut rng, lean(strengths.da, d_values[d as usize] as f64)))
            .collect();
        let b_values: Vec<i64> = b_to_a
            .iter()
            .map(|&a| draw(&mut rng, lean(strengths.ab, a_values[a as usize] as f64)))
            .collect();

        let mut c_parents: Vec<Vec<i64>> = vec![Vec::new(); sizes.c as usize];
        for (b, &c) in b_to_c.iter().enumerate() {
            c_parents[c as usize].push(b_values[b]);
        }
        let c_values: Vec<i64> = c_parents
            .iter()
            .map(|parents| {
                let mean = if parents.is_empty() {
                    0.5
                } else {
                    parents.iter().sum::<i64>() as f64 / parents.len() as f64
                };
                draw(&mut rng, lean(strengths.bc, mean))
            })
            .collect();

        for (item_type, values) in [("a", &a_values), ("b", &b_values), ("c", &c_values), ("d", &d_values)] {
            insert_entities(&mut data, item_type, values)?;
        }
        for (a, &d) in a_to_d.iter().enumerate() {
            data.add_relationship("AD", a as ItemId, a as ItemId, d)
                .map_err(FixtureError::Data)?;
        }
        for b in 0..sizes.b {
            let i = b as usize;
            data.add_relationship("AB", b, b_to_a[i], b).map_err(FixtureError::Data)?;
            data.add_relationship("BC", b, b, b_to_c[i]).map_err(FixtureError::Data)?;
        }

        Ok(Fixture {
            data,
            truth: chain_truth(),
        })
    }
}

/// Logistic strengths of the collider's two causes
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColliderStrengths {
    /// `x.value --> y.value`
    pub xy: f64,
    /// `z.value --> y.value`
    pub zy: f64,
}

impl ColliderStrengths {
    /// Check every strength is a finite number
    pub fn validate(&self) -> Result<(), FixtureError> {
        finite("xy", self.xy)?;
        finite("zy", self.zy)
    }
}

impl Default for ColliderStrengths {
    fn default() -> Self {
        Self { xy: 2.0, zy: 2.0 }
    }
}

/// Generates collider star datasets
///
/// `n` items of types `x` and `z` and `2n` of type `y`.
#[derive(Debug, Clone)]
pub struct ColliderGenerator {
    size: u64,
    strengths: ColliderStrengths,
    seed: u64,
}

impl ColliderGenerator {
    /// Generator with the given seed, 400 causes of each kind and default strengths
    pub fn new(seed: u64) -> Self {
        Self {
            size: 400,
            strengths: ColliderStrengths::default(),
            seed,
        }
    }

    /// Override the number of `x` and `z` items
    pub fn with_size(mut self, n: u64) -> Self {
        self.size = n;
        self
    }

    /// Override the dependency strengths
    pub fn with_strengths(mut self, strengths: ColliderStrengths) -> Self {
        self.strengths = strengths;
        self
    }

    /// Draw a dataset
    pub fn generate(&self) -> Result<Fixture, FixtureError> {
        self.strengths.validate()?;
        let mut rng = StdRng::seed_from_u64(self.seed);
        let n = self.size.max(1);
        let mut data = RelationalData::new(collider_schema());

        let y_to_x: Vec<ItemId> = (0..2 * n).map(|_| rng.gen_range(0..n)).collect();
        let y_to_z: Vec<ItemId> = (0..2 * n).map(|_| rng.gen_range(0..n)).collect();

        let x_values: Vec<i64> = (0..n).map(|_| rng.gen_bool(0.5) as i64).collect();
        let z_values: Vec<i64> = (0..n).map(|_| rng.gen_bool(0.5) as i64).collect();
        let y_values: Vec<i64> = y_to_x
            .iter()
            .zip(&y_to_z)
            .map(|(&x, &z)| {
                let logit = lean(self.strengths.xy, x_values[x as usize] as f64)
                    + lean(self.strengths.zy, z_values[z as usize] as f64);
                draw(&mut rng, logit)
            })
            .collect();

        for (item_type, values) in [("x", &x_values), ("y", &y_values), ("z", &z_values)] {
            insert_entities(&mut data, item_type, values)?;
        }
        for (y, (&x, &z)) in y_to_x.iter().zip(&y_to_z).enumerate() {
            let y = y as ItemId;
            data.add_relationship("XY", y, x, y).map_err(FixtureError::Data)?;
            data.add_relationship("ZY", y, z, y).map_err(FixtureError::Data)?;
        }

        Ok(Fixture {
            data,
            truth: collider_truth(),
        })
    }
}

fn finite(name: &str, strength: f64) -> Result<(), FixtureError> {
    if strength.is_finite() {
        Ok(())
    } else {
        Err(FixtureError::InvalidStrength(format!("{} must be finite, got {}", name, strength)))
    }
}

/// Entities with dense ids from 0 and one `value` each
fn insert_entities(data: &mut RelationalData, item_type: &str, values: &[i64]) -> Result<(), FixtureError> {
    for (id, &value) in values.iter().enumerate() {
        let item = data.add_entity(item_type, id as ItemId).map_err(FixtureError::Data)?;
        data.set_value(&item, "value", value).map_err(FixtureError::Data)?;
    }
    Ok(())
}

/// Logit leaning towards `parent` (a proportion in `[0, 1]`)
fn lean(strength: f64, parent: f64) -> f64 {
    strength * (2.0 * parent - 1.0)
}

fn draw(rng: &mut StdRng, logit: f64) -> i64 {
    let p = 1.0 / (1.0 + (-logit).exp());
    rng.gen_bool(p.clamp(0.0, 1.0)) as i64
}

/// Chain dataset scaled from `sample_size`, default strengths
pub fn chain_fixture(sample_size: u64, seed: u64) -> Result<Fixture, FixtureError> {
    ChainGenerator::new(seed)
        .with_sizes(ChainSizes::from_sample_size(sample_size))
        .generate()
}

/// Collider dataset with `n` causes of each kind, default strengths
pub fn collider_fixture(n: u64, seed: u64) -> Result<Fixture, FixtureError> {
    ColliderGenerator::new(seed).with_size(n).generate()
}

#[cfg(test)]
mod tests {
    use super::*;
    use relpc_domain::ItemRef;

    #[test]
    fn test_default_sizes() {
        let sizes = ChainSizes::default();
        assert_eq!((sizes.a, sizes.b, sizes.c, sizes.d), (800, 1600, 400, 800));
    }

    #[test]
    fn test_chain_schema_is_valid() {
        assert!(chain_schema().validate().is_ok());
        assert!(collider_schema().validate().is_ok());
    }

    #[test]
    fn test_generation_is_deterministic() {
        let first = chain_fixture(50, 42).unwrap();
        let second = chain_fixture(50, 42).unwrap();
        let values = |f: &Fixture| -> Vec<Option<i64>> {
            f.data.items_of("c").map(|item| f.data.value(&item, "value")).collect()
        };
        assert_eq!(values(&first), values(&second));
        assert_eq!(first.data.item_count(), second.data.item_count());
    }

    #[test]
    fn test_structure() {
        let fixture = chain_fixture(40, 1).unwrap();
        let data = &fixture.data;
        assert_eq!(data.items_of("a").count(), 40);
        assert_eq!(data.items_of("b").count(), 80);
        assert_eq!(data.items_of("c").count(), 20);
        assert_eq!(data.items_of("AB").count(), 80);
        assert_eq!(data.items_of("AD").count(), 40);

        // Every b hangs off exactly one a and one c
        let (a, b) = data.endpoints(&ItemRef::new("AB", 5)).unwrap();
        assert_eq!(a.item_type, "a");
        assert_eq!(b, &ItemRef::new("b", 5));
        assert!(data.items_of("b").all(|b| data.value(&b, "value").is_some()));
    }

    #[test]
    fn test_strong_dependency_shows_in_data() {
        let fixture = ChainGenerator::new(3)
            .with_sizes(ChainSizes::from_sample_size(400))
            .with_strengths(Strengths { da: 0.0, ab: 4.0, bc: 0.0 })
            .generate()
            .unwrap();
        let data = &fixture.data;

        let mut agree = 0;
        let mut total = 0;
        for (rel, a, b) in data.links() {
            if rel.item_type != "AB" {
                continue;
            }
            total += 1;
            if data.value(a, "value") == data.value(b, "value") {
                agree += 1;
            }
        }
        assert!(agree as f64 / total as f64 > 0.9);
    }

    #[test]
    fn test_non_finite_strength_is_rejected() {
        let err = ChainGenerator::new(1)
            .with_sizes(ChainSizes::from_sample_size(10))
            .with_strengths(Strengths { da: f64::NAN, ab: 2.0, bc: 2.0 })
            .generate()
            .unwrap_err();
        assert!(matches!(err, FixtureError::InvalidStrength(msg) if msg.starts_with("da")));

        let err = ColliderGenerator::new(1)
            .with_strengths(ColliderStrengths { xy: 1.0, zy: f64::INFINITY })
            .generate()
            .unwrap_err();
        assert!(matches!(err, FixtureError::InvalidStrength(_)));
    }

    #[test]
    fn test_extreme_strength_still_draws() {
        let fixture = ChainGenerator::new(9)
            .with_sizes(ChainSizes::from_sample_size(20))
            .with_strengths(Strengths { da: f64::MAX, ab: -f64::MAX, bc: 0.0 })
            .generate()
            .unwrap();
        assert_eq!(fixture.data.items_of("a").count(), 20);
    }

    #[test]
    fn test_collider_structure() {
        let fixture = collider_fixture(30, 4).unwrap();
        let data = &fixture.data;
        assert_eq!(data.items_of("x").count(), 30);
        assert_eq!(data.items_of("y").count(), 60);
        assert_eq!(data.items_of("z").count(), 30);
        assert_eq!(data.items_of("XY").count(), 60);
        assert_eq!(data.items_of("ZY").count(), 60);

        let (x, y) = data.endpoints(&ItemRef::new("ZY", 7)).unwrap();
        assert_eq!(x.item_type, "z");
        assert_eq!(y, &ItemRef::new("y", 7));
        assert_eq!(fixture.truth.oriented_count(), 2);
    }

    #[test]
    fn test_truths() {
        let chain = chain_truth();
        assert_eq!(chain.oriented_count(), 3);
        assert!(chain.is_directed(&Variable::value("d", "value"), &Variable::value("a", "value")));
        assert_eq!(collider_truth().edge_count(), 2);
        assert_eq!(collider_skeleton_data().unwrap().item_count(), 5);
    }
}
