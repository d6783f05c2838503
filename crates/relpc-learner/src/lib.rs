//! Relpc Learner
//!
//! Relational PC: learns a causal model over the attributes and relationship
//! existences of a relational database.
//!
//! # Overview
//!
//! Learning runs in two phases over a [`ModelSupport`], an index of the
//! relational neighborhood of every item:
//! - **Skeleton identification**: starting from every pair of variables
//!   within the hop threshold, remove each pair that some conditioning set
//!   renders independent, recording the witnessing set as a constraint
//! - **Edge orientation**: direct the surviving edges with collider
//!   detection, restricted existence models, known non-colliders and cycle
//!   avoidance, repeated until nothing changes
//!
//! # Relational variables
//!
//! Relationship instances are items of their own, so an entity is one hop
//! from its relationships and two hops from the entities they connect. Tests
//! are run from the perspective of an item type; variables on other types
//! are aggregated over the joined neighborhood (mode for attributes, capped
//! count for relationship existence).
//!
//! # Usage
//!
//! ```
//! use relpc_domain::{RelationalData, Schema};
//! use relpc_learner::{LearnerConfig, RelationalPc, Session};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let schema = Schema::new("toy")
//!     .with_entity("a", &["value"])
//!     .with_entity("b", &["value"])
//!     .with_relationship("AB", "a", "b", &[]);
//! let mut data = RelationalData::new(schema);
//! for id in 0..40 {
//!     let a = data.add_entity("a", id)?;
//!     data.set_value(&a, "value", (id % 2) as i64)?;
//!     let b = data.add_entity("b", id)?;
//!     data.set_value(&b, "value", (id % 2) as i64)?;
//!     data.add_relationship("AB", id, id, id)?;
//! }
//!
//! let config = LearnerConfig::default();
//! let session = Session::from_data("toy", data);
//! let support = session.model_support(config.hop_threshold)?;
//!
//! let mut pc = RelationalPc::from_config(&support, &config)?;
//! pc.identify_skeleton(config.depth)?;
//! pc.orient_edges()?;
//!
//! let model = pc.model();
//! assert_eq!(model.edge_count(), 1);
//! println!("{}", model.to_dot("toy"));
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration
//!
//! ```toml
//! hop_threshold = 2
//! depth = 2
//! significance_threshold = 0.01
//! strength_of_effect_threshold = 0.1
//! effect_size = "contingency_coefficient"
//! parallel = true
//! check_out_of_range = true
//! ```
//!
//! # Testing against known structure
//!
//! [`DSeparationOracle`] answers independence queries from a known causal
//! model. Plugged into [`RelationalPc::with_test`] it shows what the rules
//! can recover with perfect test results.

#![warn(missing_docs)]

mod aggregate;
mod config;
mod error;
mod independence;
mod metrics;
mod orientation;
mod pc;
mod session;
mod skeleton;
mod support;

pub use config::LearnerConfig;
pub use error::LearnerError;
pub use independence::{DSeparationOracle, IndependenceTest, RelationalChiSquare};
pub use metrics::LearnerMetrics;
pub use pc::RelationalPc;
pub use session::Session;
pub use skeleton::{combinations, PairLog};
pub use support::ModelSupport;
