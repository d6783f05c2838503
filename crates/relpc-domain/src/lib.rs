//! Relpc Domain Layer
//!
//! This crate contains the vocabulary shared by every other relpc crate: the
//! relational schema, the units and variables that causal dependencies are
//! defined over, and the learned model artifact. It has ZERO external
//! dependencies and defines the trait interface through which relational data
//! enters the learning engine.
//!
//! ## Key Concepts
//!
//! - **Schema**: entity types and relationship types, each with attributes
//! - **Unit**: an (item, attribute) pair, the atomic variable of a data set
//! - **Variable**: the type-level projection of a unit, a node in the model
//! - **Dependency**: a possibly oriented edge between two variables
//! - **Independence constraint**: the witness that justified removing an edge
//! - **Model**: dependencies plus constraints, the output of structure learning
//!
//! ## Relational data
//!
//! Relationship instances are items in their own right. Walking from an entity
//! to a related entity passes through the relationship instance, so it costs
//! two hops:
//!
//! ```
//! use relpc_domain::{RelationalData, Schema};
//!
//! let schema = Schema::new("toy")
//!     .with_entity("a", &["value"])
//!     .with_entity("b", &["value"])
//!     .with_relationship("AB", "a", "b", &[]);
//!
//! let mut data = RelationalData::new(schema);
//! data.add_entity("a", 1).unwrap();
//! data.add_entity("b", 1).unwrap();
//! data.add_relationship("AB", 1, 1, 1).unwrap();
//! assert_eq!(data.item_count(), 3);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod constraint;
pub mod data;
pub mod dependency;
pub mod model;
pub mod schema;
pub mod traits;
pub mod unit;

// Re-exports for convenience
pub use constraint::IndependenceConstraint;
pub use data::RelationalData;
pub use dependency::{Dependency, Orientation, OrientationRule};
pub use model::Model;
pub use schema::{ItemKind, ItemType, Schema};
pub use unit::{Attribute, ItemId, ItemRef, Unit, Variable};
