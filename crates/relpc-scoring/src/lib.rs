//! Relpc Scoring
//!
//! Evaluates a learned causal model against the model the data was drawn
//! from.
//!
//! Scoring provides:
//! - Edge-level error counts and skeleton/compelled precision and recall
//! - The count of trivially correct orientations
//! - Per-rule orientation frequencies
//! - Oracle recall: what the learner reaches with perfect independence
//!   information over the same support
//! - A breakdown of why true edges were lost during skeleton identification
//!
//! # Examples
//!
//! ```
//! use relpc_domain::{Dependency, Model, Variable};
//! use relpc_scoring::ErrorCounts;
//!
//! let a = Variable::value("a", "value");
//! let b = Variable::value("b", "value");
//! let truth = Model::from_dependencies([Dependency::directed(a.clone(), b.clone())]);
//! let learned = Model::from_dependencies([Dependency::undirected(a, b)]);
//!
//! let counts = ErrorCounts::compare(&truth, &learned, 1).unwrap();
//! assert_eq!(counts.skeleton_recall(), 1.0);
//! assert_eq!(counts.compelled_recall(), 0.0);
//! ```

#![warn(missing_docs)]

mod breakdown;
mod counts;
mod error;
mod report;

pub use breakdown::SkeletonBreakdown;
pub use counts::{ErrorCounts, Scores};
pub use error::ScoringError;
pub use report::{oracle_causal_recall, rule_frequencies, trivial_orientation_count, ScoreReport};
