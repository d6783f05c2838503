//! Scoring error types

use relpc_learner::LearnerError;
use thiserror::Error;

/// Errors that can occur while scoring a learned model
#[derive(Error, Debug)]
pub enum ScoringError {
    /// The true and learned models share no variable
    #[error("Incomparable models: {0}")]
    Incomparable(String),

    /// The oracle run failed
    #[error("Learner error: {0}")]
    Learner(#[from] LearnerError),
}
