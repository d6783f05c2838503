//! Error types for the CLI application.

use thiserror::Error;

/// Result type alias for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Storage error
    #[error("Storage error: {0}")]
    Store(#[from] relpc_store::StoreError),

    /// Learner error
    #[error("Learner error: {0}")]
    Learner(#[from] relpc_learner::LearnerError),

    /// Scoring error
    #[error("Scoring error: {0}")]
    Scoring(#[from] relpc_scoring::ScoringError),

    /// Synthetic data generation error
    #[error("Generation error: {0}")]
    Fixture(#[from] relpc_fixtures::FixtureError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
