//! Error types for structure learning

use thiserror::Error;

/// Errors that can occur while building model support or learning a model
#[derive(Error, Debug)]
pub enum LearnerError {
    /// Missing or invalid configuration, or an operation called out of order
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Schema or unit retrieval failed
    #[error("Data access error: {0}")]
    DataAccess(String),
}
