//! Session context shared by a learning run

use crate::{LearnerError, ModelSupport};
use relpc_domain::traits::DataSource;
use relpc_domain::{RelationalData, Schema, Unit};
use tracing::info;

/// Everything loaded from the data source for one run
///
/// A session is created once, up front; nothing in the learner touches the
/// data source afterwards.
#[derive(Debug, Clone)]
pub struct Session {
    name: String,
    data: RelationalData,
    units: Vec<Unit>,
    unique_units: Vec<Unit>,
}

impl Session {
    /// Load a session from a data source
    ///
    /// Retrieval failures surface as [`LearnerError::DataAccess`].
    pub fn open<S: DataSource>(name: impl Into<String>, source: &S) -> Result<Self, LearnerError>
    where
        S::Error: std::fmt::Display,
    {
        let name = name.into();
        let data = source
            .snapshot()
            .map_err(|e| LearnerError::DataAccess(e.to_string()))?;
        let units = source
            .units()
            .map_err(|e| LearnerError::DataAccess(e.to_string()))?;
        let unique_units = source
            .unique_units()
            .map_err(|e| LearnerError::DataAccess(e.to_string()))?;

        info!(
            "Opened session '{}': {} items, {} units, {} unique units",
            name,
            data.item_count(),
            units.len(),
            unique_units.len()
        );

        Ok(Self {
            name,
            data,
            units,
            unique_units,
        })
    }

    /// Build a session directly from an in-memory snapshot
    pub fn from_data(name: impl Into<String>, data: RelationalData) -> Self {
        let units = data.units();
        let unique_units = data.unique_units();
        Self {
            name: name.into(),
            data,
            units,
            unique_units,
        }
    }

    /// Session name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The data snapshot
    pub fn data(&self) -> &RelationalData {
        &self.data
    }

    /// The relational schema
    pub fn schema(&self) -> &Schema {
        self.data.schema()
    }

    /// All units
    pub fn units(&self) -> &[Unit] {
        &self.units
    }

    /// Unique units
    pub fn unique_units(&self) -> &[Unit] {
        &self.unique_units
    }

    /// Build model support over the session's full unit universe
    pub fn model_support(&self, hop_threshold: i64) -> Result<ModelSupport, LearnerError> {
        ModelSupport::new(self, self.units.clone(), self.unique_units.clone(), hop_threshold)
    }
}
