//! Trait definitions for external interactions
//!
//! These traits define the boundary between the learning engine and the
//! infrastructure that supplies relational data. Implementations live in other
//! crates (relpc-store); the in-memory snapshot implements them directly.

use crate::{RelationalData, Schema, Unit};
use std::convert::Infallible;

/// Read-only access to a relational data set
///
/// Implemented by the infrastructure layer (relpc-store)
pub trait DataSource {
    /// Error type for data access
    type Error;

    /// The relational schema
    fn schema(&self) -> Result<Schema, Self::Error>;

    /// Every (item, attribute) unit in the data set
    fn units(&self) -> Result<Vec<Unit>, Self::Error>;

    /// One representative unit per (item type, attribute)
    fn unique_units(&self) -> Result<Vec<Unit>, Self::Error>;

    /// Materialize the full data set in memory
    fn snapshot(&self) -> Result<RelationalData, Self::Error>;
}

impl DataSource for RelationalData {
    type Error = Infallible;

    fn schema(&self) -> Result<Schema, Self::Error> {
        Ok(RelationalData::schema(self).clone())
    }

    fn units(&self) -> Result<Vec<Unit>, Self::Error> {
        Ok(RelationalData::units(self))
    }

    fn unique_units(&self) -> Result<Vec<Unit>, Self::Error> {
        Ok(RelationalData::unique_units(self))
    }

    fn snapshot(&self) -> Result<RelationalData, Self::Error> {
        Ok(self.clone())
    }
}
