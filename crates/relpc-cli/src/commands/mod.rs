//! Command implementations.

pub mod generate;
pub mod inspect;
pub mod learn;

pub use self::generate::execute_generate;
pub use self::inspect::execute_inspect;
pub use self::learn::execute_learn;

use crate::error::{CliError, Result};
use relpc_store::SqliteSource;

/// Resolve the schema to work with: the requested one, or the only one stored.
pub(crate) fn resolve_schema(source: &SqliteSource, requested: Option<&str>) -> Result<String> {
    if let Some(name) = requested {
        return Ok(name.to_string());
    }

    let mut names = source.schema_names()?;
    match names.len() {
        0 => Err(CliError::InvalidInput("Database holds no schema".to_string())),
        1 => Ok(names.remove(0)),
        _ => Err(CliError::InvalidInput(format!(
            "Database holds several schemas ({}); pick one with --schema",
            names.join(", ")
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relpc_fixtures::chain_fixture;

    #[test]
    fn test_resolve_schema_on_empty_database() {
        let source = SqliteSource::open(":memory:").unwrap();
        assert!(matches!(resolve_schema(&source, None), Err(CliError::InvalidInput(_))));
        assert_eq!(resolve_schema(&source, Some("chain")).unwrap(), "chain");
    }

    #[test]
    fn test_resolve_single_schema() {
        let mut source = SqliteSource::open(":memory:").unwrap();
        source.save(&chain_fixture(10, 1).unwrap().data).unwrap();
        assert_eq!(resolve_schema(&source, None).unwrap(), "chain");
    }
}
