//! Inspect command implementation.

use super::resolve_schema;
use crate::cli::InspectArgs;
use crate::error::Result;
use crate::output::Formatter;
use relpc_domain::traits::DataSource;
use relpc_store::{SchemaDefinition, SqliteSource};

/// Execute the inspect command.
pub fn execute_inspect(args: InspectArgs, formatter: &Formatter) -> Result<()> {
    let mut source = SqliteSource::open(&args.db)?;
    let name = resolve_schema(&source, args.schema.as_deref())?;
    let schema = source.load_schema(&name)?;
    let data = source.snapshot()?;
    let truth = source.truth()?;
    source.close()?;

    let counts: Vec<(String, usize)> = schema
        .item_types()
        .map(|t| (t.name.clone(), data.items_of(&t.name).count()))
        .collect();
    let definition = SchemaDefinition::from(&schema).to_toml()?;
    println!("{}", formatter.format_schema(&schema, &counts, &definition)?);

    match truth {
        Some(truth) => eprintln!(
            "{}",
            formatter.info(&format!("True model stored: {} dependencies", truth.edge_count()))
        ),
        None => eprintln!("{}", formatter.warning("No true model stored")),
    }
    Ok(())
}
