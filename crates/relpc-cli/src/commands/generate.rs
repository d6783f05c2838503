//! Generate command implementation.

use crate::cli::GenerateArgs;
use crate::error::Result;
use crate::output::Formatter;
use relpc_fixtures::{ChainGenerator, ChainSizes};
use relpc_store::{SchemaDefinition, SqliteSource};
use std::fs;
use tracing::info;

/// Write a chain data set and its true model to a database.
///
/// Returns the number of items written.
pub fn run_generate(args: &GenerateArgs) -> Result<usize> {
    let fixture = ChainGenerator::new(args.seed)
        .with_sizes(ChainSizes::from_sample_size(args.sample_size))
        .generate()?;

    let mut source = SqliteSource::open(&args.db)?;
    source.save(&fixture.data)?;
    source.save_truth(&fixture.truth)?;
    source.close()?;

    if let Some(path) = &args.schema_out {
        let definition = SchemaDefinition::from(fixture.data.schema());
        fs::write(path, definition.to_toml()?)?;
    }

    let items = fixture.data.item_count();
    info!("Generated {} items with seed {}", items, args.seed);
    Ok(items)
}

/// Execute the generate command.
pub fn execute_generate(args: GenerateArgs, formatter: &Formatter) -> Result<()> {
    let items = run_generate(&args)?;
    println!(
        "{}",
        formatter.success(&format!("Wrote {} items to {}", items, args.db.display()))
    );
    Ok(())
}
