//! Relpc CLI - learn causal models from relational databases.

use anyhow::Context;
use clap::Parser;
use relpc_cli::commands;
use relpc_cli::{Cli, Command, Config, Formatter};
use tracing_subscriber::EnvFilter;

fn main() {
    // Initialize tracing (log to stderr, RUST_LOG overrides the level)
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    if let Err(e) = run() {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::load().context("Failed to load config")?,
    };

    let format = cli.format.map(Into::into).unwrap_or(config.settings.format);
    let color_enabled = !cli.no_color && config.settings.color;
    let formatter = Formatter::new(format, color_enabled);

    match cli.command {
        Command::Learn(args) => {
            let db = args.db.display().to_string();
            commands::execute_learn(args, &config, &formatter).with_context(|| format!("Learning from {}", db))?;
        }
        Command::Generate(args) => {
            commands::execute_generate(args, &formatter)?;
        }
        Command::Inspect(args) => {
            commands::execute_inspect(args, &formatter)?;
        }
    }

    Ok(())
}
