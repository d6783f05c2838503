//! CLI command definitions and argument parsing.

use clap::{Parser, Subcommand};
use relpc_learner::LearnerConfig;
use std::path::PathBuf;

/// Relpc - learn causal models from relational databases.
#[derive(Debug, Parser)]
#[command(name = "relpc")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<CliFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Configuration file path (default: ~/.relpc/config.toml)
    #[arg(short, long, global = true, env = "RELPC_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum CliFormat {
    /// Table format (default)
    Table,
    /// JSON format
    Json,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Learn a causal model from a database
    Learn(LearnArgs),

    /// Write a synthetic chain database with its true model
    Generate(GenerateArgs),

    /// Show the schema and contents of a database
    Inspect(InspectArgs),
}

/// Arguments for the learn command.
#[derive(Debug, Parser)]
pub struct LearnArgs {
    /// SQLite database to learn from
    pub db: PathBuf,

    /// Schema name (required when the database holds several)
    #[arg(short, long)]
    pub schema: Option<String>,

    /// Maximum hops between a dependency's endpoints
    #[arg(long)]
    pub hop_threshold: Option<i64>,

    /// Largest conditioning set
    #[arg(short, long)]
    pub depth: Option<usize>,

    /// Family-wise significance level
    #[arg(short, long)]
    pub alpha: Option<f64>,

    /// Strength-of-effect threshold
    #[arg(long)]
    pub strength: Option<f64>,

    /// Run all independence tests on one thread
    #[arg(long)]
    pub sequential: bool,

    /// Skip the search for separating sets beyond the hop threshold
    #[arg(long)]
    pub no_out_of_range: bool,

    /// Skip the oracle run when scoring against a stored truth
    #[arg(long)]
    pub no_oracle: bool,

    /// Write the learned model as Graphviz DOT
    #[arg(long)]
    pub dot: Option<PathBuf>,
}

impl LearnArgs {
    /// Apply command-line overrides on top of a configured learner
    pub fn apply(&self, config: &mut LearnerConfig) {
        if let Some(hops) = self.hop_threshold {
            config.hop_threshold = hops;
        }
        if let Some(depth) = self.depth {
            config.depth = depth;
        }
        if let Some(alpha) = self.alpha {
            config.significance_threshold = alpha;
        }
        if let Some(strength) = self.strength {
            config.strength_of_effect_threshold = strength;
        }
        if self.sequential {
            config.parallel = false;
        }
        if self.no_out_of_range {
            config.check_out_of_range = false;
        }
    }
}

/// Arguments for the generate command.
#[derive(Debug, Parser)]
pub struct GenerateArgs {
    /// SQLite database to write (existing contents are replaced)
    pub db: PathBuf,

    /// Random seed
    #[arg(long, default_value = "2010")]
    pub seed: u64,

    /// Number of `a` items; other types scale from it
    #[arg(short = 'n', long, default_value = "800")]
    pub sample_size: u64,

    /// Also write the schema definition as TOML
    #[arg(long)]
    pub schema_out: Option<PathBuf>,
}

/// Arguments for the inspect command.
#[derive(Debug, Parser)]
pub struct InspectArgs {
    /// SQLite database to inspect
    pub db: PathBuf,

    /// Schema name (required when the database holds several)
    #[arg(short, long)]
    pub schema: Option<String>,
}

impl From<CliFormat> for crate::config::OutputFormat {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Table => crate::config::OutputFormat::Table,
            CliFormat::Json => crate::config::OutputFormat::Json,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_learn_command() {
        let cli = Cli::parse_from(["relpc", "learn", "chain.db", "--depth", "3", "--sequential"]);
        match cli.command {
            Command::Learn(args) => {
                assert_eq!(args.db, PathBuf::from("chain.db"));
                assert_eq!(args.depth, Some(3));
                assert!(args.sequential);
            }
            _ => panic!("Expected Learn command"),
        }
    }

    #[test]
    fn test_generate_defaults() {
        let cli = Cli::parse_from(["relpc", "generate", "out.db"]);
        match cli.command {
            Command::Generate(args) => {
                assert_eq!(args.seed, 2010);
                assert_eq!(args.sample_size, 800);
            }
            _ => panic!("Expected Generate command"),
        }
    }

    #[test]
    fn test_overrides_apply() {
        let cli = Cli::parse_from([
            "relpc",
            "learn",
            "chain.db",
            "--alpha",
            "0.05",
            "--hop-threshold",
            "4",
            "--no-out-of-range",
        ]);
        let Command::Learn(args) = cli.command else {
            panic!("Expected Learn command");
        };

        let mut config = LearnerConfig::default();
        args.apply(&mut config);
        assert_eq!(config.significance_threshold, 0.05);
        assert_eq!(config.hop_threshold, 4);
        assert_eq!(config.depth, 2);
        assert!(!config.check_out_of_range);
        assert!(config.parallel);
    }
}
