//! Learn command implementation.

use super::resolve_schema;
use crate::cli::LearnArgs;
use crate::config::Config;
use crate::error::Result;
use crate::output::Formatter;
use relpc_domain::Model;
use relpc_learner::{RelationalPc, Session};
use relpc_scoring::ScoreReport;
use relpc_store::SqliteSource;
use std::fs;
use tracing::{debug, info};

/// What a learn run produced.
#[derive(Debug)]
pub struct LearnOutcome {
    /// Schema the model was learned over
    pub schema: String,

    /// The learned model
    pub model: Model,

    /// Score against the stored truth, if the database has one
    pub report: Option<ScoreReport>,
}

/// Run both learning phases over a database and score the result.
pub fn run_learn(args: &LearnArgs, config: &Config) -> Result<LearnOutcome> {
    let mut learner = config.learner.clone();
    args.apply(&mut learner);
    learner.validate()?;

    let mut source = SqliteSource::open(&args.db)?;
    let schema = resolve_schema(&source, args.schema.as_deref())?;
    source.load_schema(&schema)?;
    let session = Session::open(schema.clone(), &source)?;
    let truth = source.truth()?;
    source.close()?;

    let support = session.model_support(learner.hop_threshold)?;
    let mut pc = RelationalPc::from_config(&support, &learner)?;
    pc.identify_skeleton(learner.depth)?;
    pc.orient_edges()?;
    debug!("{}", pc.metrics().summary());

    let report = match &truth {
        Some(truth) => Some(ScoreReport::score(truth, &pc, !args.no_oracle)?),
        None => None,
    };
    let model = pc.model();
    info!(
        "Learned {} dependencies ({} oriented) over '{}'",
        model.edge_count(),
        model.oriented_count(),
        schema
    );

    Ok(LearnOutcome { schema, model, report })
}

/// Execute the learn command.
pub fn execute_learn(args: LearnArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let outcome = run_learn(&args, config)?;
    println!("{}", formatter.format_learned(&outcome.model, outcome.report.as_ref())?);

    if outcome.report.is_none() {
        eprintln!("{}", formatter.info("No true model stored; skipping scores"));
    }

    if let Some(path) = &args.dot {
        fs::write(path, outcome.model.to_dot(&outcome.schema))?;
        eprintln!("{}", formatter.success(&format!("Wrote {}", path.display())));
    }

    Ok(())
}
