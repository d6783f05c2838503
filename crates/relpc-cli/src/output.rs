//! Output formatting for the CLI.

use crate::config::OutputFormat;
use crate::error::Result;
use colored::*;
use relpc_domain::{Dependency, IndependenceConstraint, Model, Schema};
use relpc_scoring::ScoreReport;
use serde_json::{json, Value};
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};

/// Output formatter.
pub struct Formatter {
    format: OutputFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// Format the outcome of a learn run, with its score if a truth was available.
    pub fn format_learned(&self, model: &Model, report: Option<&ScoreReport>) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                let mut output = json!({
                    "constraints": model.constraints().iter().map(constraint_json).collect::<Vec<_>>(),
                    "dependencies": model.dependencies().iter().map(dependency_json).collect::<Vec<_>>(),
                });
                if let Some(report) = report {
                    output["score"] = serde_json::to_value(report)?;
                }
                Ok(serde_json::to_string_pretty(&output)?)
            }
            OutputFormat::Table => {
                let mut sections = vec![
                    self.heading("Independence constraints"),
                    self.constraints_table(model.constraints()),
                    self.heading("Dependencies"),
                    self.dependencies_table(model.dependencies()),
                ];
                if let Some(report) = report {
                    sections.push(self.heading("Score"));
                    sections.push(self.report_table(report));
                }
                Ok(sections.join("\n"))
            }
        }
    }

    fn constraints_table(&self, constraints: &[IndependenceConstraint]) -> String {
        if constraints.is_empty() {
            return self.colorize("No constraints recorded.", "yellow");
        }

        let mut builder = Builder::default();
        builder.push_record(["First", "Second", "Given", "p", "Effect"]);
        for c in constraints {
            let given: Vec<String> = c.conditioning.iter().map(|v| v.to_string()).collect();
            builder.push_record([
                c.first.to_string(),
                c.second.to_string(),
                format!("{{{}}}", given.join(", ")),
                format!("{:.4}", c.p_value),
                format!("{:.4}", c.effect_size),
            ]);
        }
        styled(builder)
    }

    fn dependencies_table(&self, dependencies: &[Dependency]) -> String {
        if dependencies.is_empty() {
            return self.colorize("No dependencies found.", "yellow");
        }

        let mut builder = Builder::default();
        builder.push_record(["Dependency", "Rule"]);
        for dep in dependencies {
            let edge = match (dep.cause(), dep.effect()) {
                (Some(cause), Some(effect)) => format!("{} --> {}", cause, effect),
                _ => format!("{} --- {}", dep.source, dep.target),
            };
            let rule = dep.rule.map(|r| r.code().to_string()).unwrap_or_default();
            builder.push_record([edge, rule]);
        }
        styled(builder)
    }

    fn report_table(&self, report: &ScoreReport) -> String {
        let s = &report.scores;
        let mut builder = Builder::default();
        builder.push_record(["Measure", "Value"]);
        builder.push_record(["SPrecision".to_string(), format!("{:.3}", s.s_precision)]);
        builder.push_record(["SRecall".to_string(), format!("{:.3}", s.s_recall)]);
        builder.push_record(["CPrecision".to_string(), format!("{:.3}", s.c_precision)]);
        builder.push_record(["CRecall".to_string(), format!("{:.3}", s.c_recall)]);
        builder.push_record(["Trivial orientations".to_string(), report.trivial.to_string()]);
        for (code, count) in &report.rules {
            builder.push_record([format!("Rule {}", code), count.to_string()]);
        }
        if let Some(recall) = report.oracle_recall {
            builder.push_record(["Oracle recall".to_string(), format!("{:.3}", recall)]);
        }
        let counts: Vec<String> = report.counts.as_array().iter().map(|n| n.to_string()).collect();
        builder.push_record(["Error counts".to_string(), counts.join(" ")]);
        styled(builder)
    }

    /// Format a schema and the number of items of each type.
    pub fn format_schema(&self, schema: &Schema, counts: &[(String, usize)], definition: &str) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                let items: serde_json::Map<String, Value> =
                    counts.iter().map(|(t, n)| (t.clone(), json!(n))).collect();
                let output = json!({
                    "schema": schema.name,
                    "variables": schema.variables().iter().map(|v| v.to_string()).collect::<Vec<_>>(),
                    "items": items,
                });
                Ok(serde_json::to_string_pretty(&output)?)
            }
            OutputFormat::Table => {
                let mut builder = Builder::default();
                builder.push_record(["Item type", "Items"]);
                for (item_type, count) in counts {
                    builder.push_record([item_type.clone(), count.to_string()]);
                }
                Ok(format!("{}\n{}", definition.trim_end(), styled(builder)))
            }
        }
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an info message.
    pub fn info(&self, message: &str) -> String {
        self.colorize(&format!("ℹ {}", message), "blue")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    fn heading(&self, title: &str) -> String {
        self.colorize(title, "cyan")
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "red" => text.red().to_string(),
            "green" => text.green().to_string(),
            "blue" => text.blue().to_string(),
            "yellow" => text.yellow().to_string(),
            "cyan" => text.cyan().to_string(),
            _ => text.to_string(),
        }
    }
}

fn styled(builder: Builder) -> String {
    let mut table = builder.build();
    table
        .with(Style::rounded())
        .with(Modify::new(Rows::first()).with(Alignment::center()));
    table.to_string()
}

fn constraint_json(c: &IndependenceConstraint) -> Value {
    json!({
        "first": c.first.to_string(),
        "second": c.second.to_string(),
        "conditioning": c.conditioning.iter().map(|v| v.to_string()).collect::<Vec<_>>(),
        "statistic": c.statistic,
        "p_value": c.p_value,
        "effect_size": c.effect_size,
    })
}

fn dependency_json(dep: &Dependency) -> Value {
    match (dep.cause(), dep.effect()) {
        (Some(cause), Some(effect)) => json!({
            "cause": cause.to_string(),
            "effect": effect.to_string(),
            "rule": dep.rule.map(|r| r.code()),
        }),
        _ => json!({
            "endpoints": [dep.source.to_string(), dep.target.to_string()],
        }),
    }
}
