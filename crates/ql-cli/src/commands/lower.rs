//! Lower command implementation

use anyhow::{Context, Result};
use ql_ast::Statement;
use ql_plan::{explain, lower_statement, BuiltinEnvironment, LoweredStatement, Plan, PlanConfig};
use std::fs;

use crate::cli::{GlobalArgs, LowerArgs, LowerOutput};

/// Execute the lower command
pub fn execute(args: &LowerArgs, global: &GlobalArgs) -> Result<()> {
    let config = load_config(global)?;

    let text = fs::read_to_string(&args.file)
        .with_context(|| format!("Failed to read {}", args.file.display()))?;
    let stmt = Statement::from_json(&text)
        .with_context(|| format!("Failed to decode statement in {}", args.file.display()))?;

    if global.verbose {
        eprintln!(
            "[verbose] Lowering {} ({:?} mode)",
            args.file.display(),
            config.error_mode
        );
    }

    let lowered = lower_statement(&stmt, &BuiltinEnvironment::new(), &config)
        .with_context(|| format!("Failed to lower {}", args.file.display()))?;

    print!("{}", render(&lowered, args.output)?);

    if !lowered.diagnostics.is_empty() {
        eprintln!("{} diagnostic(s):", lowered.diagnostics.len());
        for diagnostic in &lowered.diagnostics {
            eprintln!("  {}", diagnostic);
        }
    }
    Ok(())
}

/// Configuration from `--config`, or the defaults
fn load_config(global: &GlobalArgs) -> Result<PlanConfig> {
    match &global.config {
        Some(path) => {
            let config = PlanConfig::load(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?;
            if global.verbose {
                eprintln!("[verbose] Loaded config from {}", path.display());
            }
            Ok(config)
        }
        None => Ok(PlanConfig::default()),
    }
}

/// Render a lowered statement in the requested format
pub(crate) fn render(lowered: &LoweredStatement, output: LowerOutput) -> Result<String> {
    match output {
        LowerOutput::Json => {
            let mut json = serde_json::to_string_pretty(lowered)
                .context("Failed to serialize lowered statement")?;
            json.push('\n');
            Ok(json)
        }
        LowerOutput::Explain => Ok(match &lowered.plan {
            Plan::Query(rex) => explain(rex),
            Plan::CreateTable(shape) => {
                let mut out = format!("CreateTable {}\n", shape.name);
                for column in &shape.columns {
                    let nullable = if column.nullable { "" } else { " NOT NULL" };
                    out.push_str(&format!("  {} {}{}\n", column.name, column.ty, nullable));
                }
                if !shape.primary_key.is_empty() {
                    out.push_str(&format!("  PRIMARY KEY ({})\n", shape.primary_key.join(", ")));
                }
                for unique in &shape.unique {
                    out.push_str(&format!("  UNIQUE ({})\n", unique.join(", ")));
                }
                for check in &shape.checks {
                    out.push_str(&format!("  CHECK {}\n", check));
                }
                out
            }
        }),
    }
}

#[cfg(test)]
#[path = "lower_test.rs"]
mod tests;
