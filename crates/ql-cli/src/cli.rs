//! CLI argument definitions using clap derive API

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// qlc - lower query syntax trees into the relational IR
#[derive(Parser, Debug)]
#[command(name = "qlc")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all commands
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Planner configuration file (YAML)
    #[arg(short, long, global = true, env = "QLC_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Lower a JSON-encoded statement and print its plan
    Lower(LowerArgs),
}

/// Arguments for the lower command
#[derive(Args, Debug)]
pub struct LowerArgs {
    /// File holding one JSON-encoded statement
    pub file: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value = "explain")]
    pub output: LowerOutput,
}

/// Lower output formats
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LowerOutput {
    /// The lowered statement and its diagnostics as JSON
    Json,
    /// Indented operator tree
    Explain,
}

#[cfg(test)]
#[path = "cli_test.rs"]
mod tests;
