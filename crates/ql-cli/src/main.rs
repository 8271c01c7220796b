//! qlc: lower JSON-encoded statements and print the resulting IR

use anyhow::Result;
use clap::Parser;

mod cli;
mod commands;

use cli::Cli;
use commands::lower;

fn main() -> Result<()> {
    let cli = Cli::parse();

    match &cli.command {
        cli::Commands::Lower(args) => lower::execute(args, &cli.global),
    }
}
