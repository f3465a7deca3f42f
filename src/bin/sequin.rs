//! Command-line interface for the `sequin` crate.
//!
//! Subcommands are implemented in separate files (modules) under `src/bin/sequin/`:
//! - `count_cmd.rs`
//!
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use colored::Colorize;

#[derive(Debug, Parser)]
#[command(name="sequin", version=env!("CARGO_PKG_VERSION"), about="Sequin: CG-anchored motif counter for FASTA files", arg_required_else_help=true)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Count CG-anchored motifs in FASTA files.
    Count(count_cmd::CountCmd),
}

#[path = "sequin/count_cmd.rs"] mod count_cmd;

fn main() -> ExitCode {
    let cli = Cli::parse();
    let res = match cli.command {
        Command::Count(cmd) => count_cmd::run(cmd),
    };

    match res {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("{} {e:#}", "error:".red().bold());
            ExitCode::FAILURE
        }
    }
}
