//! Command-line interface.

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};

use crate::cli::commands::{fix::FixArgs, history::HistoryArgs};

/// Automated repair pipeline for generated web applications.
#[derive(Parser)]
#[command(name = "mender", version, about, long_about = None)]
pub struct Cli {
    /// Output results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a repair session against a project file
    Fix(FixArgs),
    /// Show the fix-history log for a project
    History(HistoryArgs),
}

/// Report a command failure and exit nonzero.
pub fn handle_error(err: anyhow::Error, json: bool) {
    if json {
        let payload = serde_json::json!({ "error": err.to_string() });
        eprintln!("{payload}");
    } else {
        eprintln!("Error: {err:#}");
    }
    std::process::exit(1);
}
