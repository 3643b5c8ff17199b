//! Command-line interface.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "poolscout",
    version,
    about = "Search inspection reports and download them in tracked batches"
)]
pub struct Cli {
    /// Config file (default: $POOLSCOUT_CONFIG, then poolscout.toml)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Print Prometheus metrics after the command finishes
    #[arg(long, global = true)]
    pub print_metrics: bool,

    /// Print the final batch status as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Show reports already saved for a date
    Saved(DateArgs),
    /// Search a date, flagging reports that are already saved
    Search(DateArgs),
    /// Search a date and download every report not yet saved
    Download(DateArgs),
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Saved(_) => "saved",
            Command::Search(_) => "search",
            Command::Download(_) => "download",
        }
    }

    pub fn date(&self) -> &str {
        match self {
            Command::Saved(args) | Command::Search(args) | Command::Download(args) => &args.date,
        }
    }
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct DateArgs {
    /// Inspection date
    #[arg(long, value_name = "YYYY-MM-DD")]
    pub date: String,
}
