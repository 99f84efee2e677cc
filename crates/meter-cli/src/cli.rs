//! Command-line argument definitions.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use meter_core::parse_day_key;

/// Attention-aware browsing time meter.
///
/// Reads browser host events on stdin and records time per domain only while
/// the user is actually paying attention.
#[derive(Debug, Parser)]
#[command(name = "meter", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Track attention from newline-delimited JSON host events on stdin.
    Run,

    /// Show time per domain for one day.
    Report {
        /// Day to report (YYYY-MM-DD).
        #[arg(long, value_parser = parse_date, conflicts_with_all = ["yesterday", "days_ago"])]
        date: Option<NaiveDate>,

        /// Report yesterday instead of today.
        #[arg(long, conflicts_with = "days_ago")]
        yesterday: bool,

        /// Report the day this many days ago.
        #[arg(long)]
        days_ago: Option<u32>,

        /// Output as JSON instead of human-readable format.
        #[arg(long)]
        json: bool,
    },

    /// Export all tracked days as JSON.
    Export {
        /// Write to this file instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Import tracked days from a JSON export, replacing matching days.
    Import {
        /// Exported JSON file.
        file: PathBuf,
    },

    /// Delete all tracked days.
    Reset {
        /// Confirm deletion.
        #[arg(long)]
        yes: bool,
    },

    /// Show database location and today's total.
    Status,
}

fn parse_date(value: &str) -> Result<NaiveDate, String> {
    parse_day_key(value).ok_or_else(|| format!("expected YYYY-MM-DD, got '{value}'"))
}
