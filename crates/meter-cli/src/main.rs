use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use meter_cli::commands::{export, import, report, reset, run, status};
use meter_cli::{Cli, Commands, Config};
use meter_core::AttentionEngine;

/// Load config and open database, ensuring the parent directory exists.
fn open_database(config_path: Option<&Path>) -> Result<(meter_db::Database, Config)> {
    let config = Config::load_from(config_path).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent).context("failed to create database directory")?;
    }

    let db =
        meter_db::Database::open(&config.database_path).context("failed to open database")?;
    Ok((db, config))
}

/// Runs the tracking loop over stdin until end of input or Ctrl-C.
fn run_tracker(mut db: meter_db::Database, config: Config) -> Result<()> {
    let mut engine =
        AttentionEngine::new(config.attention, Utc::now()).context("invalid attention config")?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start runtime")?;

    runtime.block_on(async {
        let stdin = tokio::io::BufReader::new(tokio::io::stdin());
        let interrupted = async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                tracing::warn!(%err, "failed to listen for Ctrl-C");
                std::future::pending::<()>().await;
            }
        };
        run::run(stdin, &mut engine, &mut db, interrupted).await
    })?;
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Logs go to stderr so stdout stays clean for report and export output
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    match &cli.command {
        Some(Commands::Run) => {
            let (db, config) = open_database(cli.config.as_deref())?;
            run_tracker(db, config)?;
        }
        Some(Commands::Report {
            date,
            yesterday,
            days_ago,
            json,
        }) => {
            let (db, _config) = open_database(cli.config.as_deref())?;
            let selection = match (date, days_ago) {
                (Some(date), _) => report::DaySelection::Date(*date),
                (None, Some(days)) => report::DaySelection::DaysAgo(*days),
                (None, None) if *yesterday => report::DaySelection::DaysAgo(1),
                (None, None) => report::DaySelection::Today,
            };
            report::run(&db, selection, *json)?;
        }
        Some(Commands::Export { output }) => {
            let (db, _config) = open_database(cli.config.as_deref())?;
            export::run(&db, output.as_deref())?;
        }
        Some(Commands::Import { file }) => {
            let (mut db, _config) = open_database(cli.config.as_deref())?;
            import::run(&mut db, file)?;
        }
        Some(Commands::Reset { yes }) => {
            let (mut db, _config) = open_database(cli.config.as_deref())?;
            reset::run(&mut db, *yes)?;
        }
        Some(Commands::Status) => {
            let (db, config) = open_database(cli.config.as_deref())?;
            let mut stdout = std::io::stdout().lock();
            status::run(&mut stdout, &db, &config, Utc::now().date_naive())?;
        }
        None => {
            // No subcommand, show help
            use clap::CommandFactory;
            Cli::command().print_help()?;
            println!();
        }
    }

    Ok(())
}
