use std::path::Path;

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use dwell_cli::commands::{clear, run, status};
use dwell_cli::{Cli, Commands, Config};

/// Load config and open database, ensuring the parent directory exists.
fn open_database(config_path: Option<&Path>) -> Result<(dwell_db::Database, Config)> {
    let config = Config::load_from(config_path).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent).context("failed to create database directory")?;
    }

    let db = dwell_db::Database::open(&config.database_path).with_context(|| {
        format!("failed to open {}", config.database_path.display())
    })?;
    Ok((db, config))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Use try_init to avoid panic if tracing is already initialized (e.g., in tests)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    let mut stdout = std::io::stdout().lock();

    match &cli.command {
        Some(Commands::Run) => {
            let (db, config) = open_database(cli.config.as_deref())?;
            let heartbeat = config
                .heartbeat_interval()
                .context("heartbeat_interval_secs must be greater than zero")?;
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
                .context("failed to start async runtime")?;
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            runtime.block_on(run::run(stdin, db, heartbeat))?;
        }
        Some(Commands::Status { date, range, json }) => {
            let (db, config) = open_database(cli.config.as_deref())?;
            if *json {
                status::run_json(&mut stdout, &db)?;
            } else {
                let anchor = date.unwrap_or_else(|| Local::now().date_naive());
                let (start, end) = range
                    .bounds(anchor)
                    .context("date range is outside the supported calendar")?;
                status::run(&mut stdout, &db, &config.database_path, start, end)?;
            }
        }
        Some(Commands::Clear { yes }) => {
            let (db, _config) = open_database(cli.config.as_deref())?;
            clear::run(&mut stdout, &db, *yes)?;
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
