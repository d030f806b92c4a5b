//! CNPJ Harvest main entry point
//!
//! This is the command-line interface for the registry harvester.

use anyhow::Context;
use chrono::Local;
use clap::Parser;
use cnpj_harvest::config::{load_config_with_hash, load_dotenv, Config};
use cnpj_harvest::harvest::{build_query, run_daily, run_once};
use cnpj_harvest::output::print_summary;
use cnpj_harvest::storage::open_store;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// CNPJ Harvest: daily loader for newly registered companies
///
/// Pages through the registry search API for companies opened in a date
/// window and inserts one flat row per company into a SQLite table.
#[derive(Parser, Debug)]
#[command(name = "cnpj-harvest")]
#[command(version)]
#[command(about = "Harvest newly registered companies into SQLite", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Keep running and harvest once a day at the configured time
    #[arg(long, conflicts_with_all = ["dry_run", "init_schema"])]
    daily: bool,

    /// Show the configuration and the first query without touching the network or database
    #[arg(long, conflicts_with_all = ["daily", "init_schema"])]
    dry_run: bool,

    /// Create the target table for the configured layout and exit
    #[arg(long, conflicts_with_all = ["daily", "dry_run"])]
    init_schema: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);
    if let Some(path) = load_dotenv(&cli.config) {
        tracing::debug!("Loaded environment from {}", path.display());
    }

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.dry_run {
        handle_dry_run(&config)?;
        return Ok(ExitCode::SUCCESS);
    }

    if cli.init_schema {
        handle_init_schema(&config)?;
        return Ok(ExitCode::SUCCESS);
    }

    if cli.daily {
        run_daily(config).await.context("daily scheduler")?;
        return Ok(ExitCode::SUCCESS);
    }

    handle_run(&config).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("cnpj_harvest=info,warn"),
            1 => EnvFilter::new("cnpj_harvest=debug,info"),
            2 => EnvFilter::new("cnpj_harvest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Masks all but the last four characters of a secret
fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.is_empty() {
        return "(not set)".to_string();
    }
    if chars.len() <= 4 {
        return "*".repeat(chars.len());
    }
    let visible: String = chars[chars.len() - 4..].iter().collect();
    format!("{}{}", "*".repeat(chars.len() - 4), visible)
}

/// Handles the --dry-run mode: prints the configuration and the page-1 body
fn handle_dry_run(config: &Config) -> anyhow::Result<()> {
    println!("=== CNPJ Harvest Dry Run ===\n");

    println!("Registry:");
    println!("  Endpoint: {}", config.api.endpoint);
    println!("  API key: {}", mask_secret(&config.api.api_key));
    println!("  Timeout: {}s", config.api.timeout_secs);

    println!("\nDatabase:");
    println!("  Path: {}", config.database.path);
    println!("  Table: {}", config.database.table);
    println!("  Layout: {}", config.database.variant);

    println!("\nSchedule:");
    println!("  Daily at: {}", config.schedule.run_at);

    let query = build_query(&config.query, Local::now().date_naive());
    println!("\nFirst request body:");
    println!("{}", serde_json::to_string_pretty(&query)?);

    println!("\n✓ Configuration is valid");

    Ok(())
}

/// Handles the --init-schema mode: creates the target table
fn handle_init_schema(config: &Config) -> anyhow::Result<()> {
    let store = open_store(&config.database)?;
    store.initialize_table()?;

    println!(
        "✓ Table {} ready ({} layout) in {}",
        store.table(),
        store.variant(),
        config.database.path
    );

    Ok(())
}

/// Handles a single run: exits non-zero when a fatal failure ended it
async fn handle_run(config: &Config) -> anyhow::Result<ExitCode> {
    match run_once(config).await {
        Ok(summary) => {
            print_summary(&summary);
            if summary.is_success() {
                Ok(ExitCode::SUCCESS)
            } else {
                Ok(ExitCode::FAILURE)
            }
        }
        Err(e) => {
            tracing::error!("Harvest aborted: {}", e);
            Err(e.into())
        }
    }
}
