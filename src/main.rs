//! Ladder-Harvest main entry point
//!
//! This is the command-line interface for the Ladder-Harvest match collector.

use chrono::{DateTime, Utc};
use clap::Parser;
use ladder_harvest::api::{MATCH_COUNT, MATCH_TYPE};
use ladder_harvest::collector::{print_run_statistics, run_collect};
use ladder_harvest::config::{load_config_with_hash, validate, Config, StoreBackend};
use ladder_harvest::shutdown;
use ladder_harvest::storage::{open_store, MatchStore};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Ladder-Harvest: a ranked-ladder match collector
///
/// Walks the ranked ladder page by page, resolves each player, and stores every
/// recent match record that is not in the output store yet. Runs always start at
/// page 1; matches collected by earlier runs are skipped.
#[derive(Parser, Debug)]
#[command(name = "ladder-harvest")]
#[command(version)]
#[command(about = "A ranked-ladder match collector", long_about = None)]
struct Cli {
    /// API token sent with every request
    #[arg(value_name = "TOKEN", env = "RIOT_API_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Path to TOML configuration file (defaults apply without one)
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Directory receiving match files (overrides output.directory)
    #[arg(long, value_name = "DIR")]
    output_dir: Option<String>,

    /// Only collect matches from the last N days (overrides collector.lookback-days)
    #[arg(long, value_name = "DAYS")]
    lookback_days: Option<u32>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be requested without calling the API
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show how many matches the output store holds and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("ladder_harvest=info,warn"),
            1 => EnvFilter::new("ladder_harvest=debug,info"),
            2 => EnvFilter::new("ladder_harvest=trace,debug"),
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

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = load(&cli)?;

    if cli.dry_run {
        handle_dry_run(&config);
        Ok(())
    } else if cli.stats {
        handle_stats(&config)
    } else {
        handle_collect(&config, cli.token.as_deref()).await
    }
}

/// Loads the configuration file (if any) and applies command-line overrides
fn load(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => {
            tracing::debug!("No configuration file given, using defaults");
            Config::default()
        }
    };

    if let Some(dir) = &cli.output_dir {
        config.output.backend = StoreBackend::Files;
        config.output.directory = dir.clone();
    }
    if let Some(days) = cli.lookback_days {
        config.collector.lookback_days = days;
    }

    validate(&config)?;
    Ok(config)
}

/// Handles the --dry-run mode: shows the resolved configuration
fn handle_dry_run(config: &Config) {
    println!("=== Ladder-Harvest Dry Run ===\n");

    let start_time = config.collector.match_start_time(Utc::now());

    println!("Requests:");
    for line in request_plan(config, start_time) {
        println!("  {}", line);
    }

    println!("\nCollector:");
    println!("  Lookback: {} days", config.collector.lookback_days);
    println!("  Match start time: {}", start_time.to_rfc3339());

    println!("\nRetry:");
    println!("  Max retries: {}", config.retry.max_retries);
    println!(
        "  Backoff: {}ms - {}ms",
        config.retry.min_backoff_ms, config.retry.max_backoff_ms
    );

    println!("\nOutput:");
    match config.output.backend {
        StoreBackend::Files => println!("  Directory: {}", config.output.directory),
        StoreBackend::Sqlite => println!("  Database: {}", config.output.database_path),
    }

    println!("\n✓ Configuration is valid");
}

/// Endpoints a run would call, in the order they are first used
fn request_plan(config: &Config, start_time: DateTime<Utc>) -> Vec<String> {
    let api = &config.api;
    vec![
        format!(
            "Ladder: {}/lol/league/v4/entries/{}/{}/{}?page=1..",
            api.platform_url, api.queue, api.tier, api.division
        ),
        format!("Summoners: {}/lol/summoner/v4/summoners/{{id}}", api.platform_url),
        format!(
            "Match ids: {}/lol/match/v5/matches/by-puuid/{{puuid}}/ids?type={}&count={}&startTime={}",
            api.regional_url,
            MATCH_TYPE,
            MATCH_COUNT,
            start_time.timestamp()
        ),
        format!("Matches: {}/lol/match/v5/matches/{{id}}", api.regional_url),
    ]
}

/// Handles the --stats mode: counts stored matches
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    let store = open_store(&config.output)?;
    let count = store.count()?;

    match config.output.backend {
        StoreBackend::Files => println!("Directory: {}", config.output.directory),
        StoreBackend::Sqlite => println!("Database: {}", config.output.database_path),
    }
    println!("Stored matches: {}", count);

    Ok(())
}

/// Handles the main collection run
async fn handle_collect(config: &Config, token: Option<&str>) -> anyhow::Result<()> {
    let token = match token {
        Some(token) if !token.trim().is_empty() => token.trim(),
        _ => anyhow::bail!("an API token is required (argument or RIOT_API_TOKEN)"),
    };

    let (trigger, shutdown) = shutdown::channel();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, stopping");
            trigger.trigger();
        }
    });

    let stats = run_collect(config, token, shutdown).await?;
    tracing::info!("Collection completed successfully");
    print_run_statistics(&stats);

    Ok(())
}
