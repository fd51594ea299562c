//! Collection loop
//!
//! The collector walks the ladder strictly sequentially:
//! - [`Collector::run`] pages through the ladder until a page comes back empty
//! - [`EntryResolver`] turns each ladder entry into a player identity
//! - [`MatchIngester`] lists the player's recent matches and stores the new ones
//!
//! Any error aborts the whole run, wrapped with the page, summoner and match it
//! occurred on.

mod crawler;
mod ingester;
mod resolver;
mod stats;

pub use crawler::{Collector, PageOutcome};
pub use ingester::{IngestReport, MatchIngester, MatchOutcome};
pub use resolver::EntryResolver;
pub use stats::{print_run_statistics, RunStats};

use crate::api::build_api;
use crate::config::Config;
use crate::shutdown::Shutdown;
use crate::storage::open_store;
use crate::HarvestError;
use chrono::Utc;

/// Runs a complete collection with the configured API and store
///
/// # Arguments
///
/// * `config` - The loaded configuration
/// * `token` - API token
/// * `shutdown` - Cancellation signal; triggering it aborts the run
///
/// # Returns
///
/// * `Ok(RunStats)` - The ladder was exhausted
/// * `Err(HarvestError)` - The run was aborted
pub async fn run_collect(
    config: &Config,
    token: &str,
    shutdown: Shutdown,
) -> Result<RunStats, HarvestError> {
    let api = build_api(config, token)?;
    let store = open_store(&config.output)?;
    let start_time = config.collector.match_start_time(Utc::now());

    tracing::info!(
        "Collecting {} {} {} matches since {}",
        config.api.queue,
        config.api.tier,
        config.api.division,
        start_time.to_rfc3339()
    );

    let mut collector = Collector::new(api, store, start_time, shutdown);
    collector.run().await
}
