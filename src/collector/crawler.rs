//! Ladder page crawler - drives the collection loop

use crate::api::{LadderEntry, RiotApi, Transport};
use crate::collector::ingester::MatchIngester;
use crate::collector::resolver::EntryResolver;
use crate::collector::stats::RunStats;
use crate::shutdown::Shutdown;
use crate::storage::MatchStore;
use crate::HarvestError;
use chrono::{DateTime, Utc};
use std::time::Instant;

/// Result of crawling one ladder page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageOutcome {
    /// The page had entries, all of them processed; the next page follows
    Continue { entries: usize },
    /// The page was empty: the ladder is exhausted
    Exhausted,
}

/// Main collector structure
///
/// Owns the API client and the output store for the duration of a run.
pub struct Collector<T, S> {
    api: RiotApi<T>,
    store: S,
    match_start_time: DateTime<Utc>,
    shutdown: Shutdown,
}

impl<T: Transport, S: MatchStore> Collector<T, S> {
    /// Creates a collector
    ///
    /// # Arguments
    ///
    /// * `api` - Client for the remote API
    /// * `store` - Output store, also used for deduplication
    /// * `match_start_time` - Only matches started at or after this time are listed
    /// * `shutdown` - Cancellation signal checked before every call
    pub fn new(
        api: RiotApi<T>,
        store: S,
        match_start_time: DateTime<Utc>,
        shutdown: Shutdown,
    ) -> Self {
        Self {
            api,
            store,
            match_start_time,
            shutdown,
        }
    }

    /// Consumes the collector, returning its output store
    pub fn into_store(self) -> S {
        self.store
    }

    /// Runs the collection loop
    ///
    /// Pages are requested from 1 upwards. An empty page ends the run
    /// successfully; any error ends it immediately, wrapped with its page number.
    pub async fn run(&mut self) -> Result<RunStats, HarvestError> {
        let started = Instant::now();
        let mut stats = RunStats::default();
        let mut page: u32 = 1;

        loop {
            let outcome = self
                .crawl_page(page, &mut stats)
                .await
                .map_err(|e| e.in_page(page))?;

            match outcome {
                PageOutcome::Continue { entries } => {
                    tracing::info!(
                        "Page {} done ({} entries), {} matches stored so far",
                        page,
                        entries,
                        stats.matches_stored
                    );
                    page += 1;
                }
                PageOutcome::Exhausted => {
                    stats.elapsed = started.elapsed();
                    tracing::info!(
                        "Ladder exhausted at page {}: {} entries, {} matches stored, {} skipped in {:?}",
                        page,
                        stats.entries,
                        stats.matches_stored,
                        stats.matches_skipped,
                        stats.elapsed
                    );
                    return Ok(stats);
                }
            }
        }
    }

    /// Lists one page and processes each of its entries in order
    pub async fn crawl_page(
        &mut self,
        page: u32,
        stats: &mut RunStats,
    ) -> Result<PageOutcome, HarvestError> {
        let entries = self.api.list_entries(&self.shutdown, page).await?;
        stats.pages += 1;
        tracing::info!("Found {} entries on page {}", entries.len(), page);

        if entries.is_empty() {
            return Ok(PageOutcome::Exhausted);
        }

        for entry in &entries {
            self.process_entry(entry, stats)
                .await
                .map_err(|e| e.in_entry(&entry.summoner_id))?;
        }

        Ok(PageOutcome::Continue {
            entries: entries.len(),
        })
    }

    async fn process_entry(
        &mut self,
        entry: &LadderEntry,
        stats: &mut RunStats,
    ) -> Result<(), HarvestError> {
        let player = EntryResolver::new(&self.api, &self.shutdown)
            .resolve(entry)
            .await?;

        let report = MatchIngester::new(
            &self.api,
            &mut self.store,
            &self.shutdown,
            self.match_start_time,
        )
        .ingest(&player)
        .await?;

        stats.record_entry(&report);
        Ok(())
    }
}
