//! Match ingestion for one resolved player
//!
//! Match ids are processed in the order the API returns them. For each id the
//! output store is consulted first; a stored id costs no network call. Otherwise
//! the record is fetched and persisted before the next id is looked at, so an id
//! listed twice in the same run is fetched once.

use crate::api::{MatchId, MatchRecord, PlayerIdentity, RiotApi, Transport};
use crate::shutdown::Shutdown;
use crate::storage::MatchStore;
use crate::HarvestError;
use chrono::{DateTime, Utc};

/// What happened to a single match id
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchOutcome {
    /// Already present in the store
    Skipped,
    /// Fetched and persisted
    Stored { bytes: usize },
}

/// Counters for one player's match list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub listed: usize,
    pub skipped: usize,
    pub stored: usize,
    pub bytes: u64,
}

/// Fetches and persists the matches of one player that are not stored yet
pub struct MatchIngester<'a, T, S> {
    api: &'a RiotApi<T>,
    store: &'a mut S,
    shutdown: &'a Shutdown,
    start_time: DateTime<Utc>,
}

impl<'a, T: Transport, S: MatchStore> MatchIngester<'a, T, S> {
    pub fn new(
        api: &'a RiotApi<T>,
        store: &'a mut S,
        shutdown: &'a Shutdown,
        start_time: DateTime<Utc>,
    ) -> Self {
        Self {
            api,
            store,
            shutdown,
            start_time,
        }
    }

    /// Ingests every new match of `player` started at or after the start time
    pub async fn ingest(&mut self, player: &PlayerIdentity) -> Result<IngestReport, HarvestError> {
        let ids = self.list_matches(player).await?;
        let mut report = IngestReport {
            listed: ids.len(),
            ..IngestReport::default()
        };

        for id in &ids {
            match self
                .ingest_match(id)
                .await
                .map_err(|e| e.in_match(id.as_str()))?
            {
                MatchOutcome::Skipped => report.skipped += 1,
                MatchOutcome::Stored { bytes } => {
                    report.stored += 1;
                    report.bytes += bytes as u64;
                }
            }
        }

        Ok(report)
    }

    /// Lists the player's recent ranked match ids
    pub async fn list_matches(
        &self,
        player: &PlayerIdentity,
    ) -> Result<Vec<MatchId>, HarvestError> {
        let ids = self
            .api
            .list_match_ids(self.shutdown, player, self.start_time)
            .await?;
        tracing::debug!("Player {} has {} recent matches", player.puuid, ids.len());
        Ok(ids)
    }

    /// Returns true if the store already holds `id`
    pub fn exists(&self, id: &MatchId) -> Result<bool, HarvestError> {
        self.shutdown.check()?;
        Ok(self.store.exists(id)?)
    }

    /// Downloads the raw match document
    pub async fn fetch(&self, id: &MatchId) -> Result<MatchRecord, HarvestError> {
        self.api.get_match(self.shutdown, id).await
    }

    /// Writes the record under `id`
    pub fn persist(&mut self, id: &MatchId, record: &MatchRecord) -> Result<(), HarvestError> {
        self.shutdown.check()?;
        self.store.put(id, record)?;
        Ok(())
    }

    async fn ingest_match(&mut self, id: &MatchId) -> Result<MatchOutcome, HarvestError> {
        if self.exists(id)? {
            tracing::debug!("Match {} already stored, skipping", id);
            return Ok(MatchOutcome::Skipped);
        }

        let record = self.fetch(id).await?;
        self.persist(id, &record)?;
        tracing::info!("Stored match {} ({} bytes)", id, record.len());

        Ok(MatchOutcome::Stored {
            bytes: record.len(),
        })
    }
}
