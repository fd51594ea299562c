use crate::api::{LadderEntry, PlayerIdentity, RiotApi, Transport};
use crate::shutdown::Shutdown;
use crate::HarvestError;

/// Resolves ladder entries into player identities
///
/// Every entry costs one lookup; results are not cached, ladder pages do not
/// overlap.
pub struct EntryResolver<'a, T> {
    api: &'a RiotApi<T>,
    shutdown: &'a Shutdown,
}

impl<'a, T: Transport> EntryResolver<'a, T> {
    pub fn new(api: &'a RiotApi<T>, shutdown: &'a Shutdown) -> Self {
        Self { api, shutdown }
    }

    /// Looks up the puuid of the entry's summoner
    pub async fn resolve(&self, entry: &LadderEntry) -> Result<PlayerIdentity, HarvestError> {
        tracing::debug!(
            "Resolving summoner {} (league {})",
            entry.summoner_id,
            entry.league_id
        );
        self.api.get_summoner(self.shutdown, &entry.summoner_id).await
    }
}
