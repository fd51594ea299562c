//! Wire types of the remote API

use serde::Deserialize;
use std::fmt;

/// One row of a ranked ladder page
///
/// Only the fields the collector needs are decoded; the rest of the row is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LadderEntry {
    pub league_id: String,
    /// Opaque, platform-scoped player id
    pub summoner_id: String,
}

/// Stable player identifier resolved from a summoner id
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PlayerIdentity {
    pub puuid: String,
}

/// Opaque match identifier, e.g. `JP1_412345678`
///
/// Used both as the remote lookup key and as the key of the stored record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(transparent)]
pub struct MatchId(String);

impl MatchId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MatchId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Raw match document, stored exactly as received
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchRecord(Vec<u8>);

impl MatchRecord {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<u8>> for MatchRecord {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}
