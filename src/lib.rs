//! Ladder-Harvest: a ranked-ladder match collector
//!
//! This crate walks the ranked ladder of a game-data API page by page, resolves every
//! listed player to a stable identifier, and stores each recent match record it has not
//! collected before.

pub mod api;
pub mod collector;
pub mod config;
pub mod shutdown;
pub mod storage;

use thiserror::Error;

/// Main error type for Ladder-Harvest operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid request for {operation}: {reason}")]
    InvalidRequest {
        operation: &'static str,
        reason: String,
    },

    #[error("HTTP error during {operation}: {source}")]
    Transport {
        operation: &'static str,
        source: reqwest::Error,
    },

    #[error("{operation} failed with status {status}:\n{dump}")]
    Status {
        operation: &'static str,
        status: u16,
        dump: String,
    },

    #[error("Failed to decode {operation} response: {source}")]
    Decode {
        operation: &'static str,
        source: serde_json::Error,
    },

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Ladder page {page}: {source}")]
    Page {
        page: u32,
        source: Box<HarvestError>,
    },

    #[error("Summoner {summoner_id}: {source}")]
    Entry {
        summoner_id: String,
        source: Box<HarvestError>,
    },

    #[error("Match {match_id}: {source}")]
    Match {
        match_id: String,
        source: Box<HarvestError>,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl HarvestError {
    /// Wraps the error with the ladder page it occurred on
    pub fn in_page(self, page: u32) -> Self {
        Self::Page {
            page,
            source: Box::new(self),
        }
    }

    /// Wraps the error with the summoner being processed
    pub fn in_entry(self, summoner_id: &str) -> Self {
        Self::Entry {
            summoner_id: summoner_id.to_string(),
            source: Box::new(self),
        }
    }

    /// Wraps the error with the match being processed
    pub fn in_match(self, match_id: &str) -> Self {
        Self::Match {
            match_id: match_id.to_string(),
            source: Box::new(self),
        }
    }

    /// Returns the innermost error, skipping page/entry/match context
    pub fn root(&self) -> &HarvestError {
        match self {
            Self::Page { source, .. } | Self::Entry { source, .. } | Self::Match { source, .. } => {
                source.root()
            }
            other => other,
        }
    }

    /// HTTP status of the failed call, if the run failed on a remote status
    pub fn status(&self) -> Option<u16> {
        match self.root() {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns true if the run stopped because cancellation was requested
    pub fn is_cancelled(&self) -> bool {
        matches!(self.root(), Self::Cancelled)
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for Ladder-Harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use api::{LadderEntry, MatchId, MatchRecord, PlayerIdentity, RiotApi};
pub use collector::{Collector, RunStats};
pub use config::Config;
pub use shutdown::{Shutdown, ShutdownTrigger};
pub use storage::{FileStore, MatchStore, SqliteStore};
