use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;

/// Tiers accepted by the ladder-entries endpoint
pub const RANKED_TIERS: [&str; 7] = [
    "IRON", "BRONZE", "SILVER", "GOLD", "PLATINUM", "EMERALD", "DIAMOND",
];

/// Main configuration structure for Ladder-Harvest
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub collector: CollectorConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Remote API configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the platform routing host (ladder and summoner endpoints)
    #[serde(rename = "platform-url")]
    pub platform_url: String,

    /// Base URL of the regional routing host (match endpoints)
    #[serde(rename = "regional-url")]
    pub regional_url: String,

    /// Ranked queue whose ladder is walked
    pub queue: String,

    /// Ladder tier, e.g. "SILVER"
    pub tier: String,

    /// Ladder division, "I" to "IV"
    pub division: String,

    /// Per-request timeout in seconds
    #[serde(rename = "timeout-secs")]
    pub timeout_secs: u64,

    /// User agent sent with every request
    #[serde(rename = "user-agent")]
    pub user_agent: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            platform_url: "https://jp1.api.riotgames.com".to_string(),
            regional_url: "https://asia.api.riotgames.com".to_string(),
            queue: "RANKED_SOLO_5x5".to_string(),
            tier: "SILVER".to_string(),
            division: "I".to_string(),
            timeout_secs: 30,
            user_agent: concat!("ladder-harvest/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Collection loop configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CollectorConfig {
    /// Only matches started within this many days are listed
    #[serde(rename = "lookback-days")]
    pub lookback_days: u32,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self { lookback_days: 7 }
    }
}

impl CollectorConfig {
    /// Start-time cutoff for match listing, relative to `now`
    ///
    /// Saturates at the earliest representable time instead of overflowing.
    pub fn match_start_time(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        Duration::try_days(i64::from(self.lookback_days))
            .and_then(|lookback| now.checked_sub_signed(lookback))
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }
}

/// Retry policy applied by the transport underneath the collector
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Retries after the first attempt; 0 disables retrying
    #[serde(rename = "max-retries")]
    pub max_retries: u32,

    /// Backoff before the first retry (milliseconds)
    #[serde(rename = "min-backoff-ms")]
    pub min_backoff_ms: u64,

    /// Upper bound for any single backoff (milliseconds)
    #[serde(rename = "max-backoff-ms")]
    pub max_backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 4,
            min_backoff_ms: 1000,
            max_backoff_ms: 30_000,
        }
    }
}

/// Which backend holds collected match records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// One `<match-id>.json` file per match in `directory`
    #[default]
    Files,
    /// A single SQLite database at `database-path`
    Sqlite,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub backend: StoreBackend,

    /// Directory receiving match files
    pub directory: String,

    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Files,
            directory: "out".to_string(),
            database_path: "matches.db".to_string(),
        }
    }
}
