//! Remote game-data API access
//!
//! This module contains everything that talks to the remote API:
//! - Wire types for ladder entries, summoners and matches
//! - Transports: the base HTTP client and the decorators composed over it
//!   (token injection, retry with backoff)
//! - The typed client used by the collector

mod client;
mod transport;
mod types;

pub use client::{RiotApi, MATCH_COUNT, MATCH_TYPE};
pub use transport::{AuthTransport, HttpTransport, RetryPolicy, RetryTransport, Transport, TOKEN_HEADER};
pub use types::{LadderEntry, MatchId, MatchRecord, PlayerIdentity};

use crate::config::Config;
use crate::HarvestError;

/// Transport stack used by the binary: HTTP, then token injection, then retries
pub type DefaultTransport = RetryTransport<AuthTransport<HttpTransport>>;

/// Builds the API client with the full transport stack
///
/// # Arguments
///
/// * `config` - The loaded configuration
/// * `token` - API token sent in the `X-Riot-Token` header
pub fn build_api(config: &Config, token: &str) -> Result<RiotApi<DefaultTransport>, HarvestError> {
    let http = HttpTransport::new(&config.api).map_err(|source| HarvestError::Transport {
        operation: "build http client",
        source,
    })?;
    let auth = AuthTransport::new(token, http).map_err(|e| HarvestError::InvalidRequest {
        operation: "build http client",
        reason: format!("token is not a valid header value: {}", e),
    })?;
    let transport = RetryTransport::new(auth, RetryPolicy::from(&config.retry));
    RiotApi::new(transport, &config.api)
}
