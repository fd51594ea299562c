//! Typed client for the four endpoints the collector consumes
//!
//! Every call checks the cancellation signal before it is issued and races the
//! exchange against it while in flight. Failures are classified as:
//! - request construction (`InvalidRequest`)
//! - transport (`Transport`)
//! - remote status >= 400 (`Status`, carrying a dump of the response)
//! - body decoding (`Decode`)

use crate::api::transport::Transport;
use crate::api::types::{LadderEntry, MatchId, MatchRecord, PlayerIdentity};
use crate::config::ApiConfig;
use crate::shutdown::Shutdown;
use crate::HarvestError;
use chrono::{DateTime, Utc};
use reqwest::{Method, Request, Response};
use serde::de::DeserializeOwned;
use std::fmt::Write;
use url::Url;

/// Match type requested from the match-listing endpoint
pub const MATCH_TYPE: &str = "ranked";

/// Number of match ids requested per player
pub const MATCH_COUNT: u32 = 10;

/// Response bodies longer than this are cut in error dumps
const MAX_DUMP_BODY: usize = 4096;

/// Client for the ladder, summoner and match endpoints
pub struct RiotApi<T> {
    transport: T,
    platform_url: Url,
    regional_url: Url,
    queue: String,
    tier: String,
    division: String,
}

impl<T: Transport> RiotApi<T> {
    /// Creates a client targeting the hosts and ladder division in `config`
    pub fn new(transport: T, config: &ApiConfig) -> Result<Self, HarvestError> {
        Ok(Self {
            transport,
            platform_url: parse_base("platform_url", &config.platform_url)?,
            regional_url: parse_base("regional_url", &config.regional_url)?,
            queue: config.queue.clone(),
            tier: config.tier.clone(),
            division: config.division.clone(),
        })
    }

    /// Lists one page of the ladder for the configured queue, tier and division
    ///
    /// An empty vector means there are no further pages.
    pub async fn list_entries(
        &self,
        shutdown: &Shutdown,
        page: u32,
    ) -> Result<Vec<LadderEntry>, HarvestError> {
        const OPERATION: &str = "list ladder entries";

        let mut url = endpoint(
            &self.platform_url,
            &[
                "lol",
                "league",
                "v4",
                "entries",
                self.queue.as_str(),
                self.tier.as_str(),
                self.division.as_str(),
            ],
            OPERATION,
        )?;
        url.query_pairs_mut()
            .append_pair("page", &page.to_string());

        self.get_json(shutdown, OPERATION, url).await
    }

    /// Resolves a summoner id into the player's puuid
    pub async fn get_summoner(
        &self,
        shutdown: &Shutdown,
        summoner_id: &str,
    ) -> Result<PlayerIdentity, HarvestError> {
        const OPERATION: &str = "get summoner";

        let url = endpoint(
            &self.platform_url,
            &["lol", "summoner", "v4", "summoners", summoner_id],
            OPERATION,
        )?;

        self.get_json(shutdown, OPERATION, url).await
    }

    /// Lists the player's most recent ranked match ids started at or after `start_time`
    pub async fn list_match_ids(
        &self,
        shutdown: &Shutdown,
        player: &PlayerIdentity,
        start_time: DateTime<Utc>,
    ) -> Result<Vec<MatchId>, HarvestError> {
        const OPERATION: &str = "list match ids";

        let mut url = endpoint(
            &self.regional_url,
            &["lol", "match", "v5", "matches", "by-puuid", player.puuid.as_str(), "ids"],
            OPERATION,
        )?;
        url.query_pairs_mut()
            .append_pair("type", MATCH_TYPE)
            .append_pair("count", &MATCH_COUNT.to_string())
            .append_pair("startTime", &start_time.timestamp().to_string());

        self.get_json(shutdown, OPERATION, url).await
    }

    /// Fetches the raw match document
    pub async fn get_match(
        &self,
        shutdown: &Shutdown,
        match_id: &MatchId,
    ) -> Result<MatchRecord, HarvestError> {
        const OPERATION: &str = "get match";

        let url = endpoint(
            &self.regional_url,
            &["lol", "match", "v5", "matches", match_id.as_str()],
            OPERATION,
        )?;

        let body = self.get_bytes(shutdown, OPERATION, url).await?;
        Ok(MatchRecord::from(body))
    }

    async fn get_json<D: DeserializeOwned>(
        &self,
        shutdown: &Shutdown,
        operation: &'static str,
        url: Url,
    ) -> Result<D, HarvestError> {
        let body = self.get_bytes(shutdown, operation, url).await?;
        serde_json::from_slice(&body).map_err(|source| HarvestError::Decode { operation, source })
    }

    /// Issues a GET and returns the body of a successful response
    async fn get_bytes(
        &self,
        shutdown: &Shutdown,
        operation: &'static str,
        url: Url,
    ) -> Result<Vec<u8>, HarvestError> {
        shutdown.check()?;
        tracing::trace!("GET {}", url);

        let exchange = async {
            let response = self
                .transport
                .send(Request::new(Method::GET, url))
                .await
                .map_err(|source| HarvestError::Transport { operation, source })?;

            let status = response.status();
            if status.as_u16() >= 400 {
                return Err(HarvestError::Status {
                    operation,
                    status: status.as_u16(),
                    dump: dump_response(response).await,
                });
            }

            let body = response
                .bytes()
                .await
                .map_err(|source| HarvestError::Transport { operation, source })?;
            Ok(body.to_vec())
        };

        tokio::select! {
            biased;
            _ = shutdown.triggered() => Err(HarvestError::Cancelled),
            result = exchange => result,
        }
    }
}

fn parse_base(field: &str, value: &str) -> Result<Url, HarvestError> {
    let url = Url::parse(value).map_err(|e| HarvestError::InvalidRequest {
        operation: "configure api client",
        reason: format!("invalid {} '{}': {}", field, value, e),
    })?;
    if url.cannot_be_a_base() {
        return Err(HarvestError::InvalidRequest {
            operation: "configure api client",
            reason: format!("{} '{}' cannot be used as a base URL", field, value),
        });
    }
    Ok(url)
}

/// Appends percent-encoded path segments to `base`
///
/// Empty segments are rejected, they would address a different endpoint.
fn endpoint(base: &Url, segments: &[&str], operation: &'static str) -> Result<Url, HarvestError> {
    if segments.iter().any(|segment| segment.is_empty()) {
        return Err(HarvestError::InvalidRequest {
            operation,
            reason: format!("empty path parameter in {:?}", segments),
        });
    }

    let mut url = base.clone();
    {
        let mut path = url
            .path_segments_mut()
            .map_err(|_| HarvestError::InvalidRequest {
                operation,
                reason: format!("{} cannot be used as a base URL", base),
            })?;
        path.pop_if_empty().extend(segments);
    }
    Ok(url)
}

/// Renders status line, headers and (truncated) body of an error response
async fn dump_response(response: Response) -> String {
    let mut dump = String::new();
    let _ = write!(dump, "{:?} {}\r\n", response.version(), response.status());
    for (name, value) in response.headers() {
        let _ = write!(
            dump,
            "{}: {}\r\n",
            name,
            value.to_str().unwrap_or("<non-ascii>")
        );
    }
    dump.push_str("\r\n");

    match response.text().await {
        Ok(body) if body.len() > MAX_DUMP_BODY => {
            dump.extend(body.chars().take(MAX_DUMP_BODY));
            dump.push_str("...");
        }
        Ok(body) => dump.push_str(&body),
        Err(e) => {
            let _ = write!(dump, "<body unavailable: {}>", e);
        }
    }
    dump
}
