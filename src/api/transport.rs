//! Transports for outbound API requests
//!
//! The collector only sees [`Transport`]. Concerns that are not part of the
//! collection logic are layered as decorators around the base HTTP client:
//! - [`AuthTransport`] attaches the API token to every request
//! - [`RetryTransport`] retries transient failures with exponential backoff
//!
//! # Retry Logic
//!
//! | Condition | Action |
//! |-----------|--------|
//! | HTTP 429 | Retry, honoring `Retry-After` |
//! | HTTP 5xx (except 501) | Retry with backoff |
//! | Connect error / timeout | Retry with backoff |
//! | Anything else | Returned as-is |

use crate::config::{ApiConfig, RetryConfig};
use async_trait::async_trait;
use reqwest::header::{HeaderValue, InvalidHeaderValue, RETRY_AFTER};
use reqwest::{Client, Request, Response, StatusCode};
use std::time::Duration;

/// Header carrying the API token (`X-Riot-Token`)
pub const TOKEN_HEADER: &str = "x-riot-token";

/// Sends a prepared request and returns the raw response
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: Request) -> reqwest::Result<Response>;
}

/// Base transport backed by a reqwest client
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Builds the HTTP client from the API configuration
    pub fn new(config: &ApiConfig) -> reqwest::Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .gzip(true)
            .brotli(true)
            .build()?;
        Ok(Self { client })
    }

    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: Request) -> reqwest::Result<Response> {
        self.client.execute(request).await
    }
}

/// Decorator that attaches the API token to each request
pub struct AuthTransport<T> {
    token: HeaderValue,
    inner: T,
}

impl<T> AuthTransport<T> {
    pub fn new(token: &str, inner: T) -> Result<Self, InvalidHeaderValue> {
        let mut token = HeaderValue::from_str(token)?;
        token.set_sensitive(true);
        Ok(Self { token, inner })
    }
}

#[async_trait]
impl<T: Transport> Transport for AuthTransport<T> {
    async fn send(&self, mut request: Request) -> reqwest::Result<Response> {
        request
            .headers_mut()
            .insert(TOKEN_HEADER, self.token.clone());
        self.inner.send(request).await
    }
}

/// Retry schedule for [`RetryTransport`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub min_backoff: Duration,
    pub max_backoff: Duration,
}

impl RetryPolicy {
    /// A policy that never retries
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            min_backoff: Duration::ZERO,
            max_backoff: Duration::ZERO,
        }
    }

    /// Backoff before retry number `attempt + 1`: `min * 2^attempt`, capped at `max`
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.min_backoff
            .saturating_mul(1u32 << attempt.min(16))
            .min(self.max_backoff)
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            min_backoff: Duration::from_millis(config.min_backoff_ms),
            max_backoff: Duration::from_millis(config.max_backoff_ms),
        }
    }
}

/// Decorator that retries transient failures
pub struct RetryTransport<T> {
    inner: T,
    policy: RetryPolicy,
}

impl<T> RetryTransport<T> {
    pub fn new(inner: T, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    /// Delay before retrying `result`, or `None` if it should be returned
    fn retry_delay(&self, result: &reqwest::Result<Response>, attempt: u32) -> Option<Duration> {
        match result {
            Ok(response) if is_retryable_status(response.status()) => Some(
                retry_after(response)
                    .map(|wait| wait.min(self.policy.max_backoff))
                    .unwrap_or_else(|| self.policy.backoff(attempt)),
            ),
            Ok(_) => None,
            Err(e) if e.is_connect() || e.is_timeout() => Some(self.policy.backoff(attempt)),
            Err(_) => None,
        }
    }
}

#[async_trait]
impl<T: Transport> Transport for RetryTransport<T> {
    async fn send(&self, mut request: Request) -> reqwest::Result<Response> {
        let mut attempt = 0;
        loop {
            let next = if attempt < self.policy.max_retries {
                request.try_clone()
            } else {
                None
            };
            let url = request.url().clone();

            let result = self.inner.send(request).await;

            let Some(next) = next else {
                return result;
            };
            let Some(wait) = self.retry_delay(&result, attempt) else {
                return result;
            };

            match &result {
                Ok(response) => tracing::warn!(
                    "{} returned {}, retrying in {:?} ({}/{})",
                    url.path(),
                    response.status(),
                    wait,
                    attempt + 1,
                    self.policy.max_retries
                ),
                Err(e) => tracing::warn!(
                    "{} failed: {}, retrying in {:?} ({}/{})",
                    url.path(),
                    e,
                    wait,
                    attempt + 1,
                    self.policy.max_retries
                ),
            }
            drop(result);

            tokio::time::sleep(wait).await;
            request = next;
            attempt += 1;
        }
    }
}

fn is_retryable_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS
        || (status.is_server_error() && status != StatusCode::NOT_IMPLEMENTED)
}

/// Parses a `Retry-After` header given in whole seconds
fn retry_after(response: &Response) -> Option<Duration> {
    response
        .headers()
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}
