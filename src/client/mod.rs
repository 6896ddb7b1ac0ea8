//! HTTP access to the market data source.
//!
//! The retry/backoff capability lives here as its own layer so it can be
//! swapped or mocked in tests without touching the detector or scheduler.

mod gamma;

pub use gamma::{GammaClient, GAMMA_BASE};

use crate::error::{Result, TrackerError};
use crate::types::MarketRecord;
use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

/// Source of ranked market snapshots. The poll loop only depends on this
/// trait, which keeps it testable with a mock source.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MarketSource: Send + Sync {
    /// Top `limit` active markets ranked by descending 24h volume.
    async fn fetch_top_markets(&self, limit: usize) -> Result<Vec<MarketRecord>>;
}

/// Response statuses that are worth another attempt.
const RETRY_STATUSES: [u16; 5] = [429, 500, 502, 503, 504];

/// Bounded exponential backoff: `backoff_base * 2^attempt`.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff_base: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff_base: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    pub fn is_transient(status: StatusCode) -> bool {
        RETRY_STATUSES.contains(&status.as_u16())
    }

    pub fn backoff(&self, attempt: u32) -> Duration {
        self.backoff_base * 2u32.saturating_pow(attempt)
    }
}

/// JSON HTTP client with automatic retry on transient failures, for both
/// GET and POST. Connection-level errors and the transient status set are
/// retried up to `max_retries` times; everything else fails immediately.
#[derive(Clone)]
pub struct RetryingClient {
    http: Client,
    policy: RetryPolicy,
}

impl RetryingClient {
    pub fn new(policy: RetryPolicy, timeout: Duration) -> Result<Self> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self { http, policy })
    }

    pub async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        self.execute(Method::GET, url, query, None::<&()>).await
    }

    pub async fn post_json<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<T> {
        self.execute(Method::POST, url, &[], Some(body)).await
    }

    async fn execute<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        method: Method,
        url: &str,
        query: &[(&str, String)],
        body: Option<&B>,
    ) -> Result<T> {
        let attempts = self.policy.max_retries + 1;
        let mut last_cause = String::new();

        for attempt in 0..attempts {
            let mut req = self.http.request(method.clone(), url).query(query);
            if let Some(b) = body {
                req = req.json(b);
            }

            match req.send().await {
                Ok(resp) => {
                    let status = resp.status();
                    if status.is_success() {
                        // A non-JSON body is a fetch failure, not a retry.
                        return resp.json::<T>().await.map_err(|e| TrackerError::Fetch {
                            attempts: attempt + 1,
                            cause: format!("invalid JSON body: {e}"),
                        });
                    }
                    if !RetryPolicy::is_transient(status) {
                        return Err(TrackerError::Fetch {
                            attempts: attempt + 1,
                            cause: format!("status {status}"),
                        });
                    }
                    last_cause = format!("status {status}");
                }
                Err(e) => {
                    last_cause = e.to_string();
                }
            }

            if attempt + 1 < attempts {
                let wait = self.policy.backoff(attempt);
                tracing::debug!(url, attempt, ?wait, cause = %last_cause, "retrying request");
                tokio::time::sleep(wait).await;
            }
        }

        Err(TrackerError::Fetch {
            attempts,
            cause: last_cause,
        })
    }
}
