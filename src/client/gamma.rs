//! Gamma API client for market data.

use super::{MarketSource, RetryPolicy, RetryingClient};
use crate::error::Result;
use crate::types::MarketRecord;
use async_trait::async_trait;
use std::time::Duration;

pub const GAMMA_BASE: &str = "https://gamma-api.polymarket.com";

/// Read-only client for the Gamma markets endpoint.
#[derive(Clone)]
pub struct GammaClient {
    http: RetryingClient,
    base_url: String,
}

impl GammaClient {
    pub fn new(base_url: &str, policy: RetryPolicy, timeout: Duration) -> Result<Self> {
        Ok(Self {
            http: RetryingClient::new(policy, timeout)?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Top `limit` active markets ranked by descending 24h volume.
    pub async fn top_markets(&self, limit: usize) -> Result<Vec<MarketRecord>> {
        let url = format!("{}/markets", self.base_url);
        self.http
            .get_json(
                &url,
                &[
                    ("limit", limit.to_string()),
                    ("active", "true".to_string()),
                    ("order", "volume24hr".to_string()),
                    ("ascending", "false".to_string()),
                ],
            )
            .await
    }

    /// Active markets without volume ranking, for the all-active report.
    pub async fn active_markets(&self, limit: usize) -> Result<Vec<MarketRecord>> {
        let url = format!("{}/markets", self.base_url);
        self.http
            .get_json(
                &url,
                &[
                    ("limit", limit.to_string()),
                    ("active", "true".to_string()),
                ],
            )
            .await
    }
}

#[async_trait]
impl MarketSource for GammaClient {
    async fn fetch_top_markets(&self, limit: usize) -> Result<Vec<MarketRecord>> {
        self.top_markets(limit).await
    }
}
