//! Best-effort Telegram notifications.
//!
//! Delivery is fire-and-forget: failures are logged and swallowed so the
//! poll loop never blocks on the transport. There is deliberately no retry
//! here; alerts are not durable, and losing one beats stalling the loop.

use crate::error::{Result, TrackerError};
use crate::types::AlertEvent;
use reqwest::Client;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

const TELEGRAM_API: &str = "https://api.telegram.org";

/// Upper bound on one sendMessage call. A stalled endpoint delays the
/// next cycle by at most this much, never indefinitely.
const SEND_TIMEOUT: Duration = Duration::from_secs(20);

fn http_client(timeout: Duration) -> Client {
    Client::builder()
        .timeout(timeout)
        .build()
        .expect("failed to build HTTP client")
}

#[derive(Debug, Serialize)]
struct SendMessageRequest {
    chat_id: String,
    text: String,
}

#[derive(Clone)]
pub struct Notifier {
    http: Client,
    credentials: Option<(String, String)>,
    enabled: bool,
    api_base: String,
    missing_warned: Arc<AtomicBool>,
}

impl Notifier {
    pub fn new(bot_token: String, chat_id: String) -> Self {
        Self {
            http: http_client(SEND_TIMEOUT),
            credentials: Some((bot_token, chat_id)),
            enabled: true,
            api_base: TELEGRAM_API.to_string(),
            missing_warned: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Notifications switched off by configuration.
    pub fn disabled() -> Self {
        Self {
            http: http_client(SEND_TIMEOUT),
            credentials: None,
            enabled: false,
            api_base: TELEGRAM_API.to_string(),
            missing_warned: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Notifier for the given enable flag and optional credentials,
    /// matching the startup wiring in `main`. Enabled-but-credless means
    /// every send is a no-op with a single warning.
    pub fn from_parts(enabled: bool, credentials: Option<(String, String)>) -> Self {
        match (enabled, credentials) {
            (false, _) => Self::disabled(),
            (true, Some((token, chat_id))) => Self::new(token, chat_id),
            (true, None) => Self {
                enabled: true,
                ..Self::disabled()
            },
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled && self.credentials.is_some()
    }

    /// Send one message. Callers ignore the result (`let _ =`); it exists
    /// so tests can assert on the failure path.
    pub async fn send(&self, text: &str) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }
        let Some((token, chat_id)) = &self.credentials else {
            if !self.missing_warned.swap(true, Ordering::Relaxed) {
                tracing::warn!("TELEGRAM_TOKEN or TELEGRAM_CHAT_ID missing, notifications disabled");
            }
            return Ok(());
        };

        let url = format!("{}/bot{}/sendMessage", self.api_base, token);
        let request = SendMessageRequest {
            chat_id: chat_id.clone(),
            text: text.to_string(),
        };

        match self.http.post(&url).json(&request).send().await {
            Ok(resp) if resp.status().is_success() => Ok(()),
            Ok(resp) => {
                tracing::warn!(status = %resp.status(), "telegram send failed");
                Err(TrackerError::Notify(format!("status {}", resp.status())))
            }
            Err(e) => {
                tracing::warn!(error = %e, "telegram send failed");
                Err(TrackerError::Notify(e.to_string()))
            }
        }
    }

    pub async fn startup(&self) -> Result<()> {
        self.send("✅ Polymarket tracker started.").await
    }

    pub async fn alert(&self, event: &AlertEvent) -> Result<()> {
        self.send(&event.message()).await
    }

    #[cfg(test)]
    fn with_api_base(mut self, base: &str) -> Self {
        self.api_base = base.trim_end_matches('/').to_string();
        self
    }

    #[cfg(test)]
    fn with_send_timeout(mut self, timeout: Duration) -> Self {
        self.http = http_client(timeout);
        self
    }
}
