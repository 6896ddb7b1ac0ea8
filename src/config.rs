//! Layered configuration: defaults ← optional `config.toml` ← `PM_*`
//! environment variables. CLI flags override on top of this in `main`.

use crate::error::{Result, TrackerError};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub tracker: TrackerSettings,
    #[serde(default)]
    pub gamma: GammaSettings,
    #[serde(default)]
    pub telegram: Option<TelegramSettings>,
    #[serde(default)]
    pub reports: ReportSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrackerSettings {
    /// Poll interval in seconds, before jitter.
    #[serde(default = "default_poll_seconds")]
    pub poll_seconds: u64,
    /// How many top-volume markets to track.
    #[serde(default = "default_top_n")]
    pub top_n: usize,
    /// Minimum absolute YES-price change to alert on (0..1 scale,
    /// 0.08 = 8 percentage points).
    #[serde(default = "default_jump_threshold")]
    pub jump_threshold: f64,
    /// Minimum seconds between alerts for the same market.
    #[serde(default = "default_cooldown_seconds")]
    pub cooldown_seconds: u64,
    /// Telegram notifications on/off.
    #[serde(default)]
    pub notify: bool,
    #[serde(default = "default_state_file")]
    pub state_file: String,
}

impl Default for TrackerSettings {
    fn default() -> Self {
        Self {
            poll_seconds: default_poll_seconds(),
            top_n: default_top_n(),
            jump_threshold: default_jump_threshold(),
            cooldown_seconds: default_cooldown_seconds(),
            notify: false,
            state_file: default_state_file(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GammaSettings {
    #[serde(default = "default_gamma_url")]
    pub base_url: String,
    #[serde(default = "default_retries")]
    pub retries: u32,
    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for GammaSettings {
    fn default() -> Self {
        Self {
            base_url: default_gamma_url(),
            retries: default_retries(),
            backoff_ms: default_backoff_ms(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelegramSettings {
    pub bot_token: String,
    pub chat_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReportSettings {
    #[serde(default = "default_outdir")]
    pub outdir: String,
    #[serde(default = "default_top_n")]
    pub limit: usize,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            outdir: default_outdir(),
            limit: default_top_n(),
        }
    }
}

fn default_poll_seconds() -> u64 {
    60
}
fn default_top_n() -> usize {
    50
}
fn default_jump_threshold() -> f64 {
    0.08
}
fn default_cooldown_seconds() -> u64 {
    300
}
fn default_state_file() -> String {
    "pm_state.json".to_string()
}
fn default_gamma_url() -> String {
    crate::client::GAMMA_BASE.to_string()
}
fn default_retries() -> u32 {
    3
}
fn default_backoff_ms() -> u64 {
    500
}
fn default_timeout_secs() -> u64 {
    20
}
fn default_outdir() -> String {
    "reports".to_string()
}

impl Config {
    /// Load from an optional TOML file with `PM_*` environment overrides
    /// (`PM_TRACKER__POLL_SECONDS=30`).
    pub fn load(path: &str) -> Result<Self> {
        let loaded = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::with_prefix("PM").separator("__"))
            .build()
            .map_err(|e| TrackerError::Config(e.to_string()))?;
        loaded
            .try_deserialize()
            .map_err(|e| TrackerError::Config(e.to_string()))
    }

    /// Telegram credentials: the `[telegram]` section, falling back to the
    /// `TELEGRAM_TOKEN` / `TELEGRAM_CHAT_ID` environment variables.
    pub fn telegram_credentials(&self) -> Option<(String, String)> {
        if let Some(tg) = &self.telegram {
            return Some((tg.bot_token.clone(), tg.chat_id.clone()));
        }
        let token = std::env::var("TELEGRAM_TOKEN").ok().filter(|s| !s.is_empty())?;
        let chat_id = std::env::var("TELEGRAM_CHAT_ID").ok().filter(|s| !s.is_empty())?;
        Some((token, chat_id))
    }
}
