//! Error types for the tracker.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, TrackerError>;

#[derive(Debug, Error)]
pub enum TrackerError {
    /// All retries exhausted or the response body was not valid JSON.
    /// Recoverable: the scheduler skips the cycle and keeps polling.
    #[error("fetch failed after {attempts} attempts: {cause}")]
    Fetch { attempts: u32, cause: String },

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("persistence error: {0}")]
    Persistence(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("notification error: {0}")]
    Notify(String),

    /// Startup configuration problems. The only errors that are allowed
    /// to terminate the process.
    #[error("config error: {0}")]
    Config(String),
}
