//! Polymarket price-move tracker
//!
//! Polls the Gamma API for the top markets by 24h volume, detects
//! significant YES-price moves against persisted state, and sends
//! rate-limited Telegram alerts. Batch CSV reports ride along.
//!
//! ## Architecture
//!
//! ```text
//! Scheduler → Gamma Client → Price Extractor → Detector → Notifier
//!                                                 ↕
//!                                            State Store (JSON, atomic)
//! ```

pub mod client;
pub mod config;
pub mod detector;
pub mod error;
pub mod notify;
pub mod price;
pub mod report;
pub mod state;
pub mod tracker;
pub mod types;
