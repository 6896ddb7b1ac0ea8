//! Poll scheduler: drives the fetch → extract → detect → save cycle.

use crate::client::MarketSource;
use crate::detector::{CooldownMap, Detector};
use crate::error::Result;
use crate::notify::Notifier;
use crate::price::extract_yes_price;
use crate::state::{StateMap, StateStore};
use crate::types::CycleStats;
use chrono::Utc;
use rand::Rng;
use std::time::{Duration, Instant};

/// Scheduler phases. `Stopped` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    Starting,
    Polling,
    Sleeping,
    Stopped,
}

#[derive(Debug, Clone)]
pub struct TrackerConfig {
    pub poll_seconds: u64,
    pub top_n: usize,
    pub jump_threshold: f64,
    pub cooldown_seconds: u64,
    /// Run exactly one cycle and exit (CI mode).
    pub once: bool,
}

/// The polling loop. Owns the state and cooldown maps exclusively; the
/// whole cycle is sequential, and suspension happens only at the sleep
/// boundary between cycles.
pub struct Tracker<S: MarketSource> {
    source: S,
    store: StateStore,
    notifier: Notifier,
    detector: Detector,
    config: TrackerConfig,
    state: StateMap,
    cooldowns: CooldownMap,
}

impl<S: MarketSource> Tracker<S> {
    pub fn new(source: S, store: StateStore, notifier: Notifier, config: TrackerConfig) -> Self {
        let detector = Detector::new(config.jump_threshold, config.cooldown_seconds);
        Self {
            source,
            store,
            notifier,
            detector,
            config,
            state: StateMap::new(),
            cooldowns: CooldownMap::new(),
        }
    }

    /// Run until stopped: forever in the normal mode, one successful cycle
    /// in `once` mode, or until ctrl-c arrives during a sleep.
    pub async fn run(&mut self) -> Result<()> {
        let mut phase = PollState::Starting;
        loop {
            phase = match phase {
                PollState::Starting => {
                    self.state = self.store.load();
                    tracing::info!(
                        markets = self.state.len(),
                        state_file = %self.store.path().display(),
                        "tracker starting"
                    );
                    let _ = self.notifier.startup().await;
                    PollState::Polling
                }
                PollState::Polling => match self.run_cycle().await {
                    Ok(_) if self.config.once => PollState::Stopped,
                    Ok(_) => PollState::Sleeping,
                    // Per-cycle failures are recoverable: log and keep
                    // the loop alive.
                    Err(e) => {
                        tracing::warn!(error = %e, "cycle failed, skipping");
                        PollState::Sleeping
                    }
                },
                PollState::Sleeping => {
                    let sleep_for = self.sleep_duration();
                    tracing::debug!(?sleep_for, "sleeping until next poll");
                    tokio::select! {
                        _ = tokio::time::sleep(sleep_for) => PollState::Polling,
                        _ = tokio::signal::ctrl_c() => {
                            tracing::info!("shutdown signal received");
                            PollState::Stopped
                        }
                    }
                }
                PollState::Stopped => {
                    tracing::info!("tracker stopped");
                    return Ok(());
                }
            };
        }
    }

    /// One fetch → extract → detect → save cycle.
    ///
    /// On fetch failure nothing is mutated: state, cooldowns, and the
    /// state file are exactly as they were before the cycle.
    pub async fn run_cycle(&mut self) -> Result<CycleStats> {
        let started = Instant::now();
        let now = Utc::now();

        let markets = self.source.fetch_top_markets(self.config.top_n).await?;

        let mut processed = 0usize;
        let mut alerts = 0usize;
        for market in &markets {
            let Some(key) = market.key() else { continue };
            let Some(yes) = extract_yes_price(market) else {
                continue;
            };
            processed += 1;

            if let Some(event) = self.detector.observe(
                &key,
                &market.question_text(),
                yes,
                now,
                &mut self.state,
                &mut self.cooldowns,
            ) {
                tracing::info!("{}", event.message());
                let _ = self.notifier.alert(&event).await;
                alerts += 1;
            }
        }

        // One save per cycle, after every market has been processed.
        self.store.save(&self.state)?;

        let stats = CycleStats {
            processed,
            alerts,
            elapsed: started.elapsed(),
        };
        tracing::info!(
            processed = stats.processed,
            alerts = stats.alerts,
            elapsed_secs = stats.elapsed.as_secs_f64(),
            "heartbeat"
        );
        Ok(stats)
    }

    /// Poll interval plus up to two seconds of uniform jitter, so the loop
    /// never phase-locks with the data source's own update cadence.
    fn sleep_duration(&self) -> Duration {
        let jitter: f64 = rand::rng().random_range(0.0..2.0);
        Duration::from_secs_f64(self.config.poll_seconds as f64 + jitter)
    }

    pub fn state(&self) -> &StateMap {
        &self.state
    }

    pub fn cooldowns(&self) -> &CooldownMap {
        &self.cooldowns
    }
}
