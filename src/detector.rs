//! Movement detection against stored state, with per-market cooldown.

use crate::state::StateMap;
use crate::types::{AlertEvent, MarketState};
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;

/// In-memory map of market key → last alert time. Deliberately not
/// persisted: the contract is alert-storm suppression within a process
/// lifetime, and a restart resets it.
pub type CooldownMap = HashMap<String, DateTime<Utc>>;

#[derive(Debug, Clone)]
pub struct Detector {
    jump_threshold: f64,
    cooldown_seconds: u64,
}

impl Detector {
    pub fn new(jump_threshold: f64, cooldown_seconds: u64) -> Self {
        Self {
            jump_threshold,
            cooldown_seconds,
        }
    }

    /// Process one observation.
    ///
    /// State is always overwritten with the new observation, so the next
    /// delta is measured against the latest price rather than the last
    /// alert-triggering one. The first observation of a market only
    /// establishes the baseline and never alerts. Consecutive
    /// sub-threshold deltas do not accumulate. Suppressed alerts do not
    /// refresh the cooldown timestamp.
    pub fn observe(
        &self,
        key: &str,
        question: &str,
        yes_price: f64,
        now: DateTime<Utc>,
        state: &mut StateMap,
        cooldowns: &mut CooldownMap,
    ) -> Option<AlertEvent> {
        let prev = state.insert(
            key.to_string(),
            MarketState {
                observed_at: now,
                yes_price,
                question: question.to_string(),
            },
        )?;

        let delta = yes_price - prev.yes_price;
        if delta.abs() < self.jump_threshold {
            return None;
        }

        if let Some(last_alert) = cooldowns.get(key) {
            if now - *last_alert < Duration::seconds(self.cooldown_seconds as i64) {
                return None;
            }
        }

        cooldowns.insert(key.to_string(), now);
        Some(AlertEvent {
            market_id: key.to_string(),
            question: question.to_string(),
            previous_price: prev.yes_price,
            new_price: yes_price,
            delta,
            observed_at: now,
        })
    }
}
