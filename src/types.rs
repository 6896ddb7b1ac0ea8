//! Core data types: raw market records from the Gamma API, persisted
//! per-market state, and alert events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

/// One market object as returned by the Gamma `/markets` endpoint.
///
/// The API is treated as untrusted and partial: every field is optional,
/// and `outcomes`/`outcomePrices` arrive either as JSON arrays or as
/// JSON-encoded strings of arrays (`"[\"Yes\", \"No\"]"`), depending on
/// the endpoint version. Normalization helpers below accept both.
#[derive(Debug, Clone, Deserialize)]
pub struct MarketRecord {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub question: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default, rename = "endDate")]
    pub end_date: Option<String>,
    #[serde(default)]
    pub outcomes: Option<Value>,
    #[serde(default, rename = "outcomePrices")]
    pub outcome_prices: Option<Value>,
    #[serde(default)]
    pub volume24hr: Option<Value>,
    #[serde(default)]
    pub volume: Option<Value>,
    #[serde(default, rename = "volumeNum")]
    pub volume_num: Option<Value>,
    #[serde(default)]
    pub liquidity: Option<Value>,
    #[serde(default, rename = "liquidityNum")]
    pub liquidity_num: Option<Value>,
}

impl MarketRecord {
    /// Stable identifier for state/cooldown keying: slug, falling back to
    /// the numeric id. `None` if the record carries neither.
    pub fn key(&self) -> Option<String> {
        if let Some(slug) = self.slug.as_deref() {
            if !slug.is_empty() {
                return Some(slug.to_string());
            }
        }
        self.id.as_ref().map(value_to_string).filter(|s| !s.is_empty())
    }

    pub fn question_text(&self) -> String {
        self.question.as_deref().unwrap_or("").trim().to_string()
    }

    /// Outcome labels in original order, or `None` if absent/malformed.
    pub fn outcome_labels(&self) -> Option<Vec<String>> {
        self.outcomes.as_ref().and_then(string_array)
    }

    /// Outcome price tokens in original order, still unparsed.
    pub fn outcome_price_tokens(&self) -> Option<Vec<String>> {
        self.outcome_prices.as_ref().and_then(string_array)
    }

    /// 24-hour volume, `volumeNum` falling back to `volume`.
    pub fn volume_24hr(&self) -> Option<f64> {
        self.volume24hr.as_ref().and_then(lenient_f64)
    }

    pub fn volume_total(&self) -> Option<f64> {
        self.volume_num
            .as_ref()
            .and_then(lenient_f64)
            .or_else(|| self.volume.as_ref().and_then(lenient_f64))
    }

    pub fn liquidity(&self) -> Option<f64> {
        self.liquidity_num
            .as_ref()
            .and_then(lenient_f64)
            .or_else(|| self.liquidity.as_ref().and_then(lenient_f64))
    }
}

/// Render a raw JSON field the way the API sent it, for report columns.
pub fn raw_field(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn value_to_string(v: &Value) -> String {
    match v {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

/// Accept `["Yes","No"]`, `[0.4, 0.6]`, or a JSON-encoded string of either.
fn string_array(v: &Value) -> Option<Vec<String>> {
    match v {
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .collect(),
        Value::String(s) => {
            let inner: Value = serde_json::from_str(s).ok()?;
            match inner {
                Value::Array(_) => string_array(&inner),
                _ => None,
            }
        }
        _ => None,
    }
}

/// Numbers arrive as JSON numbers or decimal strings; anything else is None.
fn lenient_f64(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Last observation for one market, persisted in the state file.
///
/// Short field names (`t`/`yes`/`q`) are the on-disk schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketState {
    #[serde(rename = "t")]
    pub observed_at: DateTime<Utc>,
    #[serde(rename = "yes")]
    pub yes_price: f64,
    #[serde(rename = "q")]
    pub question: String,
}

/// A qualifying price move, produced by the detector and consumed by the
/// notifier and the console log.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertEvent {
    pub market_id: String,
    pub question: String,
    pub previous_price: f64,
    pub new_price: f64,
    pub delta: f64,
    pub observed_at: DateTime<Utc>,
}

impl AlertEvent {
    /// Multi-line alert text sent to Telegram and printed to the log.
    pub fn message(&self) -> String {
        format!(
            "⚡ Move detected\n{}\nYES: {:.3} → {:.3} (Δ {:+.3})\nSlug: {}\nTime: {}",
            self.question,
            self.previous_price,
            self.new_price,
            self.delta,
            self.market_id,
            self.observed_at.to_rfc3339(),
        )
    }
}

/// Per-cycle summary for the heartbeat log line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CycleStats {
    pub processed: usize,
    pub alerts: usize,
    pub elapsed: Duration,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(v: Value) -> MarketRecord {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn key_prefers_slug_over_id() {
        let m = record(json!({"id": 123, "slug": "will-it-rain"}));
        assert_eq!(m.key().as_deref(), Some("will-it-rain"));
    }

    #[test]
    fn key_falls_back_to_numeric_id() {
        let m = record(json!({"id": 9912}));
        assert_eq!(m.key().as_deref(), Some("9912"));

        let m = record(json!({"id": "abc-1", "slug": ""}));
        assert_eq!(m.key().as_deref(), Some("abc-1"));
    }

    #[test]
    fn key_absent_when_neither_field_present() {
        let m = record(json!({"question": "?"}));
        assert_eq!(m.key(), None);
    }

    #[test]
    fn outcomes_accept_array_and_encoded_string() {
        let m = record(json!({"outcomes": ["Yes", "No"]}));
        assert_eq!(m.outcome_labels().unwrap(), vec!["Yes", "No"]);

        let m = record(json!({"outcomes": "[\"Yes\", \"No\"]"}));
        assert_eq!(m.outcome_labels().unwrap(), vec!["Yes", "No"]);

        let m = record(json!({"outcomePrices": "[\"0.55\", \"0.45\"]"}));
        assert_eq!(m.outcome_price_tokens().unwrap(), vec!["0.55", "0.45"]);
    }

    #[test]
    fn malformed_outcomes_are_none() {
        let m = record(json!({"outcomes": "not json"}));
        assert_eq!(m.outcome_labels(), None);

        let m = record(json!({"outcomes": {"yes": 1}}));
        assert_eq!(m.outcome_labels(), None);
    }

    #[test]
    fn volume_fallback_chain() {
        let m = record(json!({"volumeNum": 1500.5, "volume": "10"}));
        assert_eq!(m.volume_total(), Some(1500.5));

        let m = record(json!({"volume": "250000.75"}));
        assert_eq!(m.volume_total(), Some(250000.75));

        let m = record(json!({"volume24hr": "not-a-number"}));
        assert_eq!(m.volume_24hr(), None);
    }

    #[test]
    fn state_serializes_with_short_keys() {
        let s = MarketState {
            observed_at: "2024-05-01T00:00:00Z".parse().unwrap(),
            yes_price: 0.42,
            question: "Will X happen?".into(),
        };
        let v = serde_json::to_value(&s).unwrap();
        assert!(v.get("t").is_some());
        assert_eq!(v["yes"], json!(0.42));
        assert_eq!(v["q"], json!("Will X happen?"));
    }

    #[test]
    fn alert_message_contains_transition() {
        let e = AlertEvent {
            market_id: "rain-tomorrow".into(),
            question: "Will it rain tomorrow?".into(),
            previous_price: 0.10,
            new_price: 0.19,
            delta: 0.09,
            observed_at: "2024-05-01T00:00:00Z".parse().unwrap(),
        };
        let msg = e.message();
        assert!(msg.contains("0.100 → 0.190"));
        assert!(msg.contains("+0.090"));
        assert!(msg.contains("rain-tomorrow"));
    }
}
