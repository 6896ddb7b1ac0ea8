//! YES-price extraction from raw market records.

use crate::types::MarketRecord;

/// Canonical "yes" probability for a market, if one can be derived.
///
/// Builds a case-insensitive, trimmed label→price map by zipping
/// `outcomes` and `outcomePrices` positionally. The "yes" label wins;
/// otherwise the first price in original order is used, since many binary
/// markets put YES at position 0 without the exact label. Returns `None`
/// when either array is empty or missing, the lengths differ, or any
/// price fails to parse. Malformed markets are skipped, never an error.
pub fn extract_yes_price(record: &MarketRecord) -> Option<f64> {
    let labels = record.outcome_labels()?;
    let tokens = record.outcome_price_tokens()?;
    if labels.is_empty() || tokens.is_empty() || labels.len() != tokens.len() {
        return None;
    }

    let mut prices = Vec::with_capacity(tokens.len());
    for token in &tokens {
        let p: f64 = token.trim().parse().ok()?;
        if !p.is_finite() || !(0.0..=1.0).contains(&p) {
            return None;
        }
        prices.push(p);
    }

    for (label, price) in labels.iter().zip(&prices) {
        if label.trim().eq_ignore_ascii_case("yes") {
            return Some(*price);
        }
    }
    Some(prices[0])
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(outcomes: serde_json::Value, prices: serde_json::Value) -> MarketRecord {
        serde_json::from_value(json!({
            "outcomes": outcomes,
            "outcomePrices": prices,
        }))
        .unwrap()
    }

    #[test]
    fn yes_label_wins_case_insensitively() {
        let m = record(json!(["No", " YES "]), json!(["0.35", "0.65"]));
        assert_eq!(extract_yes_price(&m), Some(0.65));

        let m = record(json!(["yes", "no"]), json!(["0.12", "0.88"]));
        assert_eq!(extract_yes_price(&m), Some(0.12));
    }

    #[test]
    fn ordinal_fallback_without_yes_label() {
        let m = record(json!(["Up", "Down"]), json!(["0.57", "0.43"]));
        assert_eq!(extract_yes_price(&m), Some(0.57));
    }

    #[test]
    fn mismatched_lengths_yield_none() {
        let m = record(json!(["Yes", "No"]), json!(["0.5"]));
        assert_eq!(extract_yes_price(&m), None);
    }

    #[test]
    fn empty_arrays_yield_none() {
        let m = record(json!([]), json!([]));
        assert_eq!(extract_yes_price(&m), None);
    }

    #[test]
    fn missing_fields_yield_none() {
        let m: MarketRecord = serde_json::from_value(json!({"question": "?"})).unwrap();
        assert_eq!(extract_yes_price(&m), None);
    }

    #[test]
    fn unparseable_price_yields_none() {
        let m = record(json!(["Yes", "No"]), json!(["0.5", "n/a"]));
        assert_eq!(extract_yes_price(&m), None);
    }

    #[test]
    fn out_of_range_price_yields_none() {
        let m = record(json!(["Yes", "No"]), json!(["1.5", "0.5"]));
        assert_eq!(extract_yes_price(&m), None);
    }

    #[test]
    fn json_encoded_string_arrays_work() {
        let m = record(json!("[\"Yes\", \"No\"]"), json!("[\"0.55\", \"0.45\"]"));
        assert_eq!(extract_yes_price(&m), Some(0.55));
    }
}
