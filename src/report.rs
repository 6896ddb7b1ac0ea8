//! Batch CSV snapshot reports.
//!
//! Pure transform-and-write: one fetch becomes a timestamped CSV under a
//! UTC-dated directory, a `latest_` copy at the output root, and an append
//! to a rolling file. No state, no recovery concerns.

use crate::error::Result;
use crate::types::{raw_field, MarketRecord};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

/// Which snapshot a report covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    /// Top markets ranked by 24h volume.
    TopByVolume,
    /// All active markets, unranked.
    AllActive,
}

impl ReportKind {
    pub fn prefix(&self) -> &'static str {
        match self {
            ReportKind::TopByVolume => "top_markets_24h",
            ReportKind::AllActive => "all_active_markets",
        }
    }
}

#[derive(Debug, Serialize)]
struct ReportRow {
    snapshot_time: String,
    market_id: String,
    question: String,
    slug: String,
    category: String,
    end_date: String,
    volume24hr: Option<f64>,
    volume_total: Option<f64>,
    liquidity: Option<f64>,
    outcomes: String,
    outcome_prices: String,
}

impl ReportRow {
    fn from_record(m: &MarketRecord, now: DateTime<Utc>) -> Self {
        Self {
            snapshot_time: now.to_rfc3339(),
            market_id: m.id.as_ref().map(raw_field).unwrap_or_default(),
            question: m.question.clone().unwrap_or_default(),
            slug: m.slug.clone().unwrap_or_default(),
            category: m.category.clone().unwrap_or_default(),
            end_date: m.end_date.clone().unwrap_or_default(),
            volume24hr: m.volume_24hr(),
            volume_total: m.volume_total(),
            liquidity: m.liquidity(),
            outcomes: m.outcomes.as_ref().map(raw_field).unwrap_or_default(),
            outcome_prices: m.outcome_prices.as_ref().map(raw_field).unwrap_or_default(),
        }
    }
}

pub struct ReportWriter {
    outdir: PathBuf,
}

impl ReportWriter {
    pub fn new(outdir: impl Into<PathBuf>) -> Self {
        Self {
            outdir: outdir.into(),
        }
    }

    /// Write one snapshot. Returns the path of the timestamped file.
    pub fn write(
        &self,
        kind: ReportKind,
        markets: &[MarketRecord],
        now: DateTime<Utc>,
    ) -> Result<PathBuf> {
        let rows: Vec<ReportRow> = markets
            .iter()
            .map(|m| ReportRow::from_record(m, now))
            .collect();
        let prefix = kind.prefix();

        // Timestamped file under a UTC-dated partition.
        let dated_dir = self.outdir.join(now.format("%Y-%m-%d").to_string());
        fs::create_dir_all(&dated_dir)?;
        let stamped = dated_dir.join(format!("{}_{}.csv", prefix, now.format("%Y%m%dT%H%M%SZ")));
        write_csv(&stamped, &rows)?;

        // Overwritten latest copy at the output root.
        write_csv(&self.outdir.join(format!("latest_{prefix}.csv")), &rows)?;

        // Rolling append, header only when the file is new.
        let roll_dir = self.outdir.join("rolling");
        fs::create_dir_all(&roll_dir)?;
        append_csv(&roll_dir.join(format!("{prefix}_rolling.csv")), &rows)?;

        Ok(stamped)
    }
}

/// Column order; must match the `ReportRow` field order.
const HEADER: [&str; 11] = [
    "snapshot_time",
    "market_id",
    "question",
    "slug",
    "category",
    "end_date",
    "volume24hr",
    "volume_total",
    "liquidity",
    "outcomes",
    "outcome_prices",
];

fn write_csv(path: &Path, rows: &[ReportRow]) -> Result<()> {
    // Header is written explicitly so an empty snapshot still produces a
    // well-formed file rather than zero bytes.
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)?;
    writer.write_record(HEADER)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

fn append_csv(path: &Path, rows: &[ReportRow]) -> Result<()> {
    let write_header = !path.exists();
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(file);
    if write_header {
        writer.write_record(HEADER)?;
    }
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    fn markets() -> Vec<MarketRecord> {
        vec![
            serde_json::from_value(json!({
                "id": 101,
                "slug": "will-it-rain",
                "question": "Will it rain?",
                "category": "Weather",
                "endDate": "2024-06-01T00:00:00Z",
                "volume24hr": "1234.5",
                "volumeNum": 99000.0,
                "liquidity": "500",
                "outcomes": "[\"Yes\", \"No\"]",
                "outcomePrices": "[\"0.55\", \"0.45\"]",
            }))
            .unwrap(),
            serde_json::from_value(json!({
                "id": "202",
                "question": "Sparse market",
            }))
            .unwrap(),
        ]
    }

    fn now() -> DateTime<Utc> {
        "2024-05-01T12:34:56Z".parse().unwrap()
    }

    #[test]
    fn writes_dated_latest_and_rolling_files() {
        let dir = tempdir().unwrap();
        let writer = ReportWriter::new(dir.path());

        let path = writer.write(ReportKind::TopByVolume, &markets(), now()).unwrap();
        assert_eq!(
            path,
            dir.path()
                .join("2024-05-01")
                .join("top_markets_24h_20240501T123456Z.csv")
        );
        assert!(path.exists());
        assert!(dir.path().join("latest_top_markets_24h.csv").exists());
        assert!(dir
            .path()
            .join("rolling")
            .join("top_markets_24h_rolling.csv")
            .exists());
    }

    #[test]
    fn rows_carry_snapshot_fields_and_tolerate_gaps() {
        let dir = tempdir().unwrap();
        let writer = ReportWriter::new(dir.path());
        writer.write(ReportKind::AllActive, &markets(), now()).unwrap();

        let content =
            fs::read_to_string(dir.path().join("latest_all_active_markets.csv")).unwrap();
        let mut lines = content.lines();
        let header = lines.next().unwrap();
        assert!(header.starts_with("snapshot_time,market_id,question,slug"));

        let first = lines.next().unwrap();
        assert!(first.contains("101"));
        assert!(first.contains("will-it-rain"));
        assert!(first.contains("1234.5"));
        assert!(first.contains("99000"));

        // Sparse market still produces a row, with empty numeric cells.
        let second = lines.next().unwrap();
        assert!(second.contains("202"));
        assert!(second.contains("Sparse market"));
    }

    #[test]
    fn empty_snapshot_still_writes_header() {
        let dir = tempdir().unwrap();
        let writer = ReportWriter::new(dir.path());
        let path = writer.write(ReportKind::TopByVolume, &[], now()).unwrap();

        for file in [path, dir.path().join("latest_top_markets_24h.csv")] {
            let content = fs::read_to_string(file).unwrap();
            assert_eq!(content.lines().count(), 1);
            assert!(content.starts_with("snapshot_time,market_id,question,slug"));
        }
    }

    #[test]
    fn rolling_file_appends_without_duplicate_header() {
        let dir = tempdir().unwrap();
        let writer = ReportWriter::new(dir.path());
        writer.write(ReportKind::TopByVolume, &markets(), now()).unwrap();
        writer.write(ReportKind::TopByVolume, &markets(), now()).unwrap();

        let content = fs::read_to_string(
            dir.path().join("rolling").join("top_markets_24h_rolling.csv"),
        )
        .unwrap();
        let headers = content
            .lines()
            .filter(|l| l.starts_with("snapshot_time"))
            .count();
        assert_eq!(headers, 1);
        // Two snapshots of two markets each, plus one header.
        assert_eq!(content.lines().count(), 5);
    }
}
