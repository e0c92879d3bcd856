use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ── Intraday bar ──────────────────────────────────────────────────────────────

/// One OHLCV sample for a fixed time interval, after shape and number
/// coercion. Absent or unparseable numeric fields are `f64::NAN`; the
/// aggregator skips such bars instead of failing.
///
/// `low ≤ open,close ≤ high` is assumed, not validated.
#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    /// Instant of the bar, used for sorting and as the last-bar timestamp.
    pub timestamp: DateTime<Utc>,
    /// Date portion of the raw time text (`"2026-01-28"`), compared verbatim
    /// by the day filter.
    pub day: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

// ── VWAP summary ──────────────────────────────────────────────────────────────

/// Volume-weighted day summary. Derived per request, never stored.
#[derive(Debug, Clone, PartialEq)]
pub struct VwapResult {
    pub vwap: f64,
    /// Close of the chronologically last bar.
    pub close: f64,
    pub last_bar_timestamp: DateTime<Utc>,
}

// ── Scenario label ────────────────────────────────────────────────────────────

/// Qualitative close-vs-VWAP label. Scenario codes A/B/C come from the
/// trading playbook the dashboards are built around.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scenario {
    Bullish,
    Bearish,
    Neutral,
}

impl Scenario {
    pub fn code(self) -> char {
        match self {
            Scenario::Bullish => 'A',
            Scenario::Bearish => 'B',
            Scenario::Neutral => 'C',
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Scenario::Bullish => "Bullish",
            Scenario::Bearish => "Bearish",
            Scenario::Neutral => "Neutral",
        };
        write!(f, "{} ({})", self.code(), name)
    }
}

// ── Dashboard input rows (precomputed externally) ─────────────────────────────

/// One line of `data/vwap_<date>.json`. The percentage is computed by the
/// collection job; the classifier is reapplied for display only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SummaryRow {
    pub symbol: String,
    /// The date the data actually came from (the collector falls back to
    /// earlier days when a date has no bars).
    pub date: String,
    pub close: f64,
    pub vwap: f64,
    pub close_vwap_pct: f64,
}

/// One line of `data/premarket_<date>.json`, canonical schema.
///
/// Older scan outputs disagree on two field names; the aliases fold that
/// drift onto one schema at ingestion: `gap_pct` → `change_pct`,
/// `opt_total_score` → `opt_score`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PremarketRow {
    pub symbol: String,
    pub prev_trend: String,
    pub price: f64,
    #[serde(alias = "gap_pct")]
    pub change_pct: f64,
    #[serde(alias = "opt_total_score")]
    pub opt_score: i64,
    pub total_score: i64,
}

// ── Chart tuple ───────────────────────────────────────────────────────────────

/// The shape the chart widget expects: `{time, open, high, low, close,
/// volume, vwap}` with `time` in unix seconds, ascending.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChartPoint {
    pub time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub vwap: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scenario_codes_and_display() {
        assert_eq!(Scenario::Bullish.code(), 'A');
        assert_eq!(Scenario::Bearish.code(), 'B');
        assert_eq!(Scenario::Neutral.code(), 'C');
        assert_eq!(Scenario::Bullish.to_string(), "A (Bullish)");
    }

    #[test]
    fn premarket_row_accepts_drifted_field_names() {
        let old = r#"{
            "symbol": "AMD",
            "prev_trend": "Bullish",
            "price": 142.5,
            "gap_pct": 1.8,
            "opt_total_score": 2,
            "total_score": 5
        }"#;
        let row: PremarketRow = serde_json::from_str(old).unwrap();
        assert_eq!(row.change_pct, 1.8);
        assert_eq!(row.opt_score, 2);

        let new = r#"{
            "symbol": "AMD",
            "prev_trend": "Bullish",
            "price": 142.5,
            "change_pct": 1.8,
            "opt_score": 2,
            "total_score": 5
        }"#;
        let row2: PremarketRow = serde_json::from_str(new).unwrap();
        assert_eq!(row2.change_pct, row.change_pct);
        assert_eq!(row2.opt_score, row.opt_score);
    }
}
