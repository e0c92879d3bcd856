//! Bar normalization: heterogeneous raw records → numeric [`Bar`]s.
//!
//! Providers disagree on record shape (flat OHLCV objects vs. fields nested
//! under a `data` key) and on number encoding (JSON numbers vs. numeric
//! strings). Both are resolved here, once, at ingestion; downstream code
//! only ever sees [`Bar`].

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use crate::models::{Bar, ChartPoint};

// ── Raw record shapes ─────────────────────────────────────────────────────────

/// OHLCV fields as they appear on the wire. Values stay as raw JSON until
/// [`normalize_record`] coerces them.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawBarFields {
    #[serde(default, alias = "timestamp", alias = "datetime", alias = "date")]
    pub time: Option<Value>,
    #[serde(default)]
    pub open: Option<Value>,
    #[serde(default)]
    pub high: Option<Value>,
    #[serde(default)]
    pub low: Option<Value>,
    #[serde(default)]
    pub close: Option<Value>,
    #[serde(default)]
    pub volume: Option<Value>,
}

/// The two record shapes seen in the wild. `Enveloped` must be tried first:
/// it only matches when both `date` and `data` keys are present, while
/// `Flat` accepts anything.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawBarRecord {
    Enveloped { date: String, data: RawBarFields },
    Flat(RawBarFields),
}

// ── Normalization ─────────────────────────────────────────────────────────────

/// Resolve one raw record into a [`Bar`].
///
/// Missing or non-numeric OHLCV fields become `NAN` so the record still
/// yields a bar (the aggregator applies skip semantics). A record with no
/// usable time cannot be sorted or filtered and is dropped instead.
pub fn normalize_record(record: &RawBarRecord) -> Option<Bar> {
    let (time, fields) = match record {
        RawBarRecord::Enveloped { date, data } => {
            // Nested records may still carry their own time; the envelope
            // date is the fallback.
            let time = match &data.time {
                Some(v) => coerce_time(v),
                None => coerce_time(&Value::String(date.clone())),
            };
            (time, data)
        }
        RawBarRecord::Flat(fields) => (fields.time.as_ref().and_then(coerce_time), fields),
    };

    let (timestamp, day) = time?;

    Some(Bar {
        timestamp,
        day,
        open: coerce_number(fields.open.as_ref()),
        high: coerce_number(fields.high.as_ref()),
        low: coerce_number(fields.low.as_ref()),
        close: coerce_number(fields.close.as_ref()),
        volume: coerce_number(fields.volume.as_ref()),
    })
}

/// Normalize a batch, dropping (with a warning) records without a usable
/// time field.
pub fn normalize_all(records: &[RawBarRecord]) -> Vec<Bar> {
    let mut bars = Vec::with_capacity(records.len());
    let mut dropped = 0usize;
    for record in records {
        match normalize_record(record) {
            Some(bar) => bars.push(bar),
            None => dropped += 1,
        }
    }
    if dropped > 0 {
        warn!("{} record(s) dropped: no usable time field", dropped);
    }
    bars
}

/// Convert a chart tuple back into a [`Bar`] (static intraday files carry
/// unix-second times).
pub fn bar_from_chart_point(point: &ChartPoint) -> Option<Bar> {
    let (timestamp, day) = from_unix_seconds(point.time)?;
    Some(Bar {
        timestamp,
        day,
        open: point.open,
        high: point.high,
        low: point.low,
        close: point.close,
        volume: point.volume,
    })
}

/// UTC calendar date for a unix-second time, as the day filter sees it.
pub fn unix_day(secs: i64) -> Option<String> {
    from_unix_seconds(secs).map(|(_, day)| day)
}

// ── Day filter ────────────────────────────────────────────────────────────────

/// Keep bars whose date portion equals `date` exactly, preserving relative
/// order. The comparison is on the raw date text, not a timezone-converted
/// instant: `"2026-01-28T15:59:00-05:00"` belongs to `2026-01-28` even
/// though its UTC instant is later.
pub fn filter_day(bars: Vec<Bar>, date: &str) -> Vec<Bar> {
    bars.into_iter().filter(|b| b.day == date).collect()
}

// ── Coercion helpers ──────────────────────────────────────────────────────────

fn coerce_number(value: Option<&Value>) -> f64 {
    match value {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(f64::NAN),
        Some(Value::String(s)) => {
            let cleaned = s.trim().replace(',', "");
            cleaned.parse().unwrap_or(f64::NAN)
        }
        _ => f64::NAN,
    }
}

/// Accepts unix seconds (number) or a date/datetime string. Returns the
/// parsed instant plus the day text used by the filter.
fn coerce_time(value: &Value) -> Option<(DateTime<Utc>, String)> {
    match value {
        Value::Number(n) => from_unix_seconds(n.as_f64()? as i64),
        Value::String(s) => from_time_text(s),
        _ => None,
    }
}

fn from_unix_seconds(secs: i64) -> Option<(DateTime<Utc>, String)> {
    let ts = Utc.timestamp_opt(secs, 0).single()?;
    let day = ts.format("%Y-%m-%d").to_string();
    Some((ts, day))
}

fn from_time_text(s: &str) -> Option<(DateTime<Utc>, String)> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    let day = s.split(['T', ' ']).next().unwrap_or(s).to_string();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some((dt.with_timezone(&Utc), day));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some((naive.and_utc(), day));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
        return Some((naive.and_utc(), day));
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        let midnight = date.and_hms_opt(0, 0, 0)?;
        return Some((midnight.and_utc(), day));
    }

    None
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(v: serde_json::Value) -> RawBarRecord {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn flat_record_with_json_numbers() {
        let bar = normalize_record(&record(json!({
            "time": 1769619540,
            "open": 10.0, "high": 11.0, "low": 9.5, "close": 10.5, "volume": 1200
        })))
        .unwrap();
        assert_eq!(bar.open, 10.0);
        assert_eq!(bar.volume, 1200.0);
        assert_eq!(bar.timestamp.timestamp(), 1769619540);
    }

    #[test]
    fn enveloped_record_reads_fields_under_data() {
        let bar = normalize_record(&record(json!({
            "date": "2026-01-28T15:59:00-05:00",
            "data": { "open": "142.1", "high": "142.9", "low": "141.8", "close": "142.5", "volume": "88,200" }
        })))
        .unwrap();
        assert_eq!(bar.day, "2026-01-28");
        assert_eq!(bar.high, 142.9);
        assert_eq!(bar.volume, 88200.0);
    }

    #[test]
    fn missing_or_junk_fields_become_nan_not_errors() {
        let bar = normalize_record(&record(json!({
            "datetime": "2026-01-28 15:59:00",
            "close": 10.0,
            "high": "n/a"
        })))
        .unwrap();
        assert!(bar.high.is_nan());
        assert!(bar.low.is_nan());
        assert!(bar.volume.is_nan());
        assert_eq!(bar.close, 10.0);
    }

    #[test]
    fn record_without_time_is_dropped() {
        let records = vec![
            record(json!({ "open": 1.0, "close": 2.0 })),
            record(json!({ "time": 1769619540, "close": 2.0 })),
        ];
        assert_eq!(normalize_all(&records).len(), 1);
    }

    #[test]
    fn day_filter_is_exact_on_the_date_text() {
        let keep = normalize_record(&record(json!({
            "timestamp": "2026-01-28T15:59:00-05:00", "close": 1.0
        })))
        .unwrap();
        let drop = normalize_record(&record(json!({
            "timestamp": "2026-01-29T00:01:00Z", "close": 1.0
        })))
        .unwrap();

        let filtered = filter_day(vec![keep.clone(), drop], "2026-01-28");
        assert_eq!(filtered, vec![keep]);
    }

    #[test]
    fn offset_timestamp_keeps_its_local_date_text() {
        // 20:00-05:00 is 01:00Z the next day; the day filter still sees
        // the local date text.
        let bar = normalize_record(&record(json!({
            "timestamp": "2026-01-28T20:00:00-05:00", "close": 1.0
        })))
        .unwrap();
        assert_eq!(bar.day, "2026-01-28");
        assert_eq!(bar.timestamp.format("%Y-%m-%d").to_string(), "2026-01-29");
    }

    #[test]
    fn bare_date_parses_to_midnight() {
        let bar = normalize_record(&record(json!({ "date": "2026-01-28", "close": 5.0 }))).unwrap();
        assert_eq!(bar.day, "2026-01-28");
        assert_eq!(bar.timestamp.format("%H:%M:%S").to_string(), "00:00:00");
    }
}
