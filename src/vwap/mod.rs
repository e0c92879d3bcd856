//! The day-summary VWAP aggregation and the close-vs-VWAP scenario rule.

use thiserror::Error;

use crate::models::{Bar, Scenario, VwapResult};

/// Close must deviate from VWAP by more than this (in percent) before a day
/// is called Bullish or Bearish. Exactly ±0.5 is still Neutral.
const SCENARIO_THRESHOLD_PCT: f64 = 0.5;

/// Aggregation failures, kept apart so callers can tell "nothing there"
/// from "data present but unusable".
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AggregationError {
    #[error("empty series: no bars to aggregate")]
    EmptySeries,

    #[error("zero total volume across {bars} bars")]
    ZeroVolume { bars: usize },
}

// ── Day aggregation ───────────────────────────────────────────────────────────

/// Volume-weighted average price over one day of bars.
///
/// Input order does not matter: bars are sorted ascending by timestamp
/// (stable, ties keep their original relative order) before accumulating,
/// so the same bar set always produces the same result. Bars with a
/// non-finite high, low or volume contribute nothing and are skipped
/// silently.
pub fn aggregate(bars: &[Bar]) -> Result<VwapResult, AggregationError> {
    let mut sorted: Vec<&Bar> = bars.iter().collect();
    sorted.sort_by_key(|b| b.timestamp);

    let Some(last) = sorted.last() else {
        return Err(AggregationError::EmptySeries);
    };

    let mut pv_sum = 0.0;
    let mut vol_sum = 0.0;
    for bar in &sorted {
        if !(bar.high.is_finite() && bar.low.is_finite() && bar.volume.is_finite()) {
            continue;
        }
        let typical = (bar.high + bar.low) / 2.0;
        pv_sum += typical * bar.volume;
        vol_sum += bar.volume;
    }

    if vol_sum == 0.0 {
        return Err(AggregationError::ZeroVolume { bars: bars.len() });
    }

    Ok(VwapResult {
        vwap: pv_sum / vol_sum,
        close: last.close,
        last_bar_timestamp: last.timestamp,
    })
}

// ── Per-bar running VWAP ──────────────────────────────────────────────────────

/// Running VWAP for each bar, used to fill a chart's VWAP line when the
/// upstream feed does not supply one. This is the intraday charting variant
/// of typical price, `(high + low + close) / 3`; the cumulative denominator
/// substitutes 1 while it is still zero so leading no-volume bars yield the
/// typical price instead of a division error.
///
/// Expects bars already in ascending time order (the chart contract).
pub fn cumulative_vwap(bars: &[Bar]) -> Vec<f64> {
    let mut cum_pv = 0.0;
    let mut cum_vol = 0.0;
    let mut out = Vec::with_capacity(bars.len());

    for bar in bars {
        let typical = (bar.high + bar.low + bar.close) / 3.0;
        let volume = if bar.volume.is_finite() { bar.volume } else { 0.0 };
        if typical.is_finite() {
            cum_pv += typical * volume;
            cum_vol += volume;
        }
        let denom = if cum_vol == 0.0 { 1.0 } else { cum_vol };
        out.push(cum_pv / denom);
    }

    out
}

// ── Scenario rule ─────────────────────────────────────────────────────────────

pub fn close_vwap_pct(close: f64, vwap: f64) -> f64 {
    (close - vwap) / vwap * 100.0
}

/// Classify from a precomputed deviation percentage. Strict inequalities:
/// a deviation of exactly ±0.5% stays Neutral.
pub fn classify_pct(pct: f64) -> Scenario {
    if pct > SCENARIO_THRESHOLD_PCT {
        Scenario::Bullish
    } else if pct < -SCENARIO_THRESHOLD_PCT {
        Scenario::Bearish
    } else {
        Scenario::Neutral
    }
}

/// Classify from raw close and VWAP. Must agree with [`classify_pct`] on a
/// percentage computed with the same formula.
pub fn classify(close: f64, vwap: f64) -> Scenario {
    classify_pct(close_vwap_pct(close, vwap))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
