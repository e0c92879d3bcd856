//! Close-vs-VWAP crossing replay over stored intraday files.
//!
//! Signal rule: hold long while close > VWAP; in long/short mode also hold
//! short while close < VWAP. Positions take effect one bar after the
//! signal. Commission defaults to zero, matching the collection-side
//! research setting.

use std::path::Path;
use tracing::{debug, warn};

use crate::loader;
use crate::models::ChartPoint;
use crate::render::{Direction, TableView};

const INITIAL_CAPITAL: f64 = 10_000.0;
const COMMISSION_RATE: f64 = 0.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyMode {
    LongOnly,
    LongShort,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SymbolReport {
    pub symbol: String,
    pub trades: u32,
    /// Percentage of in-position bars with a positive net return.
    pub win_rate: f64,
    pub total_return: f64,
}

/// Replay one symbol's bars. Returns `None` when there are fewer than two
/// points (no return can be computed).
pub fn replay(symbol: &str, points: &[ChartPoint], mode: StrategyMode) -> Option<SymbolReport> {
    if points.len() < 2 {
        return None;
    }

    let signal = |p: &ChartPoint| -> i8 {
        if p.close > p.vwap {
            1
        } else if mode == StrategyMode::LongShort && p.close < p.vwap {
            -1
        } else {
            0
        }
    };

    let mut equity = INITIAL_CAPITAL;
    let mut prev_position: i8 = 0;
    let mut trades = 0u32;
    let mut winning_bars = 0u32;
    let mut active_bars = 0u32;

    for window in points.windows(2) {
        let (prev, current) = (&window[0], &window[1]);
        // The signal from the previous bar is the position held now.
        let position = signal(prev);
        let switched = u32::from((position - prev_position).unsigned_abs());
        trades += switched;

        let market_return = current.close / prev.close - 1.0;
        let strategy_return = f64::from(position) * market_return;
        let net = strategy_return - f64::from(switched) * COMMISSION_RATE;

        if position != 0 {
            active_bars += 1;
            if net > 0.0 {
                winning_bars += 1;
            }
        }

        equity *= 1.0 + net;
        prev_position = position;
    }

    let win_rate = if active_bars > 0 {
        f64::from(winning_bars) / f64::from(active_bars) * 100.0
    } else {
        0.0
    };

    Some(SymbolReport {
        symbol: symbol.to_string(),
        trades,
        win_rate,
        total_return: equity / INITIAL_CAPITAL - 1.0,
    })
}

/// Run the replay across every intraday file in the data directory and
/// render a per-symbol table plus the average return.
pub fn run(dir: &Path, mode: StrategyMode) -> anyhow::Result<String> {
    let files = loader::discover_intraday_files(dir)?;
    if files.is_empty() {
        anyhow::bail!("no intraday files under {}", dir.join("intraday").display());
    }

    let mut table = TableView::new("VWAP crossing backtest", &["Symbol", "Trades", "Win rate", "Return"]);
    let mut returns = Vec::new();

    for path in &files {
        let Some(symbol) = loader::symbol_from_filename(path) else {
            debug!("skipping {}: no symbol in filename", path.display());
            continue;
        };
        let points = match loader::load_intraday_file(path) {
            Ok(points) => points,
            Err(e) => {
                warn!("{}: {}", path.display(), e);
                continue;
            }
        };
        let Some(report) = replay(&symbol, &points, mode) else {
            warn!("{}: not enough bars to replay", symbol);
            continue;
        };

        returns.push(report.total_return);
        table.push_row(vec![
            report.symbol,
            report.trades.to_string(),
            format!("{:.1}%", report.win_rate),
            format!("{:+.2}%", report.total_return * 100.0),
        ]);
    }

    if returns.is_empty() {
        anyhow::bail!("no replayable intraday files under {}", dir.display());
    }

    table.set_sort(3, Direction::Descending);
    let average = returns.iter().sum::<f64>() / returns.len() as f64;
    Ok(format!(
        "{}\nAverage return across {} symbols: {:+.2}%",
        table.to_text(),
        returns.len(),
        average * 100.0
    ))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
