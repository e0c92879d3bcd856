//! Command orchestration: one fetch → compute → render cycle per
//! user-initiated action.
//!
//! Every cycle runs against the [`ViewState`] gate: results apply only if
//! no newer cycle has started, failures land in the error area and leave
//! the previous content alone. Errors are terminal for their cycle — they
//! are logged with the request context and surfaced, never retried.

use anyhow::{Context, Result};
use std::path::Path;
use tracing::{debug, error, info, warn};

use crate::chart;
use crate::config::{AppConfig, DateFilterMode};
use crate::errors::DashboardError;
use crate::feed::http::HttpBarSource;
use crate::feed::{BarSource, BarsRequest};
use crate::loader;
use crate::models::{Bar, ChartPoint};
use crate::normalize;
use crate::notify;
use crate::render::{Direction, TableView};
use crate::utils;
use crate::view::ViewState;
use crate::vwap;
use crate::vwap::AggregationError;

/// A finished render: what goes on screen, plus the copyable Markdown
/// block the dashboards keep next to each table.
struct Rendered {
    text: String,
    markdown: String,
}

pub struct Pipeline {
    config: AppConfig,
}

impl Pipeline {
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    // ── Commands ──────────────────────────────────────────────────────────────

    /// End-of-day VWAP summary table for one trading date.
    pub async fn run_dashboard(
        &self,
        date: Option<String>,
        sort: Option<&str>,
        send: bool,
    ) -> Result<()> {
        let date = resolve_date(date)?;
        let outcome = self.build_dashboard(&date, sort);
        self.present(&format!("dashboard date={}", date), outcome, send).await
    }

    /// Pre-market scanner table, sorted by total score.
    pub async fn run_premarket(
        &self,
        date: Option<String>,
        sort: Option<&str>,
        send: bool,
    ) -> Result<()> {
        let date = resolve_date(date)?;
        let outcome = self.build_premarket(&date, sort);
        self.present(&format!("premarket date={}", date), outcome, send).await
    }

    /// Candlestick/VWAP/volume chart payload for a symbol, written as JSON.
    pub async fn run_chart(
        &self,
        symbol: &str,
        date: Option<String>,
        out: Option<&Path>,
    ) -> Result<()> {
        let request = BarsRequest::new(symbol, &self.config.api.interval, date)?;
        let label = cycle_label(&request);

        let mut view = ViewState::new();
        let id = view.begin();
        let outcome = self.build_chart_json(&request).await;
        view.apply(id, outcome);

        if let Some(err) = view.error() {
            error!("chart cycle failed ({}): {}", label, err);
            anyhow::bail!("{}", err);
        }
        let Some(json) = view.content() else {
            return Ok(());
        };

        match out {
            Some(path) => {
                std::fs::write(path, json)
                    .with_context(|| format!("writing chart payload to {}", path.display()))?;
                info!("chart payload written to {}", path.display());
            }
            None => println!("{}", json),
        }
        Ok(())
    }

    /// Fetch intraday bars for one symbol, aggregate the day's VWAP and
    /// classify it.
    pub async fn run_analyze(&self, symbol: &str, date: Option<String>) -> Result<()> {
        let date = resolve_date(date)?;
        let request = BarsRequest::new(symbol, &self.config.api.interval, Some(date))?;
        let label = cycle_label(&request);

        let mut view = ViewState::new();
        let id = view.begin();
        let outcome = self.build_analysis(&request).await;
        view.apply(id, outcome);

        if let Some(err) = view.error() {
            error!("analyze cycle failed ({}): {}", label, err);
            anyhow::bail!("{}", err);
        }
        if let Some(content) = view.content() {
            println!("{}", content);
        }
        Ok(())
    }

    // ── Cycle bodies ──────────────────────────────────────────────────────────

    fn build_dashboard(&self, date: &str, sort: Option<&str>) -> Result<Rendered, DashboardError> {
        let rows = loader::load_summary(&self.config.data.dir, date)?;
        info!("{} summary rows for {}", rows.len(), date);

        let mut table = TableView::new(
            format!("EOD VWAP analysis ({})", date),
            &["Ticker", "Date", "Close", "VWAP", "Δ%", "Scenario"],
        );
        for row in &rows {
            // The stored percentage is authoritative; the classifier is
            // reapplied for display only.
            let scenario = vwap::classify_pct(row.close_vwap_pct);
            table.push_row(vec![
                row.symbol.clone(),
                row.date.clone(),
                format!("{:.2}", row.close),
                format!("{:.2}", row.vwap),
                format!("{:+.2}%", row.close_vwap_pct),
                scenario.to_string(),
            ]);
        }

        apply_sort_choice(&mut table, sort, (0, Direction::Ascending));

        let markdown = table.to_markdown(None);
        Ok(Rendered { text: table.to_text(), markdown })
    }

    fn build_premarket(&self, date: &str, sort: Option<&str>) -> Result<Rendered, DashboardError> {
        let rows = loader::load_premarket(&self.config.data.dir, date)?;
        info!("{} pre-market rows for {}", rows.len(), date);

        let mut table = TableView::new(
            format!("Pre-market scan ({})", date),
            &["Ticker", "Prev trend", "Price", "Chg%", "Opt", "Score"],
        );
        for row in &rows {
            table.push_row(vec![
                row.symbol.clone(),
                row.prev_trend.clone(),
                format!("{:.2}", row.price),
                format!("{:+.2}%", row.change_pct),
                row.opt_score.to_string(),
                row.total_score.to_string(),
            ]);
        }

        apply_sort_choice(&mut table, sort, (5, Direction::Descending));

        let markdown = table.to_markdown(Some(self.config.render.top_n));
        Ok(Rendered { text: table.to_text(), markdown })
    }

    async fn build_chart_json(&self, request: &BarsRequest) -> Result<String, DashboardError> {
        let points = self.chart_points(request).await?;
        let series = chart::compose(
            &request.symbol,
            &points,
            &self.config.render.palette,
            &self.config.render.overlays,
        );
        serde_json::to_string_pretty(&series).map_err(|e| DashboardError::MalformedResponse {
            location: "chart payload".to_string(),
            detail: e.to_string(),
        })
    }

    async fn build_analysis(&self, request: &BarsRequest) -> Result<String, DashboardError> {
        let label = cycle_label(request);
        let bars = self.day_bars(request).await?;

        let result = vwap::aggregate(&bars).map_err(|e| match e {
            AggregationError::EmptySeries => DashboardError::EmptySeries(label.clone()),
            AggregationError::ZeroVolume { bars } => DashboardError::ZeroVolume { bars },
        })?;

        let pct = vwap::close_vwap_pct(result.close, result.vwap);
        let scenario = vwap::classify(result.close, result.vwap);
        let total_volume: f64 = bars.iter().map(|b| b.volume).filter(|v| v.is_finite()).sum();

        Ok(format!(
            "{}: close {:.2} | vwap {:.2} | {:+.2}% → {} | last bar {} | {} bars, volume {}",
            label,
            result.close,
            result.vwap,
            pct,
            scenario,
            result.last_bar_timestamp.format("%H:%M:%S"),
            bars.len(),
            utils::fmt_number(total_volume as i64),
        ))
    }

    // ── Data access ───────────────────────────────────────────────────────────

    /// Chart tuples for a request: the static file when present, otherwise
    /// the HTTP API with the running VWAP filled in.
    async fn chart_points(&self, request: &BarsRequest) -> Result<Vec<ChartPoint>, DashboardError> {
        let points = match self.static_points(request)? {
            Some(points) => points,
            None => points_from_bars(&self.api_bars(request).await?),
        };
        if points.is_empty() {
            return Err(DashboardError::EmptySeries(cycle_label(request)));
        }
        Ok(points)
    }

    /// Bars for aggregation, from the same two sources.
    async fn day_bars(&self, request: &BarsRequest) -> Result<Vec<Bar>, DashboardError> {
        match self.static_points(request)? {
            Some(points) => {
                let bars: Vec<Bar> =
                    points.iter().filter_map(normalize::bar_from_chart_point).collect();
                if bars.is_empty() {
                    return Err(DashboardError::EmptySeries(cycle_label(request)));
                }
                Ok(bars)
            }
            None => self.api_bars(request).await,
        }
    }

    /// Try the dated intraday file, then the symbol's full-history file
    /// (day-filtered when a date was asked for). `None` means no static
    /// file exists and the API should be consulted.
    fn static_points(
        &self,
        request: &BarsRequest,
    ) -> Result<Option<Vec<ChartPoint>>, DashboardError> {
        let dir = &self.config.data.dir;
        let date = request.date.as_deref();

        match loader::load_intraday(dir, &request.symbol, date) {
            Ok(points) => Ok(Some(points)),
            Err(DashboardError::ResourceNotFound { location, .. }) => {
                debug!("no static file at {}", location);
                let Some(date) = date else {
                    return Ok(None);
                };
                match loader::load_intraday(dir, &request.symbol, None) {
                    Ok(mut points) => {
                        if self.config.render.date_filter == DateFilterMode::Exact {
                            points.retain(|p| {
                                normalize::unix_day(p.time).as_deref() == Some(date)
                            });
                        }
                        Ok(Some(points))
                    }
                    Err(DashboardError::ResourceNotFound { location, .. }) => {
                        debug!("no static file at {}", location);
                        Ok(None)
                    }
                    Err(e) => Err(e),
                }
            }
            Err(e) => Err(e),
        }
    }

    /// Fetch from the HTTP API, normalize, day-filter per render config and
    /// sort ascending.
    async fn api_bars(&self, request: &BarsRequest) -> Result<Vec<Bar>, DashboardError> {
        let source = HttpBarSource::new(&self.config.api)?;
        let records = source.fetch_bars(request).await?;
        debug!("{} raw records from the API", records.len());

        let mut bars = normalize::normalize_all(&records);
        if self.config.render.date_filter == DateFilterMode::Exact {
            if let Some(date) = &request.date {
                bars = normalize::filter_day(bars, date);
            }
        }
        if bars.is_empty() {
            return Err(DashboardError::EmptySeries(cycle_label(request)));
        }
        bars.sort_by_key(|b| b.timestamp);
        Ok(bars)
    }

    // ── Shared tail of the table commands ─────────────────────────────────────

    async fn present(
        &self,
        label: &str,
        outcome: Result<Rendered, DashboardError>,
        send: bool,
    ) -> Result<()> {
        let mut view = ViewState::new();
        let id = view.begin();
        let markdown = match outcome {
            Ok(rendered) => {
                let markdown = rendered.markdown;
                view.apply(id, Ok(rendered.text));
                Some(markdown)
            }
            Err(e) => {
                view.apply(id, Err(e));
                None
            }
        };

        if let Some(err) = view.error() {
            error!("cycle failed ({}): {}", label, err);
            anyhow::bail!("{}", err);
        }
        if let Some(content) = view.content() {
            println!("{}", content);
            if let Some(markdown) = &markdown {
                println!("Markdown (copyable):\n{}", markdown);
            }
        }
        if send {
            if let Some(markdown) = &markdown {
                notify::send_summary(markdown).await;
            }
        }
        Ok(())
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn resolve_date(date: Option<String>) -> Result<String, DashboardError> {
    let date = date.unwrap_or_else(utils::today);
    let date = date.trim().to_string();
    if date.is_empty() {
        return Err(DashboardError::MissingParameter("date".to_string()));
    }
    Ok(date)
}

fn cycle_label(request: &BarsRequest) -> String {
    match &request.date {
        Some(date) => format!("{} {}", request.symbol, date),
        None => format!("{} (full history)", request.symbol),
    }
}

/// A user-chosen column replaces the default ordering entirely; an unknown
/// header falls back to the default with a warning.
fn apply_sort_choice(table: &mut TableView, sort: Option<&str>, default: (usize, Direction)) {
    if let Some(header) = sort {
        if table.sort_by_header(header) {
            return;
        }
        warn!("unknown sort column: {}", header);
    }
    table.set_sort(default.0, default.1);
}

fn points_from_bars(bars: &[Bar]) -> Vec<ChartPoint> {
    let vwap_line = vwap::cumulative_vwap(bars);
    bars.iter()
        .zip(vwap_line)
        .map(|(bar, vwap)| ChartPoint {
            time: bar.timestamp.timestamp(),
            open: bar.open,
            high: bar.high,
            low: bar.low,
            close: bar.close,
            volume: bar.volume,
            vwap,
        })
        .collect()
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn blank_date_is_a_missing_parameter() {
        let err = resolve_date(Some("  ".to_string())).unwrap_err();
        assert!(matches!(err, DashboardError::MissingParameter(p) if p == "date"));
    }

    #[test]
    fn absent_date_defaults_to_today() {
        assert_eq!(resolve_date(None).unwrap(), utils::today());
    }

    #[test]
    fn chart_points_carry_the_running_vwap() {
        let ts = |secs: i64| Utc.timestamp_opt(secs, 0).single().unwrap();
        let bar = |secs: i64, high: f64, low: f64, close: f64, volume: f64| Bar {
            timestamp: ts(secs),
            day: ts(secs).format("%Y-%m-%d").to_string(),
            open: close,
            high,
            low,
            close,
            volume,
        };

        let bars = vec![
            bar(100, 12.0, 9.0, 9.0, 100.0),  // tp 10
            bar(200, 12.0, 9.0, 12.0, 100.0), // tp 11 → cum (1000+1100)/200
        ];
        let points = points_from_bars(&bars);
        assert_eq!(points[0].time, 100);
        assert!((points[0].vwap - 10.0).abs() < 1e-12);
        assert!((points[1].vwap - 10.5).abs() < 1e-12);
    }

    #[test]
    fn cycle_labels_name_the_request() {
        let with_date = BarsRequest::new("amd", "5m", Some("2026-01-28".into())).unwrap();
        assert_eq!(cycle_label(&with_date), "AMD 2026-01-28");
        let full = BarsRequest::new("amd", "5m", None).unwrap();
        assert_eq!(cycle_label(&full), "AMD (full history)");
    }
}
