//! Chart series composition for the external time-series widget.
//!
//! The widget owns rendering, scaling and resize behavior; this side of the
//! boundary only guarantees correctly shaped tuples in ascending time order,
//! plus the styling options each series is created with.

use serde::Serialize;

use crate::config::{Overlays, Palette};
use crate::models::ChartPoint;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CandlePoint {
    pub time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct LinePoint {
    pub time: i64,
    pub value: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct HistogramPoint {
    pub time: i64,
    pub value: f64,
    pub color: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CandleSeries {
    pub up_color: String,
    pub down_color: String,
    pub data: Vec<CandlePoint>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LineSeries {
    pub color: String,
    pub title: String,
    pub data: Vec<LinePoint>,
}

/// The three aligned overlays: price candles, VWAP line, volume histogram.
/// Overlays switched off in the render config are omitted entirely.
#[derive(Debug, Clone, Serialize)]
pub struct ChartSeries {
    pub symbol: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub candles: Option<CandleSeries>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vwap: Option<LineSeries>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume: Option<Vec<HistogramPoint>>,
}

/// Build the widget payload from per-bar tuples. Input order is not
/// trusted: points are re-sorted ascending by time before slicing into
/// series. Volume bars are colored individually by close-vs-open
/// direction; candle and line colors ride along as series options.
pub fn compose(
    symbol: &str,
    points: &[ChartPoint],
    palette: &Palette,
    overlays: &Overlays,
) -> ChartSeries {
    let mut sorted: Vec<&ChartPoint> = points.iter().collect();
    sorted.sort_by_key(|p| p.time);

    let candles = overlays.candles.then(|| CandleSeries {
        up_color: palette.up.clone(),
        down_color: palette.down.clone(),
        data: sorted
            .iter()
            .map(|p| CandlePoint {
                time: p.time,
                open: p.open,
                high: p.high,
                low: p.low,
                close: p.close,
            })
            .collect(),
    });

    let vwap = overlays.vwap_line.then(|| LineSeries {
        color: palette.vwap_line.clone(),
        title: "VWAP".to_string(),
        data: sorted
            .iter()
            .map(|p| LinePoint { time: p.time, value: p.vwap })
            .collect(),
    });

    let volume = overlays.volume.then(|| {
        sorted
            .iter()
            .map(|p| HistogramPoint {
                time: p.time,
                value: p.volume,
                color: if p.close >= p.open {
                    palette.volume_up.clone()
                } else {
                    palette.volume_down.clone()
                },
            })
            .collect()
    });

    ChartSeries {
        symbol: symbol.to_string(),
        candles,
        vwap,
        volume,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(time: i64, open: f64, close: f64) -> ChartPoint {
        ChartPoint {
            time,
            open,
            high: open.max(close) + 0.5,
            low: open.min(close) - 0.5,
            close,
            volume: 1000.0,
            vwap: (open + close) / 2.0,
        }
    }

    #[test]
    fn series_come_out_in_ascending_time_order() {
        let points = vec![point(300, 10.0, 11.0), point(100, 9.0, 10.0), point(200, 10.0, 9.5)];
        let series = compose("AMD", &points, &Palette::default(), &Overlays::default());

        let times: Vec<i64> = series.candles.unwrap().data.iter().map(|c| c.time).collect();
        assert_eq!(times, vec![100, 200, 300]);
        let vwap_times: Vec<i64> = series.vwap.unwrap().data.iter().map(|l| l.time).collect();
        assert_eq!(vwap_times, vec![100, 200, 300]);
    }

    #[test]
    fn volume_bars_are_colored_by_close_vs_open() {
        let palette = Palette::default();
        let points = vec![point(100, 9.0, 10.0), point(200, 10.0, 9.5)];
        let series = compose("AMD", &points, &palette, &Overlays::default());

        let volume = series.volume.unwrap();
        assert_eq!(volume[0].color, palette.volume_up);
        assert_eq!(volume[1].color, palette.volume_down);
    }

    #[test]
    fn candle_and_line_styling_come_from_the_palette() {
        let palette = Palette::default();
        let series = compose("AMD", &[point(100, 9.0, 10.0)], &palette, &Overlays::default());

        let candles = series.candles.unwrap();
        assert_eq!(candles.up_color, palette.up);
        assert_eq!(candles.down_color, palette.down);
        let vwap = series.vwap.unwrap();
        assert_eq!(vwap.color, palette.vwap_line);
        assert_eq!(vwap.title, "VWAP");
    }

    #[test]
    fn disabled_overlays_are_omitted_from_the_payload() {
        let overlays = Overlays { candles: true, vwap_line: false, volume: false };
        let series = compose("AMD", &[point(100, 9.0, 10.0)], &Palette::default(), &overlays);

        assert!(series.candles.is_some());
        assert!(series.vwap.is_none());
        assert!(series.volume.is_none());

        let json = serde_json::to_value(&series).unwrap();
        assert!(json.get("vwap").is_none());
        assert!(json.get("volume").is_none());
    }
}
