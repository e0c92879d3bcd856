//! Static JSON inputs produced by the collection jobs: end-of-day summary,
//! pre-market scan, and per-symbol intraday chart files under the data
//! directory.

use serde::de::DeserializeOwned;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::errors::DashboardError;
use crate::models::{ChartPoint, PremarketRow, SummaryRow};

// ── Path layout ───────────────────────────────────────────────────────────────

pub fn summary_path(dir: &Path, date: &str) -> PathBuf {
    dir.join(format!("vwap_{}.json", date))
}

pub fn premarket_path(dir: &Path, date: &str) -> PathBuf {
    dir.join(format!("premarket_{}.json", date))
}

/// With a date: one trading day. Without: the symbol's full history file.
pub fn intraday_path(dir: &Path, symbol: &str, date: Option<&str>) -> PathBuf {
    let name = match date {
        Some(d) => format!("intraday_{}_{}.json", symbol, d),
        None => format!("intraday_{}.json", symbol),
    };
    dir.join("intraday").join(name)
}

/// Extract the symbol from an intraday filename:
/// `intraday_AMD_2026-01-28.json` → `AMD`.
pub fn symbol_from_filename(path: &Path) -> Option<String> {
    let stem = path.file_stem()?.to_str()?;
    let symbol = stem.split('_').nth(1)?.trim().to_uppercase();
    if symbol.is_empty() { None } else { Some(symbol) }
}

pub fn discover_intraday_files(dir: &Path) -> Result<Vec<PathBuf>, DashboardError> {
    let intraday = dir.join("intraday");
    if !intraday.exists() {
        return Ok(vec![]);
    }
    let mut files = Vec::new();
    for entry in fs::read_dir(&intraday)? {
        let path = entry?.path();
        if path.is_file() && path.extension().map(|e| e == "json").unwrap_or(false) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

// ── Loading ───────────────────────────────────────────────────────────────────

pub fn load_summary(dir: &Path, date: &str) -> Result<Vec<SummaryRow>, DashboardError> {
    read_json(&summary_path(dir, date))
}

pub fn load_premarket(dir: &Path, date: &str) -> Result<Vec<PremarketRow>, DashboardError> {
    read_json(&premarket_path(dir, date))
}

pub fn load_intraday(
    dir: &Path,
    symbol: &str,
    date: Option<&str>,
) -> Result<Vec<ChartPoint>, DashboardError> {
    read_json(&intraday_path(dir, symbol, date))
}

pub fn load_intraday_file(path: &Path) -> Result<Vec<ChartPoint>, DashboardError> {
    read_json(path)
}

/// A missing file is classified like the web dashboards classified it: a
/// 404 for that path. A present-but-unparseable file is a different
/// failure and must stay distinguishable.
fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, DashboardError> {
    debug!("reading {}", path.display());
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(DashboardError::ResourceNotFound {
                location: path.display().to_string(),
                status: 404,
            });
        }
        Err(e) => return Err(DashboardError::Io(e)),
    };
    serde_json::from_str(&text).map_err(|e| DashboardError::MalformedResponse {
        location: path.display().to_string(),
        detail: e.to_string(),
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &Path, name: &str, body: &str) {
        fs::write(dir.join(name), body).unwrap();
    }

    #[test]
    fn summary_round_trip() {
        let tmp = TempDir::new().unwrap();
        write(
            tmp.path(),
            "vwap_2026-01-28.json",
            r#"[{"symbol":"AMD","date":"2026-01-28","close":142.1,"vwap":140.95,"close_vwap_pct":0.8159}]"#,
        );
        let rows = load_summary(tmp.path(), "2026-01-28").unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].symbol, "AMD");
    }

    #[test]
    fn missing_file_is_a_404_with_the_attempted_path() {
        let tmp = TempDir::new().unwrap();
        let err = load_summary(tmp.path(), "2026-01-28").unwrap_err();
        match err {
            DashboardError::ResourceNotFound { location, status } => {
                assert_eq!(status, 404);
                assert!(location.contains("vwap_2026-01-28.json"));
            }
            other => panic!("expected ResourceNotFound, got {:?}", other),
        }
    }

    #[test]
    fn invalid_json_is_malformed_not_missing() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "vwap_2026-01-28.json", "{ not json");
        let err = load_summary(tmp.path(), "2026-01-28").unwrap_err();
        assert!(matches!(err, DashboardError::MalformedResponse { .. }));
    }

    #[test]
    fn intraday_paths_with_and_without_date() {
        let dir = Path::new("data");
        assert_eq!(
            intraday_path(dir, "AMD", Some("2026-01-28")),
            Path::new("data/intraday/intraday_AMD_2026-01-28.json")
        );
        assert_eq!(
            intraday_path(dir, "AMD", None),
            Path::new("data/intraday/intraday_AMD.json")
        );
    }

    #[test]
    fn symbol_extraction_from_intraday_filenames() {
        assert_eq!(
            symbol_from_filename(Path::new("data/intraday/intraday_AMD_2026-01-28.json")),
            Some("AMD".to_string())
        );
        assert_eq!(
            symbol_from_filename(Path::new("intraday_tsla.json")),
            Some("TSLA".to_string())
        );
        assert_eq!(symbol_from_filename(Path::new("notes.json")), None);
    }
}
