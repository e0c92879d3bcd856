pub mod http;

use async_trait::async_trait;

use crate::errors::DashboardError;
use crate::normalize::RawBarRecord;

// ── Source trait ──────────────────────────────────────────────────────────────

/// Swappable intraday bar source abstraction.
#[async_trait]
pub trait BarSource: Send + Sync {
    async fn fetch_bars(&self, request: &BarsRequest) -> Result<Vec<RawBarRecord>, DashboardError>;
}

// ── Request ───────────────────────────────────────────────────────────────────

/// One intraday request. `date` is optional: without it the source returns
/// the symbol's full available history as one continuous series.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BarsRequest {
    pub symbol: String,
    pub interval: String,
    pub date: Option<String>,
}

impl BarsRequest {
    /// Symbols are case-normalized to uppercase; a blank symbol blocks the
    /// request before anything is fetched.
    pub fn new(
        symbol: &str,
        interval: &str,
        date: Option<String>,
    ) -> Result<Self, DashboardError> {
        let symbol = symbol.trim().to_uppercase();
        if symbol.is_empty() {
            return Err(DashboardError::MissingParameter("symbol".to_string()));
        }
        Ok(Self {
            symbol,
            interval: interval.to_string(),
            date,
        })
    }
}
