//! REST client for the third-party intraday bar API.
//!
//! The provider answers `GET <base_url>?symbol=&interval=&date=&apikey=`
//! with `{"data": [...]}` on success, or keeps a 2xx status and embeds
//! `{"error": {"code": ..., "message": ...}}` instead. Both the non-2xx
//! and the embedded-error paths are classified failures, terminal for the
//! current cycle — there is no retry here.

use async_trait::async_trait;
use rand::RngExt;
use serde::Deserialize;
use serde_json::Value;
use std::env;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};
use url::Url;

use crate::config::ApiConfig;
use crate::errors::DashboardError;
use crate::feed::{BarSource, BarsRequest};
use crate::normalize::RawBarRecord;

pub struct HttpBarSource {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    request_delay_ms: u64,
    jitter_ms: u64,
}

#[derive(Debug, Deserialize)]
struct ApiEnvelope {
    #[serde(default)]
    data: Option<Vec<RawBarRecord>>,
    #[serde(default)]
    error: Option<ApiErrorBody>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    code: Value,
    message: String,
}

impl HttpBarSource {
    /// The API key comes from the environment (variable name configured);
    /// a missing key blocks construction, nothing is fetched without one.
    pub fn new(config: &ApiConfig) -> Result<Self, DashboardError> {
        let api_key = env::var(&config.api_key_env)
            .map_err(|_| DashboardError::MissingParameter(config.api_key_env.clone()))?;

        let client = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            request_delay_ms: config.request_delay_ms,
            jitter_ms: config.jitter_ms,
        })
    }

    /// Small randomized pause before each request, so repeated scans do not
    /// hammer the provider in lockstep.
    async fn polite_delay(&self) {
        if self.request_delay_ms == 0 && self.jitter_ms == 0 {
            return;
        }
        let jitter = rand::rng().random_range(0..=self.jitter_ms);
        sleep(Duration::from_millis(self.request_delay_ms + jitter)).await;
    }

    /// The URL reported in errors and logs: full query minus the API key.
    fn display_url(&self, query: &[(&str, String)]) -> String {
        match Url::parse_with_params(&self.base_url, query.iter().map(|(k, v)| (*k, v.as_str())))
        {
            Ok(url) => url.to_string(),
            Err(_) => self.base_url.clone(),
        }
    }
}

#[async_trait]
impl BarSource for HttpBarSource {
    async fn fetch_bars(
        &self,
        request: &BarsRequest,
    ) -> Result<Vec<RawBarRecord>, DashboardError> {
        self.polite_delay().await;

        let mut query: Vec<(&str, String)> = vec![
            ("symbol", request.symbol.clone()),
            ("interval", request.interval.clone()),
        ];
        if let Some(date) = &request.date {
            query.push(("date", date.clone()));
        }

        let attempted = self.display_url(&query);
        debug!("GET {}", attempted);

        query.push(("apikey", self.api_key.clone()));
        let response = self.client.get(&self.base_url).query(&query).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(DashboardError::ResourceNotFound {
                location: attempted,
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        let envelope: ApiEnvelope = serde_json::from_str(&body).map_err(|e| {
            warn!("unparseable body from {}: {}", attempted, snippet(&body));
            DashboardError::MalformedResponse {
                location: attempted.clone(),
                detail: format!("{} (body: {})", e, snippet(&body)),
            }
        })?;

        if let Some(error) = envelope.error {
            return Err(DashboardError::UpstreamApi {
                code: code_text(&error.code),
                message: error.message,
            });
        }

        envelope.data.ok_or_else(|| DashboardError::MalformedResponse {
            location: attempted,
            detail: "missing `data` array".to_string(),
        })
    }
}

/// Error envelopes in the wild carry numeric or string codes; render both.
fn code_text(code: &Value) -> String {
    match code {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// First part of a response body, for logs and error details.
fn snippet(body: &str) -> String {
    const MAX: usize = 200;
    if body.chars().count() <= MAX {
        body.to_string()
    } else {
        let head: String = body.chars().take(MAX).collect();
        format!("{}…", head)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize_all;

    #[test]
    fn success_envelope_parses_into_records() {
        let body = r#"{"data": [
            {"time": 1769619540, "open": 10, "high": 11, "low": 9.5, "close": 10.5, "volume": 1200},
            {"date": "2026-01-28T15:59:00-05:00", "data": {"close": "10.6", "high": 11.1, "low": 10.2, "volume": 900}}
        ]}"#;
        let envelope: ApiEnvelope = serde_json::from_str(body).unwrap();
        let records = envelope.data.unwrap();
        assert_eq!(normalize_all(&records).len(), 2);
    }

    #[test]
    fn error_envelope_codes_render_for_both_encodings() {
        let numeric: ApiEnvelope =
            serde_json::from_str(r#"{"error": {"code": 429, "message": "rate limited"}}"#).unwrap();
        assert_eq!(code_text(&numeric.error.unwrap().code), "429");

        let text: ApiEnvelope = serde_json::from_str(
            r#"{"error": {"code": "invalid_api_key", "message": "bad key"}}"#,
        )
        .unwrap();
        assert_eq!(code_text(&text.error.unwrap().code), "invalid_api_key");
    }

    #[test]
    fn envelope_with_neither_data_nor_error_is_shape_mismatch() {
        let envelope: ApiEnvelope = serde_json::from_str(r#"{"status": "ok"}"#).unwrap();
        assert!(envelope.data.is_none());
        assert!(envelope.error.is_none());
    }

    #[test]
    fn snippets_are_truncated_for_logging() {
        let long = "x".repeat(500);
        let cut = snippet(&long);
        assert!(cut.chars().count() <= 201);
        assert!(cut.ends_with('…'));
        assert_eq!(snippet("short"), "short");
    }
}
