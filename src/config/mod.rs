use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub render: RenderConfig,
}

/// Static JSON inputs
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub dir: PathBuf,
}

/// Third-party intraday bar API
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_interval")]
    pub interval: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_request_delay_ms")]
    pub request_delay_ms: u64,

    #[serde(default = "default_jitter_ms")]
    pub jitter_ms: u64,

    /// Name of the environment variable holding the API key. The key
    /// itself never lives in a config file.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

/// Presentation options
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RenderConfig {
    #[serde(default = "default_date_filter")]
    pub date_filter: DateFilterMode,

    /// Row cap for Markdown/notification exports.
    #[serde(default = "default_top_n")]
    pub top_n: usize,

    #[serde(default)]
    pub palette: Palette,

    #[serde(default)]
    pub overlays: Overlays,
}

/// `exact` restricts a series to one trading date; `none` treats the full
/// available history as one continuous series (used when no date is given).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DateFilterMode {
    Exact,
    None,
}

/// Chart colors, forwarded verbatim to the widget.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Palette {
    #[serde(default = "default_up_color")]
    pub up: String,
    #[serde(default = "default_down_color")]
    pub down: String,
    #[serde(default = "default_vwap_color")]
    pub vwap_line: String,
    #[serde(default = "default_volume_up")]
    pub volume_up: String,
    #[serde(default = "default_volume_down")]
    pub volume_down: String,
}

/// Which of the three aligned series the chart payload carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct Overlays {
    #[serde(default = "default_true")]
    pub candles: bool,
    #[serde(default = "default_true")]
    pub vwap_line: bool,
    #[serde(default = "default_true")]
    pub volume: bool,
}

// ── Defaults ─────────────────────────────────────────────────────────────────

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}
fn default_base_url() -> String {
    "https://api.marketstack.com/v1/intraday".to_string()
}
fn default_interval() -> String {
    "5m".to_string()
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_request_delay_ms() -> u64 {
    400
}
fn default_jitter_ms() -> u64 {
    150
}
fn default_api_key_env() -> String {
    "MARKET_API_KEY".to_string()
}
fn default_user_agent() -> String {
    "vwap-dash/0.1 (eod vwap dashboard)".to_string()
}
fn default_date_filter() -> DateFilterMode {
    DateFilterMode::Exact
}
fn default_top_n() -> usize {
    5
}
fn default_up_color() -> String {
    "#26a69a".to_string()
}
fn default_down_color() -> String {
    "#ef5350".to_string()
}
fn default_vwap_color() -> String {
    "#ff9800".to_string()
}
fn default_volume_up() -> String {
    "rgba(38, 166, 154, 0.5)".to_string()
}
fn default_volume_down() -> String {
    "rgba(239, 83, 80, 0.5)".to_string()
}
fn default_true() -> bool {
    true
}

// ── Loader ───────────────────────────────────────────────────────────────────

impl AppConfig {
    /// Load configuration from file + environment overrides
    pub fn load() -> Result<Self> {
        dotenv::dotenv().ok();

        let cfg = config::Config::builder()
            .add_source(
                config::File::with_name("config/default")
                    .required(false)
                    .format(config::FileFormat::Toml),
            )
            .add_source(
                config::File::with_name("config/local")
                    .required(false)
                    .format(config::FileFormat::Toml),
            )
            .add_source(config::Environment::with_prefix("VWAP").separator("__"))
            .build()?;

        let app_cfg: AppConfig = cfg.try_deserialize().unwrap_or_else(|_| AppConfig::default());
        Ok(app_cfg)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data: DataConfig::default(),
            api: ApiConfig::default(),
            render: RenderConfig::default(),
        }
    }
}

impl Default for DataConfig {
    fn default() -> Self {
        Self { dir: default_data_dir() }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            interval: default_interval(),
            timeout_secs: default_timeout_secs(),
            request_delay_ms: default_request_delay_ms(),
            jitter_ms: default_jitter_ms(),
            api_key_env: default_api_key_env(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            date_filter: default_date_filter(),
            top_n: default_top_n(),
            palette: Palette::default(),
            overlays: Overlays::default(),
        }
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            up: default_up_color(),
            down: default_down_color(),
            vwap_line: default_vwap_color(),
            volume_up: default_volume_up(),
            volume_down: default_volume_down(),
        }
    }
}

impl Default for Overlays {
    fn default() -> Self {
        Self { candles: true, vwap_line: true, volume: true }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn date_filter_mode_uses_lowercase_names() {
        let exact: DateFilterMode = serde_json::from_str("\"exact\"").unwrap();
        assert_eq!(exact, DateFilterMode::Exact);
        let none: DateFilterMode = serde_json::from_str("\"none\"").unwrap();
        assert_eq!(none, DateFilterMode::None);
    }

    #[test]
    fn partial_config_fills_in_defaults() {
        let cfg: AppConfig = serde_json::from_str(r#"{"api": {"interval": "1m"}}"#).unwrap();
        assert_eq!(cfg.api.interval, "1m");
        assert_eq!(cfg.api.timeout_secs, 30);
        assert_eq!(cfg.render.top_n, 5);
        assert_eq!(cfg.render.overlays.volume, true);
    }
}
