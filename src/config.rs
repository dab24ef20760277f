use anyhow::{bail, Context, Result};
use regex::Regex;
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;
use std::sync::LazyLock;
use std::time::Duration;

static RE_SYMBOL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Z0-9]{2,20}$").unwrap());
static RE_TIMEFRAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:[0-9]{1,3}|D|W|M)$").unwrap());

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub dashboard: DashboardConfig,
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DashboardConfig {
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_symbols")]
    pub symbols: Vec<String>,
    /// Falls back to the first entry of `symbols`.
    #[serde(default)]
    pub default_symbol: Option<String>,
    #[serde(default = "default_timeframe")]
    pub default_timeframe: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BackendConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    #[serde(default)]
    pub live_feed: bool,
    #[serde(default = "default_live_reconnect")]
    pub live_reconnect_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_chart_path")]
    pub chart_path: PathBuf,
    #[serde(default = "default_export_dir")]
    pub export_dir: PathBuf,
}

fn default_poll_interval() -> u64 { 8 }
fn default_symbols() -> Vec<String> { vec!["BTCUSDT".to_string(), "ETHUSDT".to_string()] }
fn default_timeframe() -> String { "15".to_string() }
fn default_base_url() -> String { "http://127.0.0.1:8000".to_string() }
fn default_request_timeout() -> u64 { 10 }
fn default_live_reconnect() -> u64 { 5 }
fn default_chart_path() -> PathBuf { PathBuf::from("chart.json") }
fn default_export_dir() -> PathBuf { PathBuf::from("exports") }

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval(),
            symbols: default_symbols(),
            default_symbol: None,
            default_timeframe: default_timeframe(),
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout(),
            live_feed: false,
            live_reconnect_secs: default_live_reconnect(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            chart_path: default_chart_path(),
            export_dir: default_export_dir(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct EnvConfig {
    pub config_path: String,
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path))?;

        Self::parse(&contents).with_context(|| format!("Invalid config file: {}", path))
    }

    pub fn parse(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents).context("Failed to parse config")?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the poller cannot run with.
    pub fn validate(&self) -> Result<()> {
        let dash = &self.dashboard;

        if dash.poll_interval_secs == 0 {
            bail!("dashboard.poll_interval_secs must be at least 1");
        }
        if dash.symbols.is_empty() {
            bail!("dashboard.symbols must list at least one symbol");
        }
        for symbol in &dash.symbols {
            if !is_valid_symbol(symbol) {
                bail!("Invalid symbol in dashboard.symbols: {}", symbol);
            }
        }
        if let Some(symbol) = &dash.default_symbol {
            if !dash.symbols.contains(symbol) {
                bail!("dashboard.default_symbol {} is not in dashboard.symbols", symbol);
            }
        }
        if !is_valid_timeframe(&dash.default_timeframe) {
            bail!("Invalid dashboard.default_timeframe: {}", dash.default_timeframe);
        }
        if self.backend.request_timeout_secs == 0 {
            bail!("backend.request_timeout_secs must be at least 1");
        }

        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.dashboard.poll_interval_secs)
    }

    pub fn initial_symbol(&self) -> String {
        self.dashboard
            .default_symbol
            .clone()
            .or_else(|| self.dashboard.symbols.first().cloned())
            .unwrap_or_else(|| "BTCUSDT".to_string())
    }
}

impl EnvConfig {
    pub fn load() -> Result<Self> {
        dotenv::dotenv().ok();

        Ok(Self {
            config_path: std::env::var("DASHBOARD_CONFIG")
                .unwrap_or_else(|_| "config.toml".to_string()),
        })
    }
}

/// Exchange symbols as the backend lists them, e.g. `BTCUSDT`.
pub fn is_valid_symbol(symbol: &str) -> bool {
    RE_SYMBOL.is_match(symbol)
}

/// Bybit kline intervals: minutes as digits, or `D`, `W`, `M`.
pub fn is_valid_timeframe(timeframe: &str) -> bool {
    if !RE_TIMEFRAME.is_match(timeframe) {
        return false;
    }
    match timeframe.parse::<u32>() {
        Ok(minutes) => (1..=720).contains(&minutes),
        Err(_) => true,
    }
}
