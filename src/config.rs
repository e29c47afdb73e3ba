//! Configuration types for cbp-stats
//!
//! Every section has defaults, so an empty file is a valid configuration.
//! API credentials are never read from here; see [`crate::api::Credentials`].

use crate::api::{ExchangeConfig, EXCHANGE_API_URL};
use crate::fills::{FetchConfig, DEFAULT_PAGE_SIZE};
use crate::telemetry::LogFormat;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub exchange: ExchangeSection,
    #[serde(default)]
    pub fetch: FetchSection,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// Exchange connection settings
#[derive(Debug, Clone, Deserialize)]
pub struct ExchangeSection {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Currency every product is quoted in
    #[serde(default = "default_quote_currency")]
    pub quote_currency: String,
    /// HTTP timeout for a single request
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    EXCHANGE_API_URL.to_string()
}
fn default_quote_currency() -> String {
    "USD".to_string()
}
fn default_timeout_secs() -> u64 {
    10
}

impl Default for ExchangeSection {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            quote_currency: default_quote_currency(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ExchangeSection {
    pub fn to_exchange_config(&self) -> ExchangeConfig {
        ExchangeConfig {
            base_url: self.base_url.clone(),
            timeout: Duration::from_secs(self.timeout_secs),
            ..Default::default()
        }
    }
}

/// Fill history retrieval settings
#[derive(Debug, Clone, Deserialize)]
pub struct FetchSection {
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    /// Timeout for each page request
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Retries per page after a network error
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
    /// Products fetched in parallel by `compare`
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
    /// Give up on a whole history after this many seconds (unbounded if unset)
    #[serde(default)]
    pub max_fetch_secs: Option<u64>,
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}
fn default_max_retries() -> u32 {
    3
}
fn default_initial_backoff_ms() -> u64 {
    500
}
fn default_max_backoff_ms() -> u64 {
    8_000
}
fn default_max_concurrency() -> usize {
    4
}

impl Default for FetchSection {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            request_timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
            max_concurrency: default_max_concurrency(),
            max_fetch_secs: None,
        }
    }
}

impl FetchSection {
    pub fn to_fetch_config(&self) -> FetchConfig {
        FetchConfig::default()
            .page_size(self.page_size)
            .request_timeout(Duration::from_secs(self.request_timeout_secs))
            .max_retries(self.max_retries)
            .backoff(
                Duration::from_millis(self.initial_backoff_ms),
                Duration::from_millis(self.max_backoff_ms),
            )
            .max_concurrency(self.max_concurrency)
    }

    pub fn max_fetch_duration(&self) -> Option<Duration> {
        self.max_fetch_secs.map(Duration::from_secs)
    }
}

/// Output settings
#[derive(Debug, Clone, Deserialize)]
pub struct DisplayConfig {
    /// Accounts at or below this balance are hidden by `balance`
    #[serde(default = "default_min_balance")]
    pub min_balance: Decimal,
}

fn default_min_balance() -> Decimal {
    Decimal::new(1, 2) // 0.01
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            min_balance: default_min_balance(),
        }
    }
}

/// Telemetry configuration
#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub log_format: LogFormat,
    /// Serve Prometheus metrics on this port when set
    #[serde(default)]
    pub metrics_port: Option<u16>,
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: LogFormat::Pretty,
            metrics_port: None,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<std::path::Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// The shipped `config.toml.example`, used when no config file loads
    pub fn example() -> anyhow::Result<Self> {
        let config: Config = toml::from_str(include_str!("../config.toml.example"))?;
        Ok(config)
    }
}
