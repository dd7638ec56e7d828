//! Configuration types for ticker-dash

use crate::feed::{EndpointTemplate, Symbol, BINANCE_TICKER_TEMPLATE};
use crate::telemetry::LogFormat;
use crate::ws::WsConfig;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;
use thiserror::Error;

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub feed: FeedConfig,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// Streaming feed configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FeedConfig {
    /// Tracked symbols, in display order
    #[serde(default = "default_symbols")]
    pub symbols: Vec<Symbol>,

    /// Quote asset shared by the tracked symbols
    #[serde(default = "default_quote_asset")]
    pub quote_asset: String,

    /// Stream URL with a `{symbol}` placeholder
    #[serde(default = "default_endpoint_template")]
    pub endpoint_template: String,

    /// Reconnection attempts after a transport failure (0 = never reconnect)
    #[serde(default)]
    pub max_reconnect_attempts: u32,

    #[serde(default = "default_initial_reconnect_delay_ms")]
    pub initial_reconnect_delay_ms: u64,

    #[serde(default = "default_max_reconnect_delay_ms")]
    pub max_reconnect_delay_ms: u64,

    #[serde(default = "default_ping_interval_secs")]
    pub ping_interval_secs: u64,
}

fn default_symbols() -> Vec<Symbol> {
    ["BTCUSDT", "SOLUSDT", "DASHUSDT", "PIVXUSDT", "AVAXUSDT"]
        .into_iter()
        .map(Symbol::new)
        .collect()
}
fn default_quote_asset() -> String {
    "USDT".to_string()
}
fn default_endpoint_template() -> String {
    BINANCE_TICKER_TEMPLATE.to_string()
}
fn default_initial_reconnect_delay_ms() -> u64 {
    1_000
}
fn default_max_reconnect_delay_ms() -> u64 {
    60_000
}
fn default_ping_interval_secs() -> u64 {
    30
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            symbols: default_symbols(),
            quote_asset: default_quote_asset(),
            endpoint_template: default_endpoint_template(),
            max_reconnect_attempts: 0,
            initial_reconnect_delay_ms: default_initial_reconnect_delay_ms(),
            max_reconnect_delay_ms: default_max_reconnect_delay_ms(),
            ping_interval_secs: default_ping_interval_secs(),
        }
    }
}

impl FeedConfig {
    /// Transport settings shared by every symbol's connection
    pub fn ws_config(&self) -> WsConfig {
        WsConfig::default()
            .max_reconnects(self.max_reconnect_attempts)
            .initial_delay(Duration::from_millis(self.initial_reconnect_delay_ms))
            .max_delay(Duration::from_millis(self.max_reconnect_delay_ms))
            .ping_interval(Duration::from_secs(self.ping_interval_secs))
    }

    pub fn endpoint(&self) -> EndpointTemplate {
        EndpointTemplate::new(self.endpoint_template.clone())
    }
}

/// Windowing and recompute configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EngineConfig {
    /// Price window horizon (seconds)
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,

    /// Metrics recompute cadence (milliseconds)
    #[serde(default = "default_recompute_interval_ms")]
    pub recompute_interval_ms: u64,
}

fn default_window_secs() -> u64 {
    300 // 5 minutes
}
fn default_recompute_interval_ms() -> u64 {
    2_000
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            window_secs: default_window_secs(),
            recompute_interval_ms: default_recompute_interval_ms(),
        }
    }
}

impl EngineConfig {
    pub fn horizon(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.window_secs as i64)
    }

    pub fn recompute_interval(&self) -> Duration {
        Duration::from_millis(self.recompute_interval_ms)
    }
}

/// Telemetry configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TelemetryConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub log_format: LogFormat,
    /// Prometheus exporter port; no exporter when unset
    pub metrics_port: Option<u16>,
}

fn default_log_level() -> String {
    "info".to_string()
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

/// Configuration validation errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("No symbols configured")]
    NoSymbols,
    #[error("Duplicate symbol: {0}")]
    DuplicateSymbol(Symbol),
    #[error("Endpoint template {0:?} has no {{symbol}} placeholder")]
    MissingPlaceholder(String),
    #[error("{0} must be greater than zero")]
    Zero(&'static str),
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<std::path::Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check invariants serde cannot express
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.feed.symbols.is_empty() {
            return Err(ConfigError::NoSymbols);
        }
        let mut seen = HashSet::new();
        for symbol in &self.feed.symbols {
            if !seen.insert(symbol) {
                return Err(ConfigError::DuplicateSymbol(symbol.clone()));
            }
        }
        if !self
            .feed
            .endpoint_template
            .contains(EndpointTemplate::PLACEHOLDER)
        {
            return Err(ConfigError::MissingPlaceholder(
                self.feed.endpoint_template.clone(),
            ));
        }
        if self.feed.ping_interval_secs == 0 {
            return Err(ConfigError::Zero("feed.ping_interval_secs"));
        }
        if self.engine.window_secs == 0 {
            return Err(ConfigError::Zero("engine.window_secs"));
        }
        if self.engine.recompute_interval_ms == 0 {
            return Err(ConfigError::Zero("engine.recompute_interval_ms"));
        }
        Ok(())
    }
}
