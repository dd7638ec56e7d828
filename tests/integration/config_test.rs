//! Integration tests for configuration loading

use std::io::Write;
use ticker_dash::config::Config;
use ticker_dash::feed::Symbol;
use ticker_dash::telemetry::LogFormat;

const EXAMPLE: &str = include_str!("../../config.toml.example");

#[test]
fn test_example_config_loads() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(EXAMPLE.as_bytes()).unwrap();

    let config = Config::load(file.path()).unwrap();
    assert_eq!(config.feed.symbols.len(), 5);
    assert_eq!(config.feed.symbols[0], Symbol::new("BTCUSDT"));
    assert_eq!(config.feed.max_reconnect_attempts, 0);
    assert_eq!(config.engine.window_secs, 300);
    assert_eq!(config.engine.recompute_interval_ms, 2000);
    assert_eq!(config.telemetry.log_format, LogFormat::Pretty);
    assert!(config.telemetry.metrics_port.is_none());
}

#[test]
fn test_example_matches_defaults() {
    let example: Config = toml::from_str(EXAMPLE).unwrap();
    let defaults = Config::default();
    assert_eq!(example.feed.symbols, defaults.feed.symbols);
    assert_eq!(example.feed.endpoint_template, defaults.feed.endpoint_template);
    assert_eq!(example.engine.window_secs, defaults.engine.window_secs);
}

#[test]
fn test_invalid_config_rejected() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[feed]\nsymbols = []").unwrap();
    assert!(Config::load(file.path()).is_err());
}
