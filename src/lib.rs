//! ticker-dash: real-time market data dashboard engine
//!
//! This library provides the core components for:
//! - One streaming ticker connection per tracked trading pair
//! - A 5-minute rolling price window per pair
//! - Derived metrics (window change, volatility, spread, unit conversion,
//!   quote volume) recomputed on a fixed cadence
//! - A published read model for view layers
//! - Configuration, logging and Prometheus metrics

pub mod cli;
pub mod config;
pub mod engine;
pub mod feed;
pub mod stats;
pub mod telemetry;
pub mod ws;
