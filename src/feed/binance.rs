//! Binance 24h ticker stream parsing

use super::Tick;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use thiserror::Error;

/// Per-symbol ticker stream; `{symbol}` is replaced by the lowercased symbol
pub const BINANCE_TICKER_TEMPLATE: &str = "wss://stream.binance.com/ws/{symbol}@ticker";

/// Event type carried by `<symbol>@ticker` messages
const TICKER_EVENT: &str = "24hrTicker";

/// Binance 24hr ticker message structure
#[derive(Debug, Deserialize)]
struct BinanceTickerMessage {
    /// Event type
    #[serde(rename = "e")]
    event_type: Option<String>,
    /// Last price
    #[serde(rename = "c")]
    last_price: String,
    /// 24h price change percent
    #[serde(rename = "P")]
    price_change_percent: Option<String>,
    /// Best bid price
    #[serde(rename = "b")]
    best_bid: Option<String>,
    /// Best ask price
    #[serde(rename = "a")]
    best_ask: Option<String>,
    /// Total traded base asset volume
    #[serde(rename = "v")]
    volume: Option<String>,
    /// 24h high
    #[serde(rename = "h")]
    high: Option<String>,
    /// 24h low
    #[serde(rename = "l")]
    low: Option<String>,
}

/// Reasons a ticker payload is rejected
#[derive(Debug, Error)]
pub enum TickParseError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unexpected event type {0:?}")]
    EventType(String),
    #[error("invalid price {0:?}")]
    Price(String),
}

fn parse_field(value: Option<&str>) -> Option<f64> {
    value?.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse a Binance ticker message into a Tick received at `received_at`
pub fn parse_ticker(msg: &str, received_at: DateTime<Utc>) -> Result<Tick, TickParseError> {
    let ticker: BinanceTickerMessage = serde_json::from_str(msg)?;

    if let Some(event_type) = ticker.event_type {
        if event_type != TICKER_EVENT {
            return Err(TickParseError::EventType(event_type));
        }
    }

    // Window metrics divide by sampled prices
    let price = parse_field(Some(ticker.last_price.as_str()))
        .filter(|p| *p > 0.0)
        .ok_or_else(|| TickParseError::Price(ticker.last_price.clone()))?;

    Ok(Tick {
        price,
        bid_price: parse_field(ticker.best_bid.as_deref()),
        ask_price: parse_field(ticker.best_ask.as_deref()),
        volume: parse_field(ticker.volume.as_deref()),
        high_24h: parse_field(ticker.high.as_deref()),
        low_24h: parse_field(ticker.low.as_deref()),
        price_change_percent_24h: parse_field(ticker.price_change_percent.as_deref()),
        received_at,
    })
}
