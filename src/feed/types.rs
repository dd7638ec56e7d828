//! Feed data model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Identifier of a tracked trading pair, e.g. "BTCUSDT"
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Symbol(String);

impl Symbol {
    /// Create a symbol; identifiers are stored uppercase
    pub fn new(symbol: impl AsRef<str>) -> Self {
        Self(symbol.as_ref().trim().to_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Lowercase form used in stream names
    pub fn to_lowercase(&self) -> String {
        self.0.to_lowercase()
    }

    /// Base asset, with the quote asset suffix removed when present
    pub fn base_asset(&self, quote: &str) -> &str {
        match self.0.strip_suffix(quote) {
            Some(base) if !base.is_empty() => base,
            _ => &self.0,
        }
    }

    /// Human-readable pair, e.g. "BTC/USDT"
    pub fn pair_label(&self, quote: &str) -> String {
        let base = self.base_asset(quote);
        if base.len() == self.0.len() {
            self.0.clone()
        } else {
            format!("{}/{}", base, quote)
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for Symbol {
    fn from(symbol: String) -> Self {
        Self::new(symbol)
    }
}

impl From<&str> for Symbol {
    fn from(symbol: &str) -> Self {
        Self::new(symbol)
    }
}

impl From<Symbol> for String {
    fn from(symbol: Symbol) -> Self {
        symbol.0
    }
}

/// One normalized inbound market update
///
/// Only the price is mandatory; any other field the upstream message lacks
/// (or carries in an unreadable form) is `None` and leaves the snapshot's
/// previous value in place.
#[derive(Debug, Clone, PartialEq)]
pub struct Tick {
    pub price: f64,
    pub bid_price: Option<f64>,
    pub ask_price: Option<f64>,
    /// 24h volume in base units
    pub volume: Option<f64>,
    pub high_24h: Option<f64>,
    pub low_24h: Option<f64>,
    /// 24h change as reported upstream
    pub price_change_percent_24h: Option<f64>,
    /// Local receipt time
    pub received_at: DateTime<Utc>,
}

/// Latest known values for a symbol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub symbol: Symbol,
    pub price: f64,
    pub bid_price: f64,
    pub ask_price: f64,
    pub volume: f64,
    pub high_24h: f64,
    pub low_24h: f64,
    pub price_change_percent_24h: f64,
    pub last_update: DateTime<Utc>,
}

impl Snapshot {
    /// First snapshot for a symbol; fields the tick lacks start at zero
    pub fn from_tick(symbol: Symbol, tick: &Tick) -> Self {
        let mut snapshot = Self {
            symbol,
            price: 0.0,
            bid_price: 0.0,
            ask_price: 0.0,
            volume: 0.0,
            high_24h: 0.0,
            low_24h: 0.0,
            price_change_percent_24h: 0.0,
            last_update: tick.received_at,
        };
        snapshot.apply(tick);
        snapshot
    }

    /// Fold a tick in, keeping prior values for fields the tick lacks
    pub fn apply(&mut self, tick: &Tick) {
        self.price = tick.price;
        if let Some(bid) = tick.bid_price {
            self.bid_price = bid;
        }
        if let Some(ask) = tick.ask_price {
            self.ask_price = ask;
        }
        if let Some(volume) = tick.volume {
            self.volume = volume;
        }
        if let Some(high) = tick.high_24h {
            self.high_24h = high;
        }
        if let Some(low) = tick.low_24h {
            self.low_24h = low;
        }
        if let Some(change) = tick.price_change_percent_24h {
            self.price_change_percent_24h = change;
        }
        self.last_update = tick.received_at;
    }
}

/// Lifecycle state of one symbol's connection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "reason", rename_all = "lowercase")]
pub enum ConnectionState {
    Connecting,
    Open,
    Closed,
    Errored(String),
}

impl ConnectionState {
    /// Whether the state machine allows moving from `self` to `next`
    ///
    /// Moving back to `Connecting` only happens when the transport announces
    /// a reconnect attempt.
    pub fn can_transition_to(&self, next: &ConnectionState) -> bool {
        use ConnectionState::*;
        matches!(
            (self, next),
            (Connecting, Open)
                | (Connecting, Errored(_))
                | (Connecting, Closed)
                | (Open, Errored(_))
                | (Open, Closed)
                | (Errored(_), Closed)
                | (Errored(_), Connecting)
                | (Closed, Connecting)
        )
    }

    pub fn is_open(&self) -> bool {
        matches!(self, ConnectionState::Open)
    }

    /// Short label for display
    pub fn label(&self) -> &'static str {
        match self {
            ConnectionState::Connecting => "connecting",
            ConnectionState::Open => "open",
            ConnectionState::Closed => "closed",
            ConnectionState::Errored(_) => "errored",
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionState::Errored(reason) => write!(f, "errored ({})", reason),
            other => f.write_str(other.label()),
        }
    }
}

/// Symbol-scoped feed errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FeedError {
    /// The connection could not be established
    #[error("Connection error for {symbol}: {reason}")]
    TransportConnect { symbol: Symbol, reason: String },
    /// An established connection failed
    #[error("Stream error for {symbol}: {reason}")]
    TransportRuntime { symbol: Symbol, reason: String },
    /// An inbound payload could not be parsed; the connection stays up
    #[error("Malformed message for {symbol}: {reason}")]
    MalformedMessage { symbol: Symbol, reason: String },
}

impl FeedError {
    pub fn symbol(&self) -> &Symbol {
        match self {
            FeedError::TransportConnect { symbol, .. }
            | FeedError::TransportRuntime { symbol, .. }
            | FeedError::MalformedMessage { symbol, .. } => symbol,
        }
    }
}
