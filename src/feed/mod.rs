//! Market data feed module
//!
//! Streaming ticker connections, one per tracked symbol

mod binance;
mod connection;
mod endpoint;
mod types;

pub use binance::{parse_ticker, TickParseError, BINANCE_TICKER_TEMPLATE};
pub use connection::{FeedConnection, FeedUpdate};
pub use endpoint::{EndpointResolver, EndpointTemplate};
pub use types::{ConnectionState, FeedError, Snapshot, Symbol, Tick};
