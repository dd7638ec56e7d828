//! Integration tests for the feed module

use chrono::{Duration, Utc};
use ticker_dash::feed::{
    parse_ticker, ConnectionState, EndpointResolver, EndpointTemplate, FeedConnection, FeedUpdate,
    Symbol, BINANCE_TICKER_TEMPLATE,
};
use ticker_dash::ws::{WsError, WsMessage};

const TICKER: &str = r#"{
    "e": "24hrTicker", "E": 1700000000000, "s": "SOLUSDT",
    "P": "-2.10", "c": "98.50", "b": "98.49", "a": "98.51",
    "v": "120000.5", "h": "102.00", "l": "97.00"
}"#;

#[test]
fn test_binance_endpoint_for_symbol() {
    let endpoint = EndpointTemplate::new(BINANCE_TICKER_TEMPLATE);
    assert_eq!(
        endpoint.resolve(&Symbol::new("SOLUSDT")),
        "wss://stream.binance.com/ws/solusdt@ticker"
    );
}

#[test]
fn test_parse_full_ticker() {
    let tick = parse_ticker(TICKER, Utc::now()).unwrap();
    assert_eq!(tick.price, 98.50);
    assert_eq!(tick.bid_price, Some(98.49));
    assert_eq!(tick.ask_price, Some(98.51));
    assert_eq!(tick.volume, Some(120000.5));
}

#[test]
fn test_connection_lifecycle() {
    let now = Utc::now();
    let mut feed = FeedConnection::new(Symbol::new("SOLUSDT"), Duration::minutes(5), None);
    assert_eq!(feed.state(), &ConnectionState::Connecting);

    // Data before the connection opens is not applied
    assert_eq!(feed.apply(WsMessage::Text(TICKER.to_string()), now), FeedUpdate::Ignored);
    assert!(feed.snapshot().is_none());

    assert_eq!(
        feed.apply(WsMessage::Connected, now),
        FeedUpdate::State(ConnectionState::Open)
    );
    assert_eq!(feed.apply(WsMessage::Text(TICKER.to_string()), now), FeedUpdate::Tick);
    assert_eq!(feed.snapshot().unwrap().price, 98.50);
    assert_eq!(feed.window().len(), 1);

    let update = feed.apply(
        WsMessage::Error(WsError::StreamFailed("reset by peer".to_string())),
        now,
    );
    assert!(matches!(update, FeedUpdate::Failed(_)));
    assert!(matches!(feed.state(), ConnectionState::Errored(_)));

    feed.shutdown();
    assert_eq!(feed.state(), &ConnectionState::Closed);
}

#[test]
fn test_malformed_message_keeps_connection_open() {
    let now = Utc::now();
    let mut feed = FeedConnection::new(Symbol::new("BTCUSDT"), Duration::minutes(5), None);
    feed.apply(WsMessage::Connected, now);

    let update = feed.apply(WsMessage::Text("not json".to_string()), now);
    assert!(matches!(update, FeedUpdate::Dropped(_)));
    assert!(feed.state().is_open());
    assert!(feed.snapshot().is_none());
}

#[test]
fn test_zero_price_tick_never_reaches_window() {
    let now = Utc::now();
    let mut feed = FeedConnection::new(Symbol::new("BTCUSDT"), Duration::minutes(5), None);
    feed.apply(WsMessage::Connected, now);

    let zero = r#"{"e":"24hrTicker","c":"0","b":"0","a":"0"}"#;
    let update = feed.apply(WsMessage::Text(zero.to_string()), now);
    assert!(matches!(update, FeedUpdate::Dropped(_)));
    assert!(feed.window().is_empty());
    assert!(feed.state().is_open());
}
