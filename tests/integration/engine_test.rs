//! Integration tests for the market data engine

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use ticker_dash::config::EngineConfig;
use ticker_dash::engine::MarketDataEngine;
use ticker_dash::feed::{ConnectionState, EndpointTemplate, Symbol};
use ticker_dash::ws::{Transport, WsError, WsMessage, WsSession};
use tokio::sync::{mpsc, watch};

type Remote = (mpsc::Sender<WsMessage>, watch::Receiver<bool>);

/// Transport whose sessions are driven by the test
#[derive(Default)]
struct ScriptedTransport {
    sessions: Mutex<HashMap<String, Remote>>,
}

impl ScriptedTransport {
    fn remote(&self, symbol: &str) -> Remote {
        let url = format!("test://{}", symbol.to_lowercase());
        self.sessions.lock().unwrap().get(&url).cloned().unwrap()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn open(&self, url: &str) -> WsSession {
        let (session, tx, closed) = WsSession::channel(64);
        self.sessions
            .lock()
            .unwrap()
            .insert(url.to_string(), (tx, closed));
        session
    }
}

fn start_engine(symbols: &[&str]) -> (MarketDataEngine, Arc<ScriptedTransport>) {
    let transport = Arc::new(ScriptedTransport::default());
    let engine = MarketDataEngine::new(
        symbols.iter().map(Symbol::new).collect(),
        EngineConfig::default(),
        transport.clone(),
        Arc::new(EndpointTemplate::new("test://{symbol}")),
    )
    .unwrap();
    (engine, transport)
}

fn ticker(price: f64, bid: f64, ask: f64, volume: f64) -> WsMessage {
    WsMessage::Text(format!(
        r#"{{"e":"24hrTicker","c":"{price}","b":"{bid}","a":"{ask}","v":"{volume}","h":"0","l":"0","P":"0"}}"#
    ))
}

async fn settle() {
    tokio::time::sleep(Duration::from_millis(10)).await;
}

#[tokio::test(start_paused = true)]
async fn test_metrics_for_two_symbols() {
    let (mut engine, transport) = start_engine(&["AAAUSDT", "BBBUSDT"]);
    let a = Symbol::new("AAAUSDT");
    let b = Symbol::new("BBBUSDT");
    engine.start().await.unwrap();

    let (a_tx, _) = transport.remote("AAAUSDT");
    let (b_tx, _) = transport.remote("BBBUSDT");
    a_tx.send(WsMessage::Connected).await.unwrap();
    b_tx.send(WsMessage::Connected).await.unwrap();

    for price in [100.0, 110.0, 99.0] {
        a_tx.send(ticker(price, price - 1.0, price, 10.0)).await.unwrap();
    }
    b_tx.send(ticker(50.0, 49.0, 50.0, 200.0)).await.unwrap();
    settle().await;

    assert!(engine.connectivity().is_fully_connected);
    assert!(engine.metrics(&a).is_none());

    tokio::time::sleep(Duration::from_secs(2)).await;
    settle().await;

    let a_metrics = engine.metrics(&a).unwrap();
    // 100 -> 99 over the window
    assert!((a_metrics.price_change_pct + 1.0).abs() < 1e-9);
    // returns +10% and -10%
    assert!((a_metrics.volatility_pct - 10.0).abs() < 1e-9);
    assert!((a_metrics.spread_pct - 100.0 / 99.0).abs() < 1e-9);
    assert!((a_metrics.volume_quote - 990.0).abs() < 1e-9);

    let b_metrics = engine.metrics(&b).unwrap();
    assert_eq!(b_metrics.price_change_pct, 0.0);
    assert_eq!(b_metrics.volatility_pct, 0.0);
    assert!((b_metrics.spread_pct - 2.0).abs() < 1e-9);
    assert!((b_metrics.units_per_100_quote - 2.0).abs() < 1e-9);
    assert!((b_metrics.volume_quote - 10_000.0).abs() < 1e-9);

    engine.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_connectivity_follows_every_connection() {
    let (mut engine, transport) = start_engine(&["AAAUSDT", "BBBUSDT"]);
    engine.start().await.unwrap();
    let view = engine.view();

    let (a_tx, _) = transport.remote("AAAUSDT");
    let (b_tx, _) = transport.remote("BBBUSDT");

    a_tx.send(WsMessage::Connected).await.unwrap();
    settle().await;
    assert!(!view.connectivity().is_fully_connected);

    b_tx.send(WsMessage::Connected).await.unwrap();
    b_tx.send(ticker(50.0, 49.0, 50.0, 1.0)).await.unwrap();
    settle().await;
    assert!(view.connectivity().is_fully_connected);
    assert!(view.connectivity().last_error.is_none());

    b_tx.send(WsMessage::Error(WsError::StreamFailed("reset".to_string())))
        .await
        .unwrap();
    settle().await;
    let connectivity = view.connectivity();
    assert!(!connectivity.is_fully_connected);
    assert!(connectivity.last_error.unwrap().contains("BBBUSDT"));
    assert!(matches!(
        view.connection_state(&Symbol::new("BBBUSDT")),
        Some(ConnectionState::Errored(_))
    ));

    // The failed symbol keeps serving its last known values
    assert_eq!(view.snapshot(&Symbol::new("BBBUSDT")).unwrap().price, 50.0);

    engine.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_view_outlives_engine() {
    let (mut engine, transport) = start_engine(&["AAAUSDT"]);
    let a = Symbol::new("AAAUSDT");
    engine.start().await.unwrap();

    let (a_tx, closed) = transport.remote("AAAUSDT");
    a_tx.send(WsMessage::Connected).await.unwrap();
    a_tx.send(ticker(20.0, 19.0, 20.0, 5.0)).await.unwrap();
    tokio::time::sleep(Duration::from_secs(2)).await;
    settle().await;

    let view = engine.view();
    engine.stop().await;
    drop(engine);

    assert!(*closed.borrow());
    assert_eq!(view.snapshot(&a).unwrap().price, 20.0);
    assert!(view.metrics(&a).is_some());
    assert_eq!(view.connection_state(&a), Some(ConnectionState::Closed));
    assert!(!view.connectivity().is_fully_connected);
}
