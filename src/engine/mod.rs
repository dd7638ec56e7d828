//! Market data engine
//!
//! Opens one feed per tracked symbol and runs a single event loop that owns
//! all per-symbol state. The loop multiplexes feed events with a fixed-cadence
//! metrics recompute and publishes a `MarketBoard` after every change.

mod board;
mod state;

pub use board::{Connectivity, MarketBoard, MarketView};
pub use state::EngineCore;

use crate::config::{Config, EngineConfig};
use crate::feed::{
    ConnectionState, EndpointResolver, FeedConnection, FeedUpdate, Snapshot, Symbol,
};
use crate::stats::MetricsRecord;
use crate::ws::{Transport, WsMessage, WsSession, WsTransport};
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

/// Capacity of the channel merging all feeds into the loop
const EVENT_BUFFER: usize = 4096;

/// Engine lifecycle errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("No symbols to track")]
    NoSymbols,
    #[error("Duplicate symbol: {0}")]
    DuplicateSymbol(Symbol),
    #[error("Engine already started")]
    AlreadyStarted,
    #[error("Engine has been stopped")]
    Stopped,
}

/// A transport event tagged with the symbol it belongs to
#[derive(Debug)]
struct FeedEvent {
    symbol: Symbol,
    message: WsMessage,
}

enum Phase {
    /// Not started; holds the publisher the loop will take over
    Idle(watch::Sender<MarketBoard>),
    Running(RunningEngine),
    Stopped,
}

/// Tasks spawned by `start`
struct RunningEngine {
    stop_tx: Option<oneshot::Sender<()>>,
    event_loop: Option<JoinHandle<()>>,
    pumps: Vec<JoinHandle<()>>,
}

impl RunningEngine {
    async fn shutdown(&mut self) {
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }
        if let Some(event_loop) = self.event_loop.take() {
            if let Err(e) = event_loop.await {
                tracing::warn!(error = %e, "Engine loop ended abnormally");
            }
        }
        for pump in &self.pumps {
            pump.abort();
        }
    }
}

impl Drop for RunningEngine {
    fn drop(&mut self) {
        // The loop closes every feed once it sees the stop signal
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }
        for pump in &self.pumps {
            pump.abort();
        }
    }
}

/// Streaming market data engine for a fixed set of symbols
pub struct MarketDataEngine {
    symbols: Vec<Symbol>,
    config: EngineConfig,
    transport: Arc<dyn Transport>,
    resolver: Arc<dyn EndpointResolver>,
    view: MarketView,
    phase: Phase,
}

impl MarketDataEngine {
    /// Create an engine; nothing connects until `start`
    pub fn new(
        symbols: Vec<Symbol>,
        config: EngineConfig,
        transport: Arc<dyn Transport>,
        resolver: Arc<dyn EndpointResolver>,
    ) -> Result<Self, EngineError> {
        if symbols.is_empty() {
            return Err(EngineError::NoSymbols);
        }
        let mut seen = HashSet::new();
        for symbol in &symbols {
            if !seen.insert(symbol) {
                return Err(EngineError::DuplicateSymbol(symbol.clone()));
            }
        }

        let (board_tx, board_rx) = watch::channel(MarketBoard {
            symbols: symbols.clone(),
            ..MarketBoard::default()
        });

        Ok(Self {
            symbols,
            config,
            transport,
            resolver,
            view: MarketView::new(board_rx),
            phase: Phase::Idle(board_tx),
        })
    }

    /// Engine streaming from the configured WebSocket endpoint
    pub fn from_config(config: &Config) -> Result<Self, EngineError> {
        Self::new(
            config.feed.symbols.clone(),
            config.engine.clone(),
            Arc::new(WsTransport::new(config.feed.ws_config())),
            Arc::new(config.feed.endpoint()),
        )
    }

    /// Open every feed and start the recompute timer
    pub async fn start(&mut self) -> Result<(), EngineError> {
        let board_tx = match std::mem::replace(&mut self.phase, Phase::Stopped) {
            Phase::Idle(board_tx) => board_tx,
            Phase::Running(running) => {
                self.phase = Phase::Running(running);
                return Err(EngineError::AlreadyStarted);
            }
            Phase::Stopped => return Err(EngineError::Stopped),
        };

        let (event_tx, event_rx) = mpsc::channel(EVENT_BUFFER);
        let mut connections = Vec::with_capacity(self.symbols.len());
        let mut pumps = Vec::with_capacity(self.symbols.len());

        for symbol in &self.symbols {
            let url = self.resolver.resolve(symbol);
            tracing::info!(symbol = %symbol, url = %url, "Opening feed");

            let WsSession { events, handle } = self.transport.open(&url).await;
            connections.push(FeedConnection::new(
                symbol.clone(),
                self.config.horizon(),
                Some(handle),
            ));
            pumps.push(tokio::spawn(forward_events(
                symbol.clone(),
                events,
                event_tx.clone(),
            )));
        }
        drop(event_tx);

        let core = EngineCore::new(connections);
        board_tx.send_replace(core.board());

        let (stop_tx, stop_rx) = oneshot::channel();
        let event_loop = tokio::spawn(run_event_loop(
            core,
            event_rx,
            stop_rx,
            board_tx,
            self.config.recompute_interval(),
        ));

        tracing::info!(
            symbols = self.symbols.len(),
            interval_ms = self.config.recompute_interval_ms,
            window_secs = self.config.window_secs,
            "Market data engine started"
        );

        self.phase = Phase::Running(RunningEngine {
            stop_tx: Some(stop_tx),
            event_loop: Some(event_loop),
            pumps,
        });
        Ok(())
    }

    /// Cancel the timer and close every feed; safe to call repeatedly
    pub async fn stop(&mut self) {
        if let Phase::Running(mut running) = std::mem::replace(&mut self.phase, Phase::Stopped) {
            running.shutdown().await;
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self.phase, Phase::Running(_))
    }

    /// Read handle for views; stays valid after the engine is dropped
    pub fn view(&self) -> MarketView {
        self.view.clone()
    }

    pub fn tracked_symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    pub fn snapshot(&self, symbol: &Symbol) -> Option<Snapshot> {
        self.view.snapshot(symbol)
    }

    pub fn metrics(&self, symbol: &Symbol) -> Option<MetricsRecord> {
        self.view.metrics(symbol)
    }

    pub fn connection_state(&self, symbol: &Symbol) -> Option<ConnectionState> {
        self.view.connection_state(symbol)
    }

    pub fn connectivity(&self) -> Connectivity {
        self.view.connectivity()
    }

    pub fn computed_at(&self) -> Option<DateTime<Utc>> {
        self.view.computed_at()
    }

    pub fn board(&self) -> MarketBoard {
        self.view.board()
    }
}

/// Forward one transport's events into the engine loop, preserving order
async fn forward_events(
    symbol: Symbol,
    mut events: mpsc::Receiver<WsMessage>,
    tx: mpsc::Sender<FeedEvent>,
) {
    let mut terminated = false;
    while let Some(message) = events.recv().await {
        terminated = matches!(message, WsMessage::Disconnected);
        let event = FeedEvent {
            symbol: symbol.clone(),
            message,
        };
        if tx.send(event).await.is_err() {
            return;
        }
    }

    // A transport that dies without reporting it still leaves the feed closed
    if !terminated {
        tracing::warn!(symbol = %symbol, "Feed event stream ended without disconnect");
        let _ = tx
            .send(FeedEvent {
                symbol: symbol.clone(),
                message: WsMessage::Disconnected,
            })
            .await;
    }
    tracing::debug!(symbol = %symbol, "Feed event stream ended");
}

async fn run_event_loop(
    mut core: EngineCore,
    mut events: mpsc::Receiver<FeedEvent>,
    mut stop_rx: oneshot::Receiver<()>,
    board: watch::Sender<MarketBoard>,
    period: Duration,
) {
    let mut recompute = tokio::time::interval_at(Instant::now() + period, period);
    recompute.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = &mut stop_rx => break,

            Some(event) = events.recv() => {
                let update = core.handle(&event.symbol, event.message, Utc::now());
                if matches!(update, FeedUpdate::State(_) | FeedUpdate::Failed(_) | FeedUpdate::Tick) {
                    board.send_replace(core.board());
                }
            }

            _ = recompute.tick() => {
                let published = core.recompute(Utc::now());
                tracing::debug!(symbols = published, "Metrics recomputed");
                board.send_replace(core.board());
            }
        }
    }

    core.shutdown();
    board.send_replace(core.board());
    tracing::info!("Market data engine stopped");
}
