//! Per-symbol feed connection
//!
//! Explicit state machine over transport lifecycle events. The connection is
//! the only writer of its symbol's snapshot and price window.

use super::binance::parse_ticker;
use super::{ConnectionState, FeedError, Snapshot, Symbol, Tick};
use crate::stats::PriceWindow;
use crate::ws::{CloseHandle, WsError, WsMessage};
use chrono::{DateTime, Duration, Utc};

/// Effect of applying one transport event
#[derive(Debug, Clone, PartialEq)]
pub enum FeedUpdate {
    /// Lifecycle transition taken
    State(ConnectionState),
    /// Transport failure; the connection is now `Errored`
    Failed(FeedError),
    /// Tick folded into the snapshot and window
    Tick,
    /// Payload rejected; the connection state is unchanged
    Dropped(FeedError),
    /// Nothing changed
    Ignored,
}

/// One symbol's streaming connection and the state it owns
#[derive(Debug)]
pub struct FeedConnection {
    symbol: Symbol,
    state: ConnectionState,
    snapshot: Option<Snapshot>,
    window: PriceWindow,
    handle: Option<CloseHandle>,
}

impl FeedConnection {
    /// A connection that has started connecting through `handle`'s transport
    pub fn new(symbol: Symbol, horizon: Duration, handle: Option<CloseHandle>) -> Self {
        Self {
            symbol,
            state: ConnectionState::Connecting,
            snapshot: None,
            window: PriceWindow::new(horizon),
            handle,
        }
    }

    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    pub fn state(&self) -> &ConnectionState {
        &self.state
    }

    pub fn snapshot(&self) -> Option<&Snapshot> {
        self.snapshot.as_ref()
    }

    pub fn window(&self) -> &PriceWindow {
        &self.window
    }

    /// Apply one transport event received at `now`
    pub fn apply(&mut self, message: WsMessage, now: DateTime<Utc>) -> FeedUpdate {
        match message {
            WsMessage::Connected => self.transition(ConnectionState::Open),
            WsMessage::Text(text) => self.on_text(&text, now),
            WsMessage::Binary(_) => FeedUpdate::Ignored,
            WsMessage::Error(error) => self.on_error(error),
            WsMessage::Reconnecting { attempt } => {
                tracing::info!(symbol = %self.symbol, attempt, "Feed reconnecting");
                self.transition(ConnectionState::Connecting)
            }
            WsMessage::Disconnected => self.transition(ConnectionState::Closed),
        }
    }

    fn transition(&mut self, next: ConnectionState) -> FeedUpdate {
        if !self.state.can_transition_to(&next) {
            tracing::debug!(
                symbol = %self.symbol,
                from = %self.state,
                to = %next,
                "Ignoring invalid feed transition"
            );
            return FeedUpdate::Ignored;
        }

        tracing::info!(symbol = %self.symbol, from = %self.state, to = %next, "Feed state changed");
        self.state = next.clone();
        FeedUpdate::State(next)
    }

    fn on_error(&mut self, error: WsError) -> FeedUpdate {
        let reason = error.to_string();
        let failure = match self.state {
            ConnectionState::Connecting => FeedError::TransportConnect {
                symbol: self.symbol.clone(),
                reason: reason.clone(),
            },
            _ => FeedError::TransportRuntime {
                symbol: self.symbol.clone(),
                reason: reason.clone(),
            },
        };

        match self.transition(ConnectionState::Errored(reason)) {
            FeedUpdate::State(_) => {
                tracing::warn!(symbol = %self.symbol, error = %failure, "Feed connection errored");
                FeedUpdate::Failed(failure)
            }
            other => other,
        }
    }

    fn on_text(&mut self, text: &str, now: DateTime<Utc>) -> FeedUpdate {
        if !self.state.is_open() {
            tracing::debug!(symbol = %self.symbol, state = %self.state, "Message outside open state");
            return FeedUpdate::Ignored;
        }

        match parse_ticker(text, now) {
            Ok(tick) => {
                self.apply_tick(tick);
                FeedUpdate::Tick
            }
            Err(e) => {
                tracing::warn!(symbol = %self.symbol, error = %e, "Dropping malformed message");
                FeedUpdate::Dropped(FeedError::MalformedMessage {
                    symbol: self.symbol.clone(),
                    reason: e.to_string(),
                })
            }
        }
    }

    /// Fold a tick into the snapshot and append its price to the window
    pub fn apply_tick(&mut self, tick: Tick) {
        match self.snapshot.as_mut() {
            Some(snapshot) => snapshot.apply(&tick),
            None => self.snapshot = Some(Snapshot::from_tick(self.symbol.clone(), &tick)),
        }
        self.window.append(tick.price, tick.received_at);
    }

    /// Close the transport and rest in `Closed`; safe to call repeatedly
    pub fn shutdown(&mut self) {
        if let Some(handle) = self.handle.take() {
            tracing::debug!(symbol = %self.symbol, "Closing feed transport");
            handle.close();
        }
        if self.state != ConnectionState::Closed {
            self.state = ConnectionState::Closed;
        }
    }
}
