//! Published read model
//!
//! The engine loop is the only writer; views read the latest board at any time.

use crate::feed::{ConnectionState, Snapshot, Symbol};
use crate::stats::MetricsRecord;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use tokio::sync::watch;

/// Aggregate connection health
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Connectivity {
    /// True only while every tracked symbol's connection is open
    pub is_fully_connected: bool,
    /// Most recently surfaced transport error
    pub last_error: Option<String>,
}

/// Everything a view needs to render, replaced as one unit
#[derive(Debug, Clone, Default, Serialize)]
pub struct MarketBoard {
    /// Tracked symbols in configuration order
    pub symbols: Vec<Symbol>,
    pub snapshots: HashMap<Symbol, Snapshot>,
    pub states: HashMap<Symbol, ConnectionState>,
    /// Metrics table from the last recompute
    pub metrics: HashMap<Symbol, MetricsRecord>,
    /// When the metrics table was computed
    pub computed_at: Option<DateTime<Utc>>,
    pub connectivity: Connectivity,
}

/// Cloneable read handle onto the engine's published board
#[derive(Debug, Clone)]
pub struct MarketView {
    rx: watch::Receiver<MarketBoard>,
}

impl MarketView {
    pub(crate) fn new(rx: watch::Receiver<MarketBoard>) -> Self {
        Self { rx }
    }

    pub fn tracked_symbols(&self) -> Vec<Symbol> {
        self.rx.borrow().symbols.clone()
    }

    pub fn snapshot(&self, symbol: &Symbol) -> Option<Snapshot> {
        self.rx.borrow().snapshots.get(symbol).cloned()
    }

    pub fn metrics(&self, symbol: &Symbol) -> Option<MetricsRecord> {
        self.rx.borrow().metrics.get(symbol).copied()
    }

    pub fn connection_state(&self, symbol: &Symbol) -> Option<ConnectionState> {
        self.rx.borrow().states.get(symbol).cloned()
    }

    pub fn connectivity(&self) -> Connectivity {
        self.rx.borrow().connectivity.clone()
    }

    pub fn computed_at(&self) -> Option<DateTime<Utc>> {
        self.rx.borrow().computed_at
    }

    /// Copy of the whole board
    pub fn board(&self) -> MarketBoard {
        self.rx.borrow().clone()
    }

    /// Wait for the next publish
    ///
    /// Returns false once the engine has shut down and nothing more will be
    /// published. The last board stays readable.
    pub async fn changed(&mut self) -> bool {
        self.rx.changed().await.is_ok()
    }

    /// Copy of the board, marking it as seen for `changed`
    pub fn board_and_update(&mut self) -> MarketBoard {
        self.rx.borrow_and_update().clone()
    }
}
