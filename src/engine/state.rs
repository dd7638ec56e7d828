//! Engine state
//!
//! Owns every symbol's connection and the metrics table. Driven by the engine
//! loop one event at a time, so handlers and recomputes never overlap.

use super::board::{Connectivity, MarketBoard};
use crate::feed::{FeedConnection, FeedUpdate, Symbol};
use crate::stats::MetricsRecord;
use crate::telemetry::{self, CounterMetric, GaugeMetric};
use crate::ws::WsMessage;
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// All per-symbol state plus the published metrics table
pub struct EngineCore {
    /// Connections in configuration order
    connections: Vec<FeedConnection>,
    index: HashMap<Symbol, usize>,
    metrics: HashMap<Symbol, MetricsRecord>,
    computed_at: Option<DateTime<Utc>>,
    last_error: Option<String>,
}

impl EngineCore {
    pub fn new(connections: Vec<FeedConnection>) -> Self {
        let index = connections
            .iter()
            .enumerate()
            .map(|(i, conn)| (conn.symbol().clone(), i))
            .collect();
        Self {
            connections,
            index,
            metrics: HashMap::new(),
            computed_at: None,
            last_error: None,
        }
    }

    pub fn connection(&self, symbol: &Symbol) -> Option<&FeedConnection> {
        self.index.get(symbol).map(|&i| &self.connections[i])
    }

    /// Route a transport event to its symbol's connection
    pub fn handle(&mut self, symbol: &Symbol, message: WsMessage, now: DateTime<Utc>) -> FeedUpdate {
        let Some(&i) = self.index.get(symbol) else {
            tracing::warn!(symbol = %symbol, "Event for untracked symbol");
            return FeedUpdate::Ignored;
        };

        let update = self.connections[i].apply(message, now);
        match &update {
            FeedUpdate::Tick => {
                telemetry::increment_counter(CounterMetric::TicksReceived, symbol);
            }
            FeedUpdate::Dropped(_) => {
                telemetry::increment_counter(CounterMetric::MalformedMessages, symbol);
            }
            FeedUpdate::Failed(error) => {
                telemetry::increment_counter(CounterMetric::TransportErrors, symbol);
                self.last_error = Some(error.to_string());
                self.refresh_connectivity();
            }
            FeedUpdate::State(_) => self.refresh_connectivity(),
            FeedUpdate::Ignored => {}
        }
        update
    }

    pub fn is_fully_connected(&self) -> bool {
        self.connections.iter().all(|conn| conn.state().is_open())
    }

    pub fn connectivity(&self) -> Connectivity {
        Connectivity {
            is_fully_connected: self.is_fully_connected(),
            last_error: self.last_error.clone(),
        }
    }

    fn refresh_connectivity(&mut self) {
        let connected = self.is_fully_connected();
        if connected && self.last_error.take().is_some() {
            tracing::info!("All feeds open, clearing last error");
        }
        telemetry::set_gauge(
            GaugeMetric::FullyConnected,
            None,
            if connected { 1.0 } else { 0.0 },
        );
    }

    /// Recompute the metrics table from current snapshots and windows
    ///
    /// Symbols without a priced snapshot are left out. An empty table is not
    /// published and the previous one stays in place. Returns the number of
    /// records published.
    pub fn recompute(&mut self, now: DateTime<Utc>) -> usize {
        let table: HashMap<Symbol, MetricsRecord> = self
            .connections
            .iter()
            .filter_map(|conn| {
                let snapshot = conn.snapshot().filter(|s| s.price != 0.0)?;
                Some((
                    conn.symbol().clone(),
                    MetricsRecord::compute(snapshot, conn.window()),
                ))
            })
            .collect();

        if table.is_empty() {
            return 0;
        }

        for (symbol, record) in &table {
            telemetry::record_metrics(symbol, record);
        }

        let published = table.len();
        self.metrics = table;
        self.computed_at = Some(now);
        published
    }

    pub fn metrics(&self, symbol: &Symbol) -> Option<&MetricsRecord> {
        self.metrics.get(symbol)
    }

    /// Close every connection
    pub fn shutdown(&mut self) {
        for conn in &mut self.connections {
            conn.shutdown();
        }
        self.refresh_connectivity();
    }

    /// Snapshot of the state for publication
    pub fn board(&self) -> MarketBoard {
        MarketBoard {
            symbols: self.connections.iter().map(|c| c.symbol().clone()).collect(),
            snapshots: self
                .connections
                .iter()
                .filter_map(|c| Some((c.symbol().clone(), c.snapshot()?.clone())))
                .collect(),
            states: self
                .connections
                .iter()
                .map(|c| (c.symbol().clone(), c.state().clone()))
                .collect(),
            metrics: self.metrics.clone(),
            computed_at: self.computed_at,
            connectivity: self.connectivity(),
        }
    }
}
