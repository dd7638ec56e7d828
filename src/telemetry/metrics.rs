//! Prometheus metrics

use crate::feed::Symbol;
use crate::stats::MetricsRecord;
use std::net::SocketAddr;

/// Counter metric types
#[derive(Debug, Clone, Copy)]
pub enum CounterMetric {
    /// Ticks applied to a snapshot
    TicksReceived,
    /// Payloads dropped as unparseable
    MalformedMessages,
    /// Transport connect or stream failures
    TransportErrors,
}

/// Gauge metric types
#[derive(Debug, Clone, Copy)]
pub enum GaugeMetric {
    /// Price change over the window
    PriceChangePct,
    /// Volatility over the window
    VolatilityPct,
    /// Bid/ask spread
    SpreadPct,
    /// 24h volume in quote currency
    VolumeQuote,
    /// 1 when every feed is open
    FullyConnected,
}

impl CounterMetric {
    fn name(self) -> &'static str {
        match self {
            CounterMetric::TicksReceived => "tickerdash_ticks_received_total",
            CounterMetric::MalformedMessages => "tickerdash_malformed_messages_total",
            CounterMetric::TransportErrors => "tickerdash_transport_errors_total",
        }
    }
}

impl GaugeMetric {
    fn name(self) -> &'static str {
        match self {
            GaugeMetric::PriceChangePct => "tickerdash_price_change_pct",
            GaugeMetric::VolatilityPct => "tickerdash_volatility_pct",
            GaugeMetric::SpreadPct => "tickerdash_spread_pct",
            GaugeMetric::VolumeQuote => "tickerdash_volume_quote",
            GaugeMetric::FullyConnected => "tickerdash_fully_connected",
        }
    }
}

/// Increment a per-symbol counter
pub fn increment_counter(metric: CounterMetric, symbol: &Symbol) {
    ::metrics::counter!(metric.name(), "symbol" => symbol.to_string()).increment(1);
}

/// Set a gauge value, optionally labelled by symbol
pub fn set_gauge(metric: GaugeMetric, symbol: Option<&Symbol>, value: f64) {
    match symbol {
        Some(symbol) => ::metrics::gauge!(metric.name(), "symbol" => symbol.to_string()).set(value),
        None => ::metrics::gauge!(metric.name()).set(value),
    }
}

/// Publish one symbol's freshly computed metrics
pub fn record_metrics(symbol: &Symbol, record: &MetricsRecord) {
    set_gauge(GaugeMetric::PriceChangePct, Some(symbol), record.price_change_pct);
    set_gauge(GaugeMetric::VolatilityPct, Some(symbol), record.volatility_pct);
    set_gauge(GaugeMetric::SpreadPct, Some(symbol), record.spread_pct);
    set_gauge(GaugeMetric::VolumeQuote, Some(symbol), record.volume_quote);
}

/// Serve Prometheus metrics on `0.0.0.0:port`
///
/// Must be called from within a tokio runtime.
pub fn init_metrics_exporter(port: u16) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| anyhow::anyhow!("Failed to start metrics exporter: {}", e))?;

    tracing::info!(%addr, "Prometheus exporter listening");
    Ok(())
}
