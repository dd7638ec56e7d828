//! Rolling statistics module
//!
//! Price windows and the metrics derived from them

mod format;
mod math;
mod window;

pub use format::{format_magnitude, format_number};
pub use math::{price_change, spread, units_per_100_quote, volatility, volume_in_quote};
pub use window::{PriceSample, PriceWindow};

use crate::feed::Snapshot;
use serde::{Deserialize, Serialize};

/// Metrics derived for one symbol at one recompute cycle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricsRecord {
    /// Price change over the retained window (percent)
    pub price_change_pct: f64,
    /// Standard deviation of returns over the retained window (percent)
    pub volatility_pct: f64,
    /// Bid/ask spread relative to the ask (percent)
    pub spread_pct: f64,
    /// Base currency obtained for 100 units of quote currency
    pub units_per_100_quote: f64,
    /// 24h volume in quote currency
    pub volume_quote: f64,
}

impl MetricsRecord {
    /// Compute all metrics from a symbol's snapshot and price window
    pub fn compute(snapshot: &Snapshot, window: &PriceWindow) -> Self {
        Self {
            price_change_pct: price_change(window),
            volatility_pct: volatility(window),
            spread_pct: spread(snapshot.bid_price, snapshot.ask_price),
            units_per_100_quote: units_per_100_quote(snapshot.price),
            volume_quote: volume_in_quote(snapshot.volume, snapshot.price),
        }
    }
}
