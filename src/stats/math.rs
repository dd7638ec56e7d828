//! Derived market metrics
//!
//! Pure functions over a price window and snapshot fields. Each metric has a
//! defined fallback for missing inputs instead of failing.

use super::PriceWindow;

/// Zero and NaN both mean "no value" for guarded inputs
fn is_absent(value: f64) -> bool {
    value == 0.0 || value.is_nan()
}

/// Percentage change from the oldest to the newest retained sample
///
/// Returns 0 when fewer than two samples are retained.
pub fn price_change(window: &PriceWindow) -> f64 {
    if window.len() < 2 {
        return 0.0;
    }
    match (window.first(), window.last()) {
        (Some(first), Some(last)) => (last.price - first.price) / first.price * 100.0,
        _ => 0.0,
    }
}

/// Population standard deviation of consecutive relative returns, in percent
///
/// Returns 0 when fewer than two samples are retained.
pub fn volatility(window: &PriceWindow) -> f64 {
    if window.len() < 2 {
        return 0.0;
    }

    let prices: Vec<f64> = window.samples().map(|s| s.price).collect();
    let returns: Vec<f64> = prices
        .windows(2)
        .map(|pair| (pair[1] - pair[0]) / pair[0])
        .collect();

    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;

    variance.sqrt() * 100.0
}

/// Bid/ask spread as a percentage of the ask
pub fn spread(bid: f64, ask: f64) -> f64 {
    if is_absent(bid) || is_absent(ask) {
        return 0.0;
    }
    (ask - bid) / ask * 100.0
}

/// Base-currency quantity bought by 100 units of quote currency
pub fn units_per_100_quote(price: f64) -> f64 {
    if is_absent(price) {
        return 0.0;
    }
    100.0 / price
}

/// Base-unit volume expressed in quote currency
pub fn volume_in_quote(volume: f64, price: f64) -> f64 {
    volume * price
}
