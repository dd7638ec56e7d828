//! Console table for the published board

use crate::engine::MarketBoard;
use crate::stats::{format_magnitude, format_number};
use std::fmt::Write;

/// Render one table row per tracked symbol plus a status footer
pub fn render_board(board: &MarketBoard, quote: &str) -> String {
    let mut out = String::new();
    let per_100 = format!("PER 100 {}", quote);

    let _ = writeln!(
        out,
        "{:<12} {:>14} {:>9} {:>9} {:>14} {:>14} {:>8} {:>16} {:>10}  {}",
        "PAIR", "PRICE", "CHG 5M", "VOL 5M", "BID", "ASK", "SPREAD", per_100, "24H VOL", "STATE"
    );

    for symbol in &board.symbols {
        let state = board
            .states
            .get(symbol)
            .map(|s| s.label())
            .unwrap_or("idle");

        let Some(snapshot) = board.snapshots.get(symbol) else {
            let _ = writeln!(out, "{:<12} {:>14}  {}", symbol.pair_label(quote), "loading...", state);
            continue;
        };

        let metrics = board.metrics.get(symbol);
        let change = metrics.map(|m| m.price_change_pct);
        let sign = if change.unwrap_or(0.0) >= 0.0 { "+" } else { "" };

        let _ = writeln!(
            out,
            "{:<12} {:>14} {:>9} {:>9} {:>14} {:>14} {:>8} {:>16} {:>10}  {}",
            symbol.pair_label(quote),
            format_number(Some(snapshot.price), 4),
            format!("{}{}%", sign, format_number(change, 2)),
            format!("{}%", format_number(metrics.map(|m| m.volatility_pct), 4)),
            format_number(Some(snapshot.bid_price), 4),
            format_number(Some(snapshot.ask_price), 4),
            format!("{}%", format_number(metrics.map(|m| m.spread_pct), 4)),
            format!(
                "{} {}",
                format_number(metrics.map(|m| m.units_per_100_quote), 6),
                symbol.base_asset(quote)
            ),
            format_magnitude(metrics.map(|m| m.volume_quote).unwrap_or(f64::NAN)),
            state,
        );
    }

    let status = if board.connectivity.is_fully_connected {
        "connected"
    } else {
        "disconnected"
    };
    let _ = write!(out, "status: {}", status);
    if let Some(error) = &board.connectivity.last_error {
        let _ = write!(out, " | error: {}", error);
    }
    if let Some(at) = board.computed_at {
        let _ = write!(out, " | last calculation: {}", at.format("%H:%M:%S"));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Connectivity;
    use crate::feed::{ConnectionState, Snapshot, Symbol};
    use crate::stats::MetricsRecord;
    use chrono::Utc;

    #[test]
    fn test_render_rows_and_footer() {
        let btc = Symbol::new("BTCUSDT");
        let sol = Symbol::new("SOLUSDT");
        let mut board = MarketBoard {
            symbols: vec![btc.clone(), sol.clone()],
            computed_at: Some(Utc::now()),
            connectivity: Connectivity {
                is_fully_connected: false,
                last_error: Some("Connection error for SOLUSDT: refused".to_string()),
            },
            ..MarketBoard::default()
        };
        board.states.insert(btc.clone(), ConnectionState::Open);
        board.snapshots.insert(
            btc.clone(),
            Snapshot {
                symbol: btc.clone(),
                price: 50_000.0,
                bid_price: 49_999.0,
                ask_price: 50_000.0,
                volume: 30_000.0,
                high_24h: 51_000.0,
                low_24h: 49_000.0,
                price_change_percent_24h: 1.0,
                last_update: Utc::now(),
            },
        );
        board.metrics.insert(
            btc.clone(),
            MetricsRecord {
                price_change_pct: 1.5,
                volatility_pct: 0.01,
                spread_pct: 0.002,
                units_per_100_quote: 0.002,
                volume_quote: 1_500_000_000.0,
            },
        );

        let table = render_board(&board, "USDT");
        assert!(table.contains("BTC/USDT"));
        assert!(table.contains("50000.0000"));
        assert!(table.contains("+1.50%"));
        assert!(table.contains("0.002000 BTC"));
        assert!(table.contains("1.50B"));
        assert!(table.contains("SOL/USDT"));
        assert!(table.contains("loading..."));
        assert!(table.contains("status: disconnected | error: Connection error for SOLUSDT"));
    }
}
