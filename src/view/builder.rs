use crate::analytics::markers::extract_markers;
use crate::analytics::pattern::latest_pattern;
use crate::data::types::{OrderBook, Signal, Snapshot, Stats};
use crate::view::model::{CandleTrace, ChartSpec, MarkerTrace, OrderBookView, ViewModel, MARKER_TRACE_NAME};

/// Order book levels shown per side.
pub const MAX_BOOK_LEVELS: usize = 12;

/// Historical signals shown in the history panel.
pub const MAX_HISTORY_LINES: usize = 40;

/// Build the renderable aggregate. `None` snapshot means there is nothing
/// to show yet and is not an error.
pub fn build(snapshot: Option<&Snapshot>, history: &[Signal], stats: &Stats) -> Option<ViewModel> {
    let snapshot = snapshot?;

    let pattern = latest_pattern(&snapshot.candles);
    let chart = ChartSpec {
        candles: candle_trace(snapshot),
        markers: MarkerTrace {
            name: MARKER_TRACE_NAME,
            markers: extract_markers(history),
        },
    };

    let summary_lines = vec![
        format!("Price: {}", format_price(snapshot.price)),
        format!("Bias: {}", snapshot.bias),
        format!("RSI: {:.1}", snapshot.indicators.rsi),
        format!("ADX: {:.1}", snapshot.indicators.adx),
        format!("ATR: {:.1}", snapshot.indicators.atr),
        format!("Pattern: {}", pattern),
        format!("Liquidity High: {}", format_price(snapshot.liquidity.swing_high)),
        format!("Liquidity Low: {}", format_price(snapshot.liquidity.swing_low)),
    ];

    let empty_book = OrderBook::default();
    let book = snapshot.orderbook.as_ref().unwrap_or(&empty_book);

    Some(ViewModel {
        symbol: snapshot.symbol.clone(),
        pattern,
        chart,
        summary_lines,
        orderbook: orderbook_view(book),
        stats_line: stats_line(stats),
        history_lines: history
            .iter()
            .take(MAX_HISTORY_LINES)
            .map(history_line)
            .collect(),
    })
}

fn candle_trace(snapshot: &Snapshot) -> CandleTrace {
    let candles = &snapshot.candles;

    CandleTrace {
        name: snapshot.symbol.clone(),
        x: candles.iter().map(|c| c.timestamp.clone()).collect(),
        open: candles.iter().map(|c| c.open).collect(),
        high: candles.iter().map(|c| c.high).collect(),
        low: candles.iter().map(|c| c.low).collect(),
        close: candles.iter().map(|c| c.close).collect(),
    }
}

fn orderbook_view(book: &OrderBook) -> OrderBookView {
    let level = |&(price, size): &(f64, f64)| format!("{} · {:.3}", format_price(price), size);

    OrderBookView {
        meta_line: format!(
            "Spread: {} | Imbalance: {}",
            format_spread(book.spread),
            format_percent(book.imbalance)
        ),
        bid_lines: book.bids.iter().take(MAX_BOOK_LEVELS).map(level).collect(),
        ask_lines: book.asks.iter().take(MAX_BOOK_LEVELS).map(level).collect(),
    }
}

fn stats_line(stats: &Stats) -> String {
    format!(
        "Signals total: {} | Last 24h: {} | Avg conf: {:.2}%",
        stats.total_signals, stats.signals_last_24h, stats.avg_confidence
    )
}

fn history_line(signal: &Signal) -> String {
    format!(
        "{} | {} {} entry={} conf={:.1} rr={:.2}",
        signal.created_at,
        signal.symbol,
        signal.direction,
        format_price(signal.entry),
        signal.confidence,
        signal.rr
    )
}

pub fn format_price(value: f64) -> String {
    format!("{:.2}", value)
}

pub fn format_spread(value: f64) -> String {
    format!("{:.4}", value)
}

/// Ratio in [-1, 1] shown as a percentage.
pub fn format_percent(ratio: f64) -> String {
    format!("{:.2}%", ratio * 100.0)
}
