use serde::Serialize;

use crate::analytics::markers::Marker;
use crate::analytics::pattern::Pattern;

/// Name of the marker trace on the chart.
pub const MARKER_TRACE_NAME: &str = "90%+ Signals";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandleTrace {
    pub name: String,
    pub x: Vec<String>,
    pub open: Vec<f64>,
    pub high: Vec<f64>,
    pub low: Vec<f64>,
    pub close: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarkerTrace {
    pub name: &'static str,
    pub markers: Vec<Marker>,
}

/// What the chart sink receives: candles plus signal markers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    pub candles: CandleTrace,
    pub markers: MarkerTrace,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderBookView {
    pub meta_line: String,
    pub bid_lines: Vec<String>,
    pub ask_lines: Vec<String>,
}

/// Everything one render needs, rebuilt from scratch per accepted response.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewModel {
    pub symbol: String,
    pub pattern: Pattern,
    pub chart: ChartSpec,
    pub summary_lines: Vec<String>,
    pub orderbook: OrderBookView,
    pub stats_line: String,
    pub history_lines: Vec<String>,
}
