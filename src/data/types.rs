use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;

/// Treat an explicit `null` the same as a missing field.
pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Candle {
    pub timestamp: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

#[cfg(test)]
impl Candle {
    pub fn new(timestamp: &str, open: f64, high: f64, low: f64, close: f64) -> Self {
        Self {
            timestamp: timestamp.to_string(),
            open,
            high,
            low,
            close,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Indicators {
    pub rsi: f64,
    pub adx: f64,
    pub atr: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Liquidity {
    pub swing_high: f64,
    pub swing_low: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OrderBook {
    #[serde(deserialize_with = "null_as_default")]
    pub bids: Vec<(f64, f64)>,
    #[serde(deserialize_with = "null_as_default")]
    pub asks: Vec<(f64, f64)>,
    pub spread: f64,
    pub imbalance: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Snapshot {
    pub symbol: String,
    pub timeframe: String,
    pub price: f64,
    pub bias: String,
    #[serde(deserialize_with = "null_as_default")]
    pub indicators: Indicators,
    #[serde(deserialize_with = "null_as_default")]
    pub liquidity: Liquidity,
    pub orderbook: Option<OrderBook>,
    #[serde(deserialize_with = "null_as_default")]
    pub candles: Vec<Candle>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Long,
    Short,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Signal {
    pub created_at: String,
    pub symbol: String,
    /// Kept verbatim for display.
    pub direction: String,
    pub entry: f64,
    pub confidence: f64,
    pub rr: f64,
}

impl Signal {
    pub fn side(&self) -> Direction {
        if self.direction.eq_ignore_ascii_case("LONG") {
            Direction::Long
        } else {
            Direction::Short
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Stats {
    pub total_signals: f64,
    pub signals_last_24h: f64,
    pub avg_confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    #[serde(default)]
    pub ts: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub payload: Value,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ScannerStatus {
    pub running: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub tracked_symbols: BTreeSet<String>,
}

/// The (symbol, timeframe) pair the market group is fetched for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Selection {
    pub symbol: String,
    pub timeframe: String,
}

impl Selection {
    pub fn new(symbol: &str, timeframe: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            timeframe: timeframe.to_string(),
        }
    }
}

impl std::fmt::Display for Selection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.symbol, self.timeframe)
    }
}

/// One accepted `/api/snapshot` response.
#[derive(Debug, Clone)]
pub struct MarketData {
    pub snapshot: Snapshot,
    pub history: Vec<Signal>,
    pub stats: Stats,
}

/// Events plus scanner status, fetched together.
#[derive(Debug, Clone)]
pub struct FeedData {
    pub events: Vec<Event>,
    pub status: ScannerStatus,
}

/// Periodic push from the backend's `/ws` endpoint.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LiveState {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub symbols: Vec<String>,
    #[serde(default)]
    pub updated_at: String,
}
