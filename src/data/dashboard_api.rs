use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::debug;

use crate::data::error::FetchError;
use crate::data::types::{
    null_as_default, Event, FeedData, MarketData, ScannerStatus, Selection, Signal, Snapshot, Stats,
};

/// Events requested per feed refresh.
pub const EVENT_LIMIT: usize = 25;

/// Rows requested by the history export.
pub const EXPORT_LIMIT: usize = 1000;

/// Backend REST surface the dashboard consumes.
#[allow(async_fn_in_trait)]
pub trait DashboardApi: Clone + 'static {
    async fn fetch_market(&self, selection: &Selection) -> Result<MarketData, FetchError>;

    async fn fetch_events(&self, limit: usize) -> Result<Vec<Event>, FetchError>;

    async fn fetch_scanner_status(&self) -> Result<ScannerStatus, FetchError>;

    async fn set_scanner_running(&self, running: bool) -> Result<(), FetchError>;

    async fn run_backtest(&self, selection: &Selection) -> Result<Value, FetchError>;

    async fn export_history(&self, symbol: &str, limit: usize) -> Result<Vec<u8>, FetchError>;

    async fn advise(&self, fields: &BTreeMap<String, String>) -> Result<Value, FetchError>;

    /// Both halves of the feed group; either failing fails the group.
    async fn fetch_feed(&self) -> Result<FeedData, FetchError> {
        let (events, status) =
            futures::try_join!(self.fetch_events(EVENT_LIMIT), self.fetch_scanner_status())?;
        Ok(FeedData { events, status })
    }
}

#[derive(Debug, Deserialize)]
struct SnapshotResponse {
    #[serde(default)]
    ok: bool,
    #[serde(default)]
    snapshot: Option<Snapshot>,
    #[serde(default, deserialize_with = "null_as_default")]
    history: Vec<Signal>,
    #[serde(default)]
    stats: Option<Stats>,
}

#[derive(Debug, Deserialize)]
struct EventsResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    items: Vec<Event>,
}

/// Decode a `/api/snapshot` body into the triple the view is built from.
pub fn parse_snapshot_response(body: &[u8]) -> Result<MarketData, FetchError> {
    let response: SnapshotResponse = serde_json::from_slice(body)?;

    if !response.ok {
        return Err(FetchError::NotReady);
    }
    let snapshot = response.snapshot.ok_or(FetchError::NotReady)?;
    let stats = response.stats.ok_or(FetchError::MissingField("stats"))?;

    Ok(MarketData {
        snapshot,
        history: response.history,
        stats,
    })
}

pub fn parse_events_response(body: &[u8]) -> Result<Vec<Event>, FetchError> {
    let response: EventsResponse = serde_json::from_slice(body)?;
    Ok(response.items)
}

#[derive(Debug, Clone)]
pub struct HttpDashboardApi {
    client: Client,
    base_url: String,
}

impl HttpDashboardApi {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    #[cfg(test)]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_bytes(&self, path: &str, query: &[(&str, String)]) -> Result<Vec<u8>, FetchError> {
        let bytes = self.client
            .get(self.url(path))
            .query(query)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;

        Ok(bytes.to_vec())
    }
}

impl DashboardApi for HttpDashboardApi {
    async fn fetch_market(&self, selection: &Selection) -> Result<MarketData, FetchError> {
        let body = self
            .get_bytes(
                "/api/snapshot",
                &[
                    ("symbol", selection.symbol.clone()),
                    ("timeframe", selection.timeframe.clone()),
                ],
            )
            .await?;

        debug!("Snapshot for {}: {} bytes", selection, body.len());
        parse_snapshot_response(&body)
    }

    async fn fetch_events(&self, limit: usize) -> Result<Vec<Event>, FetchError> {
        let body = self.get_bytes("/api/events", &[("limit", limit.to_string())]).await?;
        parse_events_response(&body)
    }

    async fn fetch_scanner_status(&self) -> Result<ScannerStatus, FetchError> {
        let body = self.get_bytes("/api/scanner/status", &[]).await?;
        Ok(serde_json::from_slice(&body)?)
    }

    async fn set_scanner_running(&self, running: bool) -> Result<(), FetchError> {
        let path = if running { "/api/scanner/resume" } else { "/api/scanner/pause" };

        self.client
            .post(self.url(path))
            .send()
            .await?
            .error_for_status()?;

        Ok(())
    }

    async fn run_backtest(&self, selection: &Selection) -> Result<Value, FetchError> {
        let body = serde_json::json!({
            "symbol": selection.symbol,
            "timeframe": selection.timeframe,
        });

        let bytes = self.client
            .post(self.url("/api/backtest/run"))
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;

        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn export_history(&self, symbol: &str, limit: usize) -> Result<Vec<u8>, FetchError> {
        self.get_bytes(
            "/api/history/export",
            &[("symbol", symbol.to_string()), ("limit", limit.to_string())],
        )
        .await
    }

    async fn advise(&self, fields: &BTreeMap<String, String>) -> Result<Value, FetchError> {
        let bytes = self.client
            .post(self.url("/advisor"))
            .json(fields)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;

        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_snapshot_response() {
        let body = br#"{
            "ok": true,
            "symbol": "BTCUSDT",
            "snapshot": {
                "symbol": "BTCUSDT",
                "timeframe": "15",
                "price": 64012.5,
                "bias": "bullish",
                "indicators": {"rsi": 55.2, "adx": 24.1, "atr": 120.4, "vwap": 63990.0},
                "liquidity": {"swing_high": 64500.0, "swing_low": 63100.0, "fvg_up": false},
                "orderbook": {"bids": [[64010.0, 1.5]], "asks": [[64015.0, 0.7]], "spread": 5.0, "imbalance": 0.12},
                "candles": [{"timestamp": "2026-01-01T00:00:00+00:00", "open": 1, "high": 2, "low": 0.5, "close": 1.5, "volume": 10}]
            },
            "history": [{"created_at": "2026-01-01T00:00:00", "symbol": "BTCUSDT", "direction": "LONG", "entry": 64000.0, "confidence": 91.0, "rr": 2.1, "why": "trend"}],
            "stats": {"total_signals": 12.0, "avg_confidence": 88.5, "signals_last_24h": 3.0}
        }"#;

        let data = parse_snapshot_response(body).unwrap();

        assert_eq!(data.snapshot.symbol, "BTCUSDT");
        assert_eq!(data.snapshot.candles.len(), 1);
        assert_eq!(data.snapshot.orderbook.as_ref().unwrap().bids, vec![(64010.0, 1.5)]);
        assert_eq!(data.history.len(), 1);
        assert_eq!(data.stats.total_signals, 12.0);
    }

    #[test]
    fn test_ok_false_is_not_ready() {
        let err = parse_snapshot_response(br#"{"ok": false}"#).unwrap_err();
        assert!(err.is_not_ready());
    }

    #[test]
    fn test_missing_snapshot_is_not_ready() {
        let err = parse_snapshot_response(br#"{"ok": true, "stats": {}}"#).unwrap_err();
        assert!(err.is_not_ready());
    }

    #[test]
    fn test_missing_stats_is_fatal_for_cycle() {
        let err = parse_snapshot_response(br#"{"ok": true, "snapshot": {"symbol": "BTCUSDT"}}"#)
            .unwrap_err();
        assert!(matches!(err, FetchError::MissingField("stats")));
    }

    #[test]
    fn test_missing_optional_sections_degrade() {
        let body = br#"{"ok": true, "snapshot": {"symbol": "ETHUSDT", "price": 3000}, "stats": {}}"#;
        let data = parse_snapshot_response(body).unwrap();

        assert!(data.snapshot.orderbook.is_none());
        assert_eq!(data.snapshot.indicators.rsi, 0.0);
        assert!(data.snapshot.candles.is_empty());
        assert!(data.history.is_empty());
    }

    #[test]
    fn test_null_sections_degrade() {
        let body = br#"{
            "ok": true,
            "snapshot": {
                "symbol": "ETHUSDT",
                "price": 3000,
                "indicators": null,
                "liquidity": null,
                "orderbook": {"bids": null, "asks": null, "spread": 0.5},
                "candles": null
            },
            "history": null,
            "stats": {}
        }"#;
        let data = parse_snapshot_response(body).unwrap();

        assert_eq!(data.snapshot.price, 3000.0);
        assert_eq!(data.snapshot.indicators.rsi, 0.0);
        assert_eq!(data.snapshot.liquidity.swing_high, 0.0);
        let book = data.snapshot.orderbook.as_ref().unwrap();
        assert!(book.bids.is_empty());
        assert!(book.asks.is_empty());
        assert_eq!(book.spread, 0.5);
        assert!(data.snapshot.candles.is_empty());
        assert!(data.history.is_empty());
    }

    #[test]
    fn test_null_event_items_degrade() {
        assert!(parse_events_response(br#"{"items": null}"#).unwrap().is_empty());
    }

    #[test]
    fn test_non_json_body_is_decode_error() {
        let err = parse_snapshot_response(b"<html>502</html>").unwrap_err();
        assert!(matches!(err, FetchError::Decode(_)));
    }

    #[test]
    fn test_parse_events_response() {
        let body = br#"{"items": [
            {"ts": "2026-01-01T00:00:02+00:00", "type": "signal", "payload": {"symbol": "BTCUSDT"}},
            {"ts": "2026-01-01T00:00:01+00:00", "type": "error", "payload": {"message": "timeout"}}
        ]}"#;

        let events = parse_events_response(body).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].kind, "signal");
        assert_eq!(events[1].payload["message"], "timeout");
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let api = HttpDashboardApi::new("http://localhost:8000/", Duration::from_secs(1)).unwrap();
        assert_eq!(api.base_url(), "http://localhost:8000");
        assert_eq!(api.url("/api/events"), "http://localhost:8000/api/events");
    }
}
