pub mod console;

use anyhow::Result;
use serde_json::Value;

use crate::data::types::{Event, LiveState, ScannerStatus};
use crate::view::model::{ChartSpec, ViewModel};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Panel {
    Market,
    OrderBook,
    Bids,
    Asks,
    Stats,
    History,
    Events,
    Scanner,
    Advisor,
    Live,
}

impl Panel {
    pub fn title(&self) -> &'static str {
        match self {
            Panel::Market => "Market",
            Panel::OrderBook => "Order Book",
            Panel::Bids => "Bids",
            Panel::Asks => "Asks",
            Panel::Stats => "Stats",
            Panel::History => "Signal History",
            Panel::Events => "Events",
            Panel::Scanner => "Scanner",
            Panel::Advisor => "Advisor",
            Panel::Live => "Live",
        }
    }
}

/// Where rendered output goes. The chart widget and panels are opaque.
pub trait RenderTarget {
    fn set_chart(&mut self, chart: &ChartSpec) -> Result<()>;

    fn set_panel(&mut self, panel: Panel, content: &str) -> Result<()>;
}

/// Pushes view-models into a target. Holds no state of its own.
pub struct Renderer<T: RenderTarget> {
    target: T,
}

impl<T: RenderTarget> Renderer<T> {
    pub fn new(target: T) -> Self {
        Self { target }
    }

    #[cfg(test)]
    pub fn target(&self) -> &T {
        &self.target
    }

    pub fn render(&mut self, vm: &ViewModel) -> Result<()> {
        self.target.set_chart(&vm.chart)?;
        self.target.set_panel(Panel::Market, &vm.summary_lines.join("\n"))?;
        self.target.set_panel(Panel::OrderBook, &vm.orderbook.meta_line)?;
        self.target.set_panel(Panel::Bids, &vm.orderbook.bid_lines.join("\n"))?;
        self.target.set_panel(Panel::Asks, &vm.orderbook.ask_lines.join("\n"))?;
        self.target.set_panel(Panel::Stats, &vm.stats_line)?;
        self.target.set_panel(Panel::History, &vm.history_lines.join("\n"))?;
        Ok(())
    }

    pub fn render_events(&mut self, events: &[Event]) -> Result<()> {
        let lines: Vec<String> = events.iter().map(event_line).collect();
        self.target.set_panel(Panel::Events, &lines.join("\n"))
    }

    pub fn render_scanner(&mut self, status: &ScannerStatus) -> Result<()> {
        self.target.set_panel(Panel::Scanner, &scanner_line(status))
    }

    pub fn render_advice(&mut self, advice: &Value) -> Result<()> {
        let text = serde_json::to_string_pretty(advice)?;
        self.target.set_panel(Panel::Advisor, &text)
    }

    pub fn render_live(&mut self, state: &LiveState) -> Result<()> {
        let line = format!(
            "Scanner tracking {} symbols ({}) | updated {}",
            state.symbols.len(),
            state.symbols.join(", "),
            state.updated_at
        );
        self.target.set_panel(Panel::Live, &line)
    }
}

pub fn event_line(event: &Event) -> String {
    format!("{} | {} | {}", event.ts, event.kind, event.payload)
}

pub fn scanner_line(status: &ScannerStatus) -> String {
    let state = if status.running { "running" } else { "paused" };
    let symbols: Vec<&str> = status.tracked_symbols.iter().map(String::as_str).collect();

    if symbols.is_empty() {
        format!("Scanner: {}", state)
    } else {
        format!("Scanner: {} | Tracking: {}", state, symbols.join(", "))
    }
}

/// In-memory target that keeps the latest content of every panel.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct RecordingTarget {
    pub chart: Option<ChartSpec>,
    pub charts_set: usize,
    pub panels: std::collections::HashMap<Panel, String>,
}

#[cfg(test)]
impl RecordingTarget {
    pub fn panel(&self, panel: Panel) -> Option<&str> {
        self.panels.get(&panel).map(String::as_str)
    }
}

#[cfg(test)]
impl RenderTarget for RecordingTarget {
    fn set_chart(&mut self, chart: &ChartSpec) -> Result<()> {
        self.chart = Some(chart.clone());
        self.charts_set += 1;
        Ok(())
    }

    fn set_panel(&mut self, panel: Panel, content: &str) -> Result<()> {
        self.panels.insert(panel, content.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::types::{Candle, OrderBook, Snapshot, Stats};
    use crate::view::builder::build;
    use serde_json::json;

    #[test]
    fn test_render_fills_every_market_panel() {
        let snapshot = Snapshot {
            symbol: "ETHUSDT".to_string(),
            price: 3000.0,
            bias: "bearish".to_string(),
            orderbook: Some(OrderBook {
                bids: vec![(2999.5, 2.0), (2999.0, 1.0)],
                asks: vec![(3000.5, 1.25)],
                spread: 1.0,
                imbalance: -0.1,
            }),
            candles: vec![Candle::new("t0", 3000.0, 3010.0, 2990.0, 3005.0)],
            ..Default::default()
        };
        let vm = build(Some(&snapshot), &[], &Stats::default()).unwrap();

        let mut renderer = Renderer::new(RecordingTarget::default());
        renderer.render(&vm).unwrap();

        let target = renderer.target();
        assert_eq!(target.charts_set, 1);
        assert!(target.panel(Panel::Market).unwrap().starts_with("Price: 3000.00\nBias: bearish"));
        assert_eq!(target.panel(Panel::OrderBook), Some("Spread: 1.0000 | Imbalance: -10.00%"));
        assert_eq!(target.panel(Panel::Bids), Some("2999.50 · 2.000\n2999.00 · 1.000"));
        assert_eq!(target.panel(Panel::Asks), Some("3000.50 · 1.250"));
        assert_eq!(target.panel(Panel::History), Some(""));
    }

    #[test]
    fn test_event_lines() {
        let event = Event {
            ts: "2026-01-01T00:00:00+00:00".to_string(),
            kind: "signal".to_string(),
            payload: json!({"symbol": "BTCUSDT"}),
        };
        assert_eq!(
            event_line(&event),
            r#"2026-01-01T00:00:00+00:00 | signal | {"symbol":"BTCUSDT"}"#
        );
    }

    #[test]
    fn test_scanner_line() {
        let mut status = ScannerStatus::default();
        assert_eq!(scanner_line(&status), "Scanner: paused");

        status.running = true;
        status.tracked_symbols.insert("ETHUSDT".to_string());
        status.tracked_symbols.insert("BTCUSDT".to_string());
        assert_eq!(scanner_line(&status), "Scanner: running | Tracking: BTCUSDT, ETHUSDT");
    }

    #[test]
    fn test_advice_rendered_verbatim() {
        let mut renderer = Renderer::new(RecordingTarget::default());
        renderer.render_advice(&json!({"confidence": 75.0})).unwrap();

        assert_eq!(
            renderer.target().panel(Panel::Advisor),
            Some("{\n  \"confidence\": 75.0\n}")
        );
    }
}
