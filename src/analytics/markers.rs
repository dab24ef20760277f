use serde::Serialize;

use crate::data::types::{Direction, Signal};

/// Minimum confidence for a historical signal to be drawn on the chart.
pub const MARKER_CONFIDENCE: f64 = 90.0;

pub const LONG_COLOR: &str = "#22c55e";
pub const SHORT_COLOR: &str = "#ef4444";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Glyph {
    ArrowUp,
    ArrowDown,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub x: String,
    pub y: f64,
    pub text: String,
    pub glyph: Glyph,
    pub color: &'static str,
}

impl Marker {
    fn from_signal(signal: &Signal) -> Self {
        let (glyph, color) = match signal.side() {
            Direction::Long => (Glyph::ArrowUp, LONG_COLOR),
            Direction::Short => (Glyph::ArrowDown, SHORT_COLOR),
        };

        Self {
            x: signal.created_at.clone(),
            y: signal.entry,
            text: format!("{} {:.1}%", signal.direction, signal.confidence),
            glyph,
            color,
        }
    }
}

/// One marker per high-confidence signal, in input order.
pub fn extract_markers(history: &[Signal]) -> Vec<Marker> {
    history
        .iter()
        .filter(|s| s.confidence >= MARKER_CONFIDENCE)
        .map(Marker::from_signal)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signal(created_at: &str, direction: &str, entry: f64, confidence: f64) -> Signal {
        Signal {
            created_at: created_at.to_string(),
            symbol: "BTCUSDT".to_string(),
            direction: direction.to_string(),
            entry,
            confidence,
            rr: 2.0,
        }
    }

    #[test]
    fn test_threshold_and_order() {
        let history = vec![
            signal("t1", "LONG", 100.0, 95.0),
            signal("t2", "LONG", 101.0, 80.0),
            signal("t3", "SHORT", 102.0, 90.0),
        ];

        let markers = extract_markers(&history);

        assert_eq!(markers.len(), 2);
        assert_eq!(markers[0].x, "t1");
        assert_eq!(markers[0].y, 100.0);
        assert_eq!(markers[0].text, "LONG 95.0%");
        assert_eq!(markers[0].glyph, Glyph::ArrowUp);
        assert_eq!(markers[0].color, LONG_COLOR);

        assert_eq!(markers[1].x, "t3");
        assert_eq!(markers[1].text, "SHORT 90.0%");
        assert_eq!(markers[1].glyph, Glyph::ArrowDown);
        assert_eq!(markers[1].color, SHORT_COLOR);
    }

    #[test]
    fn test_duplicates_kept() {
        let history = vec![
            signal("t1", "LONG", 100.0, 92.5),
            signal("t1", "LONG", 100.0, 92.5),
        ];
        assert_eq!(extract_markers(&history).len(), 2);
    }

    #[test]
    fn test_label_rounds_to_one_decimal() {
        let markers = extract_markers(&[signal("t1", "SHORT", 1.0, 97.26)]);
        assert_eq!(markers[0].text, "SHORT 97.3%");
    }

    #[test]
    fn test_glyph_serializes_as_chart_symbol() {
        assert_eq!(serde_json::to_value(Glyph::ArrowUp).unwrap(), "arrow-up");
        assert_eq!(serde_json::to_value(Glyph::ArrowDown).unwrap(), "arrow-down");
    }

    #[test]
    fn test_empty_history() {
        assert!(extract_markers(&[]).is_empty());
    }
}
