use crate::data::types::Candle;

/// Body-to-range ratio below which a candle counts as indecision.
const DOJI_BODY_RATIO: f64 = 0.12;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pattern {
    Doji,
    Hammer,
    ShootingStar,
    Normal,
}

impl std::fmt::Display for Pattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Pattern::Doji => "Doji",
            Pattern::Hammer => "Hammer",
            Pattern::ShootingStar => "Shooting Star",
            Pattern::Normal => "Normal",
        };
        f.write_str(label)
    }
}

/// Classify a single candle by body size and wick shape.
/// Doji is checked first and wins regardless of wicks.
pub fn classify(candle: &Candle) -> Pattern {
    let body = (candle.close - candle.open).abs();
    let span = candle.high - candle.low;
    let range = if span == 0.0 { 1.0 } else { span };

    let upper_wick = candle.high - candle.open.max(candle.close);
    let lower_wick = candle.open.min(candle.close) - candle.low;

    if body / range < DOJI_BODY_RATIO {
        Pattern::Doji
    } else if lower_wick > body * 2.0 && upper_wick < body {
        Pattern::Hammer
    } else if upper_wick > body * 2.0 && lower_wick < body {
        Pattern::ShootingStar
    } else {
        Pattern::Normal
    }
}

/// Pattern of the most recent candle; an empty series reads as a flat
/// all-zero candle.
pub fn latest_pattern(candles: &[Candle]) -> Pattern {
    match candles.last() {
        Some(candle) => classify(candle),
        None => classify(&Candle::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candle(open: f64, high: f64, low: f64, close: f64) -> Candle {
        Candle::new("2026-01-01T00:00:00+00:00", open, high, low, close)
    }

    #[test]
    fn test_hammer() {
        // body=0.1, range=0.65, lower=0.5, upper=0.05
        assert_eq!(classify(&candle(10.0, 10.15, 9.5, 10.1)), Pattern::Hammer);
    }

    #[test]
    fn test_shooting_star() {
        // body=0.1, range=0.65, upper=0.5, lower=0.05
        assert_eq!(classify(&candle(10.0, 10.5, 9.85, 9.9)), Pattern::ShootingStar);
    }

    #[test]
    fn test_zero_range_is_doji() {
        assert_eq!(classify(&candle(5.0, 5.0, 5.0, 5.0)), Pattern::Doji);
    }

    #[test]
    fn test_doji_wins_over_wick_shape() {
        // Long lower wick would be a hammer, but the body is tiny.
        assert_eq!(classify(&candle(10.0, 10.02, 8.0, 10.01)), Pattern::Doji);
        // Long upper wick, tiny body.
        assert_eq!(classify(&candle(10.0, 12.0, 9.99, 9.99)), Pattern::Doji);
    }

    #[test]
    fn test_doji_boundary() {
        // body/range of 0.1 is under the threshold, 0.2 is over it.
        assert_eq!(classify(&candle(10.0, 11.0, 10.0, 10.1)), Pattern::Doji);
        assert_ne!(classify(&candle(10.0, 11.0, 10.0, 10.2)), Pattern::Doji);
    }

    #[test]
    fn test_full_body_is_normal() {
        assert_eq!(classify(&candle(10.0, 11.0, 9.9, 10.9)), Pattern::Normal);
    }

    #[test]
    fn test_empty_series_is_doji() {
        assert_eq!(latest_pattern(&[]), Pattern::Doji);
    }

    #[test]
    fn test_latest_candle_only() {
        let candles = vec![
            candle(10.0, 10.15, 9.5, 10.1),
            candle(10.0, 10.5, 9.85, 9.9),
        ];
        assert_eq!(latest_pattern(&candles), Pattern::ShootingStar);
    }

    #[test]
    fn test_labels() {
        assert_eq!(Pattern::ShootingStar.to_string(), "Shooting Star");
        assert_eq!(Pattern::Doji.to_string(), "Doji");
    }
}
