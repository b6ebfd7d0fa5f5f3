use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MalformedBarError {
    #[error("Bar series is empty")]
    EmptySeries,
    #[error("Bar {index}: non-positive or non-finite {field} ({value})")]
    InvalidPrice {
        index: usize,
        field: &'static str,
        value: f64,
    },
    #[error("Bar {index}: invalid OHLC values, high ({high}) < low ({low})")]
    InvalidHighLow { index: usize, high: f64, low: f64 },
    #[error("Bar {index}: negative or non-finite volume ({volume})")]
    InvalidVolume { index: usize, volume: f64 },
    #[error("Bar {index}: timestamp {timestamp} is not after the previous bar ({previous})")]
    OutOfOrder {
        index: usize,
        timestamp: DateTime<Utc>,
        previous: DateTime<Utc>,
    },
    #[error("Bar {index}: symbol {found} does not match series symbol {expected}")]
    SymbolMismatch {
        index: usize,
        expected: String,
        found: String,
    },
}

//one ohlcv observation for a one-second interval with at least one trade
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub symbol: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub trade_count: u64,
}

impl Bar {
    //creates a Bar without validation, validation happens once when the series is built
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        timestamp: DateTime<Utc>,
        symbol: String,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
        trade_count: u64,
    ) -> Self {
        Bar {
            timestamp,
            symbol,
            open,
            high,
            low,
            close,
            volume,
            trade_count,
        }
    }

    //checks the per-bar invariants, index is the bar's position in its series
    //open/close outside [low, high] is tolerated and passed through
    pub fn validate(&self, index: usize) -> Result<(), MalformedBarError> {
        for (field, value) in [
            ("open", self.open),
            ("high", self.high),
            ("low", self.low),
            ("close", self.close),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(MalformedBarError::InvalidPrice {
                    index,
                    field,
                    value,
                });
            }
        }

        if self.high < self.low {
            return Err(MalformedBarError::InvalidHighLow {
                index,
                high: self.high,
                low: self.low,
            });
        }

        if !self.volume.is_finite() || self.volume < 0.0 {
            return Err(MalformedBarError::InvalidVolume {
                index,
                volume: self.volume,
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn bar(open: f64, high: f64, low: f64, close: f64, volume: f64) -> Bar {
        Bar::new(
            Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap(),
            "BTC-USDT".to_string(),
            open,
            high,
            low,
            close,
            volume,
            3,
        )
    }

    #[test]
    fn valid_bar_passes() {
        assert!(bar(100.0, 101.0, 99.0, 100.5, 10.0).validate(0).is_ok());
    }

    #[test]
    fn close_outside_range_is_tolerated() {
        assert!(bar(100.0, 101.0, 99.0, 102.0, 10.0).validate(0).is_ok());
    }

    #[test]
    fn zero_close_is_rejected() {
        let err = bar(100.0, 101.0, 99.0, 0.0, 10.0).validate(4).unwrap_err();
        assert_eq!(
            err,
            MalformedBarError::InvalidPrice {
                index: 4,
                field: "close",
                value: 0.0
            }
        );
    }

    #[test]
    fn inverted_range_is_rejected() {
        let err = bar(100.0, 99.0, 101.0, 100.0, 10.0).validate(0).unwrap_err();
        assert!(matches!(err, MalformedBarError::InvalidHighLow { .. }));
    }

    #[test]
    fn negative_volume_is_rejected() {
        let err = bar(100.0, 101.0, 99.0, 100.0, -1.0).validate(0).unwrap_err();
        assert!(matches!(err, MalformedBarError::InvalidVolume { .. }));
    }
}
