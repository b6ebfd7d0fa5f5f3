use crate::data::MalformedBarError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BacktestError {
    #[error("Insufficient data for {symbol}: found {found} bars, need at least {required}")]
    InsufficientData {
        symbol: String,
        found: usize,
        required: usize,
    },
    #[error("Malformed bar data for {symbol}: {source}")]
    MalformedBar {
        symbol: String,
        #[source]
        source: MalformedBarError,
    },
    #[error("Initial capital must be positive and finite, got {0}")]
    InvalidCapital(f64),
    #[error("Lookback of {0} days reaches past the supported calendar")]
    InvalidLookback(u32),
    #[error("Bar source failed for {symbol}")]
    Source {
        symbol: String,
        #[source]
        source: anyhow::Error,
    },
    #[error("Experiment sink failed for {symbol}")]
    Sink {
        symbol: String,
        #[source]
        source: anyhow::Error,
    },
}

impl BacktestError {
    //insufficient data aborts one run without failing a batch
    pub fn is_fatal(&self) -> bool {
        !matches!(self, BacktestError::InsufficientData { .. })
    }
}
