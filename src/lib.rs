//a Rust-based technical-indicator strategy backtester for one-second bars

pub mod config;
pub mod data;
pub mod engine;
pub mod error;
pub mod indicators;
pub mod metrics;
pub mod strategy;
pub mod tracking;

//prelude module for convenient imports
pub mod prelude {
    pub use crate::config::BacktestConfiguration;
    pub use crate::data::{load_csv, Bar, BarSeries, BarSource, CsvBarSource, InMemoryBarSource};
    pub use crate::engine::{
        evaluate, BacktestConfig, BacktestEngine, BacktestRequest, BacktestResult, ReturnFrame,
    };
    pub use crate::error::BacktestError;
    pub use crate::indicators::{IndicatorFrame, IndicatorRow, Value};
    pub use crate::metrics::Scorecard;
    pub use crate::strategy::{
        Signal, SignalFrame, SignalRule, SignalThresholds, TechnicalIndicatorRule,
    };
    pub use crate::tracking::{ExperimentSink, FileExperimentSink, RunRecord};
}
