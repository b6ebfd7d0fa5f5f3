pub mod backtest;
pub mod returns;

pub use backtest::{evaluate, BacktestConfig, BacktestEngine, BacktestRequest, BacktestResult};
pub use returns::{ReturnFrame, ReturnRow};
