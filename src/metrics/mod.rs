pub mod scorecard;
pub mod timeseries;

pub use scorecard::{Scorecard, SECONDS_PER_YEAR};
pub use timeseries::{drawdowns, max_drawdown};
