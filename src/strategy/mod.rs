pub mod technical;

use crate::data::{Bar, BarSeries};
use crate::indicators::{IndicatorFrame, IndicatorRow};
use serde::{Deserialize, Serialize};
use std::fmt;

pub use technical::{SignalThresholds, TechnicalIndicatorRule};

//discrete directional signal, also used for the position held during a bar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Signal {
    Sell,
    #[default]
    Hold,
    Buy,
}

impl Signal {
    //-1 / 0 / +1
    pub fn as_i8(self) -> i8 {
        match self {
            Signal::Sell => -1,
            Signal::Hold => 0,
            Signal::Buy => 1,
        }
    }

    pub fn as_f64(self) -> f64 {
        self.as_i8() as f64
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_i8())
    }
}

//maps one bar's indicator readings to a signal
//implementations must only look at the bar and row they are given
pub trait SignalRule: Send + Sync {
    fn evaluate(&self, bar: &Bar, indicators: &IndicatorRow) -> Signal;

    //label logged with each run
    fn name(&self) -> &str;
}

//per-bar signals plus the position each one produces on the following bar
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignalFrame {
    signals: Vec<Signal>,
    positions: Vec<Signal>,
}

impl SignalFrame {
    //position[0] is flat and position[i] = signal[i - 1], a signal computed on bar i's close
    //can only be held during bar i + 1
    pub fn from_signals(signals: Vec<Signal>) -> Self {
        let positions = std::iter::once(Signal::Hold)
            .chain(signals.iter().copied())
            .take(signals.len())
            .collect();
        SignalFrame { signals, positions }
    }

    //evaluates the rule bar by bar
    pub fn generate(series: &BarSeries, indicators: &IndicatorFrame, rule: &dyn SignalRule) -> Self {
        let signals = series
            .bars()
            .iter()
            .zip(indicators.rows())
            .map(|(bar, row)| rule.evaluate(bar, row))
            .collect();
        Self::from_signals(signals)
    }

    pub fn len(&self) -> usize {
        self.signals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }

    pub fn signals(&self) -> &[Signal] {
        &self.signals
    }

    pub fn positions(&self) -> &[Signal] {
        &self.positions
    }

    pub fn signal(&self, index: usize) -> Option<Signal> {
        self.signals.get(index).copied()
    }

    pub fn position(&self, index: usize) -> Option<Signal> {
        self.positions.get(index).copied()
    }
}
