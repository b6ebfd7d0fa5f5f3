use crate::data::Bar;
use crate::indicators::{IndicatorRow, Value};
use crate::strategy::{Signal, SignalRule};
use serde::{Deserialize, Serialize};

//thresholds for the technical indicator rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalThresholds {
    pub rsi_overbought: f64,
    pub rsi_oversold: f64,
    pub bb_upper: f64,
    pub bb_lower: f64,
    pub volume_surge: f64,
    pub volume_dry: f64,
}

impl Default for SignalThresholds {
    fn default() -> Self {
        SignalThresholds {
            rsi_overbought: 70.0,
            rsi_oversold: 30.0,
            bb_upper: 0.8,
            bb_lower: 0.2,
            volume_surge: 1.2,
            volume_dry: 0.8,
        }
    }
}

//trend + momentum + volume confirmation rule
//buy when every bullish condition holds, sell when any bearish condition holds
//sell is applied after buy and wins when both fire; with the default thresholds
//"rsi above oversold" is true on most bars, so most defined bars end up sell.
//this asymmetry is kept as is pending product review
//a condition with an undefined input is false
#[derive(Debug, Clone, Default)]
pub struct TechnicalIndicatorRule {
    thresholds: SignalThresholds,
}

impl TechnicalIndicatorRule {
    pub const NAME: &'static str = "Technical_Indicators";

    pub fn new(thresholds: SignalThresholds) -> Self {
        TechnicalIndicatorRule { thresholds }
    }

    pub fn thresholds(&self) -> &SignalThresholds {
        &self.thresholds
    }

    pub fn is_buy(&self, bar: &Bar, row: &IndicatorRow) -> bool {
        let t = &self.thresholds;
        let close = Value::new(bar.close);

        close.gt(row.sma_20)
            && row.macd.gt(row.macd_signal)
            && row.rsi.below(t.rsi_overbought)
            && row.bb_position.below(t.bb_upper)
            && row.volume_ratio.above(t.volume_surge)
    }

    pub fn is_sell(&self, bar: &Bar, row: &IndicatorRow) -> bool {
        let t = &self.thresholds;
        let close = Value::new(bar.close);

        close.lt(row.sma_20)
            || row.macd.lt(row.macd_signal)
            || row.rsi.above(t.rsi_oversold)
            || row.bb_position.above(t.bb_lower)
            || row.volume_ratio.below(t.volume_dry)
    }
}

impl SignalRule for TechnicalIndicatorRule {
    fn evaluate(&self, bar: &Bar, indicators: &IndicatorRow) -> Signal {
        let mut signal = Signal::Hold;
        if self.is_buy(bar, indicators) {
            signal = Signal::Buy;
        }
        if self.is_sell(bar, indicators) {
            signal = Signal::Sell;
        }
        signal
    }

    fn name(&self) -> &str {
        Self::NAME
    }
}
