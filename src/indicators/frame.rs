use crate::data::{Bar, BarSeries};
use crate::indicators::rolling::{Ema, RollingWindow};
use crate::indicators::value::Value;
use serde::{Deserialize, Serialize};

pub const SMA_FAST_WINDOW: usize = 5;
pub const SMA_SLOW_WINDOW: usize = 20;
pub const EMA_FAST_SPAN: usize = 12;
pub const EMA_SLOW_SPAN: usize = 26;
pub const MACD_SIGNAL_SPAN: usize = 9;
pub const RSI_WINDOW: usize = 14;
pub const BOLLINGER_WINDOW: usize = 20;
pub const BOLLINGER_MULTIPLIER: f64 = 2.0;
pub const VOLUME_WINDOW: usize = 20;
pub const MOMENTUM_SHORT: usize = 5;
pub const MOMENTUM_LONG: usize = 10;

//largest lookback of any windowed indicator
pub const LONGEST_WINDOW: usize = 20;

//indicator readings for one bar
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct IndicatorRow {
    pub sma_5: Value,
    pub sma_20: Value,
    pub ema_12: Value,
    pub ema_26: Value,
    pub macd: Value,
    pub macd_signal: Value,
    pub macd_histogram: Value,
    pub rsi: Value,
    pub bb_middle: Value,
    pub bb_upper: Value,
    pub bb_lower: Value,
    pub bb_width: Value,
    pub bb_position: Value,
    pub volume_sma: Value,
    pub volume_ratio: Value,
    pub momentum_5: Value,
    pub momentum_10: Value,
}

//indicator rows aligned 1:1 with a bar series
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorFrame {
    rows: Vec<IndicatorRow>,
}

impl IndicatorFrame {
    //computes every indicator over the series, each row uses only bars up to and including its own
    pub fn compute(series: &BarSeries) -> Self {
        let mut calculator = IndicatorCalculator::new();
        let rows = series
            .bars()
            .iter()
            .map(|bar| calculator.update(bar))
            .collect();
        IndicatorFrame { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&IndicatorRow> {
        self.rows.get(index)
    }

    pub fn rows(&self) -> &[IndicatorRow] {
        &self.rows
    }
}

//streaming calculator, one update per bar in series order
//rolling windows are counted in bars, not wall-clock seconds, so gaps in the tape are not filled
#[derive(Debug, Clone)]
pub struct IndicatorCalculator {
    sma_fast: RollingWindow,
    sma_slow: RollingWindow,
    ema_fast: Ema,
    ema_slow: Ema,
    macd_signal: Ema,
    gains: RollingWindow,
    losses: RollingWindow,
    volumes: RollingWindow,
    closes: RollingWindow,
    prev_close: Option<f64>,
}

impl IndicatorCalculator {
    pub fn new() -> Self {
        IndicatorCalculator {
            sma_fast: RollingWindow::new(SMA_FAST_WINDOW),
            sma_slow: RollingWindow::new(SMA_SLOW_WINDOW.max(BOLLINGER_WINDOW)),
            ema_fast: Ema::new(EMA_FAST_SPAN),
            ema_slow: Ema::new(EMA_SLOW_SPAN),
            macd_signal: Ema::new(MACD_SIGNAL_SPAN),
            gains: RollingWindow::new(RSI_WINDOW),
            losses: RollingWindow::new(RSI_WINDOW),
            volumes: RollingWindow::new(VOLUME_WINDOW),
            closes: RollingWindow::new(MOMENTUM_LONG + 1),
            prev_close: None,
        }
    }

    pub fn update(&mut self, bar: &Bar) -> IndicatorRow {
        let close = bar.close;

        self.sma_fast.push(close);
        self.sma_slow.push(close);
        self.volumes.push(bar.volume);
        self.closes.push(close);

        if let Some(prev) = self.prev_close {
            let delta = close - prev;
            self.gains.push(delta.max(0.0));
            self.losses.push((-delta).max(0.0));
        }
        self.prev_close = Some(close);

        let ema_12 = self.ema_fast.update(close);
        let ema_26 = self.ema_slow.update(close);
        let macd = ema_12 - ema_26;
        let macd_signal = self.macd_signal.update(macd);

        let sma_20 = self.sma_slow.mean();
        let band = self
            .sma_slow
            .std_dev()
            .map(|sd| BOLLINGER_MULTIPLIER * sd);
        let bb_upper = sma_20.zip_with(band, |mid, b| mid + b);
        let bb_lower = sma_20.zip_with(band, |mid, b| mid - b);
        let bb_width = bb_upper.zip_with(bb_lower, |u, l| u - l);
        let bb_position = bb_lower
            .map(|l| close - l)
            .ratio(bb_width);

        let volume_sma = self.volumes.mean();
        let volume_ratio = Value::new(bar.volume).ratio(volume_sma);

        IndicatorRow {
            sma_5: self.sma_fast.mean(),
            sma_20,
            ema_12: Value::new(ema_12),
            ema_26: Value::new(ema_26),
            macd: Value::new(macd),
            macd_signal: Value::new(macd_signal),
            macd_histogram: Value::new(macd - macd_signal),
            rsi: self.rsi(),
            bb_middle: sma_20,
            bb_upper,
            bb_lower,
            bb_width,
            bb_position,
            volume_sma,
            volume_ratio,
            momentum_5: self.momentum(MOMENTUM_SHORT),
            momentum_10: self.momentum(MOMENTUM_LONG),
        }
    }

    //100 whenever the average loss is zero, including a flat window
    fn rsi(&self) -> Value {
        match (self.gains.mean(), self.losses.mean()) {
            (Value::Defined(_), Value::Defined(avg_loss)) if avg_loss == 0.0 => {
                Value::Defined(100.0)
            }
            (avg_gain, avg_loss) => avg_gain
                .ratio(avg_loss)
                .map(|rs| 100.0 - 100.0 / (1.0 + rs)),
        }
    }

    fn momentum(&self, k: usize) -> Value {
        self.closes
            .lag(0)
            .ratio(self.closes.lag(k))
            .map(|r| r - 1.0)
    }
}

impl Default for IndicatorCalculator {
    fn default() -> Self {
        Self::new()
    }
}
