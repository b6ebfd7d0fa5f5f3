use crate::data::BarSeries;
use crate::indicators::Value;
use crate::strategy::{Signal, SignalFrame};
use chrono::{DateTime, Utc};
use serde::Serialize;

//per-bar strategy and buy-and-hold returns
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ReturnRow {
    pub timestamp: DateTime<Utc>,
    pub close: f64,
    pub signal: Signal,
    pub position: Signal,
    pub price_return: Value,
    pub strategy_return: Value,
    pub cumulative_return: f64,
    pub cumulative_price_return: f64,
    pub portfolio_value: f64,
    pub benchmark_value: f64,
}

impl ReturnRow {
    //both returns defined, i.e. every bar but the first
    pub fn is_defined(&self) -> bool {
        self.price_return.is_defined() && self.strategy_return.is_defined()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReturnFrame {
    initial_capital: f64,
    rows: Vec<ReturnRow>,
}

impl ReturnFrame {
    //frictionless simulation: the position held during bar i earns bar i's close-to-close return
    //closes are positive by the BarSeries invariant so the division never hits zero
    pub fn simulate(series: &BarSeries, signals: &SignalFrame, initial_capital: f64) -> Self {
        let mut rows = Vec::with_capacity(series.len());
        let mut cumulative = 1.0;
        let mut cumulative_price = 1.0;
        let mut prev_close: Option<f64> = None;

        for (i, bar) in series.bars().iter().enumerate() {
            let signal = signals.signal(i).unwrap_or_default();
            let position = signals.position(i).unwrap_or_default();

            let price_return: Value = prev_close.map(|prev| bar.close / prev - 1.0).into();
            let strategy_return = price_return.map(|r| position.as_f64() * r);

            if let Value::Defined(r) = price_return {
                cumulative_price *= 1.0 + r;
            }
            if let Value::Defined(r) = strategy_return {
                cumulative *= 1.0 + r;
            }

            rows.push(ReturnRow {
                timestamp: bar.timestamp,
                close: bar.close,
                signal,
                position,
                price_return,
                strategy_return,
                cumulative_return: cumulative,
                cumulative_price_return: cumulative_price,
                portfolio_value: initial_capital * cumulative,
                benchmark_value: initial_capital * cumulative_price,
            });
            prev_close = Some(bar.close);
        }

        ReturnFrame {
            initial_capital,
            rows,
        }
    }

    pub fn initial_capital(&self) -> f64 {
        self.initial_capital
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[ReturnRow] {
        &self.rows
    }

    //rows with undefined returns dropped
    pub fn defined_rows(&self) -> impl Iterator<Item = &ReturnRow> + '_ {
        self.rows.iter().filter(|row| row.is_defined())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_bars, DEFAULT_EPSILON};

    fn simulate(closes: &[f64], signals: Vec<Signal>, capital: f64) -> ReturnFrame {
        let series = BarSeries::new(make_bars(closes)).unwrap();
        ReturnFrame::simulate(&series, &SignalFrame::from_signals(signals), capital)
    }

    #[test]
    fn first_bar_has_no_return() {
        let frame = simulate(&[100.0, 110.0], vec![Signal::Buy, Signal::Buy], 1000.0);
        let first = frame.rows()[0];
        assert_eq!(first.price_return, Value::Undefined);
        assert_eq!(first.strategy_return, Value::Undefined);
        assert_eq!(first.cumulative_return, 1.0);
        assert_eq!(first.portfolio_value, 1000.0);
        assert!(!first.is_defined());
        assert_eq!(frame.defined_rows().count(), 1);
    }

    #[test]
    fn long_position_earns_next_bar_return() {
        //buy on bar 0 is held during bar 1
        let frame = simulate(
            &[100.0, 110.0, 99.0],
            vec![Signal::Buy, Signal::Sell, Signal::Hold],
            1000.0,
        );
        let rows = frame.rows();
        assert_approx(rows[1].price_return.unwrap_or(f64::NAN), 0.1, DEFAULT_EPSILON);
        assert_approx(rows[1].strategy_return.unwrap_or(f64::NAN), 0.1, DEFAULT_EPSILON);
        //short during bar 2 earns the negated -10%
        assert_approx(rows[2].price_return.unwrap_or(f64::NAN), -0.1, DEFAULT_EPSILON);
        assert_approx(rows[2].strategy_return.unwrap_or(f64::NAN), 0.1, DEFAULT_EPSILON);
        assert_approx(rows[2].cumulative_return, 1.21, DEFAULT_EPSILON);
        assert_approx(rows[2].cumulative_price_return, 0.99, DEFAULT_EPSILON);
        assert_approx(rows[2].portfolio_value, 1210.0, 1e-9);
        assert_approx(rows[2].benchmark_value, 990.0, 1e-9);
    }

    #[test]
    fn flat_strategy_keeps_capital() {
        let closes: Vec<f64> = (0..30).map(|i| 100.0 + (i as f64).cos() * 5.0).collect();
        let frame = simulate(&closes, vec![Signal::Hold; 30], 2500.0);
        for row in frame.rows() {
            assert_eq!(row.portfolio_value, 2500.0);
        }
        assert_eq!(frame.initial_capital(), 2500.0);
    }

    #[test]
    fn same_bar_signal_does_not_leak_into_its_return() {
        //a buy on the bar of a big jump must not earn that jump
        let frame = simulate(
            &[100.0, 100.0, 200.0],
            vec![Signal::Hold, Signal::Hold, Signal::Buy],
            1.0,
        );
        assert_eq!(frame.rows()[2].strategy_return, Value::Defined(0.0));
    }
}
