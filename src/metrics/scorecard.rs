use crate::engine::returns::ReturnFrame;
use crate::metrics::timeseries::max_drawdown;
use indexmap::IndexMap;
use prettytable::{Cell, Row, Table};
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use std::fmt::Write;

//bars are one second apart: 252 trading days of 24h
pub const SECONDS_PER_YEAR: f64 = 252.0 * 24.0 * 3600.0;

//performance summary of one backtest run
//every field is finite: degenerate cases (empty sample, zero variance, no trades, no losses)
//resolve to 0 instead of NaN/Inf
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scorecard {
    pub total_return: f64,
    pub benchmark_return: f64,
    pub excess_return: f64,
    pub volatility: f64,
    pub sharpe_ratio: f64,
    pub max_drawdown: f64,
    pub win_rate: f64,
    pub avg_win: f64,
    pub avg_loss: f64,
    pub profit_factor: f64,
    pub total_trades: usize,
}

impl Scorecard {
    //computes the scorecard over rows with defined returns, an empty sample gives the all-zero card
    pub fn from_returns(frame: &ReturnFrame) -> Self {
        let rows: Vec<_> = frame.defined_rows().collect();
        let last = match rows.last() {
            Some(row) => *row,
            None => return Scorecard::default(),
        };

        let strategy_returns: Vec<f64> = rows
            .iter()
            .filter_map(|row| row.strategy_return.get())
            .collect();
        let cumulative: Vec<f64> = rows.iter().map(|row| row.cumulative_return).collect();

        let total_return = finite_or_zero(last.cumulative_return - 1.0);
        let benchmark_return = finite_or_zero(last.cumulative_price_return - 1.0);

        let returns: &[f64] = &strategy_returns;
        let mean = returns.mean();
        let std_dev = returns.std_dev();

        let volatility = finite_or_zero(std_dev * SECONDS_PER_YEAR.sqrt());
        let sharpe_ratio = if std_dev.is_finite() && std_dev > 0.0 {
            finite_or_zero((mean * SECONDS_PER_YEAR) / (std_dev * SECONDS_PER_YEAR.sqrt()))
        } else {
            0.0
        };

        let trade_stats = TradeStats::from_returns(returns);

        Scorecard {
            total_return,
            benchmark_return,
            excess_return: finite_or_zero(total_return - benchmark_return),
            volatility,
            sharpe_ratio,
            max_drawdown: finite_or_zero(max_drawdown(&cumulative)),
            win_rate: trade_stats.win_rate,
            avg_win: trade_stats.avg_win,
            avg_loss: trade_stats.avg_loss,
            profit_factor: trade_stats.profit_factor,
            total_trades: trade_stats.total_trades,
        }
    }

    //flat metric map for the experiment sink, in a stable order
    pub fn to_metrics(&self) -> IndexMap<String, f64> {
        let mut metrics = IndexMap::new();
        metrics.insert("total_return".to_string(), self.total_return);
        metrics.insert("benchmark_return".to_string(), self.benchmark_return);
        metrics.insert("excess_return".to_string(), self.excess_return);
        metrics.insert("volatility".to_string(), self.volatility);
        metrics.insert("sharpe_ratio".to_string(), self.sharpe_ratio);
        metrics.insert("max_drawdown".to_string(), self.max_drawdown);
        metrics.insert("win_rate".to_string(), self.win_rate);
        metrics.insert("avg_win".to_string(), self.avg_win);
        metrics.insert("avg_loss".to_string(), self.avg_loss);
        metrics.insert("profit_factor".to_string(), self.profit_factor);
        metrics.insert("total_trades".to_string(), self.total_trades as f64);
        metrics
    }

    //headline figures as plain text
    pub fn performance_report(&self, symbol: &str) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Strategy Performance for {}", symbol);
        let _ = writeln!(out, "Total Return: {:.4}", self.total_return);
        let _ = writeln!(out, "Benchmark Return: {:.4}", self.benchmark_return);
        let _ = writeln!(out, "Excess Return: {:.4}", self.excess_return);
        let _ = writeln!(out, "Sharpe Ratio: {:.4}", self.sharpe_ratio);
        let _ = writeln!(out, "Max Drawdown: {:.4}", self.max_drawdown);
        let _ = writeln!(out, "Win Rate: {:.4}", self.win_rate);
        let _ = writeln!(out, "Total Trades: {}", self.total_trades);
        out
    }

    pub fn to_table(&self) -> Table {
        let mut table = Table::new();

        table.add_row(Row::new(vec![Cell::new("Metric"), Cell::new("Value")]));

        let pct = |x: f64| format!("{:.4}%", x * 100.0);
        let rows = [
            ("Total Return", pct(self.total_return)),
            ("Benchmark Return", pct(self.benchmark_return)),
            ("Excess Return", pct(self.excess_return)),
            ("Volatility (ann.)", format!("{:.4}", self.volatility)),
            ("Sharpe Ratio", format!("{:.3}", self.sharpe_ratio)),
            ("Max Drawdown", pct(self.max_drawdown)),
            ("Win Rate", format!("{:.2}%", self.win_rate * 100.0)),
            ("Avg Win", pct(self.avg_win)),
            ("Avg Loss", pct(self.avg_loss)),
            ("Profit Factor", format!("{:.3}", self.profit_factor)),
            ("Total Trades", format!("{}", self.total_trades)),
        ];

        for (name, value) in rows {
            table.add_row(Row::new(vec![Cell::new(name), Cell::new(&value)]));
        }

        table
    }

    //prints metrics in a formatted table
    pub fn pretty_print_table(&self) {
        self.to_table().printstd();
    }
}

fn finite_or_zero(x: f64) -> f64 {
    if x.is_finite() {
        x
    } else {
        0.0
    }
}

//a "trade" is any bar with a non-zero strategy return
struct TradeStats {
    total_trades: usize,
    win_rate: f64,
    avg_win: f64,
    avg_loss: f64,
    profit_factor: f64,
}

impl TradeStats {
    fn from_returns(returns: &[f64]) -> Self {
        let winning: Vec<f64> = returns.iter().filter(|&&r| r > 0.0).copied().collect();
        let losing: Vec<f64> = returns.iter().filter(|&&r| r < 0.0).copied().collect();
        let total_trades = returns.iter().filter(|&&r| r != 0.0).count();

        let win_rate = if total_trades > 0 {
            winning.len() as f64 / total_trades as f64
        } else {
            0.0
        };

        let avg_win = if !winning.is_empty() {
            winning.iter().sum::<f64>() / winning.len() as f64
        } else {
            0.0
        };

        let avg_loss = if !losing.is_empty() {
            losing.iter().sum::<f64>() / losing.len() as f64
        } else {
            0.0
        };

        //ratio of average win to average loss, not gross profit over gross loss
        let profit_factor = if avg_loss != 0.0 {
            (avg_win / avg_loss).abs()
        } else {
            0.0
        };

        TradeStats {
            total_trades,
            win_rate: finite_or_zero(win_rate),
            avg_win: finite_or_zero(avg_win),
            avg_loss: finite_or_zero(avg_loss),
            profit_factor: finite_or_zero(profit_factor),
        }
    }
}
