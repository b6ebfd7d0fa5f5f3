use crate::data::{BarSeries, BarSource};
use crate::engine::returns::ReturnFrame;
use crate::error::BacktestError;
use crate::indicators::{IndicatorFrame, LONGEST_WINDOW};
use crate::metrics::Scorecard;
use crate::strategy::{SignalFrame, SignalRule, TechnicalIndicatorRule};
use crate::tracking::{ExperimentSink, RunRecord};
use chrono::{DateTime, Duration, Utc};
use prettytable::{format, Cell, Row, Table};
use rayon::prelude::*;
use tracing::{debug, info, warn};

//artifact names written with every run
pub const PERFORMANCE_ARTIFACT: &str = "strategy_performance.txt";
pub const SAMPLE_ARTIFACT: &str = "sample_data.txt";

//configuration for a backtest
#[derive(Debug, Clone)]
pub struct BacktestConfig {
    //runs with fewer bars abort with InsufficientData
    pub min_bars: usize,
    //leading return rows included in the sample artifact
    pub sample_rows: usize,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        BacktestConfig {
            min_bars: 100,
            sample_rows: 100,
        }
    }
}

//one symbol over the lookback window ending at end_time (now when unset)
#[derive(Debug, Clone, PartialEq)]
pub struct BacktestRequest {
    pub symbol: String,
    pub lookback_days: u32,
    pub initial_capital: f64,
    pub end_time: Option<DateTime<Utc>>,
}

impl BacktestRequest {
    pub fn new<S: Into<String>>(symbol: S, lookback_days: u32, initial_capital: f64) -> Self {
        BacktestRequest {
            symbol: symbol.into(),
            lookback_days,
            initial_capital,
            end_time: None,
        }
    }

    pub fn with_end_time(mut self, end_time: DateTime<Utc>) -> Self {
        self.end_time = Some(end_time);
        self
    }

    //(start, end) of the bar query, None when the start falls outside the calendar
    pub fn window(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let end = self.end_time.unwrap_or_else(Utc::now);
        let start = end.checked_sub_signed(Duration::try_days(i64::from(self.lookback_days))?)?;
        Some((start, end))
    }
}

//result of a backtest
#[derive(Debug, Clone)]
pub struct BacktestResult {
    pub symbol: String,
    //set once the run has been logged to the experiment sink
    pub run_id: Option<String>,
    pub scorecard: Scorecard,
    pub indicators: IndicatorFrame,
    pub signals: SignalFrame,
    pub returns: ReturnFrame,
}

//indicators -> signals -> returns -> scorecard over an already validated series
pub fn evaluate(series: &BarSeries, rule: &dyn SignalRule, initial_capital: f64) -> BacktestResult {
    let indicators = IndicatorFrame::compute(series);
    let signals = SignalFrame::generate(series, &indicators, rule);
    let returns = ReturnFrame::simulate(series, &signals, initial_capital);
    let scorecard = Scorecard::from_returns(&returns);

    BacktestResult {
        symbol: series.symbol().to_string(),
        run_id: None,
        scorecard,
        indicators,
        signals,
        returns,
    }
}

//fetches bars, runs the pipeline and logs the run to the experiment sink
pub struct BacktestEngine<'a> {
    config: BacktestConfig,
    source: &'a dyn BarSource,
    sink: &'a dyn ExperimentSink,
    rule: Box<dyn SignalRule>,
}

impl<'a> BacktestEngine<'a> {
    //creates an engine using the default technical indicator rule
    pub fn new(
        config: BacktestConfig,
        source: &'a dyn BarSource,
        sink: &'a dyn ExperimentSink,
    ) -> Self {
        BacktestEngine {
            config,
            source,
            sink,
            rule: Box::new(TechnicalIndicatorRule::default()),
        }
    }

    pub fn with_rule(mut self, rule: Box<dyn SignalRule>) -> Self {
        self.rule = rule;
        self
    }

    //series shorter than the longest indicator window never produce a scorecard
    fn required_bars(&self) -> usize {
        self.config.min_bars.max(LONGEST_WINDOW)
    }

    pub fn run(&self, request: &BacktestRequest) -> Result<BacktestResult, BacktestError> {
        let symbol = request.symbol.as_str();

        if !request.initial_capital.is_finite() || request.initial_capital <= 0.0 {
            return Err(BacktestError::InvalidCapital(request.initial_capital));
        }

        let (start, end) = request
            .window()
            .ok_or(BacktestError::InvalidLookback(request.lookback_days))?;
        debug!(symbol, %start, %end, "fetching bars");

        let bars = self
            .source
            .fetch_bars(symbol, start, end)
            .map_err(|source| BacktestError::Source {
                symbol: symbol.to_string(),
                source,
            })?;
        info!(symbol, bars = bars.len(), "loaded bars");

        let required = self.required_bars();
        if bars.len() < required {
            warn!(
                symbol,
                found = bars.len(),
                required,
                "not enough data, skipping backtest"
            );
            return Err(BacktestError::InsufficientData {
                symbol: symbol.to_string(),
                found: bars.len(),
                required,
            });
        }

        let series = BarSeries::new(bars).map_err(|source| BacktestError::MalformedBar {
            symbol: symbol.to_string(),
            source,
        })?;

        let mut result = evaluate(&series, self.rule.as_ref(), request.initial_capital);

        let record = self.build_record(request, series.len(), &result);
        let run_id = self
            .sink
            .log_run(&record)
            .map_err(|source| BacktestError::Sink {
                symbol: symbol.to_string(),
                source,
            })?;

        info!(symbol, run_id = %run_id, "backtest completed and logged");
        info!(
            symbol,
            total_return = result.scorecard.total_return,
            sharpe = result.scorecard.sharpe_ratio,
            trades = result.scorecard.total_trades,
            "strategy performance"
        );

        result.run_id = Some(run_id);
        Ok(result)
    }

    //runs independent requests in parallel, results come back in request order
    pub fn run_many(
        &self,
        requests: &[BacktestRequest],
    ) -> Vec<Result<BacktestResult, BacktestError>> {
        requests.par_iter().map(|request| self.run(request)).collect()
    }

    fn build_record(
        &self,
        request: &BacktestRequest,
        bar_count: usize,
        result: &BacktestResult,
    ) -> RunRecord {
        let mut record = RunRecord::new(format!("HFT_Strategy_{}", request.symbol));

        record.log_param("symbol", request.symbol.as_str());
        record.log_param("lookback_window", request.lookback_days);
        record.log_param("initial_capital", request.initial_capital);
        record.log_param("strategy", self.rule.name());
        record.log_param("bar_count", bar_count as i64);

        record.log_metrics(result.scorecard.to_metrics());

        record.log_text(
            PERFORMANCE_ARTIFACT,
            result.scorecard.performance_report(&request.symbol),
        );
        record.log_text(
            SAMPLE_ARTIFACT,
            sample_table(&result.returns, self.config.sample_rows),
        );

        record
    }
}

//leading rows of the return frame as a plain text table
pub fn sample_table(returns: &ReturnFrame, rows: usize) -> String {
    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_CLEAN);
    table.set_titles(Row::new(vec![
        Cell::new("timestamp"),
        Cell::new("close_price"),
        Cell::new("signal"),
        Cell::new("position"),
        Cell::new("strategy_return"),
        Cell::new("cumulative_return"),
    ]));

    for row in returns.rows().iter().take(rows) {
        table.add_row(Row::new(vec![
            Cell::new(&row.timestamp.to_rfc3339()),
            Cell::new(&format!("{:.6}", row.close)),
            Cell::new(&row.signal.to_string()),
            Cell::new(&row.position.to_string()),
            Cell::new(&format!("{:.8}", row.strategy_return)),
            Cell::new(&format!("{:.8}", row.cumulative_return)),
        ]));
    }

    table.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Bar, InMemoryBarSource};
    use crate::indicators::{make_bars, Value};
    use crate::strategy::Signal;
    use crate::tracking::InMemoryExperimentSink;
    use anyhow::anyhow;

    fn wavy(n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| 100.0 + (i as f64 * 0.3).sin() * 2.0 + i as f64 * 0.01)
            .collect()
    }

    fn request_for(bars: &[Bar]) -> BacktestRequest {
        BacktestRequest::new("TEST", 1, 10_000.0).with_end_time(bars[bars.len() - 1].timestamp)
    }

    struct FailingSource;

    impl BarSource for FailingSource {
        fn fetch_bars(
            &self,
            _symbol: &str,
            _start: DateTime<Utc>,
            _end: DateTime<Utc>,
        ) -> anyhow::Result<Vec<Bar>> {
            Err(anyhow!("connection refused"))
        }
    }

    struct FailingSink;

    impl ExperimentSink for FailingSink {
        fn log_run(&self, _record: &RunRecord) -> anyhow::Result<String> {
            Err(anyhow!("tracking server unavailable"))
        }
    }

    //always long
    struct AlwaysLong;

    impl SignalRule for AlwaysLong {
        fn evaluate(&self, _bar: &Bar, _indicators: &crate::indicators::IndicatorRow) -> Signal {
            Signal::Buy
        }

        fn name(&self) -> &str {
            "always_long"
        }
    }

    #[test]
    fn request_window() {
        let end = make_bars(&[1.0])[0].timestamp;
        let (start, stop) = BacktestRequest::new("X", 30, 1.0)
            .with_end_time(end)
            .window()
            .unwrap();
        assert_eq!(stop, end);
        assert_eq!(stop - start, Duration::days(30));
    }

    #[test]
    fn lookback_past_the_calendar_is_rejected() {
        let request = BacktestRequest::new("X", u32::MAX, 1000.0);
        assert!(request.window().is_none());

        let source = InMemoryBarSource::default();
        let sink = InMemoryExperimentSink::new();
        let engine = BacktestEngine::new(BacktestConfig::default(), &source, &sink);
        let err = engine.run(&request).unwrap_err();
        assert!(matches!(err, BacktestError::InvalidLookback(u32::MAX)));
        assert!(err.is_fatal());
    }

    #[test]
    fn empty_fetch_is_insufficient_even_without_a_minimum() {
        let source = InMemoryBarSource::default();
        let sink = InMemoryExperimentSink::new();
        let config = BacktestConfig {
            min_bars: 0,
            ..BacktestConfig::default()
        };
        let engine = BacktestEngine::new(config, &source, &sink);

        let request = BacktestRequest::new("X", 1, 1000.0);
        let err = engine.run(&request).unwrap_err();
        assert!(matches!(
            err,
            BacktestError::InsufficientData {
                found: 0,
                required: LONGEST_WINDOW,
                ..
            }
        ));
        assert!(!err.is_fatal());
        assert!(sink.runs().is_empty());
    }

    #[test]
    fn minimum_never_drops_below_the_longest_window() {
        let bars = make_bars(&wavy(LONGEST_WINDOW - 1));
        let request = request_for(&bars);
        let source = InMemoryBarSource::new(bars);
        let sink = InMemoryExperimentSink::new();
        let config = BacktestConfig {
            min_bars: 5,
            ..BacktestConfig::default()
        };
        let engine = BacktestEngine::new(config.clone(), &source, &sink);
        assert!(matches!(
            engine.run(&request),
            Err(BacktestError::InsufficientData {
                found: 19,
                required: LONGEST_WINDOW,
                ..
            })
        ));

        //exactly the longest window is enough once the minimum allows it
        let bars = make_bars(&wavy(LONGEST_WINDOW));
        let request = request_for(&bars);
        let source = InMemoryBarSource::new(bars);
        let engine = BacktestEngine::new(config, &source, &sink);
        assert!(engine.run(&request).is_ok());
    }

    #[test]
    fn evaluate_is_aligned() {
        let series = BarSeries::new(make_bars(&wavy(50))).unwrap();
        let result = evaluate(&series, &TechnicalIndicatorRule::default(), 1000.0);
        assert_eq!(result.indicators.len(), 50);
        assert_eq!(result.signals.len(), 50);
        assert_eq!(result.returns.len(), 50);
        assert!(result.run_id.is_none());
        assert!(result.scorecard.total_trades <= 49);
    }

    #[test]
    fn short_series_aborts_before_the_pipeline() {
        let bars = make_bars(&wavy(99));
        let request = request_for(&bars);
        let source = InMemoryBarSource::new(bars);
        let sink = InMemoryExperimentSink::new();
        let engine = BacktestEngine::new(BacktestConfig::default(), &source, &sink);

        let err = engine.run(&request).unwrap_err();
        assert!(matches!(
            err,
            BacktestError::InsufficientData {
                found: 99,
                required: 100,
                ..
            }
        ));
        assert!(!err.is_fatal());
        assert!(sink.runs().is_empty());
    }

    #[test]
    fn full_run_logs_params_metrics_and_artifacts() {
        let bars = make_bars(&wavy(150));
        let request = request_for(&bars);
        let source = InMemoryBarSource::new(bars);
        let sink = InMemoryExperimentSink::new();
        let config = BacktestConfig {
            sample_rows: 10,
            ..BacktestConfig::default()
        };
        let engine = BacktestEngine::new(config, &source, &sink);

        let result = engine.run(&request).unwrap();
        assert_eq!(result.run_id.as_deref(), Some("run-1"));

        let runs = sink.runs();
        assert_eq!(runs.len(), 1);
        let record = &runs[0].1;
        assert_eq!(record.run_name(), "HFT_Strategy_TEST");
        assert_eq!(record.params()["symbol"].to_string(), "TEST");
        assert_eq!(record.params()["lookback_window"].to_string(), "1");
        assert_eq!(record.params()["strategy"].to_string(), "Technical_Indicators");
        assert_eq!(record.metrics().len(), 11);
        assert!(record.metrics().values().all(|v| v.is_finite()));
        assert_eq!(
            record.metrics()["total_trades"],
            result.scorecard.total_trades as f64
        );

        let sample = &record.artifact(SAMPLE_ARTIFACT).unwrap().contents;
        //title line plus ten rows
        assert_eq!(sample.lines().count(), 11);
        assert!(sample.lines().next().unwrap().contains("cumulative_return"));
        assert!(record.artifact(PERFORMANCE_ARTIFACT).is_some());
    }

    #[test]
    fn malformed_bar_fails_the_run() {
        let mut bars = make_bars(&wavy(120));
        bars[60].high = bars[60].low - 1.0;
        let request = request_for(&bars);
        let source = InMemoryBarSource::new(bars);
        let sink = InMemoryExperimentSink::new();
        let engine = BacktestEngine::new(BacktestConfig::default(), &source, &sink);

        let err = engine.run(&request).unwrap_err();
        assert!(matches!(err, BacktestError::MalformedBar { .. }));
        assert!(err.is_fatal());
        assert!(sink.runs().is_empty());
    }

    #[test]
    fn collaborator_failures_are_propagated() {
        let bars = make_bars(&wavy(120));
        let request = request_for(&bars);
        let source = InMemoryBarSource::new(bars);
        let sink = InMemoryExperimentSink::new();

        let engine = BacktestEngine::new(BacktestConfig::default(), &FailingSource, &sink);
        assert!(matches!(
            engine.run(&request),
            Err(BacktestError::Source { .. })
        ));

        let engine = BacktestEngine::new(BacktestConfig::default(), &source, &FailingSink);
        assert!(matches!(engine.run(&request), Err(BacktestError::Sink { .. })));
    }

    #[test]
    fn invalid_capital_is_rejected() {
        let source = InMemoryBarSource::default();
        let sink = InMemoryExperimentSink::new();
        let engine = BacktestEngine::new(BacktestConfig::default(), &source, &sink);
        let request = BacktestRequest::new("TEST", 1, 0.0);
        assert!(matches!(
            engine.run(&request),
            Err(BacktestError::InvalidCapital(_))
        ));
    }

    #[test]
    fn custom_rule_drives_positions() {
        let bars = make_bars(&wavy(120));
        let request = request_for(&bars);
        let source = InMemoryBarSource::new(bars);
        let sink = InMemoryExperimentSink::new();
        let engine = BacktestEngine::new(BacktestConfig::default(), &source, &sink)
            .with_rule(Box::new(AlwaysLong));

        let result = engine.run(&request).unwrap();
        //always long from bar 1 tracks buy-and-hold exactly
        let last = result.returns.rows()[result.returns.len() - 1];
        assert!((last.cumulative_return - last.cumulative_price_return).abs() < 1e-9);
        assert_eq!(result.returns.rows()[0].strategy_return, Value::Undefined);
        assert_eq!(sink.runs()[0].1.params()["strategy"].to_string(), "always_long");
    }

    #[test]
    fn run_many_keeps_request_order() {
        let mut bars = make_bars(&wavy(120));
        let end = bars[bars.len() - 1].timestamp;
        for bar in make_bars(&wavy(30)) {
            bars.push(Bar {
                symbol: "SHORT".to_string(),
                ..bar
            });
        }
        let source = InMemoryBarSource::new(bars);
        let sink = InMemoryExperimentSink::new();
        let engine = BacktestEngine::new(BacktestConfig::default(), &source, &sink);

        let requests = vec![
            BacktestRequest::new("TEST", 1, 1000.0).with_end_time(end),
            BacktestRequest::new("SHORT", 1, 1000.0).with_end_time(end),
        ];
        let results = engine.run_many(&requests);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].as_ref().unwrap().symbol, "TEST");
        assert!(matches!(
            results[1],
            Err(BacktestError::InsufficientData { found: 30, .. })
        ));
        assert_eq!(sink.runs().len(), 1);
    }
}
