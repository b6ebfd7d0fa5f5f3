use crate::engine::{BacktestConfig, BacktestRequest};
use crate::strategy::{SignalThresholds, TechnicalIndicatorRule};
use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

//complete backtest configuration, missing fields in a file fall back to the defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestConfiguration {
    //data
    pub data_path: PathBuf,
    pub symbols: Vec<String>,
    pub lookback_days: u32,
    //end of the lookback window, now when unset
    pub end_time: Option<DateTime<Utc>>,

    //account settings
    pub initial_capital: f64,

    //run settings
    pub min_bars: usize,
    pub sample_rows: usize,

    //strategy
    pub thresholds: SignalThresholds,

    //experiment sink root
    pub output_dir: PathBuf,
}

impl Default for BacktestConfiguration {
    fn default() -> Self {
        let engine = BacktestConfig::default();
        BacktestConfiguration {
            data_path: PathBuf::from("bars.csv"),
            symbols: vec![
                "BTC-USDT".to_string(),
                "ETH-USDT".to_string(),
                "SOL-USDT".to_string(),
            ],
            lookback_days: 30,
            end_time: None,
            initial_capital: 10000.0,
            min_bars: engine.min_bars,
            sample_rows: engine.sample_rows,
            thresholds: SignalThresholds::default(),
            output_dir: PathBuf::from("runs"),
        }
    }
}

impl BacktestConfiguration {
    //load configuration from a JSON file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .context(format!("Failed to read config file {:?}", path))?;
        let config: BacktestConfiguration = serde_json::from_str(&contents)
            .context(format!("Failed to parse config file {:?}", path))?;
        Ok(config)
    }

    //save configuration to a JSON file
    pub fn to_json_file<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), json)
            .context(format!("Failed to write config file {:?}", path.as_ref()))?;
        Ok(())
    }

    pub fn engine_config(&self) -> BacktestConfig {
        BacktestConfig {
            min_bars: self.min_bars,
            sample_rows: self.sample_rows,
        }
    }

    pub fn rule(&self) -> TechnicalIndicatorRule {
        TechnicalIndicatorRule::new(self.thresholds.clone())
    }

    //one request per configured symbol
    pub fn requests(&self) -> Vec<BacktestRequest> {
        self.symbols
            .iter()
            .map(|symbol| {
                let request =
                    BacktestRequest::new(symbol.as_str(), self.lookback_days, self.initial_capital);
                match self.end_time {
                    Some(end) => request.with_end_time(end),
                    None => request,
                }
            })
            .collect()
    }
}
