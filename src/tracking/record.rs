use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

//a logged parameter value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Text(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Text(value)
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        ParamValue::Float(value)
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        ParamValue::Integer(value)
    }
}

impl From<u32> for ParamValue {
    fn from(value: u32) -> Self {
        ParamValue::Integer(i64::from(value))
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Integer(v) => write!(f, "{}", v),
            ParamValue::Float(v) => write!(f, "{}", v),
            ParamValue::Text(v) => write!(f, "{}", v),
        }
    }
}

//a small named text file attached to a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
    pub name: String,
    pub contents: String,
}

//everything one backtest hands to the experiment sink
//metrics are guaranteed finite: log_metric refuses NaN and Inf
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RunRecord {
    run_name: String,
    params: IndexMap<String, ParamValue>,
    metrics: IndexMap<String, f64>,
    artifacts: Vec<Artifact>,
}

impl RunRecord {
    pub fn new<S: Into<String>>(run_name: S) -> Self {
        RunRecord {
            run_name: run_name.into(),
            ..RunRecord::default()
        }
    }

    pub fn log_param<K: Into<String>, V: Into<ParamValue>>(&mut self, key: K, value: V) {
        self.params.insert(key.into(), value.into());
    }

    //returns false and drops the metric when value is NaN or Inf
    pub fn log_metric<K: Into<String>>(&mut self, key: K, value: f64) -> bool {
        let key = key.into();
        if !value.is_finite() {
            warn!(metric = %key, value, "dropping non-finite metric");
            return false;
        }
        self.metrics.insert(key, value);
        true
    }

    pub fn log_metrics<I: IntoIterator<Item = (String, f64)>>(&mut self, metrics: I) {
        for (key, value) in metrics {
            self.log_metric(key, value);
        }
    }

    pub fn log_text<N: Into<String>, C: Into<String>>(&mut self, name: N, contents: C) {
        self.artifacts.push(Artifact {
            name: name.into(),
            contents: contents.into(),
        });
    }

    pub fn run_name(&self) -> &str {
        &self.run_name
    }

    pub fn params(&self) -> &IndexMap<String, ParamValue> {
        &self.params
    }

    pub fn metrics(&self) -> &IndexMap<String, f64> {
        &self.metrics
    }

    pub fn artifacts(&self) -> &[Artifact] {
        &self.artifacts
    }

    pub fn artifact(&self, name: &str) -> Option<&Artifact> {
        self.artifacts.iter().find(|a| a.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_finite_metrics_are_dropped() {
        let mut record = RunRecord::new("run");
        assert!(record.log_metric("sharpe_ratio", 1.5));
        assert!(!record.log_metric("volatility", f64::NAN));
        assert!(!record.log_metric("profit_factor", f64::INFINITY));
        assert_eq!(record.metrics().len(), 1);
        assert_eq!(record.metrics()["sharpe_ratio"], 1.5);
    }

    #[test]
    fn params_keep_insertion_order() {
        let mut record = RunRecord::new("run");
        record.log_param("symbol", "BTC-USDT");
        record.log_param("lookback_window", 30_i64);
        record.log_param("initial_capital", 10_000.0);
        let keys: Vec<&String> = record.params().keys().collect();
        assert_eq!(keys, vec!["symbol", "lookback_window", "initial_capital"]);
        assert_eq!(record.params()["symbol"].to_string(), "BTC-USDT");
    }

    #[test]
    fn params_serialize_untagged() {
        let mut record = RunRecord::new("run");
        record.log_param("a", 1_i64);
        record.log_param("b", 2.5);
        record.log_param("c", "x");
        let json = serde_json::to_string(record.params()).unwrap();
        assert_eq!(json, r#"{"a":1,"b":2.5,"c":"x"}"#);
    }

    #[test]
    fn artifacts_by_name() {
        let mut record = RunRecord::new("run");
        record.log_text("sample_data.txt", "rows");
        assert_eq!(record.artifact("sample_data.txt").map(|a| a.contents.as_str()), Some("rows"));
        assert!(record.artifact("missing.txt").is_none());
    }
}
