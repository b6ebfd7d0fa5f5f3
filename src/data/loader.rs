use crate::data::bar::Bar;
use crate::data::source::{select_bars, BarSource};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use csv::ReaderBuilder;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
struct CsvRecord {
    timestamp: String,
    symbol: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
    #[serde(default)]
    trade_count: u64,
}

//loads bars from a csv file with header timestamp,symbol,open,high,low,close,volume,trade_count
pub fn load_csv<P: AsRef<Path>>(path: P) -> Result<Vec<Bar>> {
    let path = path.as_ref();
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .context(format!("Failed to open CSV file: {:?}", path))?;

    let mut bars = Vec::new();

    for (index, result) in reader.deserialize().enumerate() {
        let record: CsvRecord =
            result.context(format!("Failed to parse CSV record at line {}", index + 2))?;

        let timestamp = DateTime::parse_from_rfc3339(&record.timestamp)
            .context(format!(
                "Failed to parse timestamp '{}' at line {}",
                record.timestamp,
                index + 2
            ))?
            .with_timezone(&Utc);

        bars.push(Bar::new(
            timestamp,
            record.symbol,
            record.open,
            record.high,
            record.low,
            record.close,
            record.volume,
            record.trade_count,
        ));
    }

    Ok(bars)
}

//bar source backed by a csv file, re-read on every query
#[derive(Debug, Clone)]
pub struct CsvBarSource {
    path: PathBuf,
}

impl CsvBarSource {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        CsvBarSource { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl BarSource for CsvBarSource {
    fn fetch_bars(
        &self,
        symbol: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Bar>> {
        let bars = load_csv(&self.path)?;
        Ok(select_bars(bars, symbol, start, end))
    }
}
