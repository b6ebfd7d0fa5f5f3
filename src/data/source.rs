use crate::data::bar::Bar;
use anyhow::Result;
use chrono::{DateTime, Utc};

//supplies bars for (symbol, start, end), sorted ascending by timestamp
//one bar per one-second interval that saw a trade, gaps mean no trade
pub trait BarSource: Send + Sync {
    fn fetch_bars(&self, symbol: &str, start: DateTime<Utc>, end: DateTime<Utc>)
        -> Result<Vec<Bar>>;
}

//bar source over bars already held in memory
#[derive(Debug, Clone, Default)]
pub struct InMemoryBarSource {
    bars: Vec<Bar>,
}

impl InMemoryBarSource {
    pub fn new(bars: Vec<Bar>) -> Self {
        InMemoryBarSource { bars }
    }

    pub fn push(&mut self, bar: Bar) {
        self.bars.push(bar);
    }
}

impl BarSource for InMemoryBarSource {
    fn fetch_bars(
        &self,
        symbol: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Bar>> {
        Ok(select_bars(self.bars.clone(), symbol, start, end))
    }
}

//keeps bars for symbol with start <= timestamp <= end, sorted by timestamp
pub fn select_bars(
    bars: Vec<Bar>,
    symbol: &str,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Vec<Bar> {
    let mut selected: Vec<Bar> = bars
        .into_iter()
        .filter(|bar| bar.symbol == symbol && bar.timestamp >= start && bar.timestamp <= end)
        .collect();
    selected.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
    selected
}
