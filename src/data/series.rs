use crate::data::bar::{Bar, MalformedBarError};
use chrono::{DateTime, Utc};

//ordered bars for a single symbol, validated once at construction
//invariants: non-empty, one symbol, strictly increasing timestamps, every bar passes Bar::validate
#[derive(Debug, Clone, PartialEq)]
pub struct BarSeries {
    symbol: String,
    bars: Vec<Bar>,
}

impl BarSeries {
    //builds a series, rejecting the first bar that breaks an invariant
    pub fn new(bars: Vec<Bar>) -> Result<Self, MalformedBarError> {
        let symbol = match bars.first() {
            Some(first) => first.symbol.clone(),
            None => return Err(MalformedBarError::EmptySeries),
        };

        for (index, bar) in bars.iter().enumerate() {
            bar.validate(index)?;

            if bar.symbol != symbol {
                return Err(MalformedBarError::SymbolMismatch {
                    index,
                    expected: symbol,
                    found: bar.symbol.clone(),
                });
            }

            if index > 0 {
                let previous = bars[index - 1].timestamp;
                if bar.timestamp <= previous {
                    return Err(MalformedBarError::OutOfOrder {
                        index,
                        timestamp: bar.timestamp,
                        previous,
                    });
                }
            }
        }

        Ok(BarSeries { symbol, bars })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Bar> {
        self.bars.get(index)
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn first(&self) -> &Bar {
        &self.bars[0]
    }

    pub fn last(&self) -> &Bar {
        &self.bars[self.bars.len() - 1]
    }

    //bars with start <= timestamp <= end
    pub fn slice_by_time(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> &[Bar] {
        let lo = self.bars.partition_point(|bar| bar.timestamp < start);
        let hi = self.bars.partition_point(|bar| bar.timestamp <= end);
        if lo >= hi {
            return &[];
        }
        &self.bars[lo..hi]
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|bar| bar.close).collect()
    }
}
