//! OHLC bar representation and the validated price series.

use chrono::NaiveDateTime;

use super::error::FractalShiftError;

#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    /// Check price sanity: finite values, high on top, low at the bottom.
    pub fn validate(&self) -> Result<(), String> {
        let prices = [self.open, self.high, self.low, self.close];
        if prices.iter().any(|p| !p.is_finite()) {
            return Err("non-finite price".to_string());
        }
        if self.high < self.open.max(self.close).max(self.low) {
            return Err(format!(
                "high {} below max(open {}, close {}, low {})",
                self.high, self.open, self.close, self.low
            ));
        }
        if self.low > self.open.min(self.close).min(self.high) {
            return Err(format!(
                "low {} above min(open {}, close {}, high {})",
                self.low, self.open, self.close, self.high
            ));
        }
        Ok(())
    }
}

/// Time-ordered, validated sequence of bars. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    symbol: String,
    bars: Vec<Bar>,
}

impl PriceSeries {
    /// Build a series, rejecting the first bar that breaks OHLC ordering or
    /// does not strictly follow its predecessor in time.
    pub fn new(symbol: impl Into<String>, bars: Vec<Bar>) -> Result<Self, FractalShiftError> {
        for (index, bar) in bars.iter().enumerate() {
            bar.validate()
                .map_err(|reason| FractalShiftError::MalformedBar { index, reason })?;
        }

        for (index, pair) in bars.windows(2).enumerate() {
            if pair[1].timestamp <= pair[0].timestamp {
                return Err(FractalShiftError::MalformedBar {
                    index: index + 1,
                    reason: format!(
                        "timestamp {} does not follow {}",
                        pair[1].timestamp, pair[0].timestamp
                    ),
                });
            }
        }

        Ok(PriceSeries {
            symbol: symbol.into(),
            bars,
        })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn get(&self, index: usize) -> Option<&Bar> {
        self.bars.get(index)
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn first_timestamp(&self) -> Option<NaiveDateTime> {
        self.bars.first().map(|b| b.timestamp)
    }

    pub fn last_timestamp(&self) -> Option<NaiveDateTime> {
        self.bars.last().map(|b| b.timestamp)
    }
}
