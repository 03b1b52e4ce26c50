#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime};
pub use fractalshift::domain::bar::{Bar, PriceSeries};
use fractalshift::domain::backtest::BacktestConfig;
use fractalshift::domain::error::FractalShiftError;
use fractalshift::ports::data_port::DataPort;
use std::collections::HashMap;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<Bar>>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, symbol: &str, bars: Vec<Bar>) -> Self {
        self.data.insert(symbol.to_string(), bars);
        self
    }
}

impl DataPort for MockDataPort {
    fn load_series(&self, symbol: &str) -> Result<PriceSeries, FractalShiftError> {
        let bars = self
            .data
            .get(symbol)
            .cloned()
            .ok_or_else(|| FractalShiftError::DataLoad {
                path: symbol.to_string(),
                reason: "no such symbol".into(),
            })?;
        PriceSeries::new(symbol, bars)
    }
}

pub fn ts(i: usize) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
        + chrono::Duration::hours(i as i64)
}

pub fn make_bar(i: usize, low: f64, high: f64, close: f64) -> Bar {
    Bar {
        timestamp: ts(i),
        open: close,
        high,
        low,
        close,
        volume: 100.0,
    }
}

/// `len` bars closing at 100 inside a 99-101 range.
pub fn flat_bars(len: usize) -> Vec<Bar> {
    (0..len).map(|i| make_bar(i, 99.0, 101.0, 100.0)).collect()
}

pub fn series(bars: Vec<Bar>) -> PriceSeries {
    PriceSeries::new("XAUUSD", bars).unwrap()
}

pub fn sample_config() -> BacktestConfig {
    BacktestConfig {
        reward_risk_ratio: 2.0,
        ..BacktestConfig::default()
    }
}

/// Deterministic zig-zag series with regular breakouts in both directions.
pub fn wave_bars(len: usize) -> Vec<Bar> {
    (0..len)
        .map(|i| {
            let mid = 100.0 + (i as f64 * 0.45).sin() * 6.0 + (i as f64 * 0.11).cos() * 3.0;
            make_bar(i, mid - 1.2, mid + 1.2, mid + 0.4)
        })
        .collect()
}
