//! Breakout signal generation.
//!
//! A bar whose close breaks above the previous bar's fractal high opens a long;
//! a close below the previous fractal low opens a short. Stops sit on the
//! opposite fractal level and targets are R times the stop distance away.

use std::fmt;

use chrono::NaiveDateTime;
use tracing::debug;

use super::bar::{Bar, PriceSeries};
use super::fractal::{FractalLevel, FractalSeries};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Long,
    Short,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Long => write!(f, "BUY"),
            Direction::Short => write!(f, "SELL"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Signal {
    pub index: usize,
    pub timestamp: NaiveDateTime,
    pub direction: Direction,
    pub entry_price: f64,
    pub stop_price: f64,
    pub target_price: f64,
    pub lot_size: f64,
}

impl Signal {
    /// |entry - stop|
    pub fn risk_distance(&self) -> f64 {
        (self.entry_price - self.stop_price).abs()
    }
}

/// Check one bar against the previous bar's fractal level.
///
/// Long is checked first; short only when long does not fire. A signal whose
/// stop lands on the entry is dropped. Levels from
/// [`detect_fractals`](super::fractal::detect_fractals) always have
/// `low <= high`, so only hand-built levels can hit that case.
pub fn breakout_signal(
    index: usize,
    bar: &Bar,
    prev: &FractalLevel,
    reward_risk_ratio: f64,
    lot_size: f64,
) -> Option<Signal> {
    let entry = bar.close;
    let (direction, stop, target) = if entry > prev.high {
        let stop = entry - (entry - prev.low);
        (Direction::Long, stop, entry + reward_risk_ratio * (entry - stop))
    } else if entry < prev.low {
        let stop = entry + (prev.high - entry);
        (Direction::Short, stop, entry - reward_risk_ratio * (stop - entry))
    } else {
        return None;
    };

    let signal = Signal {
        index,
        timestamp: bar.timestamp,
        direction,
        entry_price: entry,
        stop_price: stop,
        target_price: target,
        lot_size,
    };

    if signal.risk_distance() == 0.0 {
        debug!(index, %direction, entry, "dropping zero-risk signal");
        return None;
    }
    Some(signal)
}

/// Scan every bar that has a fractal level on the bar before it.
pub fn generate_signals(
    series: &PriceSeries,
    fractals: &FractalSeries,
    reward_risk_ratio: f64,
    lot_size: f64,
) -> Vec<Signal> {
    let bars = series.bars();
    (fractals.warmup() + 1..bars.len())
        .filter_map(|i| {
            let prev = fractals.get(i - 1)?;
            breakout_signal(i, &bars[i], prev, reward_risk_ratio, lot_size)
        })
        .collect()
}
