//! Trade outcome resolution.
//!
//! Each signal is checked against the bars `[index, index + horizon)`, the
//! signal bar included. The whole window is tested at once: if the target is
//! touched anywhere in it the trade is a take-profit, even when the stop is
//! touched earlier or on the same bar. This is optimistic and intentionally
//! kept so reported results stay comparable across runs.

use std::fmt;

use super::bar::PriceSeries;
use super::signal::{Direction, Signal};

pub const DEFAULT_HORIZON_BARS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    TakeProfit,
    StopLoss,
    NoOutcome,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::TakeProfit => write!(f, "TP"),
            Outcome::StopLoss => write!(f, "SL"),
            Outcome::NoOutcome => write!(f, "NONE"),
        }
    }
}

/// A signal with its outcome decided, before any balance is applied.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub signal: Signal,
    pub outcome: Outcome,
    /// First bar touching the deciding level, or the last bar examined.
    pub exit_index: usize,
}

/// A booked trade. Built by the ledger once the balance delta is known.
#[derive(Debug, Clone, PartialEq)]
pub struct Trade {
    pub signal: Signal,
    pub outcome: Outcome,
    pub exit_index: usize,
    pub pnl: f64,
}

/// Resolve one signal. Horizons running past the series end are truncated.
pub fn resolve_signal(series: &PriceSeries, signal: &Signal, horizon_bars: usize) -> Resolution {
    let bars = series.bars();
    let start = signal.index.min(bars.len());
    let end = signal.index.saturating_add(horizon_bars).min(bars.len());
    let window = &bars[start..end];

    let (tp_at, sl_at) = match signal.direction {
        Direction::Long => (
            window.iter().position(|b| b.high >= signal.target_price),
            window.iter().position(|b| b.low <= signal.stop_price),
        ),
        Direction::Short => (
            window.iter().position(|b| b.low <= signal.target_price),
            window.iter().position(|b| b.high >= signal.stop_price),
        ),
    };

    let (outcome, exit_index) = match (tp_at, sl_at) {
        (Some(offset), _) => (Outcome::TakeProfit, start + offset),
        (None, Some(offset)) => (Outcome::StopLoss, start + offset),
        (None, None) => (Outcome::NoOutcome, end.saturating_sub(1).max(start)),
    };

    Resolution {
        signal: signal.clone(),
        outcome,
        exit_index,
    }
}

pub fn resolve_signals(
    series: &PriceSeries,
    signals: &[Signal],
    horizon_bars: usize,
) -> Vec<Resolution> {
    signals
        .iter()
        .map(|signal| resolve_signal(series, signal, horizon_bars))
        .collect()
}
