//! Backtest configuration and the end-to-end run.
//!
//! Pipeline: fractal levels -> breakout signals -> forward-scan resolution ->
//! equity ledger -> summary. Every run owns its state, so identical inputs
//! give identical results and independent runs can go in parallel.

use tracing::{debug, info};

use super::bar::PriceSeries;
use super::error::FractalShiftError;
use super::fractal::{self, DEFAULT_OFFSET, DEFAULT_WINDOW};
use super::ledger::{EquityLedger, EquityPoint, RiskSizing};
use super::metrics::Summary;
use super::resolver::{self, Trade, DEFAULT_HORIZON_BARS};
use super::signal;

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    pub window: usize,
    pub offset: usize,
    pub reward_risk_ratio: f64,
    pub lot_size: f64,
    pub horizon_bars: usize,
    pub starting_balance: f64,
    pub risk_fraction: f64,
    pub compounding: bool,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        BacktestConfig {
            window: DEFAULT_WINDOW,
            offset: DEFAULT_OFFSET,
            reward_risk_ratio: 2.0,
            lot_size: 0.13,
            horizon_bars: DEFAULT_HORIZON_BARS,
            starting_balance: 1000.0,
            risk_fraction: 0.01,
            compounding: false,
        }
    }
}

impl BacktestConfig {
    pub fn validate(&self) -> Result<(), FractalShiftError> {
        if self.window < 2 {
            return Err(FractalShiftError::invalid_config(
                "window",
                "window must be at least 2",
            ));
        }
        if self.horizon_bars < 1 {
            return Err(FractalShiftError::invalid_config(
                "horizon_bars",
                "horizon_bars must be at least 1",
            ));
        }
        if !is_positive_finite(self.reward_risk_ratio) {
            return Err(FractalShiftError::invalid_config(
                "reward_risk_ratio",
                "reward_risk_ratio must be a positive number",
            ));
        }
        if !is_positive_finite(self.lot_size) {
            return Err(FractalShiftError::invalid_config(
                "lot_size",
                "lot_size must be a positive number",
            ));
        }
        if !is_positive_finite(self.starting_balance) {
            return Err(FractalShiftError::invalid_config(
                "starting_balance",
                "starting_balance must be a positive number",
            ));
        }
        if !is_positive_finite(self.risk_fraction) || self.risk_fraction > 1.0 {
            return Err(FractalShiftError::invalid_config(
                "risk_fraction",
                "risk_fraction must be in (0, 1]",
            ));
        }
        Ok(())
    }

    pub fn sizing(&self) -> RiskSizing {
        if self.compounding {
            RiskSizing::Compounding
        } else {
            RiskSizing::Fixed
        }
    }

    /// Shortest series this config can run on.
    pub fn minimum_bars(&self) -> usize {
        fractal::minimum_bars(self.window, self.offset)
    }
}

fn is_positive_finite(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestResult {
    pub symbol: String,
    pub trades: Vec<Trade>,
    pub equity_curve: Vec<EquityPoint>,
    pub summary: Summary,
}

pub fn run_backtest(
    series: &PriceSeries,
    config: &BacktestConfig,
) -> Result<BacktestResult, FractalShiftError> {
    config.validate()?;

    let fractals = fractal::detect_fractals(series, config.window, config.offset)?;
    let signals = signal::generate_signals(
        series,
        &fractals,
        config.reward_risk_ratio,
        config.lot_size,
    );
    debug!(
        symbol = series.symbol(),
        bars = series.len(),
        signals = signals.len(),
        "signals generated"
    );

    let resolutions = resolver::resolve_signals(series, &signals, config.horizon_bars);

    let mut ledger = EquityLedger::new(
        config.starting_balance,
        config.risk_fraction,
        config.reward_risk_ratio,
        config.sizing(),
    );
    let trades = ledger.book_all(resolutions);
    let equity_curve = ledger.into_curve();

    let summary = Summary::compute(&trades, &equity_curve, config.starting_balance);
    info!(
        symbol = series.symbol(),
        trades = summary.trade_count,
        win_rate = summary.win_rate,
        final_balance = summary.final_balance,
        "backtest complete"
    );

    Ok(BacktestResult {
        symbol: series.symbol().to_string(),
        trades,
        equity_curve,
        summary,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let c = BacktestConfig::default();
        assert!(c.validate().is_ok());
        assert_eq!(c.window, 5);
        assert_eq!(c.offset, 2);
        assert_eq!(c.horizon_bars, 10);
        assert!((c.starting_balance - 1000.0).abs() < f64::EPSILON);
        assert!((c.risk_fraction - 0.01).abs() < f64::EPSILON);
        assert!(!c.compounding);
        assert_eq!(c.minimum_bars(), 8);
    }

    fn invalid_key(c: BacktestConfig) -> String {
        match c.validate().unwrap_err() {
            FractalShiftError::InvalidConfig { key, .. } => key,
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn window_below_two_rejected() {
        let c = BacktestConfig {
            window: 1,
            ..BacktestConfig::default()
        };
        assert_eq!(invalid_key(c), "window");
    }

    #[test]
    fn zero_horizon_rejected() {
        let c = BacktestConfig {
            horizon_bars: 0,
            ..BacktestConfig::default()
        };
        assert_eq!(invalid_key(c), "horizon_bars");
    }

    #[test]
    fn non_positive_ratio_rejected() {
        let c = BacktestConfig {
            reward_risk_ratio: 0.0,
            ..BacktestConfig::default()
        };
        assert_eq!(invalid_key(c), "reward_risk_ratio");

        let c = BacktestConfig {
            reward_risk_ratio: f64::NAN,
            ..BacktestConfig::default()
        };
        assert_eq!(invalid_key(c), "reward_risk_ratio");
    }

    #[test]
    fn non_positive_lot_rejected() {
        let c = BacktestConfig {
            lot_size: -0.1,
            ..BacktestConfig::default()
        };
        assert_eq!(invalid_key(c), "lot_size");
    }

    #[test]
    fn non_positive_balance_rejected() {
        let c = BacktestConfig {
            starting_balance: 0.0,
            ..BacktestConfig::default()
        };
        assert_eq!(invalid_key(c), "starting_balance");
    }

    #[test]
    fn risk_fraction_range() {
        let c = BacktestConfig {
            risk_fraction: 0.0,
            ..BacktestConfig::default()
        };
        assert_eq!(invalid_key(c), "risk_fraction");

        let c = BacktestConfig {
            risk_fraction: 1.5,
            ..BacktestConfig::default()
        };
        assert_eq!(invalid_key(c), "risk_fraction");

        let c = BacktestConfig {
            risk_fraction: 1.0,
            ..BacktestConfig::default()
        };
        assert!(c.validate().is_ok());
    }

    #[test]
    fn sizing_follows_compounding_flag() {
        assert_eq!(BacktestConfig::default().sizing(), RiskSizing::Fixed);
        let c = BacktestConfig {
            compounding: true,
            ..BacktestConfig::default()
        };
        assert_eq!(c.sizing(), RiskSizing::Compounding);
    }
}
