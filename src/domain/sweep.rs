//! Parameter sweeps over one price series.
//!
//! Each grid point is an independent backtest, so points run on the rayon
//! pool when `parallel` is set. Output order always follows the grid.

use rayon::prelude::*;

use super::backtest::{run_backtest, BacktestConfig, BacktestResult};
use super::bar::PriceSeries;
use super::error::FractalShiftError;

#[derive(Debug, Clone, PartialEq)]
pub struct ParamGrid {
    pub reward_risk_ratios: Vec<f64>,
    pub windows: Vec<usize>,
}

impl ParamGrid {
    pub fn size(&self) -> usize {
        self.reward_risk_ratios.len() * self.windows.len()
    }

    /// Cartesian product of the grid over `base`, windows varying slowest.
    pub fn generate_configs(&self, base: &BacktestConfig) -> Vec<BacktestConfig> {
        let mut configs = Vec::with_capacity(self.size());
        for &window in &self.windows {
            for &ratio in &self.reward_risk_ratios {
                configs.push(BacktestConfig {
                    window,
                    reward_risk_ratio: ratio,
                    ..base.clone()
                });
            }
        }
        configs
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SweepEntry {
    pub config: BacktestConfig,
    pub result: BacktestResult,
}

pub fn run_sweep(
    series: &PriceSeries,
    grid: &ParamGrid,
    base: &BacktestConfig,
    parallel: bool,
) -> Result<Vec<SweepEntry>, FractalShiftError> {
    let configs = grid.generate_configs(base);

    let run = |config: &BacktestConfig| {
        run_backtest(series, config).map(|result| SweepEntry {
            config: config.clone(),
            result,
        })
    };

    if parallel {
        configs.par_iter().map(run).collect()
    } else {
        configs.iter().map(run).collect()
    }
}

/// Entry with the highest final balance; ties keep the earliest grid point.
pub fn best_by_final_balance(entries: &[SweepEntry]) -> Option<&SweepEntry> {
    entries.iter().fold(None, |best: Option<&SweepEntry>, entry| match best {
        Some(b) if b.result.summary.final_balance >= entry.result.summary.final_balance => Some(b),
        _ => Some(entry),
    })
}
