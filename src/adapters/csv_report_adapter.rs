//! CSV trade log and equity curve writer implementing ReportPort.
//!
//! `report.csv` receives one row per trade; the equity curve goes to a
//! sibling `report_equity.csv`.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::domain::backtest::{BacktestConfig, BacktestResult};
use crate::domain::error::FractalShiftError;
use crate::ports::report_port::ReportPort;

#[derive(Debug, Serialize)]
struct TradeRow {
    index: usize,
    time: String,
    direction: String,
    entry: f64,
    stop: f64,
    target: f64,
    lot: f64,
    outcome: String,
    exit_index: usize,
    pnl: f64,
    balance_after: f64,
}

#[derive(Debug, Serialize)]
struct EquityRow {
    trade: Option<usize>,
    balance: f64,
}

pub struct CsvReportAdapter;

impl CsvReportAdapter {
    pub fn equity_path(output_path: &Path) -> PathBuf {
        let stem = output_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "report".to_string());
        output_path.with_file_name(format!("{}_equity.csv", stem))
    }
}

fn report_err(e: impl std::fmt::Display) -> FractalShiftError {
    FractalShiftError::Report {
        reason: e.to_string(),
    }
}

impl ReportPort for CsvReportAdapter {
    fn write(
        &self,
        result: &BacktestResult,
        _config: &BacktestConfig,
        output_path: &str,
    ) -> Result<(), FractalShiftError> {
        let path = Path::new(output_path);

        let mut wtr = csv::Writer::from_path(path).map_err(report_err)?;
        for (i, trade) in result.trades.iter().enumerate() {
            // equity_curve[0] is the opening balance.
            let balance_after = result
                .equity_curve
                .get(i + 1)
                .map(|p| p.balance_after)
                .unwrap_or(result.summary.final_balance);
            wtr.serialize(TradeRow {
                index: trade.signal.index,
                time: trade.signal.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
                direction: trade.signal.direction.to_string(),
                entry: trade.signal.entry_price,
                stop: trade.signal.stop_price,
                target: trade.signal.target_price,
                lot: trade.signal.lot_size,
                outcome: trade.outcome.to_string(),
                exit_index: trade.exit_index,
                pnl: trade.pnl,
                balance_after,
            })
            .map_err(report_err)?;
        }
        wtr.flush()?;

        let mut wtr = csv::Writer::from_path(Self::equity_path(path)).map_err(report_err)?;
        for point in &result.equity_curve {
            wtr.serialize(EquityRow {
                trade: point.trade_index,
                balance: point.balance_after,
            })
            .map_err(report_err)?;
        }
        wtr.flush()?;

        Ok(())
    }
}
