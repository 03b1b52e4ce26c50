//! Summary statistics over a resolved trade log.

use super::ledger::EquityPoint;
use super::resolver::{Outcome, Trade};

#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub trade_count: usize,
    pub wins: usize,
    pub losses: usize,
    pub no_outcome: usize,
    pub win_rate: f64,
    pub starting_balance: f64,
    pub final_balance: f64,
    pub total_return: f64,
    pub max_drawdown: f64,
    pub profit_factor: f64,
}

impl Summary {
    pub fn compute(trades: &[Trade], equity_curve: &[EquityPoint], starting_balance: f64) -> Self {
        let mut wins = 0usize;
        let mut losses = 0usize;
        let mut no_outcome = 0usize;
        let mut gross_win = 0.0_f64;
        let mut gross_loss = 0.0_f64;

        for trade in trades {
            match trade.outcome {
                Outcome::TakeProfit => {
                    wins += 1;
                    gross_win += trade.pnl;
                }
                Outcome::StopLoss => {
                    losses += 1;
                    gross_loss += trade.pnl.abs();
                }
                Outcome::NoOutcome => no_outcome += 1,
            }
        }

        let trade_count = trades.len();
        let win_rate = if trade_count > 0 {
            wins as f64 / trade_count as f64
        } else {
            0.0
        };

        let final_balance = equity_curve
            .last()
            .map(|p| p.balance_after)
            .unwrap_or(starting_balance);

        let total_return = if starting_balance > 0.0 {
            (final_balance - starting_balance) / starting_balance
        } else {
            0.0
        };

        let profit_factor = if gross_loss > 0.0 {
            gross_win / gross_loss
        } else if gross_win > 0.0 {
            f64::INFINITY
        } else {
            0.0
        };

        Summary {
            trade_count,
            wins,
            losses,
            no_outcome,
            win_rate,
            starting_balance,
            final_balance,
            total_return,
            max_drawdown: compute_drawdown(equity_curve),
            profit_factor,
        }
    }
}

/// Largest peak-to-trough decline as a fraction of the running peak.
fn compute_drawdown(equity_curve: &[EquityPoint]) -> f64 {
    let Some(first) = equity_curve.first() else {
        return 0.0;
    };

    let mut peak = first.balance_after;
    let mut max_dd = 0.0_f64;

    for point in equity_curve {
        if point.balance_after > peak {
            peak = point.balance_after;
        } else if peak > 0.0 {
            let dd = (peak - point.balance_after) / peak;
            if dd > max_dd {
                max_dd = dd;
            }
        }
    }

    max_dd
}
