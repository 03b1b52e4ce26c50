//! Running balance and equity curve.

use super::resolver::{Outcome, Resolution, Trade};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EquityPoint {
    /// Position of the trade in the log; `None` for the opening balance.
    pub trade_index: Option<usize>,
    pub balance_after: f64,
}

/// How much is put at risk on each trade.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RiskSizing {
    /// `risk_fraction * starting_balance` for every trade.
    Fixed,
    /// `risk_fraction * balance` at the time the trade is booked.
    Compounding,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EquityLedger {
    pub starting_balance: f64,
    pub risk_fraction: f64,
    pub reward_risk_ratio: f64,
    pub sizing: RiskSizing,
    pub balance: f64,
    pub equity_curve: Vec<EquityPoint>,
}

impl EquityLedger {
    pub fn new(
        starting_balance: f64,
        risk_fraction: f64,
        reward_risk_ratio: f64,
        sizing: RiskSizing,
    ) -> Self {
        EquityLedger {
            starting_balance,
            risk_fraction,
            reward_risk_ratio,
            sizing,
            balance: starting_balance,
            equity_curve: vec![EquityPoint {
                trade_index: None,
                balance_after: starting_balance,
            }],
        }
    }

    pub fn risk_amount(&self) -> f64 {
        match self.sizing {
            RiskSizing::Fixed => self.risk_fraction * self.starting_balance,
            RiskSizing::Compounding => self.risk_fraction * self.balance,
        }
    }

    /// Apply one resolution, append its equity point and return the booked trade.
    pub fn book(&mut self, resolution: Resolution) -> Trade {
        let risk = self.risk_amount();
        let pnl = match resolution.outcome {
            Outcome::TakeProfit => risk * self.reward_risk_ratio,
            Outcome::StopLoss => -risk,
            Outcome::NoOutcome => 0.0,
        };

        self.balance += pnl;
        self.equity_curve.push(EquityPoint {
            trade_index: Some(self.equity_curve.len() - 1),
            balance_after: self.balance,
        });

        Trade {
            signal: resolution.signal,
            outcome: resolution.outcome,
            exit_index: resolution.exit_index,
            pnl,
        }
    }

    /// Book every resolution in order.
    pub fn book_all(&mut self, resolutions: Vec<Resolution>) -> Vec<Trade> {
        resolutions.into_iter().map(|r| self.book(r)).collect()
    }

    pub fn into_curve(self) -> Vec<EquityPoint> {
        self.equity_curve
    }
}
