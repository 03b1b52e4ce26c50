//! Fractal shift breakout backtester.
//!
//! Hexagonal architecture: the pure backtest engine lives in [`domain`], port
//! traits in [`ports`], concrete file I/O in [`adapters`], and the command
//! line front end in [`cli`].

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod cli;

pub use domain::backtest::{run_backtest, BacktestConfig, BacktestResult};
pub use domain::bar::{Bar, PriceSeries};
pub use domain::error::FractalShiftError;
