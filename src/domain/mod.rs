//! Core domain types and the backtest engine.

pub mod bar;
pub mod fractal;
pub mod signal;
pub mod resolver;
pub mod ledger;
pub mod backtest;
pub mod metrics;
pub mod sweep;
pub mod config_validation;
pub mod error;
