//! End-to-end tests of the backtest engine.
//!
//! Tests cover:
//! - The breakout scenario on a 15-bar series
//! - Outcome resolution scenarios (no outcome, same-bar tie, stop loss)
//! - Equity accounting per outcome
//! - Boundary and error behaviour of `run_backtest`
//! - Determinism across repeated runs and across threads

mod common;

use approx::assert_relative_eq;
use common::*;
use fractalshift::domain::backtest::{run_backtest, BacktestConfig};
use fractalshift::domain::error::FractalShiftError;
use fractalshift::domain::fractal::detect_fractals;
use fractalshift::domain::resolver::Outcome;
use fractalshift::domain::signal::Direction;
use fractalshift::ports::data_port::DataPort;

mod breakout_scenario {
    use super::*;

    /// Flat closes with bar 12 closing 4 above the rolling 5-bar high.
    fn breakout_bars() -> Vec<Bar> {
        let mut bars = flat_bars(15);
        bars[12] = make_bar(12, 100.0, 106.0, 105.0);
        bars
    }

    #[test]
    fn emits_single_long_at_bar_12() {
        let s = series(breakout_bars());
        let result = run_backtest(&s, &sample_config()).unwrap();

        assert_eq!(result.trades.len(), 1);
        let signal = &result.trades[0].signal;
        assert_eq!(signal.index, 12);
        assert_eq!(signal.direction, Direction::Long);

        let fractals = detect_fractals(&s, 5, 2).unwrap();
        let prev = fractals.get(11).unwrap();
        assert_relative_eq!(signal.entry_price, 105.0);
        assert_relative_eq!(signal.stop_price, prev.low);
        assert_relative_eq!(
            signal.target_price,
            signal.entry_price + 2.0 * (signal.entry_price - signal.stop_price)
        );
    }

    #[test]
    fn breakout_without_follow_through_is_stopped_out() {
        // The stop sits on 99, which the flat bar after the breakout touches.
        let s = series(breakout_bars());
        let result = run_backtest(&s, &sample_config()).unwrap();
        assert_eq!(result.trades[0].outcome, Outcome::StopLoss);
        assert_eq!(result.trades[0].exit_index, 13);
        assert_relative_eq!(result.summary.final_balance, 990.0, epsilon = 1e-9);
    }

    #[test]
    fn loaded_through_data_port() {
        let port = MockDataPort::new().with_bars("XAUUSD", breakout_bars());
        let s = port.load_series("XAUUSD").unwrap();
        let result = run_backtest(&s, &sample_config()).unwrap();
        assert_eq!(result.symbol, "XAUUSD");
        assert_eq!(result.trades.len(), 1);
    }
}

mod outcomes {
    use super::*;

    /// Bars 0-10 range 99-101, bar 11 breaks out to close 105 with a low of
    /// 100. Stop is 99, target 117. Following bars are supplied by the test.
    fn with_tail(tail: &[(f64, f64, f64)]) -> Vec<Bar> {
        let mut bars = flat_bars(11);
        bars.push(make_bar(11, 100.0, 106.0, 105.0));
        for (k, &(low, high, close)) in tail.iter().enumerate() {
            bars.push(make_bar(12 + k, low, high, close));
        }
        bars
    }

    #[test]
    fn untouched_levels_leave_balance_unchanged() {
        let tail = vec![(101.0, 110.0, 105.0); 10];
        let s = series(with_tail(&tail));
        let result = run_backtest(&s, &sample_config()).unwrap();

        let long: Vec<_> = result
            .trades
            .iter()
            .filter(|t| t.signal.index == 11)
            .collect();
        assert_eq!(long.len(), 1);
        assert_eq!(long[0].outcome, Outcome::NoOutcome);
        assert_relative_eq!(long[0].pnl, 0.0);

        let pos = result
            .trades
            .iter()
            .position(|t| t.signal.index == 11)
            .unwrap();
        assert_relative_eq!(
            result.equity_curve[pos + 1].balance_after,
            result.equity_curve[pos].balance_after
        );
    }

    #[test]
    fn same_bar_touch_counts_as_take_profit() {
        let mut tail = vec![(101.0, 110.0, 105.0); 3];
        tail.push((98.0, 118.0, 105.0));
        let s = series(with_tail(&tail));
        let result = run_backtest(&s, &sample_config()).unwrap();

        let trade = result
            .trades
            .iter()
            .find(|t| t.signal.index == 11)
            .unwrap();
        assert_eq!(trade.outcome, Outcome::TakeProfit);
        assert_eq!(trade.exit_index, 15);
        assert_relative_eq!(trade.pnl, 20.0, epsilon = 1e-9);
    }

    #[test]
    fn target_beyond_horizon_is_ignored() {
        let mut tail = vec![(101.0, 110.0, 105.0); 9];
        tail.push((101.0, 120.0, 105.0));
        let s = series(with_tail(&tail));
        let config = BacktestConfig {
            horizon_bars: 10,
            ..sample_config()
        };
        let result = run_backtest(&s, &config).unwrap();
        let trade = result
            .trades
            .iter()
            .find(|t| t.signal.index == 11)
            .unwrap();
        // Horizon covers bars 11..21; the 120 high sits on bar 21.
        assert_eq!(trade.outcome, Outcome::NoOutcome);
    }
}

mod accounting {
    use super::*;

    #[test]
    fn curve_is_one_longer_than_trade_log() {
        let s = series(wave_bars(200));
        let result = run_backtest(&s, &sample_config()).unwrap();
        assert!(!result.trades.is_empty());
        assert_eq!(result.equity_curve.len(), result.trades.len() + 1);
        assert_relative_eq!(result.equity_curve[0].balance_after, 1000.0);
    }

    #[test]
    fn balance_deltas_match_outcomes() {
        let config = BacktestConfig {
            reward_risk_ratio: 2.5,
            risk_fraction: 0.02,
            ..sample_config()
        };
        let s = series(wave_bars(200));
        let result = run_backtest(&s, &config).unwrap();

        for (i, trade) in result.trades.iter().enumerate() {
            let before = result.equity_curve[i].balance_after;
            let after = result.equity_curve[i + 1].balance_after;
            match trade.outcome {
                Outcome::TakeProfit => {
                    assert_relative_eq!(after - before, 0.02 * 1000.0 * 2.5, epsilon = 1e-9)
                }
                Outcome::StopLoss => {
                    assert_relative_eq!(before - after, 0.02 * 1000.0, epsilon = 1e-9)
                }
                Outcome::NoOutcome => assert_relative_eq!(after, before),
            }
        }
    }

    #[test]
    fn summary_counts_add_up() {
        let s = series(wave_bars(300));
        let result = run_backtest(&s, &sample_config()).unwrap();
        let summary = &result.summary;
        assert_eq!(
            summary.wins + summary.losses + summary.no_outcome,
            summary.trade_count
        );
        assert_relative_eq!(
            summary.final_balance,
            result.equity_curve.last().unwrap().balance_after
        );
    }

    #[test]
    fn compounding_changes_sizing() {
        let s = series(wave_bars(300));
        let fixed = run_backtest(&s, &sample_config()).unwrap();
        let compounding = run_backtest(
            &s,
            &BacktestConfig {
                compounding: true,
                ..sample_config()
            },
        )
        .unwrap();
        assert_eq!(fixed.trades.len(), compounding.trades.len());
        if fixed.summary.wins + fixed.summary.losses > 1 {
            assert_ne!(fixed.summary.final_balance, compounding.summary.final_balance);
        }
    }
}

mod boundaries {
    use super::*;

    #[test]
    fn minimum_length_series_has_no_signals() {
        let config = sample_config();
        let mut bars = flat_bars(config.minimum_bars());
        // Even a huge close on the last bar cannot fire: no level on the bar before it.
        let last = bars.len() - 1;
        bars[last] = make_bar(last, 100.0, 150.0, 149.0);
        let result = run_backtest(&series(bars), &config).unwrap();
        assert!(result.trades.is_empty());
        assert_eq!(result.equity_curve.len(), 1);
        assert_relative_eq!(result.summary.final_balance, 1000.0);
    }

    #[test]
    fn short_series_is_insufficient_data() {
        let err = run_backtest(&series(flat_bars(7)), &sample_config()).unwrap_err();
        assert!(matches!(
            err,
            FractalShiftError::InsufficientData {
                bars: 7,
                minimum: 8
            }
        ));
        assert!(err.is_data_error());
    }

    #[test]
    fn invalid_config_is_reported_before_data_checks() {
        let config = BacktestConfig {
            lot_size: 0.0,
            ..sample_config()
        };
        let err = run_backtest(&series(flat_bars(3)), &config).unwrap_err();
        assert!(matches!(err, FractalShiftError::InvalidConfig { .. }));
        assert!(err.is_config_error());
    }

    #[test]
    fn malformed_bars_never_reach_the_engine() {
        let mut bars = flat_bars(10);
        bars[4].high = 50.0;
        let port = MockDataPort::new().with_bars("BAD", bars);
        let err = port.load_series("BAD").unwrap_err();
        assert!(matches!(err, FractalShiftError::MalformedBar { index: 4, .. }));
    }
}

mod determinism {
    use super::*;

    #[test]
    fn repeated_runs_are_identical() {
        let s = series(wave_bars(250));
        let config = sample_config();
        let a = run_backtest(&s, &config).unwrap();
        let b = run_backtest(&s, &config).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn concurrent_runs_match_sequential() {
        let s = series(wave_bars(250));
        let config = sample_config();
        let expected = run_backtest(&s, &config).unwrap();

        std::thread::scope(|scope| {
            let handles: Vec<_> = (0..4)
                .map(|_| scope.spawn(|| run_backtest(&s, &config).unwrap()))
                .collect();
            for handle in handles {
                assert_eq!(handle.join().unwrap(), expected);
            }
        });
    }
}
