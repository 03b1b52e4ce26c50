//! Configuration file validation.
//!
//! Checks raw `[backtest]`, `[data]` and `[sweep]` values before they are
//! turned into typed configs, so bad entries are reported by section and key.

use crate::domain::error::FractalShiftError;
use crate::ports::config_port::ConfigPort;

pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), FractalShiftError> {
    validate_int_min(config, "window", 2)?;
    validate_int_min(config, "offset", 0)?;
    validate_int_min(config, "horizon_bars", 1)?;
    validate_positive(config, "reward_risk_ratio")?;
    validate_positive(config, "lot_size")?;
    validate_positive(config, "starting_balance")?;
    validate_risk_fraction(config)?;
    validate_bool(config, "backtest", "compounding")?;
    Ok(())
}

pub fn validate_data_config(config: &dyn ConfigPort) -> Result<(), FractalShiftError> {
    match config.get_string("data", "path") {
        Some(s) if !s.trim().is_empty() => {}
        _ => return Err(invalid("data", "path", "path is required")),
    }
    if let Some(raw) = raw_value(config, "data", "max_size_mb") {
        match raw.parse::<i64>() {
            Ok(v) if v >= 1 => {}
            _ => {
                return Err(invalid(
                    "data",
                    "max_size_mb",
                    "max_size_mb must be a whole number of at least 1",
                ));
            }
        }
    }
    Ok(())
}

pub fn validate_sweep_config(config: &dyn ConfigPort) -> Result<(), FractalShiftError> {
    if let Some(raw) = config.get_string("sweep", "reward_risk_ratios") {
        let ratios = parse_f64_list(&raw)
            .map_err(|reason| invalid("sweep", "reward_risk_ratios", &reason))?;
        if ratios.iter().any(|r| !(r.is_finite() && *r > 0.0)) {
            return Err(invalid(
                "sweep",
                "reward_risk_ratios",
                "every ratio must be positive",
            ));
        }
    }
    if let Some(raw) = config.get_string("sweep", "windows") {
        let windows =
            parse_usize_list(&raw).map_err(|reason| invalid("sweep", "windows", &reason))?;
        if windows.iter().any(|&w| w < 2) {
            return Err(invalid("sweep", "windows", "every window must be at least 2"));
        }
    }
    validate_bool(config, "sweep", "parallel")?;
    Ok(())
}

/// Parse `"1.0, 2, 3.5"`. Empty tokens are rejected.
pub fn parse_f64_list(input: &str) -> Result<Vec<f64>, String> {
    input
        .split(',')
        .map(|token| {
            let token = token.trim();
            if token.is_empty() {
                return Err("empty token in list".to_string());
            }
            token
                .parse::<f64>()
                .map_err(|_| format!("'{}' is not a number", token))
        })
        .collect()
}

pub fn parse_usize_list(input: &str) -> Result<Vec<usize>, String> {
    input
        .split(',')
        .map(|token| {
            let token = token.trim();
            if token.is_empty() {
                return Err("empty token in list".to_string());
            }
            token
                .parse::<usize>()
                .map_err(|_| format!("'{}' is not a whole number", token))
        })
        .collect()
}

fn invalid(section: &str, key: &str, reason: &str) -> FractalShiftError {
    FractalShiftError::InvalidConfig {
        key: format!("{}.{}", section, key),
        reason: reason.to_string(),
    }
}

/// Present values must parse; absent ones take the engine default.
fn raw_value(config: &dyn ConfigPort, section: &str, key: &str) -> Option<String> {
    config
        .get_string(section, key)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn validate_int_min(config: &dyn ConfigPort, key: &str, min: i64) -> Result<(), FractalShiftError> {
    let Some(raw) = raw_value(config, "backtest", key) else {
        return Ok(());
    };
    match raw.parse::<i64>() {
        Ok(v) if v >= min => Ok(()),
        Ok(_) => Err(invalid(
            "backtest",
            key,
            &format!("{} must be at least {}", key, min),
        )),
        Err(_) => Err(invalid(
            "backtest",
            key,
            &format!("{} must be a whole number", key),
        )),
    }
}

fn validate_positive(config: &dyn ConfigPort, key: &str) -> Result<(), FractalShiftError> {
    let Some(raw) = raw_value(config, "backtest", key) else {
        return Ok(());
    };
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() && v > 0.0 => Ok(()),
        _ => Err(invalid(
            "backtest",
            key,
            &format!("{} must be a positive number", key),
        )),
    }
}

fn validate_risk_fraction(config: &dyn ConfigPort) -> Result<(), FractalShiftError> {
    let Some(raw) = raw_value(config, "backtest", "risk_fraction") else {
        return Ok(());
    };
    match raw.parse::<f64>() {
        Ok(v) if v > 0.0 && v <= 1.0 => Ok(()),
        _ => Err(invalid(
            "backtest",
            "risk_fraction",
            "risk_fraction must be in (0, 1]",
        )),
    }
}

/// Same spellings `FileConfigAdapter::get_bool` accepts.
fn validate_bool(config: &dyn ConfigPort, section: &str, key: &str) -> Result<(), FractalShiftError> {
    let Some(raw) = raw_value(config, section, key) else {
        return Ok(());
    };
    match raw.to_lowercase().as_str() {
        "true" | "yes" | "on" | "1" | "false" | "no" | "off" | "0" => Ok(()),
        _ => Err(invalid(
            section,
            key,
            &format!("{} must be true or false, got '{}'", key, raw),
        )),
    }
}
