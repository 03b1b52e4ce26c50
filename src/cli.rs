//! CLI definition and dispatch.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::{error, info, warn};

use crate::adapters::csv_adapter::{CsvAdapter, DEFAULT_MAX_SIZE_MB};
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::backtest::{run_backtest, BacktestConfig, BacktestResult};
use crate::domain::bar::PriceSeries;
use crate::domain::config_validation::{
    parse_f64_list, parse_usize_list, validate_backtest_config, validate_data_config,
    validate_sweep_config,
};
use crate::domain::error::FractalShiftError;
use crate::domain::sweep::{best_by_final_balance, run_sweep, ParamGrid};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(name = "fractalshift", about = "Fractal shift breakout backtester")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a backtest on one price file
    Backtest {
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(short, long)]
        data: Option<PathBuf>,
        #[arg(long)]
        symbol: Option<String>,
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Override the reward:risk ratio
        #[arg(long)]
        rr: Option<f64>,
        /// Override the lot size
        #[arg(long)]
        lot: Option<f64>,
    },
    /// Run the configured parameter grid
    Sweep {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        data: Option<PathBuf>,
        #[arg(long)]
        symbol: Option<String>,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Show bar count and time range of a price file
    Info {
        #[arg(short, long)]
        data: PathBuf,
        #[arg(long)]
        symbol: Option<String>,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    let outcome = match cli.command {
        Command::Backtest {
            config,
            data,
            symbol,
            output,
            rr,
            lot,
        } => run_backtest_command(
            config.as_deref(),
            data.as_deref(),
            symbol.as_deref(),
            output.as_deref(),
            rr,
            lot,
        ),
        Command::Sweep {
            config,
            data,
            symbol,
        } => run_sweep_command(&config, data.as_deref(), symbol.as_deref()),
        Command::Validate { config } => run_validate(&config),
        Command::Info { data, symbol } => run_info(&data, symbol.as_deref()),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            (&e).into()
        }
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, FractalShiftError> {
    info!("loading config from {}", path.display());
    FileConfigAdapter::from_file(path)
}

fn usize_key(adapter: &dyn ConfigPort, key: &str, default: usize) -> Result<usize, FractalShiftError> {
    let value = adapter.get_int("backtest", key, default as i64);
    usize::try_from(value).map_err(|_| FractalShiftError::InvalidConfig {
        key: format!("backtest.{}", key),
        reason: format!("{} must not be negative", key),
    })
}

/// Build a validated [`BacktestConfig`] from the `[backtest]` section.
pub fn build_backtest_config(adapter: &dyn ConfigPort) -> Result<BacktestConfig, FractalShiftError> {
    let defaults = BacktestConfig::default();

    let config = BacktestConfig {
        window: usize_key(adapter, "window", defaults.window)?,
        offset: usize_key(adapter, "offset", defaults.offset)?,
        reward_risk_ratio: adapter.get_double(
            "backtest",
            "reward_risk_ratio",
            defaults.reward_risk_ratio,
        ),
        lot_size: adapter.get_double("backtest", "lot_size", defaults.lot_size),
        horizon_bars: usize_key(adapter, "horizon_bars", defaults.horizon_bars)?,
        starting_balance: adapter.get_double(
            "backtest",
            "starting_balance",
            defaults.starting_balance,
        ),
        risk_fraction: adapter.get_double("backtest", "risk_fraction", defaults.risk_fraction),
        compounding: adapter.get_bool("backtest", "compounding", defaults.compounding),
    };

    config.validate()?;
    Ok(config)
}

/// Build the sweep grid; missing lists collapse to the base config's value.
pub fn build_param_grid(
    adapter: &dyn ConfigPort,
    base: &BacktestConfig,
) -> Result<ParamGrid, FractalShiftError> {
    let reward_risk_ratios = match adapter.get_string("sweep", "reward_risk_ratios") {
        Some(raw) => parse_f64_list(&raw).map_err(|reason| FractalShiftError::InvalidConfig {
            key: "sweep.reward_risk_ratios".into(),
            reason,
        })?,
        None => vec![base.reward_risk_ratio],
    };
    let windows = match adapter.get_string("sweep", "windows") {
        Some(raw) => parse_usize_list(&raw).map_err(|reason| FractalShiftError::InvalidConfig {
            key: "sweep.windows".into(),
            reason,
        })?,
        None => vec![base.window],
    };

    Ok(ParamGrid {
        reward_risk_ratios,
        windows,
    })
}

/// Pick the data file and symbol: explicit flags win over the `[data]` section,
/// and the file stem names the symbol when nothing else does.
pub fn resolve_data_source(
    data_override: Option<&Path>,
    symbol_override: Option<&str>,
    config: Option<&dyn ConfigPort>,
) -> Result<(PathBuf, String), FractalShiftError> {
    let path = match data_override {
        Some(p) => p.to_path_buf(),
        None => config
            .and_then(|c| c.get_string("data", "path"))
            .map(PathBuf::from)
            .ok_or_else(|| FractalShiftError::InvalidConfig {
                key: "data.path".into(),
                reason: "no price file given (use --data or set [data] path)".into(),
            })?,
    };

    let symbol = symbol_override
        .map(str::to_string)
        .or_else(|| config.and_then(|c| c.get_string("data", "symbol")))
        .or_else(|| {
            path.file_stem()
                .map(|s| s.to_string_lossy().into_owned())
        })
        .unwrap_or_else(|| "UNKNOWN".to_string())
        .to_uppercase();

    Ok((path, symbol))
}

fn load_series(
    path: &Path,
    symbol: &str,
    config: Option<&dyn ConfigPort>,
) -> Result<PriceSeries, FractalShiftError> {
    let mut adapter = CsvAdapter::new(path.to_path_buf());
    if let Some(format) = config.and_then(|c| c.get_string("data", "time_format")) {
        adapter = adapter.with_time_format(format);
    }
    if let Some(c) = config {
        let limit = c.get_int("data", "max_size_mb", DEFAULT_MAX_SIZE_MB as i64);
        adapter = adapter.with_max_size_mb(u64::try_from(limit).unwrap_or(DEFAULT_MAX_SIZE_MB));
    }
    info!("loading {} from {}", symbol, path.display());
    adapter.load_series(symbol)
}

fn run_backtest_command(
    config_path: Option<&Path>,
    data_override: Option<&Path>,
    symbol_override: Option<&str>,
    output_path: Option<&Path>,
    rr: Option<f64>,
    lot: Option<f64>,
) -> Result<(), FractalShiftError> {
    let adapter = config_path.map(load_config).transpose()?;
    let config_port = adapter.as_ref().map(|a| a as &dyn ConfigPort);

    let mut config = match config_port {
        Some(c) => {
            validate_backtest_config(c)?;
            build_backtest_config(c)?
        }
        None => BacktestConfig::default(),
    };
    if let Some(rr) = rr {
        config.reward_risk_ratio = rr;
    }
    if let Some(lot) = lot {
        config.lot_size = lot;
    }
    config.validate()?;

    let (path, symbol) = resolve_data_source(data_override, symbol_override, config_port)?;
    let series = load_series(&path, &symbol, config_port)?;
    let result = run_backtest(&series, &config)?;

    print_summary(&result, &config);

    if let Some(output) = output_path {
        let output_str = output.to_string_lossy();
        CsvReportAdapter.write(&result, &config, &output_str)?;
        info!(
            "report written to {} (equity curve: {})",
            output.display(),
            CsvReportAdapter::equity_path(output).display()
        );
    }

    Ok(())
}

fn run_sweep_command(
    config_path: &Path,
    data_override: Option<&Path>,
    symbol_override: Option<&str>,
) -> Result<(), FractalShiftError> {
    let adapter = load_config(config_path)?;
    let config_port: &dyn ConfigPort = &adapter;
    validate_backtest_config(config_port)?;
    validate_sweep_config(config_port)?;

    if !config_port.has_key("sweep", "reward_risk_ratios") && !config_port.has_key("sweep", "windows") {
        warn!("no [sweep] lists configured, running the base configuration only");
    }

    let base = build_backtest_config(config_port)?;
    let grid = build_param_grid(config_port, &base)?;
    let parallel = config_port.get_bool("sweep", "parallel", true);

    let (path, symbol) = resolve_data_source(data_override, symbol_override, Some(config_port))?;
    let series = load_series(&path, &symbol, Some(config_port))?;

    info!("sweeping {} configurations (parallel: {})", grid.size(), parallel);
    let entries = run_sweep(&series, &grid, &base, parallel)?;

    println!(
        "{:>6} {:>6} {:>7} {:>8} {:>12} {:>8}",
        "window", "rr", "trades", "win%", "final", "maxdd%"
    );
    for entry in &entries {
        let s = &entry.result.summary;
        println!(
            "{:>6} {:>6.2} {:>7} {:>8.1} {:>12.2} {:>8.1}",
            entry.config.window,
            entry.config.reward_risk_ratio,
            s.trade_count,
            s.win_rate * 100.0,
            s.final_balance,
            s.max_drawdown * 100.0,
        );
    }

    match best_by_final_balance(&entries) {
        Some(best) => println!(
            "\nBest: window={} rr={:.2} final balance {:.2}",
            best.config.window, best.config.reward_risk_ratio, best.result.summary.final_balance
        ),
        None => warn!("sweep grid is empty"),
    }

    Ok(())
}

fn run_validate(config_path: &Path) -> Result<(), FractalShiftError> {
    let adapter = load_config(config_path)?;
    validate_backtest_config(&adapter)?;
    validate_data_config(&adapter)?;
    validate_sweep_config(&adapter)?;

    let config = build_backtest_config(&adapter)?;
    println!("Backtest configuration:");
    println!("  window:            {}", config.window);
    println!("  offset:            {}", config.offset);
    println!("  reward_risk_ratio: {}", config.reward_risk_ratio);
    println!("  lot_size:          {}", config.lot_size);
    println!("  horizon_bars:      {}", config.horizon_bars);
    println!("  starting_balance:  {}", config.starting_balance);
    println!("  risk_fraction:     {}", config.risk_fraction);
    println!("  compounding:       {}", config.compounding);
    println!("  minimum bars:      {}", config.minimum_bars());
    println!("\nConfiguration is valid.");
    Ok(())
}

fn run_info(data: &Path, symbol_override: Option<&str>) -> Result<(), FractalShiftError> {
    let (path, symbol) = resolve_data_source(Some(data), symbol_override, None)?;
    let series = load_series(&path, &symbol, None)?;

    match (series.first_timestamp(), series.last_timestamp()) {
        (Some(first), Some(last)) => {
            println!("{}: {} bars, {} to {}", symbol, series.len(), first, last)
        }
        _ => println!("{}: no bars", symbol),
    }
    Ok(())
}

fn print_summary(result: &BacktestResult, config: &BacktestConfig) {
    let s = &result.summary;
    println!("=== {} ===", result.symbol);
    println!(
        "Settings:        window {} / offset {} / R {:.2} / horizon {}",
        config.window, config.offset, config.reward_risk_ratio, config.horizon_bars
    );
    println!("Trades:          {}", s.trade_count);
    println!(
        "Outcomes:        {} TP / {} SL / {} none",
        s.wins, s.losses, s.no_outcome
    );
    println!("Win Rate:        {:.1}%", s.win_rate * 100.0);
    println!("Starting:        {:.2}", s.starting_balance);
    println!("Final Balance:   {:.2}", s.final_balance);
    println!("Total Return:    {:.2}%", s.total_return * 100.0);
    println!("Max Drawdown:    -{:.1}%", s.max_drawdown * 100.0);
    println!("Profit Factor:   {:.2}", s.profit_factor);
}
