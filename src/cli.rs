//! CLI definition and dispatch.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::config_validation::{build_sim_config, validate_sim_config};
use crate::domain::engine::simulate;
use crate::domain::error::DivtraderError;
use crate::domain::mode::ConfiguredMode;
use crate::domain::mode_resolver::{build_mode_map, enrich_daily, weekly_mode_info};
use crate::domain::series::{validate_series, ClosePoint};
use crate::domain::summary::SimulationSummary;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(name = "divtrader", about = "Capital-division LOC trading simulator")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a simulation over a historical close series
    Simulate {
        #[arg(short, long)]
        config: PathBuf,
        /// Directory containing <code>.csv close series
        #[arg(short, long)]
        data: PathBuf,
        #[arg(long)]
        code: Option<String>,
        /// Write the daily ledger as CSV
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Show the weekly momentum mode decision for a series
    Modes {
        #[arg(short, long)]
        data: PathBuf,
        #[arg(long)]
        code: String,
    },
    /// Validate a simulation configuration
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Show data range for a code
    Info {
        #[arg(short, long)]
        data: PathBuf,
        #[arg(long)]
        code: String,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Simulate {
            config,
            data,
            code,
            output,
        } => run_simulate(&config, &data, code.as_deref(), output.as_ref()),
        Command::Modes { data, code } => run_modes(&data, &code),
        Command::Validate { config } => run_validate(&config),
        Command::Info { data, code } => run_info(&data, &code),
    }
}

pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        let err = DivtraderError::ConfigParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        };
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

/// Load, sort, and validate the close series for a code.
pub fn load_series(data_dir: &PathBuf, code: &str) -> Result<Vec<ClosePoint>, DivtraderError> {
    let adapter = CsvAdapter::new(data_dir.clone());
    let series = adapter.fetch_closes(code, NaiveDate::MIN, NaiveDate::MAX)?;
    validate_series(&series)?;
    if series.is_empty() {
        return Err(DivtraderError::NoData {
            code: code.to_string(),
        });
    }
    Ok(series)
}

/// Code from the CLI override, falling back to `[data] code` in the config.
pub fn resolve_code(override_code: Option<&str>, config: &dyn ConfigPort) -> Option<String> {
    match override_code {
        Some(code) if !code.trim().is_empty() => Some(code.to_string()),
        _ => config
            .get_string("data", "code")
            .filter(|c| !c.trim().is_empty()),
    }
}

fn run_simulate(
    config_path: &PathBuf,
    data_dir: &PathBuf,
    code_override: Option<&str>,
    output_path: Option<&PathBuf>,
) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let sim_config = match build_sim_config(&adapter) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let Some(code) = resolve_code(code_override, &adapter) else {
        eprintln!("error: no code configured (pass --code or set [data] code)");
        return ExitCode::from(2);
    };

    eprintln!("Loading close series for {} from {}", code, data_dir.display());
    let series = match load_series(data_dir, &code) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let mode_map = match sim_config.mode {
        ConfiguredMode::Auto => Some(build_mode_map(&series)),
        _ => None,
    };

    let records = match simulate(&sim_config, &series, mode_map.as_ref()) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    let summary = SimulationSummary::compute(&records);

    println!(
        "Simulated {} trading days for {} ({} divisions, {} mode)",
        records.len(),
        code,
        sim_config.divisions,
        sim_config.mode
    );
    if let Some(last) = records.last() {
        println!("  final assets:    {:.2}", last.total_assets);
    }
    println!("  return:          {:.2}%", summary.final_return);
    println!(
        "  trades:          {} ({} buys, {} sells)",
        summary.total_trades, summary.buy_trades, summary.sell_trades
    );
    println!("  win rate:        {:.1}%", summary.win_rate);
    println!("  max drawdown:    {:.2}%", summary.max_drawdown * 100.0);
    println!("  commission paid: {:.2}", summary.total_commission);
    println!("  rebalances:      {}", summary.rebalances);

    if let Some(path) = output_path {
        let report = CsvReportAdapter::new();
        let path_str = path.display().to_string();
        if let Err(e) = report.write(&records, &summary, &path_str) {
            eprintln!("error: {e}");
            return (&e).into();
        }
    }

    ExitCode::SUCCESS
}

fn run_modes(data_dir: &PathBuf, code: &str) -> ExitCode {
    let series = match load_series(data_dir, code) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let info = weekly_mode_info(&series);
    println!("Weekly mode for {}: {}", code, info.mode);
    println!("  reason: {}", info.reason);
    if let (Some(prior_date), Some(prior_rsi)) = (info.prior_week_date, info.prior_week_rsi) {
        println!("  prior week: {} RSI {:.2}", prior_date, prior_rsi);
    }
    if let (Some(last_date), Some(last_rsi)) = (info.last_week_date, info.last_week_rsi) {
        println!("  last week:  {} RSI {:.2}", last_date, last_rsi);
    }

    let samples = enrich_daily(&series);
    println!("Recent daily readings:");
    for sample in samples.iter().rev().take(5).rev() {
        let rsi = sample
            .rsi
            .map(|v| format!("{:.2}", v))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  {} close {:.2} RSI {} [{}] {} ({})",
            sample.date,
            sample.close,
            rsi,
            sample.strength.label(),
            sample.mode,
            sample.reason
        );
    }

    ExitCode::SUCCESS
}

fn run_validate(config_path: &PathBuf) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    match validate_sim_config(&adapter) {
        Ok(()) => {
            println!("Config OK: {}", config_path.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

fn run_info(data_dir: &PathBuf, code: &str) -> ExitCode {
    let adapter = CsvAdapter::new(data_dir.clone());
    match adapter.get_data_range(code) {
        Ok(Some((first, last, count))) => {
            println!("{}: {} points from {} to {}", code, count, first, last);
            ExitCode::SUCCESS
        }
        Ok(None) => {
            println!("{}: no data", code);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}
