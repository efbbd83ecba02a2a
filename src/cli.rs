//! CLI definition and dispatch.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::run_lock::RunLock;
use crate::domain::config_validation::validate_config;
use crate::domain::error::ScreenerError;
use crate::domain::sector::SectorTable;
use crate::domain::selection::{SelectionConfig, SelectionEngine, SelectionReport, SelectionRequest};
use crate::domain::universe::{parse_codes, UniversePolicy};
use crate::ports::config_port::ConfigPort;
use crate::ports::report_port::ReportPort;

const DEFAULT_LOCK_FILE: &str = "mainline.lock";

#[derive(Parser, Debug)]
#[command(name = "mainline", about = "Main-line sector stock screener")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a full selection
    Select {
        #[arg(short, long)]
        config: PathBuf,
        /// Screen as of this trading day (YYYY-MM-DD)
        #[arg(long)]
        as_of: Option<NaiveDate>,
        /// Write the ranked result set to this CSV file
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Comma-separated code list, overriding [universe] codes
        #[arg(long)]
        codes: Option<String>,
    },
    /// Print the sector classification table
    Sectors {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        as_of: Option<NaiveDate>,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Select {
            config,
            as_of,
            output,
            codes,
        } => run_select(&config, as_of, output.as_ref(), codes.as_deref()),
        Command::Sectors { config, as_of } => run_sectors(&config, as_of),
        Command::Validate { config } => run_validate(&config),
    }
}

pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|err| {
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

/// `RUST_LOG` wins over `[logging] level`, which wins over `info`.
pub fn init_logging(config: &dyn ConfigPort) {
    let level = config
        .get_string("logging", "level")
        .filter(|l| !l.trim().is_empty())
        .unwrap_or_else(|| "info".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn get_usize(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: usize,
) -> Result<usize, ScreenerError> {
    let value = config.get_int(section, key, default as i64);
    usize::try_from(value)
        .map_err(|_| ScreenerError::invalid(section, key, format!("{} must be non-negative", key)))
}

pub fn build_selection_config(config: &dyn ConfigPort) -> Result<SelectionConfig, ScreenerError> {
    let defaults = SelectionConfig::default();
    Ok(SelectionConfig {
        breakout_window: get_usize(config, "selection", "breakout_window", defaults.breakout_window)?,
        volume_ma_window: get_usize(config, "selection", "volume_ma_window", defaults.volume_ma_window)?,
        rs_lookback: get_usize(config, "selection", "rs_lookback", defaults.rs_lookback)?,
        rs_threshold: config.get_double("selection", "rs_threshold", defaults.rs_threshold),
        min_score: config.get_double("selection", "min_score", defaults.min_score),
        sector_percentile_cutoff: config.get_double(
            "selection",
            "sector_percentile_cutoff",
            defaults.sector_percentile_cutoff,
        ),
    })
}

/// `codes_override` replaces `[universe] codes`; `top_n = 0` means no cap.
pub fn build_universe_policy(
    config: &dyn ConfigPort,
    codes_override: Option<&str>,
) -> Result<UniversePolicy, ScreenerError> {
    let codes = match codes_override.map(String::from).or_else(|| {
        config
            .get_string("universe", "codes")
            .filter(|s| !s.trim().is_empty())
    }) {
        Some(list) => Some(
            parse_codes(&list)
                .map_err(|e| ScreenerError::invalid("universe", "codes", e.to_string()))?,
        ),
        None => None,
    };
    let top_n = match get_usize(config, "universe", "top_n", 0)? {
        0 => None,
        n => Some(n),
    };
    Ok(UniversePolicy { codes, top_n })
}

pub fn build_selection_request(
    config: &dyn ConfigPort,
    as_of: Option<NaiveDate>,
    codes_override: Option<&str>,
) -> Result<SelectionRequest, ScreenerError> {
    let benchmark = config
        .get_string("data", "benchmark")
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ScreenerError::ConfigMissing {
            section: "data".into(),
            key: "benchmark".into(),
        })?;

    Ok(SelectionRequest {
        benchmark,
        as_of,
        universe: build_universe_policy(config, codes_override)?,
        config: build_selection_config(config)?,
    })
}

/// Load, validate and initialise logging. Errors are already printed.
fn prepare(config_path: &PathBuf) -> Result<FileConfigAdapter, ExitCode> {
    let adapter = load_config(config_path)?;
    init_logging(&adapter);
    if let Err(e) = validate_config(&adapter) {
        eprintln!("error: {e}");
        return Err((&e).into());
    }
    Ok(adapter)
}

fn run_select(
    config_path: &PathBuf,
    as_of: Option<NaiveDate>,
    output_path: Option<&PathBuf>,
    codes_override: Option<&str>,
) -> ExitCode {
    let adapter = match prepare(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    match select(&adapter, as_of, output_path, codes_override) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

pub fn select(
    config: &dyn ConfigPort,
    as_of: Option<NaiveDate>,
    output_path: Option<&PathBuf>,
    codes_override: Option<&str>,
) -> Result<(), ScreenerError> {
    let request = build_selection_request(config, as_of, codes_override)?;
    let data_port = CsvAdapter::from_config(config)?;

    let lock_path = config
        .get_string("run", "lock_file")
        .filter(|p| !p.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_LOCK_FILE.to_string());
    let _lock = RunLock::acquire(&lock_path)?;

    let report = SelectionEngine::new(&data_port).run(&request)?;

    let max_rows = get_usize(config, "report", "max_rows", 20)?;
    let show_diagnostics = config.get_bool("report", "diagnostics", false);
    print!("{}", render_report(&report, max_rows, show_diagnostics));

    let output = output_path
        .map(|p| p.display().to_string())
        .or_else(|| {
            config
                .get_string("report", "output")
                .filter(|p| !p.trim().is_empty())
        });
    if let Some(output) = output {
        CsvReportAdapter::new(show_diagnostics).write(&report, &output)?;
        eprintln!("Report written to: {}", output);
    }
    Ok(())
}

fn run_sectors(config_path: &PathBuf, as_of: Option<NaiveDate>) -> ExitCode {
    let adapter = match prepare(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let result = build_selection_request(&adapter, as_of, None).and_then(|request| {
        let data_port = CsvAdapter::from_config(&adapter)?;
        SelectionEngine::new(&data_port).classify(&request)
    });
    match result {
        Ok(table) => {
            info!(sectors = table.len(), "classification complete");
            print!("{}", render_sectors(&table));
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

fn run_validate(config_path: &PathBuf) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    if let Err(e) = validate_config(&adapter) {
        eprintln!("error: {e}");
        return (&e).into();
    }
    match build_selection_request(&adapter, None, None) {
        Ok(request) => {
            eprintln!("  benchmark:   {}", request.benchmark);
            eprintln!("  min history: {} bars", request.config.min_history_bars());
            eprintln!("\nConfiguration is valid.");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

pub fn render_report(report: &SelectionReport, max_rows: usize, show_diagnostics: bool) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n", report.summary()));

    let main: Vec<&str> = report.main_sectors().map(|s| s.industry.as_str()).collect();
    if main.is_empty() {
        out.push_str("Main-line sectors: none\n");
    } else {
        out.push_str(&format!("Main-line sectors: {}\n", main.join(", ")));
    }

    if report.results.is_empty() {
        out.push_str("\nNo stocks selected.\n");
    } else {
        out.push_str(&format!(
            "\n{:>4}  {:<10} {:<16} {:<16} {:>7} {:>6} {:>7} {:>7} {:>5}\n",
            "#", "code", "name", "industry", "score", "RS", "ret_rk", "flow_rk", "high"
        ));
        for (i, r) in report.results.iter().take(max_rows).enumerate() {
            out.push_str(&format!(
                "{:>4}  {:<10} {:<16} {:<16} {:>7.2} {:>6.2} {:>7.3} {:>7.3} {:>5}\n",
                i + 1,
                r.code,
                r.name,
                r.industry,
                r.score,
                r.rs,
                r.sector_return_rank,
                r.sector_flow_rank,
                if r.near_high { "yes" } else { "" }
            ));
        }
        if report.results.len() > max_rows {
            out.push_str(&format!(
                "  ... {} more\n",
                report.results.len() - max_rows
            ));
        }
    }

    if show_diagnostics {
        if !report.skipped.is_empty() {
            out.push_str("\nSkipped:\n");
            for s in &report.skipped {
                out.push_str(&format!("  {} {}: {}\n", s.code, s.name, s.reason));
            }
        }
        if !report.rejected.is_empty() {
            out.push_str("\nRejected:\n");
            for r in &report.rejected {
                out.push_str(&format!("  {} {}: {}\n", r.code, r.name, r.reason));
            }
        }
    }
    out
}

pub fn render_sectors(table: &SectorTable) -> String {
    let mut out = format!(
        "{:<20} {:>7} {:>10} {:>14} {:>7} {:>7} {:>5}\n",
        "industry", "members", "avg_ret_5d", "net_flow_5d", "ret_rk", "flow_rk", "main"
    );
    for s in table.iter() {
        out.push_str(&format!(
            "{:<20} {:>7} {:>10.4} {:>14.2} {:>7.3} {:>7.3} {:>5}\n",
            s.industry,
            s.members,
            s.avg_return_5d,
            s.sum_net_flow_5d,
            s.return_percentile,
            s.flow_percentile,
            if s.is_main_sector { "yes" } else { "" }
        ));
    }
    out
}
