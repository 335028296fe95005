//! CLI definition and dispatch.

use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::{ENV_PREFIX, FileConfigAdapter};
use crate::adapters::report_adapter::{ReportFormat, report_for};
use crate::domain::config_validation::{validate_runtime_config, validate_scan_config};
use crate::domain::error::TrendscanError;
use crate::domain::indicator::IndicatorParams;
use crate::domain::rule::SignalRule;
use crate::domain::scan::{ScanConfig, ScanReport, scan_report};
use crate::domain::universe::{Universe, parse_tickers};
use crate::logging::{LogFormat, init_logging};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;

/// Keys that may be overridden by `TRENDSCAN_<SECTION>_<KEY>` variables.
pub const CONFIG_KEYS: &[(&str, &str)] = &[
    ("database", "backend"),
    ("database", "conninfo"),
    ("sqlite", "path"),
    ("sqlite", "pool_size"),
    ("postgres", "connection_string"),
    ("postgres", "pool_size"),
    ("csv", "directory"),
    ("scan", "batch_size"),
    ("scan", "lookback_days"),
    ("scan", "max_staleness_days"),
    ("scan", "ma_short"),
    ("scan", "ma_long"),
    ("scan", "rsi_period"),
    ("scan", "rsi_lower"),
    ("scan", "rsi_upper"),
    ("logging", "level"),
    ("logging", "format"),
];

#[derive(Parser, Debug)]
#[command(name = "trendscan", about = "Daily trend-following stock screener")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Scan the active universe for trend-following signals
    Scan {
        #[arg(short, long, env = "TRENDSCAN_CONFIG")]
        config: Option<PathBuf>,
        /// Target date (YYYY-MM-DD), defaults to today in UTC
        #[arg(short, long)]
        date: Option<String>,
        /// Comma-separated tickers replacing the active universe
        #[arg(long)]
        tickers: Option<String>,
        #[arg(short, long, default_value = "table")]
        format: ReportFormat,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long)]
        batch_size: Option<usize>,
    },
    /// List active tickers
    ListTickers {
        #[arg(short, long, env = "TRENDSCAN_CONFIG")]
        config: Option<PathBuf>,
    },
    /// Show stored data range for a ticker
    Info {
        #[arg(long)]
        ticker: String,
        #[arg(short, long, env = "TRENDSCAN_CONFIG")]
        config: Option<PathBuf>,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long, env = "TRENDSCAN_CONFIG")]
        config: Option<PathBuf>,
    },
}

/// Options for one `scan` invocation.
#[derive(Debug, Clone)]
pub struct ScanArgs {
    pub config: Option<PathBuf>,
    pub date: Option<String>,
    pub tickers: Option<String>,
    pub format: ReportFormat,
    pub output: Option<PathBuf>,
    pub batch_size: Option<usize>,
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Scan {
            config,
            date,
            tickers,
            format,
            output,
            batch_size,
        } => run_scan(&ScanArgs {
            config,
            date,
            tickers,
            format,
            output,
            batch_size,
        }),
        Command::ListTickers { config } => run_list_tickers(config.as_deref()),
        Command::Info { ticker, config } => run_info(&ticker, config.as_deref()),
        Command::Validate { config } => run_validate(config.as_deref()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

/// Reads the INI file (if any) and overlays `TRENDSCAN_*` variables.
pub fn load_config(path: Option<&Path>) -> Result<FileConfigAdapter, TrendscanError> {
    let adapter = match path {
        Some(path) => {
            eprintln!("Loading config from {}", path.display());
            FileConfigAdapter::from_file(path).map_err(|e| TrendscanError::ConfigParse {
                file: path.display().to_string(),
                reason: e.to_string(),
            })?
        }
        None => FileConfigAdapter::empty(),
    };
    Ok(adapter.with_env_overrides(ENV_PREFIX, CONFIG_KEYS, std::env::vars()))
}

fn init_logging_from(config: &dyn ConfigPort) {
    let level = config.get_choice("logging", "level", "warn");
    let format = config
        .get_choice("logging", "format", "pretty")
        .parse::<LogFormat>()
        .unwrap_or_default();
    init_logging(&level, format);
}

/// Reads an integer `[scan]` key into `T`, rejecting values that do not fit.
fn scan_int<T: TryFrom<i64>>(
    config: &dyn ConfigPort,
    key: &str,
    default: i64,
) -> Result<T, TrendscanError> {
    let value = config.get_int("scan", key, default);
    T::try_from(value).map_err(|_| TrendscanError::ConfigInvalid {
        section: "scan".into(),
        key: key.into(),
        reason: format!("{} is out of range", value),
    })
}

/// Builds a validated [`ScanConfig`] from the `[scan]` section.
pub fn build_scan_config(config: &dyn ConfigPort) -> Result<ScanConfig, TrendscanError> {
    validate_scan_config(config)?;

    let defaults = ScanConfig::default();
    let windows = defaults.indicators;

    Ok(ScanConfig {
        batch_size: scan_int(config, "batch_size", defaults.batch_size as i64)?,
        lookback_days: scan_int(config, "lookback_days", i64::from(defaults.lookback_days))?,
        max_staleness_days: scan_int(
            config,
            "max_staleness_days",
            i64::from(defaults.max_staleness_days),
        )?,
        indicators: IndicatorParams {
            ma_short: scan_int(config, "ma_short", windows.ma_short as i64)?,
            ma_long: scan_int(config, "ma_long", windows.ma_long as i64)?,
            rsi_period: scan_int(config, "rsi_period", windows.rsi_period as i64)?,
        },
        rule: SignalRule {
            rsi_lower: config.get_double("scan", "rsi_lower", defaults.rule.rsi_lower),
            rsi_upper: config.get_double("scan", "rsi_upper", defaults.rule.rsi_upper),
        },
    })
}

pub fn parse_target_date(date: Option<&str>) -> Result<NaiveDate, TrendscanError> {
    match date {
        None => Ok(Utc::now().date_naive()),
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| {
            TrendscanError::ConfigInvalid {
                section: "scan".into(),
                key: "date".into(),
                reason: "invalid date format (expected YYYY-MM-DD)".into(),
            }
        }),
    }
}

fn backend_name(config: &dyn ConfigPort) -> String {
    config.get_choice("database", "backend", "sqlite")
}

#[cfg(not(all(feature = "sqlite", feature = "postgres")))]
fn feature_missing(backend: &str) -> TrendscanError {
    TrendscanError::ConfigInvalid {
        section: "database".into(),
        key: "backend".into(),
        reason: format!("trendscan was built without the {backend} feature"),
    }
}

#[cfg(feature = "sqlite")]
fn open_sqlite(config: &dyn ConfigPort) -> Result<Box<dyn DataPort>, TrendscanError> {
    use crate::adapters::sqlite_adapter::SqliteAdapter;
    Ok(Box::new(SqliteAdapter::from_config(config)?))
}

#[cfg(not(feature = "sqlite"))]
fn open_sqlite(_config: &dyn ConfigPort) -> Result<Box<dyn DataPort>, TrendscanError> {
    Err(feature_missing("sqlite"))
}

#[cfg(feature = "postgres")]
fn open_postgres(config: &dyn ConfigPort) -> Result<Box<dyn DataPort>, TrendscanError> {
    use crate::adapters::postgres_adapter::PostgresAdapter;
    Ok(Box::new(PostgresAdapter::from_config(config)?))
}

#[cfg(not(feature = "postgres"))]
fn open_postgres(_config: &dyn ConfigPort) -> Result<Box<dyn DataPort>, TrendscanError> {
    Err(feature_missing("postgres"))
}

/// Opens the data port selected by `[database] backend`.
pub fn open_data_port(config: &dyn ConfigPort) -> Result<Box<dyn DataPort>, TrendscanError> {
    let backend = backend_name(config);
    tracing::debug!(%backend, "opening data port");
    match backend.as_str() {
        "sqlite" => open_sqlite(config),
        "postgres" => open_postgres(config),
        "csv" => {
            let directory =
                config
                    .get_string("csv", "directory")
                    .ok_or_else(|| TrendscanError::ConfigMissing {
                        section: "csv".into(),
                        key: "directory".into(),
                    })?;
            Ok(Box::new(CsvAdapter::new(PathBuf::from(directory))))
        }
        other => Err(TrendscanError::ConfigInvalid {
            section: "database".into(),
            key: "backend".into(),
            reason: format!("unknown backend '{other}'"),
        }),
    }
}

/// The `--tickers` override if given, otherwise the active universe.
pub fn resolve_universe(
    data_port: &dyn DataPort,
    tickers: Option<&str>,
) -> Result<Universe, TrendscanError> {
    match tickers {
        Some(list) => Ok(Universe::new(parse_tickers(list)?)),
        None => Universe::active(data_port),
    }
}

/// Scans `universe` and writes the report to `out`.
pub fn run_scan_pipeline(
    data_port: &dyn DataPort,
    universe: &Universe,
    target: NaiveDate,
    scan_config: &ScanConfig,
    format: ReportFormat,
    out: &mut dyn Write,
) -> Result<ScanReport, TrendscanError> {
    let report = scan_report(data_port, universe, target, scan_config)?;

    let writer = report_for(
        format,
        scan_config.indicators.ma_short,
        scan_config.indicators.ma_long,
    );
    writer.write(&report.results, target, out)?;
    out.flush()?;

    Ok(report)
}

pub fn run_scan(args: &ScanArgs) -> Result<(), TrendscanError> {
    // Stage 1: Load and validate config
    let config = load_config(args.config.as_deref())?;
    init_logging_from(&config);
    validate_runtime_config(&config)?;

    let mut scan_config = build_scan_config(&config)?;
    if let Some(batch_size) = args.batch_size {
        if batch_size == 0 {
            return Err(TrendscanError::ConfigInvalid {
                section: "scan".into(),
                key: "batch_size".into(),
                reason: "batch_size must be at least 1".into(),
            });
        }
        scan_config.batch_size = batch_size;
    }

    let target = parse_target_date(args.date.as_deref())?;

    // Stage 2: Open data port and resolve universe
    let data_port = open_data_port(&config)?;
    let universe = resolve_universe(data_port.as_ref(), args.tickers.as_deref())?;
    if universe.is_empty() {
        eprintln!("warning: no tickers to scan");
    }

    eprintln!(
        "Scanning {} tickers in {} batches for {}...",
        universe.count(),
        universe.batch_count(scan_config.batch_size),
        target
    );

    // Stage 3: Scan and write report
    let report = match &args.output {
        Some(path) => {
            let mut out = BufWriter::new(File::create(path)?);
            let report = run_scan_pipeline(
                data_port.as_ref(),
                &universe,
                target,
                &scan_config,
                args.format,
                &mut out,
            )?;
            eprintln!("Report written to: {}", path.display());
            report
        }
        None => {
            let stdout = io::stdout();
            let mut out = stdout.lock();
            run_scan_pipeline(
                data_port.as_ref(),
                &universe,
                target,
                &scan_config,
                args.format,
                &mut out,
            )?
        }
    };

    eprintln!(
        "{} matches, {} evaluated, {} skipped",
        report.results.len(),
        report.evaluated,
        report.skipped.len()
    );
    Ok(())
}

fn run_list_tickers(config_path: Option<&Path>) -> Result<(), TrendscanError> {
    let config = load_config(config_path)?;
    init_logging_from(&config);
    validate_runtime_config(&config)?;

    let data_port = open_data_port(&config)?;
    let tickers = data_port.list_active_tickers()?;

    if tickers.is_empty() {
        eprintln!("No active tickers found");
        return Ok(());
    }
    let stdout = io::stdout();
    let mut out = stdout.lock();
    for ticker in &tickers {
        writeln!(out, "{}", ticker)?;
    }
    eprintln!("{} tickers found", tickers.len());
    Ok(())
}

fn run_info(ticker: &str, config_path: Option<&Path>) -> Result<(), TrendscanError> {
    let config = load_config(config_path)?;
    init_logging_from(&config);
    validate_runtime_config(&config)?;

    let data_port = open_data_port(&config)?;
    let ticker = ticker.trim().to_uppercase();
    match data_port.get_data_range(&ticker)? {
        Some((first, last, count)) => {
            println!("{}: {} to {} ({} bars)", ticker, first, last, count);
        }
        None => {
            println!("{}: no data", ticker);
        }
    }
    Ok(())
}

fn run_validate(config_path: Option<&Path>) -> Result<(), TrendscanError> {
    let config = load_config(config_path)?;
    validate_runtime_config(&config)?;
    let scan_config = build_scan_config(&config)?;

    eprintln!("\nBackend: {}", backend_name(&config));
    eprintln!("\nScan settings:");
    eprintln!("  batch_size:         {}", scan_config.batch_size);
    eprintln!("  lookback_days:      {}", scan_config.lookback_days);
    eprintln!("  max_staleness_days: {}", scan_config.max_staleness_days);
    eprintln!(
        "  rsi band:           [{}, {}]",
        scan_config.rule.rsi_lower, scan_config.rule.rsi_upper
    );
    eprintln!("\nIndicators to compute:");
    for indicator in scan_config.indicators.indicators() {
        eprintln!("  {}", indicator);
    }
    eprintln!("  minimum history:    {} bars", scan_config.min_history());

    eprintln!("\nConfig validated successfully");
    Ok(())
}
