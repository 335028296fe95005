//! CLI integration tests for the scan command orchestration.
//!
//! Tests cover:
//! - Config parsing (build_scan_config) with defaults, overrides and bad values
//! - Target date and ticker override resolution
//! - Backend selection (open_data_port)
//! - Full scan through INI files and a CSV directory on disk
//! - Argument parsing

mod common;

use clap::Parser;
use common::*;
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::TempDir;
use trendscan::adapters::file_config_adapter::FileConfigAdapter;
use trendscan::adapters::report_adapter::ReportFormat;
use trendscan::cli::{self, Cli, Command, ScanArgs};
use trendscan::domain::error::TrendscanError;

fn write_temp_ini(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

fn write_csv_bars(dir: &Path, ticker: &str, bars: &[DailyBar]) {
    let mut content = String::from("date,open,high,low,close,volume\n");
    for b in bars {
        content.push_str(&format!(
            "{},{},{},{},{},{}\n",
            b.date, b.open, b.high, b.low, b.close, b.volume
        ));
    }
    fs::write(dir.join(format!("{ticker}.csv")), content).unwrap();
}

/// CSV directory with one matching, one rejected and one short ticker.
fn csv_fixture() -> TempDir {
    let dir = TempDir::new().unwrap();
    write_csv_bars(dir.path(), "AAPL", &series("AAPL", &uptrend(250), 0));
    write_csv_bars(dir.path(), "MSFT", &series("MSFT", &downtrend(250), 0));
    write_csv_bars(dir.path(), "TSLA", &series("TSLA", &uptrend(40), 0));
    dir
}

fn csv_ini(dir: &Path) -> String {
    format!(
        "[database]\nbackend = csv\n\n[csv]\ndirectory = {}\n\n[scan]\nbatch_size = 2\n",
        dir.display()
    )
}

mod config_loading {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config = cli::build_scan_config(&FileConfigAdapter::empty()).unwrap();
        assert_eq!(config.batch_size, 50);
        assert_eq!(config.lookback_days, 365);
        assert_eq!(config.max_staleness_days, 5);
        assert_eq!(config.indicators.ma_short, 50);
        assert_eq!(config.indicators.ma_long, 200);
        assert_eq!(config.indicators.rsi_period, 14);
        assert_eq!(config.rule.rsi_lower, 50.0);
        assert_eq!(config.rule.rsi_upper, 70.0);
    }

    #[test]
    fn scan_section_overrides_defaults() {
        let adapter = FileConfigAdapter::from_string(
            r#"
[scan]
batch_size = 10
lookback_days = 120
max_staleness_days = 3
ma_short = 10
ma_long = 30
rsi_period = 7
rsi_lower = 40
rsi_upper = 80.5
"#,
        )
        .unwrap();
        let config = cli::build_scan_config(&adapter).unwrap();
        assert_eq!(config.batch_size, 10);
        assert_eq!(config.lookback_days, 120);
        assert_eq!(config.max_staleness_days, 3);
        assert_eq!(config.indicators.ma_short, 10);
        assert_eq!(config.indicators.ma_long, 30);
        assert_eq!(config.indicators.rsi_period, 7);
        assert_eq!(config.rule.rsi_lower, 40.0);
        assert_eq!(config.rule.rsi_upper, 80.5);
        assert_eq!(config.min_history(), 30);
    }

    #[test]
    fn inverted_windows_are_rejected() {
        let adapter =
            FileConfigAdapter::from_string("[scan]\nma_short = 200\nma_long = 50\n").unwrap();
        match cli::build_scan_config(&adapter) {
            Err(TrendscanError::ConfigInvalid { key, .. }) => assert_eq!(key, "ma_short"),
            other => panic!("expected ConfigInvalid, got {other:?}"),
        }
    }

    #[test]
    fn oversized_day_settings_are_rejected() {
        for ini in [
            "[scan]\nlookback_days = 4000000000\n",
            "[scan]\nmax_staleness_days = 4294967296\n",
        ] {
            let adapter = FileConfigAdapter::from_string(ini).unwrap();
            match cli::build_scan_config(&adapter) {
                Err(TrendscanError::ConfigInvalid { section, .. }) => assert_eq!(section, "scan"),
                other => panic!("expected ConfigInvalid for {ini:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn largest_day_settings_survive_conversion() {
        let adapter = FileConfigAdapter::from_string(
            "[scan]\nlookback_days = 36500\nmax_staleness_days = 36500\n",
        )
        .unwrap();
        let config = cli::build_scan_config(&adapter).unwrap();
        assert_eq!(config.lookback_days, 36_500);
        assert_eq!(config.max_staleness_days, 36_500);
    }

    #[test]
    fn missing_file_is_parse_error() {
        let err = cli::load_config(Some(Path::new("/nonexistent/trendscan.ini")))
            .err()
            .unwrap();
        assert!(matches!(err, TrendscanError::ConfigParse { .. }));
    }

    #[test]
    fn load_config_reads_file() {
        let file = write_temp_ini("[scan]\nbatch_size = 7\n");
        let adapter = cli::load_config(Some(file.path())).unwrap();
        assert_eq!(cli::build_scan_config(&adapter).unwrap().batch_size, 7);
    }
}

mod argument_resolution {
    use super::*;

    #[test]
    fn target_date_parses_iso_format() {
        assert_eq!(
            cli::parse_target_date(Some("2024-06-28")).unwrap(),
            target()
        );
        assert!(matches!(
            cli::parse_target_date(Some("28/06/2024")),
            Err(TrendscanError::ConfigInvalid { .. })
        ));
    }

    #[test]
    fn target_date_defaults_to_today() {
        let today = chrono::Utc::now().date_naive();
        let parsed = cli::parse_target_date(None).unwrap();
        assert!((parsed - today).num_days().abs() <= 1);
    }

    #[test]
    fn ticker_override_replaces_active_universe() {
        let port = MockDataPort::new().with_bars("AAPL", Vec::new());
        let universe = cli::resolve_universe(&port, Some("msft, nvda")).unwrap();
        assert_eq!(universe.tickers, vec!["MSFT", "NVDA"]);
        assert_eq!(port.list_calls.get(), 0);
    }

    #[test]
    fn no_override_uses_active_universe() {
        let port = MockDataPort::new().with_active("AAPL").with_active("MSFT");
        let universe = cli::resolve_universe(&port, None).unwrap();
        assert_eq!(universe.tickers, vec!["AAPL", "MSFT"]);
    }

    #[test]
    fn duplicate_override_is_rejected() {
        let port = MockDataPort::new();
        let err = cli::resolve_universe(&port, Some("AAPL,aapl")).unwrap_err();
        assert!(matches!(err, TrendscanError::InvalidTickers { .. }));
    }
}

mod backend_selection {
    use super::*;

    #[test]
    fn unknown_backend_is_rejected() {
        let adapter = FileConfigAdapter::from_string("[database]\nbackend = mongo\n").unwrap();
        assert!(matches!(
            cli::open_data_port(&adapter),
            Err(TrendscanError::ConfigInvalid { .. })
        ));
    }

    #[test]
    fn csv_backend_requires_directory() {
        let adapter = FileConfigAdapter::from_string("[database]\nbackend = csv\n").unwrap();
        match cli::open_data_port(&adapter) {
            Err(TrendscanError::ConfigMissing { section, key }) => {
                assert_eq!(section, "csv");
                assert_eq!(key, "directory");
            }
            Err(other) => panic!("expected ConfigMissing, got {other:?}"),
            Ok(_) => panic!("expected error, got Ok"),
        }
    }

    #[test]
    fn csv_backend_lists_bar_files() {
        let dir = csv_fixture();
        let adapter = FileConfigAdapter::from_string(&csv_ini(dir.path())).unwrap();
        let port = cli::open_data_port(&adapter).unwrap();
        assert_eq!(
            port.list_active_tickers().unwrap(),
            vec!["AAPL", "MSFT", "TSLA"]
        );
    }

    #[cfg(feature = "sqlite")]
    #[test]
    fn sqlite_backend_reads_seeded_file() {
        use trendscan::adapters::sqlite_adapter::SqliteAdapter;
        use trendscan::domain::stock::Stock;

        let dir = TempDir::new().unwrap();
        let db_path = dir.path().join("bars.db");
        let ini = format!("[sqlite]\npath = {}\n", db_path.display());
        let adapter = FileConfigAdapter::from_string(&ini).unwrap();

        let seed = SqliteAdapter::from_config(&adapter).unwrap();
        seed.initialize_schema().unwrap();
        seed.insert_bars(&series("AAPL", &uptrend(250), 0)).unwrap();
        seed.upsert_stocks(&[Stock::new("AAPL", "Apple Inc.")]).unwrap();
        drop(seed);

        let port = cli::open_data_port(&adapter).unwrap();
        let scan_config = cli::build_scan_config(&adapter).unwrap();
        let universe = cli::resolve_universe(port.as_ref(), None).unwrap();

        let mut out = Vec::new();
        let report = cli::run_scan_pipeline(
            port.as_ref(),
            &universe,
            target(),
            &scan_config,
            ReportFormat::Csv,
            &mut out,
        )
        .unwrap();

        assert_eq!(report.results.len(), 1);
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("ticker,date,close,rsi,ma_short,ma_long\n"));
        assert!(text.contains("AAPL,2024-06-28,226"));
    }
}

mod scan_pipeline {
    use super::*;

    #[test]
    fn csv_scan_writes_table() {
        let dir = csv_fixture();
        let ini = write_temp_ini(&csv_ini(dir.path()));
        let adapter = cli::load_config(Some(ini.path())).unwrap();

        let port = cli::open_data_port(&adapter).unwrap();
        let scan_config = cli::build_scan_config(&adapter).unwrap();
        let universe = cli::resolve_universe(port.as_ref(), None).unwrap();

        let mut out = Vec::new();
        let report = cli::run_scan_pipeline(
            port.as_ref(),
            &universe,
            target(),
            &scan_config,
            ReportFormat::Table,
            &mut out,
        )
        .unwrap();

        assert_eq!(report.batches, 2);
        assert_eq!(report.evaluated, 2);
        assert_eq!(report.skipped.len(), 1);

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "--- Strategy Results (2024-06-28) ---");
        assert!(lines[2].starts_with("AAPL"));
        assert_eq!(lines.last().copied(), Some("Total Matches: 1"));
    }

    #[test]
    fn run_scan_writes_json_report_file() {
        let dir = csv_fixture();
        let ini = write_temp_ini(&csv_ini(dir.path()));
        let output = dir.path().join("out").with_extension("json");

        cli::run_scan(&ScanArgs {
            config: Some(ini.path().to_path_buf()),
            date: Some("2024-06-28".into()),
            tickers: Some("msft,aapl".into()),
            format: ReportFormat::Json,
            output: Some(output.clone()),
            batch_size: Some(1),
        })
        .unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
        assert_eq!(value["target_date"], "2024-06-28");
        assert_eq!(value["count"], 1);
        assert_eq!(value["results"][0]["ticker"], "AAPL");
    }

    #[test]
    fn run_scan_rejects_zero_batch_size() {
        let dir = csv_fixture();
        let ini = write_temp_ini(&csv_ini(dir.path()));

        let err = cli::run_scan(&ScanArgs {
            config: Some(ini.path().to_path_buf()),
            date: Some("2024-06-28".into()),
            tickers: None,
            format: ReportFormat::Table,
            output: Some(dir.path().join("unused.txt")),
            batch_size: Some(0),
        })
        .unwrap_err();
        assert!(matches!(err, TrendscanError::ConfigInvalid { .. }));
    }
}

mod argument_parsing {
    use super::*;

    #[test]
    fn scan_arguments() {
        let cli = Cli::try_parse_from([
            "trendscan",
            "scan",
            "--config",
            "trendscan.ini",
            "--date",
            "2024-06-28",
            "--tickers",
            "AAPL,MSFT",
            "--format",
            "csv",
            "--batch-size",
            "10",
        ])
        .unwrap();

        match cli.command {
            Command::Scan {
                config,
                date,
                tickers,
                format,
                output,
                batch_size,
            } => {
                assert_eq!(config.unwrap().to_str(), Some("trendscan.ini"));
                assert_eq!(date.as_deref(), Some("2024-06-28"));
                assert_eq!(tickers.as_deref(), Some("AAPL,MSFT"));
                assert_eq!(format, ReportFormat::Csv);
                assert!(output.is_none());
                assert_eq!(batch_size, Some(10));
            }
            other => panic!("expected scan, got {other:?}"),
        }
    }

    #[test]
    fn unknown_format_is_rejected() {
        let result = Cli::try_parse_from(["trendscan", "scan", "--format", "xml"]);
        assert!(result.is_err());
    }

    #[test]
    fn info_requires_ticker() {
        assert!(Cli::try_parse_from(["trendscan", "info"]).is_err());
        let cli = Cli::try_parse_from(["trendscan", "info", "--ticker", "AAPL"]).unwrap();
        assert!(matches!(cli.command, Command::Info { ref ticker, .. } if ticker == "AAPL"));
    }
}
