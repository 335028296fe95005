//! CSV directory data adapter.
//!
//! Layout: one `<TICKER>.csv` per ticker with header
//! `date,open,high,low,close,volume[,vwap,transactions]`, and an optional
//! `tickers.csv` (`ticker,active`) listing the universe. Without
//! `tickers.csv` every bar file counts as an active ticker.
//!
//! Rows with a missing or unparseable field are skipped one by one.

use crate::domain::bar::DailyBar;
use crate::domain::error::TrendscanError;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use serde::Deserialize;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

pub const UNIVERSE_FILE: &str = "tickers.csv";

pub struct CsvAdapter {
    base_path: PathBuf,
}

#[derive(Debug, Deserialize)]
struct BarRow {
    date: String,
    open: Option<f64>,
    high: Option<f64>,
    low: Option<f64>,
    close: Option<f64>,
    volume: Option<f64>,
    #[serde(default)]
    vwap: Option<f64>,
    #[serde(default)]
    transactions: Option<u64>,
}

impl BarRow {
    fn into_bar(self, ticker: &str) -> Option<DailyBar> {
        Some(DailyBar {
            ticker: ticker.to_string(),
            date: NaiveDate::parse_from_str(self.date.trim(), "%Y-%m-%d").ok()?,
            open: self.open?,
            high: self.high?,
            low: self.low?,
            close: self.close?,
            volume: self.volume?,
            vwap: self.vwap,
            transactions: self.transactions,
        })
    }
}

#[derive(Debug, Deserialize)]
struct UniverseRow {
    ticker: String,
    #[serde(default)]
    active: Option<String>,
}

fn parse_active(value: Option<&str>) -> bool {
    match value.map(|v| v.trim().to_lowercase()) {
        None => true,
        Some(v) if v.is_empty() => true,
        Some(v) => matches!(v.as_str(), "true" | "yes" | "1"),
    }
}

fn read_error(path: &std::path::Path, e: impl std::fmt::Display) -> TrendscanError {
    TrendscanError::DataStoreUnavailable {
        reason: format!("failed to read {}: {}", path.display(), e),
    }
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, ticker: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", ticker))
    }

    /// Bars stored for `ticker`, sorted by date. A missing file means no bars.
    fn read_bars(&self, ticker: &str) -> Result<Vec<DailyBar>, TrendscanError> {
        let path = self.csv_path(ticker);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(read_error(&path, e)),
        };

        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(content.as_bytes());

        let mut bars = Vec::new();
        for (line, result) in rdr.deserialize::<BarRow>().enumerate() {
            match result.ok().and_then(|row| row.into_bar(ticker)) {
                Some(bar) => bars.push(bar),
                None => {
                    tracing::warn!(%ticker, row = line + 1, "skipping malformed csv row");
                }
            }
        }

        bars.sort_by_key(|b| b.date);
        Ok(bars)
    }

    fn list_bar_files(&self) -> Result<Vec<String>, TrendscanError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| read_error(&self.base_path, e))?;

        let mut tickers = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| read_error(&self.base_path, e))?;
            let name = entry.file_name();
            let name_str = name.to_string_lossy();

            if name_str == UNIVERSE_FILE {
                continue;
            }
            if let Some(ticker) = name_str.strip_suffix(".csv") {
                tickers.push(ticker.to_string());
            }
        }

        tickers.sort();
        Ok(tickers)
    }
}

impl DataPort for CsvAdapter {
    fn list_active_tickers(&self) -> Result<Vec<String>, TrendscanError> {
        let path = self.base_path.join(UNIVERSE_FILE);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return self.list_bar_files(),
            Err(e) => return Err(read_error(&path, e)),
        };

        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(content.as_bytes());

        let mut tickers = Vec::new();
        for result in rdr.deserialize::<UniverseRow>() {
            let row = result.map_err(|e| TrendscanError::DataStoreQuery {
                reason: format!("invalid row in {}: {}", path.display(), e),
            })?;
            if parse_active(row.active.as_deref()) && !row.ticker.is_empty() {
                tickers.push(row.ticker);
            }
        }

        tickers.sort();
        tickers.dedup();
        Ok(tickers)
    }

    fn fetch_bars(
        &self,
        tickers: &[String],
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<DailyBar>, TrendscanError> {
        let mut bars = Vec::new();
        for ticker in tickers {
            bars.extend(
                self.read_bars(ticker)?
                    .into_iter()
                    .filter(|b| b.date >= start_date && b.date <= end_date),
            );
        }
        bars.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.ticker.cmp(&b.ticker)));
        Ok(bars)
    }

    fn get_data_range(
        &self,
        ticker: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, TrendscanError> {
        let bars = self.read_bars(ticker)?;
        match (bars.first(), bars.last()) {
            (Some(first), Some(last)) => Ok(Some((first.date, last.date, bars.len()))),
            _ => Ok(None),
        }
    }
}
