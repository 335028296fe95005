//! SQLite data adapter.
//!
//! Tables: `daily_bars` keyed by (ticker, date) and `stocks` keyed by ticker.
//! Dates are stored as `YYYY-MM-DD` text so range filters compare lexically.

use crate::domain::bar::DailyBar;
use crate::domain::error::TrendscanError;
use crate::domain::stock::Stock;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::types::{ToSql, ValueRef};
use rusqlite::{params, Row};

const DATE_FORMAT: &str = "%Y-%m-%d";

pub struct SqliteAdapter {
    pool: Pool<SqliteConnectionManager>,
}

fn pool_error(e: r2d2::Error) -> TrendscanError {
    TrendscanError::DataStoreUnavailable {
        reason: e.to_string(),
    }
}

fn query_error(e: rusqlite::Error) -> TrendscanError {
    TrendscanError::DataStoreQuery {
        reason: e.to_string(),
    }
}

fn parse_date(value: String) -> rusqlite::Result<NaiveDate> {
    NaiveDate::parse_from_str(&value, DATE_FORMAT).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(
            value.len(),
            rusqlite::types::Type::Text,
            Box::new(e),
        )
    })
}

/// Reads a numeric column, mapping NULL or non-numeric text to NaN.
fn lenient_f64(row: &Row<'_>, idx: usize) -> rusqlite::Result<f64> {
    Ok(match row.get_ref(idx)? {
        ValueRef::Integer(i) => i as f64,
        ValueRef::Real(f) => f,
        ValueRef::Text(t) => std::str::from_utf8(t)
            .ok()
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(f64::NAN),
        ValueRef::Null | ValueRef::Blob(_) => f64::NAN,
    })
}

/// Decodes one `daily_bars` row. Unreadable prices become NaN so the loader
/// drops the bar; a row whose date does not parse yields `None`.
fn row_to_bar(row: &Row<'_>) -> rusqlite::Result<Option<DailyBar>> {
    let ticker: String = row.get(0)?;
    let date = match row.get_ref(1)? {
        ValueRef::Text(t) => std::str::from_utf8(t)
            .ok()
            .and_then(|s| NaiveDate::parse_from_str(s.trim(), DATE_FORMAT).ok()),
        _ => None,
    };
    let Some(date) = date else {
        tracing::warn!(%ticker, "skipping bar with unreadable date");
        return Ok(None);
    };

    let vwap = Some(lenient_f64(row, 7)?).filter(|v| v.is_finite());
    let transactions = match row.get_ref(8)? {
        ValueRef::Integer(t) => u64::try_from(t).ok(),
        _ => None,
    };

    Ok(Some(DailyBar {
        ticker,
        date,
        open: lenient_f64(row, 2)?,
        high: lenient_f64(row, 3)?,
        low: lenient_f64(row, 4)?,
        close: lenient_f64(row, 5)?,
        volume: lenient_f64(row, 6)?,
        vwap,
        transactions,
    }))
}

impl SqliteAdapter {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, TrendscanError> {
        let db_path =
            config
                .get_string("sqlite", "path")
                .ok_or_else(|| TrendscanError::ConfigMissing {
                    section: "sqlite".into(),
                    key: "path".into(),
                })?;

        let pool_size = config.get_int("sqlite", "pool_size", 4).max(1) as u32;

        let manager = SqliteConnectionManager::file(&db_path);
        let pool = Pool::builder()
            .max_size(pool_size)
            .build(manager)
            .map_err(pool_error)?;

        tracing::debug!(path = %db_path, pool_size, "opened sqlite pool");
        Ok(Self { pool })
    }

    pub fn in_memory() -> Result<Self, TrendscanError> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(pool_error)?;

        Ok(Self { pool })
    }

    fn conn(&self) -> Result<PooledConnection<SqliteConnectionManager>, TrendscanError> {
        self.pool.get().map_err(pool_error)
    }

    pub fn initialize_schema(&self) -> Result<(), TrendscanError> {
        self.conn()?
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS daily_bars (
                    ticker TEXT NOT NULL,
                    date TEXT NOT NULL,
                    open REAL NOT NULL,
                    high REAL NOT NULL,
                    low REAL NOT NULL,
                    close REAL NOT NULL,
                    volume REAL NOT NULL,
                    vwap REAL,
                    transactions INTEGER,
                    PRIMARY KEY (ticker, date)
                );
                CREATE INDEX IF NOT EXISTS idx_daily_bars_date ON daily_bars(date);
                CREATE TABLE IF NOT EXISTS stocks (
                    ticker TEXT PRIMARY KEY,
                    name TEXT NOT NULL,
                    market TEXT NOT NULL,
                    locale TEXT NOT NULL,
                    primary_exchange TEXT,
                    type TEXT,
                    active INTEGER NOT NULL DEFAULT 1,
                    currency_name TEXT,
                    cik TEXT,
                    composite_figi TEXT,
                    share_class_figi TEXT,
                    last_updated_utc TEXT NOT NULL
                );
                CREATE INDEX IF NOT EXISTS idx_stocks_active ON stocks(active);",
            )
            .map_err(query_error)
    }

    /// Upserts bars on their (ticker, date) key.
    pub fn insert_bars(&self, bars: &[DailyBar]) -> Result<(), TrendscanError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction().map_err(query_error)?;

        for bar in bars {
            tx.execute(
                "INSERT OR REPLACE INTO daily_bars
                    (ticker, date, open, high, low, close, volume, vwap, transactions)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    bar.ticker,
                    bar.date.format(DATE_FORMAT).to_string(),
                    bar.open,
                    bar.high,
                    bar.low,
                    bar.close,
                    bar.volume,
                    bar.vwap,
                    bar.transactions.map(|t| t as i64),
                ],
            )
            .map_err(query_error)?;
        }

        tx.commit().map_err(query_error)
    }

    /// Upserts ticker metadata on the ticker key.
    pub fn upsert_stocks(&self, stocks: &[Stock]) -> Result<(), TrendscanError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction().map_err(query_error)?;

        for stock in stocks {
            tx.execute(
                "INSERT OR REPLACE INTO stocks
                    (ticker, name, market, locale, primary_exchange, type, active,
                     currency_name, cik, composite_figi, share_class_figi, last_updated_utc)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                params![
                    stock.ticker,
                    stock.name,
                    stock.market,
                    stock.locale,
                    stock.primary_exchange,
                    stock.kind,
                    stock.active,
                    stock.currency_name,
                    stock.cik,
                    stock.composite_figi,
                    stock.share_class_figi,
                    stock.last_updated_utc.to_rfc3339(),
                ],
            )
            .map_err(query_error)?;
        }

        tx.commit().map_err(query_error)
    }
}

impl DataPort for SqliteAdapter {
    fn list_active_tickers(&self) -> Result<Vec<String>, TrendscanError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare("SELECT ticker FROM stocks WHERE active = 1 ORDER BY ticker")
            .map_err(query_error)?;

        let rows = stmt.query_map([], |row| row.get(0)).map_err(query_error)?;

        let mut tickers = Vec::new();
        for row in rows {
            tickers.push(row.map_err(query_error)?);
        }
        Ok(tickers)
    }

    fn fetch_bars(
        &self,
        tickers: &[String],
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<DailyBar>, TrendscanError> {
        if tickers.is_empty() {
            return Ok(Vec::new());
        }

        let conn = self.conn()?;

        let start_str = start_date.format(DATE_FORMAT).to_string();
        let end_str = end_date.format(DATE_FORMAT).to_string();

        let placeholders = (0..tickers.len())
            .map(|i| format!("?{}", i + 3))
            .collect::<Vec<_>>()
            .join(", ");
        let query = format!(
            "SELECT ticker, date, open, high, low, close, volume, vwap, transactions
             FROM daily_bars
             WHERE date >= ?1 AND date <= ?2 AND ticker IN ({placeholders})
             ORDER BY date ASC, ticker ASC"
        );

        let mut bind: Vec<&dyn ToSql> = Vec::with_capacity(tickers.len() + 2);
        bind.push(&start_str);
        bind.push(&end_str);
        bind.extend(tickers.iter().map(|t| t as &dyn ToSql));

        let mut stmt = conn.prepare(&query).map_err(query_error)?;
        let rows = stmt
            .query_map(bind.as_slice(), row_to_bar)
            .map_err(query_error)?;

        let mut bars = Vec::new();
        for row in rows {
            if let Some(bar) = row.map_err(query_error)? {
                bars.push(bar);
            }
        }
        Ok(bars)
    }

    fn get_data_range(
        &self,
        ticker: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, TrendscanError> {
        let conn = self.conn()?;

        let result: (Option<String>, Option<String>, i64) = conn
            .query_row(
                "SELECT MIN(date), MAX(date), COUNT(*) FROM daily_bars WHERE ticker = ?1",
                params![ticker],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .map_err(query_error)?;

        match result {
            (Some(min_str), Some(max_str), count) if count > 0 => {
                let min = parse_date(min_str).map_err(query_error)?;
                let max = parse_date(max_str).map_err(query_error)?;
                Ok(Some((min, max, count as usize)))
            }
            _ => Ok(None),
        }
    }
}
