//! PostgreSQL data adapter.
//!
//! Expects `public.daily_bars` and `public.stocks` with the same columns as
//! the SQLite schema; `date` is a `DATE` column.

use crate::domain::bar::DailyBar;
use crate::domain::error::TrendscanError;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use postgres::types::ToSql;
use postgres::{NoTls, Row};
use r2d2::{Pool, PooledConnection};
use r2d2_postgres::PostgresConnectionManager;

type Manager = PostgresConnectionManager<NoTls>;

const DATE_FORMAT: &str = "%Y-%m-%d";

pub struct PostgresAdapter {
    pool: Pool<Manager>,
}

fn query_error(e: postgres::Error) -> TrendscanError {
    TrendscanError::DataStoreQuery {
        reason: e.to_string(),
    }
}

fn parse_number(value: Option<&str>) -> f64 {
    value
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(f64::NAN)
}

/// Builds a bar from text columns `[date, open, high, low, close, volume,
/// vwap, transactions]`. Unreadable prices become NaN so the loader drops
/// the bar; an unreadable date yields `None`.
fn decode_bar(ticker: &str, fields: &[Option<String>; 8]) -> Option<DailyBar> {
    let field = |idx: usize| fields[idx].as_deref();
    let date = NaiveDate::parse_from_str(field(0)?.trim(), DATE_FORMAT).ok()?;

    Some(DailyBar {
        ticker: ticker.to_string(),
        date,
        open: parse_number(field(1)),
        high: parse_number(field(2)),
        low: parse_number(field(3)),
        close: parse_number(field(4)),
        volume: parse_number(field(5)),
        vwap: Some(parse_number(field(6))).filter(|v| v.is_finite()),
        transactions: field(7).and_then(|t| t.trim().parse().ok()),
    })
}

fn row_to_bar(row: &Row) -> Result<Option<DailyBar>, TrendscanError> {
    let ticker: String = row.try_get(0).map_err(query_error)?;
    let mut fields: [Option<String>; 8] = Default::default();
    for (idx, field) in fields.iter_mut().enumerate() {
        *field = row.try_get(idx + 1).map_err(query_error)?;
    }

    let bar = decode_bar(&ticker, &fields);
    if bar.is_none() {
        tracing::warn!(%ticker, "skipping bar with unreadable date");
    }
    Ok(bar)
}

impl PostgresAdapter {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, TrendscanError> {
        // Try [postgres] connection_string first, fall back to [database] conninfo
        let connection_string = config
            .get_string("postgres", "connection_string")
            .or_else(|| config.get_string("database", "conninfo"))
            .ok_or_else(|| TrendscanError::ConfigMissing {
                section: "postgres".into(),
                key: "connection_string".into(),
            })?;

        let pg_config: postgres::Config =
            connection_string
                .parse()
                .map_err(|e: postgres::Error| TrendscanError::ConfigInvalid {
                    section: "postgres".into(),
                    key: "connection_string".into(),
                    reason: e.to_string(),
                })?;

        let pool_size = config.get_int("postgres", "pool_size", 4).max(1) as u32;
        let manager = PostgresConnectionManager::new(pg_config, NoTls);
        let pool = Pool::builder()
            .max_size(pool_size)
            .build(manager)
            .map_err(|e| TrendscanError::DataStoreUnavailable {
                reason: e.to_string(),
            })?;

        Ok(Self { pool })
    }

    fn conn(&self) -> Result<PooledConnection<Manager>, TrendscanError> {
        self.pool
            .get()
            .map_err(|e| TrendscanError::DataStoreUnavailable {
                reason: e.to_string(),
            })
    }
}

impl DataPort for PostgresAdapter {
    fn list_active_tickers(&self) -> Result<Vec<String>, TrendscanError> {
        let rows = self
            .conn()?
            .query(
                "SELECT ticker FROM public.stocks WHERE active ORDER BY ticker",
                &[],
            )
            .map_err(query_error)?;

        rows.iter()
            .map(|row| row.try_get::<_, String>(0).map_err(query_error))
            .collect()
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

        let query = "SELECT ticker, date::text, \
                            open::text, high::text, low::text, close::text, \
                            volume::text, vwap::text, transactions::text \
                     FROM public.daily_bars \
                     WHERE ticker = ANY($1) AND date >= $2 AND date <= $3 \
                     ORDER BY date ASC, ticker ASC";

        let tickers = tickers.to_vec();
        let params: &[&(dyn ToSql + Sync)] = &[&tickers, &start_date, &end_date];
        let rows = self.conn()?.query(query, params).map_err(query_error)?;

        let mut bars = Vec::with_capacity(rows.len());
        for row in &rows {
            if let Some(bar) = row_to_bar(row)? {
                bars.push(bar);
            }
        }
        Ok(bars)
    }

    fn get_data_range(
        &self,
        ticker: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, TrendscanError> {
        let query =
            "SELECT MIN(date), MAX(date), COUNT(*) FROM public.daily_bars WHERE ticker = $1";

        let row = self
            .conn()?
            .query_one(query, &[&ticker])
            .map_err(query_error)?;

        let min: Option<NaiveDate> = row.try_get(0).map_err(query_error)?;
        let max: Option<NaiveDate> = row.try_get(1).map_err(query_error)?;
        let count: i64 = row.try_get(2).map_err(query_error)?;

        match (min, max) {
            (Some(min), Some(max)) if count > 0 => Ok(Some((min, max, count as usize))),
            _ => Ok(None),
        }
    }
}
