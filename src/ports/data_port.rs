//! Data access port trait.
//!
//! Read-only view of persisted bars and ticker metadata. Implementations
//! exist for SQLite, PostgreSQL and a directory of CSV files.

use crate::domain::bar::DailyBar;
use crate::domain::error::TrendscanError;
use chrono::NaiveDate;

pub trait DataPort {
    /// Tickers flagged active, in a stable order.
    fn list_active_tickers(&self) -> Result<Vec<String>, TrendscanError>;

    /// Bars for every ticker in `tickers` within `[start_date, end_date]`,
    /// fetched in one request and ordered by date ascending.
    fn fetch_bars(
        &self,
        tickers: &[String],
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<DailyBar>, TrendscanError>;

    /// First date, last date and bar count stored for `ticker`.
    fn get_data_range(
        &self,
        ticker: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, TrendscanError>;
}
