//! Daily bar representation.

use chrono::NaiveDate;

/// One ticker's OHLCV summary for one calendar date.
///
/// `(ticker, date)` is the natural key; stores hold at most one bar per key.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyBar {
    pub ticker: String,
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub vwap: Option<f64>,
    pub transactions: Option<u64>,
}

impl DailyBar {
    /// All required price and volume fields hold finite numbers.
    pub fn is_well_formed(&self) -> bool {
        [self.open, self.high, self.low, self.close, self.volume]
            .iter()
            .all(|v| v.is_finite())
    }

    /// Calendar days between this bar and `target` (negative if the bar is later).
    pub fn age_days(&self, target: NaiveDate) -> i64 {
        (target - self.date).num_days()
    }
}
