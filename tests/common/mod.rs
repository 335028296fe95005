#![allow(dead_code)]

use chrono::{Duration, NaiveDate};
pub use trendscan::domain::bar::DailyBar;
use trendscan::domain::error::TrendscanError;
use trendscan::ports::data_port::DataPort;
use std::cell::{Cell, RefCell};

/// In-memory data port that records every `fetch_bars` call.
pub struct MockDataPort {
    pub bars: Vec<DailyBar>,
    pub active: Vec<String>,
    /// Zero-based fetch call that should fail.
    pub fail_on_call: Option<usize>,
    pub fetch_calls: RefCell<Vec<Vec<String>>>,
    pub list_calls: Cell<usize>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            bars: Vec::new(),
            active: Vec::new(),
            fail_on_call: None,
            fetch_calls: RefCell::new(Vec::new()),
            list_calls: Cell::new(0),
        }
    }

    /// Adds bars and marks the ticker active.
    pub fn with_bars(mut self, ticker: &str, bars: Vec<DailyBar>) -> Self {
        if !self.active.iter().any(|t| t == ticker) {
            self.active.push(ticker.to_string());
        }
        self.bars.extend(bars);
        self
    }

    /// Marks a ticker active without storing any bars for it.
    pub fn with_active(mut self, ticker: &str) -> Self {
        self.active.push(ticker.to_string());
        self
    }

    pub fn failing_on_call(mut self, call: usize) -> Self {
        self.fail_on_call = Some(call);
        self
    }

    pub fn fetch_count(&self) -> usize {
        self.fetch_calls.borrow().len()
    }
}

impl DataPort for MockDataPort {
    fn list_active_tickers(&self) -> Result<Vec<String>, TrendscanError> {
        self.list_calls.set(self.list_calls.get() + 1);
        Ok(self.active.clone())
    }

    fn fetch_bars(
        &self,
        tickers: &[String],
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<DailyBar>, TrendscanError> {
        let call = self.fetch_count();
        self.fetch_calls.borrow_mut().push(tickers.to_vec());
        if self.fail_on_call == Some(call) {
            return Err(TrendscanError::DataStoreQuery {
                reason: "connection reset".into(),
            });
        }

        let mut bars: Vec<DailyBar> = self
            .bars
            .iter()
            .filter(|b| tickers.contains(&b.ticker))
            .filter(|b| b.date >= start_date && b.date <= end_date)
            .cloned()
            .collect();
        bars.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.ticker.cmp(&b.ticker)));
        Ok(bars)
    }

    fn get_data_range(
        &self,
        ticker: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, TrendscanError> {
        let dates: Vec<NaiveDate> = self
            .bars
            .iter()
            .filter(|b| b.ticker == ticker)
            .map(|b| b.date)
            .collect();
        match (dates.iter().min(), dates.iter().max()) {
            (Some(&min), Some(&max)) => Ok(Some((min, max, dates.len()))),
            _ => Ok(None),
        }
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Friday 2024-06-28, the target date used throughout.
pub fn target() -> NaiveDate {
    date(2024, 6, 28)
}

pub fn make_bar(ticker: &str, date: NaiveDate, close: f64) -> DailyBar {
    DailyBar {
        ticker: ticker.to_string(),
        date,
        open: close - 1.0,
        high: close + 1.0,
        low: close - 2.0,
        close,
        volume: 1_000_000.0,
        vwap: Some(close),
        transactions: Some(5_000),
    }
}

/// One bar per calendar day, the last one `days_before` the target.
pub fn series(ticker: &str, closes: &[f64], days_before: i64) -> Vec<DailyBar> {
    let last = target() - Duration::days(days_before);
    let n = closes.len() as i64;
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| make_bar(ticker, last - Duration::days(n - 1 - i as i64), close))
        .collect()
}

/// Two steps up, one step down. With an even length the last step is up,
/// leaving close above both averages and RSI near 68.
pub fn uptrend(n: usize) -> Vec<f64> {
    let mut close = 100.0;
    (0..n)
        .map(|i| {
            if i > 0 {
                close += if i % 2 == 1 { 2.0 } else { -1.0 };
            }
            close
        })
        .collect()
}

/// Mirror image of [`uptrend`]: close below both averages.
pub fn downtrend(n: usize) -> Vec<f64> {
    uptrend(n).iter().map(|c| 400.0 - c).collect()
}
