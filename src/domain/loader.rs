//! Batched time-series loading.
//!
//! One data-port request per batch of tickers; the flat result is then
//! partitioned per ticker on this side so only one batch of history is held
//! in memory at a time.

use crate::domain::bar::DailyBar;
use crate::domain::error::TrendscanError;
use crate::ports::data_port::DataPort;
use chrono::{Duration, NaiveDate};
use std::collections::HashMap;

/// Per-ticker bar history for one batch, each sequence sorted by date.
#[derive(Debug, Default)]
pub struct BatchHistory {
    bars: HashMap<String, Vec<DailyBar>>,
    pub malformed: usize,
    pub duplicates: usize,
}

impl BatchHistory {
    pub fn bars_for(&self, ticker: &str) -> &[DailyBar] {
        self.bars.get(ticker).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Removes and returns a ticker's history.
    pub fn take(&mut self, ticker: &str) -> Vec<DailyBar> {
        self.bars.remove(ticker).unwrap_or_default()
    }

    pub fn ticker_count(&self) -> usize {
        self.bars.len()
    }

    pub fn bar_count(&self) -> usize {
        self.bars.values().map(Vec::len).sum()
    }
}

/// Inclusive date range `[target - lookback_days, target]`, clamped at the
/// earliest representable date.
pub fn lookback_range(target: NaiveDate, lookback_days: u32) -> (NaiveDate, NaiveDate) {
    let start = target
        .checked_sub_signed(Duration::days(i64::from(lookback_days)))
        .unwrap_or(NaiveDate::MIN);
    (start, target)
}

/// Partitions a flat bar list by ticker.
///
/// Bars for tickers outside `tickers` or dates outside `[start, end]` are
/// ignored. Malformed bars are dropped one by one. When a `(ticker, date)`
/// pair repeats, the last occurrence wins.
pub fn group_by_ticker(
    tickers: &[String],
    bars: Vec<DailyBar>,
    start: NaiveDate,
    end: NaiveDate,
) -> BatchHistory {
    let mut grouped: HashMap<String, Vec<DailyBar>> = tickers
        .iter()
        .map(|t| (t.clone(), Vec::new()))
        .collect();
    let mut malformed = 0;

    for bar in bars {
        if bar.date < start || bar.date > end {
            continue;
        }
        let Some(series) = grouped.get_mut(&bar.ticker) else {
            continue;
        };
        if !bar.is_well_formed() {
            tracing::debug!(ticker = %bar.ticker, date = %bar.date, "dropping malformed bar");
            malformed += 1;
            continue;
        }
        series.push(bar);
    }

    let mut duplicates = 0;
    for series in grouped.values_mut() {
        series.sort_by_key(|b| b.date);
        let before = series.len();
        dedup_keep_last(series);
        duplicates += before - series.len();
    }
    grouped.retain(|_, series| !series.is_empty());

    BatchHistory {
        bars: grouped,
        malformed,
        duplicates,
    }
}

fn dedup_keep_last(series: &mut Vec<DailyBar>) {
    let mut deduped: Vec<DailyBar> = Vec::with_capacity(series.len());
    for bar in series.drain(..) {
        match deduped.last_mut() {
            Some(prev) if prev.date == bar.date => *prev = bar,
            _ => deduped.push(bar),
        }
    }
    *series = deduped;
}

/// Loads the lookback window for one batch of tickers.
pub fn load_batch(
    data_port: &dyn DataPort,
    tickers: &[String],
    target: NaiveDate,
    lookback_days: u32,
) -> Result<BatchHistory, TrendscanError> {
    let (start, end) = lookback_range(target, lookback_days);
    let bars = data_port.fetch_bars(tickers, start, end)?;
    let fetched = bars.len();
    let history = group_by_ticker(tickers, bars, start, end);

    tracing::info!(
        tickers = tickers.len(),
        fetched,
        with_data = history.ticker_count(),
        malformed = history.malformed,
        duplicates = history.duplicates,
        %start,
        %end,
        "loaded batch"
    );

    Ok(history)
}
