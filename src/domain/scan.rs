//! Trend-following scan over the ticker universe.
//!
//! For each batch of tickers: load the lookback window once, then per ticker
//! check minimum history and freshness, compute indicators over the full
//! history and apply the [`SignalRule`]. A ticker that cannot be evaluated is
//! skipped and recorded; only a failed batch load aborts the scan.
//!
//! Results come back in universe order (batch order, then in-batch order).

use crate::domain::bar::DailyBar;
use crate::domain::error::TrendscanError;
use crate::domain::indicator::{IndicatorParams, IndicatorSnapshot};
use crate::domain::loader::load_batch;
use crate::domain::rule::{RuleOutcome, SignalRule};
use crate::domain::universe::Universe;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;

/// A ticker that satisfied the signal rule on its latest bar.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StrategyResult {
    pub ticker: String,
    pub date: NaiveDate,
    pub close: f64,
    pub rsi: f64,
    pub ma_short: f64,
    pub ma_long: f64,
}

/// Tunables for one scan. Defaults: batches of 50, 365-day lookback,
/// SMA 50/200, RSI 14, at most 5 days stale, RSI band [50, 70].
#[derive(Debug, Clone, PartialEq)]
pub struct ScanConfig {
    pub batch_size: usize,
    pub lookback_days: u32,
    pub max_staleness_days: u32,
    pub indicators: IndicatorParams,
    pub rule: SignalRule,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            batch_size: 50,
            lookback_days: 365,
            max_staleness_days: 5,
            indicators: IndicatorParams::default(),
            rule: SignalRule::default(),
        }
    }
}

impl ScanConfig {
    pub fn min_history(&self) -> usize {
        self.indicators.min_history()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    NoData,
    InsufficientHistory { bars: usize, minimum: usize },
    StaleData { latest: NaiveDate, age_days: i64 },
    IndicatorUnavailable,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NoData => write!(f, "no data"),
            SkipReason::InsufficientHistory { bars, minimum } => {
                write!(f, "only {} bars, minimum {} required", bars, minimum)
            }
            SkipReason::StaleData { latest, age_days } => {
                write!(f, "latest bar {} is {} days old", latest, age_days)
            }
            SkipReason::IndicatorUnavailable => write!(f, "indicators unavailable"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkippedTicker {
    pub ticker: String,
    pub reason: SkipReason,
}

/// What happened to one ticker.
#[derive(Debug, Clone, PartialEq)]
pub enum TickerOutcome {
    Matched(StrategyResult),
    Rejected(RuleOutcome),
    Skipped(SkipReason),
}

/// Runs the per-ticker pipeline on a date-ascending bar history.
pub fn evaluate_ticker(
    ticker: &str,
    bars: &[DailyBar],
    target: NaiveDate,
    config: &ScanConfig,
) -> TickerOutcome {
    let Some(latest) = bars.last() else {
        return TickerOutcome::Skipped(SkipReason::NoData);
    };

    let minimum = config.min_history();
    if bars.len() < minimum {
        return TickerOutcome::Skipped(SkipReason::InsufficientHistory {
            bars: bars.len(),
            minimum,
        });
    }

    let age_days = latest.age_days(target).abs();
    if age_days > i64::from(config.max_staleness_days) {
        return TickerOutcome::Skipped(SkipReason::StaleData {
            latest: latest.date,
            age_days,
        });
    }

    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let Some(snapshot) = IndicatorSnapshot::compute(&closes, &config.indicators) else {
        return TickerOutcome::Skipped(SkipReason::IndicatorUnavailable);
    };

    match config.rule.evaluate(&snapshot) {
        RuleOutcome::Match => TickerOutcome::Matched(StrategyResult {
            ticker: ticker.to_string(),
            date: latest.date,
            close: snapshot.close,
            rsi: snapshot.rsi,
            ma_short: snapshot.ma_short,
            ma_long: snapshot.ma_long,
        }),
        other => TickerOutcome::Rejected(other),
    }
}

#[derive(Debug, Clone)]
pub struct ScanReport {
    pub target_date: NaiveDate,
    pub results: Vec<StrategyResult>,
    pub skipped: Vec<SkippedTicker>,
    /// Tickers that reached the signal rule, matched or not.
    pub evaluated: usize,
    pub batches: usize,
}

/// Scans every active ticker and returns the matches.
pub fn scan(
    data_port: &dyn DataPort,
    target: NaiveDate,
    config: &ScanConfig,
) -> Result<Vec<StrategyResult>, TrendscanError> {
    let universe = Universe::active(data_port)?;
    Ok(scan_report(data_port, &universe, target, config)?.results)
}

/// Scans `universe` and returns matches along with skip diagnostics.
pub fn scan_report(
    data_port: &dyn DataPort,
    universe: &Universe,
    target: NaiveDate,
    config: &ScanConfig,
) -> Result<ScanReport, TrendscanError> {
    tracing::info!(
        %target,
        tickers = universe.count(),
        batches = universe.batch_count(config.batch_size),
        "running trend following scan"
    );

    let mut report = ScanReport {
        target_date: target,
        results: Vec::new(),
        skipped: Vec::new(),
        evaluated: 0,
        batches: 0,
    };

    for (index, batch) in universe.batches(config.batch_size).enumerate() {
        let mut history = load_batch(data_port, batch, target, config.lookback_days).map_err(
            |e| TrendscanError::BatchFailed {
                batch: index + 1,
                tickers: batch.len(),
                source: Box::new(e),
            },
        )?;

        for ticker in batch {
            let bars = history.take(ticker);
            match evaluate_ticker(ticker, &bars, target, config) {
                TickerOutcome::Matched(result) => {
                    tracing::debug!(%ticker, rsi = result.rsi, "signal");
                    report.evaluated += 1;
                    report.results.push(result);
                }
                TickerOutcome::Rejected(outcome) => {
                    tracing::trace!(%ticker, %outcome, "rejected");
                    report.evaluated += 1;
                }
                TickerOutcome::Skipped(reason) => {
                    tracing::debug!(%ticker, %reason, "skipping");
                    report.skipped.push(SkippedTicker {
                        ticker: ticker.clone(),
                        reason,
                    });
                }
            }
        }
        report.batches += 1;
    }

    tracing::info!(
        matches = report.results.len(),
        evaluated = report.evaluated,
        skipped = report.skipped.len(),
        "scan complete"
    );

    Ok(report)
}
