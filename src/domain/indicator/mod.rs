//! Technical indicator implementations.
//!
//! Indicators work on a close-price slice ordered oldest first and produce
//! lazy sequences. Callers that only need the latest value take `.last()`;
//! the whole recurrence still runs from the first close.
//!
//! - `IndicatorType`: indicator identity + parameters
//! - `IndicatorParams`: window sizes used for a scan
//! - `IndicatorSnapshot`: latest close and indicator values for one ticker

pub mod rsi;
pub mod sma;

use std::fmt;

pub use rsi::rsi;
pub use sma::sma;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndicatorType {
    Sma(usize),
    Rsi(usize),
}

impl IndicatorType {
    /// Number of closes needed before the first value is produced.
    pub fn warmup(&self) -> usize {
        match self {
            IndicatorType::Sma(period) => *period,
            IndicatorType::Rsi(period) => period + 1,
        }
    }
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Sma(period) => write!(f, "SMA({})", period),
            IndicatorType::Rsi(period) => write!(f, "RSI({})", period),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndicatorParams {
    pub ma_short: usize,
    pub ma_long: usize,
    pub rsi_period: usize,
}

impl Default for IndicatorParams {
    fn default() -> Self {
        Self {
            ma_short: 50,
            ma_long: 200,
            rsi_period: 14,
        }
    }
}

impl IndicatorParams {
    pub fn indicators(&self) -> [IndicatorType; 3] {
        [
            IndicatorType::Sma(self.ma_short),
            IndicatorType::Sma(self.ma_long),
            IndicatorType::Rsi(self.rsi_period),
        ]
    }

    /// Fewest closes for which every indicator has a value.
    pub fn min_history(&self) -> usize {
        self.indicators()
            .iter()
            .map(IndicatorType::warmup)
            .max()
            .unwrap_or(0)
    }
}

/// Latest close and indicator values for one ticker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndicatorSnapshot {
    pub close: f64,
    pub ma_short: f64,
    pub ma_long: f64,
    pub rsi: f64,
}

impl IndicatorSnapshot {
    /// Computes every indicator over the full `closes` slice.
    ///
    /// Returns `None` when the slice is too short for any of them.
    pub fn compute(closes: &[f64], params: &IndicatorParams) -> Option<Self> {
        let close = *closes.last()?;
        let ma_short = sma(closes, params.ma_short).last()?;
        let ma_long = sma(closes, params.ma_long).last()?;
        let rsi = rsi(closes, params.rsi_period).last()?;
        Some(Self {
            close,
            ma_short,
            ma_long,
            rsi,
        })
    }
}
