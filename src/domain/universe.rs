//! Scan universe: the ordered list of tickers eligible for scanning.
//!
//! Normally built from the data port's active tickers; a comma-separated
//! override list can replace it on the command line.

use crate::domain::error::TrendscanError;
use crate::ports::data_port::DataPort;
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Universe {
    pub tickers: Vec<String>,
}

impl Universe {
    pub fn new(tickers: Vec<String>) -> Self {
        Self { tickers }
    }

    /// Every ticker the data port reports as active.
    pub fn active(data_port: &dyn DataPort) -> Result<Self, TrendscanError> {
        let tickers = data_port.list_active_tickers()?;
        tracing::info!(tickers = tickers.len(), "loaded active universe");
        Ok(Self { tickers })
    }

    pub fn count(&self) -> usize {
        self.tickers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tickers.is_empty()
    }

    /// Consecutive batches of at most `batch_size` tickers, in universe order.
    pub fn batches(&self, batch_size: usize) -> std::slice::Chunks<'_, String> {
        self.tickers.chunks(batch_size.max(1))
    }

    pub fn batch_count(&self, batch_size: usize) -> usize {
        self.tickers.len().div_ceil(batch_size.max(1))
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum UniverseError {
    #[error("empty token in ticker list")]
    EmptyToken,

    #[error("duplicate ticker: {0}")]
    DuplicateTicker(String),
}

impl From<UniverseError> for TrendscanError {
    fn from(err: UniverseError) -> Self {
        TrendscanError::InvalidTickers {
            reason: err.to_string(),
        }
    }
}

pub fn parse_tickers(input: &str) -> Result<Vec<String>, UniverseError> {
    let mut tickers = Vec::new();
    let mut seen = HashSet::new();

    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(UniverseError::EmptyToken);
        }
        let ticker = trimmed.to_uppercase();
        if !seen.insert(ticker.clone()) {
            return Err(UniverseError::DuplicateTicker(ticker));
        }
        tickers.push(ticker);
    }

    Ok(tickers)
}
