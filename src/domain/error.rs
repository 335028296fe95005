//! Domain error types.
//!
//! Per-ticker conditions (short history, stale data) are not errors; they are
//! reported as [`SkipReason`](crate::domain::scan::SkipReason)s. Everything in
//! here aborts the operation that raised it.

/// Top-level error type for trendscan.
#[derive(Debug, thiserror::Error)]
pub enum TrendscanError {
    #[error("data store unavailable: {reason}")]
    DataStoreUnavailable { reason: String },

    #[error("data store query error: {reason}")]
    DataStoreQuery { reason: String },

    #[error("batch {batch} failed ({tickers} tickers): {source}")]
    BatchFailed {
        batch: usize,
        tickers: usize,
        #[source]
        source: Box<TrendscanError>,
    },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("invalid ticker list: {reason}")]
    InvalidTickers { reason: String },

    #[error("report error: {reason}")]
    Report { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl TrendscanError {
    /// True for failures of the storage layer, including a failed batch.
    pub fn is_data_store(&self) -> bool {
        match self {
            TrendscanError::DataStoreUnavailable { .. } | TrendscanError::DataStoreQuery { .. } => {
                true
            }
            TrendscanError::BatchFailed { source, .. } => source.is_data_store(),
            _ => false,
        }
    }
}

impl From<&TrendscanError> for std::process::ExitCode {
    fn from(err: &TrendscanError) -> Self {
        let code: u8 = match err {
            TrendscanError::Io(_) | TrendscanError::Report { .. } => 1,
            TrendscanError::ConfigParse { .. }
            | TrendscanError::ConfigMissing { .. }
            | TrendscanError::ConfigInvalid { .. } => 2,
            TrendscanError::DataStoreUnavailable { .. }
            | TrendscanError::DataStoreQuery { .. }
            | TrendscanError::BatchFailed { .. } => 3,
            TrendscanError::InvalidTickers { .. } => 4,
        };
        std::process::ExitCode::from(code)
    }
}
