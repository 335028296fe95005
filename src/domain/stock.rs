//! Ticker metadata.
//!
//! Owned by the metadata sync collaborator; the scanner only reads the
//! `active` flag, through [`DataPort::list_active_tickers`](crate::ports::data_port::DataPort).

use chrono::{DateTime, Utc};

#[derive(Debug, Clone, PartialEq)]
pub struct Stock {
    pub ticker: String,
    pub name: String,
    pub market: String,
    pub locale: String,
    pub primary_exchange: Option<String>,
    pub kind: Option<String>,
    pub active: bool,
    pub currency_name: Option<String>,
    pub cik: Option<String>,
    pub composite_figi: Option<String>,
    pub share_class_figi: Option<String>,
    pub last_updated_utc: DateTime<Utc>,
}

impl Stock {
    /// Minimal active US stock record.
    pub fn new(ticker: &str, name: &str) -> Self {
        Self {
            ticker: ticker.to_string(),
            name: name.to_string(),
            market: "stocks".to_string(),
            locale: "us".to_string(),
            primary_exchange: None,
            kind: None,
            active: true,
            currency_name: Some("usd".to_string()),
            cik: None,
            composite_figi: None,
            share_class_figi: None,
            last_updated_utc: Utc::now(),
        }
    }

    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }
}
