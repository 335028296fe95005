//! Report generation port trait.

use crate::domain::error::TrendscanError;
use crate::domain::scan::StrategyResult;
use chrono::NaiveDate;
use std::io::Write;

/// Port for writing scan results.
pub trait ReportPort {
    fn write(
        &self,
        results: &[StrategyResult],
        target_date: NaiveDate,
        out: &mut dyn Write,
    ) -> Result<(), TrendscanError>;
}
