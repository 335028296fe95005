//! Report adapters implementing ReportPort.
//!
//! - `TableReport`: fixed-width console table with a match count
//! - `CsvReport`: one header row, one row per match
//! - `JsonReport`: `{ target_date, count, results }` document

use crate::domain::error::TrendscanError;
use crate::domain::scan::StrategyResult;
use crate::ports::report_port::ReportPort;
use chrono::NaiveDate;
use serde::Serialize;
use std::io::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Table,
    Csv,
    Json,
}

impl std::str::FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "table" => Ok(ReportFormat::Table),
            "csv" => Ok(ReportFormat::Csv),
            "json" => Ok(ReportFormat::Json),
            other => Err(format!("unknown format '{}', expected table, csv or json", other)),
        }
    }
}

/// Builds the writer for `format`; the table labels its averages by window.
pub fn report_for(format: ReportFormat, ma_short: usize, ma_long: usize) -> Box<dyn ReportPort> {
    match format {
        ReportFormat::Table => Box::new(TableReport { ma_short, ma_long }),
        ReportFormat::Csv => Box::new(CsvReport),
        ReportFormat::Json => Box::new(JsonReport),
    }
}

fn io_error(e: std::io::Error) -> TrendscanError {
    TrendscanError::Report {
        reason: e.to_string(),
    }
}

pub struct TableReport {
    pub ma_short: usize,
    pub ma_long: usize,
}

impl ReportPort for TableReport {
    fn write(
        &self,
        results: &[StrategyResult],
        target_date: NaiveDate,
        out: &mut dyn Write,
    ) -> Result<(), TrendscanError> {
        let short_label = format!("MA{}", self.ma_short);
        let long_label = format!("MA{}", self.ma_long);

        writeln!(out, "--- Strategy Results ({}) ---", target_date).map_err(io_error)?;
        if !results.is_empty() {
            writeln!(
                out,
                "{:<10} {:<10} {:>10} {:>8} {:>10} {:>10}",
                "Ticker", "Date", "Close", "RSI", short_label, long_label
            )
            .map_err(io_error)?;
            for r in results {
                writeln!(
                    out,
                    "{:<10} {:<10} {:>10.2} {:>8.2} {:>10.2} {:>10.2}",
                    r.ticker,
                    r.date.format("%Y-%m-%d"),
                    r.close,
                    r.rsi,
                    r.ma_short,
                    r.ma_long
                )
                .map_err(io_error)?;
            }
        }
        writeln!(out, "Total Matches: {}", results.len()).map_err(io_error)?;
        Ok(())
    }
}

pub struct CsvReport;

impl ReportPort for CsvReport {
    fn write(
        &self,
        results: &[StrategyResult],
        _target_date: NaiveDate,
        out: &mut dyn Write,
    ) -> Result<(), TrendscanError> {
        let mut wtr = csv::Writer::from_writer(out);
        if results.is_empty() {
            wtr.write_record(["ticker", "date", "close", "rsi", "ma_short", "ma_long"])
                .map_err(|e| TrendscanError::Report {
                    reason: e.to_string(),
                })?;
        }
        for r in results {
            wtr.serialize(r).map_err(|e| TrendscanError::Report {
                reason: e.to_string(),
            })?;
        }
        wtr.flush().map_err(io_error)
    }
}

#[derive(Serialize)]
struct JsonDocument<'a> {
    target_date: NaiveDate,
    count: usize,
    results: &'a [StrategyResult],
}

pub struct JsonReport;

impl ReportPort for JsonReport {
    fn write(
        &self,
        results: &[StrategyResult],
        target_date: NaiveDate,
        out: &mut dyn Write,
    ) -> Result<(), TrendscanError> {
        let doc = JsonDocument {
            target_date,
            count: results.len(),
            results,
        };
        serde_json::to_writer_pretty(&mut *out, &doc).map_err(|e| TrendscanError::Report {
            reason: e.to_string(),
        })?;
        writeln!(out).map_err(io_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 28).unwrap()
    }

    fn sample() -> Vec<StrategyResult> {
        vec![
            StrategyResult {
                ticker: "AAPL".into(),
                date: target(),
                close: 210.625,
                rsi: 61.234,
                ma_short: 195.5,
                ma_long: 180.0,
            },
            StrategyResult {
                ticker: "MSFT".into(),
                date: NaiveDate::from_ymd_opt(2024, 6, 27).unwrap(),
                close: 446.95,
                rsi: 55.0,
                ma_short: 430.1,
                ma_long: 410.7,
            },
        ]
    }

    fn render(report: &dyn ReportPort, results: &[StrategyResult]) -> String {
        let mut buf = Vec::new();
        report.write(results, target(), &mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn format_from_str() {
        assert_eq!("table".parse::<ReportFormat>(), Ok(ReportFormat::Table));
        assert_eq!("CSV".parse::<ReportFormat>(), Ok(ReportFormat::Csv));
        assert_eq!(" json ".parse::<ReportFormat>(), Ok(ReportFormat::Json));
        assert!("xml".parse::<ReportFormat>().is_err());
    }

    #[test]
    fn table_has_rows_and_total() {
        let text = render(&TableReport { ma_short: 50, ma_long: 200 }, &sample());
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "--- Strategy Results (2024-06-28) ---");
        assert!(lines[1].contains("MA50") && lines[1].contains("MA200"));
        assert!(lines[2].starts_with("AAPL"));
        assert!(lines[2].contains("210.63"));
        assert!(lines[2].contains("61.23"));
        assert!(lines[3].starts_with("MSFT"));
        assert_eq!(lines[4], "Total Matches: 2");
    }

    #[test]
    fn table_without_matches() {
        let text = render(&TableReport { ma_short: 50, ma_long: 200 }, &[]);
        assert_eq!(
            text,
            "--- Strategy Results (2024-06-28) ---\nTotal Matches: 0\n"
        );
    }

    #[test]
    fn csv_has_header_and_rows() {
        let text = render(&CsvReport, &sample());
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "ticker,date,close,rsi,ma_short,ma_long");
        assert_eq!(lines[1], "AAPL,2024-06-28,210.625,61.234,195.5,180.0");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn csv_without_matches_still_has_header() {
        let text = render(&CsvReport, &[]);
        assert_eq!(text, "ticker,date,close,rsi,ma_short,ma_long\n");
    }

    #[test]
    fn json_document_shape() {
        let text = render(&JsonReport, &sample());
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["target_date"], "2024-06-28");
        assert_eq!(value["count"], 2);
        assert_eq!(value["results"][0]["ticker"], "AAPL");
        assert_eq!(value["results"][1]["date"], "2024-06-27");
    }

    #[test]
    fn report_for_selects_writer() {
        let text = render(report_for(ReportFormat::Json, 50, 200).as_ref(), &[]);
        assert!(text.contains("\"count\": 0"));
    }
}
