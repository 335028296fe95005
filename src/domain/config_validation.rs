//! Configuration validation.
//!
//! Validates config fields before a scan runs. Absent keys fall back to the
//! scan defaults, so only present-but-invalid values are rejected.

use crate::domain::error::TrendscanError;
use crate::ports::config_port::ConfigPort;

pub const BACKENDS: &[&str] = &["sqlite", "postgres", "csv"];
pub const LOG_FORMATS: &[&str] = &["pretty", "json"];
/// Upper bound for day-valued settings (about a century).
pub const MAX_DAYS: i64 = 36_500;

pub fn validate_scan_config(config: &dyn ConfigPort) -> Result<(), TrendscanError> {
    validate_positive(config, "batch_size", 50)?;
    validate_positive(config, "lookback_days", 365)?;
    validate_positive(config, "ma_short", 50)?;
    validate_positive(config, "ma_long", 200)?;
    validate_positive(config, "rsi_period", 14)?;
    validate_staleness(config)?;
    validate_windows(config)?;
    validate_rsi_band(config)?;
    Ok(())
}

pub fn validate_runtime_config(config: &dyn ConfigPort) -> Result<(), TrendscanError> {
    validate_backend(config)?;
    validate_log_format(config)?;
    Ok(())
}

fn invalid(key: &str, reason: &str) -> TrendscanError {
    TrendscanError::ConfigInvalid {
        section: "scan".to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

fn validate_positive(config: &dyn ConfigPort, key: &str, default: i64) -> Result<(), TrendscanError> {
    let value = config.get_int("scan", key, default);
    if value < 1 {
        return Err(invalid(key, &format!("{} must be at least 1", key)));
    }
    Ok(())
}

fn validate_staleness(config: &dyn ConfigPort) -> Result<(), TrendscanError> {
    let value = config.get_int("scan", "max_staleness_days", 5);
    if value < 0 {
        return Err(invalid(
            "max_staleness_days",
            "max_staleness_days must be non-negative",
        ));
    }
    if value > MAX_DAYS {
        return Err(invalid(
            "max_staleness_days",
            &format!("max_staleness_days must not exceed {}", MAX_DAYS),
        ));
    }
    Ok(())
}

fn validate_windows(config: &dyn ConfigPort) -> Result<(), TrendscanError> {
    let ma_short = config.get_int("scan", "ma_short", 50);
    let ma_long = config.get_int("scan", "ma_long", 200);
    if ma_short >= ma_long {
        return Err(invalid("ma_short", "ma_short must be shorter than ma_long"));
    }

    let lookback = config.get_int("scan", "lookback_days", 365);
    if lookback > MAX_DAYS {
        return Err(invalid(
            "lookback_days",
            &format!("lookback_days must not exceed {}", MAX_DAYS),
        ));
    }
    if lookback < ma_long {
        return Err(invalid(
            "lookback_days",
            "lookback_days must cover at least ma_long days",
        ));
    }
    Ok(())
}

fn validate_rsi_band(config: &dyn ConfigPort) -> Result<(), TrendscanError> {
    let lower = config.get_double("scan", "rsi_lower", 50.0);
    let upper = config.get_double("scan", "rsi_upper", 70.0);

    if !(0.0..=100.0).contains(&lower) {
        return Err(invalid("rsi_lower", "rsi_lower must be between 0 and 100"));
    }
    if !(0.0..=100.0).contains(&upper) {
        return Err(invalid("rsi_upper", "rsi_upper must be between 0 and 100"));
    }
    if lower > upper {
        return Err(invalid("rsi_lower", "rsi_lower must not exceed rsi_upper"));
    }
    Ok(())
}

fn validate_backend(config: &dyn ConfigPort) -> Result<(), TrendscanError> {
    let backend = config.get_choice("database", "backend", "sqlite");

    if !BACKENDS.contains(&backend.as_str()) {
        return Err(TrendscanError::ConfigInvalid {
            section: "database".to_string(),
            key: "backend".to_string(),
            reason: format!("unknown backend '{}', expected one of {}", backend, BACKENDS.join(", ")),
        });
    }

    let present = |section: &str, key: &str| {
        config
            .get_string(section, key)
            .is_some_and(|v| !v.trim().is_empty())
    };

    let (section, key, found) = match backend.as_str() {
        "sqlite" => ("sqlite", "path", present("sqlite", "path")),
        "postgres" => (
            "postgres",
            "connection_string",
            present("postgres", "connection_string") || present("database", "conninfo"),
        ),
        _ => ("csv", "directory", present("csv", "directory")),
    };

    if !found {
        return Err(TrendscanError::ConfigMissing {
            section: section.to_string(),
            key: key.to_string(),
        });
    }
    Ok(())
}

fn validate_log_format(config: &dyn ConfigPort) -> Result<(), TrendscanError> {
    match config.get_string("logging", "format") {
        None => Ok(()),
        Some(s) if LOG_FORMATS.contains(&s.trim().to_lowercase().as_str()) => Ok(()),
        Some(s) => Err(TrendscanError::ConfigInvalid {
            section: "logging".to_string(),
            key: "format".to_string(),
            reason: format!("unknown log format '{}', expected pretty or json", s.trim()),
        }),
    }
}
