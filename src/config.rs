//! Runtime configuration
//!
//! Everything is read from environment variables once at startup.

use std::path::PathBuf;

use chrono::NaiveTime;

use crate::dosing::parse_hhmm;
use crate::dosing::reminders::DEFAULT_SNOOZE_MINUTES;

pub const DEFAULT_LOG_FILTER: &str = "medrem=info";
pub const DEFAULT_HORIZON_DAYS: u32 = 30;
pub const DEFAULT_REFILL_REMINDER_TIME: &str = "09:00";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

#[derive(Clone, Debug)]
pub struct Config {
    pub database_path: PathBuf,
    pub log_filter: String,
    pub snooze_minutes: u32,
    pub reminder_horizon_days: u32,
    pub refill_reminder_time: NaiveTime,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source
    pub fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let database_path = var("MEDREM_DATABASE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(default_database_path);

        let log_filter = var("MEDREM_LOG").unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());

        let snooze_minutes = parse_count(&var, "MEDREM_SNOOZE_MINUTES", DEFAULT_SNOOZE_MINUTES)?;
        let reminder_horizon_days =
            parse_count(&var, "MEDREM_REMINDER_HORIZON_DAYS", DEFAULT_HORIZON_DAYS)?;

        let refill_raw = var("MEDREM_REFILL_REMINDER_TIME")
            .unwrap_or_else(|| DEFAULT_REFILL_REMINDER_TIME.to_string());
        let refill_reminder_time = parse_hhmm(&refill_raw).ok_or_else(|| {
            ConfigError::InvalidValue(
                "MEDREM_REFILL_REMINDER_TIME".to_string(),
                format!("'{}' is not an HH:MM time", refill_raw),
            )
        })?;

        Ok(Self {
            database_path,
            log_filter,
            snooze_minutes,
            reminder_horizon_days,
            refill_reminder_time,
        })
    }
}

fn parse_count(
    var: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: u32,
) -> Result<u32, ConfigError> {
    let Some(raw) = var(key) else {
        return Ok(default);
    };
    match raw.trim().parse::<u32>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ConfigError::InvalidValue(
            key.to_string(),
            format!("'{}' is not a positive whole number", raw),
        )),
    }
}

/// `<project>/data/medrem.db`, where the project root is found by walking up
/// from `target/{debug,release}`
pub fn default_database_path() -> PathBuf {
    let mut path = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(|p| p.to_path_buf()))
        .unwrap_or_else(|| PathBuf::from("."));

    if path.ends_with("release") || path.ends_with("debug") {
        if let Some(root) = path.parent().and_then(|target| target.parent()) {
            path = root.to_path_buf();
        }
    }

    path.push("data");
    path.push("medrem.db");
    path
}
