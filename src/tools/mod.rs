//! Medrem tools module
//!
//! MCP tool implementations. Each function takes the course book plus plain
//! inputs and returns a serializable response or an error message.

pub mod courses;
pub mod doses;
pub mod inventory;
pub mod profile;
pub mod reminders;
pub mod status;

use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime};
use uuid::Uuid;

use crate::book::BookError;
use crate::dosing::{parse_date_key, parse_hhmm};
use crate::models::ValidationError;

pub(crate) fn parse_id(field: &str, raw: &str) -> Result<Uuid, String> {
    Uuid::parse_str(raw.trim()).map_err(|_| format!("Invalid {} '{}', expected a UUID", field, raw))
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    parse_date_key(raw).ok_or_else(|| ValidationError::InvalidDate(raw.to_string()).to_string())
}

pub(crate) fn parse_time(raw: &str) -> Result<NaiveTime, String> {
    parse_hhmm(raw).ok_or_else(|| ValidationError::InvalidTime(raw.to_string()).to_string())
}

pub(crate) fn parse_optional_date(raw: Option<&str>) -> Result<Option<NaiveDate>, String> {
    raw.filter(|s| !s.trim().is_empty()).map(parse_date).transpose()
}

/// The given date, or the local date when absent
pub(crate) fn date_or_today(raw: Option<&str>) -> Result<NaiveDate, String> {
    Ok(parse_optional_date(raw)?.unwrap_or_else(|| Local::now().date_naive()))
}

/// The given local timestamp (`YYYY-MM-DDTHH:MM[:SS]` or with a space), or
/// the current local time when absent
pub(crate) fn datetime_or_now(raw: Option<&str>) -> Result<NaiveDateTime, String> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(Local::now().naive_local());
    };
    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .ok_or_else(|| format!("Invalid timestamp '{}', expected YYYY-MM-DDTHH:MM", raw))
}

/// Parse a closed-set value, naming the field on failure
pub(crate) fn parse_enum<T>(
    field: &'static str,
    raw: &str,
    parse: impl Fn(&str) -> Option<T>,
) -> Result<T, String> {
    parse(raw).ok_or_else(|| {
        ValidationError::UnknownValue {
            field,
            value: raw.to_string(),
        }
        .to_string()
    })
}

pub(crate) fn book_error(e: BookError) -> String {
    match e {
        BookError::Invalid(v) => format!("Invalid input: {}", v),
        other => format!("Database error: {}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Frequency;

    #[test]
    fn test_datetime_formats() {
        let expected = NaiveDate::from_ymd_opt(2025, 4, 1)
            .unwrap()
            .and_hms_opt(7, 45, 0)
            .unwrap();
        assert_eq!(datetime_or_now(Some("2025-04-01T07:45")).unwrap(), expected);
        assert_eq!(datetime_or_now(Some("2025-04-01 07:45:00")).unwrap(), expected);
        assert!(datetime_or_now(Some("tomorrow")).is_err());
    }

    #[test]
    fn test_parse_enum_names_the_field() {
        let err = parse_enum("frequency", "hourly", Frequency::parse).unwrap_err();
        assert_eq!(err, "Unknown frequency: 'hourly'");
    }

    #[test]
    fn test_blank_optional_date_is_none() {
        assert_eq!(parse_optional_date(Some("  ")).unwrap(), None);
        assert!(parse_optional_date(Some("2025-13-01")).is_err());
    }
}
