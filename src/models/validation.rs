//! Validation errors for course and medicine input

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Course name cannot be empty")]
    EmptyCourseName,

    #[error("A course needs at least one medicine")]
    NoMedicines,

    #[error("Course duration must be at least 1 day")]
    InvalidDuration,

    #[error("Medicine name cannot be empty")]
    EmptyMedicineName,

    #[error("custom_time is required when timing is specific_time")]
    MissingCustomTime,

    #[error("x_minutes must be between 1 and 120 (got {0:?})")]
    InvalidXMinutes(Option<u32>),

    #[error("x_hours must be between 1 and 24 (got {0:?})")]
    InvalidXHours(Option<u32>),

    #[error("Unknown {field}: '{value}'")]
    UnknownValue { field: &'static str, value: String },

    #[error("Invalid time '{0}', expected HH:MM")]
    InvalidTime(String),

    #[error("Invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),
}
