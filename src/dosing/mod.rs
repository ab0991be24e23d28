//! Dose scheduling and adherence engine
//!
//! Everything in here is synchronous and, apart from `ledger`, pure: callers
//! pass the courses, the profile and "today" in explicitly.

pub mod calendar;
pub mod inventory;
pub mod ledger;
pub mod preference;
pub mod reminders;
pub mod stats;
pub mod times;

use chrono::{NaiveDate, NaiveTime, Timelike};

pub use calendar::{classify, course_calendar, course_dates, month_markers, occurrences_on, CalendarDay, DoseOccurrence};
pub use inventory::{apply_taken_transition, LowStockAlert};
pub use ledger::{apply_status, StatusChange};
pub use preference::resolve;
pub use reminders::{
    daily_refill_reminder, parse_reminder_body, plan_reminders, snooze, weekly_inventory_check,
    DoseRef, NotificationAction, NotificationResponse, Recurrence, RecurringReminder, Reminder,
};
pub use stats::{
    adherence_rate, days_remaining, dose_statistics, elapsed_fraction, medicine_statistics,
    progress, DoseStatistics,
};
pub use times::{dose_time_labels, dose_times};

/// Format of every date key (ledger, calendar, statistics, storage)
pub const DATE_KEY_FORMAT: &str = "%Y-%m-%d";

/// Clock-time format used for dose times and reminder identifiers
pub const CLOCK_FORMAT: &str = "%H:%M";

pub fn date_key(date: NaiveDate) -> String {
    date.format(DATE_KEY_FORMAT).to_string()
}

pub fn parse_date_key(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), DATE_KEY_FORMAT).ok()
}

pub fn format_hhmm(time: NaiveTime) -> String {
    time.format(CLOCK_FORMAT).to_string()
}

/// Parse "HH:MM" (seconds, if present, are accepted and dropped)
pub fn parse_hhmm(s: &str) -> Option<NaiveTime> {
    let s = s.trim();
    NaiveTime::parse_from_str(s, CLOCK_FORMAT)
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
        .ok()
        .and_then(|t| NaiveTime::from_hms_opt(t.hour(), t.minute(), 0))
}
