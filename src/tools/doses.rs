//! Dose MCP Tools
//!
//! Recording dose statuses and reading the schedule back as day lists,
//! course calendars and month markers.

use serde::Serialize;

use super::{book_error, date_or_today, parse_date, parse_enum, parse_id};
use crate::book::CourseBook;
use crate::dosing::{
    course_calendar as build_course_calendar, date_key, month_markers as build_month_markers,
    occurrences_on, CalendarDay, DoseOccurrence, StatusChange,
};
use crate::models::DoseStatus;

#[derive(Debug, Serialize)]
pub struct DaySchedule {
    pub date: String,
    pub occurrences: Vec<DoseOccurrence>,
    pub taken: usize,
    pub missed: usize,
    pub pending: usize,
}

#[derive(Debug, Serialize)]
pub struct CourseCalendarResponse {
    pub course_id: String,
    pub course_name: String,
    pub days: Vec<CalendarDay>,
}

#[derive(Debug, Serialize)]
pub struct MonthMarkersResponse {
    pub year: i32,
    pub month: u32,
    pub dates: Vec<String>,
}

// ============================================================================
// Tool Functions
// ============================================================================

/// Record taken / missed / pending for one medicine on one date.
/// `None` when either id is unknown.
pub fn set_dose_status(
    book: &CourseBook,
    course_id: &str,
    medicine_id: &str,
    date: Option<&str>,
    status: &str,
) -> Result<Option<StatusChange>, String> {
    let cid = parse_id("course_id", course_id)?;
    let mid = parse_id("medicine_id", medicine_id)?;
    let date = date_or_today(date)?;
    let status = parse_enum("status", status, DoseStatus::parse)?;

    book.set_status(cid, mid, date, status).map_err(book_error)
}

/// Everything scheduled on one date across all courses
pub fn day_schedule(book: &CourseBook, date: Option<&str>, today: Option<&str>) -> Result<DaySchedule, String> {
    let today = date_or_today(today)?;
    let date = match date {
        Some(raw) => parse_date(raw)?,
        None => today,
    };

    let courses = book.courses().map_err(book_error)?;
    let profile = book.profile().map_err(book_error)?;
    let occurrences = occurrences_on(&courses, profile.as_ref(), date, today);

    let count = |status: DoseStatus| occurrences.iter().filter(|o| o.status == status).count();
    Ok(DaySchedule {
        date: date_key(date),
        taken: count(DoseStatus::Taken),
        missed: count(DoseStatus::Missed),
        pending: count(DoseStatus::Pending),
        occurrences,
    })
}

pub fn course_calendar(
    book: &CourseBook,
    course_id: &str,
    today: Option<&str>,
) -> Result<Option<CourseCalendarResponse>, String> {
    let id = parse_id("course_id", course_id)?;
    let today = date_or_today(today)?;
    let Some(course) = book.course(id).map_err(book_error)? else {
        return Ok(None);
    };
    let profile = book.profile().map_err(book_error)?;

    Ok(Some(CourseCalendarResponse {
        course_id: course.id.to_string(),
        days: build_course_calendar(&course, profile.as_ref(), today),
        course_name: course.name,
    }))
}

/// Dates in a month that have at least one scheduled medicine
pub fn month_markers(book: &CourseBook, year: i32, month: u32) -> Result<MonthMarkersResponse, String> {
    if !(1..=12).contains(&month) {
        return Err(format!("Invalid month {}, expected 1-12", month));
    }
    let courses = book.courses().map_err(book_error)?;
    Ok(MonthMarkersResponse {
        year,
        month,
        dates: build_month_markers(&courses, year, month)
            .into_iter()
            .map(date_key)
            .collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use chrono::{NaiveDate, NaiveTime};

    use crate::db::Database;
    use crate::models::{
        CourseCreate, Frequency, MedicineCourse, MedicineCreate, Timing, UserProfile, WhenToTake,
    };
    use crate::notify::AlertOutbox;

    fn setup() -> (CourseBook, MedicineCourse) {
        let db = Database::in_memory().unwrap();
        db.migrate().unwrap();
        let book = CourseBook::new(Arc::new(db), Arc::new(AlertOutbox::new()));
        let course = book
            .create_course(CourseCreate {
                name: "Antibiotics".to_string(),
                duration: 5,
                start_date: NaiveDate::from_ymd_opt(2025, 3, 1),
                medicines: vec![MedicineCreate {
                    name: "Amoxicillin".to_string(),
                    frequency: Frequency::TwiceDaily,
                    timing: Timing::Morning,
                    when_to_take: WhenToTake::BeforeMeals,
                    custom_time: None,
                    x_minutes: None,
                    x_hours: None,
                    inventory: None,
                }],
            })
            .unwrap();
        (book, course)
    }

    #[test]
    fn test_status_then_day_schedule() {
        let (book, course) = setup();
        let cid = course.id.to_string();
        let mid = course.medicines[0].id.to_string();

        let change = set_dose_status(&book, &cid, &mid, Some("2025-03-02"), "Taken")
            .unwrap()
            .unwrap();
        assert_eq!(change.current, Some(DoseStatus::Taken));

        let day = day_schedule(&book, Some("2025-03-02"), Some("2025-03-03")).unwrap();
        assert_eq!(day.occurrences.len(), 1);
        assert_eq!(day.taken, 1);
        // no profile yet
        assert!(day.occurrences[0].times.is_empty());

        let earlier = day_schedule(&book, Some("2025-03-01"), Some("2025-03-03")).unwrap();
        assert_eq!(earlier.missed, 1);
    }

    #[test]
    fn test_day_schedule_uses_profile_times() {
        let (book, _) = setup();
        let t = |h, m| NaiveTime::from_hms_opt(h, m, 0).unwrap();
        book.save_profile(&UserProfile {
            name: "Sam".to_string(),
            age: 40,
            gender: "x".to_string(),
            medical_conditions: vec![],
            breakfast_time: t(8, 0),
            lunch_time: t(13, 0),
            dinner_time: t(20, 0),
            bedtime: t(23, 0),
        })
        .unwrap();

        let day = day_schedule(&book, Some("2025-03-04"), Some("2025-03-01")).unwrap();
        assert_eq!(day.occurrences[0].times, vec![t(7, 30), t(19, 30)]);
        assert_eq!(day.pending, 1);
    }

    #[test]
    fn test_unknown_status_and_ids() {
        let (book, course) = setup();
        let cid = course.id.to_string();
        let mid = course.medicines[0].id.to_string();
        assert!(set_dose_status(&book, &cid, &mid, None, "skipped").is_err());
        assert!(set_dose_status(&book, "not-a-uuid", &mid, None, "taken").is_err());
        let other = uuid::Uuid::new_v4().to_string();
        assert!(set_dose_status(&book, &other, &mid, None, "taken").unwrap().is_none());
    }

    #[test]
    fn test_calendar_and_markers() {
        let (book, course) = setup();
        let calendar = course_calendar(&book, &course.id.to_string(), Some("2025-03-03"))
            .unwrap()
            .unwrap();
        assert_eq!(calendar.days.len(), 5);

        let markers = month_markers(&book, 2025, 3).unwrap();
        assert_eq!(markers.dates.first().map(String::as_str), Some("2025-03-01"));
        assert_eq!(markers.dates.len(), 5);
        assert!(month_markers(&book, 2025, 13).is_err());
    }
}
