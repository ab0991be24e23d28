//! Course occurrence calendar
//!
//! Maps generated dose times onto calendar days and classifies each day's
//! status. One occurrence per medicine per day is the unit of accounting,
//! however many clock times the medicine has.

use std::collections::BTreeMap;

use chrono::{Datelike, Days, NaiveDate, NaiveTime};
use serde::{Serialize, Serializer};
use uuid::Uuid;

use super::{format_hhmm, times::dose_times};
use crate::models::{DoseStatus, MedicineCourse, UserProfile};

/// One expected dose of one medicine on one date
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DoseOccurrence {
    pub course_id: Uuid,
    pub course_name: String,
    pub medicine_id: Uuid,
    pub medicine_name: String,
    pub date: NaiveDate,
    #[serde(serialize_with = "serialize_clock_times")]
    pub times: Vec<NaiveTime>,
    pub status: DoseStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalendarDay {
    pub date: NaiveDate,
    pub occurrences: Vec<DoseOccurrence>,
}

fn serialize_clock_times<S: Serializer>(times: &[NaiveTime], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(times.iter().map(|t| format_hhmm(*t)))
}

/// Status of a medicine on `date` as seen from `today`.
///
/// A recorded status wins. Otherwise the day is pending from today on and
/// missed before today.
pub fn classify(
    status_by_date: &BTreeMap<NaiveDate, DoseStatus>,
    date: NaiveDate,
    today: NaiveDate,
) -> DoseStatus {
    match status_by_date.get(&date) {
        Some(status) => *status,
        None if date >= today => DoseStatus::Pending,
        None => DoseStatus::Missed,
    }
}

/// Every date of the course, `[start, start + duration)`.
/// Courses without a start date have no calendar dates.
pub fn course_dates(course: &MedicineCourse) -> Vec<NaiveDate> {
    let Some(start) = course.start_date else {
        return Vec::new();
    };
    (0..course.duration as u64)
        .map_while(|offset| start.checked_add_days(Days::new(offset)))
        .collect()
}

fn course_occurrences<'a>(
    course: &'a MedicineCourse,
    user: Option<&'a UserProfile>,
    date: NaiveDate,
    today: NaiveDate,
) -> impl Iterator<Item = DoseOccurrence> + 'a {
    course.medicines.iter().map(move |med| DoseOccurrence {
        course_id: course.id,
        course_name: course.name.clone(),
        medicine_id: med.id,
        medicine_name: med.name.clone(),
        date,
        times: dose_times(med, user),
        status: classify(&med.status_by_date, date, today),
    })
}

fn on_calendar(course: &MedicineCourse, date: NaiveDate) -> bool {
    course.start_date.is_some() && course.is_active(date)
}

/// Occurrences for every dated course active on `date`
pub fn occurrences_on(
    courses: &[MedicineCourse],
    user: Option<&UserProfile>,
    date: NaiveDate,
    today: NaiveDate,
) -> Vec<DoseOccurrence> {
    courses
        .iter()
        .filter(|course| on_calendar(course, date))
        .flat_map(|course| course_occurrences(course, user, date, today))
        .collect()
}

/// The whole course laid out day by day
pub fn course_calendar(
    course: &MedicineCourse,
    user: Option<&UserProfile>,
    today: NaiveDate,
) -> Vec<CalendarDay> {
    course_dates(course)
        .into_iter()
        .map(|date| CalendarDay {
            date,
            occurrences: course_occurrences(course, user, date, today).collect(),
        })
        .collect()
}

/// Dates in `year`-`month` with at least one scheduled medicine.
/// Returns an empty list for an invalid month.
pub fn month_markers(courses: &[MedicineCourse], year: i32, month: u32) -> Vec<NaiveDate> {
    let Some(first) = NaiveDate::from_ymd_opt(year, month, 1) else {
        return Vec::new();
    };

    first
        .iter_days()
        .take_while(|d| d.month() == month)
        .filter(|d| {
            courses
                .iter()
                .any(|course| !course.medicines.is_empty() && on_calendar(course, *d))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CourseCreate, Frequency, MedicineCreate, Timing, WhenToTake};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn course(start: Option<NaiveDate>, duration: u32) -> MedicineCourse {
        MedicineCourse::new(CourseCreate {
            name: "Antibiotics".to_string(),
            duration,
            start_date: start,
            medicines: vec![MedicineCreate {
                name: "Amoxicillin".to_string(),
                frequency: Frequency::ThriceDaily,
                timing: Timing::Morning,
                when_to_take: WhenToTake::AfterMeals,
                custom_time: None,
                x_minutes: None,
                x_hours: None,
                inventory: None,
            }],
        })
        .unwrap()
    }

    #[test]
    fn test_classify_rule() {
        let today = date(2025, 5, 10);
        let mut ledger = BTreeMap::new();
        ledger.insert(date(2025, 5, 8), DoseStatus::Taken);
        ledger.insert(date(2025, 5, 12), DoseStatus::Missed);

        assert_eq!(classify(&ledger, date(2025, 5, 8), today), DoseStatus::Taken);
        assert_eq!(classify(&ledger, date(2025, 5, 9), today), DoseStatus::Missed);
        assert_eq!(classify(&ledger, today, today), DoseStatus::Pending);
        assert_eq!(classify(&ledger, date(2025, 5, 11), today), DoseStatus::Pending);
        assert_eq!(classify(&ledger, date(2025, 5, 12), today), DoseStatus::Missed);
    }

    #[test]
    fn test_course_dates_span_duration() {
        let c = course(Some(date(2025, 2, 27)), 3);
        assert_eq!(
            course_dates(&c),
            vec![date(2025, 2, 27), date(2025, 2, 28), date(2025, 3, 1)]
        );
        assert!(course_dates(&course(None, 3)).is_empty());
    }

    #[test]
    fn test_occurrences_one_per_medicine_per_day() {
        let c = course(Some(date(2025, 1, 1)), 5);
        let occ = occurrences_on(std::slice::from_ref(&c), None, date(2025, 1, 3), date(2025, 1, 2));
        assert_eq!(occ.len(), 1);
        assert_eq!(occ[0].status, DoseStatus::Pending);
        assert!(occ[0].times.is_empty());

        assert!(occurrences_on(&[c], None, date(2025, 1, 6), date(2025, 1, 2)).is_empty());
    }

    #[test]
    fn test_course_calendar_classifies_each_day() {
        let mut c = course(Some(date(2025, 1, 1)), 3);
        c.medicines[0].record_status(date(2025, 1, 1), DoseStatus::Taken);

        let days = course_calendar(&c, None, date(2025, 1, 2));
        let statuses: Vec<_> = days.iter().map(|d| d.occurrences[0].status).collect();
        assert_eq!(statuses, vec![DoseStatus::Taken, DoseStatus::Pending, DoseStatus::Pending]);
    }

    #[test]
    fn test_month_markers_cover_course_days_only() {
        let courses = vec![course(Some(date(2025, 1, 30)), 4), course(None, 10)];
        assert_eq!(
            month_markers(&courses, 2025, 2),
            vec![date(2025, 2, 1), date(2025, 2, 2)]
        );
        assert!(month_markers(&courses, 2025, 13).is_empty());
    }

    #[test]
    fn test_occurrence_times_serialize_as_clock_labels() {
        let c = course(Some(date(2025, 1, 1)), 1);
        let user = UserProfile {
            name: "Sam".to_string(),
            age: 30,
            gender: "m".to_string(),
            medical_conditions: vec![],
            breakfast_time: NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
            lunch_time: NaiveTime::from_hms_opt(13, 0, 0).unwrap(),
            dinner_time: NaiveTime::from_hms_opt(20, 0, 0).unwrap(),
            bedtime: NaiveTime::from_hms_opt(22, 0, 0).unwrap(),
        };
        let occ = occurrences_on(&[c], Some(&user), date(2025, 1, 1), date(2025, 1, 1));
        let json = serde_json::to_value(&occ[0]).unwrap();
        assert_eq!(json["times"], serde_json::json!(["08:30", "13:30", "20:30"]));
        assert_eq!(json["date"], "2025-01-01");
        assert_eq!(json["status"], "pending");
    }
}
