//! Adherence and progress
//!
//! Progress counts the course's active days up to today,
//! `[start, min(today, start + duration - 1)]`. Dose statistics run one day
//! further, `[start, min(today, start + duration)]`. Both use the same
//! classifier as the calendar.

use chrono::NaiveDate;
use serde::Serialize;
use uuid::Uuid;

use super::calendar::classify;
use crate::models::{DoseStatus, Medicine, MedicineCourse};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DoseStatistics {
    pub total: u32,
    pub taken: u32,
    pub missed: u32,
}

impl DoseStatistics {
    fn count(&mut self, status: DoseStatus) {
        self.total += 1;
        match status {
            DoseStatus::Taken => self.taken += 1,
            DoseStatus::Missed => self.missed += 1,
            DoseStatus::Pending => {}
        }
    }
}

/// `[start, min(today, last)]`, or `None` before the course starts
fn window_through(start: NaiveDate, last: NaiveDate, today: NaiveDate) -> Option<Vec<NaiveDate>> {
    if today < start {
        return None;
    }
    let last = last.min(today);
    Some(start.iter_days().take_while(|d| *d <= last).collect())
}

/// Active days elapsed so far
fn elapsed_window(course: &MedicineCourse, today: NaiveDate) -> Option<Vec<NaiveDate>> {
    window_through(course.start_date?, course.last_day()?, today)
}

/// Statistics window; closed at `start + duration`
fn statistics_window(course: &MedicineCourse, today: NaiveDate) -> Option<Vec<NaiveDate>> {
    window_through(course.start_date?, course.end_date()?, today)
}

fn tally(medicine: &Medicine, window: &[NaiveDate], today: NaiveDate, stats: &mut DoseStatistics) {
    for date in window {
        stats.count(classify(&medicine.status_by_date, *date, today));
    }
}

/// Whole days left: the full duration before the start (or without one),
/// zero once the course has ended
pub fn days_remaining(course: &MedicineCourse, today: NaiveDate) -> u32 {
    let (Some(start), Some(end)) = (course.start_date, course.end_date()) else {
        return course.duration;
    };
    if today < start {
        course.duration
    } else if today >= end {
        0
    } else {
        (end - today).num_days() as u32
    }
}

/// Taken doses so far over all doses of the course, in `[0, 1]`
pub fn progress(course: &MedicineCourse, today: NaiveDate) -> f64 {
    let denominator = course.duration as u64 * course.medicines.len() as u64;
    if denominator == 0 {
        return 0.0;
    }
    let Some(window) = elapsed_window(course, today) else {
        return 0.0;
    };

    let taken: u64 = course
        .medicines
        .iter()
        .map(|med| {
            window
                .iter()
                .filter(|d| med.status_on(**d).is_some_and(|s| s.is_taken()))
                .count() as u64
        })
        .sum();

    (taken as f64 / denominator as f64).clamp(0.0, 1.0)
}

pub fn dose_statistics(course: &MedicineCourse, today: NaiveDate) -> DoseStatistics {
    let mut stats = DoseStatistics::default();
    if let Some(window) = statistics_window(course, today) {
        for med in &course.medicines {
            tally(med, &window, today, &mut stats);
        }
    }
    stats
}

/// Breakdown for a single medicine; `None` if it is not in the course
pub fn medicine_statistics(
    course: &MedicineCourse,
    medicine_id: Uuid,
    today: NaiveDate,
) -> Option<DoseStatistics> {
    let med = course.medicine(medicine_id)?;
    let mut stats = DoseStatistics::default();
    if let Some(window) = statistics_window(course, today) {
        tally(med, &window, today, &mut stats);
    }
    Some(stats)
}

/// Percentage of taken doses, `None` when nothing is due yet
pub fn adherence_rate(stats: &DoseStatistics) -> Option<f64> {
    if stats.total == 0 {
        return None;
    }
    Some(stats.taken as f64 / stats.total as f64 * 100.0)
}

/// Calendar time used up, in `[0, 1]`
pub fn elapsed_fraction(course: &MedicineCourse, today: NaiveDate) -> f64 {
    let Some(start) = course.start_date else {
        return 0.0;
    };
    if course.duration == 0 || today <= start {
        return 0.0;
    }
    let elapsed = (today - start).num_days() as f64;
    (elapsed / course.duration as f64).min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CourseCreate, Frequency, MedicineCreate, Timing, WhenToTake};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn med(name: &str) -> MedicineCreate {
        MedicineCreate {
            name: name.to_string(),
            frequency: Frequency::ThriceDaily,
            timing: Timing::Morning,
            when_to_take: WhenToTake::AfterMeals,
            custom_time: None,
            x_minutes: None,
            x_hours: None,
            inventory: None,
        }
    }

    fn course(start: Option<NaiveDate>, duration: u32, medicines: &[&str]) -> MedicineCourse {
        MedicineCourse::new(CourseCreate {
            name: "Antibiotics".to_string(),
            duration,
            start_date: start,
            medicines: medicines.iter().map(|n| med(n)).collect(),
        })
        .unwrap()
    }

    #[test]
    fn test_antibiotics_scenario() {
        let d0 = date(2025, 3, 1);
        let mut c = course(Some(d0), 5, &["Amoxicillin"]);
        c.medicines[0].record_status(d0, DoseStatus::Taken);
        c.medicines[0].record_status(date(2025, 3, 3), DoseStatus::Missed);

        let stats = dose_statistics(&c, date(2025, 3, 3));
        assert_eq!(stats, DoseStatistics { total: 3, taken: 1, missed: 2 });
        let rate = adherence_rate(&stats).unwrap();
        assert!((rate - 100.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_unrecorded_today_is_counted_but_not_missed() {
        let d0 = date(2025, 3, 1);
        let c = course(Some(d0), 5, &["A"]);
        assert_eq!(
            dose_statistics(&c, d0),
            DoseStatistics { total: 1, taken: 0, missed: 0 }
        );
    }

    #[test]
    fn test_statistics_window_closes_at_end_date() {
        let d0 = date(2025, 3, 1);
        let c = course(Some(d0), 2, &["A", "B"]);
        let stats = dose_statistics(&c, date(2025, 4, 1));
        assert_eq!(stats, DoseStatistics { total: 6, taken: 0, missed: 6 });

        let single = course(Some(d0), 2, &["A"]);
        assert_eq!(
            dose_statistics(&single, date(2025, 3, 10)),
            DoseStatistics { total: 3, taken: 0, missed: 3 }
        );
        // today is the end date: counted but still pending
        assert_eq!(
            dose_statistics(&single, date(2025, 3, 3)),
            DoseStatistics { total: 3, taken: 0, missed: 2 }
        );
    }

    #[test]
    fn test_progress_window_stops_at_last_course_day() {
        let d0 = date(2025, 3, 1);
        let mut c = course(Some(d0), 2, &["A"]);
        c.medicines[0].record_status(d0, DoseStatus::Taken);
        c.medicines[0].record_status(date(2025, 3, 2), DoseStatus::Taken);
        // outside the active days
        c.medicines[0].record_status(date(2025, 3, 3), DoseStatus::Taken);
        assert_eq!(progress(&c, date(2025, 4, 1)), 1.0);
        assert_eq!(
            dose_statistics(&c, date(2025, 4, 1)),
            DoseStatistics { total: 3, taken: 3, missed: 0 }
        );
    }

    #[test]
    fn test_adherence_rate_undefined_without_doses() {
        assert_eq!(adherence_rate(&DoseStatistics::default()), None);
        let c = course(None, 3, &["A"]);
        assert_eq!(dose_statistics(&c, date(2025, 1, 1)).total, 0);
    }

    #[test]
    fn test_days_remaining_boundaries() {
        let start = date(2025, 6, 1);
        let c = course(Some(start), 7, &["A"]);
        assert_eq!(days_remaining(&c, start), 7);
        assert_eq!(days_remaining(&c, date(2025, 5, 20)), 7);
        assert_eq!(days_remaining(&c, date(2025, 6, 5)), 3);
        assert_eq!(days_remaining(&c, date(2025, 6, 8)), 0);
        assert_eq!(days_remaining(&c, date(2026, 1, 1)), 0);
        assert_eq!(days_remaining(&course(None, 9, &["A"]), start), 9);
    }

    #[test]
    fn test_progress_bounds_and_value() {
        let start = date(2025, 6, 1);
        let mut c = course(Some(start), 4, &["A", "B"]);
        assert_eq!(progress(&c, date(2025, 5, 31)), 0.0);

        c.medicines[0].record_status(start, DoseStatus::Taken);
        c.medicines[1].record_status(start, DoseStatus::Taken);
        c.medicines[0].record_status(date(2025, 6, 2), DoseStatus::Taken);
        c.medicines[1].record_status(date(2025, 6, 2), DoseStatus::Missed);
        // recorded ahead of today, outside the window
        c.medicines[0].record_status(date(2025, 6, 4), DoseStatus::Taken);

        assert!((progress(&c, date(2025, 6, 2)) - 3.0 / 8.0).abs() < 1e-9);
        let later = progress(&c, date(2025, 9, 1));
        assert!((later - 4.0 / 8.0).abs() < 1e-9);
        assert!((0.0..=1.0).contains(&later));
        assert_eq!(progress(&course(None, 4, &["A"]), start), 0.0);
    }

    #[test]
    fn test_medicine_statistics_per_medicine() {
        let start = date(2025, 6, 1);
        let mut c = course(Some(start), 3, &["A", "B"]);
        c.medicines[0].record_status(start, DoseStatus::Taken);
        let a = c.medicines[0].id;
        let b = c.medicines[1].id;

        let today = date(2025, 6, 2);
        assert_eq!(
            medicine_statistics(&c, a, today),
            Some(DoseStatistics { total: 2, taken: 1, missed: 0 })
        );
        assert_eq!(
            medicine_statistics(&c, b, today),
            Some(DoseStatistics { total: 2, taken: 0, missed: 1 })
        );
        assert_eq!(medicine_statistics(&c, Uuid::new_v4(), today), None);
    }

    #[test]
    fn test_elapsed_fraction_clamped() {
        let start = date(2025, 6, 1);
        let c = course(Some(start), 4, &["A"]);
        assert_eq!(elapsed_fraction(&c, date(2025, 5, 1)), 0.0);
        assert_eq!(elapsed_fraction(&c, start), 0.0);
        assert_eq!(elapsed_fraction(&c, date(2025, 6, 3)), 0.5);
        assert_eq!(elapsed_fraction(&c, date(2025, 7, 1)), 1.0);
    }
}
