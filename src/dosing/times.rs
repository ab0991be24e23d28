//! Clock times at which a medicine is due

use chrono::NaiveTime;

use super::format_hhmm;
use super::preference::{resolve, shift};
use crate::models::{Frequency, Medicine, Timing, UserProfile};

/// Clock times for one day of `medicine`, in emission order with
/// duplicates removed.
///
/// Without a profile there is nothing to anchor to, so the list is empty.
pub fn dose_times(medicine: &Medicine, user: Option<&UserProfile>) -> Vec<NaiveTime> {
    let Some(user) = user else {
        return Vec::new();
    };

    let through_meals = |anchors: &[NaiveTime]| -> Vec<NaiveTime> {
        anchors
            .iter()
            .map(|&anchor| resolve(anchor, medicine.when_to_take, medicine.x_minutes, user.bedtime))
            .collect()
    };

    let times = match medicine.frequency {
        Frequency::OnceDaily => {
            let anchor = match medicine.timing {
                Timing::Morning => Some(user.breakfast_time),
                Timing::Afternoon => Some(user.lunch_time),
                Timing::Night => Some(user.dinner_time),
                Timing::SpecificTime => medicine.custom_time,
            };
            anchor.map(|a| through_meals(&[a])).unwrap_or_default()
        }
        Frequency::TwiceDaily => through_meals(&[user.breakfast_time, user.dinner_time]),
        Frequency::ThriceDaily => {
            through_meals(&[user.breakfast_time, user.lunch_time, user.dinner_time])
        }
        Frequency::EveryXHours => match medicine.x_hours {
            Some(hours) if hours > 0 => (0..24 / hours)
                .map(|i| shift(user.breakfast_time, (i * hours) as i64 * 60))
                .collect(),
            _ => Vec::new(),
        },
    };

    dedup_in_order(times)
}

/// Same as [`dose_times`], rendered as `HH:MM`
pub fn dose_time_labels(medicine: &Medicine, user: Option<&UserProfile>) -> Vec<String> {
    dose_times(medicine, user).into_iter().map(format_hhmm).collect()
}

fn dedup_in_order(times: Vec<NaiveTime>) -> Vec<NaiveTime> {
    let mut seen = Vec::with_capacity(times.len());
    for time in times {
        if !seen.contains(&time) {
            seen.push(time);
        }
    }
    seen
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MedicineCreate, WhenToTake};

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn user() -> UserProfile {
        UserProfile {
            name: "Sam".to_string(),
            age: 30,
            gender: "f".to_string(),
            medical_conditions: vec![],
            breakfast_time: t(8, 0),
            lunch_time: t(13, 0),
            dinner_time: t(20, 0),
            bedtime: t(22, 30),
        }
    }

    fn medicine(frequency: Frequency, timing: Timing, when: WhenToTake) -> MedicineCreate {
        MedicineCreate {
            name: "Med".to_string(),
            frequency,
            timing,
            when_to_take: when,
            custom_time: None,
            x_minutes: None,
            x_hours: None,
            inventory: None,
        }
    }

    #[test]
    fn test_generator_is_deterministic() {
        let med = Medicine::new(medicine(Frequency::ThriceDaily, Timing::Morning, WhenToTake::BeforeMeals)).unwrap();
        let u = user();
        assert_eq!(dose_times(&med, Some(&u)), dose_times(&med, Some(&u)));
    }

    #[test]
    fn test_every_six_hours_wraps_past_midnight() {
        let mut data = medicine(Frequency::EveryXHours, Timing::Morning, WhenToTake::BeforeMeals);
        data.x_hours = Some(6);
        let med = Medicine::new(data).unwrap();
        assert_eq!(
            dose_times(&med, Some(&user())),
            vec![t(8, 0), t(14, 0), t(20, 0), t(2, 0)]
        );
    }

    #[test]
    fn test_every_seven_hours_floors_count() {
        let mut data = medicine(Frequency::EveryXHours, Timing::Morning, WhenToTake::AfterMeals);
        data.x_hours = Some(7);
        let med = Medicine::new(data).unwrap();
        assert_eq!(dose_times(&med, Some(&user())), vec![t(8, 0), t(15, 0), t(22, 0)]);
    }

    #[test]
    fn test_interval_without_hours_is_empty() {
        let mut med = Medicine::new(medicine(Frequency::OnceDaily, Timing::Morning, WhenToTake::AfterMeals)).unwrap();
        med.frequency = Frequency::EveryXHours;
        assert!(dose_times(&med, Some(&user())).is_empty());
        med.x_hours = Some(0);
        assert!(dose_times(&med, Some(&user())).is_empty());
    }

    #[test]
    fn test_once_daily_anchors() {
        let u = user();
        let night = Medicine::new(medicine(Frequency::OnceDaily, Timing::Night, WhenToTake::AfterMeals)).unwrap();
        assert_eq!(dose_times(&night, Some(&u)), vec![t(20, 30)]);

        let mut data = medicine(Frequency::OnceDaily, Timing::SpecificTime, WhenToTake::BeforeMeals);
        data.custom_time = Some(t(10, 0));
        let specific = Medicine::new(data).unwrap();
        assert_eq!(dose_times(&specific, Some(&u)), vec![t(9, 30)]);
    }

    #[test]
    fn test_bedtime_collapses_duplicates() {
        let med = Medicine::new(medicine(Frequency::ThriceDaily, Timing::Morning, WhenToTake::AtBedtime)).unwrap();
        assert_eq!(dose_times(&med, Some(&user())), vec![t(22, 30)]);
    }

    #[test]
    fn test_no_profile_means_no_times() {
        let med = Medicine::new(medicine(Frequency::TwiceDaily, Timing::Morning, WhenToTake::AfterMeals)).unwrap();
        assert!(dose_times(&med, None).is_empty());
    }

    #[test]
    fn test_labels() {
        let med = Medicine::new(medicine(Frequency::TwiceDaily, Timing::Morning, WhenToTake::BeforeMeals)).unwrap();
        assert_eq!(dose_time_labels(&med, Some(&user())), vec!["07:30", "19:30"]);
    }
}
