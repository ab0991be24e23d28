//! Reminder planning and notification responses
//!
//! Turns the generated dose times into concrete reminders and recurring
//! inventory nudges. Reminders carry the ids of the doses they cover so a
//! response can be applied without matching on names.

use std::collections::BTreeMap;

use chrono::{Days, Duration, NaiveDateTime, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{date_key, format_hhmm, times::dose_times};
use crate::models::{MedicineCourse, UserProfile};

pub const REMINDER_TITLE: &str = "Medicine Reminder";
pub const SNOOZE_TITLE: &str = "Reminder: Medicine Time";
pub const REMINDER_CATEGORY: &str = "DAILY_REMINDER";
pub const REFILL_TITLE: &str = "Medicine Refill Reminder";
pub const WEEKLY_CHECK_TITLE: &str = "Weekly Medicine Inventory Check";
pub const DEFAULT_SNOOZE_MINUTES: u32 = 10;

const BODY_PREFIX: &str = "Time to take: ";

/// Identity of one medicine in one course, carried through a reminder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoseRef {
    pub course_id: Uuid,
    pub medicine_id: Uuid,
    pub name: String,
}

/// A one-off reminder at a specific local date and time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reminder {
    pub id: String,
    pub title: String,
    pub body: String,
    pub category: String,
    pub fire_at: NaiveDateTime,
    pub doses: Vec<DoseRef>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "every", rename_all = "lowercase")]
pub enum Recurrence {
    Day { at: NaiveTime },
    Week { weekday: Weekday, at: NaiveTime },
}

/// A reminder that repeats on a fixed schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecurringReminder {
    pub id: String,
    pub title: String,
    pub body: String,
    pub recurrence: Recurrence,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotificationAction {
    #[serde(rename = "MARK_AS_TAKEN")]
    MarkTaken,
    #[serde(rename = "REMIND_LATER")]
    RemindLater,
}

impl NotificationAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationAction::MarkTaken => "MARK_AS_TAKEN",
            NotificationAction::RemindLater => "REMIND_LATER",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().replace([' ', '-'], "_").as_str() {
            "MARK_AS_TAKEN" | "MARK_TAKEN" | "TAKEN" => Some(NotificationAction::MarkTaken),
            "REMIND_LATER" | "SNOOZE" => Some(NotificationAction::RemindLater),
            _ => None,
        }
    }
}

/// What the user did with a delivered reminder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationResponse {
    pub action: NotificationAction,
    /// May be empty for reminders issued without ids
    #[serde(default)]
    pub doses: Vec<DoseRef>,
    #[serde(default)]
    pub body: String,
}

impl NotificationResponse {
    /// The reminder this response answers, rebuilt so it can be snoozed
    pub fn to_reminder(&self, now: NaiveDateTime) -> Reminder {
        let body = if self.body.trim().is_empty() {
            reminder_body(&self.doses)
        } else {
            self.body.clone()
        };
        Reminder {
            id: String::new(),
            title: REMINDER_TITLE.to_string(),
            body,
            category: REMINDER_CATEGORY.to_string(),
            fire_at: now,
            doses: self.doses.clone(),
        }
    }
}

fn reminder_body(doses: &[DoseRef]) -> String {
    let names: Vec<&str> = doses.iter().map(|d| d.name.as_str()).collect();
    format!("{}{}", BODY_PREFIX, names.join(", "))
}

/// Reminders from `now` through the next `horizon_days` days.
///
/// One reminder per distinct (date, clock time), bundling every medicine
/// whose course is active on that date and is due at that time. Only
/// reminders strictly after `now` are returned, in firing order.
pub fn plan_reminders(
    courses: &[MedicineCourse],
    user: Option<&UserProfile>,
    now: NaiveDateTime,
    horizon_days: u32,
) -> Vec<Reminder> {
    let today = now.date();

    let schedule: Vec<(&MedicineCourse, Vec<(DoseRef, Vec<NaiveTime>)>)> = courses
        .iter()
        .map(|course| {
            let meds = course
                .medicines
                .iter()
                .map(|med| {
                    let dose = DoseRef {
                        course_id: course.id,
                        medicine_id: med.id,
                        name: med.name.clone(),
                    };
                    (dose, dose_times(med, user))
                })
                .collect();
            (course, meds)
        })
        .collect();

    let mut reminders = Vec::new();
    for offset in 0..horizon_days as u64 {
        let Some(date) = today.checked_add_days(Days::new(offset)) else {
            break;
        };

        let mut slots: BTreeMap<NaiveTime, Vec<DoseRef>> = BTreeMap::new();
        for (course, meds) in &schedule {
            if !course.is_active(date) {
                continue;
            }
            for (dose, times) in meds {
                for time in times {
                    slots.entry(*time).or_default().push(dose.clone());
                }
            }
        }

        for (time, doses) in slots {
            let fire_at = date.and_time(time);
            if fire_at <= now {
                continue;
            }
            reminders.push(Reminder {
                id: format!("notification_{}_{}", date_key(date), format_hhmm(time)),
                title: REMINDER_TITLE.to_string(),
                body: reminder_body(&doses),
                category: REMINDER_CATEGORY.to_string(),
                fire_at,
                doses,
            });
        }
    }

    reminders
}

/// Daily nudge listing every tracked medicine that is low and set to
/// notify. `None` when nothing is low.
pub fn daily_refill_reminder(courses: &[MedicineCourse], at: NaiveTime) -> Option<RecurringReminder> {
    let low: Vec<(&str, u32, &str)> = courses
        .iter()
        .flat_map(|c| c.medicines.iter())
        .filter_map(|med| {
            let inv = med.inventory.as_ref()?;
            inv.should_alert()
                .then(|| (med.name.as_str(), inv.current_count, inv.unit_type.label()))
        })
        .collect();

    let body = match low.as_slice() {
        [] => return None,
        [(name, count, unit)] => {
            format!("You only have {} {} of {} left. Please refill soon.", count, unit, name)
        }
        many => {
            let names: Vec<&str> = many.iter().map(|(name, _, _)| *name).collect();
            format!(
                "Multiple medicines are running low: {}. Please check your inventory.",
                names.join(", ")
            )
        }
    };

    Some(RecurringReminder {
        id: "daily_low_stock_reminder".to_string(),
        title: REFILL_TITLE.to_string(),
        body,
        recurrence: Recurrence::Day { at },
    })
}

/// Monday morning inventory check
pub fn weekly_inventory_check() -> RecurringReminder {
    RecurringReminder {
        id: "weekly_inventory_reminder".to_string(),
        title: WEEKLY_CHECK_TITLE.to_string(),
        body: "It's time to check your medicine inventory. Make sure you have enough medication for the week."
            .to_string(),
        recurrence: Recurrence::Week {
            weekday: Weekday::Mon,
            at: NaiveTime::from_hms_opt(9, 0, 0).unwrap_or(NaiveTime::MIN),
        },
    }
}

/// Re-issue `reminder` `minutes` from now
pub fn snooze(reminder: &Reminder, now: NaiveDateTime, minutes: u32) -> Reminder {
    Reminder {
        id: format!("snooze_{}", Uuid::new_v4()),
        title: SNOOZE_TITLE.to_string(),
        body: reminder.body.clone(),
        category: REMINDER_CATEGORY.to_string(),
        fire_at: now + Duration::minutes(minutes as i64),
        doses: reminder.doses.clone(),
    }
}

/// Medicine names listed in a reminder body.
///
/// Only for responses that arrive without dose ids.
pub fn parse_reminder_body(body: &str) -> Vec<String> {
    let body = body.trim();
    let list = match body.get(..BODY_PREFIX.len()) {
        Some(head) if head.eq_ignore_ascii_case(BODY_PREFIX) => &body[BODY_PREFIX.len()..],
        _ => body.strip_prefix(SNOOZE_TITLE).unwrap_or(body),
    };

    list.split(", ")
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    use crate::models::{
        CourseCreate, Frequency, MedicineCreate, MedicineInventory, Timing, UnitType, WhenToTake,
    };

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn user() -> UserProfile {
        UserProfile {
            name: "Sam".to_string(),
            age: 50,
            gender: "f".to_string(),
            medical_conditions: vec![],
            breakfast_time: t(8, 0),
            lunch_time: t(13, 0),
            dinner_time: t(20, 0),
            bedtime: t(22, 0),
        }
    }

    fn med(name: &str, frequency: Frequency, when: WhenToTake) -> MedicineCreate {
        MedicineCreate {
            name: name.to_string(),
            frequency,
            timing: Timing::Morning,
            when_to_take: when,
            custom_time: None,
            x_minutes: None,
            x_hours: None,
            inventory: None,
        }
    }

    fn course(start: Option<NaiveDate>, duration: u32, medicines: Vec<MedicineCreate>) -> MedicineCourse {
        MedicineCourse::new(CourseCreate {
            name: "Course".to_string(),
            duration,
            start_date: start,
            medicines,
        })
        .unwrap()
    }

    fn stock(count: u32, unit: UnitType) -> Option<MedicineInventory> {
        Some(MedicineInventory {
            tracking_enabled: true,
            unit_type: unit,
            current_count: count,
            full_pack_count: 30,
            low_stock_threshold: 5,
            notify_when_low: true,
            last_refill_date: None,
        })
    }

    #[test]
    fn test_plan_bundles_medicines_sharing_a_time() {
        let courses = vec![
            course(
                Some(date(2025, 1, 1)),
                2,
                vec![med("Amoxicillin", Frequency::TwiceDaily, WhenToTake::AfterMeals)],
            ),
            course(None, 1, vec![med("Vitamin D", Frequency::OnceDaily, WhenToTake::AfterMeals)]),
        ];
        let now = date(2025, 1, 1).and_time(t(9, 0));
        let plan = plan_reminders(&courses, Some(&user()), now, 3);

        let ids: Vec<&str> = plan.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(
            ids,
            vec![
                "notification_2025-01-01_20:30",
                "notification_2025-01-02_08:30",
                "notification_2025-01-02_20:30",
                "notification_2025-01-03_08:30",
            ]
        );
        assert_eq!(plan[1].body, "Time to take: Amoxicillin, Vitamin D");
        assert_eq!(plan[1].doses.len(), 2);
        assert_eq!(plan[1].doses[0].medicine_id, courses[0].medicines[0].id);
        assert_eq!(plan[3].body, "Time to take: Vitamin D");
        assert!(plan.iter().all(|r| r.fire_at > now && r.title == REMINDER_TITLE));
    }

    #[test]
    fn test_plan_without_profile_is_empty() {
        let courses = vec![course(None, 1, vec![med("A", Frequency::ThriceDaily, WhenToTake::BeforeMeals)])];
        let now = date(2025, 1, 1).and_time(t(0, 0));
        assert!(plan_reminders(&courses, None, now, 7).is_empty());
    }

    #[test]
    fn test_refill_reminder_single_and_many() {
        let mut one = med("Inhaler", Frequency::OnceDaily, WhenToTake::AfterMeals);
        one.inventory = stock(2, UnitType::Inhalers);
        let mut fine = med("Plenty", Frequency::OnceDaily, WhenToTake::AfterMeals);
        fine.inventory = stock(25, UnitType::Pills);
        let courses = vec![course(None, 5, vec![one.clone(), fine])];

        let reminder = daily_refill_reminder(&courses, t(9, 0)).unwrap();
        assert_eq!(reminder.body, "You only have 2 Inhalers of Inhaler left. Please refill soon.");
        assert_eq!(reminder.recurrence, Recurrence::Day { at: t(9, 0) });

        let mut syrup = med("Syrup", Frequency::OnceDaily, WhenToTake::AfterMeals);
        syrup.inventory = stock(1, UnitType::Milliliters);
        let courses = vec![course(None, 5, vec![one, syrup])];
        let reminder = daily_refill_reminder(&courses, t(9, 0)).unwrap();
        assert_eq!(
            reminder.body,
            "Multiple medicines are running low: Inhaler, Syrup. Please check your inventory."
        );
    }

    #[test]
    fn test_refill_reminder_none_when_stocked() {
        let courses = vec![course(None, 5, vec![med("A", Frequency::OnceDaily, WhenToTake::AfterMeals)])];
        assert!(daily_refill_reminder(&courses, t(9, 0)).is_none());
    }

    #[test]
    fn test_weekly_check_is_monday_morning() {
        let check = weekly_inventory_check();
        assert_eq!(check.title, WEEKLY_CHECK_TITLE);
        assert_eq!(check.recurrence, Recurrence::Week { weekday: Weekday::Mon, at: t(9, 0) });
    }

    #[test]
    fn test_snooze_keeps_doses() {
        let courses = vec![course(None, 1, vec![med("A", Frequency::OnceDaily, WhenToTake::AfterMeals)])];
        let now = date(2025, 1, 1).and_time(t(7, 0));
        let original = plan_reminders(&courses, Some(&user()), now, 1).remove(0);

        let later = date(2025, 1, 1).and_time(t(8, 31));
        let snoozed = snooze(&original, later, DEFAULT_SNOOZE_MINUTES);
        assert!(snoozed.id.starts_with("snooze_"));
        assert_eq!(snoozed.title, SNOOZE_TITLE);
        assert_eq!(snoozed.body, original.body);
        assert_eq!(snoozed.doses, original.doses);
        assert_eq!(snoozed.fire_at, date(2025, 1, 1).and_time(t(8, 41)));
    }

    #[test]
    fn test_parse_reminder_body() {
        assert_eq!(parse_reminder_body("Time to take: A, B C"), vec!["A", "B C"]);
        assert_eq!(parse_reminder_body("time to take: Aspirin"), vec!["Aspirin"]);
        assert_eq!(parse_reminder_body("Reminder: Medicine Time Aspirin"), vec!["Aspirin"]);
        assert!(parse_reminder_body("").is_empty());
    }

    #[test]
    fn test_action_parse() {
        assert_eq!(NotificationAction::parse("MARK_AS_TAKEN"), Some(NotificationAction::MarkTaken));
        assert_eq!(NotificationAction::parse("remind later"), Some(NotificationAction::RemindLater));
        assert_eq!(NotificationAction::parse("dismiss"), None);
    }
}
