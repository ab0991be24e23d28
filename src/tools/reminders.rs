//! Reminder MCP Tools
//!
//! Planning reminders into the alert outbox, draining the outbox, and
//! applying what the user did with a delivered reminder.

use chrono::NaiveTime;
use rmcp::schemars;
use serde::{Deserialize, Serialize};

use super::{book_error, datetime_or_now, parse_enum, parse_id};
use crate::book::{CourseBook, ReminderPlan, ResponseOutcome};
use crate::dosing::{DoseRef, NotificationAction, NotificationResponse};
use crate::notify::{AlertOutbox, OutgoingAlert};

/// One medicine carried by a reminder
#[derive(Debug, Clone, Deserialize, schemars::JsonSchema)]
pub struct DoseRefInput {
    pub course_id: String,
    pub medicine_id: String,
    #[serde(default)]
    pub name: String,
}

impl DoseRefInput {
    fn into_dose_ref(self) -> Result<DoseRef, String> {
        Ok(DoseRef {
            course_id: parse_id("course_id", &self.course_id)?,
            medicine_id: parse_id("medicine_id", &self.medicine_id)?,
            name: self.name,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct PlanResponse {
    #[serde(flatten)]
    pub plan: ReminderPlan,
    pub reminder_count: usize,
    pub horizon_days: u32,
}

#[derive(Debug, Serialize)]
pub struct PendingAlertsResponse {
    pub alerts: Vec<OutgoingAlert>,
    pub count: usize,
}

// ============================================================================
// Tool Functions
// ============================================================================

/// Queue reminders for the next `horizon_days` days plus the recurring
/// inventory reminders
pub fn plan_reminders(
    book: &CourseBook,
    now: Option<&str>,
    horizon_days: u32,
    refill_at: NaiveTime,
) -> Result<PlanResponse, String> {
    let now = datetime_or_now(now)?;
    let plan = book
        .schedule_reminders(now, horizon_days, refill_at)
        .map_err(book_error)?;
    Ok(PlanResponse {
        reminder_count: plan.reminders.len(),
        horizon_days,
        plan,
    })
}

/// Apply MARK_AS_TAKEN or REMIND_LATER for a delivered reminder
pub fn respond_to_reminder(
    book: &CourseBook,
    action: &str,
    doses: Vec<DoseRefInput>,
    body: Option<String>,
    now: Option<&str>,
) -> Result<ResponseOutcome, String> {
    let response = NotificationResponse {
        action: parse_enum("action", action, NotificationAction::parse)?,
        doses: doses
            .into_iter()
            .map(DoseRefInput::into_dose_ref)
            .collect::<Result<Vec<_>, _>>()?,
        body: body.unwrap_or_default(),
    };
    if response.doses.is_empty() && response.body.trim().is_empty() {
        return Err("A reminder response needs either doses or the reminder body".to_string());
    }

    let now = datetime_or_now(now)?;
    book.handle_response(&response, now).map_err(book_error)
}

/// Drain everything the book has queued for delivery
pub fn take_pending_alerts(outbox: &AlertOutbox) -> PendingAlertsResponse {
    let alerts = outbox.take_pending();
    PendingAlertsResponse {
        count: alerts.len(),
        alerts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use chrono::NaiveDate;

    use crate::db::Database;
    use crate::models::{
        CourseCreate, DoseStatus, Frequency, MedicineCourse, MedicineCreate, Timing, UserProfile,
        WhenToTake,
    };

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn setup() -> (CourseBook, Arc<AlertOutbox>, MedicineCourse) {
        let db = Database::in_memory().unwrap();
        db.migrate().unwrap();
        let outbox = Arc::new(AlertOutbox::new());
        let book = CourseBook::new(Arc::new(db), outbox.clone());
        book.save_profile(&UserProfile {
            name: "Sam".to_string(),
            age: 33,
            gender: "m".to_string(),
            medical_conditions: vec![],
            breakfast_time: t(8, 0),
            lunch_time: t(13, 0),
            dinner_time: t(20, 0),
            bedtime: t(23, 0),
        })
        .unwrap();
        let course = book
            .create_course(CourseCreate {
                name: "Vitamins".to_string(),
                duration: 3,
                start_date: NaiveDate::from_ymd_opt(2025, 3, 1),
                medicines: vec![MedicineCreate {
                    name: "Vitamin D".to_string(),
                    frequency: Frequency::OnceDaily,
                    timing: Timing::Morning,
                    when_to_take: WhenToTake::AfterMeals,
                    custom_time: None,
                    x_minutes: None,
                    x_hours: None,
                    inventory: None,
                }],
            })
            .unwrap();
        (book, outbox, course)
    }

    #[test]
    fn test_plan_then_drain() {
        let (book, outbox, _) = setup();
        let plan = plan_reminders(&book, Some("2025-03-01T06:00"), 7, t(9, 0)).unwrap();
        assert_eq!(plan.reminder_count, 3);
        assert_eq!(plan.plan.reminders[0].id, "notification_2025-03-01_08:30");
        // weekly check only, nothing is low
        assert_eq!(plan.plan.recurring.len(), 1);

        let drained = take_pending_alerts(&outbox);
        assert_eq!(drained.count, 4);
        assert_eq!(take_pending_alerts(&outbox).count, 0);
    }

    #[test]
    fn test_mark_taken_by_id() {
        let (book, _, course) = setup();
        let dose = DoseRefInput {
            course_id: course.id.to_string(),
            medicine_id: course.medicines[0].id.to_string(),
            name: "Vitamin D".to_string(),
        };
        let outcome =
            respond_to_reminder(&book, "MARK_AS_TAKEN", vec![dose], None, Some("2025-03-02T08:31")).unwrap();
        assert!(matches!(outcome, ResponseOutcome::Marked { ref changes } if changes.len() == 1));

        let loaded = book.course(course.id).unwrap().unwrap();
        assert_eq!(
            loaded.medicines[0].status_on(NaiveDate::from_ymd_opt(2025, 3, 2).unwrap()),
            Some(DoseStatus::Taken)
        );
    }

    #[test]
    fn test_snooze_by_body() {
        let (book, outbox, _) = setup();
        let outcome = respond_to_reminder(
            &book,
            "remind later",
            vec![],
            Some("Time to take: Vitamin D".to_string()),
            Some("2025-03-02T08:30"),
        )
        .unwrap();
        let ResponseOutcome::Snoozed { reminder } = outcome else {
            panic!("expected a snooze");
        };
        assert!(reminder.id.starts_with("snooze_"));
        assert_eq!(outbox.pending_count(), 1);
    }

    #[test]
    fn test_empty_response_rejected() {
        let (book, _, _) = setup();
        assert!(respond_to_reminder(&book, "MARK_AS_TAKEN", vec![], None, None).is_err());
        assert!(respond_to_reminder(&book, "ignore", vec![], Some("x".to_string()), None).is_err());
    }
}
