//! Course book
//!
//! The single owner of the course collection. Every read-modify-write goes
//! through one lock so concurrent status changes and course edits cannot
//! lose each other's writes. Alerts are handed to the notifier after the
//! change is persisted; a failed dispatch is logged and never fails the
//! operation.

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::db::{CourseStore, DbError};
use crate::dosing::{
    apply_status, daily_refill_reminder, parse_reminder_body, plan_reminders, snooze,
    weekly_inventory_check, LowStockAlert, NotificationAction, NotificationResponse,
    RecurringReminder, Reminder, StatusChange,
};
use crate::dosing::reminders::DEFAULT_SNOOZE_MINUTES;
use crate::models::{
    CourseCreate, CourseUpdate, DoseStatus, Medicine, MedicineCourse, MedicineCreate,
    MedicineInventory, MedicineUpdate, UserProfile, ValidationError,
};
use crate::notify::Notifier;

#[derive(Debug, Error)]
pub enum BookError {
    #[error(transparent)]
    Store(#[from] DbError),

    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error("Course book lock poisoned")]
    Poisoned,
}

pub type BookResult<T> = Result<T, BookError>;

/// Result of applying a notification response
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ResponseOutcome {
    Marked { changes: Vec<StatusChange> },
    Snoozed { reminder: Reminder },
}

/// Everything queued by one planning pass
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReminderPlan {
    pub reminders: Vec<Reminder>,
    pub recurring: Vec<RecurringReminder>,
}

pub struct CourseBook {
    store: Arc<dyn CourseStore>,
    notifier: Arc<dyn Notifier>,
    snooze_minutes: u32,
    lock: Mutex<()>,
}

impl CourseBook {
    pub fn new(store: Arc<dyn CourseStore>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            store,
            notifier,
            snooze_minutes: DEFAULT_SNOOZE_MINUTES,
            lock: Mutex::new(()),
        }
    }

    pub fn with_snooze_minutes(mut self, minutes: u32) -> Self {
        self.snooze_minutes = minutes;
        self
    }

    fn guard(&self) -> BookResult<MutexGuard<'_, ()>> {
        self.lock.lock().map_err(|_| BookError::Poisoned)
    }

    /// Load, let `f` edit, and save when it reports a change
    fn edit<T>(
        &self,
        f: impl FnOnce(&mut Vec<MedicineCourse>) -> BookResult<Option<T>>,
    ) -> BookResult<Option<T>> {
        let _guard = self.guard()?;
        let mut courses = self.store.load_courses()?;
        let result = f(&mut courses)?;
        if result.is_some() {
            self.store.save_courses(&courses)?;
        }
        Ok(result)
    }

    fn dispatch_low_stock(&self, alert: &LowStockAlert) {
        if let Err(e) = self.notifier.schedule_low_stock_alert(alert) {
            tracing::warn!(error = %e, medicine = %alert.medicine_name, "low stock alert not delivered");
        }
    }

    pub fn courses(&self) -> BookResult<Vec<MedicineCourse>> {
        let _guard = self.guard()?;
        Ok(self.store.load_courses()?)
    }

    pub fn course(&self, id: Uuid) -> BookResult<Option<MedicineCourse>> {
        Ok(self.courses()?.into_iter().find(|c| c.id == id))
    }

    pub fn profile(&self) -> BookResult<Option<UserProfile>> {
        let _guard = self.guard()?;
        Ok(self.store.load_user_profile()?)
    }

    pub fn save_profile(&self, profile: &UserProfile) -> BookResult<()> {
        let _guard = self.guard()?;
        self.store.save_user_profile(profile)?;
        tracing::info!(name = %profile.name, "profile saved");
        Ok(())
    }

    pub fn create_course(&self, data: CourseCreate) -> BookResult<MedicineCourse> {
        let course = MedicineCourse::new(data)?;
        let _guard = self.guard()?;
        let mut courses = self.store.load_courses()?;
        courses.push(course.clone());
        self.store.save_courses(&courses)?;
        tracing::info!(course = %course.name, id = %course.id, "course created");
        Ok(course)
    }

    pub fn update_course(&self, id: Uuid, data: CourseUpdate) -> BookResult<Option<MedicineCourse>> {
        self.edit(|courses| {
            let Some(course) = courses.iter_mut().find(|c| c.id == id) else {
                return Ok(None);
            };
            course.apply_update(data)?;
            Ok(Some(course.clone()))
        })
    }

    pub fn delete_course(&self, id: Uuid) -> BookResult<bool> {
        let removed = self.edit(|courses| {
            let before = courses.len();
            courses.retain(|c| c.id != id);
            Ok((courses.len() != before).then_some(()))
        })?;
        if removed.is_some() {
            tracing::info!(%id, "course deleted");
        }
        Ok(removed.is_some())
    }

    pub fn add_medicine(&self, course_id: Uuid, data: MedicineCreate) -> BookResult<Option<Medicine>> {
        let medicine = Medicine::new(data)?;
        self.edit(|courses| {
            let Some(course) = courses.iter_mut().find(|c| c.id == course_id) else {
                return Ok(None);
            };
            course.medicines.push(medicine.clone());
            Ok(Some(medicine))
        })
    }

    pub fn update_medicine(
        &self,
        course_id: Uuid,
        medicine_id: Uuid,
        data: MedicineUpdate,
    ) -> BookResult<Option<Medicine>> {
        self.edit(|courses| {
            let Some(med) = find_medicine(courses, course_id, medicine_id) else {
                return Ok(None);
            };
            med.apply_update(data)?;
            Ok(Some(med.clone()))
        })
    }

    /// Remove a medicine. The last medicine of a course cannot be removed;
    /// delete the course instead.
    pub fn remove_medicine(&self, course_id: Uuid, medicine_id: Uuid) -> BookResult<bool> {
        let removed = self.edit(|courses| {
            let Some(course) = courses.iter_mut().find(|c| c.id == course_id) else {
                return Ok(None);
            };
            if course.medicine(medicine_id).is_none() {
                return Ok(None);
            }
            if course.medicines.len() == 1 {
                return Err(ValidationError::NoMedicines.into());
            }
            course.medicines.retain(|m| m.id != medicine_id);
            Ok(Some(()))
        })?;
        Ok(removed.is_some())
    }

    /// Record a dose status. Unknown ids change nothing and return `None`.
    pub fn set_status(
        &self,
        course_id: Uuid,
        medicine_id: Uuid,
        date: NaiveDate,
        status: DoseStatus,
    ) -> BookResult<Option<StatusChange>> {
        let change = self.edit(|courses| {
            Ok(apply_status(courses, course_id, medicine_id, date, status))
        })?;

        if let Some(ref change) = change {
            tracing::info!(
                medicine = %change.medicine_name,
                date = %change.date,
                status = status.as_str(),
                "dose status recorded"
            );
            if let Some(ref alert) = change.low_stock {
                self.dispatch_low_stock(alert);
            }
        }
        Ok(change)
    }

    /// Replace (or remove, with `None`) a medicine's inventory
    pub fn set_inventory(
        &self,
        course_id: Uuid,
        medicine_id: Uuid,
        inventory: Option<MedicineInventory>,
    ) -> BookResult<Option<Medicine>> {
        let updated = self.edit(|courses| {
            let Some(course) = courses.iter_mut().find(|c| c.id == course_id) else {
                return Ok(None);
            };
            let course_name = course.name.clone();
            let Some(med) = course.medicine_mut(medicine_id) else {
                return Ok(None);
            };
            med.inventory = inventory;
            let alert = LowStockAlert::for_medicine(&course_name, med);
            Ok(Some((med.clone(), alert)))
        })?;

        Ok(updated.map(|(med, alert)| {
            if let Some(alert) = alert {
                self.dispatch_low_stock(&alert);
            }
            med
        }))
    }

    /// Restock a tracked medicine. `None` when the medicine is unknown or
    /// has no inventory.
    pub fn refill(
        &self,
        course_id: Uuid,
        medicine_id: Uuid,
        count: Option<u32>,
        on: NaiveDate,
    ) -> BookResult<Option<MedicineInventory>> {
        self.edit(|courses| {
            let Some(inventory) = find_medicine(courses, course_id, medicine_id)
                .and_then(|m| m.inventory.as_mut())
            else {
                return Ok(None);
            };
            inventory.refill(count, on);
            tracing::info!(%medicine_id, count = inventory.current_count, "inventory refilled");
            Ok(Some(inventory.clone()))
        })
    }

    /// Queue reminders for the coming days plus the recurring inventory
    /// nudges
    pub fn schedule_reminders(
        &self,
        now: NaiveDateTime,
        horizon_days: u32,
        refill_at: NaiveTime,
    ) -> BookResult<ReminderPlan> {
        let (courses, profile) = {
            let _guard = self.guard()?;
            (self.store.load_courses()?, self.store.load_user_profile()?)
        };

        let reminders = plan_reminders(&courses, profile.as_ref(), now, horizon_days);
        let mut recurring = vec![weekly_inventory_check()];
        recurring.extend(daily_refill_reminder(&courses, refill_at));

        for reminder in &reminders {
            if let Err(e) = self.notifier.schedule_reminder(reminder) {
                tracing::warn!(error = %e, id = %reminder.id, "reminder not delivered");
            }
        }
        for reminder in &recurring {
            if let Err(e) = self.notifier.schedule_recurring(reminder) {
                tracing::warn!(error = %e, id = %reminder.id, "recurring reminder not delivered");
            }
        }

        tracing::info!(count = reminders.len(), horizon_days, "reminders planned");
        Ok(ReminderPlan { reminders, recurring })
    }

    /// Apply what the user did with a reminder
    pub fn handle_response(
        &self,
        response: &NotificationResponse,
        now: NaiveDateTime,
    ) -> BookResult<ResponseOutcome> {
        match response.action {
            NotificationAction::MarkTaken => {
                let changes = self.mark_taken(response, now.date())?;
                Ok(ResponseOutcome::Marked { changes })
            }
            NotificationAction::RemindLater => {
                let reminder = snooze(&response.to_reminder(now), now, self.snooze_minutes);
                if let Err(e) = self.notifier.schedule_reminder(&reminder) {
                    tracing::warn!(error = %e, "snoozed reminder not delivered");
                }
                Ok(ResponseOutcome::Snoozed { reminder })
            }
        }
    }

    fn mark_taken(&self, response: &NotificationResponse, today: NaiveDate) -> BookResult<Vec<StatusChange>> {
        let changes = self.edit(|courses| {
            let targets = if response.doses.is_empty() {
                targets_by_name(courses, &response.body)
            } else {
                response
                    .doses
                    .iter()
                    .map(|d| (d.course_id, d.medicine_id))
                    .collect()
            };

            let changes: Vec<StatusChange> = targets
                .into_iter()
                .filter_map(|(course_id, medicine_id)| {
                    apply_status(courses, course_id, medicine_id, today, DoseStatus::Taken)
                })
                .collect();
            Ok((!changes.is_empty()).then_some(changes))
        })?;

        let changes = changes.unwrap_or_default();
        for change in &changes {
            tracing::info!(medicine = %change.medicine_name, date = %change.date, "marked taken from reminder");
            if let Some(ref alert) = change.low_stock {
                self.dispatch_low_stock(alert);
            }
        }
        Ok(changes)
    }
}

fn find_medicine(
    courses: &mut [MedicineCourse],
    course_id: Uuid,
    medicine_id: Uuid,
) -> Option<&mut Medicine> {
    courses
        .iter_mut()
        .find(|c| c.id == course_id)
        .and_then(|c| c.medicine_mut(medicine_id))
}

/// Fallback for responses without ids: every medicine whose name appears in
/// the reminder body
fn targets_by_name(courses: &[MedicineCourse], body: &str) -> Vec<(Uuid, Uuid)> {
    let mut targets = Vec::new();
    for name in parse_reminder_body(body) {
        let matches: Vec<(Uuid, Uuid)> = courses
            .iter()
            .flat_map(|c| c.medicines.iter().map(move |m| (c, m)))
            .filter(|(_, m)| m.name == name)
            .map(|(c, m)| (c.id, m.id))
            .collect();
        match matches.len() {
            0 => tracing::debug!(%name, "reminder names an unknown medicine"),
            1 => {}
            n => tracing::warn!(%name, matches = n, "ambiguous medicine name in reminder, marking all"),
        }
        targets.extend(matches);
    }
    targets
}
