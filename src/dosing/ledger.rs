//! Dose status ledger mutation

use chrono::NaiveDate;
use serde::Serialize;
use uuid::Uuid;

use super::inventory::{apply_taken_transition, LowStockAlert};
use crate::models::{DoseStatus, MedicineCourse};

/// What a single status write did
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusChange {
    pub course_id: Uuid,
    pub medicine_id: Uuid,
    pub medicine_name: String,
    pub date: NaiveDate,
    pub previous: Option<DoseStatus>,
    /// `None` when the entry was cleared
    pub current: Option<DoseStatus>,
    pub remaining_stock: Option<u32>,
    pub low_stock: Option<LowStockAlert>,
}

/// Record `status` for one medicine on one date.
///
/// Returns `None`, changing nothing, when either id is unknown. The caller
/// is responsible for persisting the collection and dispatching the alert.
pub fn apply_status(
    courses: &mut [MedicineCourse],
    course_id: Uuid,
    medicine_id: Uuid,
    date: NaiveDate,
    status: DoseStatus,
) -> Option<StatusChange> {
    let Some(course) = courses.iter_mut().find(|c| c.id == course_id) else {
        tracing::debug!(%course_id, "status update for unknown course ignored");
        return None;
    };
    let course_name = course.name.clone();
    let Some(medicine) = course.medicine_mut(medicine_id) else {
        tracing::debug!(%course_id, %medicine_id, "status update for unknown medicine ignored");
        return None;
    };

    let previous = medicine.record_status(date, status);
    let low_stock = apply_taken_transition(&course_name, medicine, previous, status);

    Some(StatusChange {
        course_id,
        medicine_id,
        medicine_name: medicine.name.clone(),
        date,
        previous,
        current: medicine.status_on(date),
        remaining_stock: medicine.inventory.as_ref().map(|i| i.current_count),
        low_stock,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        CourseCreate, Frequency, MedicineCreate, MedicineInventory, Timing, UnitType, WhenToTake,
    };

    fn courses() -> Vec<MedicineCourse> {
        vec![MedicineCourse::new(CourseCreate {
            name: "Antibiotics".to_string(),
            duration: 5,
            start_date: NaiveDate::from_ymd_opt(2025, 1, 1),
            medicines: vec![MedicineCreate {
                name: "Amoxicillin".to_string(),
                frequency: Frequency::ThriceDaily,
                timing: Timing::Morning,
                when_to_take: WhenToTake::AfterMeals,
                custom_time: None,
                x_minutes: None,
                x_hours: None,
                inventory: Some(MedicineInventory {
                    tracking_enabled: true,
                    unit_type: UnitType::Tablets,
                    current_count: 10,
                    full_pack_count: 10,
                    low_stock_threshold: 2,
                    notify_when_low: true,
                    last_refill_date: None,
                }),
            }],
        })
        .unwrap()]
    }

    #[test]
    fn test_unknown_ids_are_a_no_op() {
        let mut all = courses();
        let before = all.clone();
        let day = NaiveDate::from_ymd_opt(2025, 1, 2).unwrap();
        let med_id = all[0].medicines[0].id;

        assert!(apply_status(&mut all, Uuid::new_v4(), med_id, day, DoseStatus::Taken).is_none());
        assert!(apply_status(&mut all, before[0].id, Uuid::new_v4(), day, DoseStatus::Taken).is_none());
        assert_eq!(all, before);
    }

    #[test]
    fn test_transition_triggered_decrement() {
        let mut all = courses();
        let (cid, mid) = (all[0].id, all[0].medicines[0].id);
        let day = NaiveDate::from_ymd_opt(2025, 1, 2).unwrap();

        let first = apply_status(&mut all, cid, mid, day, DoseStatus::Taken).unwrap();
        assert_eq!(first.previous, None);
        assert_eq!(first.remaining_stock, Some(9));

        let second = apply_status(&mut all, cid, mid, day, DoseStatus::Taken).unwrap();
        assert_eq!(second.previous, Some(DoseStatus::Taken));
        assert_eq!(second.remaining_stock, Some(9));

        apply_status(&mut all, cid, mid, day, DoseStatus::Missed).unwrap();
        let third = apply_status(&mut all, cid, mid, day, DoseStatus::Taken).unwrap();
        assert_eq!(third.remaining_stock, Some(8));
    }

    #[test]
    fn test_pending_clears_entry() {
        let mut all = courses();
        let (cid, mid) = (all[0].id, all[0].medicines[0].id);
        let day = NaiveDate::from_ymd_opt(2025, 1, 2).unwrap();

        apply_status(&mut all, cid, mid, day, DoseStatus::Missed).unwrap();
        let change = apply_status(&mut all, cid, mid, day, DoseStatus::Pending).unwrap();
        assert_eq!(change.previous, Some(DoseStatus::Missed));
        assert_eq!(change.current, None);
        assert_eq!(all[0].medicines[0].status_on(day), None);
    }
}
