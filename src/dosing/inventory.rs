//! Inventory decrement and low-stock alerting

use serde::Serialize;
use uuid::Uuid;

use crate::models::{DoseStatus, Medicine};

pub const LOW_STOCK_TITLE: &str = "Low Medicine Inventory";

/// Request to tell the user a medicine is running out
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LowStockAlert {
    pub medicine_id: Uuid,
    pub medicine_name: String,
    pub course_name: String,
    pub remaining: u32,
    pub unit_label: String,
}

impl LowStockAlert {
    /// Alert for `medicine` if its inventory is tracked, low and set to notify
    pub fn for_medicine(course_name: &str, medicine: &Medicine) -> Option<Self> {
        let inventory = medicine.inventory.as_ref()?;
        if !inventory.should_alert() {
            return None;
        }
        Some(Self {
            medicine_id: medicine.id,
            medicine_name: medicine.name.clone(),
            course_name: course_name.to_string(),
            remaining: inventory.current_count,
            unit_label: inventory.unit_type.label().to_string(),
        })
    }

    pub fn title(&self) -> &'static str {
        LOW_STOCK_TITLE
    }

    pub fn body(&self) -> String {
        format!(
            "You only have {} {} of {} left in your {} course.",
            self.remaining, self.unit_label, self.medicine_name, self.course_name
        )
    }
}

/// React to a status change on `medicine`.
///
/// Only a move into `Taken` from anything else consumes a unit, so
/// re-recording `Taken` is free. Nothing is consumed at zero and no alert is
/// raised in that case.
pub fn apply_taken_transition(
    course_name: &str,
    medicine: &mut Medicine,
    previous: Option<DoseStatus>,
    new: DoseStatus,
) -> Option<LowStockAlert> {
    if !new.is_taken() || previous.is_some_and(|p| p.is_taken()) {
        return None;
    }

    let inventory = medicine.inventory.as_mut()?;
    if !inventory.decrement() {
        return None;
    }
    tracing::debug!(
        medicine = %medicine.name,
        remaining = inventory.current_count,
        "inventory decremented"
    );

    LowStockAlert::for_medicine(course_name, medicine)
}
