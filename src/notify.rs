//! Alert dispatch
//!
//! The engine decides what should fire and when; something else delivers
//! it. `AlertOutbox` queues requests in-process until a client drains them.

use std::sync::Mutex;

use serde::Serialize;
use thiserror::Error;

use crate::dosing::{LowStockAlert, RecurringReminder, Reminder};

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Notifier unavailable: {0}")]
    Unavailable(String),
}

pub trait Notifier: Send + Sync {
    fn schedule_reminder(&self, reminder: &Reminder) -> Result<(), NotifyError>;

    fn schedule_recurring(&self, reminder: &RecurringReminder) -> Result<(), NotifyError>;

    fn schedule_low_stock_alert(&self, alert: &LowStockAlert) -> Result<(), NotifyError>;
}

/// A queued alert request
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OutgoingAlert {
    Reminder(Reminder),
    Recurring(RecurringReminder),
    LowStock {
        title: String,
        body: String,
        #[serde(flatten)]
        alert: LowStockAlert,
    },
}

#[derive(Default)]
pub struct AlertOutbox {
    pending: Mutex<Vec<OutgoingAlert>>,
}

impl AlertOutbox {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, alert: OutgoingAlert) -> Result<(), NotifyError> {
        let mut pending = self
            .pending
            .lock()
            .map_err(|e| NotifyError::Unavailable(e.to_string()))?;
        pending.push(alert);
        Ok(())
    }

    /// Drain everything queued so far, oldest first
    pub fn take_pending(&self) -> Vec<OutgoingAlert> {
        match self.pending.lock() {
            Ok(mut pending) => std::mem::take(&mut *pending),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }

    pub fn pending_count(&self) -> usize {
        match self.pending.lock() {
            Ok(pending) => pending.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }
}

impl Notifier for AlertOutbox {
    fn schedule_reminder(&self, reminder: &Reminder) -> Result<(), NotifyError> {
        tracing::info!(id = %reminder.id, fire_at = %reminder.fire_at, body = %reminder.body, "reminder queued");
        self.push(OutgoingAlert::Reminder(reminder.clone()))
    }

    fn schedule_recurring(&self, reminder: &RecurringReminder) -> Result<(), NotifyError> {
        tracing::info!(id = %reminder.id, "recurring reminder queued");
        self.push(OutgoingAlert::Recurring(reminder.clone()))
    }

    fn schedule_low_stock_alert(&self, alert: &LowStockAlert) -> Result<(), NotifyError> {
        tracing::info!(
            medicine = %alert.medicine_name,
            remaining = alert.remaining,
            "low stock alert queued"
        );
        self.push(OutgoingAlert::LowStock {
            title: alert.title().to_string(),
            body: alert.body(),
            alert: alert.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn alert() -> LowStockAlert {
        LowStockAlert {
            medicine_id: Uuid::new_v4(),
            medicine_name: "Amoxicillin".to_string(),
            course_name: "Antibiotics".to_string(),
            remaining: 3,
            unit_label: "Capsules".to_string(),
        }
    }

    #[test]
    fn test_take_pending_drains_in_order() {
        let outbox = AlertOutbox::new();
        outbox.schedule_low_stock_alert(&alert()).unwrap();
        outbox.schedule_recurring(&crate::dosing::weekly_inventory_check()).unwrap();
        assert_eq!(outbox.pending_count(), 2);

        let drained = outbox.take_pending();
        assert!(matches!(drained[0], OutgoingAlert::LowStock { .. }));
        assert!(matches!(drained[1], OutgoingAlert::Recurring(_)));
        assert_eq!(outbox.pending_count(), 0);
    }

    #[test]
    fn test_low_stock_serializes_flat() {
        let value = serde_json::to_value(OutgoingAlert::LowStock {
            title: "t".to_string(),
            body: "b".to_string(),
            alert: alert(),
        })
        .unwrap();
        assert_eq!(value["kind"], "low_stock");
        assert_eq!(value["remaining"], 3);
        assert_eq!(value["medicine_name"], "Amoxicillin");
    }
}
