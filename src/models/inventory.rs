//! Medicine inventory model
//!
//! Consumable stock for one medicine: how much is left, what counts as low,
//! and whether the user wants to hear about it.

use chrono::NaiveDate;
use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::db::{DbError, DbResult};
use crate::dosing::{date_key, parse_date_key};

/// Display unit for inventory counts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitType {
    Pills,
    Tablets,
    Capsules,
    Milliliters,
    Doses,
    Sachets,
    Patches,
    Inhalers,
}

impl UnitType {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnitType::Pills => "pills",
            UnitType::Tablets => "tablets",
            UnitType::Capsules => "capsules",
            UnitType::Milliliters => "milliliters",
            UnitType::Doses => "doses",
            UnitType::Sachets => "sachets",
            UnitType::Patches => "patches",
            UnitType::Inhalers => "inhalers",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "pills" | "pill" => Some(UnitType::Pills),
            "tablets" | "tablet" | "tab" => Some(UnitType::Tablets),
            "capsules" | "capsule" | "cap" => Some(UnitType::Capsules),
            "milliliters" | "ml" | "milliliter" => Some(UnitType::Milliliters),
            "doses" | "dose" => Some(UnitType::Doses),
            "sachets" | "sachet" => Some(UnitType::Sachets),
            "patches" | "patch" => Some(UnitType::Patches),
            "inhalers" | "inhaler" => Some(UnitType::Inhalers),
            _ => None,
        }
    }

    /// Label used in alert text ("You only have 5 Tablets of ...")
    pub fn label(&self) -> &'static str {
        match self {
            UnitType::Pills => "Pills",
            UnitType::Tablets => "Tablets",
            UnitType::Capsules => "Capsules",
            UnitType::Milliliters => "ml",
            UnitType::Doses => "Doses",
            UnitType::Sachets => "Sachets",
            UnitType::Patches => "Patches",
            UnitType::Inhalers => "Inhalers",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedicineInventory {
    pub tracking_enabled: bool,
    pub unit_type: UnitType,
    pub current_count: u32,
    pub full_pack_count: u32,
    pub low_stock_threshold: u32,
    pub notify_when_low: bool,
    pub last_refill_date: Option<NaiveDate>,
}

impl MedicineInventory {
    pub fn is_low_stock(&self) -> bool {
        self.current_count <= self.low_stock_threshold
    }

    /// Fraction of a full pack left, capped at 1.0
    pub fn percentage_remaining(&self) -> f64 {
        if self.full_pack_count == 0 {
            return 0.0;
        }
        (self.current_count as f64 / self.full_pack_count as f64).min(1.0)
    }

    /// Take one unit out of stock. Returns false when tracking is off or the
    /// count is already zero.
    pub fn decrement(&mut self) -> bool {
        if !self.tracking_enabled || self.current_count == 0 {
            return false;
        }
        self.current_count -= 1;
        true
    }

    /// Restock to `count` (a full pack when `None`)
    pub fn refill(&mut self, count: Option<u32>, on: NaiveDate) {
        self.current_count = count.unwrap_or(self.full_pack_count);
        self.last_refill_date = Some(on);
    }

    /// Whether a low-stock alert should go out for the current state
    pub fn should_alert(&self) -> bool {
        self.tracking_enabled && self.notify_when_low && self.is_low_stock()
    }

    pub(crate) fn from_row(row: &Row) -> DbResult<(String, Self)> {
        let medicine_id: String = row.get("medicine_id")?;
        let unit_raw: String = row.get("unit_type")?;
        let unit_type = UnitType::parse(&unit_raw)
            .ok_or_else(|| DbError::Decode(format!("unknown inventory unit '{}'", unit_raw)))?;
        let last_refill_date = match row.get::<_, Option<String>>("last_refill_date")? {
            Some(raw) => Some(
                parse_date_key(&raw)
                    .ok_or_else(|| DbError::Decode(format!("invalid refill date '{}'", raw)))?,
            ),
            None => None,
        };

        Ok((
            medicine_id,
            Self {
                tracking_enabled: row.get::<_, i32>("tracking_enabled")? != 0,
                unit_type,
                current_count: row.get("current_count")?,
                full_pack_count: row.get("full_pack_count")?,
                low_stock_threshold: row.get("low_stock_threshold")?,
                notify_when_low: row.get::<_, i32>("notify_when_low")? != 0,
                last_refill_date,
            },
        ))
    }

    pub(crate) fn insert(&self, conn: &Connection, medicine_id: &str) -> DbResult<()> {
        conn.execute(
            r#"
            INSERT INTO medicine_inventory (
                medicine_id, tracking_enabled, unit_type, current_count,
                full_pack_count, low_stock_threshold, notify_when_low, last_refill_date
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                medicine_id,
                self.tracking_enabled as i32,
                self.unit_type.as_str(),
                self.current_count,
                self.full_pack_count,
                self.low_stock_threshold,
                self.notify_when_low as i32,
                self.last_refill_date.map(date_key),
            ],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inventory(current: u32, full: u32, threshold: u32) -> MedicineInventory {
        MedicineInventory {
            tracking_enabled: true,
            unit_type: UnitType::Tablets,
            current_count: current,
            full_pack_count: full,
            low_stock_threshold: threshold,
            notify_when_low: true,
            last_refill_date: None,
        }
    }

    #[test]
    fn test_low_stock_is_inclusive() {
        assert!(!inventory(6, 30, 5).is_low_stock());
        assert!(inventory(5, 30, 5).is_low_stock());
        assert!(inventory(0, 30, 5).is_low_stock());
    }

    #[test]
    fn test_percentage_remaining() {
        assert!((inventory(15, 30, 5).percentage_remaining() - 0.5).abs() < 1e-9);
        assert_eq!(inventory(45, 30, 5).percentage_remaining(), 1.0);
        assert_eq!(inventory(10, 0, 5).percentage_remaining(), 0.0);
    }

    #[test]
    fn test_decrement_floors_at_zero() {
        let mut inv = inventory(1, 30, 5);
        assert!(inv.decrement());
        assert_eq!(inv.current_count, 0);
        assert!(!inv.decrement());
        assert_eq!(inv.current_count, 0);
    }

    #[test]
    fn test_decrement_ignored_when_not_tracking() {
        let mut inv = inventory(10, 30, 5);
        inv.tracking_enabled = false;
        assert!(!inv.decrement());
        assert_eq!(inv.current_count, 10);
    }

    #[test]
    fn test_refill_defaults_to_full_pack() {
        let day = NaiveDate::from_ymd_opt(2025, 2, 1).unwrap();
        let mut inv = inventory(2, 30, 5);
        inv.refill(None, day);
        assert_eq!(inv.current_count, 30);
        assert_eq!(inv.last_refill_date, Some(day));

        inv.refill(Some(12), day);
        assert_eq!(inv.current_count, 12);
    }

    #[test]
    fn test_unit_labels() {
        assert_eq!(UnitType::parse("ml"), Some(UnitType::Milliliters));
        assert_eq!(UnitType::Milliliters.label(), "ml");
        assert_eq!(UnitType::parse("Capsules").map(|u| u.label()), Some("Capsules"));
    }
}
