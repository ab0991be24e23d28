//! Inventory MCP Tools
//!
//! Stock tracking for individual medicines: setting up a pack, refilling it
//! and listing what is running low.

use rmcp::schemars;
use serde::{Deserialize, Serialize};

use super::{book_error, date_or_today, parse_enum, parse_id, parse_optional_date};
use crate::book::CourseBook;
use crate::dosing::{date_key, LowStockAlert};
use crate::models::{MedicineInventory, UnitType};

/// Pack details as supplied by the caller
#[derive(Debug, Clone, Deserialize, schemars::JsonSchema)]
pub struct InventoryInput {
    #[serde(default = "default_true")]
    pub tracking_enabled: bool,
    /// pills, tablets, capsules, ml, doses, sachets, patches or inhalers
    #[serde(default = "default_unit")]
    pub unit_type: String,
    pub current_count: u32,
    pub full_pack_count: u32,
    #[serde(default = "default_threshold")]
    pub low_stock_threshold: u32,
    #[serde(default = "default_true")]
    pub notify_when_low: bool,
    /// YYYY-MM-DD
    pub last_refill_date: Option<String>,
}

fn default_true() -> bool {
    true
}

fn default_unit() -> String {
    "pills".to_string()
}

fn default_threshold() -> u32 {
    5
}

impl InventoryInput {
    pub fn into_inventory(self) -> Result<MedicineInventory, String> {
        Ok(MedicineInventory {
            tracking_enabled: self.tracking_enabled,
            unit_type: parse_enum("unit_type", &self.unit_type, UnitType::parse)?,
            current_count: self.current_count,
            full_pack_count: self.full_pack_count,
            low_stock_threshold: self.low_stock_threshold,
            notify_when_low: self.notify_when_low,
            last_refill_date: parse_optional_date(self.last_refill_date.as_deref())?,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct InventoryDetail {
    pub tracking_enabled: bool,
    pub unit_type: String,
    pub unit_label: String,
    pub current_count: u32,
    pub full_pack_count: u32,
    pub low_stock_threshold: u32,
    pub notify_when_low: bool,
    pub last_refill_date: Option<String>,
    pub is_low_stock: bool,
    pub percentage_remaining: f64,
}

impl From<&MedicineInventory> for InventoryDetail {
    fn from(inv: &MedicineInventory) -> Self {
        Self {
            tracking_enabled: inv.tracking_enabled,
            unit_type: inv.unit_type.as_str().to_string(),
            unit_label: inv.unit_type.label().to_string(),
            current_count: inv.current_count,
            full_pack_count: inv.full_pack_count,
            low_stock_threshold: inv.low_stock_threshold,
            notify_when_low: inv.notify_when_low,
            last_refill_date: inv.last_refill_date.map(date_key),
            is_low_stock: inv.is_low_stock(),
            percentage_remaining: (inv.percentage_remaining() * 1000.0).round() / 10.0,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct InventoryResponse {
    pub medicine_id: String,
    pub medicine_name: String,
    pub inventory: Option<InventoryDetail>,
}

#[derive(Debug, Serialize)]
pub struct LowStockEntry {
    pub course_id: String,
    pub course_name: String,
    pub medicine_id: String,
    pub medicine_name: String,
    pub remaining: u32,
    pub unit_label: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct LowStockResponse {
    pub medicines: Vec<LowStockEntry>,
    pub count: usize,
}

// ============================================================================
// Tool Functions
// ============================================================================

/// Replace a medicine's inventory, or stop tracking it with `None`
pub fn set_inventory(
    book: &CourseBook,
    course_id: &str,
    medicine_id: &str,
    input: Option<InventoryInput>,
) -> Result<Option<InventoryResponse>, String> {
    let cid = parse_id("course_id", course_id)?;
    let mid = parse_id("medicine_id", medicine_id)?;
    let inventory = input.map(InventoryInput::into_inventory).transpose()?;

    let updated = book.set_inventory(cid, mid, inventory).map_err(book_error)?;
    Ok(updated.map(|med| InventoryResponse {
        medicine_id: med.id.to_string(),
        medicine_name: med.name,
        inventory: med.inventory.as_ref().map(InventoryDetail::from),
    }))
}

/// Restock to `count`, or to a full pack
pub fn refill_medicine(
    book: &CourseBook,
    course_id: &str,
    medicine_id: &str,
    count: Option<u32>,
    date: Option<&str>,
) -> Result<InventoryDetail, String> {
    let cid = parse_id("course_id", course_id)?;
    let mid = parse_id("medicine_id", medicine_id)?;
    let on = date_or_today(date)?;

    book.refill(cid, mid, count, on)
        .map_err(book_error)?
        .map(|inv| InventoryDetail::from(&inv))
        .ok_or_else(|| format!("Medicine {} has no inventory to refill", medicine_id))
}

/// Every tracked medicine at or under its threshold with alerts switched on
pub fn list_low_stock(book: &CourseBook) -> Result<LowStockResponse, String> {
    let courses = book.courses().map_err(book_error)?;

    let medicines: Vec<LowStockEntry> = courses
        .iter()
        .flat_map(|course| {
            course.medicines.iter().filter_map(move |med| {
                LowStockAlert::for_medicine(&course.name, med).map(|alert| LowStockEntry {
                    course_id: course.id.to_string(),
                    course_name: course.name.clone(),
                    medicine_id: med.id.to_string(),
                    medicine_name: med.name.clone(),
                    remaining: alert.remaining,
                    message: alert.body(),
                    unit_label: alert.unit_label,
                })
            })
        })
        .collect();

    Ok(LowStockResponse {
        count: medicines.len(),
        medicines,
    })
}
