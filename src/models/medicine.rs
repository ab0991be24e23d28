//! Medicine model
//!
//! A medicine inside a course: its dosing schedule, the per-date status
//! ledger and optional inventory.

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveTime};
use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Frequency, MedicineInventory, Timing, ValidationError, WhenToTake};
use crate::db::{DbError, DbResult};
use crate::dosing::{date_key, format_hhmm, parse_hhmm};

/// Valid range for meal offsets in minutes
pub const X_MINUTES_RANGE: std::ops::RangeInclusive<u32> = 1..=120;

/// Valid range for interval dosing in hours
pub const X_HOURS_RANGE: std::ops::RangeInclusive<u32> = 1..=24;

/// Status of one medicine on one date.
///
/// Only `Taken` and `Missed` are ever recorded; `Pending` is what an
/// unrecorded today-or-future date reads as, and recording it clears the
/// entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DoseStatus {
    Taken,
    Missed,
    Pending,
}

impl DoseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DoseStatus::Taken => "taken",
            DoseStatus::Missed => "missed",
            DoseStatus::Pending => "pending",
        }
    }

    /// Case-insensitive parse
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "taken" => Some(DoseStatus::Taken),
            "missed" => Some(DoseStatus::Missed),
            "pending" => Some(DoseStatus::Pending),
            _ => None,
        }
    }

    pub fn is_taken(&self) -> bool {
        matches!(self, DoseStatus::Taken)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Medicine {
    pub id: Uuid,
    pub name: String,
    pub frequency: Frequency,
    pub timing: Timing,
    pub when_to_take: WhenToTake,
    pub custom_time: Option<NaiveTime>,
    pub x_minutes: Option<u32>,
    pub x_hours: Option<u32>,
    #[serde(default)]
    pub status_by_date: BTreeMap<NaiveDate, DoseStatus>,
    pub inventory: Option<MedicineInventory>,
}

/// Data for creating a medicine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MedicineCreate {
    pub name: String,
    pub frequency: Frequency,
    pub timing: Timing,
    pub when_to_take: WhenToTake,
    pub custom_time: Option<NaiveTime>,
    pub x_minutes: Option<u32>,
    pub x_hours: Option<u32>,
    pub inventory: Option<MedicineInventory>,
}

/// Data for editing a medicine's schedule. The ledger and inventory are
/// left alone.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MedicineUpdate {
    pub name: Option<String>,
    pub frequency: Option<Frequency>,
    pub timing: Option<Timing>,
    pub when_to_take: Option<WhenToTake>,
    pub custom_time: Option<NaiveTime>,
    pub x_minutes: Option<u32>,
    pub x_hours: Option<u32>,
}

impl Medicine {
    /// Build a new medicine with a fresh id and an empty ledger
    pub fn new(data: MedicineCreate) -> Result<Self, ValidationError> {
        let mut med = Self {
            id: Uuid::new_v4(),
            name: data.name.trim().to_string(),
            frequency: data.frequency,
            timing: data.timing,
            when_to_take: data.when_to_take,
            custom_time: data.custom_time,
            x_minutes: data.x_minutes,
            x_hours: data.x_hours,
            status_by_date: BTreeMap::new(),
            inventory: data.inventory,
        };
        med.validate()?;
        Ok(med)
    }

    /// Apply an edit, keeping the previous state if the result is invalid
    pub fn apply_update(&mut self, data: MedicineUpdate) -> Result<(), ValidationError> {
        let mut next = self.clone();
        if let Some(name) = data.name {
            next.name = name.trim().to_string();
        }
        if let Some(frequency) = data.frequency {
            next.frequency = frequency;
        }
        if let Some(timing) = data.timing {
            next.timing = timing;
        }
        if let Some(when) = data.when_to_take {
            next.when_to_take = when;
        }
        if data.custom_time.is_some() {
            next.custom_time = data.custom_time;
        }
        if data.x_minutes.is_some() {
            next.x_minutes = data.x_minutes;
        }
        if data.x_hours.is_some() {
            next.x_hours = data.x_hours;
        }
        next.validate()?;
        *self = next;
        Ok(())
    }

    /// Check required-iff fields and drop the ones that do not apply
    fn validate(&mut self) -> Result<(), ValidationError> {
        if self.name.is_empty() {
            return Err(ValidationError::EmptyMedicineName);
        }

        if self.frequency == Frequency::OnceDaily && self.timing == Timing::SpecificTime {
            if self.custom_time.is_none() {
                return Err(ValidationError::MissingCustomTime);
            }
        } else {
            self.custom_time = None;
        }

        if self.when_to_take.needs_minutes() {
            match self.x_minutes {
                Some(m) if X_MINUTES_RANGE.contains(&m) => {}
                other => return Err(ValidationError::InvalidXMinutes(other)),
            }
        } else {
            self.x_minutes = None;
        }

        if self.frequency == Frequency::EveryXHours {
            match self.x_hours {
                Some(h) if X_HOURS_RANGE.contains(&h) => {}
                other => return Err(ValidationError::InvalidXHours(other)),
            }
        } else {
            self.x_hours = None;
        }

        Ok(())
    }

    /// Recorded status for `date`; `None` means nothing was recorded
    pub fn status_on(&self, date: NaiveDate) -> Option<DoseStatus> {
        self.status_by_date.get(&date).copied()
    }

    /// Overwrite the status for `date`, returning what was there before.
    /// `Pending` clears the entry.
    pub fn record_status(&mut self, date: NaiveDate, status: DoseStatus) -> Option<DoseStatus> {
        match status {
            DoseStatus::Pending => self.status_by_date.remove(&date),
            recorded => self.status_by_date.insert(date, recorded),
        }
    }

    pub(crate) fn from_row(row: &Row) -> DbResult<(String, Self)> {
        let id_raw: String = row.get("id")?;
        let id = Uuid::parse_str(&id_raw)
            .map_err(|_| DbError::Decode(format!("invalid medicine id '{}'", id_raw)))?;
        let course_id: String = row.get("course_id")?;

        let frequency_raw: String = row.get("frequency")?;
        let timing_raw: String = row.get("timing")?;
        let when_raw: String = row.get("when_to_take")?;
        let custom_raw: Option<String> = row.get("custom_time")?;

        let frequency = Frequency::parse(&frequency_raw)
            .ok_or_else(|| DbError::Decode(format!("unknown frequency '{}'", frequency_raw)))?;
        let timing = Timing::parse(&timing_raw)
            .ok_or_else(|| DbError::Decode(format!("unknown timing '{}'", timing_raw)))?;
        let when_to_take = WhenToTake::parse(&when_raw)
            .ok_or_else(|| DbError::Decode(format!("unknown when_to_take '{}'", when_raw)))?;
        let custom_time = match custom_raw {
            Some(raw) => Some(
                parse_hhmm(&raw)
                    .ok_or_else(|| DbError::Decode(format!("invalid custom time '{}'", raw)))?,
            ),
            None => None,
        };

        Ok((
            course_id,
            Self {
                id,
                name: row.get("name")?,
                frequency,
                timing,
                when_to_take,
                custom_time,
                x_minutes: row.get("x_minutes")?,
                x_hours: row.get("x_hours")?,
                status_by_date: BTreeMap::new(),
                inventory: None,
            },
        ))
    }

    pub(crate) fn insert(&self, conn: &Connection, course_id: &str, position: usize) -> DbResult<()> {
        let id = self.id.to_string();
        conn.execute(
            r#"
            INSERT INTO medicines (
                id, course_id, position, name, frequency, timing,
                when_to_take, custom_time, x_minutes, x_hours
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            params![
                id,
                course_id,
                position as i64,
                self.name,
                self.frequency.as_str(),
                self.timing.as_str(),
                self.when_to_take.as_str(),
                self.custom_time.map(format_hhmm),
                self.x_minutes,
                self.x_hours,
            ],
        )?;

        if let Some(ref inventory) = self.inventory {
            inventory.insert(conn, &id)?;
        }

        let mut stmt = conn.prepare_cached(
            "INSERT INTO dose_status (medicine_id, date, status) VALUES (?1, ?2, ?3)",
        )?;
        for (date, status) in &self.status_by_date {
            stmt.execute(params![id, date_key(*date), status.as_str()])?;
        }

        Ok(())
    }
}
