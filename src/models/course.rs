//! Medicine course model
//!
//! A course is a fixed-length regimen of one or more medicines. The whole
//! collection of courses is loaded and saved as one unit.

use std::collections::HashMap;

use chrono::{Days, NaiveDate};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{DoseStatus, Medicine, MedicineCreate, MedicineInventory, ValidationError};
use crate::db::{DbError, DbResult};
use crate::dosing::{date_key, parse_date_key};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedicineCourse {
    pub id: Uuid,
    pub name: String,
    /// Length in days, at least 1
    pub duration: u32,
    /// `None` means the course is always active and never expires
    pub start_date: Option<NaiveDate>,
    pub medicines: Vec<Medicine>,
}

/// Data for creating a course
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseCreate {
    pub name: String,
    pub duration: u32,
    pub start_date: Option<NaiveDate>,
    pub medicines: Vec<MedicineCreate>,
}

/// Data for editing course metadata
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CourseUpdate {
    pub name: Option<String>,
    pub duration: Option<u32>,
    /// `Some(None)` clears the start date, making the course always active
    pub start_date: Option<Option<NaiveDate>>,
}

impl MedicineCourse {
    pub fn new(data: CourseCreate) -> Result<Self, ValidationError> {
        let name = data.name.trim().to_string();
        if name.is_empty() {
            return Err(ValidationError::EmptyCourseName);
        }
        if data.duration < 1 {
            return Err(ValidationError::InvalidDuration);
        }
        if data.medicines.is_empty() {
            return Err(ValidationError::NoMedicines);
        }

        let medicines = data
            .medicines
            .into_iter()
            .map(Medicine::new)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            id: Uuid::new_v4(),
            name,
            duration: data.duration,
            start_date: data.start_date,
            medicines,
        })
    }

    pub fn apply_update(&mut self, data: CourseUpdate) -> Result<(), ValidationError> {
        if let Some(ref name) = data.name {
            if name.trim().is_empty() {
                return Err(ValidationError::EmptyCourseName);
            }
        }
        if data.duration == Some(0) {
            return Err(ValidationError::InvalidDuration);
        }

        if let Some(name) = data.name {
            self.name = name.trim().to_string();
        }
        if let Some(duration) = data.duration {
            self.duration = duration;
        }
        if let Some(start_date) = data.start_date {
            self.start_date = start_date;
        }
        Ok(())
    }

    /// First day after the course (exclusive end)
    pub fn end_date(&self) -> Option<NaiveDate> {
        self.start_date
            .and_then(|start| start.checked_add_days(Days::new(self.duration as u64)))
    }

    /// Last day on which the course is active
    pub fn last_day(&self) -> Option<NaiveDate> {
        self.start_date.and_then(|start| {
            start.checked_add_days(Days::new(self.duration.saturating_sub(1) as u64))
        })
    }

    /// Active iff `start <= date < start + duration`; always active without
    /// a start date
    pub fn is_active(&self, date: NaiveDate) -> bool {
        match (self.start_date, self.end_date()) {
            (Some(start), Some(end)) => date >= start && date < end,
            (Some(start), None) => date >= start,
            (None, _) => true,
        }
    }

    pub fn medicine(&self, id: Uuid) -> Option<&Medicine> {
        self.medicines.iter().find(|m| m.id == id)
    }

    pub fn medicine_mut(&mut self, id: Uuid) -> Option<&mut Medicine> {
        self.medicines.iter_mut().find(|m| m.id == id)
    }

    /// Load every course with its medicines, inventory and ledger
    pub fn load_all(conn: &Connection) -> DbResult<Vec<Self>> {
        let mut statuses: HashMap<String, Vec<(NaiveDate, DoseStatus)>> = HashMap::new();
        {
            let mut stmt = conn.prepare("SELECT medicine_id, date, status FROM dose_status")?;
            let mut rows = stmt.query([])?;
            while let Some(row) = rows.next()? {
                let medicine_id: String = row.get(0)?;
                let date_raw: String = row.get(1)?;
                let status_raw: String = row.get(2)?;
                let date = parse_date_key(&date_raw)
                    .ok_or_else(|| DbError::Decode(format!("invalid ledger date '{}'", date_raw)))?;
                match DoseStatus::parse(&status_raw) {
                    Some(DoseStatus::Pending) | None => {
                        tracing::warn!(
                            medicine_id = %medicine_id,
                            date = %date_raw,
                            status = %status_raw,
                            "dropping unrecognised dose status"
                        );
                    }
                    Some(status) => statuses.entry(medicine_id).or_default().push((date, status)),
                }
            }
        }

        let mut inventories: HashMap<String, MedicineInventory> = HashMap::new();
        {
            let mut stmt = conn.prepare("SELECT * FROM medicine_inventory")?;
            let mut rows = stmt.query([])?;
            while let Some(row) = rows.next()? {
                let (medicine_id, inventory) = MedicineInventory::from_row(row)?;
                inventories.insert(medicine_id, inventory);
            }
        }

        let mut medicines: HashMap<String, Vec<Medicine>> = HashMap::new();
        {
            let mut stmt = conn.prepare("SELECT * FROM medicines ORDER BY course_id, position")?;
            let mut rows = stmt.query([])?;
            while let Some(row) = rows.next()? {
                let (course_id, mut med) = Medicine::from_row(row)?;
                let key = med.id.to_string();
                med.inventory = inventories.remove(&key);
                if let Some(entries) = statuses.remove(&key) {
                    med.status_by_date.extend(entries);
                }
                medicines.entry(course_id).or_default().push(med);
            }
        }

        let mut courses = Vec::new();
        let mut stmt = conn.prepare("SELECT id, name, duration, start_date FROM courses ORDER BY position")?;
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            let id_raw: String = row.get("id")?;
            let id = Uuid::parse_str(&id_raw)
                .map_err(|_| DbError::Decode(format!("invalid course id '{}'", id_raw)))?;
            let start_date = match row.get::<_, Option<String>>("start_date")? {
                Some(raw) => Some(
                    parse_date_key(&raw)
                        .ok_or_else(|| DbError::Decode(format!("invalid start date '{}'", raw)))?,
                ),
                None => None,
            };
            courses.push(Self {
                id,
                name: row.get("name")?,
                duration: row.get("duration")?,
                start_date,
                medicines: medicines.remove(&id_raw).unwrap_or_default(),
            });
        }

        Ok(courses)
    }

    /// Replace the whole stored collection in one transaction
    pub fn replace_all(conn: &mut Connection, courses: &[Self]) -> DbResult<()> {
        let tx = conn.transaction()?;

        tx.execute_batch(
            "DELETE FROM dose_status;
             DELETE FROM medicine_inventory;
             DELETE FROM medicines;
             DELETE FROM courses;",
        )?;

        for (position, course) in courses.iter().enumerate() {
            let course_id = course.id.to_string();
            tx.execute(
                "INSERT INTO courses (id, position, name, duration, start_date) VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    course_id,
                    position as i64,
                    course.name,
                    course.duration,
                    course.start_date.map(date_key),
                ],
            )?;
            for (med_position, med) in course.medicines.iter().enumerate() {
                med.insert(&tx, &course_id, med_position)?;
            }
        }

        tx.commit()?;
        Ok(())
    }
}
