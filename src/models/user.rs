//! User profile model
//!
//! The single user's details and the meal/sleep times that anchor every
//! generated dose time.

use chrono::NaiveTime;
use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::db::{DbError, DbResult};
use crate::dosing::{format_hhmm, parse_hhmm};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub name: String,
    pub age: u32,
    pub gender: String,
    pub medical_conditions: Vec<String>,
    pub breakfast_time: NaiveTime,
    pub lunch_time: NaiveTime,
    pub dinner_time: NaiveTime,
    pub bedtime: NaiveTime,
}

impl UserProfile {
    fn from_row(row: &Row) -> DbResult<Self> {
        let conditions_raw: String = row.get("medical_conditions")?;
        let medical_conditions: Vec<String> = serde_json::from_str(&conditions_raw)
            .map_err(|e| DbError::Decode(format!("medical_conditions: {}", e)))?;

        let time = |column: &str| -> DbResult<NaiveTime> {
            let raw: String = row.get(column)?;
            parse_hhmm(&raw).ok_or_else(|| DbError::Decode(format!("invalid {} '{}'", column, raw)))
        };

        Ok(Self {
            name: row.get("name")?,
            age: row.get("age")?,
            gender: row.get("gender")?,
            medical_conditions,
            breakfast_time: time("breakfast_time")?,
            lunch_time: time("lunch_time")?,
            dinner_time: time("dinner_time")?,
            bedtime: time("bedtime")?,
        })
    }

    /// Get the profile (single row table)
    pub fn get(conn: &Connection) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM user_profile WHERE id = 1")?;
        let mut rows = stmt.query([])?;
        match rows.next()? {
            Some(row) => Ok(Some(Self::from_row(row)?)),
            None => Ok(None),
        }
    }

    /// Set or update the profile (upsert)
    pub fn set(conn: &Connection, profile: &Self) -> DbResult<()> {
        let conditions = serde_json::to_string(&profile.medical_conditions)
            .map_err(|e| DbError::Decode(format!("medical_conditions: {}", e)))?;

        conn.execute(
            r#"
            INSERT INTO user_profile (
                id, name, age, gender, medical_conditions,
                breakfast_time, lunch_time, dinner_time, bedtime
            )
            VALUES (1, ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                age = excluded.age,
                gender = excluded.gender,
                medical_conditions = excluded.medical_conditions,
                breakfast_time = excluded.breakfast_time,
                lunch_time = excluded.lunch_time,
                dinner_time = excluded.dinner_time,
                bedtime = excluded.bedtime,
                updated_at = datetime('now')
            "#,
            params![
                profile.name,
                profile.age,
                profile.gender,
                conditions,
                format_hhmm(profile.breakfast_time),
                format_hhmm(profile.lunch_time),
                format_hhmm(profile.dinner_time),
                format_hhmm(profile.bedtime),
            ],
        )?;
        Ok(())
    }
}
