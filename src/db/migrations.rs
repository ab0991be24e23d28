//! Database migrations
//!
//! Schema creation and migration logic.

use rusqlite::Connection;

use super::connection::DbResult;

/// Current schema version
const SCHEMA_VERSION: i32 = 1;

/// Run all migrations to bring the database up to the current schema version
pub fn run_migrations(conn: &Connection) -> DbResult<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
        [],
    )?;

    let current_version = get_schema_version(conn)?;

    if current_version < 1 {
        migrate_v1(conn)?;
        conn.execute("INSERT INTO schema_migrations (version) VALUES (1)", [])?;
        tracing::info!("applied schema migration v1");
    }

    Ok(())
}

/// Migration v1: Initial schema
fn migrate_v1(conn: &Connection) -> DbResult<()> {
    conn.execute_batch(
        r#"
        -- ============================================
        -- USER PROFILE
        -- Single row (id = 1); meal and sleep anchors for dose times
        -- ============================================
        CREATE TABLE user_profile (
            id INTEGER PRIMARY KEY CHECK(id = 1),
            name TEXT NOT NULL,
            age INTEGER NOT NULL DEFAULT 0,
            gender TEXT NOT NULL DEFAULT '',
            medical_conditions TEXT NOT NULL DEFAULT '[]',  -- JSON array of strings
            breakfast_time TEXT NOT NULL,                   -- "HH:MM"
            lunch_time TEXT NOT NULL,
            dinner_time TEXT NOT NULL,
            bedtime TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        -- ============================================
        -- COURSES
        -- A bounded regimen of one or more medicines
        -- ============================================
        CREATE TABLE courses (
            id TEXT PRIMARY KEY,                 -- UUID
            position INTEGER NOT NULL,           -- display order
            name TEXT NOT NULL,
            duration INTEGER NOT NULL CHECK(duration >= 1),  -- days
            start_date TEXT                      -- ISO date, NULL = always active
        );

        -- ============================================
        -- MEDICINES
        -- ============================================
        CREATE TABLE medicines (
            id TEXT PRIMARY KEY,                 -- UUID
            course_id TEXT NOT NULL REFERENCES courses(id) ON DELETE CASCADE,
            position INTEGER NOT NULL,
            name TEXT NOT NULL,
            frequency TEXT NOT NULL CHECK(frequency IN ('once_daily', 'twice_daily', 'thrice_daily', 'every_x_hours')),
            timing TEXT NOT NULL CHECK(timing IN ('morning', 'afternoon', 'night', 'specific_time')),
            when_to_take TEXT NOT NULL,
            custom_time TEXT,                    -- "HH:MM"
            x_minutes INTEGER,
            x_hours INTEGER
        );

        CREATE INDEX idx_medicines_course ON medicines(course_id);

        -- ============================================
        -- MEDICINE INVENTORY
        -- At most one row per medicine
        -- ============================================
        CREATE TABLE medicine_inventory (
            medicine_id TEXT PRIMARY KEY REFERENCES medicines(id) ON DELETE CASCADE,
            tracking_enabled INTEGER NOT NULL DEFAULT 1,
            unit_type TEXT NOT NULL,
            current_count INTEGER NOT NULL CHECK(current_count >= 0),
            full_pack_count INTEGER NOT NULL,
            low_stock_threshold INTEGER NOT NULL,
            notify_when_low INTEGER NOT NULL DEFAULT 1,
            last_refill_date TEXT
        );

        -- ============================================
        -- DOSE STATUS
        -- The ledger: one authoritative status per (medicine, date)
        -- ============================================
        CREATE TABLE dose_status (
            medicine_id TEXT NOT NULL REFERENCES medicines(id) ON DELETE CASCADE,
            date TEXT NOT NULL,                  -- "yyyy-MM-dd"
            status TEXT NOT NULL,
            PRIMARY KEY (medicine_id, date)
        );
        "#,
    )?;

    Ok(())
}

/// Get the current schema version
pub fn get_schema_version(conn: &Connection) -> DbResult<i32> {
    let version: i32 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
            [],
            |row| row.get(0),
        )
        .unwrap_or(0);
    Ok(version)
}

/// Check if the database needs migration
pub fn needs_migration(conn: &Connection) -> DbResult<bool> {
    let current = get_schema_version(conn)?;
    Ok(current < SCHEMA_VERSION)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_are_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        assert!(needs_migration(&conn).unwrap_or(true));

        run_migrations(&conn).unwrap();
        run_migrations(&conn).unwrap();

        assert_eq!(get_schema_version(&conn).unwrap(), SCHEMA_VERSION);
        assert!(!needs_migration(&conn).unwrap());
    }
}
