//! Persistence port for the course book.
//!
//! `CourseBook` only ever talks to storage through this trait so it can be
//! exercised against an in-memory database or a fake.

use crate::models::{MedicineCourse, UserProfile};

use super::{migrations, Database, DbError, DbResult};

pub trait CourseStore: Send + Sync {
    /// Whole course collection. Stored data that cannot be decoded reads as
    /// an empty collection.
    fn load_courses(&self) -> DbResult<Vec<MedicineCourse>>;

    /// Replace the whole collection
    fn save_courses(&self, courses: &[MedicineCourse]) -> DbResult<()>;

    fn load_user_profile(&self) -> DbResult<Option<UserProfile>>;

    fn save_user_profile(&self, profile: &UserProfile) -> DbResult<()>;
}

impl Database {
    /// Bring the schema up to date
    pub fn migrate(&self) -> DbResult<()> {
        self.with_conn(migrations::run_migrations)
    }
}

impl CourseStore for Database {
    fn load_courses(&self) -> DbResult<Vec<MedicineCourse>> {
        match self.with_conn(MedicineCourse::load_all) {
            Err(DbError::Decode(reason)) => {
                tracing::warn!(%reason, "stored courses could not be decoded, starting empty");
                Ok(Vec::new())
            }
            other => other,
        }
    }

    fn save_courses(&self, courses: &[MedicineCourse]) -> DbResult<()> {
        self.with_conn_mut(|conn| MedicineCourse::replace_all(conn, courses))?;
        tracing::info!(count = courses.len(), "saved courses");
        Ok(())
    }

    fn load_user_profile(&self) -> DbResult<Option<UserProfile>> {
        match self.with_conn(UserProfile::get) {
            Err(DbError::Decode(reason)) => {
                tracing::warn!(%reason, "stored profile could not be decoded, ignoring it");
                Ok(None)
            }
            other => other,
        }
    }

    fn save_user_profile(&self, profile: &UserProfile) -> DbResult<()> {
        self.with_conn(|conn| UserProfile::set(conn, profile))
    }
}
