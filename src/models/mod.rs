//! Data models
//!
//! Course, medicine, inventory and profile types plus their SQL mapping.

mod course;
mod inventory;
mod medicine;
mod schedule;
mod user;
mod validation;

pub use course::{CourseCreate, CourseUpdate, MedicineCourse};
pub use inventory::{MedicineInventory, UnitType};
pub use medicine::{DoseStatus, Medicine, MedicineCreate, MedicineUpdate, X_HOURS_RANGE, X_MINUTES_RANGE};
pub use schedule::{Frequency, Timing, WhenToTake};
pub use user::UserProfile;
pub use validation::ValidationError;
