//! Course MCP Tools
//!
//! Tools for creating, inspecting and editing medicine courses and the
//! medicines inside them.

use chrono::NaiveDate;
use rmcp::schemars;
use serde::{Deserialize, Serialize};

use super::inventory::{InventoryDetail, InventoryInput};
use super::{book_error, date_or_today, parse_enum, parse_id, parse_optional_date, parse_time};
use crate::book::CourseBook;
use crate::dosing::{
    adherence_rate, date_key, days_remaining, dose_statistics, dose_time_labels, elapsed_fraction,
    medicine_statistics, progress, DoseStatistics,
};
use crate::models::{
    CourseCreate, CourseUpdate, Frequency, Medicine, MedicineCourse, MedicineCreate,
    MedicineUpdate, Timing, UserProfile, WhenToTake,
};

/// Medicine as supplied by the caller
#[derive(Debug, Clone, Deserialize, schemars::JsonSchema)]
pub struct MedicineInput {
    pub name: String,
    /// once_daily, twice_daily, thrice_daily or every_x_hours
    pub frequency: String,
    /// morning, afternoon, night or specific_time (only used for once_daily)
    #[serde(default = "default_timing")]
    pub timing: String,
    /// before_meals, after_meals, x_minutes_before_meals, x_minutes_after_meals or at_bedtime
    pub when_to_take: String,
    /// HH:MM, required when timing is specific_time
    pub custom_time: Option<String>,
    /// 1-120, required for the x_minutes variants
    pub x_minutes: Option<u32>,
    /// 1-24, required for every_x_hours
    pub x_hours: Option<u32>,
    pub inventory: Option<InventoryInput>,
}

fn default_timing() -> String {
    "morning".to_string()
}

impl MedicineInput {
    pub fn into_create(self) -> Result<MedicineCreate, String> {
        Ok(MedicineCreate {
            frequency: parse_enum("frequency", &self.frequency, Frequency::parse)?,
            timing: parse_enum("timing", &self.timing, Timing::parse)?,
            when_to_take: parse_enum("when_to_take", &self.when_to_take, WhenToTake::parse)?,
            custom_time: self.custom_time.as_deref().map(parse_time).transpose()?,
            x_minutes: self.x_minutes,
            x_hours: self.x_hours,
            inventory: self.inventory.map(InventoryInput::into_inventory).transpose()?,
            name: self.name,
        })
    }
}

/// Partial medicine edit
#[derive(Debug, Clone, Default, Deserialize, schemars::JsonSchema)]
pub struct MedicineChanges {
    pub name: Option<String>,
    pub frequency: Option<String>,
    pub timing: Option<String>,
    pub when_to_take: Option<String>,
    pub custom_time: Option<String>,
    pub x_minutes: Option<u32>,
    pub x_hours: Option<u32>,
}

impl MedicineChanges {
    fn into_update(self) -> Result<MedicineUpdate, String> {
        Ok(MedicineUpdate {
            name: self.name,
            frequency: self
                .frequency
                .map(|s| parse_enum("frequency", &s, Frequency::parse))
                .transpose()?,
            timing: self
                .timing
                .map(|s| parse_enum("timing", &s, Timing::parse))
                .transpose()?,
            when_to_take: self
                .when_to_take
                .map(|s| parse_enum("when_to_take", &s, WhenToTake::parse))
                .transpose()?,
            custom_time: self.custom_time.as_deref().map(parse_time).transpose()?,
            x_minutes: self.x_minutes,
            x_hours: self.x_hours,
        })
    }
}

/// Course card
#[derive(Debug, Serialize)]
pub struct CourseSummary {
    pub id: String,
    pub name: String,
    pub duration: u32,
    pub start_date: Option<String>,
    pub last_day: Option<String>,
    pub is_active: bool,
    pub medicine_count: usize,
    pub progress: f64,
    pub elapsed_fraction: f64,
    pub days_remaining: u32,
}

impl CourseSummary {
    fn new(course: &MedicineCourse, today: NaiveDate) -> Self {
        Self {
            id: course.id.to_string(),
            name: course.name.clone(),
            duration: course.duration,
            start_date: course.start_date.map(date_key),
            last_day: course.last_day().map(date_key),
            is_active: course.is_active(today),
            medicine_count: course.medicines.len(),
            progress: progress(course, today),
            elapsed_fraction: elapsed_fraction(course, today),
            days_remaining: days_remaining(course, today),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MedicineDetail {
    pub id: String,
    pub name: String,
    pub frequency: String,
    pub frequency_display: String,
    pub timing: String,
    pub when_to_take: String,
    pub when_to_take_display: String,
    pub custom_time: Option<String>,
    pub x_minutes: Option<u32>,
    pub x_hours: Option<u32>,
    /// Empty until a profile with meal times is set
    pub dose_times: Vec<String>,
    pub recorded_days: usize,
    pub statistics: Option<DoseStatistics>,
    pub adherence_rate: Option<f64>,
    pub inventory: Option<InventoryDetail>,
}

pub(crate) fn medicine_detail(
    course: &MedicineCourse,
    med: &Medicine,
    profile: Option<&UserProfile>,
    today: NaiveDate,
) -> MedicineDetail {
    let statistics = medicine_statistics(course, med.id, today);
    MedicineDetail {
        id: med.id.to_string(),
        name: med.name.clone(),
        frequency: med.frequency.as_str().to_string(),
        frequency_display: med.frequency.display_name().to_string(),
        timing: med.timing.as_str().to_string(),
        when_to_take: med.when_to_take.as_str().to_string(),
        when_to_take_display: med.when_to_take.display_name().to_string(),
        custom_time: med.custom_time.map(crate::dosing::format_hhmm),
        x_minutes: med.x_minutes,
        x_hours: med.x_hours,
        dose_times: dose_time_labels(med, profile),
        recorded_days: med.status_by_date.len(),
        statistics,
        adherence_rate: statistics.as_ref().and_then(adherence_rate),
        inventory: med.inventory.as_ref().map(InventoryDetail::from),
    }
}

#[derive(Debug, Serialize)]
pub struct CourseDetail {
    #[serde(flatten)]
    pub summary: CourseSummary,
    pub statistics: DoseStatistics,
    pub adherence_rate: Option<f64>,
    pub medicines: Vec<MedicineDetail>,
}

fn course_detail(course: &MedicineCourse, profile: Option<&UserProfile>, today: NaiveDate) -> CourseDetail {
    let statistics = dose_statistics(course, today);
    CourseDetail {
        summary: CourseSummary::new(course, today),
        statistics,
        adherence_rate: adherence_rate(&statistics),
        medicines: course
            .medicines
            .iter()
            .map(|m| medicine_detail(course, m, profile, today))
            .collect(),
    }
}

#[derive(Debug, Serialize)]
pub struct ListCoursesResponse {
    pub courses: Vec<CourseSummary>,
    pub total: usize,
    pub active_count: usize,
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub success: bool,
    pub deleted_id: String,
}

// ============================================================================
// Tool Functions
// ============================================================================

/// Create a course with its medicines
pub fn create_course(
    book: &CourseBook,
    name: String,
    duration: u32,
    start_date: Option<&str>,
    medicines: Vec<MedicineInput>,
) -> Result<CourseDetail, String> {
    let data = CourseCreate {
        name,
        duration,
        start_date: parse_optional_date(start_date)?,
        medicines: medicines
            .into_iter()
            .map(MedicineInput::into_create)
            .collect::<Result<Vec<_>, _>>()?,
    };

    let course = book.create_course(data).map_err(book_error)?;
    let profile = book.profile().map_err(book_error)?;
    Ok(course_detail(&course, profile.as_ref(), date_or_today(None)?))
}

/// Full course detail including statistics
pub fn get_course(book: &CourseBook, id: &str, today: Option<&str>) -> Result<Option<CourseDetail>, String> {
    let id = parse_id("course_id", id)?;
    let today = date_or_today(today)?;
    let course = book.course(id).map_err(book_error)?;
    let profile = book.profile().map_err(book_error)?;
    Ok(course.map(|c| course_detail(&c, profile.as_ref(), today)))
}

pub fn list_courses(book: &CourseBook, active_only: bool, today: Option<&str>) -> Result<ListCoursesResponse, String> {
    let today = date_or_today(today)?;
    let courses = book.courses().map_err(book_error)?;

    let active_count = courses.iter().filter(|c| c.is_active(today)).count();
    let summaries: Vec<CourseSummary> = courses
        .iter()
        .filter(|c| !active_only || c.is_active(today))
        .map(|c| CourseSummary::new(c, today))
        .collect();

    Ok(ListCoursesResponse {
        total: summaries.len(),
        courses: summaries,
        active_count,
    })
}

/// Edit course metadata. `clear_start_date` drops the start date and wins
/// over `start_date`.
pub fn update_course(
    book: &CourseBook,
    id: &str,
    name: Option<String>,
    duration: Option<u32>,
    start_date: Option<&str>,
    clear_start_date: bool,
) -> Result<Option<CourseSummary>, String> {
    let id = parse_id("course_id", id)?;
    let start_date = if clear_start_date {
        Some(None)
    } else {
        parse_optional_date(start_date)?.map(Some)
    };
    let data = CourseUpdate {
        name,
        duration,
        start_date,
    };
    let today = date_or_today(None)?;
    let updated = book.update_course(id, data).map_err(book_error)?;
    Ok(updated.map(|c| CourseSummary::new(&c, today)))
}

pub fn delete_course(book: &CourseBook, id: &str) -> Result<DeleteResponse, String> {
    let course_id = parse_id("course_id", id)?;
    if !book.delete_course(course_id).map_err(book_error)? {
        return Err(format!("Course not found with id: {}", id));
    }
    Ok(DeleteResponse {
        success: true,
        deleted_id: course_id.to_string(),
    })
}

pub fn add_medicine(book: &CourseBook, course_id: &str, input: MedicineInput) -> Result<Option<MedicineDetail>, String> {
    let course_id = parse_id("course_id", course_id)?;
    let data = input.into_create()?;
    let Some(med) = book.add_medicine(course_id, data).map_err(book_error)? else {
        return Ok(None);
    };
    detail_for(book, course_id, med.id)
}

pub fn update_medicine(
    book: &CourseBook,
    course_id: &str,
    medicine_id: &str,
    changes: MedicineChanges,
) -> Result<Option<MedicineDetail>, String> {
    let course_id = parse_id("course_id", course_id)?;
    let medicine_id = parse_id("medicine_id", medicine_id)?;
    let data = changes.into_update()?;
    if book
        .update_medicine(course_id, medicine_id, data)
        .map_err(book_error)?
        .is_none()
    {
        return Ok(None);
    }
    detail_for(book, course_id, medicine_id)
}

pub fn remove_medicine(book: &CourseBook, course_id: &str, medicine_id: &str) -> Result<DeleteResponse, String> {
    let cid = parse_id("course_id", course_id)?;
    let mid = parse_id("medicine_id", medicine_id)?;
    if !book.remove_medicine(cid, mid).map_err(book_error)? {
        return Err(format!("Medicine {} not found in course {}", medicine_id, course_id));
    }
    Ok(DeleteResponse {
        success: true,
        deleted_id: mid.to_string(),
    })
}

fn detail_for(
    book: &CourseBook,
    course_id: uuid::Uuid,
    medicine_id: uuid::Uuid,
) -> Result<Option<MedicineDetail>, String> {
    let today = date_or_today(None)?;
    let profile = book.profile().map_err(book_error)?;
    let course = book.course(course_id).map_err(book_error)?;
    Ok(course.and_then(|c| {
        c.medicine(medicine_id)
            .map(|m| medicine_detail(&c, m, profile.as_ref(), today))
    }))
}
