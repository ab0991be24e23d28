//! Medrem MCP Server Implementation
//!
//! Implements the MCP server with all medrem tools. Every tool is a thin
//! adapter over `crate::tools`.

use std::sync::Arc;

use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{
    CallToolResult, Content, Implementation, ProtocolVersion, ServerCapabilities, ServerInfo,
};
use rmcp::{schemars, tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler};
use serde::Deserialize;
use tokio::sync::Mutex;

use crate::book::CourseBook;
use crate::config::Config;
use crate::notify::AlertOutbox;
use crate::tools::courses::{self, MedicineChanges, MedicineInput};
use crate::tools::doses;
use crate::tools::inventory::{self, InventoryInput};
use crate::tools::profile::{self, ProfileInput};
use crate::tools::reminders::{self, DoseRefInput};
use crate::tools::status::StatusTracker;

/// Medrem MCP Service
#[derive(Clone)]
pub struct MedremService {
    status_tracker: Arc<Mutex<StatusTracker>>,
    book: Arc<CourseBook>,
    outbox: Arc<AlertOutbox>,
    config: Arc<Config>,
    tool_router: ToolRouter<MedremService>,
}

impl MedremService {
    pub fn new(config: Config, book: Arc<CourseBook>, outbox: Arc<AlertOutbox>) -> Self {
        Self {
            status_tracker: Arc::new(Mutex::new(StatusTracker::new(config.database_path.clone()))),
            book,
            outbox,
            config: Arc::new(config),
            tool_router: Self::tool_router(),
        }
    }
}

// ============================================================================
// Profile Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SetProfileParams {
    pub name: String,
    pub age: u32,
    #[serde(default)]
    pub gender: String,
    #[serde(default)]
    pub medical_conditions: Vec<String>,
    /// HH:MM
    pub breakfast_time: String,
    /// HH:MM
    pub lunch_time: String,
    /// HH:MM
    pub dinner_time: String,
    /// HH:MM
    pub bedtime: String,
}

// ============================================================================
// Course Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct CreateCourseParams {
    pub name: String,
    /// Number of days, at least 1
    pub duration: u32,
    /// YYYY-MM-DD; courses without one never appear on the calendar
    pub start_date: Option<String>,
    pub medicines: Vec<MedicineInput>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct GetCourseParams {
    pub course_id: String,
    /// Evaluate statistics as of this date (YYYY-MM-DD), defaults to today
    pub today: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ListCoursesParams {
    #[serde(default)]
    pub active_only: bool,
    pub today: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct UpdateCourseParams {
    pub course_id: String,
    pub name: Option<String>,
    pub duration: Option<u32>,
    /// YYYY-MM-DD
    pub start_date: Option<String>,
    /// Remove the start date so the course is always active
    #[serde(default)]
    pub clear_start_date: bool,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct CourseIdParams {
    pub course_id: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct AddMedicineParams {
    pub course_id: String,
    pub medicine: MedicineInput,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct UpdateMedicineParams {
    pub course_id: String,
    pub medicine_id: String,
    pub changes: MedicineChanges,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct MedicineRefParams {
    pub course_id: String,
    pub medicine_id: String,
}

// ============================================================================
// Dose Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SetDoseStatusParams {
    pub course_id: String,
    pub medicine_id: String,
    /// YYYY-MM-DD, defaults to today
    pub date: Option<String>,
    /// taken, missed or pending (pending clears the entry)
    pub status: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct DayScheduleParams {
    /// YYYY-MM-DD, defaults to today
    pub date: Option<String>,
    /// Reference date for missed/pending, defaults to the real today
    pub today: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct CourseCalendarParams {
    pub course_id: String,
    pub today: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct MonthMarkersParams {
    pub year: i32,
    /// 1-12
    pub month: u32,
}

// ============================================================================
// Inventory Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SetInventoryParams {
    pub course_id: String,
    pub medicine_id: String,
    /// Omit to stop tracking inventory for this medicine
    pub inventory: Option<InventoryInput>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct RefillParams {
    pub course_id: String,
    pub medicine_id: String,
    /// New unit count, defaults to a full pack
    pub count: Option<u32>,
    /// YYYY-MM-DD, defaults to today
    pub date: Option<String>,
}

// ============================================================================
// Reminder Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct PlanRemindersParams {
    /// YYYY-MM-DDTHH:MM local time, defaults to now
    pub now: Option<String>,
    /// Days ahead to plan, defaults to the configured horizon
    pub horizon_days: Option<u32>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct RespondToReminderParams {
    /// MARK_AS_TAKEN or REMIND_LATER
    pub action: String,
    /// The doses carried by the reminder
    #[serde(default)]
    pub doses: Vec<DoseRefInput>,
    /// Reminder body, used to find medicines by name when doses are missing
    pub body: Option<String>,
    pub now: Option<String>,
}

fn not_found(what: &str, id: &str) -> String {
    serde_json::json!({ "error": format!("{} not found", what), "id": id }).to_string()
}

#[tool_router]
impl MedremService {
    // --- Status ---

    #[tool(description = "Get the current status of the medrem service including build info, database status, process information, course count and queued alerts")]
    async fn medrem_status(&self) -> Result<CallToolResult, McpError> {
        let tracker = self.status_tracker.lock().await;
        let status = tracker.get_status(&self.book, &self.outbox);
        let json = serde_json::to_string_pretty(&status)
            .map_err(|e| McpError::internal_error(format!("Serialization error: {}", e), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Get step-by-step instructions for tracking medicine courses, doses, inventory and reminders. Call this when starting a session or when unsure how to use the medrem tools.")]
    fn medication_instructions(&self) -> Result<CallToolResult, McpError> {
        use crate::tools::status::MEDICATION_INSTRUCTIONS;
        Ok(CallToolResult::success(vec![Content::text(MEDICATION_INSTRUCTIONS)]))
    }

    // --- Profile ---

    #[tool(description = "Get the user profile (meal times and bedtime drive every dose time)")]
    fn get_profile(&self) -> Result<CallToolResult, McpError> {
        let result = profile::get_profile(&self.book).map_err(|e| McpError::internal_error(e, None))?;
        let json = match result {
            Some(p) => serde_json::to_string_pretty(&p),
            None => Ok(r#"{"error": "No profile set. Call set_profile first."}"#.to_string()),
        }.map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Create or replace the user profile. Times are HH:MM.")]
    fn set_profile(&self, Parameters(p): Parameters<SetProfileParams>) -> Result<CallToolResult, McpError> {
        let input = ProfileInput {
            name: &p.name, age: p.age, gender: &p.gender, medical_conditions: p.medical_conditions,
            breakfast_time: &p.breakfast_time, lunch_time: &p.lunch_time,
            dinner_time: &p.dinner_time, bedtime: &p.bedtime,
        };
        let result = profile::set_profile(&self.book, input).map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    // --- Courses ---

    #[tool(description = "Create a medicine course with at least one medicine")]
    fn create_course(&self, Parameters(p): Parameters<CreateCourseParams>) -> Result<CallToolResult, McpError> {
        let result = courses::create_course(&self.book, p.name, p.duration, p.start_date.as_deref(), p.medicines)
            .map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Get full course details: medicines, dose times, inventory, progress and adherence statistics")]
    fn get_course(&self, Parameters(p): Parameters<GetCourseParams>) -> Result<CallToolResult, McpError> {
        let result = courses::get_course(&self.book, &p.course_id, p.today.as_deref())
            .map_err(|e| McpError::internal_error(e, None))?;
        let json = match result {
            Some(course) => serde_json::to_string_pretty(&course),
            None => Ok(not_found("Course", &p.course_id)),
        }.map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "List courses with progress, optionally only those active today")]
    fn list_courses(&self, Parameters(p): Parameters<ListCoursesParams>) -> Result<CallToolResult, McpError> {
        let result = courses::list_courses(&self.book, p.active_only, p.today.as_deref())
            .map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Update a course's name, duration or start date, or clear the start date with clear_start_date. Recorded dose statuses are kept.")]
    fn update_course(&self, Parameters(p): Parameters<UpdateCourseParams>) -> Result<CallToolResult, McpError> {
        let result = courses::update_course(&self.book, &p.course_id, p.name, p.duration, p.start_date.as_deref(), p.clear_start_date)
            .map_err(|e| McpError::internal_error(e, None))?;
        let json = match result {
            Some(course) => serde_json::to_string_pretty(&course),
            None => Ok(not_found("Course", &p.course_id)),
        }.map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Delete a course with all its medicines, dose history and inventory")]
    fn delete_course(&self, Parameters(p): Parameters<CourseIdParams>) -> Result<CallToolResult, McpError> {
        let result = courses::delete_course(&self.book, &p.course_id).map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    // --- Medicines ---

    #[tool(description = "Add a medicine to an existing course")]
    fn add_medicine(&self, Parameters(p): Parameters<AddMedicineParams>) -> Result<CallToolResult, McpError> {
        let result = courses::add_medicine(&self.book, &p.course_id, p.medicine)
            .map_err(|e| McpError::internal_error(e, None))?;
        let json = match result {
            Some(med) => serde_json::to_string_pretty(&med),
            None => Ok(not_found("Course", &p.course_id)),
        }.map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Change a medicine's name, frequency, timing or meal preference")]
    fn update_medicine(&self, Parameters(p): Parameters<UpdateMedicineParams>) -> Result<CallToolResult, McpError> {
        let result = courses::update_medicine(&self.book, &p.course_id, &p.medicine_id, p.changes)
            .map_err(|e| McpError::internal_error(e, None))?;
        let json = match result {
            Some(med) => serde_json::to_string_pretty(&med),
            None => Ok(not_found("Medicine", &p.medicine_id)),
        }.map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Remove a medicine from a course. The last medicine cannot be removed; delete the course instead.")]
    fn remove_medicine(&self, Parameters(p): Parameters<MedicineRefParams>) -> Result<CallToolResult, McpError> {
        let result = courses::remove_medicine(&self.book, &p.course_id, &p.medicine_id)
            .map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    // --- Doses ---

    #[tool(description = "Record a dose as taken, missed or pending for one medicine on one date. Taken consumes one unit of tracked inventory and may raise a low-stock alert.")]
    fn set_dose_status(&self, Parameters(p): Parameters<SetDoseStatusParams>) -> Result<CallToolResult, McpError> {
        let result = doses::set_dose_status(&self.book, &p.course_id, &p.medicine_id, p.date.as_deref(), &p.status)
            .map_err(|e| McpError::internal_error(e, None))?;
        let json = match result {
            Some(change) => serde_json::to_string_pretty(&change),
            None => Ok(not_found("Course or medicine", &p.medicine_id)),
        }.map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Get every medicine due on a date across all courses, with dose times and status")]
    fn get_day_schedule(&self, Parameters(p): Parameters<DayScheduleParams>) -> Result<CallToolResult, McpError> {
        let result = doses::day_schedule(&self.book, p.date.as_deref(), p.today.as_deref())
            .map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Get a course laid out day by day with each medicine's status")]
    fn get_course_calendar(&self, Parameters(p): Parameters<CourseCalendarParams>) -> Result<CallToolResult, McpError> {
        let result = doses::course_calendar(&self.book, &p.course_id, p.today.as_deref())
            .map_err(|e| McpError::internal_error(e, None))?;
        let json = match result {
            Some(calendar) => serde_json::to_string_pretty(&calendar),
            None => Ok(not_found("Course", &p.course_id)),
        }.map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "List the dates in a month that have at least one scheduled medicine")]
    fn get_month_markers(&self, Parameters(p): Parameters<MonthMarkersParams>) -> Result<CallToolResult, McpError> {
        let result = doses::month_markers(&self.book, p.year, p.month).map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    // --- Inventory ---

    #[tool(description = "Set up or replace inventory tracking for a medicine; omit inventory to stop tracking")]
    fn set_inventory(&self, Parameters(p): Parameters<SetInventoryParams>) -> Result<CallToolResult, McpError> {
        let result = inventory::set_inventory(&self.book, &p.course_id, &p.medicine_id, p.inventory)
            .map_err(|e| McpError::internal_error(e, None))?;
        let json = match result {
            Some(inv) => serde_json::to_string_pretty(&inv),
            None => Ok(not_found("Medicine", &p.medicine_id)),
        }.map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Refill a tracked medicine to the given count, or to a full pack")]
    fn refill_medicine(&self, Parameters(p): Parameters<RefillParams>) -> Result<CallToolResult, McpError> {
        let result = inventory::refill_medicine(&self.book, &p.course_id, &p.medicine_id, p.count, p.date.as_deref())
            .map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "List tracked medicines at or below their low-stock threshold")]
    fn list_low_stock(&self) -> Result<CallToolResult, McpError> {
        let result = inventory::list_low_stock(&self.book).map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    // --- Reminders ---

    #[tool(description = "Plan dose reminders for the coming days and queue them with the recurring inventory reminders. Drain the queue with take_pending_alerts.")]
    fn plan_reminders(&self, Parameters(p): Parameters<PlanRemindersParams>) -> Result<CallToolResult, McpError> {
        let horizon = p.horizon_days.unwrap_or(self.config.reminder_horizon_days);
        let result = reminders::plan_reminders(&self.book, p.now.as_deref(), horizon, self.config.refill_reminder_time)
            .map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Return and clear every queued reminder and low-stock alert")]
    fn take_pending_alerts(&self) -> Result<CallToolResult, McpError> {
        let result = reminders::take_pending_alerts(&self.outbox);
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Apply the user's answer to a reminder: MARK_AS_TAKEN records the doses as taken today, REMIND_LATER queues a snoozed copy")]
    fn respond_to_reminder(&self, Parameters(p): Parameters<RespondToReminderParams>) -> Result<CallToolResult, McpError> {
        let result = reminders::respond_to_reminder(&self.book, &p.action, p.doses, p.body, p.now.as_deref())
            .map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }
}

#[tool_handler]
impl ServerHandler for MedremService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "medrem".into(),
                version: crate::build_info::VERSION.into(),
                title: Some("Medicine Reminder".into()),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Medicine Reminder (medrem) - medication courses, dose adherence and inventory. \
                 IMPORTANT: Call medication_instructions first. Set the profile before anything time-based. \
                 Profile: get/set_profile. \
                 Courses: create/get/list/update/delete_course. \
                 Medicines: add/update/remove_medicine. \
                 Doses: set_dose_status, get_day_schedule, get_course_calendar, get_month_markers. \
                 Inventory: set_inventory, refill_medicine, list_low_stock. \
                 Reminders: plan_reminders, take_pending_alerts, respond_to_reminder."
                    .into(),
            ),
        }
    }
}
