//! Medrem Status Tool
//!
//! Provides runtime status information about the medrem service, plus the
//! usage guide served to AI assistants.

use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;
use sysinfo::{Pid, ProcessesToUpdate, System};

use crate::book::CourseBook;
use crate::build_info::BuildStamp;
use crate::notify::AlertOutbox;

/// Medication course instructions for AI assistants
pub const MEDICATION_INSTRUCTIONS: &str = r#"
# Medrem Medication Course Instructions

This guide explains how to track medicine courses, dose adherence and
inventory using the medrem tools.

## Overview

The system tracks:
- **Profile** - meal times and bedtime; every dose time is derived from them
- **Courses** - a named block of days (e.g. a 7-day antibiotic course)
- **Medicines** - what to take within a course, how often, and relative to meals
- **Dose status** - taken / missed per medicine per day
- **Inventory** - units left in the pack, with low-stock alerts

## Key Concepts

### Set the profile first
Dose times are computed from the profile. Without a profile, schedules
still list the medicines for each day but with no clock times.

```
set_profile(
  name: "Maria",
  age: 52,
  gender: "female",
  medical_conditions: ["Hypertension"],
  breakfast_time: "07:30",
  lunch_time: "12:30",
  dinner_time: "19:00",
  bedtime: "22:30"
)
```

### Course days
A course with `start_date` S and `duration` N covers S through S+N-1.
A course without a start date is treated as running but does not appear
on the calendar.

### How dose times are derived

| frequency | anchors |
|-----------|---------|
| `once_daily` | breakfast (`morning`), lunch (`afternoon`), dinner (`night`) or `custom_time` (`specific_time`) |
| `twice_daily` | breakfast, dinner |
| `thrice_daily` | breakfast, lunch, dinner |
| `every_x_hours` | breakfast, then every `x_hours` until the day is covered |

Each meal anchor is then shifted by `when_to_take`:

| when_to_take | shift |
|--------------|-------|
| `before_meals` | -30 min |
| `after_meals` | +30 min |
| `x_minutes_before_meals` | -`x_minutes` |
| `x_minutes_after_meals` | +`x_minutes` |
| `at_bedtime` | replaced by bedtime |

### Missed vs pending
A recorded status always wins. A day with nothing recorded is **pending**
from today on and **missed** before today.

## Step-by-Step Workflows

### Creating a Course

```
create_course(
  name: "Antibiotics",
  duration: 7,
  start_date: "2026-03-01",
  medicines: [
    {
      name: "Amoxicillin",
      frequency: "thrice_daily",
      when_to_take: "after_meals",
      inventory: { unit_type: "capsules", current_count: 21, full_pack_count: 21, low_stock_threshold: 5 }
    }
  ]
)
```

### Recording Doses

```
set_dose_status(course_id: "...", medicine_id: "...", date: "2026-03-02", status: "taken")
```

Recording `taken` consumes one unit of tracked inventory. Recording `taken`
again for the same day does not. Recording `pending` clears the entry.

### Reminders

1. `plan_reminders()` queues one reminder per dose time for the coming days,
   plus a weekly inventory check and, when something is low, a daily refill
   reminder.
2. `take_pending_alerts()` returns and clears everything queued, including
   low-stock alerts raised by dose recording.
3. When the user acts on a reminder, call `respond_to_reminder` with
   `MARK_AS_TAKEN` or `REMIND_LATER` and the reminder's `doses`.

## Quick Reference

| Task | Tool |
|------|------|
| Set/read profile | `set_profile`, `get_profile` |
| Create a course | `create_course` |
| Course details and adherence | `get_course` |
| List courses | `list_courses` |
| Edit/delete a course | `update_course`, `delete_course` |
| Edit medicines | `add_medicine`, `update_medicine`, `remove_medicine` |
| Record a dose | `set_dose_status` |
| What is due on a day | `get_day_schedule` |
| Whole course by day | `get_course_calendar` |
| Days with doses in a month | `get_month_markers` |
| Inventory | `set_inventory`, `refill_medicine`, `list_low_stock` |
| Reminders | `plan_reminders`, `take_pending_alerts`, `respond_to_reminder` |

## Notes

- Dates use ISO format: YYYY-MM-DD; times are 24h HH:MM
- Ids are UUIDs returned by the create tools
- A course always keeps at least one medicine; delete the course instead
- Adherence rate is taken / due doses so far, as a percentage
"#;

/// Runtime status of the medrem service
#[derive(Debug, Clone, Serialize)]
pub struct MedremStatus {
    #[serde(flatten)]
    pub build: BuildStamp,

    /// Database information
    pub database_path: String,
    pub database_size_bytes: Option<u64>,

    /// Process information
    pub uptime_seconds: u64,
    pub process_id: u32,
    pub memory_usage_bytes: u64,

    /// Course book
    pub course_count: Option<usize>,
    pub pending_alerts: usize,
}

/// Status tracker for collecting runtime information
pub struct StatusTracker {
    start_time: Instant,
    database_path: PathBuf,
}

impl StatusTracker {
    pub fn new(database_path: PathBuf) -> Self {
        Self {
            start_time: Instant::now(),
            database_path,
        }
    }

    /// Get the current status
    pub fn get_status(&self, book: &CourseBook, outbox: &AlertOutbox) -> MedremStatus {
        let database_size_bytes = std::fs::metadata(&self.database_path)
            .ok()
            .map(|m| m.len());

        let pid = std::process::id();
        let mut sys = System::new();
        sys.refresh_processes(ProcessesToUpdate::Some(&[Pid::from_u32(pid)]));

        let memory_usage_bytes = sys
            .process(Pid::from_u32(pid))
            .map(|p| p.memory())
            .unwrap_or(0);

        let course_count = match book.courses() {
            Ok(courses) => Some(courses.len()),
            Err(e) => {
                tracing::warn!(error = %e, "course count unavailable");
                None
            }
        };

        MedremStatus {
            build: BuildStamp::embedded(),
            database_path: self.database_path.display().to_string(),
            database_size_bytes,
            uptime_seconds: self.start_time.elapsed().as_secs(),
            process_id: pid,
            memory_usage_bytes,
            course_count,
            pending_alerts: outbox.pending_count(),
        }
    }
}
