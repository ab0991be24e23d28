//! Meal-relative time adjustment

use chrono::{Duration, NaiveTime};

use crate::models::WhenToTake;

/// Fixed offset for plain before/after meal doses
pub const MEAL_OFFSET_MINUTES: i64 = 30;

/// Shift `anchor` according to the meal preference.
///
/// The x-minutes variants leave the anchor untouched when `x_minutes` is
/// missing. Bedtime doses ignore the anchor. Arithmetic wraps at midnight.
pub fn resolve(
    anchor: NaiveTime,
    when: WhenToTake,
    x_minutes: Option<u32>,
    bedtime: NaiveTime,
) -> NaiveTime {
    let offset = match when {
        WhenToTake::BeforeMeals => -MEAL_OFFSET_MINUTES,
        WhenToTake::AfterMeals => MEAL_OFFSET_MINUTES,
        WhenToTake::XMinutesBeforeMeals => -(x_minutes.unwrap_or(0) as i64),
        WhenToTake::XMinutesAfterMeals => x_minutes.unwrap_or(0) as i64,
        WhenToTake::AtBedtime => return bedtime,
    };
    shift(anchor, offset)
}

/// Add minutes to a clock time, wrapping past midnight either way
pub(crate) fn shift(time: NaiveTime, minutes: i64) -> NaiveTime {
    time.overflowing_add_signed(Duration::minutes(minutes)).0
}
