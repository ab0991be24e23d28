//! Dosing schedule enums
//!
//! How often a medicine is taken, at which point of the day, and how the dose
//! relates to meals.

use serde::{Deserialize, Serialize};

/// How many times per day a dose recurs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    OnceDaily,
    TwiceDaily,
    ThriceDaily,
    EveryXHours,
}

impl Frequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::OnceDaily => "once_daily",
            Frequency::TwiceDaily => "twice_daily",
            Frequency::ThriceDaily => "thrice_daily",
            Frequency::EveryXHours => "every_x_hours",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().replace([' ', '-'], "_").as_str() {
            "once_daily" | "once" | "daily" | "1x_daily" => Some(Frequency::OnceDaily),
            "twice_daily" | "twice" | "2x_daily" => Some(Frequency::TwiceDaily),
            "thrice_daily" | "three_times_daily" | "3x_daily" => Some(Frequency::ThriceDaily),
            "every_x_hours" | "interval" => Some(Frequency::EveryXHours),
            _ => None,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Frequency::OnceDaily => "Once Daily",
            Frequency::TwiceDaily => "Twice Daily",
            Frequency::ThriceDaily => "Thrice Daily",
            Frequency::EveryXHours => "Every X Hours",
        }
    }
}

/// Point of the day for once-daily medicines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Timing {
    Morning,
    Afternoon,
    Night,
    SpecificTime,
}

impl Timing {
    pub fn as_str(&self) -> &'static str {
        match self {
            Timing::Morning => "morning",
            Timing::Afternoon => "afternoon",
            Timing::Night => "night",
            Timing::SpecificTime => "specific_time",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().replace([' ', '-'], "_").as_str() {
            "morning" | "breakfast" => Some(Timing::Morning),
            "afternoon" | "lunch" | "noon" => Some(Timing::Afternoon),
            "night" | "evening" | "dinner" => Some(Timing::Night),
            "specific_time" | "specific" | "custom" => Some(Timing::SpecificTime),
            _ => None,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Timing::Morning => "Morning",
            Timing::Afternoon => "Afternoon",
            Timing::Night => "Night",
            Timing::SpecificTime => "Specific Time",
        }
    }
}

/// Dose placement relative to a meal (or bedtime)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WhenToTake {
    BeforeMeals,
    AfterMeals,
    XMinutesBeforeMeals,
    XMinutesAfterMeals,
    AtBedtime,
}

impl WhenToTake {
    pub fn as_str(&self) -> &'static str {
        match self {
            WhenToTake::BeforeMeals => "before_meals",
            WhenToTake::AfterMeals => "after_meals",
            WhenToTake::XMinutesBeforeMeals => "x_minutes_before_meals",
            WhenToTake::XMinutesAfterMeals => "x_minutes_after_meals",
            WhenToTake::AtBedtime => "at_bedtime",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().replace([' ', '-'], "_").as_str() {
            "before_meals" | "before_meal" | "before" => Some(WhenToTake::BeforeMeals),
            "after_meals" | "after_meal" | "after" => Some(WhenToTake::AfterMeals),
            "x_minutes_before_meals" | "minutes_before" => Some(WhenToTake::XMinutesBeforeMeals),
            "x_minutes_after_meals" | "minutes_after" => Some(WhenToTake::XMinutesAfterMeals),
            "at_bedtime" | "bedtime" => Some(WhenToTake::AtBedtime),
            _ => None,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            WhenToTake::BeforeMeals => "Before Meals",
            WhenToTake::AfterMeals => "After Meals",
            WhenToTake::XMinutesBeforeMeals => "X Minutes Before Meals",
            WhenToTake::XMinutesAfterMeals => "X Minutes After Meals",
            WhenToTake::AtBedtime => "At Bedtime",
        }
    }

    /// Whether this variant needs an explicit `x_minutes` offset
    pub fn needs_minutes(&self) -> bool {
        matches!(self, WhenToTake::XMinutesBeforeMeals | WhenToTake::XMinutesAfterMeals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_accepts_display_names() {
        assert_eq!(Frequency::parse("Every X Hours"), Some(Frequency::EveryXHours));
        assert_eq!(Timing::parse("Specific Time"), Some(Timing::SpecificTime));
        assert_eq!(
            WhenToTake::parse("X Minutes Before Meals"),
            Some(WhenToTake::XMinutesBeforeMeals)
        );
    }

    #[test]
    fn test_parse_rejects_unknown() {
        assert_eq!(Frequency::parse("weekly"), None);
        assert_eq!(Timing::parse(""), None);
        assert_eq!(WhenToTake::parse("whenever"), None);
    }

    #[test]
    fn test_as_str_parses_back() {
        for f in [Frequency::OnceDaily, Frequency::TwiceDaily, Frequency::ThriceDaily, Frequency::EveryXHours] {
            assert_eq!(Frequency::parse(f.as_str()), Some(f));
        }
        for w in [
            WhenToTake::BeforeMeals,
            WhenToTake::AfterMeals,
            WhenToTake::XMinutesBeforeMeals,
            WhenToTake::XMinutesAfterMeals,
            WhenToTake::AtBedtime,
        ] {
            assert_eq!(WhenToTake::parse(w.as_str()), Some(w));
        }
    }
}
