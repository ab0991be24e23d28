//! Profile MCP Tools
//!
//! The single user profile. Meal times and bedtime anchor every dose time,
//! so nothing is scheduled at a clock time until a profile exists.

use serde::Serialize;

use super::{book_error, parse_time};
use crate::book::CourseBook;
use crate::dosing::format_hhmm;
use crate::models::UserProfile;

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub name: String,
    pub age: u32,
    pub gender: String,
    pub medical_conditions: Vec<String>,
    pub breakfast_time: String,
    pub lunch_time: String,
    pub dinner_time: String,
    pub bedtime: String,
}

impl From<&UserProfile> for ProfileResponse {
    fn from(p: &UserProfile) -> Self {
        Self {
            name: p.name.clone(),
            age: p.age,
            gender: p.gender.clone(),
            medical_conditions: p.medical_conditions.clone(),
            breakfast_time: format_hhmm(p.breakfast_time),
            lunch_time: format_hhmm(p.lunch_time),
            dinner_time: format_hhmm(p.dinner_time),
            bedtime: format_hhmm(p.bedtime),
        }
    }
}

/// Input for set_profile; times are HH:MM
#[derive(Debug, Clone)]
pub struct ProfileInput<'a> {
    pub name: &'a str,
    pub age: u32,
    pub gender: &'a str,
    pub medical_conditions: Vec<String>,
    pub breakfast_time: &'a str,
    pub lunch_time: &'a str,
    pub dinner_time: &'a str,
    pub bedtime: &'a str,
}

impl ProfileInput<'_> {
    fn into_profile(self) -> Result<UserProfile, String> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err("Profile name cannot be empty".to_string());
        }
        Ok(UserProfile {
            name: name.to_string(),
            age: self.age,
            gender: self.gender.trim().to_string(),
            medical_conditions: self
                .medical_conditions
                .into_iter()
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty())
                .collect(),
            breakfast_time: parse_time(self.breakfast_time)?,
            lunch_time: parse_time(self.lunch_time)?,
            dinner_time: parse_time(self.dinner_time)?,
            bedtime: parse_time(self.bedtime)?,
        })
    }
}

// ============================================================================
// Tool Functions
// ============================================================================

pub fn get_profile(book: &CourseBook) -> Result<Option<ProfileResponse>, String> {
    let profile = book.profile().map_err(book_error)?;
    Ok(profile.as_ref().map(ProfileResponse::from))
}

/// Create or replace the profile
pub fn set_profile(book: &CourseBook, input: ProfileInput<'_>) -> Result<ProfileResponse, String> {
    let profile = input.into_profile()?;
    book.save_profile(&profile).map_err(book_error)?;
    Ok(ProfileResponse::from(&profile))
}
