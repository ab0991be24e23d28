//! Utility to set the user profile in the database
//!
//! Usage: set_profile <name> <age> <gender> <breakfast> <lunch> <dinner> <bedtime> [condition...]
//! Times are HH:MM.

use medrem::config::Config;
use medrem::db::{CourseStore, Database};
use medrem::dosing::{format_hhmm, parse_hhmm};
use medrem::models::UserProfile;

const USAGE: &str =
    "usage: set_profile <name> <age> <gender> <breakfast> <lunch> <dinner> <bedtime> [condition...]";

fn time_arg(label: &str, raw: &str) -> Result<chrono::NaiveTime, String> {
    parse_hhmm(raw).ok_or_else(|| format!("{} must be HH:MM, got '{}'", label, raw))
}

fn parse_args(args: &[String]) -> Result<UserProfile, String> {
    let [name, age, gender, breakfast, lunch, dinner, bedtime, conditions @ ..] = args else {
        return Err(USAGE.to_string());
    };
    Ok(UserProfile {
        name: name.clone(),
        age: age
            .parse()
            .map_err(|_| format!("age must be a whole number, got '{}'", age))?,
        gender: gender.clone(),
        medical_conditions: conditions.to_vec(),
        breakfast_time: time_arg("breakfast", breakfast)?,
        lunch_time: time_arg("lunch", lunch)?,
        dinner_time: time_arg("dinner", dinner)?,
        bedtime: time_arg("bedtime", bedtime)?,
    })
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let profile = parse_args(&args)?;

    let config = Config::from_env()?;
    let db_path = config.database_path;
    println!("Database path: {}", db_path.display());
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let database = Database::new(&db_path)?;
    database.migrate()?;
    database.save_user_profile(&profile)?;

    println!("Profile set:");
    println!("  Name: {}", profile.name);
    println!("  Age: {}", profile.age);
    println!(
        "  Meals: {} / {} / {}",
        format_hhmm(profile.breakfast_time),
        format_hhmm(profile.lunch_time),
        format_hhmm(profile.dinner_time)
    );
    println!("  Bedtime: {}", format_hhmm(profile.bedtime));
    if !profile.medical_conditions.is_empty() {
        println!("  Conditions: {}", profile.medical_conditions.join(", "));
    }

    Ok(())
}
