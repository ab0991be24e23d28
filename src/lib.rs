//! Medicine Reminder (medrem) Library
//!
//! Core functionality for medication courses, dose adherence and inventory
//! tracking.

pub mod book;
pub mod build_info;
pub mod config;
pub mod db;
pub mod dosing;
pub mod mcp;
pub mod models;
pub mod notify;
pub mod tools;
