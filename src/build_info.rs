//! Build stamp
//!
//! `build.rs` stamps each compile with a counter, a timestamp and the cargo
//! profile. Missing or garbled values fall back to `0` / `"unknown"` so a
//! plain `rustc` build still starts.

use std::fmt;

use serde::Serialize;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

const UNKNOWN: &str = "unknown";

/// Where and when this binary came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildStamp {
    pub version: &'static str,
    pub build_number: u64,
    pub build_timestamp: &'static str,
    pub build_profile: &'static str,
}

impl BuildStamp {
    /// The stamp compiled into this binary
    pub fn embedded() -> Self {
        Self::from_env_values(
            option_env!("MEDREM_BUILD_NUMBER"),
            option_env!("MEDREM_BUILD_TIMESTAMP"),
            option_env!("MEDREM_BUILD_PROFILE"),
        )
    }

    fn from_env_values(
        number: Option<&'static str>,
        timestamp: Option<&'static str>,
        profile: Option<&'static str>,
    ) -> Self {
        Self {
            version: VERSION,
            build_number: number.and_then(|n| n.trim().parse().ok()).unwrap_or(0),
            build_timestamp: timestamp.filter(|t| !t.is_empty()).unwrap_or(UNKNOWN),
            build_profile: profile.filter(|p| !p.is_empty()).unwrap_or(UNKNOWN),
        }
    }

    pub fn is_release(&self) -> bool {
        self.build_profile == "release"
    }
}

impl fmt::Display for BuildStamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "v{} build #{} ({}, {})",
            self.version, self.build_number, self.build_profile, self.build_timestamp
        )
    }
}

/// Startup banner; stdout belongs to the MCP transport so this goes to stderr
pub fn print_startup_banner() {
    let stamp = BuildStamp::embedded();
    eprintln!("medrem {}", stamp);
    if !stamp.is_release() {
        eprintln!("medrem: not a release build");
    }
}
