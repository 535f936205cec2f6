//! Utility module for MBMP
//!
//! This module provides common utilities used throughout the application:
//! - Error handling with custom error types
//! - Settings persistence
//! - Time formatting and conversion helpers

pub mod config;
pub mod error;

// Re-export commonly used items
pub use config::{ElementGeometry, PlaylistState, Settings, StartOptions};
pub use error::{MbmpError, Result};

/// Nanoseconds per second, the engine's time base
pub const NSECONDS_PER_SECOND: u64 = 1_000_000_000;

/// Load the persisted settings
///
/// Loads settings from:
/// 1. Default values
/// 2. User settings file
/// 3. Environment variables
pub fn load_settings() -> Result<Settings> {
    Settings::load()
}

/// Format a number of seconds as a clock string
///
/// # Arguments
///
/// * `seconds` - Whole seconds to format
///
/// # Returns
///
/// Formatted string, always in the form "HH:MM:SS"
pub fn format_clock(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;

    format!("{:02}:{:02}:{:02}", hours, minutes, secs)
}

/// Convert whole seconds to engine nanoseconds
pub fn seconds_to_nanos(seconds: u64) -> u64 {
    seconds.saturating_mul(NSECONDS_PER_SECOND)
}

/// Convert engine nanoseconds to whole seconds, truncating
pub fn nanos_to_seconds(nanos: u64) -> u64 {
    nanos / NSECONDS_PER_SECOND
}

/// Clamp a value between min and max
///
/// # Arguments
///
/// * `value` - Value to clamp
/// * `min` - Minimum value
/// * `max` - Maximum value
///
/// # Returns
///
/// The clamped value
pub fn clamp<T: PartialOrd>(value: T, min: T, max: T) -> T {
    if value < min {
        min
    } else if value > max {
        max
    } else {
        value
    }
}
