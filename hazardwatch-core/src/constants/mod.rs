//! Calibration Constants for HazardWatch
//!
//! All numeric defaults live here with a note on where they come from.
//! [`AlertConfig`](crate::config::AlertConfig) starts from these values and
//! deployments override them per board.
//!
//! ## Organization
//!
//! - **Thresholds**: raw sensor limits that turn a reading into a candidate
//! - **Timing**: cooldowns, overlay duration, loop cadences
//! - **Buzzer**: pulse patterns per severity
//!
//! ## Usage Guidelines
//!
//! 1. Always use these constants instead of magic numbers
//! 2. Include units in the name
//! 3. Note the wiring or datasheet the value was tuned against

/// Raw sensor limits for alert evaluation.
pub mod thresholds;

/// Cooldowns, overlay duration and loop cadences.
pub mod timing;

/// Buzzer pulse patterns.
pub mod buzzer;

pub use thresholds::{
    FLOOD_LIMIT_RAW, SOIL_DISCONNECT_FLOOR_RAW, GAS_LIMIT_RAW,
    TEMP_HIGH_C, HUMIDITY_HIGH_PCT, MOTION_THRESHOLD, MOTION_SUSTAIN_MS,
};

pub use timing::{
    ALERT_COOLDOWN_MS, OVERLAY_DURATION_MS, SAMPLE_INTERVAL_MS,
    DISPLAY_REFRESH_MS, SNAPSHOT_INTERVAL_MS,
};
