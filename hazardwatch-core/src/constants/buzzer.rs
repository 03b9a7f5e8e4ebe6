//! Buzzer Patterns
//!
//! Pattern length scales with severity so a warning is a chirp and a
//! critical alert is hard to miss.

// ===== WARNING =====

/// Number of pulses for a warning alert.
pub const WARNING_PULSES: u8 = 1;

/// On time per warning pulse (ms).
pub const WARNING_ON_MS: u32 = 120;

/// Off time after each warning pulse (ms).
pub const WARNING_OFF_MS: u32 = 0;

// ===== CRITICAL =====

/// Number of pulses for a critical alert.
pub const CRITICAL_PULSES: u8 = 3;

/// On time per critical pulse (ms).
pub const CRITICAL_ON_MS: u32 = 400;

/// Off time between critical pulses (ms).
pub const CRITICAL_OFF_MS: u32 = 200;
