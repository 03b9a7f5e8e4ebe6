//! Timing Constants
//!
//! All values in milliseconds of monotonic time.

// ===== ALERT BEHAVIOR =====

/// Minimum gap between two admitted alerts of the same type.
pub const ALERT_COOLDOWN_MS: u64 = 5000;

/// How long the alert banner stays on the display after an admitted alert.
pub const OVERLAY_DURATION_MS: u64 = 6000;

// ===== LOOP CADENCE =====

/// Minimum interval between sensor sampling passes.
///
/// 10 Hz keeps the motion integrator responsive without starving the
/// display and radio.
pub const SAMPLE_INTERVAL_MS: u64 = 100;

/// Minimum interval between full display refreshes.
///
/// SSD1306 redraw over I2C takes ~25 ms; refreshing faster wastes loop time.
pub const DISPLAY_REFRESH_MS: u64 = 1500;

/// Minimum interval between periodic snapshot log records.
pub const SNAPSHOT_INTERVAL_MS: u64 = 5000;
