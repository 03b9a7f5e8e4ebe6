//! Sensor Thresholds
//!
//! Raw values are 12-bit ADC counts (0-4095) from the ESP32 analog inputs
//! unless a unit is given in the name.

// ===== SOIL MOISTURE (FLOOD) =====

/// Soil reading below this is treated as waterlogged ground (raw ADC).
///
/// Capacitive soil sensors read lower as moisture rises, so flood is a
/// low-value condition.
///
/// Source: field calibration on the hill-station board
pub const FLOOD_LIMIT_RAW: f32 = 1500.0;

/// Soil reading at or below this means the sensor is unplugged (raw ADC).
///
/// A floating analog pin settles near zero. Without this floor a missing
/// sensor would look like the wettest possible soil.
pub const SOIL_DISCONNECT_FLOOR_RAW: f32 = 10.0;

// ===== GAS / SMOKE =====

/// MQ-2 reading above this is treated as smoke or combustible gas (raw ADC).
///
/// Source: MQ-2 bench test after 24h burn-in
pub const GAS_LIMIT_RAW: f32 = 2500.0;

// ===== TEMPERATURE / HUMIDITY =====

/// Air temperature above this raises a temperature/humidity alert (°C).
///
/// Source: DHT22 deployment limits
pub const TEMP_HIGH_C: f32 = 45.0;

/// Relative humidity above this raises a temperature/humidity alert (%RH).
pub const HUMIDITY_HIGH_PCT: f32 = 85.0;

// ===== MOTION (EARTHQUAKE) =====

/// Per-axis change between consecutive samples that counts as motion (m/s²).
///
/// Raised from 1.5 so handling the enclosure does not register.
///
/// Source: MPU6050 at ±4g range, 21 Hz filter bandwidth
pub const MOTION_THRESHOLD: f32 = 2.5;

/// Motion must stay above threshold this long to count as sustained (ms).
///
/// Lowered from 2000 ms to shorten detection latency.
pub const MOTION_SUSTAIN_MS: u64 = 1200;
