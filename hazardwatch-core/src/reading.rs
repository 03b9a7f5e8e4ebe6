//! Sensor Readings
//!
//! ## Overview
//!
//! The sampler hands the engine one [`SensorReading`] per channel per cycle.
//! A reading is a small map of named float fields plus a validity flag:
//!
//! ```text
//! Soil          {"value"}
//! Gas           {"value"}
//! TempHumidity  {"temp", "hum"}
//! Accel         {"x", "y", "z"}
//! Tilt          {"state"}          1.0 = pin high, 0.0 = pin low
//! Gps           {"lat", "lng"}
//! ```
//!
//! Readings are owned by the current loop iteration. The only value carried
//! across cycles is the previous accelerometer sample, and that lives in the
//! [`MotionDebouncer`](crate::motion::MotionDebouncer), not here.
//!
//! ## Validity
//!
//! The sampler declares `valid = false` for a disconnected sensor. A declared
//! valid reading can still be unusable if the field a rule needs is missing or
//! NaN (DHT22 returns NaN on a checksum failure). [`SensorReading::require`]
//! folds all three cases into a [`ReadingError`].

use heapless::{LinearMap, Vec};
use serde::{Deserialize, Serialize};

use crate::errors::ReadingError;
use crate::time::Timestamp;

/// Maximum named fields per reading
pub const MAX_FIELDS: usize = 4;

/// Number of sensor channels
pub const MAX_CHANNELS: usize = 6;

/// Field name, always one of the constants in [`field`]
pub type FieldName = &'static str;

/// Named float fields of one reading
pub type FieldMap = LinearMap<FieldName, f32, MAX_FIELDS>;

/// One cycle's worth of readings
pub type Readings = Vec<SensorReading, MAX_CHANNELS>;

/// Field names used by the built-in channels
pub mod field {
    pub const VALUE: &str = "value";
    pub const TEMP: &str = "temp";
    pub const HUM: &str = "hum";
    pub const X: &str = "x";
    pub const Y: &str = "y";
    pub const Z: &str = "z";
    pub const STATE: &str = "state";
    pub const LAT: &str = "lat";
    pub const LNG: &str = "lng";
}

/// Physical or logical sensor input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum Channel {
    Soil = 0,
    Gas = 1,
    TempHumidity = 2,
    Accel = 3,
    Tilt = 4,
    Gps = 5,
}

impl Channel {
    /// All channels in display order
    pub const ALL: [Channel; MAX_CHANNELS] = [
        Channel::Soil,
        Channel::Gas,
        Channel::TempHumidity,
        Channel::Accel,
        Channel::Tilt,
        Channel::Gps,
    ];

    /// Get human-readable name
    pub const fn name(&self) -> &'static str {
        match self {
            Channel::Soil => "soil",
            Channel::Gas => "gas",
            Channel::TempHumidity => "temp_humidity",
            Channel::Accel => "accel",
            Channel::Tilt => "tilt",
            Channel::Gps => "gps",
        }
    }

    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Snapshot of one channel at one instant
#[derive(Debug, Clone, PartialEq)]
pub struct SensorReading {
    pub channel: Channel,
    pub values: FieldMap,
    pub valid: bool,
    pub timestamp: Timestamp,
}

impl SensorReading {
    /// Empty valid reading, fill with [`with`](Self::with)
    pub fn new(channel: Channel, timestamp: Timestamp) -> Self {
        Self { channel, values: FieldMap::new(), valid: true, timestamp }
    }

    /// Reading for a sensor the sampler could not reach
    pub fn disconnected(channel: Channel, timestamp: Timestamp) -> Self {
        Self { channel, values: FieldMap::new(), valid: false, timestamp }
    }

    /// Add a field. Extra fields past [`MAX_FIELDS`] are dropped.
    pub fn with(mut self, name: FieldName, value: f32) -> Self {
        if self.values.insert(name, value).is_err() {
            log::debug!("{} reading dropped field {}", self.channel.name(), name);
        }
        self
    }

    pub fn soil(raw: f32, timestamp: Timestamp) -> Self {
        Self::new(Channel::Soil, timestamp).with(field::VALUE, raw)
    }

    pub fn gas(raw: f32, timestamp: Timestamp) -> Self {
        Self::new(Channel::Gas, timestamp).with(field::VALUE, raw)
    }

    pub fn temp_humidity(temp_c: f32, humidity_pct: f32, timestamp: Timestamp) -> Self {
        Self::new(Channel::TempHumidity, timestamp)
            .with(field::TEMP, temp_c)
            .with(field::HUM, humidity_pct)
    }

    pub fn accel(x: f32, y: f32, z: f32, timestamp: Timestamp) -> Self {
        Self::new(Channel::Accel, timestamp)
            .with(field::X, x)
            .with(field::Y, y)
            .with(field::Z, z)
    }

    /// Digital tilt switch, `high` is the raw pin level
    pub fn tilt(high: bool, timestamp: Timestamp) -> Self {
        Self::new(Channel::Tilt, timestamp).with(field::STATE, if high { 1.0 } else { 0.0 })
    }

    pub fn gps(lat: f32, lng: f32, timestamp: Timestamp) -> Self {
        Self::new(Channel::Gps, timestamp)
            .with(field::LAT, lat)
            .with(field::LNG, lng)
    }

    /// Raw field value, no validity check
    pub fn field(&self, name: FieldName) -> Option<f32> {
        self.values.get(&name).copied()
    }

    /// Field value usable for alert evaluation
    pub fn require(&self, name: FieldName) -> Result<f32, ReadingError> {
        if !self.valid {
            return Err(ReadingError::Disconnected);
        }
        let value = self.field(name).ok_or(ReadingError::MissingField)?;
        if !value.is_finite() {
            return Err(ReadingError::NotANumber);
        }
        Ok(value)
    }

    /// Usable value or `None`, for display and snapshots
    pub fn usable(&self, name: FieldName) -> Option<f32> {
        self.require(name).ok()
    }
}

/// First reading for `channel` in a cycle's readings
pub fn reading_for(readings: &[SensorReading], channel: Channel) -> Option<&SensorReading> {
    readings.iter().find(|r| r.channel == channel)
}

#[cfg(feature = "defmt")]
impl defmt::Format for Channel {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "{=str}", self.name())
    }
}
