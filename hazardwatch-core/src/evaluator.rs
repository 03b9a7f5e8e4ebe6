//! Threshold Evaluation
//!
//! ## Overview
//!
//! Turns one cycle of readings into candidate [`AlertEvent`]s, at most one
//! per channel:
//!
//! | Channel      | Trips when                                 | Alert type          |
//! |--------------|--------------------------------------------|---------------------|
//! | Soil         | `disconnect_floor < value < flood_limit`   | Flood               |
//! | Gas          | `value > gas_limit`                        | Fire or Gas         |
//! | Accel        | sustained motion reported by the debouncer | Earthquake          |
//! | Tilt         | switch at its active level (or edge)       | Tilt                |
//! | TempHumidity | `temp > temp_high` or `hum > hum_high`     | TempHumidity        |
//! | Gps          | never                                      |                     |
//!
//! Every candidate carries the raw readings of the cycle that raised it as
//! context, keyed `soil`, `gas`, `temp`, `hum`, `ax`, `ay`, `az`, `tilt`,
//! `lat` and `lng`. Unusable channels are left out; `lat`/`lng` only appear
//! as a pair.
//!
//! ## Invalid Readings
//!
//! A reading that is disconnected, missing a field or NaN never produces a
//! candidate and classifies as [`ChannelStatus::Unknown`]. Temperature and
//! humidity come from the same sensor, so a NaN in either suppresses the whole
//! channel. Soil at or below the disconnect floor is a missing sensor and is
//! also unknown rather than "very wet".

use heapless::Vec;

use crate::alert::{AlertBuilder, AlertEvent, AlertKind, ContextMap};
use crate::config::{AlertConfig, GasAlertLabel, SeverityConfig, ThresholdConfig, TiltConfig, TiltTrigger};
use crate::errors::ReadingError;
use crate::reading::{field, reading_for, Channel, SensorReading};

/// Candidates from one evaluation pass
pub type Candidates = Vec<AlertEvent, { AlertKind::COUNT }>;

/// Display classification of one channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelStatus {
    Normal,
    Alert,
    /// Reading unusable. Never shown as safe.
    Unknown,
}

/// Applies the alert rules to a cycle's readings
#[derive(Debug, Clone)]
pub struct ThresholdEvaluator {
    thresholds: ThresholdConfig,
    tilt: TiltConfig,
    gas_label: GasAlertLabel,
    severity: SeverityConfig,
    last_tilt_tripped: bool,
}

impl Default for ThresholdEvaluator {
    fn default() -> Self {
        Self::new(&AlertConfig::default())
    }
}

impl ThresholdEvaluator {
    pub fn new(config: &AlertConfig) -> Self {
        Self {
            thresholds: config.thresholds,
            tilt: config.tilt,
            gas_label: config.gas_label,
            severity: config.severity,
            last_tilt_tripped: false,
        }
    }

    /// Evaluate readings, `motion_active` is the debouncer output for this cycle
    pub fn evaluate(&mut self, readings: &[SensorReading], motion_active: bool) -> Candidates {
        let cycle = self.cycle_context(readings);
        let mut candidates = Candidates::new();

        for reading in readings {
            let tripped = match self.trips(reading, motion_active) {
                Ok(tripped) => tripped,
                Err(err) => {
                    log::trace!("{} skipped: {}", reading.channel.name(), err);
                    continue;
                }
            };

            let fires = if reading.channel == Channel::Tilt {
                let rising = tripped && !self.last_tilt_tripped;
                self.last_tilt_tripped = tripped;
                match self.tilt.trigger {
                    TiltTrigger::Level => tripped,
                    TiltTrigger::Edge => rising,
                }
            } else {
                tripped
            };
            if !fires {
                continue;
            }

            let Some(event) = self.candidate(reading, &cycle) else {
                continue;
            };
            if candidates.iter().any(|c| c.kind() == event.kind()) {
                continue;
            }
            log::debug!("candidate {} from {}", event.kind(), reading.channel.name());
            if candidates.push(event).is_err() {
                break;
            }
        }

        candidates
    }

    /// Level classification for display, no edge tracking
    pub fn classify(&self, reading: &SensorReading, motion_active: bool) -> ChannelStatus {
        match self.trips(reading, motion_active) {
            Ok(true) => ChannelStatus::Alert,
            Ok(false) => ChannelStatus::Normal,
            Err(_) => ChannelStatus::Unknown,
        }
    }

    fn trips(&self, reading: &SensorReading, motion_active: bool) -> Result<bool, ReadingError> {
        let t = &self.thresholds;
        match reading.channel {
            Channel::Soil => {
                let soil = reading.require(field::VALUE)?;
                if soil <= t.soil_disconnect_floor {
                    return Err(ReadingError::Disconnected);
                }
                Ok(soil < t.flood_limit)
            }
            Channel::Gas => Ok(reading.require(field::VALUE)? > t.gas_limit),
            Channel::TempHumidity => {
                let temp = reading.require(field::TEMP)?;
                let hum = reading.require(field::HUM)?;
                Ok(temp > t.temp_high_c || hum > t.humidity_high_pct)
            }
            Channel::Accel => {
                reading.require(field::X)?;
                reading.require(field::Y)?;
                Ok(motion_active)
            }
            Channel::Tilt => {
                let pin_high = reading.require(field::STATE)? >= 0.5;
                Ok(self.tilt.is_tripped(pin_high))
            }
            Channel::Gps => {
                reading.require(field::LAT)?;
                reading.require(field::LNG)?;
                Ok(false)
            }
        }
    }

    /// Usable values of every channel in `readings`, as alert context
    pub fn cycle_context(&self, readings: &[SensorReading]) -> ContextMap {
        let mut context = ContextMap::new();
        let mut put = |key: &'static str, value: Option<f32>| {
            if let Some(value) = value {
                // Ten keys at most, below capacity
                let _ = context.insert(key, value);
            }
        };
        let value = |channel: Channel, name: &'static str| {
            reading_for(readings, channel).and_then(|r| r.usable(name))
        };

        put("soil", value(Channel::Soil, field::VALUE).filter(|&v| v > self.thresholds.soil_disconnect_floor));
        put("gas", value(Channel::Gas, field::VALUE));
        put("temp", value(Channel::TempHumidity, field::TEMP));
        put("hum", value(Channel::TempHumidity, field::HUM));
        put("ax", value(Channel::Accel, field::X));
        put("ay", value(Channel::Accel, field::Y));
        put("az", value(Channel::Accel, field::Z));
        put("tilt", value(Channel::Tilt, field::STATE));
        if let Some((lat, lng)) = gps_fix(readings) {
            put("lat", Some(lat));
            put("lng", Some(lng));
        }
        context
    }

    fn candidate(&self, reading: &SensorReading, cycle: &ContextMap) -> Option<AlertEvent> {
        let at = reading.timestamp;
        let builder = match reading.channel {
            Channel::Soil => self
                .builder(AlertKind::Flood, at)
                .message("FLOOD DETECTED!")
                .context("soil", reading.field(field::VALUE)?),
            Channel::Gas => {
                let kind = self.gas_label.kind();
                let message = match self.gas_label {
                    GasAlertLabel::Fire => "FIRE ALERT!",
                    GasAlertLabel::Gas => "Smoke/Gas detected",
                };
                self.builder(kind, at)
                    .message(message)
                    .context("gas", reading.field(field::VALUE)?)
            }
            Channel::TempHumidity => self
                .builder(AlertKind::TempHumidity, at)
                .message("Temperature/Humidity high")
                .context("temp", reading.field(field::TEMP)?)
                .context("hum", reading.field(field::HUM)?),
            Channel::Accel => {
                let mut builder = self
                    .builder(AlertKind::Earthquake, at)
                    .message("EARTHQUAKE!")
                    .context("ax", reading.field(field::X)?)
                    .context("ay", reading.field(field::Y)?);
                if let Some(z) = reading.usable(field::Z) {
                    builder = builder.context("az", z);
                }
                builder
            }
            Channel::Tilt => self
                .builder(AlertKind::Tilt, at)
                .message("Tilt/Vibration detected")
                .context("tilt", reading.field(field::STATE)?),
            Channel::Gps => return None,
        };

        let builder = cycle.iter().fold(builder, |builder, (key, value)| builder.context(*key, *value));
        Some(builder.build())
    }

    fn builder(&self, kind: AlertKind, at: u64) -> AlertBuilder {
        AlertBuilder::new(kind, at).severity(self.severity.for_kind(kind))
    }
}

/// Valid `(lat, lng)` if the cycle has a GPS fix
pub fn gps_fix(readings: &[SensorReading]) -> Option<(f32, f32)> {
    let gps = reading_for(readings, Channel::Gps)?;
    Some((gps.usable(field::LAT)?, gps.usable(field::LNG)?))
}
