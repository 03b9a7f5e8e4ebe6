//! Engine Configuration
//!
//! [`AlertConfig`] groups every tunable the engine reads. Defaults come from
//! [`crate::constants`]; a deployment overrides only what differs on its
//! board, either with the `with_*` builders or by deserializing a partial
//! document (every struct is `#[serde(default)]`).
//!
//! ```rust
//! use hazardwatch_core::config::{AlertConfig, GasAlertLabel, TiltConfig};
//!
//! let config = AlertConfig::default()
//!     .with_gas_label(GasAlertLabel::Gas)
//!     .with_tilt(TiltConfig::default().with_active_high(false))
//!     .with_cooldown_ms(3000);
//!
//! assert!(config.validate().is_ok());
//! ```
//!
//! Source boards disagreed on tilt polarity and on whether a gas trip means
//! fire or a gas leak. Both are configuration here, with the hill-station
//! wiring as the default.

use serde::Deserialize;

use crate::alert::{AlertKind, Severity};
use crate::buzzer::BuzzerPattern;
use crate::constants::{buzzer, thresholds, timing};
use crate::errors::ConfigError;

/// Sustained-motion detector settings
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct MotionConfig {
    /// Per-axis delta that counts as motion (m/s²)
    pub threshold: f32,
    /// How long motion must persist before it is reported (ms)
    pub sustain_ms: u64,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            threshold: thresholds::MOTION_THRESHOLD,
            sustain_ms: thresholds::MOTION_SUSTAIN_MS,
        }
    }
}

/// Raw limits for the analog channels
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct ThresholdConfig {
    /// Soil below this is a flood (raw ADC)
    pub flood_limit: f32,
    /// Soil at or below this is a missing sensor (raw ADC)
    pub soil_disconnect_floor: f32,
    /// Gas above this trips (raw ADC)
    pub gas_limit: f32,
    /// Temperature above this trips (°C)
    pub temp_high_c: f32,
    /// Humidity above this trips (%RH)
    pub humidity_high_pct: f32,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            flood_limit: thresholds::FLOOD_LIMIT_RAW,
            soil_disconnect_floor: thresholds::SOIL_DISCONNECT_FLOOR_RAW,
            gas_limit: thresholds::GAS_LIMIT_RAW,
            temp_high_c: thresholds::TEMP_HIGH_C,
            humidity_high_pct: thresholds::HUMIDITY_HIGH_PCT,
        }
    }
}

/// When a tilt switch produces a candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TiltTrigger {
    /// Every cycle the switch sits at its active level
    Level,
    /// Only the cycle the switch moves to its active level
    Edge,
}

/// Tilt switch wiring
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TiltConfig {
    /// `true` if the pin reads high when tilted
    pub active_high: bool,
    pub trigger: TiltTrigger,
}

impl Default for TiltConfig {
    fn default() -> Self {
        Self { active_high: true, trigger: TiltTrigger::Level }
    }
}

impl TiltConfig {
    pub fn with_active_high(mut self, active_high: bool) -> Self {
        self.active_high = active_high;
        self
    }

    pub fn with_trigger(mut self, trigger: TiltTrigger) -> Self {
        self.trigger = trigger;
        self
    }

    /// Whether a raw pin level means tilted
    pub fn is_tripped(&self, pin_high: bool) -> bool {
        pin_high == self.active_high
    }
}

/// Alert type raised when the gas channel trips
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GasAlertLabel {
    Fire,
    Gas,
}

impl Default for GasAlertLabel {
    fn default() -> Self {
        GasAlertLabel::Fire
    }
}

impl GasAlertLabel {
    pub fn kind(self) -> AlertKind {
        match self {
            GasAlertLabel::Fire => AlertKind::Fire,
            GasAlertLabel::Gas => AlertKind::Gas,
        }
    }
}

/// Severity per alert type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SeverityConfig {
    pub flood: Severity,
    pub fire: Severity,
    pub earthquake: Severity,
    pub gas: Severity,
    pub tilt: Severity,
    pub temp_humidity: Severity,
}

impl Default for SeverityConfig {
    fn default() -> Self {
        Self {
            flood: Severity::Critical,
            fire: Severity::Critical,
            earthquake: Severity::Critical,
            gas: Severity::Warning,
            tilt: Severity::Warning,
            temp_humidity: Severity::Warning,
        }
    }
}

impl SeverityConfig {
    pub fn for_kind(&self, kind: AlertKind) -> Severity {
        match kind {
            AlertKind::Flood => self.flood,
            AlertKind::Fire => self.fire,
            AlertKind::Earthquake => self.earthquake,
            AlertKind::Gas => self.gas,
            AlertKind::Tilt => self.tilt,
            AlertKind::TempHumidity => self.temp_humidity,
        }
    }
}

/// Rate-limit cooldowns, one default with optional per-type overrides
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CooldownConfig {
    pub default_ms: u64,
    pub flood_ms: Option<u64>,
    pub fire_ms: Option<u64>,
    pub earthquake_ms: Option<u64>,
    pub gas_ms: Option<u64>,
    pub tilt_ms: Option<u64>,
    pub temp_humidity_ms: Option<u64>,
}

impl Default for CooldownConfig {
    fn default() -> Self {
        Self {
            default_ms: timing::ALERT_COOLDOWN_MS,
            flood_ms: None,
            fire_ms: None,
            earthquake_ms: None,
            gas_ms: None,
            tilt_ms: None,
            temp_humidity_ms: None,
        }
    }
}

impl CooldownConfig {
    fn override_for(&self, kind: AlertKind) -> Option<u64> {
        match kind {
            AlertKind::Flood => self.flood_ms,
            AlertKind::Fire => self.fire_ms,
            AlertKind::Earthquake => self.earthquake_ms,
            AlertKind::Gas => self.gas_ms,
            AlertKind::Tilt => self.tilt_ms,
            AlertKind::TempHumidity => self.temp_humidity_ms,
        }
    }

    /// Effective cooldown for `kind`
    pub fn for_kind(&self, kind: AlertKind) -> u64 {
        self.override_for(kind).unwrap_or(self.default_ms)
    }

    /// Override the cooldown of one type
    pub fn with_override(mut self, kind: AlertKind, cooldown_ms: u64) -> Self {
        let slot = match kind {
            AlertKind::Flood => &mut self.flood_ms,
            AlertKind::Fire => &mut self.fire_ms,
            AlertKind::Earthquake => &mut self.earthquake_ms,
            AlertKind::Gas => &mut self.gas_ms,
            AlertKind::Tilt => &mut self.tilt_ms,
            AlertKind::TempHumidity => &mut self.temp_humidity_ms,
        };
        *slot = Some(cooldown_ms);
        self
    }
}

/// Overlay duration and loop cadences (ms)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    pub overlay_ms: u64,
    pub sample_interval_ms: u64,
    pub display_refresh_ms: u64,
    pub snapshot_interval_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            overlay_ms: timing::OVERLAY_DURATION_MS,
            sample_interval_ms: timing::SAMPLE_INTERVAL_MS,
            display_refresh_ms: timing::DISPLAY_REFRESH_MS,
            snapshot_interval_ms: timing::SNAPSHOT_INTERVAL_MS,
        }
    }
}

/// Buzzer pattern per severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BuzzerConfig {
    pub warning: BuzzerPattern,
    pub critical: BuzzerPattern,
}

impl Default for BuzzerConfig {
    fn default() -> Self {
        Self {
            warning: BuzzerPattern::new(buzzer::WARNING_PULSES, buzzer::WARNING_ON_MS, buzzer::WARNING_OFF_MS),
            critical: BuzzerPattern::new(buzzer::CRITICAL_PULSES, buzzer::CRITICAL_ON_MS, buzzer::CRITICAL_OFF_MS),
        }
    }
}

impl BuzzerConfig {
    pub fn for_severity(&self, severity: Severity) -> BuzzerPattern {
        match severity {
            Severity::Warning => self.warning,
            Severity::Critical => self.critical,
        }
    }
}

/// Everything the engine is configured with
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct AlertConfig {
    pub motion: MotionConfig,
    pub thresholds: ThresholdConfig,
    pub tilt: TiltConfig,
    pub gas_label: GasAlertLabel,
    pub severity: SeverityConfig,
    pub cooldown: CooldownConfig,
    pub timing: TimingConfig,
    pub buzzer: BuzzerConfig,
}

impl AlertConfig {
    pub fn with_motion(mut self, motion: MotionConfig) -> Self {
        self.motion = motion;
        self
    }

    pub fn with_thresholds(mut self, thresholds: ThresholdConfig) -> Self {
        self.thresholds = thresholds;
        self
    }

    pub fn with_tilt(mut self, tilt: TiltConfig) -> Self {
        self.tilt = tilt;
        self
    }

    pub fn with_gas_label(mut self, label: GasAlertLabel) -> Self {
        self.gas_label = label;
        self
    }

    pub fn with_severity(mut self, severity: SeverityConfig) -> Self {
        self.severity = severity;
        self
    }

    /// Set the default cooldown for every type without an override
    pub fn with_cooldown_ms(mut self, cooldown_ms: u64) -> Self {
        self.cooldown.default_ms = cooldown_ms;
        self
    }

    pub fn with_cooldowns(mut self, cooldown: CooldownConfig) -> Self {
        self.cooldown = cooldown;
        self
    }

    pub fn with_timing(mut self, timing: TimingConfig) -> Self {
        self.timing = timing;
        self
    }

    pub fn with_buzzer(mut self, buzzer: BuzzerConfig) -> Self {
        self.buzzer = buzzer;
        self
    }

    /// Reject settings the engine cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        let t = &self.thresholds;
        check_threshold("thresholds.flood_limit", t.flood_limit)?;
        check_threshold("thresholds.soil_disconnect_floor", t.soil_disconnect_floor)?;
        check_threshold("thresholds.gas_limit", t.gas_limit)?;
        check_threshold("thresholds.temp_high_c", t.temp_high_c)?;
        check_threshold("thresholds.humidity_high_pct", t.humidity_high_pct)?;
        if t.soil_disconnect_floor >= t.flood_limit {
            return Err(ConfigError::InvertedSoilRange);
        }

        if !self.motion.threshold.is_finite() || self.motion.threshold < 0.0 {
            return Err(ConfigError::InvalidThreshold { field: "motion.threshold" });
        }
        check_duration("motion.sustain_ms", self.motion.sustain_ms)?;

        check_duration("cooldown.default_ms", self.cooldown.default_ms)?;
        for kind in AlertKind::ALL {
            if self.cooldown.override_for(kind) == Some(0) {
                return Err(ConfigError::ZeroDuration { field: "cooldown override" });
            }
        }

        check_duration("timing.overlay_ms", self.timing.overlay_ms)?;
        check_duration("timing.sample_interval_ms", self.timing.sample_interval_ms)?;
        check_duration("timing.display_refresh_ms", self.timing.display_refresh_ms)?;
        check_duration("timing.snapshot_interval_ms", self.timing.snapshot_interval_ms)?;

        if self.buzzer.warning.pulses > 0 && self.buzzer.warning.on_ms == 0 {
            return Err(ConfigError::ZeroDuration { field: "buzzer.warning.on_ms" });
        }
        if self.buzzer.critical.pulses > 0 && self.buzzer.critical.on_ms == 0 {
            return Err(ConfigError::ZeroDuration { field: "buzzer.critical.on_ms" });
        }
        Ok(())
    }
}

fn check_duration(field: &'static str, value: u64) -> Result<(), ConfigError> {
    if value == 0 {
        return Err(ConfigError::ZeroDuration { field });
    }
    Ok(())
}

// Raw ADC counts, °C and %RH limits are all non-negative on these sensors
fn check_threshold(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if !value.is_finite() || value < 0.0 {
        return Err(ConfigError::InvalidThreshold { field });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_constants() {
        let config = AlertConfig::default();
        assert_eq!(config.thresholds.flood_limit, 1500.0);
        assert_eq!(config.thresholds.gas_limit, 2500.0);
        assert_eq!(config.motion.threshold, 2.5);
        assert_eq!(config.motion.sustain_ms, 1200);
        assert_eq!(config.timing.overlay_ms, 6000);
        assert_eq!(config.gas_label.kind(), AlertKind::Fire);
        assert!(config.tilt.active_high);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn severity_table_defaults() {
        let severity = SeverityConfig::default();
        assert_eq!(severity.for_kind(AlertKind::Flood), Severity::Critical);
        assert_eq!(severity.for_kind(AlertKind::Fire), Severity::Critical);
        assert_eq!(severity.for_kind(AlertKind::Earthquake), Severity::Critical);
        assert_eq!(severity.for_kind(AlertKind::Gas), Severity::Warning);
        assert_eq!(severity.for_kind(AlertKind::Tilt), Severity::Warning);
        assert_eq!(severity.for_kind(AlertKind::TempHumidity), Severity::Warning);
    }

    #[test]
    fn cooldown_overrides_fall_back_to_default() {
        let cooldown = CooldownConfig::default().with_override(AlertKind::Tilt, 20_000);
        assert_eq!(cooldown.for_kind(AlertKind::Tilt), 20_000);
        assert_eq!(cooldown.for_kind(AlertKind::Flood), 5000);
    }

    #[test]
    fn tilt_polarity() {
        let high = TiltConfig::default();
        assert!(high.is_tripped(true));
        assert!(!high.is_tripped(false));

        let low = high.with_active_high(false);
        assert!(low.is_tripped(false));
    }

    #[test]
    fn validate_rejects_bad_values() {
        let zero_overlay = AlertConfig::default().with_timing(TimingConfig {
            overlay_ms: 0,
            ..TimingConfig::default()
        });
        assert_eq!(
            zero_overlay.validate(),
            Err(ConfigError::ZeroDuration { field: "timing.overlay_ms" })
        );

        let inverted = AlertConfig::default().with_thresholds(ThresholdConfig {
            soil_disconnect_floor: 2000.0,
            ..ThresholdConfig::default()
        });
        assert_eq!(inverted.validate(), Err(ConfigError::InvertedSoilRange));

        let nan_gas = AlertConfig::default().with_thresholds(ThresholdConfig {
            gas_limit: f32::NAN,
            ..ThresholdConfig::default()
        });
        assert_eq!(
            nan_gas.validate(),
            Err(ConfigError::InvalidThreshold { field: "thresholds.gas_limit" })
        );

        let zero_override = AlertConfig::default()
            .with_cooldowns(CooldownConfig::default().with_override(AlertKind::Gas, 0));
        assert!(zero_override.validate().is_err());
    }
}
