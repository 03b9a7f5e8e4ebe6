//! Error Types for Sensor and Sink Failures
//!
//! ## Design Philosophy
//!
//! Nothing in the alert engine is allowed to stop the sampling loop. Every
//! failure is local to one channel or one output sink, so errors here are
//! small `Copy` values that callers inspect and then drop:
//!
//! 1. **SensorInvalid** ([`ReadingError`]): a disconnected or NaN sensor
//!    suppresses evaluation for that channel only. The display shows the
//!    channel as unknown.
//!
//! 2. **SinkUnavailable** ([`SinkError`]): a display, buzzer, log or network
//!    call failed. Only that sink's flag in the dispatch result is cleared.
//!
//! 3. **No escalation**: there is no fatal error path. The loop keeps running
//!    and recovers as soon as the sensor or sink comes back.
//!
//! [`ConfigError`] is the one error that is returned to the caller, and only
//! at startup when an [`AlertConfig`](crate::config::AlertConfig) is rejected.
//!
//! ## Memory Layout
//!
//! ```text
//! SinkError    = 1 byte  (fieldless)
//! ReadingError = 1 byte  (fieldless)
//! ConfigError  = 24 bytes (&'static str + discriminant)
//! ```

use thiserror_no_std::Error;

/// Result type for collaborator calls
pub type SinkResult = Result<(), SinkError>;

/// Failure reported by an output collaborator
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkError {
    /// Sink is not connected or not mounted (no SD card, link down)
    #[error("sink unavailable")]
    Unavailable,

    /// Sink is up but refused the data (queue full, payload too large)
    #[error("sink rejected the record")]
    Rejected,

    /// Sink did not complete within its own timeout
    #[error("sink timed out")]
    Timeout,

    /// Persistent storage failed while writing or reading
    #[error("storage failure")]
    Storage,
}

/// Why a reading could not be used for alert evaluation
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadingError {
    /// Sampler flagged the sensor as disconnected
    #[error("sensor disconnected")]
    Disconnected,

    /// Field present but NaN or infinite
    #[error("reading is not a number")]
    NotANumber,

    /// Sampler did not provide the field the rule needs
    #[error("reading is missing a required field")]
    MissingField,
}

/// Rejected configuration value
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// A duration that must be positive was zero
    #[error("{field} must be greater than zero")]
    ZeroDuration {
        /// Name of the offending setting
        field: &'static str,
    },

    /// A threshold was NaN, infinite or negative where that makes no sense
    #[error("{field} is not a usable threshold")]
    InvalidThreshold {
        /// Name of the offending setting
        field: &'static str,
    },

    /// Disconnect floor must sit below the flood limit
    #[error("soil disconnect floor must be below the flood limit")]
    InvertedSoilRange,
}

#[cfg(feature = "defmt")]
impl defmt::Format for SinkError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::Unavailable => defmt::write!(fmt, "sink unavailable"),
            Self::Rejected => defmt::write!(fmt, "sink rejected"),
            Self::Timeout => defmt::write!(fmt, "sink timeout"),
            Self::Storage => defmt::write!(fmt, "storage failure"),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for ReadingError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::Disconnected => defmt::write!(fmt, "disconnected"),
            Self::NotANumber => defmt::write!(fmt, "NaN"),
            Self::MissingField => defmt::write!(fmt, "missing field"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_stay_small() {
        assert_eq!(core::mem::size_of::<SinkError>(), 1);
        assert_eq!(core::mem::size_of::<ReadingError>(), 1);
    }
}
