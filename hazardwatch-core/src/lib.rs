//! Alert engine for HazardWatch disaster monitors
//!
//! Samples soil, gas, temperature/humidity, motion, tilt and GPS on a small
//! controller and turns readings into flood, fire, earthquake, gas, tilt and
//! heat alerts on a display, buzzer, persistent log and radio link.
//!
//! Key constraints:
//! - Runs on an ESP32-class board with a single cooperative loop
//! - No heap allocation in the hot path
//! - No sink failure may stall sampling
//!
//! ```no_run
//! use hazardwatch_core::prelude::*;
//!
//! let mut evaluator = ThresholdEvaluator::default();
//! let candidates = evaluator.evaluate(&[SensorReading::soil(1200.0, 0)], false);
//! assert_eq!(candidates[0].kind(), AlertKind::Flood);
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod alert;
pub mod buzzer;
pub mod command;
pub mod config;
pub mod constants;
pub mod dispatch;
pub mod engine;
pub mod errors;
pub mod evaluator;
pub mod limiter;
pub mod motion;
pub mod overlay;
pub mod reading;
pub mod records;
pub mod screen;
pub mod sinks;
pub mod time;

// Public API
pub use alert::{AlertBuilder, AlertEvent, AlertKind, Severity};
pub use command::Command;
pub use config::AlertConfig;
pub use engine::{CycleReport, Engine};
pub use errors::{ConfigError, ReadingError, SinkError, SinkResult};
pub use reading::{Channel, Readings, SensorReading};

/// Everything needed to wire up an engine
pub mod prelude {
    pub use crate::alert::{AlertBuilder, AlertEvent, AlertKind, Severity};
    pub use crate::buzzer::{BuzzerPattern, BuzzerPin, ScheduledBuzzer, ToneScheduler};
    pub use crate::command::Command;
    pub use crate::config::AlertConfig;
    pub use crate::dispatch::{AlertDispatcher, DispatchResult};
    pub use crate::engine::{CycleReport, Engine};
    pub use crate::errors::{ConfigError, ReadingError, SinkError, SinkResult};
    pub use crate::evaluator::{ChannelStatus, ThresholdEvaluator};
    pub use crate::limiter::{AlertRateLimiter, DebounceTable};
    pub use crate::motion::MotionDebouncer;
    pub use crate::overlay::OverlayTimer;
    pub use crate::reading::{Channel, Readings, SensorReading};
    pub use crate::sinks::{
        Buzzer, Display, EmergencyNotifier, EventLog, NetworkNotifier, NoEmergency, SensorSampler, Sinks,
    };
    #[cfg(feature = "std")]
    pub use crate::time::{MonotonicClock, SystemClock};
    pub use crate::time::{IntervalGate, MockTimeSource, TimeSource, Timestamp, WallClock, WallClockAnchor};
}

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
