//! Alert Events
//!
//! ## Overview
//!
//! An [`AlertEvent`] is what threshold evaluation produces for one channel in
//! one cycle. It starts life as a *candidate*; if the rate limiter lets it
//! through it becomes an *admitted event* and is dispatched to every sink.
//!
//! ```text
//! ThresholdEvaluator → candidate → AlertRateLimiter → admitted → AlertDispatcher
//!                                        ↓
//!                                    suppressed (dropped)
//! ```
//!
//! Events are immutable once built. Fields are private and only readable
//! through accessors; [`AlertBuilder`] is the only way to make one.
//!
//! ### Memory Model
//!
//! No heap: the message is a `heapless::String<48>` and the diagnostic
//! context is a `LinearMap` of up to 8 `&'static str → f32` pairs. Longer
//! messages are truncated on a character boundary.

use core::fmt;

use heapless::{LinearMap, String};
use serde::{Deserialize, Serialize};

use crate::time::Timestamp;

/// Maximum message length in bytes
pub const MAX_MESSAGE_LEN: usize = 48;

/// Maximum diagnostic context entries. Room for every channel value of one
/// cycle (soil, gas, temp, hum, ax, ay, az, tilt, lat, lng) plus two spare.
pub const MAX_CONTEXT: usize = 12;

/// Short alert text
pub type Message = String<MAX_MESSAGE_LEN>;

/// Diagnostic key → raw value at trigger time
pub type ContextMap = LinearMap<&'static str, f32, MAX_CONTEXT>;

/// Kind of disaster an alert reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum AlertKind {
    Flood = 0,
    Fire = 1,
    Earthquake = 2,
    Gas = 3,
    Tilt = 4,
    TempHumidity = 5,
}

impl AlertKind {
    /// Number of alert kinds
    pub const COUNT: usize = 6;

    pub const ALL: [AlertKind; Self::COUNT] = [
        AlertKind::Flood,
        AlertKind::Fire,
        AlertKind::Earthquake,
        AlertKind::Gas,
        AlertKind::Tilt,
        AlertKind::TempHumidity,
    ];

    pub const fn index(self) -> usize {
        self as usize
    }

    /// Short upper-case label for banners and log lines
    pub const fn label(&self) -> &'static str {
        match self {
            AlertKind::Flood => "FLOOD",
            AlertKind::Fire => "FIRE",
            AlertKind::Earthquake => "EARTHQUAKE",
            AlertKind::Gas => "GAS",
            AlertKind::Tilt => "TILT",
            AlertKind::TempHumidity => "TEMP/HUM",
        }
    }
}

impl fmt::Display for AlertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Alert severity, drives the buzzer pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Warning,
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => f.write_str("WARNING"),
            Severity::Critical => f.write_str("CRITICAL"),
        }
    }
}

/// A qualifying event from threshold evaluation
#[derive(Debug, Clone, PartialEq)]
pub struct AlertEvent {
    kind: AlertKind,
    severity: Severity,
    message: Message,
    context: ContextMap,
    triggered_at: Timestamp,
}

impl AlertEvent {
    pub fn kind(&self) -> AlertKind {
        self.kind
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn message(&self) -> &str {
        self.message.as_str()
    }

    pub fn context(&self) -> &ContextMap {
        &self.context
    }

    /// Context value by key
    pub fn context_value(&self, key: &str) -> Option<f32> {
        self.context.iter().find(|(k, _)| **k == key).map(|(_, v)| *v)
    }

    pub fn triggered_at(&self) -> Timestamp {
        self.triggered_at
    }
}

/// Builder for [`AlertEvent`]
pub struct AlertBuilder {
    kind: AlertKind,
    severity: Severity,
    message: Message,
    context: ContextMap,
    triggered_at: Timestamp,
}

impl AlertBuilder {
    /// Start an event of `kind`, warning severity, empty message
    pub fn new(kind: AlertKind, triggered_at: Timestamp) -> Self {
        Self {
            kind,
            severity: Severity::Warning,
            message: Message::new(),
            context: ContextMap::new(),
            triggered_at,
        }
    }

    pub fn severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    /// Set the message, truncated to [`MAX_MESSAGE_LEN`] bytes
    pub fn message(mut self, text: &str) -> Self {
        self.message = truncate(text);
        self
    }

    /// Attach a diagnostic value. Entries past [`MAX_CONTEXT`] are dropped.
    pub fn context(mut self, key: &'static str, value: f32) -> Self {
        if self.context.insert(key, value).is_err() {
            log::debug!("{} alert context full, dropped {}", self.kind, key);
        }
        self
    }

    pub fn build(self) -> AlertEvent {
        AlertEvent {
            kind: self.kind,
            severity: self.severity,
            message: self.message,
            context: self.context,
            triggered_at: self.triggered_at,
        }
    }
}

/// Copy as much of `text` as fits, never splitting a character
pub(crate) fn truncate<const N: usize>(text: &str) -> String<N> {
    let mut out = String::new();
    for ch in text.chars() {
        if out.push(ch).is_err() {
            break;
        }
    }
    out
}

#[cfg(feature = "defmt")]
impl defmt::Format for AlertKind {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "{=str}", self.label())
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Severity {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Severity::Warning => defmt::write!(fmt, "WARNING"),
            Severity::Critical => defmt::write!(fmt, "CRITICAL"),
        }
    }
}
