//! Collaborator interfaces
//!
//! The engine never touches hardware. Sampling, drawing, beeping, storage,
//! radio and the GSM modem are all behind these traits, implemented on the
//! board by drivers and on the host by `hazardwatch-connectors` or test doubles.
//!
//! Output calls return [`SinkResult`]. A failed call is reported and then
//! forgotten; no sink is retried within the same cycle.

use crate::buzzer::BuzzerPattern;
use crate::errors::SinkResult;
use crate::overlay::OverlayBanner;
use crate::reading::Readings;
use crate::records::{AlertRecord, Payload, SnapshotRecord};
use crate::screen::DisplayLine;
use crate::time::Timestamp;

/// Produces one reading per channel per cycle
pub trait SensorSampler {
    /// Sample every channel. Unreachable sensors come back with `valid = false`.
    fn read_all(&mut self, now: Timestamp) -> Readings;
}

/// Local status screen
pub trait Display {
    /// Draw the status lines, with the alert banner on top when present
    fn render(&mut self, lines: &[DisplayLine], overlay: Option<&OverlayBanner>) -> SinkResult;
}

/// Audible alarm
pub trait Buzzer {
    /// Start `pattern`, replacing any pattern still playing. Must not block.
    fn play(&mut self, pattern: BuzzerPattern) -> SinkResult;

    /// Advance a running pattern. Called once per engine tick.
    fn tick(&mut self, _now: Timestamp) {}
}

/// Persistent alert and snapshot log
pub trait EventLog {
    fn append_event(&mut self, record: &AlertRecord<'_>) -> SinkResult;

    fn append_snapshot(&mut self, record: &SnapshotRecord) -> SinkResult;

    /// Feed every stored line, oldest first, to `visit`
    fn replay(&mut self, visit: &mut dyn FnMut(&str)) -> SinkResult;
}

/// Outbound notifications and command responses
pub trait NetworkNotifier {
    fn publish(&mut self, payload: &Payload<'_>) -> SinkResult;
}

/// Out-of-band channel for critical alerts
///
/// On the board this is the GSM modem: an SMS with the last GPS fix, then a
/// short voice call. Only [`Severity::Critical`](crate::Severity::Critical)
/// events reach it.
pub trait EmergencyNotifier {
    fn escalate(&mut self, record: &AlertRecord<'_>) -> SinkResult;

    /// `false` skips escalation without counting it as a failure
    fn is_enabled(&self) -> bool {
        true
    }

    /// Advance a call in progress. Called once per engine tick.
    fn tick(&mut self, _now: Timestamp) {}
}

/// Node without an emergency channel
#[derive(Debug, Clone, Copy, Default)]
pub struct NoEmergency;

impl EmergencyNotifier for NoEmergency {
    fn escalate(&mut self, _record: &AlertRecord<'_>) -> SinkResult {
        Ok(())
    }

    fn is_enabled(&self) -> bool {
        false
    }
}

/// The output sinks the engine fans out to
#[derive(Debug)]
pub struct Sinks<D, B, L, N, E = NoEmergency> {
    pub display: D,
    pub buzzer: B,
    pub log: L,
    pub network: N,
    pub emergency: E,
}

impl<D, B, L, N> Sinks<D, B, L, N>
where
    D: Display,
    B: Buzzer,
    L: EventLog,
    N: NetworkNotifier,
{
    pub fn new(display: D, buzzer: B, log: L, network: N) -> Self {
        Self { display, buzzer, log, network, emergency: NoEmergency }
    }
}

impl<D, B, L, N, E> Sinks<D, B, L, N, E> {
    /// Attach an emergency channel, replacing the current one
    pub fn with_emergency<E2: EmergencyNotifier>(self, emergency: E2) -> Sinks<D, B, L, N, E2> {
        Sinks { display: self.display, buzzer: self.buzzer, log: self.log, network: self.network, emergency }
    }
}
