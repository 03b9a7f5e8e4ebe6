//! Multi-sink alert dispatch
//!
//! ## Overview
//!
//! One admitted event fans out to every output:
//!
//! ```text
//!                ┌─→ EventLog::append_event       (logged)
//!                ├─→ NetworkNotifier::publish     (transmitted)
//!                ├─→ EmergencyNotifier::escalate  (escalated, critical only)
//! AlertEvent ────┼─→ Buzzer::play                 (buzzed)
//!                ├─→ OverlayTimer::show           (always)
//!                └─→ Display::render              (displayed)
//! ```
//!
//! Each sink is attempted exactly once, in that order, regardless of what the
//! others did. A failure clears only that sink's flag in [`DispatchResult`]
//! and is logged at `warn`. The overlay is updated even when the display
//! fails, so the banner appears on the next successful refresh.
//!
//! Storage goes first: if the loop dies mid-dispatch the record is already
//! on the card.
//!
//! Escalation is only attempted for critical events and only when the
//! emergency channel is enabled. `escalated` stays `None` otherwise, and
//! [`DispatchResult::all_delivered`] ignores it.
//!
//! Once a wall-clock anchor is set, every record carries `unix_ms`.

use crate::alert::{AlertEvent, Severity};
use crate::buzzer::BuzzerPattern;
use crate::config::BuzzerConfig;
use crate::errors::SinkResult;
use crate::overlay::OverlayTimer;
use crate::records::{AlertRecord, Payload};
use crate::screen::DisplayLine;
use crate::sinks::{Buzzer, Display, EmergencyNotifier, EventLog, NetworkNotifier, Sinks};
use crate::time::{Timestamp, WallClockAnchor};

/// Which sinks accepted an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DispatchResult {
    pub displayed: bool,
    pub buzzed: bool,
    pub logged: bool,
    pub transmitted: bool,
    /// `None` when escalation was not attempted
    pub escalated: Option<bool>,
}

impl DispatchResult {
    pub fn all_delivered(&self) -> bool {
        self.displayed && self.buzzed && self.logged && self.transmitted && self.escalated != Some(false)
    }
}

/// Fans admitted events out to the sinks
#[derive(Debug, Clone, Default)]
pub struct AlertDispatcher {
    buzzer: BuzzerConfig,
    wall_clock: Option<WallClockAnchor>,
}

impl AlertDispatcher {
    pub fn new(buzzer: BuzzerConfig) -> Self {
        Self { buzzer, wall_clock: None }
    }

    /// Stamp records with calendar time from now on
    pub fn set_wall_clock(&mut self, anchor: WallClockAnchor) {
        self.wall_clock = Some(anchor);
    }

    pub fn wall_clock(&self) -> Option<WallClockAnchor> {
        self.wall_clock
    }

    /// Calendar time of `t`, if a wall clock has been synced
    pub fn unix_ms_at(&self, t: Timestamp) -> Option<u64> {
        self.wall_clock.map(|anchor| anchor.unix_ms_at(t))
    }

    pub fn pattern_for(&self, severity: Severity) -> BuzzerPattern {
        self.buzzer.for_severity(severity)
    }

    /// Deliver `event` to every sink. `lines` is the status text drawn under the banner.
    pub fn dispatch<D, B, L, N, E>(
        &self,
        event: &AlertEvent,
        overlay: &mut OverlayTimer,
        sinks: &mut Sinks<D, B, L, N, E>,
        lines: &[DisplayLine],
        now: Timestamp,
    ) -> DispatchResult
    where
        D: Display,
        B: Buzzer,
        L: EventLog,
        N: NetworkNotifier,
        E: EmergencyNotifier,
    {
        let record = AlertRecord::from_event(event).with_unix_ms(self.unix_ms_at(event.triggered_at()));
        let logged = delivered("log", sinks.log.append_event(&record));
        let transmitted = delivered("network", sinks.network.publish(&Payload::Alert(record.clone())));
        let escalated = (event.severity() == Severity::Critical && sinks.emergency.is_enabled())
            .then(|| delivered("emergency", sinks.emergency.escalate(&record)));
        let buzzed = delivered("buzzer", sinks.buzzer.play(self.pattern_for(event.severity())));

        overlay.show(event.clone(), now);
        let banner = overlay.banner(now);
        let displayed = delivered("display", sinks.display.render(lines, banner.as_ref()));

        let result = DispatchResult { displayed, buzzed, logged, transmitted, escalated };
        if result.all_delivered() {
            log::info!("{} alert ({}) delivered: {}", event.kind(), event.severity(), event.message());
        } else {
            log::info!("{} alert ({}) partially delivered: {:?}", event.kind(), event.severity(), result);
        }
        result
    }
}

/// Log a sink failure and reduce it to a flag
pub(crate) fn delivered(sink: &str, result: SinkResult) -> bool {
    match result {
        Ok(()) => true,
        Err(err) => {
            log::warn!("{} sink failed: {}", sink, err);
            false
        }
    }
}
