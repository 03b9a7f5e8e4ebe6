//! The alert engine
//!
//! ## Overview
//!
//! [`Engine`] owns every piece of alert state and the output sinks. The
//! board's main loop calls [`Engine::tick`] as often as it likes; the engine
//! decides what is due:
//!
//! ```text
//! tick(now)
//!   ├─ sample gate (100 ms)   → read_all → process → CycleReport
//!   ├─ display gate (1500 ms) → render status lines (+ banner)
//!   ├─ snapshot gate (5000 ms)→ append_snapshot
//!   └─ buzzer.tick, emergency.tick  every call
//! ```
//!
//! `process` is the pipeline proper and can be driven directly with recorded
//! readings:
//!
//! ```text
//! readings → MotionDebouncer → ThresholdEvaluator → AlertRateLimiter → AlertDispatcher
//! ```
//!
//! ## Ownership
//!
//! No globals and no locks. Everything is borrowed from `self` for the
//! duration of one call, and a slow sink only delays the loop.
//!
//! A calendar clock is optional. [`Engine::sync_wall_clock`] reads it once
//! and pins it to the monotonic clock; records are stamped from that anchor.
//!
//! ```rust
//! use hazardwatch_core::prelude::*;
//! # use hazardwatch_core::records::{AlertRecord, Payload, SnapshotRecord};
//! # use hazardwatch_core::screen::DisplayLine;
//! # use hazardwatch_core::overlay::OverlayBanner;
//! # struct Null;
//! # impl Display for Null { fn render(&mut self, _: &[DisplayLine], _: Option<&OverlayBanner>) -> SinkResult { Ok(()) } }
//! # impl Buzzer for Null { fn play(&mut self, _: BuzzerPattern) -> SinkResult { Ok(()) } }
//! # impl EventLog for Null {
//! #     fn append_event(&mut self, _: &AlertRecord<'_>) -> SinkResult { Ok(()) }
//! #     fn append_snapshot(&mut self, _: &SnapshotRecord) -> SinkResult { Ok(()) }
//! #     fn replay(&mut self, _: &mut dyn FnMut(&str)) -> SinkResult { Ok(()) }
//! # }
//! # impl NetworkNotifier for Null { fn publish(&mut self, _: &Payload<'_>) -> SinkResult { Ok(()) } }
//! let sinks = Sinks::new(Null, Null, Null, Null);
//! let mut engine = Engine::new(AlertConfig::default(), sinks).unwrap();
//!
//! let mut readings = Readings::new();
//! readings.push(SensorReading::soil(1200.0, 0)).unwrap();
//! let report = engine.process(readings, 0);
//! assert_eq!(report.admitted_kinds().next(), Some(AlertKind::Flood));
//! ```

use heapless::Vec;

use crate::alert::AlertKind;
use crate::command::Command;
use crate::config::AlertConfig;
use crate::dispatch::{delivered, AlertDispatcher, DispatchResult};
use crate::errors::ConfigError;
use crate::evaluator::{ChannelStatus, ThresholdEvaluator};
use crate::limiter::{AlertRateLimiter, DebounceTable};
use crate::motion::MotionDebouncer;
use crate::overlay::OverlayTimer;
use crate::reading::{field, reading_for, Channel, Readings, MAX_CHANNELS};
use crate::records::{Payload, SnapshotRecord, StatusReport};
use crate::screen::{status_lines, DisplayLines};
use crate::sinks::{Buzzer, Display, EmergencyNotifier, EventLog, NetworkNotifier, NoEmergency, SensorSampler, Sinks};
use crate::time::{IntervalGate, Timestamp, WallClock, WallClockAnchor};

/// Alert kinds collected during one cycle
pub type KindList = Vec<AlertKind, { AlertKind::COUNT }>;

/// What one pass of the pipeline did
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CycleReport {
    /// Every candidate the evaluator produced
    pub candidates: KindList,
    /// Admitted candidates with their per-sink outcome
    pub admitted: Vec<(AlertKind, DispatchResult), { AlertKind::COUNT }>,
    /// Candidates dropped by the cooldown
    pub suppressed: KindList,
}

impl CycleReport {
    pub fn admitted_kinds(&self) -> impl Iterator<Item = AlertKind> + '_ {
        self.admitted.iter().map(|(kind, _)| *kind)
    }

    pub fn dispatch_result(&self, kind: AlertKind) -> Option<DispatchResult> {
        self.admitted.iter().find(|(k, _)| *k == kind).map(|(_, result)| *result)
    }

    pub fn is_quiet(&self) -> bool {
        self.candidates.is_empty()
    }
}

/// Single owner of alert state and sinks
pub struct Engine<D, B, L, N, E = NoEmergency> {
    config: AlertConfig,
    motion: MotionDebouncer,
    motion_active: bool,
    evaluator: ThresholdEvaluator,
    limiter: AlertRateLimiter,
    debounce: DebounceTable,
    dispatcher: AlertDispatcher,
    overlay: OverlayTimer,
    sinks: Sinks<D, B, L, N, E>,
    latest: Readings,
    unknown: [bool; MAX_CHANNELS],
    sample_gate: IntervalGate,
    display_gate: IntervalGate,
    snapshot_gate: IntervalGate,
}

impl<D, B, L, N, E> Engine<D, B, L, N, E>
where
    D: Display,
    B: Buzzer,
    L: EventLog,
    N: NetworkNotifier,
    E: EmergencyNotifier,
{
    /// Build an engine, rejecting an unusable configuration
    pub fn new(config: AlertConfig, sinks: Sinks<D, B, L, N, E>) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            motion: MotionDebouncer::new(config.motion),
            motion_active: false,
            evaluator: ThresholdEvaluator::new(&config),
            limiter: AlertRateLimiter::new(),
            debounce: DebounceTable::new(&config.cooldown),
            dispatcher: AlertDispatcher::new(config.buzzer),
            overlay: OverlayTimer::new(config.timing.overlay_ms),
            sinks,
            latest: Readings::new(),
            unknown: [false; MAX_CHANNELS],
            sample_gate: IntervalGate::new(config.timing.sample_interval_ms),
            display_gate: IntervalGate::new(config.timing.display_refresh_ms),
            snapshot_gate: IntervalGate::new(config.timing.snapshot_interval_ms),
            config,
        })
    }

    /// One loop iteration. Returns a report when a sample was taken.
    pub fn tick<S: SensorSampler>(&mut self, sampler: &mut S, now: Timestamp) -> Option<CycleReport> {
        let report = if self.sample_gate.ready(now) {
            let readings = sampler.read_all(now);
            Some(self.process(readings, now))
        } else {
            None
        };

        if self.display_gate.ready(now) {
            self.refresh_display(now);
        }

        if self.snapshot_gate.ready(now) && !self.latest.is_empty() {
            let snapshot = SnapshotRecord {
                unix_ms: self.dispatcher.unix_ms_at(now),
                ..SnapshotRecord::from_readings(&self.latest, now)
            };
            delivered("log", self.sinks.log.append_snapshot(&snapshot));
        }

        self.sinks.buzzer.tick(now);
        self.sinks.emergency.tick(now);
        report
    }

    /// Read `clock` once and stamp records with calendar time from now on.
    /// Returns `false`, keeping any earlier anchor, if the clock is not set.
    pub fn sync_wall_clock<C: WallClock + ?Sized>(&mut self, clock: &C, now: Timestamp) -> bool {
        match WallClockAnchor::capture(clock, now) {
            Some(anchor) => {
                log::info!("wall clock synced at t={}", now);
                self.dispatcher.set_wall_clock(anchor);
                true
            }
            None => {
                log::warn!("wall clock not set; records keep monotonic time only");
                false
            }
        }
    }

    pub fn wall_clock(&self) -> Option<WallClockAnchor> {
        self.dispatcher.wall_clock()
    }

    /// Run one cycle of readings through the pipeline
    pub fn process(&mut self, readings: Readings, now: Timestamp) -> CycleReport {
        if let Some(accel) = reading_for(&readings, Channel::Accel) {
            // Unusable samples leave the debouncer untouched
            if let (Ok(x), Ok(y)) = (accel.require(field::X), accel.require(field::Y)) {
                self.motion_active = self.motion.update(x, y, now);
            }
        }

        let candidates = self.evaluator.evaluate(&readings, self.motion_active);
        self.latest = readings;
        self.track_validity();

        let mut report = CycleReport::default();
        if candidates.is_empty() {
            return report;
        }

        let lines = self.display_lines();
        for candidate in &candidates {
            let _ = report.candidates.push(candidate.kind());
            if self.limiter.admit(candidate, &mut self.debounce, now) {
                let result = self.dispatcher.dispatch(candidate, &mut self.overlay, &mut self.sinks, &lines, now);
                let _ = report.admitted.push((candidate.kind(), result));
            } else {
                let _ = report.suppressed.push(candidate.kind());
            }
        }
        report
    }

    /// Answer an inbound command. Returns `false` if any response failed to send.
    pub fn handle_command(&mut self, command: Command, now: Timestamp) -> bool {
        log::info!("command {}", command);
        match command {
            Command::Ping => delivered("network", self.sinks.network.publish(&Payload::Pong)),
            Command::Status => {
                let report = self.status_report(now);
                delivered("network", self.sinks.network.publish(&Payload::Status(report)))
            }
            Command::GetAnalytics => self.replay_log(),
        }
    }

    /// Parse and answer a raw command line. Unknown lines are ignored.
    pub fn handle_line(&mut self, line: &str, now: Timestamp) -> Option<Command> {
        let command = Command::parse(line);
        match command {
            Some(command) => {
                self.handle_command(command, now);
            }
            None => log::debug!("ignored command line {:?}", line.trim()),
        }
        command
    }

    fn replay_log(&mut self) -> bool {
        let Sinks { log: event_log, network, .. } = &mut self.sinks;
        let mut ok = delivered("network", network.publish(&Payload::AnalyticsBegin));

        let mut lines = 0u32;
        let mut failed = 0u32;
        let replay = event_log.replay(&mut |line: &str| {
            lines += 1;
            if network.publish(&Payload::AnalyticsLine { line }).is_err() {
                failed += 1;
            }
        });
        if failed > 0 {
            log::warn!("{} of {} log lines not sent", failed, lines);
            ok = false;
        }

        match replay {
            Ok(()) => {
                log::info!("replayed {} log lines", lines);
                delivered("network", network.publish(&Payload::AnalyticsEnd)) && ok
            }
            Err(err) => {
                log::warn!("log replay failed: {}", err);
                delivered("network", network.publish(&Payload::AnalyticsUnavailable));
                false
            }
        }
    }

    fn refresh_display(&mut self, now: Timestamp) {
        let lines = self.display_lines();
        let banner = self.overlay.banner(now);
        delivered("display", self.sinks.display.render(&lines, banner.as_ref()));
    }

    fn track_validity(&mut self) {
        for channel in Channel::ALL {
            let unknown = match reading_for(&self.latest, channel) {
                Some(reading) => self.evaluator.classify(reading, self.motion_active) == ChannelStatus::Unknown,
                None => true,
            };
            let was_unknown = &mut self.unknown[channel.index()];
            if unknown && !*was_unknown {
                log::warn!("{} reading unusable", channel.name());
            } else if !unknown && *was_unknown {
                log::info!("{} reading recovered", channel.name());
            }
            *was_unknown = unknown;
        }
    }

    /// Status lines for the latest readings
    pub fn display_lines(&self) -> DisplayLines {
        status_lines(&self.latest, &self.evaluator, self.motion_active)
    }

    pub fn status_report(&self, now: Timestamp) -> StatusReport {
        let overlay = self.overlay.banner(now).map(|banner| banner.kind);
        StatusReport::build(&self.latest, &self.evaluator, self.motion_active, overlay, now)
    }

    /// Dismiss the alert banner
    pub fn acknowledge(&mut self) {
        self.overlay.acknowledge();
    }

    pub fn config(&self) -> &AlertConfig {
        &self.config
    }

    pub fn overlay(&self) -> &OverlayTimer {
        &self.overlay
    }

    pub fn debounce_table(&self) -> &DebounceTable {
        &self.debounce
    }

    pub fn limiter(&self) -> &AlertRateLimiter {
        &self.limiter
    }

    pub fn motion(&self) -> &MotionDebouncer {
        &self.motion
    }

    pub fn motion_active(&self) -> bool {
        self.motion_active
    }

    pub fn latest_readings(&self) -> &Readings {
        &self.latest
    }

    pub fn sinks(&self) -> &Sinks<D, B, L, N, E> {
        &self.sinks
    }

    pub fn sinks_mut(&mut self) -> &mut Sinks<D, B, L, N, E> {
        &mut self.sinks
    }

    pub fn into_sinks(self) -> Sinks<D, B, L, N, E> {
        self.sinks
    }
}
