//! Shared fixtures for engine integration tests
//!
//! Provides:
//! - A scripted sampler that replays fixed reading frames
//! - Recording sinks that keep everything they were handed
//! - Switchable failure on every sink
//! - A fixed calendar clock

#![allow(dead_code)]

use std::collections::VecDeque;

use hazardwatch_core::{
    alert::{AlertKind, Severity},
    buzzer::{BuzzerPattern, BuzzerPin},
    config::AlertConfig,
    engine::Engine,
    errors::{SinkError, SinkResult},
    overlay::OverlayBanner,
    reading::{Readings, SensorReading},
    records::{AlertRecord, Payload, SnapshotRecord, StatusReport},
    screen::DisplayLine,
    sinks::{Buzzer, Display, EmergencyNotifier, EventLog, NetworkNotifier, SensorSampler, Sinks},
    time::{Timestamp, WallClock},
};

/// Collect readings into a cycle
pub fn frame(readings: &[SensorReading]) -> Readings {
    readings.iter().cloned().collect()
}

/// Calm readings on every channel
pub fn calm(at: Timestamp) -> Readings {
    frame(&[
        SensorReading::soil(1800.0, at),
        SensorReading::gas(400.0, at),
        SensorReading::temp_humidity(24.0, 60.0, at),
        SensorReading::accel(0.1, 0.1, 9.8, at),
        SensorReading::tilt(false, at),
        SensorReading::gps(31.1, 77.2, at),
    ])
}

/// Replays queued frames, then repeats the last one
#[derive(Default)]
pub struct ScriptedSampler {
    frames: VecDeque<Readings>,
    last: Readings,
    pub reads: Vec<Timestamp>,
}

impl ScriptedSampler {
    pub fn new(frames: impl IntoIterator<Item = Readings>) -> Self {
        Self { frames: frames.into_iter().collect(), ..Self::default() }
    }
}

impl SensorSampler for ScriptedSampler {
    fn read_all(&mut self, now: Timestamp) -> Readings {
        self.reads.push(now);
        if let Some(next) = self.frames.pop_front() {
            self.last = next;
        }
        let mut readings = self.last.clone();
        for reading in readings.iter_mut() {
            reading.timestamp = now;
        }
        readings
    }
}

#[derive(Debug, Default)]
pub struct RecordingDisplay {
    pub frames: Vec<(Vec<String>, Option<AlertKind>)>,
    pub fail: bool,
}

impl RecordingDisplay {
    pub fn last_banner(&self) -> Option<AlertKind> {
        self.frames.last().and_then(|(_, banner)| *banner)
    }

    pub fn last_lines(&self) -> Vec<String> {
        self.frames.last().map(|(lines, _)| lines.clone()).unwrap_or_default()
    }
}

impl Display for RecordingDisplay {
    fn render(&mut self, lines: &[DisplayLine], overlay: Option<&OverlayBanner>) -> SinkResult {
        if self.fail {
            return Err(SinkError::Unavailable);
        }
        let text = lines.iter().map(|l| l.as_str().to_owned()).collect();
        self.frames.push((text, overlay.map(|b| b.kind)));
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct RecordingBuzzer {
    pub patterns: Vec<BuzzerPattern>,
    pub ticks: u32,
    pub fail: bool,
}

impl Buzzer for RecordingBuzzer {
    fn play(&mut self, pattern: BuzzerPattern) -> SinkResult {
        if self.fail {
            return Err(SinkError::Unavailable);
        }
        self.patterns.push(pattern);
        Ok(())
    }

    fn tick(&mut self, _now: Timestamp) {
        self.ticks += 1;
    }
}

/// In-memory log, replays one text line per stored record
#[derive(Debug, Default)]
pub struct MemoryLog {
    pub alerts: Vec<(AlertKind, Severity, Timestamp)>,
    pub snapshots: Vec<SnapshotRecord>,
    pub lines: Vec<String>,
    pub fail: bool,
}

impl EventLog for MemoryLog {
    fn append_event(&mut self, record: &AlertRecord<'_>) -> SinkResult {
        if self.fail {
            return Err(SinkError::Storage);
        }
        self.alerts.push((record.kind, record.severity, record.time));
        self.lines.push(format!("alert {} {}", record.kind.label(), record.time));
        Ok(())
    }

    fn append_snapshot(&mut self, record: &SnapshotRecord) -> SinkResult {
        if self.fail {
            return Err(SinkError::Storage);
        }
        self.snapshots.push(*record);
        self.lines.push(format!("snapshot {}", record.time));
        Ok(())
    }

    fn replay(&mut self, visit: &mut dyn FnMut(&str)) -> SinkResult {
        if self.fail {
            return Err(SinkError::Unavailable);
        }
        for line in &self.lines {
            visit(line);
        }
        Ok(())
    }
}

/// Owned copy of a published payload
#[derive(Debug, Clone, PartialEq)]
pub enum Sent {
    Alert { kind: AlertKind, severity: Severity, time: Timestamp, lat: Option<f32> },
    Status(StatusReport),
    Pong,
    AnalyticsBegin,
    AnalyticsLine(String),
    AnalyticsEnd,
    AnalyticsUnavailable,
}

#[derive(Debug, Default)]
pub struct RecordingNetwork {
    pub sent: Vec<Sent>,
    pub attempts: u32,
    pub fail: bool,
}

impl RecordingNetwork {
    pub fn alerts(&self) -> Vec<AlertKind> {
        self.sent
            .iter()
            .filter_map(|s| match s {
                Sent::Alert { kind, .. } => Some(*kind),
                _ => None,
            })
            .collect()
    }
}

impl NetworkNotifier for RecordingNetwork {
    fn publish(&mut self, payload: &Payload<'_>) -> SinkResult {
        self.attempts += 1;
        if self.fail {
            return Err(SinkError::Unavailable);
        }
        let sent = match payload {
            Payload::Alert(record) => Sent::Alert {
                kind: record.kind,
                severity: record.severity,
                time: record.time,
                lat: record.context.get(&"lat").copied(),
            },
            Payload::Status(report) => Sent::Status(report.clone()),
            Payload::Pong => Sent::Pong,
            Payload::AnalyticsBegin => Sent::AnalyticsBegin,
            Payload::AnalyticsLine { line } => Sent::AnalyticsLine((*line).to_owned()),
            Payload::AnalyticsEnd => Sent::AnalyticsEnd,
            Payload::AnalyticsUnavailable => Sent::AnalyticsUnavailable,
        };
        self.sent.push(sent);
        Ok(())
    }
}

/// Emergency channel that keeps what it was asked to send
#[derive(Debug, Default)]
pub struct RecordingEmergency {
    /// Kind, trigger time, calendar time and GPS fix of each escalation
    pub escalations: Vec<(AlertKind, Timestamp, Option<u64>, Option<(f32, f32)>)>,
    pub ticks: u32,
    pub fail: bool,
}

impl EmergencyNotifier for RecordingEmergency {
    fn escalate(&mut self, record: &AlertRecord<'_>) -> SinkResult {
        if self.fail {
            return Err(SinkError::Unavailable);
        }
        let fix = match (record.context.get(&"lat"), record.context.get(&"lng")) {
            (Some(lat), Some(lng)) => Some((*lat, *lng)),
            _ => None,
        };
        self.escalations.push((record.kind, record.time, record.unix_ms, fix));
        Ok(())
    }

    fn tick(&mut self, _now: Timestamp) {
        self.ticks += 1;
    }
}

/// Calendar clock fixed at one instant, or unset
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub Option<u64>);

impl WallClock for FixedClock {
    fn unix_ms(&self) -> Option<u64> {
        self.0
    }
}

/// Pin that records every level it was driven to
#[derive(Debug, Default)]
pub struct RecordingPin {
    pub levels: Vec<bool>,
}

impl BuzzerPin for RecordingPin {
    fn set_level(&mut self, on: bool) -> SinkResult {
        self.levels.push(on);
        Ok(())
    }
}

pub type TestSinks = Sinks<RecordingDisplay, RecordingBuzzer, MemoryLog, RecordingNetwork>;

pub type TestEngine = Engine<RecordingDisplay, RecordingBuzzer, MemoryLog, RecordingNetwork>;

pub type EscalatingEngine =
    Engine<RecordingDisplay, RecordingBuzzer, MemoryLog, RecordingNetwork, RecordingEmergency>;

pub fn sinks() -> TestSinks {
    Sinks::new(
        RecordingDisplay::default(),
        RecordingBuzzer::default(),
        MemoryLog::default(),
        RecordingNetwork::default(),
    )
}

pub fn engine() -> TestEngine {
    engine_with(AlertConfig::default())
}

pub fn engine_with(config: AlertConfig) -> TestEngine {
    Engine::new(config, sinks()).expect("valid test config")
}

pub fn escalating_engine() -> EscalatingEngine {
    Engine::new(AlertConfig::default(), sinks().with_emergency(RecordingEmergency::default())).expect("valid test config")
}
