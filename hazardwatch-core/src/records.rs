//! Persisted and transmitted record shapes
//!
//! ## Wire Format
//!
//! Every record is one JSON object per line. The field names are fixed;
//! existing logs and the phone app both read them.
//!
//! ```text
//! alert     {"time":1200,"type":"flood","severity":"critical","message":"FLOOD DETECTED!","context":{"soil":1200.0}}
//! snapshot  {"time":5000,"soil":1800.0,"gas":410.0,"temp":24.5,"hum":61.0,"ax":0.1,"ay":0.0,"az":9.8,"tilt":false,"lat":null,"lng":null}
//! ```
//!
//! Snapshot fields are `null` when the channel was unusable at that instant.
//! Nodes with a calendar clock add `"unix_ms"` to both shapes; without one
//! the field is left out and `time` is the only stamp.
//!
//! [`Payload`] wraps everything sent to the [`NetworkNotifier`] with a
//! `"kind"` tag so a receiver can dispatch on it.
//!
//! [`NetworkNotifier`]: crate::sinks::NetworkNotifier

use heapless::Vec;
use serde::{Deserialize, Serialize};

use crate::alert::{AlertEvent, AlertKind, ContextMap, Severity};
use crate::evaluator::{ChannelStatus, ThresholdEvaluator};
use crate::reading::{field, reading_for, Channel, FieldMap, Readings, SensorReading, MAX_CHANNELS};
use crate::time::Timestamp;

/// Alert log line, borrowed from an [`AlertEvent`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlertRecord<'a> {
    pub time: Timestamp,
    #[serde(rename = "type")]
    pub kind: AlertKind,
    pub severity: Severity,
    pub message: &'a str,
    pub context: &'a ContextMap,
    /// Calendar time of the trigger, when the node has a wall clock
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unix_ms: Option<u64>,
}

impl<'a> AlertRecord<'a> {
    pub fn from_event(event: &'a AlertEvent) -> Self {
        Self {
            time: event.triggered_at(),
            kind: event.kind(),
            severity: event.severity(),
            message: event.message(),
            context: event.context(),
            unix_ms: None,
        }
    }

    pub fn with_unix_ms(self, unix_ms: Option<u64>) -> Self {
        Self { unix_ms, ..self }
    }
}

/// Periodic reading of every channel
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SnapshotRecord {
    pub time: Timestamp,
    pub soil: Option<f32>,
    pub gas: Option<f32>,
    pub temp: Option<f32>,
    pub hum: Option<f32>,
    pub ax: Option<f32>,
    pub ay: Option<f32>,
    pub az: Option<f32>,
    /// Raw tilt pin level
    pub tilt: Option<bool>,
    pub lat: Option<f32>,
    pub lng: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unix_ms: Option<u64>,
}

impl SnapshotRecord {
    pub fn from_readings(readings: &[SensorReading], now: Timestamp) -> Self {
        let value = |channel: Channel, name: &'static str| {
            reading_for(readings, channel).and_then(|r| r.usable(name))
        };
        Self {
            time: now,
            soil: value(Channel::Soil, field::VALUE),
            gas: value(Channel::Gas, field::VALUE),
            temp: value(Channel::TempHumidity, field::TEMP),
            hum: value(Channel::TempHumidity, field::HUM),
            ax: value(Channel::Accel, field::X),
            ay: value(Channel::Accel, field::Y),
            az: value(Channel::Accel, field::Z),
            tilt: value(Channel::Tilt, field::STATE).map(|state| state >= 0.5),
            lat: value(Channel::Gps, field::LAT),
            lng: value(Channel::Gps, field::LNG),
            unix_ms: None,
        }
    }

    /// Rebuild one reading per channel, stamped with the record's time
    pub fn to_readings(&self) -> Readings {
        let at = self.time;
        let mut readings = Readings::new();

        let soil = self.soil.map_or(SensorReading::disconnected(Channel::Soil, at), |v| SensorReading::soil(v, at));
        let gas = self.gas.map_or(SensorReading::disconnected(Channel::Gas, at), |v| SensorReading::gas(v, at));
        let temp_humidity = match (self.temp, self.hum) {
            (None, None) => SensorReading::disconnected(Channel::TempHumidity, at),
            (temp, hum) => SensorReading::temp_humidity(temp.unwrap_or(f32::NAN), hum.unwrap_or(f32::NAN), at),
        };
        let accel = match (self.ax, self.ay) {
            (Some(x), Some(y)) => SensorReading::accel(x, y, self.az.unwrap_or(f32::NAN), at),
            _ => SensorReading::disconnected(Channel::Accel, at),
        };
        let tilt = self.tilt.map_or(SensorReading::disconnected(Channel::Tilt, at), |high| SensorReading::tilt(high, at));
        let gps = match (self.lat, self.lng) {
            (Some(lat), Some(lng)) => SensorReading::gps(lat, lng, at),
            _ => SensorReading::disconnected(Channel::Gps, at),
        };

        for reading in [soil, gas, temp_humidity, accel, tilt, gps] {
            // One per channel, never exceeds capacity
            let _ = readings.push(reading);
        }
        readings
    }
}

/// One channel in a status report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChannelReport {
    pub channel: Channel,
    pub status: ChannelStatus,
    /// Usable values only, empty when unknown
    pub values: FieldMap,
}

/// Answer to a `STATUS` command
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusReport {
    pub time: Timestamp,
    pub channels: Vec<ChannelReport, MAX_CHANNELS>,
    /// Alert currently on the overlay, if it is still showing
    pub overlay: Option<AlertKind>,
}

impl StatusReport {
    pub fn build(
        readings: &[SensorReading],
        evaluator: &ThresholdEvaluator,
        motion_active: bool,
        overlay: Option<AlertKind>,
        now: Timestamp,
    ) -> Self {
        let mut channels = Vec::new();
        for channel in Channel::ALL {
            let report = match reading_for(readings, channel) {
                Some(reading) => {
                    let status = evaluator.classify(reading, motion_active);
                    let mut values = FieldMap::new();
                    if status != ChannelStatus::Unknown {
                        for (name, value) in reading.values.iter() {
                            if value.is_finite() {
                                let _ = values.insert(*name, *value);
                            }
                        }
                    }
                    ChannelReport { channel, status, values }
                }
                None => ChannelReport { channel, status: ChannelStatus::Unknown, values: FieldMap::new() },
            };
            let _ = channels.push(report);
        }
        Self { time: now, channels, overlay }
    }

    pub fn channel(&self, channel: Channel) -> Option<&ChannelReport> {
        self.channels.iter().find(|c| c.channel == channel)
    }
}

/// Everything published to the network notifier
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Payload<'a> {
    Alert(AlertRecord<'a>),
    Status(StatusReport),
    Pong,
    /// Start of a log replay
    AnalyticsBegin,
    /// One stored log line
    AnalyticsLine { line: &'a str },
    AnalyticsEnd,
    /// Log could not be read
    AnalyticsUnavailable,
}

impl Payload<'_> {
    /// Topic suffix for transports that route by topic
    pub fn topic(&self) -> &'static str {
        match self {
            Payload::Alert(_) => "alert",
            Payload::Status(_) => "status",
            Payload::Pong => "pong",
            Payload::AnalyticsBegin
            | Payload::AnalyticsLine { .. }
            | Payload::AnalyticsEnd
            | Payload::AnalyticsUnavailable => "analytics",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alert::AlertBuilder;

    #[test]
    fn alert_record_borrows_event() {
        let event = AlertBuilder::new(AlertKind::Flood, 1200)
            .severity(Severity::Critical)
            .message("FLOOD DETECTED!")
            .context("soil", 1200.0)
            .build();
        let record = AlertRecord::from_event(&event);
        assert_eq!(record.time, 1200);
        assert_eq!(record.kind, AlertKind::Flood);
        assert_eq!(record.message, "FLOOD DETECTED!");
        assert_eq!(record.context.len(), 1);
    }

    #[test]
    fn wall_clock_field_only_when_known() {
        let event = AlertBuilder::new(AlertKind::Gas, 300).message("GAS LEAK!").build();

        let plain = serde_json::to_value(AlertRecord::from_event(&event)).unwrap();
        assert!(plain.get("unix_ms").is_none());

        let stamped = AlertRecord::from_event(&event).with_unix_ms(Some(1_700_000_000_300));
        let stamped = serde_json::to_value(stamped).unwrap();
        assert_eq!(stamped["unix_ms"], 1_700_000_000_300u64);
        assert_eq!(stamped["type"], "gas");

        let snapshot = SnapshotRecord { time: 5000, unix_ms: Some(1_700_000_005_000), ..SnapshotRecord::default() };
        let line = serde_json::to_string(&snapshot).unwrap();
        assert!(line.contains("\"unix_ms\":1700000005000"));

        // Logs written before the field existed still parse
        let old: SnapshotRecord = serde_json::from_str(r#"{"time":5000,"soil":1800.0}"#).unwrap();
        assert_eq!(old.unix_ms, None);
        assert_eq!(old.soil, Some(1800.0));
    }

    #[test]
    fn snapshot_nulls_unusable_channels() {
        let readings = [
            SensorReading::soil(1800.0, 0),
            SensorReading::temp_humidity(f32::NAN, 55.0, 0),
            SensorReading::disconnected(Channel::Gas, 0),
            SensorReading::tilt(true, 0),
        ];
        let snapshot = SnapshotRecord::from_readings(&readings, 5000);
        assert_eq!(snapshot.time, 5000);
        assert_eq!(snapshot.soil, Some(1800.0));
        assert_eq!(snapshot.gas, None);
        assert_eq!(snapshot.temp, None);
        assert_eq!(snapshot.hum, Some(55.0));
        assert_eq!(snapshot.tilt, Some(true));
        assert_eq!(snapshot.lat, None);
    }

    #[test]
    fn snapshot_rebuilds_readings() {
        let snapshot = SnapshotRecord {
            time: 700,
            soil: Some(1200.0),
            temp: Some(30.0),
            ax: Some(0.5),
            ay: Some(0.1),
            ..SnapshotRecord::default()
        };
        let readings = snapshot.to_readings();
        assert_eq!(readings.len(), MAX_CHANNELS);

        let th = reading_for(&readings, Channel::TempHumidity).unwrap();
        assert_eq!(th.usable(field::TEMP), Some(30.0));
        assert_eq!(th.usable(field::HUM), None);

        assert!(!reading_for(&readings, Channel::Gas).unwrap().valid);
        assert!(!reading_for(&readings, Channel::Gps).unwrap().valid);
        assert_eq!(reading_for(&readings, Channel::Accel).unwrap().usable(field::X), Some(0.5));
        assert!(readings.iter().all(|r| r.timestamp == 700));
    }

    #[test]
    fn status_report_marks_unknown() {
        let readings = [
            SensorReading::soil(1200.0, 0),
            SensorReading::temp_humidity(f32::NAN, 40.0, 0),
        ];
        let report = StatusReport::build(&readings, &ThresholdEvaluator::default(), false, Some(AlertKind::Flood), 9);
        assert_eq!(report.channels.len(), MAX_CHANNELS);
        assert_eq!(report.channel(Channel::Soil).unwrap().status, ChannelStatus::Alert);

        let th = report.channel(Channel::TempHumidity).unwrap();
        assert_eq!(th.status, ChannelStatus::Unknown);
        assert!(th.values.is_empty());

        assert_eq!(report.channel(Channel::Gps).unwrap().status, ChannelStatus::Unknown);
        assert_eq!(report.overlay, Some(AlertKind::Flood));
    }

    #[test]
    fn payload_topics() {
        assert_eq!(Payload::Pong.topic(), "pong");
        assert_eq!(Payload::AnalyticsLine { line: "{}" }.topic(), "analytics");
    }
}
