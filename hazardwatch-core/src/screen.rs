//! Status screen text
//!
//! One short line per channel, sized for a 128x64 panel at the small font.
//! Unusable channels read `unknown`; a tripped channel gets a trailing `!`.

use core::fmt::Write;

use heapless::{String, Vec};

use crate::evaluator::{ChannelStatus, ThresholdEvaluator};
use crate::reading::{field, reading_for, Channel, SensorReading, MAX_CHANNELS};

/// Characters per display line
pub const LINE_WIDTH: usize = 24;

pub type DisplayLine = String<LINE_WIDTH>;

pub type DisplayLines = Vec<DisplayLine, MAX_CHANNELS>;

/// Build the status lines for the latest readings
pub fn status_lines(
    readings: &[SensorReading],
    evaluator: &ThresholdEvaluator,
    motion_active: bool,
) -> DisplayLines {
    let mut lines = DisplayLines::new();
    for channel in Channel::ALL {
        let reading = reading_for(readings, channel);
        let status = reading.map_or(ChannelStatus::Unknown, |r| evaluator.classify(r, motion_active));
        let mut line = DisplayLine::new();
        // Overflow only truncates the line
        let _ = match (reading, status) {
            (_, ChannelStatus::Unknown) | (None, _) => write!(line, "{:<6}unknown", label(channel)),
            (Some(r), _) => write_value(&mut line, channel, r, motion_active),
        };
        if status == ChannelStatus::Alert {
            let _ = line.push_str(" !");
        }
        let _ = lines.push(line);
    }
    lines
}

fn label(channel: Channel) -> &'static str {
    match channel {
        Channel::Soil => "Soil",
        Channel::Gas => "Gas",
        Channel::TempHumidity => "T/H",
        Channel::Accel => "Quake",
        Channel::Tilt => "Tilt",
        Channel::Gps => "GPS",
    }
}

fn write_value(line: &mut DisplayLine, channel: Channel, r: &SensorReading, motion_active: bool) -> core::fmt::Result {
    let v = |name| r.field(name).unwrap_or(f32::NAN);
    match channel {
        Channel::Soil | Channel::Gas => write!(line, "{:<6}{:.0}", label(channel), v(field::VALUE)),
        Channel::TempHumidity => write!(line, "T/H   {:.1}C {:.0}%", v(field::TEMP), v(field::HUM)),
        Channel::Accel => write!(line, "Quake {}", if motion_active { "SHAKING" } else { "still" }),
        Channel::Tilt => {
            let pin_high = v(field::STATE) >= 0.5;
            write!(line, "Tilt  {}", if pin_high { "high" } else { "low" })
        }
        Channel::Gps => write!(line, "GPS   {:.3},{:.3}", v(field::LAT), v(field::LNG)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_line_per_channel() {
        let readings = [
            SensorReading::soil(1800.0, 0),
            SensorReading::gas(3000.0, 0),
            SensorReading::temp_humidity(24.5, 61.0, 0),
            SensorReading::accel(0.0, 0.0, 9.8, 0),
            SensorReading::tilt(false, 0),
            SensorReading::gps(31.1, 77.2, 0),
        ];
        let lines = status_lines(&readings, &ThresholdEvaluator::default(), false);
        assert_eq!(lines.len(), MAX_CHANNELS);
        assert_eq!(lines[0].as_str(), "Soil  1800");
        assert_eq!(lines[1].as_str(), "Gas   3000 !");
        assert_eq!(lines[2].as_str(), "T/H   24.5C 61%");
        assert_eq!(lines[3].as_str(), "Quake still");
        assert_eq!(lines[4].as_str(), "Tilt  low");
        assert_eq!(lines[5].as_str(), "GPS   31.100,77.200");
    }

    #[test]
    fn invalid_channels_read_unknown() {
        let readings = [SensorReading::temp_humidity(f32::NAN, 90.0, 0)];
        let lines = status_lines(&readings, &ThresholdEvaluator::default(), false);
        assert_eq!(lines[2].as_str(), "T/H   unknown");
        // Missing readings are unknown too
        assert_eq!(lines[0].as_str(), "Soil  unknown");
    }

    #[test]
    fn shaking_is_flagged() {
        let readings = [SensorReading::accel(4.0, 0.0, 9.8, 0)];
        let lines = status_lines(&readings, &ThresholdEvaluator::default(), true);
        assert_eq!(lines[3].as_str(), "Quake SHAKING !");
    }
}
