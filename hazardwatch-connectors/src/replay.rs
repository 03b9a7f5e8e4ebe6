//! Replay recorded snapshots through the engine
//!
//! Reads the `snapshots.log` format written by
//! [`JsonLinesLog`](crate::storage::JsonLinesLog), one record per sample.
//! Bad lines are counted and skipped. Once the input is exhausted every
//! channel reads as disconnected, the same as a node with its sensor bus
//! unplugged.

use std::io::BufRead;

use hazardwatch_core::{
    reading::{Channel, Readings, SensorReading},
    records::SnapshotRecord,
    sinks::SensorSampler,
    time::Timestamp,
};

use crate::ConnectorError;

/// Replay statistics
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReplayStats {
    pub records_read: u64,
    pub lines_processed: u64,
    pub parse_errors: u64,
    pub bytes_read: u64,
}

/// [`SensorSampler`] fed from recorded snapshot lines
pub struct ReplaySampler<R: BufRead> {
    reader: R,
    buffer: String,
    exhausted: bool,
    stats: ReplayStats,
}

impl<R: BufRead> ReplaySampler<R> {
    pub fn new(reader: R) -> Self {
        Self { reader, buffer: String::new(), exhausted: false, stats: ReplayStats::default() }
    }

    pub fn stats(&self) -> ReplayStats {
        self.stats
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Next well-formed record, skipping blank and malformed lines
    pub fn next_record(&mut self) -> Result<Option<SnapshotRecord>, ConnectorError> {
        while !self.exhausted {
            self.buffer.clear();
            let n = self.reader.read_line(&mut self.buffer)?;
            if n == 0 {
                self.exhausted = true;
                break;
            }
            self.stats.bytes_read += n as u64;
            self.stats.lines_processed += 1;

            let line = self.buffer.trim();
            if line.is_empty() {
                continue;
            }
            match serde_json::from_str::<SnapshotRecord>(line) {
                Ok(record) => {
                    self.stats.records_read += 1;
                    return Ok(Some(record));
                }
                Err(err) => {
                    self.stats.parse_errors += 1;
                    log::warn!("skipping line {}: {}", self.stats.lines_processed, err);
                }
            }
        }
        Ok(None)
    }
}

fn all_disconnected(now: Timestamp) -> Readings {
    Channel::ALL.iter().map(|&channel| SensorReading::disconnected(channel, now)).collect()
}

impl<R: BufRead> SensorSampler for ReplaySampler<R> {
    fn read_all(&mut self, now: Timestamp) -> Readings {
        let record = match self.next_record() {
            Ok(Some(record)) => record,
            Ok(None) => return all_disconnected(now),
            Err(err) => {
                log::warn!("replay input failed: {}", err);
                self.exhausted = true;
                return all_disconnected(now);
            }
        };
        SnapshotRecord { time: now, ..record }.to_readings()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hazardwatch_core::reading::{field, reading_for};
    use std::io::Cursor;

    const RECORDED: &str = r#"{"time":0,"soil":1800.0,"gas":900.0,"temp":24.5,"hum":61.0,"ax":0.1,"ay":0.2,"az":9.8,"tilt":false,"lat":31.1,"lng":77.2}
not json

{"time":5000,"soil":1200.0,"gas":null,"temp":null,"hum":null,"ax":null,"ay":null,"az":null,"tilt":true,"lat":null,"lng":null}
"#;

    #[test]
    fn readings_are_restamped() {
        let mut sampler = ReplaySampler::new(Cursor::new(RECORDED));
        let readings = sampler.read_all(700);
        assert_eq!(readings.len(), Channel::ALL.len());
        assert!(readings.iter().all(|r| r.timestamp == 700));

        let soil = reading_for(&readings, Channel::Soil).unwrap();
        assert_eq!(soil.usable(field::VALUE), Some(1800.0));
    }

    #[test]
    fn malformed_lines_are_skipped() {
        let mut sampler = ReplaySampler::new(Cursor::new(RECORDED));
        sampler.read_all(0);
        let readings = sampler.read_all(100);

        assert_eq!(reading_for(&readings, Channel::Soil).unwrap().usable(field::VALUE), Some(1200.0));
        assert!(!reading_for(&readings, Channel::Gas).unwrap().valid);

        let stats = sampler.stats();
        assert_eq!(stats.records_read, 2);
        assert_eq!(stats.parse_errors, 1);
        assert_eq!(stats.lines_processed, 4);
    }

    #[test]
    fn exhausted_input_reads_disconnected() {
        let mut sampler = ReplaySampler::new(Cursor::new(""));
        let readings = sampler.read_all(42);
        assert!(sampler.is_exhausted());
        assert_eq!(readings.len(), Channel::ALL.len());
        assert!(readings.iter().all(|r| !r.valid && r.timestamp == 42));
    }
}
