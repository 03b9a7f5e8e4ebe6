//! JSON-lines event log
//!
//! Two append-only files in one directory:
//!
//! ```text
//! <dir>/alerts.log     {"time":100,"type":"flood","severity":"critical",...}
//! <dir>/snapshots.log  {"time":5000,"soil":1800.0,"gas":900.0,...}
//! ```
//!
//! Each append opens, writes one line and closes, so a card pulled between
//! appends loses at most the record being written. `GET_ANALYTICS` replays
//! `alerts.log`; a log that was never written replays as empty.

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use hazardwatch_core::{
    errors::{SinkError, SinkResult},
    records::{AlertRecord, SnapshotRecord},
    sinks::EventLog,
};
use serde::Serialize;

use crate::ConnectorError;

pub const ALERTS_FILE: &str = "alerts.log";
pub const SNAPSHOTS_FILE: &str = "snapshots.log";

/// Storage statistics
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StorageStats {
    pub alerts_written: u64,
    pub snapshots_written: u64,
    pub write_failures: u64,
}

/// [`EventLog`] backed by JSON-lines files
#[derive(Debug)]
pub struct JsonLinesLog {
    dir: PathBuf,
    stats: StorageStats,
}

impl JsonLinesLog {
    /// Use `dir`, creating it if needed
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, ConnectorError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir, stats: StorageStats::default() })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn alerts_path(&self) -> PathBuf {
        self.dir.join(ALERTS_FILE)
    }

    pub fn snapshots_path(&self) -> PathBuf {
        self.dir.join(SNAPSHOTS_FILE)
    }

    pub fn stats(&self) -> StorageStats {
        self.stats
    }

    fn append<T: Serialize>(&mut self, path: PathBuf, record: &T) -> Result<(), ConnectorError> {
        let mut line = serde_json::to_vec(record)?;
        line.push(b'\n');
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        file.write_all(&line)?;
        Ok(())
    }

    fn finish(&mut self, result: Result<(), ConnectorError>, what: &str) -> SinkResult {
        result.map_err(|err| {
            self.stats.write_failures += 1;
            log::warn!("{} append failed: {}", what, err);
            match err {
                ConnectorError::Encoding(_) => SinkError::Rejected,
                _ => SinkError::Storage,
            }
        })
    }
}

impl EventLog for JsonLinesLog {
    fn append_event(&mut self, record: &AlertRecord<'_>) -> SinkResult {
        let result = self.append(self.alerts_path(), record);
        self.finish(result, "alert")?;
        self.stats.alerts_written += 1;
        Ok(())
    }

    fn append_snapshot(&mut self, record: &SnapshotRecord) -> SinkResult {
        let result = self.append(self.snapshots_path(), record);
        self.finish(result, "snapshot")?;
        self.stats.snapshots_written += 1;
        Ok(())
    }

    fn replay(&mut self, visit: &mut dyn FnMut(&str)) -> SinkResult {
        let file = match File::open(self.alerts_path()) {
            Ok(file) => file,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(err) => {
                log::warn!("cannot open alert log: {}", err);
                return Err(SinkError::Storage);
            }
        };

        for line in BufReader::new(file).lines() {
            let line = line.map_err(|err| {
                log::warn!("alert log read failed: {}", err);
                SinkError::Storage
            })?;
            if !line.trim().is_empty() {
                visit(&line);
            }
        }
        Ok(())
    }
}
