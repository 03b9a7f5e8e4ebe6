//! Line-oriented serial link
//!
//! The Bluetooth SPP bridge on the node is a byte pipe: responses go out as
//! one JSON object per line and commands come back as one keyword per line.
//! Both halves are generic over `std::io` so a UART, a TCP socket or a file
//! can stand in for the radio.

use std::io::{self, BufRead, Write};

use crate::{ConnectionStats, Connector, ConnectorError};

/// Outbound half: one message per line, topic ignored
#[derive(Debug)]
pub struct SerialLink<W: Write> {
    writer: W,
    connected: bool,
    stats: ConnectionStats,
}

impl<W: Write> SerialLink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, connected: true, stats: ConnectionStats::default() }
    }

    pub fn writer(&self) -> &W {
        &self.writer
    }

    pub fn into_writer(self) -> W {
        self.writer
    }

    /// Mark the link up again after a write failure
    pub fn reconnect(&mut self) {
        if !self.connected {
            self.connected = true;
            self.stats.reconnections += 1;
            log::info!("serial link reconnected");
        }
    }

    fn write_line(&mut self, data: &[u8]) -> Result<(), ConnectorError> {
        if !self.connected {
            return Err(ConnectorError::NotConnected);
        }
        if data.contains(&b'\n') {
            return Err(ConnectorError::ProtocolError("message contains a line break".into()));
        }
        let result = self
            .writer
            .write_all(data)
            .and_then(|()| self.writer.write_all(b"\n"))
            .and_then(|()| self.writer.flush());
        if let Err(err) = result {
            if err.kind() != io::ErrorKind::TimedOut {
                log::warn!("serial link down: {}", err);
                self.connected = false;
            }
            return Err(err.into());
        }
        Ok(())
    }
}

impl<W: Write> Connector for SerialLink<W> {
    fn send(&mut self, _topic: &str, data: &[u8]) -> Result<(), ConnectorError> {
        let result = self.write_line(data);
        self.stats.record(&result, data.len() + 1);
        result
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn stats(&self) -> &ConnectionStats {
        &self.stats
    }
}

/// Inbound half: yields trimmed command lines
#[derive(Debug)]
pub struct CommandReader<R: BufRead> {
    reader: R,
    buffer: String,
}

impl<R: BufRead> CommandReader<R> {
    pub fn new(reader: R) -> Self {
        Self { reader, buffer: String::new() }
    }

    /// Next non-empty line, or `None` at end of input
    pub fn read_line(&mut self) -> Result<Option<String>, ConnectorError> {
        loop {
            self.buffer.clear();
            if self.reader.read_line(&mut self.buffer)? == 0 {
                return Ok(None);
            }
            let line = self.buffer.trim();
            if !line.is_empty() {
                return Ok(Some(line.to_owned()));
            }
        }
    }
}

impl<R: BufRead> Iterator for CommandReader<R> {
    type Item = Result<String, ConnectorError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_line().transpose()
    }
}
