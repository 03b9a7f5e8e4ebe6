//! Host-side connectors for the HazardWatch engine
//!
//! ## Overview
//!
//! `hazardwatch-core` only knows its collaborator traits. This crate provides
//! `std` implementations of them for gateways, bench rigs and replay:
//!
//! | Module      | Implements          | Backing                               |
//! |-------------|---------------------|---------------------------------------|
//! | [`storage`] | `EventLog`          | JSON-lines files (`alerts.log`, `snapshots.log`) |
//! | [`serial`]  | `Connector`         | Any `Write`, one JSON object per line |
//! | [`mqtt`]    | `Connector`         | `rumqttc` client (feature `mqtt`)     |
//! | [`display`] | `Display`           | Any `Write`, plain text frames        |
//! | [`replay`]  | `SensorSampler`     | Recorded snapshot lines               |
//! | [`gsm`]     | `EmergencyNotifier` | AT commands to a SIM800-class modem   |
//! | [`config`]  |                     | `AlertConfig` from JSON               |
//!
//! ## Connector Model
//!
//! Transports implement [`Connector`]: send bytes to a topic, report whether
//! the link is up. [`ConnectorNotifier`] turns any connector into the
//! engine's `NetworkNotifier` by encoding each payload as JSON and routing it
//! to `<prefix>/<payload topic>`. Point-to-point links such as a Bluetooth
//! serial port ignore the topic.
//!
//! ## Error Handling
//!
//! Connectors fail with [`ConnectorError`]. At the engine boundary every
//! error collapses into a `SinkError`; the engine only needs to know which
//! sink failed, not why. The detail is logged here before it is dropped.
//!
//! ## Example Usage
//!
//! ```rust
//! use hazardwatch_connectors::{serial::SerialLink, ConnectorNotifier};
//! use hazardwatch_core::{records::Payload, sinks::NetworkNotifier};
//!
//! let mut notifier = ConnectorNotifier::new(SerialLink::new(Vec::new()), "hazardwatch/node-1");
//! notifier.publish(&Payload::Pong)?;
//!
//! let written = notifier.connector().writer();
//! assert_eq!(written.as_slice(), b"{\"kind\":\"pong\"}\n");
//! # Ok::<(), hazardwatch_core::SinkError>(())
//! ```

pub mod config;
pub mod display;
pub mod gsm;
pub mod replay;
pub mod serial;
pub mod storage;

#[cfg(feature = "mqtt")]
pub mod mqtt;

// Re-export common types
pub use config::{load_config, parse_config};
pub use display::TextDisplay;
pub use gsm::GsmModem;
pub use replay::ReplaySampler;
pub use serial::{CommandReader, SerialLink};
pub use storage::JsonLinesLog;

#[cfg(feature = "mqtt")]
pub use mqtt::{MqttConfig, MqttConnector, QoS};

use hazardwatch_core::{
    errors::{SinkError, SinkResult},
    records::Payload,
    sinks::NetworkNotifier,
};
use thiserror::Error;

/// Common connector errors
#[derive(Debug, Error)]
pub enum ConnectorError {
    #[error("Not connected")]
    NotConnected,

    #[error("Timeout")]
    Timeout,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Encoding error: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error("Protocol error: {0}")]
    ProtocolError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(#[from] hazardwatch_core::ConfigError),
}

impl From<ConnectorError> for SinkError {
    fn from(err: ConnectorError) -> Self {
        match err {
            ConnectorError::NotConnected => SinkError::Unavailable,
            ConnectorError::Timeout => SinkError::Timeout,
            ConnectorError::Io(io) => match io.kind() {
                std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock => SinkError::Timeout,
                _ => SinkError::Unavailable,
            },
            ConnectorError::Encoding(_)
            | ConnectorError::ProtocolError(_)
            | ConnectorError::ConfigError(_)
            | ConnectorError::InvalidConfig(_) => SinkError::Rejected,
        }
    }
}

/// Trait for all transport connectors
pub trait Connector {
    /// Send one encoded message
    fn send(&mut self, topic: &str, data: &[u8]) -> Result<(), ConnectorError>;

    /// Check if connected
    fn is_connected(&self) -> bool;

    /// Get connection statistics
    fn stats(&self) -> &ConnectionStats;
}

/// Connection statistics common to all connectors
#[derive(Debug, Default, Clone)]
pub struct ConnectionStats {
    /// Total messages sent successfully
    pub messages_sent: u64,
    /// Total messages failed to send
    pub messages_failed: u64,
    /// Total bytes sent
    pub bytes_sent: u64,
    /// Number of reconnections
    pub reconnections: u32,
    /// Last error message
    pub last_error: Option<String>,
}

impl ConnectionStats {
    pub(crate) fn record(&mut self, result: &Result<(), ConnectorError>, bytes: usize) {
        match result {
            Ok(()) => {
                self.messages_sent += 1;
                self.bytes_sent += bytes as u64;
            }
            Err(err) => {
                self.messages_failed += 1;
                self.last_error = Some(err.to_string());
            }
        }
    }
}

/// [`NetworkNotifier`] over any [`Connector`], JSON-encoded
pub struct ConnectorNotifier<C> {
    connector: C,
    topic_prefix: String,
}

impl<C: Connector> ConnectorNotifier<C> {
    pub fn new(connector: C, topic_prefix: impl Into<String>) -> Self {
        Self { connector, topic_prefix: topic_prefix.into() }
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    pub fn connector_mut(&mut self) -> &mut C {
        &mut self.connector
    }

    pub fn into_inner(self) -> C {
        self.connector
    }

    fn topic_for(&self, payload: &Payload<'_>) -> String {
        if self.topic_prefix.is_empty() {
            payload.topic().to_owned()
        } else {
            format!("{}/{}", self.topic_prefix, payload.topic())
        }
    }
}

impl<C: Connector> NetworkNotifier for ConnectorNotifier<C> {
    fn publish(&mut self, payload: &Payload<'_>) -> SinkResult {
        let data = serde_json::to_vec(payload).map_err(|err| {
            log::warn!("payload encoding failed: {}", err);
            SinkError::Rejected
        })?;
        let topic = self.topic_for(payload);
        self.connector.send(&topic, &data).map_err(|err| {
            log::debug!("send to {} failed: {}", topic, err);
            SinkError::from(err)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Capture {
        sent: Vec<(String, Vec<u8>)>,
        stats: ConnectionStats,
        down: bool,
    }

    impl Connector for Capture {
        fn send(&mut self, topic: &str, data: &[u8]) -> Result<(), ConnectorError> {
            let result = if self.down {
                Err(ConnectorError::NotConnected)
            } else {
                self.sent.push((topic.to_owned(), data.to_vec()));
                Ok(())
            };
            self.stats.record(&result, data.len());
            result
        }

        fn is_connected(&self) -> bool {
            !self.down
        }

        fn stats(&self) -> &ConnectionStats {
            &self.stats
        }
    }

    #[test]
    fn notifier_routes_by_payload_topic() {
        let mut notifier = ConnectorNotifier::new(Capture::default(), "hw/node-1");
        notifier.publish(&Payload::Pong).unwrap();
        notifier.publish(&Payload::AnalyticsLine { line: "{\"time\":1}" }).unwrap();

        let sent = &notifier.connector().sent;
        assert_eq!(sent[0].0, "hw/node-1/pong");
        assert_eq!(sent[1].0, "hw/node-1/analytics");

        let json: serde_json::Value = serde_json::from_slice(&sent[1].1).unwrap();
        assert_eq!(json["kind"], "analytics_line");
        assert_eq!(json["line"], "{\"time\":1}");
    }

    #[test]
    fn empty_prefix_uses_bare_topic() {
        let mut notifier = ConnectorNotifier::new(Capture::default(), "");
        notifier.publish(&Payload::AnalyticsEnd).unwrap();
        assert_eq!(notifier.connector().sent[0].0, "analytics");
    }

    #[test]
    fn connector_failure_maps_to_sink_error() {
        let mut notifier = ConnectorNotifier::new(Capture { down: true, ..Capture::default() }, "hw");
        assert_eq!(notifier.publish(&Payload::Pong), Err(SinkError::Unavailable));
        assert_eq!(notifier.connector().stats().messages_failed, 1);
        assert_eq!(notifier.connector().stats().last_error.as_deref(), Some("Not connected"));
    }

    #[test]
    fn error_mapping() {
        let timeout = std::io::Error::new(std::io::ErrorKind::TimedOut, "slow");
        assert_eq!(SinkError::from(ConnectorError::Io(timeout)), SinkError::Timeout);

        let broken = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "gone");
        assert_eq!(SinkError::from(ConnectorError::Io(broken)), SinkError::Unavailable);

        assert_eq!(
            SinkError::from(ConnectorError::ProtocolError("bad".into())),
            SinkError::Rejected
        );
    }
}
