//! MQTT connector for gateway nodes
//!
//! Wraps the synchronous `rumqttc` client. The event loop runs on its own
//! thread and only tracks whether the broker has acknowledged the session;
//! publishing never waits on it. `send` enqueues with `try_publish`, so a
//! full request queue is reported as [`ConnectorError::Timeout`] instead of
//! blocking the sampling loop.
//!
//! Topics are `<prefix>/alert`, `<prefix>/status`, `<prefix>/pong` and
//! `<prefix>/analytics` when used behind a
//! [`ConnectorNotifier`](crate::ConnectorNotifier).

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use rumqttc::{Client, ClientError, Event, MqttOptions, Packet};
use serde::Deserialize;

pub use rumqttc::QoS;

use crate::{ConnectionStats, Connector, ConnectorError};

/// Pause before the event loop retries after a connection error
const RETRY_DELAY: Duration = Duration::from_secs(2);

/// Broker connection settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MqttConfig {
    pub host: String,
    pub port: u16,
    pub client_id: String,
    pub keep_alive_secs: u64,
    /// 0, 1 or 2
    pub qos: u8,
    /// Outgoing request queue depth
    pub queue_capacity: usize,
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            host: "localhost".into(),
            port: 1883,
            client_id: "hazardwatch-node".into(),
            keep_alive_secs: 30,
            qos: 1,
            queue_capacity: 32,
        }
    }
}

impl MqttConfig {
    pub fn qos(&self) -> Result<QoS, ConnectorError> {
        match self.qos {
            0 => Ok(QoS::AtMostOnce),
            1 => Ok(QoS::AtLeastOnce),
            2 => Ok(QoS::ExactlyOnce),
            level => Err(ConnectorError::ConfigError(format!("invalid QoS level {}", level))),
        }
    }

    fn validate(&self) -> Result<(), ConnectorError> {
        if self.host.is_empty() {
            return Err(ConnectorError::ConfigError("broker host is empty".into()));
        }
        if self.client_id.is_empty() {
            return Err(ConnectorError::ConfigError("client id is empty".into()));
        }
        if self.keep_alive_secs < 5 {
            return Err(ConnectorError::ConfigError("keep alive must be at least 5 seconds".into()));
        }
        if self.queue_capacity == 0 {
            return Err(ConnectorError::ConfigError("queue capacity must be positive".into()));
        }
        self.qos().map(|_| ())
    }
}

/// Publishes over a background `rumqttc` session
pub struct MqttConnector {
    client: Client,
    qos: QoS,
    connected: Arc<AtomicBool>,
    reconnections: Arc<AtomicU32>,
    stats: ConnectionStats,
}

impl MqttConnector {
    /// Start the session. Returns immediately; the broker is reached in the
    /// background and [`is_connected`](Connector::is_connected) turns true
    /// once it acknowledges.
    pub fn connect(config: &MqttConfig) -> Result<Self, ConnectorError> {
        config.validate()?;
        let qos = config.qos()?;

        let mut options = MqttOptions::new(config.client_id.clone(), config.host.clone(), config.port);
        options.set_keep_alive(Duration::from_secs(config.keep_alive_secs));

        let (client, mut connection) = Client::new(options, config.queue_capacity);
        let connected = Arc::new(AtomicBool::new(false));
        let reconnections = Arc::new(AtomicU32::new(0));

        let flag = Arc::clone(&connected);
        let counter = Arc::clone(&reconnections);
        let broker = format!("{}:{}", config.host, config.port);
        thread::Builder::new()
            .name("mqtt-eventloop".into())
            .spawn(move || {
                let mut ever_connected = false;
                for notification in connection.iter() {
                    match notification {
                        Ok(Event::Incoming(Packet::ConnAck(_))) => {
                            if ever_connected {
                                counter.fetch_add(1, Ordering::Relaxed);
                            }
                            ever_connected = true;
                            flag.store(true, Ordering::Release);
                            log::info!("connected to MQTT broker {}", broker);
                        }
                        Ok(Event::Incoming(Packet::Disconnect)) => {
                            flag.store(false, Ordering::Release);
                        }
                        Ok(_) => {}
                        Err(err) => {
                            if flag.swap(false, Ordering::AcqRel) {
                                log::warn!("MQTT connection to {} lost: {}", broker, err);
                            } else {
                                log::debug!("MQTT connect to {} failed: {}", broker, err);
                            }
                            thread::sleep(RETRY_DELAY);
                        }
                    }
                }
                flag.store(false, Ordering::Release);
                log::info!("MQTT event loop for {} stopped", broker);
            })?;

        Ok(Self { client, qos, connected, reconnections, stats: ConnectionStats::default() })
    }

    /// Close the session; the event loop thread exits afterwards
    pub fn disconnect(&mut self) -> Result<(), ConnectorError> {
        self.client
            .try_disconnect()
            .map_err(|err| ConnectorError::ProtocolError(err.to_string()))
    }
}

impl Connector for MqttConnector {
    fn send(&mut self, topic: &str, data: &[u8]) -> Result<(), ConnectorError> {
        self.stats.reconnections = self.reconnections.load(Ordering::Relaxed);

        let result = if !self.is_connected() {
            Err(ConnectorError::NotConnected)
        } else {
            self.client.try_publish(topic, self.qos, false, data.to_vec()).map_err(|err| match err {
                ClientError::TryRequest(_) => ConnectorError::Timeout,
                _ => ConnectorError::NotConnected,
            })
        };
        self.stats.record(&result, data.len());
        result
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    fn stats(&self) -> &ConnectionStats {
        &self.stats
    }
}
