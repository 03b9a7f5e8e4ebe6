//! GSM modem emergency channel
//!
//! Drives a SIM800-class modem over its AT command port. A critical alert
//! becomes an SMS carrying the last GPS fix, followed by a voice call to the
//! same number. The call is hung up from [`EmergencyNotifier::tick`] once
//! `call_ms` has passed, so escalation never blocks the sampling loop.
//!
//! ```text
//! AT+CMGF=1
//! AT+CMGS="+911234567890"
//! HazardWatch FLOOD (CRITICAL): FLOOD DETECTED! Location: 31.10000,77.20000<Ctrl-Z>
//! ATD+911234567890;
//! ... call_ms later ...
//! ATH
//! ```
//!
//! Modem replies are not parsed. A write error marks the escalation failed.

use std::io::Write;

use hazardwatch_core::{
    errors::{SinkError, SinkResult},
    records::AlertRecord,
    sinks::EmergencyNotifier,
    time::{elapsed, Timestamp},
};

use crate::{ConnectionStats, ConnectorError};

/// Default voice call length
pub const DEFAULT_CALL_MS: u64 = 25_000;

const CTRL_Z: u8 = 0x1A;

/// [`EmergencyNotifier`] over a modem's AT command port
#[derive(Debug)]
pub struct GsmModem<W: Write> {
    port: W,
    number: String,
    call_ms: u64,
    sms: bool,
    call_started: Option<Timestamp>,
    stats: ConnectionStats,
}

impl<W: Write> GsmModem<W> {
    /// `number` is dialled as given: digits with an optional leading `+`
    pub fn new(port: W, number: impl Into<String>) -> Result<Self, ConnectorError> {
        let number = number.into();
        let digits = number.strip_prefix('+').unwrap_or(&number);
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ConnectorError::ConfigError(format!("invalid emergency number {:?}", number)));
        }
        Ok(Self {
            port,
            number,
            call_ms: DEFAULT_CALL_MS,
            sms: true,
            call_started: None,
            stats: ConnectionStats::default(),
        })
    }

    pub fn with_call_duration(mut self, call_ms: u64) -> Self {
        self.call_ms = call_ms;
        self
    }

    /// Call only, no SMS
    pub fn without_sms(mut self) -> Self {
        self.sms = false;
        self
    }

    pub fn port(&self) -> &W {
        &self.port
    }

    pub fn into_port(self) -> W {
        self.port
    }

    pub fn stats(&self) -> &ConnectionStats {
        &self.stats
    }

    pub fn in_call(&self) -> bool {
        self.call_started.is_some()
    }

    fn command(&mut self, command: &str) -> Result<(), ConnectorError> {
        let data = format!("{}\r\n", command);
        let result = self
            .port
            .write_all(data.as_bytes())
            .and_then(|()| self.port.flush())
            .map_err(ConnectorError::from);
        self.stats.record(&result, data.len());
        result
    }

    fn send_sms(&mut self, text: &str) -> Result<(), ConnectorError> {
        self.command("AT+CMGF=1")?;
        let number = self.number.clone();
        self.command(&format!("AT+CMGS=\"{}\"", number))?;

        // Ctrl-Z ends the message body
        let mut body: Vec<u8> = text.bytes().filter(|&b| b != CTRL_Z).collect();
        body.push(CTRL_Z);
        let result = self.port.write_all(&body).and_then(|()| self.port.flush()).map_err(ConnectorError::from);
        self.stats.record(&result, body.len());
        result
    }

    fn escalate_inner(&mut self, record: &AlertRecord<'_>) -> Result<(), ConnectorError> {
        if self.sms {
            self.send_sms(&sms_text(record))?;
        }
        if self.call_started.is_some() {
            log::info!("emergency call already in progress, {} alert sent by SMS only", record.kind);
            return Ok(());
        }
        let number = self.number.clone();
        self.command(&format!("ATD{};", number))?;
        self.call_started = Some(record.time);
        log::info!("emergency call to {} for {} alert", self.number, record.kind);
        Ok(())
    }
}

/// SMS body for `record`
pub fn sms_text(record: &AlertRecord<'_>) -> String {
    let location = match (record.context.get(&"lat"), record.context.get(&"lng")) {
        (Some(lat), Some(lng)) => format!("{:.5},{:.5}", lat, lng),
        _ => "unknown".to_owned(),
    };
    format!(
        "HazardWatch {} ({}): {} Location: {}",
        record.kind, record.severity, record.message, location
    )
}

impl<W: Write> EmergencyNotifier for GsmModem<W> {
    fn escalate(&mut self, record: &AlertRecord<'_>) -> SinkResult {
        self.escalate_inner(record).map_err(|err| {
            log::warn!("emergency escalation failed: {}", err);
            SinkError::from(err)
        })
    }

    fn tick(&mut self, now: Timestamp) {
        let Some(started) = self.call_started else {
            return;
        };
        if elapsed(started, now) < self.call_ms {
            return;
        }
        match self.command("ATH") {
            Ok(()) => {
                self.call_started = None;
                log::info!("emergency call ended");
            }
            // Retried on the next tick
            Err(err) => log::warn!("hang-up failed: {}", err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hazardwatch_core::alert::{AlertBuilder, AlertEvent, AlertKind, Severity};
    use std::io;

    fn flood(at: Timestamp, fix: bool) -> AlertEvent {
        let builder = AlertBuilder::new(AlertKind::Flood, at)
            .severity(Severity::Critical)
            .message("FLOOD DETECTED!")
            .context("soil", 1200.0);
        let builder = if fix { builder.context("lat", 31.1).context("lng", 77.2) } else { builder };
        builder.build()
    }

    fn written(modem: &GsmModem<Vec<u8>>) -> String {
        String::from_utf8_lossy(modem.port()).into_owned()
    }

    #[test]
    fn escalation_texts_then_calls() {
        let mut modem = GsmModem::new(Vec::new(), "+911234567890").unwrap();
        let event = flood(1000, true);
        modem.escalate(&AlertRecord::from_event(&event)).unwrap();

        let out = written(&modem);
        assert_eq!(
            out,
            "AT+CMGF=1\r\nAT+CMGS=\"+911234567890\"\r\n\
             HazardWatch FLOOD (CRITICAL): FLOOD DETECTED! Location: 31.10000,77.20000\u{1a}\
             ATD+911234567890;\r\n"
        );
        assert!(modem.in_call());
    }

    #[test]
    fn call_hangs_up_after_duration() {
        let mut modem = GsmModem::new(Vec::new(), "112").unwrap().without_sms().with_call_duration(10_000);
        let event = flood(1000, false);
        modem.escalate(&AlertRecord::from_event(&event)).unwrap();

        modem.tick(10_999);
        assert!(modem.in_call());
        modem.tick(11_000);
        assert!(!modem.in_call());
        assert_eq!(written(&modem), "ATD112;\r\nATH\r\n");
    }

    #[test]
    fn second_alert_during_call_is_sms_only() {
        let mut modem = GsmModem::new(Vec::new(), "112").unwrap();
        modem.escalate(&AlertRecord::from_event(&flood(0, false))).unwrap();
        modem.escalate(&AlertRecord::from_event(&flood(500, false))).unwrap();

        let out = written(&modem);
        assert_eq!(out.matches("ATD112;").count(), 1);
        assert_eq!(out.matches("AT+CMGS").count(), 2);
        assert!(out.contains("Location: unknown"));
    }

    #[test]
    fn rejects_malformed_number() {
        assert!(matches!(GsmModem::new(Vec::<u8>::new(), ""), Err(ConnectorError::ConfigError(_))));
        assert!(GsmModem::new(Vec::<u8>::new(), "+").is_err());
        assert!(GsmModem::new(Vec::<u8>::new(), "12-34").is_err());
    }

    struct BrokenPort;

    impl Write for BrokenPort {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "modem unplugged"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn write_failure_is_unavailable() {
        let mut modem = GsmModem::new(BrokenPort, "112").unwrap();
        let event = flood(0, true);
        assert_eq!(modem.escalate(&AlertRecord::from_event(&event)), Err(SinkError::Unavailable));
        assert!(!modem.in_call());
        assert_eq!(modem.stats().messages_failed, 1);
    }
}
