//! Loading `AlertConfig` from JSON
//!
//! Any subset of the configuration may be given; missing fields keep their
//! compiled-in defaults.
//!
//! ```json
//! {
//!   "gas_label": "gas",
//!   "tilt": { "active_high": false, "trigger": "edge" },
//!   "cooldown": { "default_ms": 5000, "tilt_ms": 20000 },
//!   "severity": { "tilt": "critical" }
//! }
//! ```

use std::fs;
use std::path::Path;

use hazardwatch_core::config::AlertConfig;

use crate::ConnectorError;

/// Parse and validate a JSON configuration document
pub fn parse_config(text: &str) -> Result<AlertConfig, ConnectorError> {
    let config: AlertConfig = serde_json::from_str(text)?;
    config.validate()?;
    Ok(config)
}

/// Read, parse and validate a JSON configuration file
pub fn load_config(path: impl AsRef<Path>) -> Result<AlertConfig, ConnectorError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)?;
    let config = parse_config(&text)?;
    log::info!("loaded configuration from {}", path.display());
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hazardwatch_core::{
        alert::{AlertKind, Severity},
        config::{GasAlertLabel, TiltTrigger},
    };

    #[test]
    fn empty_document_is_default() {
        assert_eq!(parse_config("{}").unwrap(), AlertConfig::default());
    }

    #[test]
    fn partial_document_overrides_only_given_fields() {
        let config = parse_config(
            r#"{
                "gas_label": "gas",
                "tilt": { "active_high": false, "trigger": "edge" },
                "cooldown": { "tilt_ms": 20000 },
                "severity": { "tilt": "critical" },
                "thresholds": { "gas_limit": 2000.0 },
                "buzzer": { "warning": { "pulses": 2, "on_ms": 100, "off_ms": 100 } }
            }"#,
        )
        .unwrap();

        assert_eq!(config.gas_label, GasAlertLabel::Gas);
        assert!(!config.tilt.active_high);
        assert_eq!(config.tilt.trigger, TiltTrigger::Edge);
        assert_eq!(config.cooldown.for_kind(AlertKind::Tilt), 20_000);
        assert_eq!(config.cooldown.for_kind(AlertKind::Flood), 5000);
        assert_eq!(config.severity.for_kind(AlertKind::Tilt), Severity::Critical);
        assert_eq!(config.thresholds.gas_limit, 2000.0);
        assert_eq!(config.thresholds.flood_limit, 1500.0);
        assert_eq!(config.buzzer.warning.pulses, 2);
        assert_eq!(config.buzzer.critical.pulses, 3);
    }

    #[test]
    fn invalid_values_are_rejected() {
        let err = parse_config(r#"{ "timing": { "overlay_ms": 0 } }"#).unwrap_err();
        assert!(matches!(err, ConnectorError::InvalidConfig(_)));

        let err = parse_config(r#"{ "gas_label": "smoke" }"#).unwrap_err();
        assert!(matches!(err, ConnectorError::Encoding(_)));
    }

    #[test]
    fn loads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hazardwatch.json");
        fs::write(&path, r#"{ "motion": { "sustain_ms": 2000 } }"#).unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.motion.sustain_ms, 2000);
        assert_eq!(config.motion.threshold, 2.5);

        assert!(matches!(load_config(dir.path().join("missing.json")), Err(ConnectorError::Io(_))));
    }
}
