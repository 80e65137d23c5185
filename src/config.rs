//! TOML-based node configuration.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::TimeDelta;
use serde::Deserialize;
use thiserror::Error;

use crate::codec::Tick;
use crate::topics;

/// Top-level configuration parsed from TOML.
///
/// Every section is optional and defaulted; only the section of the node
/// being started is validated. Load with [`GridConfig::from_toml_file`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GridConfig {
    /// MQTT broker connection.
    #[serde(default)]
    pub broker: BrokerConfig,
    /// Rolling-average sink.
    #[serde(default)]
    pub sink: SinkConfig,
    /// Load-profile demand generator.
    #[serde(default)]
    pub demand: DemandConfig,
    /// Schedule dispatcher.
    #[serde(default)]
    pub dispatch: DispatchConfig,
    /// Tick generator.
    #[serde(default)]
    pub tickgen: TickgenConfig,
}

/// MQTT broker connection parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BrokerConfig {
    pub host: String,
    pub port: u16,
    /// Keep-alive interval (seconds).
    pub keep_alive_secs: u64,
    /// Pause before polling again after a connection error (milliseconds).
    pub reconnect_delay_ms: u64,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            host: "mqttbroker".to_string(),
            port: 1883,
            keep_alive_secs: 5,
            reconnect_delay_ms: 1000,
        }
    }
}

/// Rolling-average sink parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SinkConfig {
    /// Sensor identity embedded in the input and output topics.
    pub id: String,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            id: "1".to_string(),
        }
    }
}

/// Demand generator parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DemandConfig {
    /// MQTT client name.
    pub name: String,
    /// Topic prefix for `/demand` and `/scale`.
    pub base_topic: String,
    /// CSV load profile.
    pub profile_file: Option<PathBuf>,
    /// Coefficient column in the profile (column 0 holds slot labels).
    pub profile_column: usize,
    /// Number of people the consumer represents.
    pub population_factor: u32,
    /// Relative jitter amplitude (0.0–1.0).
    pub jitter: f64,
    /// Jitter seed; unseeded runs draw from the operating system.
    pub seed: Option<u64>,
}

impl Default for DemandConfig {
    fn default() -> Self {
        Self {
            name: "consumer".to_string(),
            base_topic: String::new(),
            profile_file: None,
            profile_column: 1,
            population_factor: 1,
            jitter: crate::nodes::demand::DEFAULT_JITTER,
            seed: None,
        }
    }
}

/// Schedule dispatcher parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DispatchConfig {
    /// MQTT client name.
    pub name: String,
    /// Topic prefix for `/schedule_mode`.
    pub base_topic: String,
    /// JSON schedule.
    pub schedule_file: Option<PathBuf>,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            name: "scheduler".to_string(),
            base_topic: String::new(),
            schedule_file: None,
        }
    }
}

/// Tick generator parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TickgenConfig {
    /// MQTT client name.
    pub name: String,
    /// First simulated instant (ISO-8601); defaults to now.
    pub start: Option<String>,
    /// Simulated minutes per tick.
    pub step_minutes: i64,
    /// Wall-clock seconds between ticks.
    pub interval_secs: f64,
    /// Stop after this many ticks; runs forever when unset.
    pub count: Option<usize>,
}

impl Default for TickgenConfig {
    fn default() -> Self {
        Self {
            name: "tickgen".to_string(),
            start: None,
            step_minutes: 15,
            interval_secs: 1.0,
            count: None,
        }
    }
}

/// Which node a process runs, and therefore which section is validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Sink,
    Demand,
    Dispatch,
    Tickgen,
}

/// Configuration error with field path and constraint description.
#[derive(Debug, Error)]
#[error("config error: {field}: {message}")]
pub struct ConfigError {
    /// Dotted field path (e.g., `"demand.profile_column"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl ConfigError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl GridConfig {
    /// Parses a configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::new("config", format!("cannot read \"{}\": {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::new("toml", e.to_string()))
    }

    /// Validates the broker and the section for `kind`.
    ///
    /// Returns an empty vector if configuration is valid.
    pub fn validate(&self, kind: NodeKind) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        let b = &self.broker;
        if b.host.trim().is_empty() {
            errors.push(ConfigError::new("broker.host", "must not be empty"));
        }
        if b.port == 0 {
            errors.push(ConfigError::new("broker.port", "must be > 0"));
        }
        if b.keep_alive_secs == 0 {
            errors.push(ConfigError::new("broker.keep_alive_secs", "must be > 0"));
        }

        match kind {
            NodeKind::Sink => self.validate_sink(&mut errors),
            NodeKind::Demand => self.validate_demand(&mut errors),
            NodeKind::Dispatch => self.validate_dispatch(&mut errors),
            NodeKind::Tickgen => self.validate_tickgen(&mut errors),
        }

        errors
    }

    fn validate_sink(&self, errors: &mut Vec<ConfigError>) {
        if !topics::is_valid_level(&self.sink.id) {
            errors.push(ConfigError::new(
                "sink.id",
                format!("must be a single topic level, got \"{}\"", self.sink.id),
            ));
        }
    }

    fn validate_demand(&self, errors: &mut Vec<ConfigError>) {
        let d = &self.demand;
        if d.name.is_empty() {
            errors.push(ConfigError::new("demand.name", "must not be empty"));
        }
        if !topics::is_valid_name(&d.base_topic) {
            errors.push(ConfigError::new(
                "demand.base_topic",
                "must be a non-empty topic without wildcards",
            ));
        }
        if d.profile_file.is_none() {
            errors.push(ConfigError::new("demand.profile_file", "must be set"));
        }
        if d.profile_column == 0 {
            errors.push(ConfigError::new(
                "demand.profile_column",
                "must be >= 1 (column 0 holds slot labels)",
            ));
        }
        if d.population_factor == 0 {
            errors.push(ConfigError::new("demand.population_factor", "must be > 0"));
        }
        if !(0.0..1.0).contains(&d.jitter) {
            errors.push(ConfigError::new("demand.jitter", "must be in [0.0, 1.0)"));
        }
    }

    fn validate_dispatch(&self, errors: &mut Vec<ConfigError>) {
        let d = &self.dispatch;
        if d.name.is_empty() {
            errors.push(ConfigError::new("dispatch.name", "must not be empty"));
        }
        if !topics::is_valid_name(&d.base_topic) {
            errors.push(ConfigError::new(
                "dispatch.base_topic",
                "must be a non-empty topic without wildcards",
            ));
        }
        if d.schedule_file.is_none() {
            errors.push(ConfigError::new("dispatch.schedule_file", "must be set"));
        }
    }

    fn validate_tickgen(&self, errors: &mut Vec<ConfigError>) {
        let t = &self.tickgen;
        if t.name.is_empty() {
            errors.push(ConfigError::new("tickgen.name", "must not be empty"));
        }
        if let Some(start) = &t.start {
            if let Err(e) = Tick::parse(start) {
                errors.push(ConfigError::new("tickgen.start", e.to_string()));
            }
        }
        if t.step_minutes <= 0 {
            errors.push(ConfigError::new("tickgen.step_minutes", "must be > 0"));
        } else if TimeDelta::try_minutes(t.step_minutes).is_none() {
            errors.push(ConfigError::new("tickgen.step_minutes", "out of range"));
        }
        if !(t.interval_secs.is_finite() && t.interval_secs > 0.0) {
            errors.push(ConfigError::new("tickgen.interval_secs", "must be > 0"));
        } else if Duration::try_from_secs_f64(t.interval_secs).is_err() {
            errors.push(ConfigError::new("tickgen.interval_secs", "out of range"));
        }
        if t.count == Some(0) {
            errors.push(ConfigError::new("tickgen.count", "must be > 0 when set"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn demand_ready() -> GridConfig {
        let mut cfg = GridConfig::default();
        cfg.demand.base_topic = "consumer/h0".into();
        cfg.demand.profile_file = Some("slp.csv".into());
        cfg
    }

    #[test]
    fn defaults_are_valid_for_sink_and_tickgen() {
        let cfg = GridConfig::default();
        for kind in [NodeKind::Sink, NodeKind::Tickgen] {
            let errors = cfg.validate(kind);
            assert!(errors.is_empty(), "{kind:?} defaults should be valid: {errors:?}");
        }
    }

    #[test]
    fn defaults_need_tables_for_demand_and_dispatch() {
        let cfg = GridConfig::default();
        let errors = cfg.validate(NodeKind::Demand);
        assert!(errors.iter().any(|e| e.field == "demand.profile_file"));
        assert!(errors.iter().any(|e| e.field == "demand.base_topic"));

        let errors = cfg.validate(NodeKind::Dispatch);
        assert!(errors.iter().any(|e| e.field == "dispatch.schedule_file"));
    }

    #[test]
    fn valid_toml_parses() {
        let toml = r#"
[broker]
host = "localhost"
port = 1884

[demand]
name = "household-7"
base_topic = "consumer/h7"
profile_file = "data/slp.csv"
profile_column = 3
population_factor = 4
jitter = 0.1
seed = 99

[dispatch]
base_topic = "sched"
schedule_file = "data/schedule.json"

[tickgen]
start = "2024-05-01T00:00:00"
step_minutes = 60
interval_secs = 0.5
count = 96
"#;
        let cfg = GridConfig::from_toml_str(toml);
        assert!(cfg.is_ok(), "valid TOML should parse: {:?}", cfg.err());
        let cfg = cfg.ok();
        assert_eq!(cfg.as_ref().map(|c| c.broker.port), Some(1884));
        assert_eq!(cfg.as_ref().map(|c| c.demand.profile_column), Some(3));
        assert_eq!(cfg.as_ref().and_then(|c| c.demand.seed), Some(99));
        assert_eq!(cfg.as_ref().and_then(|c| c.tickgen.count), Some(96));
        // untouched section keeps defaults
        assert_eq!(cfg.as_ref().map(|c| c.sink.id.as_str()), Some("1"));

        for kind in [
            NodeKind::Sink,
            NodeKind::Demand,
            NodeKind::Dispatch,
            NodeKind::Tickgen,
        ] {
            let errors = cfg.as_ref().map(|c| c.validate(kind)).unwrap_or_default();
            assert!(errors.is_empty(), "{kind:?} should be valid: {errors:?}");
        }
    }

    #[test]
    fn invalid_toml_unknown_field() {
        let toml = r#"
[sink]
id = "1"
window = 10
"#;
        assert!(GridConfig::from_toml_str(toml).is_err());
    }

    #[test]
    fn validation_catches_bad_sink_id() {
        let mut cfg = GridConfig::default();
        cfg.sink.id = "a/b".into();
        let errors = cfg.validate(NodeKind::Sink);
        assert!(errors.iter().any(|e| e.field == "sink.id"));
    }

    #[test]
    fn validation_catches_label_column_and_jitter() {
        let mut cfg = demand_ready();
        assert!(cfg.validate(NodeKind::Demand).is_empty());

        cfg.demand.profile_column = 0;
        cfg.demand.jitter = 1.5;
        cfg.demand.population_factor = 0;
        let errors = cfg.validate(NodeKind::Demand);
        assert!(errors.iter().any(|e| e.field == "demand.profile_column"));
        assert!(errors.iter().any(|e| e.field == "demand.jitter"));
        assert!(errors.iter().any(|e| e.field == "demand.population_factor"));
    }

    #[test]
    fn validation_catches_bad_tickgen() {
        let mut cfg = GridConfig::default();
        cfg.tickgen.start = Some("noon".into());
        cfg.tickgen.step_minutes = 0;
        cfg.tickgen.interval_secs = f64::NAN;
        cfg.tickgen.count = Some(0);
        let fields: Vec<String> = cfg
            .validate(NodeKind::Tickgen)
            .into_iter()
            .map(|e| e.field)
            .collect();
        assert_eq!(
            fields,
            [
                "tickgen.start",
                "tickgen.step_minutes",
                "tickgen.interval_secs",
                "tickgen.count"
            ]
        );
    }

    #[test]
    fn validation_catches_out_of_range_tickgen() {
        let mut cfg = GridConfig::default();
        cfg.tickgen.step_minutes = i64::MAX;
        cfg.tickgen.interval_secs = 1e30;
        let fields: Vec<String> = cfg
            .validate(NodeKind::Tickgen)
            .into_iter()
            .map(|e| e.field)
            .collect();
        assert_eq!(fields, ["tickgen.step_minutes", "tickgen.interval_secs"]);
    }

    #[test]
    fn validation_catches_bad_broker() {
        let mut cfg = GridConfig::default();
        cfg.broker.host = " ".into();
        cfg.broker.port = 0;
        let errors = cfg.validate(NodeKind::Sink);
        assert!(errors.iter().any(|e| e.field == "broker.host"));
        assert!(errors.iter().any(|e| e.field == "broker.port"));
    }
}
