//! Configuration schema definitions.
//!
//! `KitConfig` is the fully resolved, immutable configuration. `ConfigOverrides`
//! is the partial form an application (or a TOML file) supplies; every `None`
//! is filled from the environment or a default by the loader.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub const DEFAULT_SERVICE_NAME: &str = "unknown-service";
pub const DEFAULT_SERVICE_VERSION: &str = "1.0.0";
pub const DEFAULT_ENVIRONMENT: &str = "development";
pub const DEFAULT_TRACES_EXPORTER: &str = "stdout";
pub const DEFAULT_METRICS_EXPORTER: &str = "prometheus";
pub const DEFAULT_LOGS_EXPORTER: &str = "stdout";
pub const DEFAULT_JAEGER_ENDPOINT: &str = "http://localhost:4318/v1/traces";
pub const DEFAULT_OTLP_ENDPOINT: &str = "http://localhost:4318";
pub const DEFAULT_SAMPLE_RATE: f64 = 0.1;
pub const DEFAULT_PROMETHEUS_PORT: u16 = 9090;

/// Resolved configuration for an [`OtelKit`](crate::OtelKit).
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct KitConfig {
    /// Service identity attached to every signal.
    pub service_name: String,

    pub service_version: String,

    /// Deployment environment (development, staging, production).
    pub environment: String,

    /// Trace backend: jaeger, otlp, stdout or none.
    pub traces_exporter: String,

    /// Full URL of the Jaeger collector's OTLP/HTTP traces endpoint.
    pub jaeger_endpoint: String,

    /// Base URL of the OTLP/HTTP collector. Signal paths are appended.
    pub otlp_endpoint: String,

    /// Fraction of traces retained, in [0, 1].
    pub sample_rate: f64,

    /// Log an initialization summary.
    pub debug: bool,

    pub metrics_enabled: bool,

    pub logs_enabled: bool,

    /// Metrics backend: otlp, prometheus, stdout or none.
    pub metrics_exporter: String,

    /// Logs backend: otlp, stdout or none.
    pub logs_exporter: String,

    /// Port the demo binary serves the Prometheus scrape endpoint on.
    pub prometheus_port: u16,

    /// Minimum severity written to either log sink.
    pub log_level: LogLevel,

    /// Optional file the local JSON sink appends to instead of stdout.
    pub log_file_path: Option<PathBuf>,
}

impl Default for KitConfig {
    fn default() -> Self {
        Self {
            service_name: DEFAULT_SERVICE_NAME.to_string(),
            service_version: DEFAULT_SERVICE_VERSION.to_string(),
            environment: DEFAULT_ENVIRONMENT.to_string(),
            traces_exporter: DEFAULT_TRACES_EXPORTER.to_string(),
            jaeger_endpoint: DEFAULT_JAEGER_ENDPOINT.to_string(),
            otlp_endpoint: DEFAULT_OTLP_ENDPOINT.to_string(),
            sample_rate: DEFAULT_SAMPLE_RATE,
            debug: false,
            metrics_enabled: true,
            logs_enabled: true,
            metrics_exporter: DEFAULT_METRICS_EXPORTER.to_string(),
            logs_exporter: DEFAULT_LOGS_EXPORTER.to_string(),
            prometheus_port: DEFAULT_PROMETHEUS_PORT,
            log_level: LogLevel::Info,
            log_file_path: None,
        }
    }
}

/// Explicitly supplied configuration. Unset fields are resolved later.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ConfigOverrides {
    pub service_name: Option<String>,
    pub service_version: Option<String>,
    pub environment: Option<String>,
    pub traces_exporter: Option<String>,
    pub jaeger_endpoint: Option<String>,
    pub otlp_endpoint: Option<String>,
    pub sample_rate: Option<f64>,
    pub debug: Option<bool>,
    pub metrics_enabled: Option<bool>,
    pub logs_enabled: Option<bool>,
    pub metrics_exporter: Option<String>,
    pub logs_exporter: Option<String>,
    pub prometheus_port: Option<u16>,
    pub log_level: Option<LogLevel>,
    pub log_file_path: Option<PathBuf>,
}

/// Log verbosity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Parse a level name. Anything unrecognised maps to `Info`.
    pub fn parse_lenient(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "debug" => LogLevel::Debug,
            "warn" | "warning" => LogLevel::Warn,
            "error" => LogLevel::Error,
            _ => LogLevel::Info,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for LogLevel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for LogLevel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(LogLevel::parse_lenient(&raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_log_level_is_info() {
        assert_eq!(LogLevel::parse_lenient("verbose"), LogLevel::Info);
        assert_eq!(LogLevel::parse_lenient("WARN"), LogLevel::Warn);
        assert_eq!(LogLevel::parse_lenient(" debug "), LogLevel::Debug);
    }

    #[test]
    fn minimal_toml_uses_defaults() {
        let config: KitConfig = toml::from_str("service_name = \"orders\"").unwrap();
        assert_eq!(config.service_name, "orders");
        assert_eq!(config.traces_exporter, DEFAULT_TRACES_EXPORTER);
        assert_eq!(config.log_level, LogLevel::Info);
        assert!(config.metrics_enabled);
    }
}
