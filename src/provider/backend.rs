//! Exporter backend selection.
//!
//! Each signal has a closed set of backends. The configured name is decoded
//! once, here, and each variant keeps only the settings it needs.

use crate::config::validation::ValidationError;
use crate::config::KitConfig;
use crate::error::Signal;

/// Where spans go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraceBackend {
    /// Jaeger collector, spoken to over OTLP/HTTP at the given URL.
    Jaeger { endpoint: String },
    /// OTLP/HTTP collector; `endpoint` is the full traces URL.
    Otlp { endpoint: String },
    Stdout,
    None,
}

/// Where metrics go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetricsBackend {
    Otlp { endpoint: String },
    /// Pull-based; scraped from the kit's registry.
    Prometheus,
    Stdout,
    None,
}

/// Where exported log records go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogsBackend {
    Otlp { endpoint: String },
    Stdout,
    None,
}

impl TraceBackend {
    pub fn select(config: &KitConfig) -> Result<Self, ValidationError> {
        match normalized(&config.traces_exporter).as_str() {
            "jaeger" => Ok(TraceBackend::Jaeger {
                endpoint: config.jaeger_endpoint.clone(),
            }),
            "otlp" => Ok(TraceBackend::Otlp {
                endpoint: signal_url(&config.otlp_endpoint, "traces"),
            }),
            "stdout" => Ok(TraceBackend::Stdout),
            "none" => Ok(TraceBackend::None),
            _ => Err(unknown(Signal::Traces, &config.traces_exporter)),
        }
    }
}

impl MetricsBackend {
    pub fn select(config: &KitConfig) -> Result<Self, ValidationError> {
        match normalized(&config.metrics_exporter).as_str() {
            "otlp" => Ok(MetricsBackend::Otlp {
                endpoint: signal_url(&config.otlp_endpoint, "metrics"),
            }),
            "prometheus" => Ok(MetricsBackend::Prometheus),
            "stdout" => Ok(MetricsBackend::Stdout),
            "none" => Ok(MetricsBackend::None),
            _ => Err(unknown(Signal::Metrics, &config.metrics_exporter)),
        }
    }
}

impl LogsBackend {
    pub fn select(config: &KitConfig) -> Result<Self, ValidationError> {
        match normalized(&config.logs_exporter).as_str() {
            "otlp" => Ok(LogsBackend::Otlp {
                endpoint: signal_url(&config.otlp_endpoint, "logs"),
            }),
            "stdout" => Ok(LogsBackend::Stdout),
            "none" => Ok(LogsBackend::None),
            _ => Err(unknown(Signal::Logs, &config.logs_exporter)),
        }
    }
}

fn normalized(name: &str) -> String {
    name.trim().to_ascii_lowercase()
}

fn unknown(signal: Signal, name: &str) -> ValidationError {
    ValidationError::UnknownExporter {
        signal,
        name: name.to_string(),
    }
}

/// Append the OTLP/HTTP signal path to a collector base URL.
fn signal_url(base: &str, signal: &str) -> String {
    format!("{}/v1/{}", base.trim_end_matches('/'), signal)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn otlp_endpoints_get_signal_paths() {
        let config = KitConfig {
            traces_exporter: "OTLP".into(),
            metrics_exporter: "otlp".into(),
            logs_exporter: "otlp".into(),
            otlp_endpoint: "http://collector:4318/".into(),
            ..KitConfig::default()
        };

        assert_eq!(
            TraceBackend::select(&config).unwrap(),
            TraceBackend::Otlp { endpoint: "http://collector:4318/v1/traces".into() }
        );
        assert_eq!(
            MetricsBackend::select(&config).unwrap(),
            MetricsBackend::Otlp { endpoint: "http://collector:4318/v1/metrics".into() }
        );
        assert_eq!(
            LogsBackend::select(&config).unwrap(),
            LogsBackend::Otlp { endpoint: "http://collector:4318/v1/logs".into() }
        );
    }

    #[test]
    fn prometheus_is_not_a_log_backend() {
        let config = KitConfig {
            logs_exporter: "prometheus".into(),
            ..KitConfig::default()
        };
        assert_eq!(
            LogsBackend::select(&config),
            Err(ValidationError::UnknownExporter {
                signal: Signal::Logs,
                name: "prometheus".into(),
            })
        );
    }

    #[test]
    fn jaeger_uses_its_own_url() {
        let config = KitConfig {
            traces_exporter: "jaeger".into(),
            jaeger_endpoint: "http://jaeger:4318/v1/traces".into(),
            ..KitConfig::default()
        };
        assert_eq!(
            TraceBackend::select(&config).unwrap(),
            TraceBackend::Jaeger { endpoint: "http://jaeger:4318/v1/traces".into() }
        );
    }
}
