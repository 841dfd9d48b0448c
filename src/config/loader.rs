//! Configuration resolution and loading from disk.
//!
//! Precedence for every field: explicit override, then environment variable,
//! then the documented default. Resolution never fails.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::schema::{ConfigOverrides, KitConfig, LogLevel};
use crate::config::validation::ValidationError;

pub const ENV_SERVICE_NAME: &str = "OTEL_SERVICE_NAME";
pub const ENV_SERVICE_VERSION: &str = "OTEL_SERVICE_VERSION";
pub const ENV_ENVIRONMENT: &str = "OTEL_ENVIRONMENT";
pub const ENV_TRACES_EXPORTER: &str = "OTEL_EXPORTER_TYPE";
pub const ENV_JAEGER_URL: &str = "JAEGER_URL";
pub const ENV_OTLP_ENDPOINT: &str = "OTEL_EXPORTER_OTLP_ENDPOINT";
pub const ENV_SAMPLE_RATE: &str = "OTEL_SAMPLE_RATE";
pub const ENV_DEBUG: &str = "OTEL_DEBUG";
pub const ENV_ENABLE_METRICS: &str = "OTEL_ENABLE_METRICS";
pub const ENV_ENABLE_LOGS: &str = "OTEL_ENABLE_LOGS";
pub const ENV_METRICS_EXPORTER: &str = "OTEL_METRICS_EXPORTER";
pub const ENV_LOGS_EXPORTER: &str = "OTEL_LOGS_EXPORTER";
pub const ENV_PROMETHEUS_PORT: &str = "OTEL_PROMETHEUS_PORT";
pub const ENV_LOG_LEVEL: &str = "OTEL_LOG_LEVEL";
pub const ENV_LOG_FILE_PATH: &str = "OTEL_LOG_FILE_PATH";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Resolve overrides against the process environment.
pub fn resolve(overrides: ConfigOverrides) -> KitConfig {
    resolve_with(overrides, |key| std::env::var(key).ok())
}

/// Resolve overrides against an arbitrary environment lookup.
pub fn resolve_with<F>(overrides: ConfigOverrides, env: F) -> KitConfig
where
    F: Fn(&str) -> Option<String>,
{
    let lookup = |key: &str| env(key).filter(|value| !value.is_empty());
    let defaults = KitConfig::default();

    let string = |explicit: Option<String>, key: &str, default: String| {
        explicit.or_else(|| lookup(key)).unwrap_or(default)
    };
    let flag = |explicit: Option<bool>, key: &str, default: bool| {
        explicit
            .or_else(|| lookup(key).map(|value| value == "true"))
            .unwrap_or(default)
    };

    let sample_rate = overrides
        .sample_rate
        .or_else(|| lookup(ENV_SAMPLE_RATE).and_then(|value| value.trim().parse().ok()))
        .filter(|rate: &f64| !rate.is_nan())
        .unwrap_or(defaults.sample_rate)
        .clamp(0.0, 1.0);

    let prometheus_port = overrides
        .prometheus_port
        .or_else(|| lookup(ENV_PROMETHEUS_PORT).and_then(|value| value.trim().parse().ok()))
        .unwrap_or(defaults.prometheus_port);

    let log_level = overrides
        .log_level
        .or_else(|| lookup(ENV_LOG_LEVEL).map(|value| LogLevel::parse_lenient(&value)))
        .unwrap_or(defaults.log_level);

    let log_file_path = overrides
        .log_file_path
        .filter(|path| !path.as_os_str().is_empty())
        .or_else(|| lookup(ENV_LOG_FILE_PATH).map(PathBuf::from));

    KitConfig {
        service_name: string(overrides.service_name, ENV_SERVICE_NAME, defaults.service_name),
        service_version: string(
            overrides.service_version,
            ENV_SERVICE_VERSION,
            defaults.service_version,
        ),
        environment: string(overrides.environment, ENV_ENVIRONMENT, defaults.environment),
        traces_exporter: string(
            overrides.traces_exporter,
            ENV_TRACES_EXPORTER,
            defaults.traces_exporter,
        ),
        jaeger_endpoint: string(overrides.jaeger_endpoint, ENV_JAEGER_URL, defaults.jaeger_endpoint),
        otlp_endpoint: string(overrides.otlp_endpoint, ENV_OTLP_ENDPOINT, defaults.otlp_endpoint),
        sample_rate,
        debug: flag(overrides.debug, ENV_DEBUG, defaults.debug),
        metrics_enabled: flag(overrides.metrics_enabled, ENV_ENABLE_METRICS, defaults.metrics_enabled),
        logs_enabled: flag(overrides.logs_enabled, ENV_ENABLE_LOGS, defaults.logs_enabled),
        metrics_exporter: string(
            overrides.metrics_exporter,
            ENV_METRICS_EXPORTER,
            defaults.metrics_exporter,
        ),
        logs_exporter: string(overrides.logs_exporter, ENV_LOGS_EXPORTER, defaults.logs_exporter),
        prometheus_port,
        log_level,
        log_file_path,
    }
}

/// Load overrides from a TOML file and resolve them against the environment.
pub fn load_config(path: &Path) -> Result<KitConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let overrides: ConfigOverrides = toml::from_str(&content)?;

    Ok(resolve(overrides))
}
