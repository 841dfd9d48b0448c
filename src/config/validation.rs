//! Configuration validation.
//!
//! # Responsibilities
//! - Reject exporter names no backend understands
//! - Check collector endpoints are absolute http(s) URLs
//! - Check value ranges (sample rate within [0, 1])
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Endpoints are only checked for the backends that will use them
//! - Runs before any pipeline is constructed

use std::fmt;

use url::Url;

use crate::config::schema::KitConfig;
use crate::error::Signal;
use crate::provider::backend::{LogsBackend, MetricsBackend, TraceBackend};

/// A single semantic problem with a [`KitConfig`].
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    UnknownExporter { signal: Signal, name: String },
    InvalidEndpoint { field: &'static str, value: String, reason: String },
    SampleRateOutOfRange(f64),
    EmptyServiceName,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::UnknownExporter { signal, name } => {
                write!(f, "unsupported {} exporter type: {}", signal, name)
            }
            ValidationError::InvalidEndpoint { field, value, reason } => {
                write!(f, "{} '{}' is not a valid endpoint: {}", field, value, reason)
            }
            ValidationError::SampleRateOutOfRange(rate) => {
                write!(f, "sample_rate {} is outside [0, 1]", rate)
            }
            ValidationError::EmptyServiceName => write!(f, "service_name must not be empty"),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Validate a resolved configuration.
pub fn validate_config(config: &KitConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.service_name.trim().is_empty() {
        errors.push(ValidationError::EmptyServiceName);
    }

    if !(0.0..=1.0).contains(&config.sample_rate) {
        errors.push(ValidationError::SampleRateOutOfRange(config.sample_rate));
    }

    let mut needs_otlp = false;

    match TraceBackend::select(config) {
        Ok(TraceBackend::Jaeger { endpoint }) => {
            check_endpoint("jaeger_endpoint", &endpoint, &mut errors)
        }
        Ok(TraceBackend::Otlp { .. }) => needs_otlp = true,
        Ok(_) => {}
        Err(e) => errors.push(e),
    }

    if config.metrics_enabled {
        match MetricsBackend::select(config) {
            Ok(MetricsBackend::Otlp { .. }) => needs_otlp = true,
            Ok(_) => {}
            Err(e) => errors.push(e),
        }
    }

    if config.logs_enabled {
        match LogsBackend::select(config) {
            Ok(LogsBackend::Otlp { .. }) => needs_otlp = true,
            Ok(_) => {}
            Err(e) => errors.push(e),
        }
    }

    if needs_otlp {
        check_endpoint("otlp_endpoint", &config.otlp_endpoint, &mut errors);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_endpoint(field: &'static str, value: &str, errors: &mut Vec<ValidationError>) {
    let reason = match Url::parse(value) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.host().is_some() => return,
        Ok(url) => format!("unsupported scheme '{}'", url.scheme()),
        Err(e) => e.to_string(),
    };

    errors.push(ValidationError::InvalidEndpoint {
        field,
        value: value.to_string(),
        reason,
    });
}
