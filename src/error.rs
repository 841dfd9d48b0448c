//! Error types surfaced to the embedding application.
//!
//! # Design Decisions
//! - Construction errors are fatal and returned synchronously
//! - Shutdown collects failures per signal instead of stopping at the first
//! - Business errors from wrapped bodies never pass through these types

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::config::loader::ConfigError;
use crate::config::validation::ValidationError;

/// One of the three telemetry signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Signal {
    Traces,
    Metrics,
    Logs,
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Signal::Traces => "traces",
            Signal::Metrics => "metrics",
            Signal::Logs => "logs",
        };
        f.write_str(name)
    }
}

/// Error returned while building an [`OtelKit`](crate::OtelKit).
///
/// Shutdown reports through [`ShutdownError`] instead.
#[derive(Debug, Error)]
pub enum KitError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to create {signal} exporter: {source}")]
    Exporter {
        signal: Signal,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("failed to open log file {}: {source}", path.display())]
    LogFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl KitError {
    pub(crate) fn exporter<E>(signal: Signal, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        KitError::Exporter {
            signal,
            source: Box::new(source),
        }
    }
}

impl From<ValidationError> for KitError {
    fn from(error: ValidationError) -> Self {
        KitError::Config(ConfigError::Validation(vec![error]))
    }
}

/// A single provider that failed to flush or close.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignalFailure {
    pub signal: Signal,
    pub message: String,
}

/// Aggregated shutdown failures, one entry per failing provider.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub struct ShutdownError {
    pub failures: Vec<SignalFailure>,
}

impl fmt::Display for ShutdownError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "shutdown errors: ")?;
        for (i, failure) in self.failures.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{} provider shutdown: {}", failure.signal, failure.message)?;
        }
        Ok(())
    }
}
