//! Shutdown coordination for the signal providers.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use opentelemetry_sdk::logs::SdkLoggerProvider;
use opentelemetry_sdk::metrics::SdkMeterProvider;
use opentelemetry_sdk::trace::SdkTracerProvider;
use tokio::time::Instant;

use crate::error::{ShutdownError, Signal, SignalFailure};

/// Flushes and closes the trace, metric and log providers.
///
/// Providers are closed concurrently on the blocking pool, all bounded by the
/// same deadline. A provider that is absent (signal disabled) is skipped.
pub struct ShutdownCoordinator {
    tracer: Option<SdkTracerProvider>,
    meter: Option<SdkMeterProvider>,
    logger: Option<SdkLoggerProvider>,
    done: AtomicBool,
}

type CloseFn = Box<dyn FnOnce() -> Result<(), String> + Send>;

impl ShutdownCoordinator {
    pub fn new(
        tracer: Option<SdkTracerProvider>,
        meter: Option<SdkMeterProvider>,
        logger: Option<SdkLoggerProvider>,
    ) -> Self {
        Self {
            tracer,
            meter,
            logger,
            done: AtomicBool::new(false),
        }
    }

    /// Whether shutdown has already been requested.
    pub fn is_shut_down(&self) -> bool {
        self.done.load(Ordering::Acquire)
    }

    pub async fn shutdown(&self, timeout: Duration) -> Result<(), ShutdownError> {
        if self.done.swap(true, Ordering::AcqRel) {
            tracing::debug!("Telemetry providers already shut down");
            return Ok(());
        }

        let mut closers: Vec<(Signal, CloseFn)> = Vec::with_capacity(3);
        if let Some(provider) = self.tracer.clone() {
            closers.push((
                Signal::Traces,
                Box::new(move || provider.shutdown().map_err(|e| e.to_string())),
            ));
        }
        if let Some(provider) = self.meter.clone() {
            closers.push((
                Signal::Metrics,
                Box::new(move || provider.shutdown().map_err(|e| e.to_string())),
            ));
        }
        if let Some(provider) = self.logger.clone() {
            closers.push((
                Signal::Logs,
                Box::new(move || provider.shutdown().map_err(|e| e.to_string())),
            ));
        }

        let deadline = Instant::now() + timeout;
        let handles: Vec<_> = closers
            .into_iter()
            .map(|(signal, close)| (signal, tokio::task::spawn_blocking(close)))
            .collect();

        let mut failures = Vec::new();
        for (signal, handle) in handles {
            let message = match tokio::time::timeout_at(deadline, handle).await {
                Ok(Ok(Ok(()))) => continue,
                Ok(Ok(Err(message))) => message,
                Ok(Err(join_error)) => join_error.to_string(),
                Err(_) => format!("timed out after {:?}", timeout),
            };
            tracing::warn!(signal = %signal, error = %message, "Provider shutdown failed");
            failures.push(SignalFailure { signal, message });
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(ShutdownError { failures })
        }
    }
}
