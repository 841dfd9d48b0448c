//! The instrumentation handle.
//!
//! An application builds one [`OtelKit`] at startup, shares it (usually as
//! `Arc<OtelKit>`) with every request handler, and shuts it down once during
//! termination. Everything on it is read-only after construction.

use std::time::Duration;

use opentelemetry::metrics::Meter;
use opentelemetry_sdk::logs::LogExporter;
use opentelemetry_sdk::metrics::reader::MetricReader;
use opentelemetry_sdk::trace::{SdkTracer, SpanExporter};

use crate::config::{validate_config, ConfigError, KitConfig, LogLevel};
use crate::error::{KitError, ShutdownError};
use crate::lifecycle::shutdown::ShutdownCoordinator;
use crate::provider::logs::{
    build_local_sink, build_logs_pipeline, LocalRecord, LocalSink, LogsHook, LogsPipeline,
};
use crate::provider::metrics::{build_metrics_pipeline, MetricsHook, MetricsPipeline};
use crate::provider::resource::build_resource;
use crate::provider::trace::{build_trace_pipeline, TraceHook};

/// Traces, metrics and logs behind one handle.
pub struct OtelKit {
    pub(crate) config: KitConfig,
    pub(crate) tracer: SdkTracer,
    pub(crate) metrics: Option<MetricsPipeline>,
    pub(crate) logs: Option<LogsPipeline>,
    pub(crate) local_sink: LocalSink,
    shutdown: ShutdownCoordinator,
}

impl OtelKit {
    /// Build a kit from a resolved configuration using the configured exporters.
    pub fn new(config: KitConfig) -> Result<Self, KitError> {
        KitBuilder::new(config).build()
    }

    pub fn builder(config: KitConfig) -> KitBuilder {
        KitBuilder::new(config)
    }

    pub fn config(&self) -> &KitConfig {
        &self.config
    }

    pub fn tracer(&self) -> &SdkTracer {
        &self.tracer
    }

    /// The kit's meter, if the metrics pipeline is enabled.
    pub fn meter(&self) -> Option<&Meter> {
        self.metrics.as_ref().map(|metrics| &metrics.meter)
    }

    /// Registry backing the Prometheus scrape endpoint, if that backend is selected.
    pub fn prometheus_registry(&self) -> Option<&prometheus::Registry> {
        self.metrics.as_ref().and_then(|metrics| metrics.registry.as_ref())
    }

    pub fn metrics_enabled(&self) -> bool {
        self.metrics.is_some()
    }

    pub fn logs_enabled(&self) -> bool {
        self.logs.is_some()
    }

    /// Flush and close every provider, waiting at most `timeout`.
    ///
    /// Failures from each provider are collected into one error. Calls after
    /// the first return `Ok(())` without touching the providers.
    pub async fn shutdown(&self, timeout: Duration) -> Result<(), ShutdownError> {
        self.shutdown.shutdown(timeout).await
    }
}

/// Builds an [`OtelKit`], optionally replacing the configured exporters.
///
/// Injected exporters are mostly useful in tests, where an in-memory exporter
/// captures what the kit produces.
pub struct KitBuilder {
    config: KitConfig,
    trace_hook: Option<TraceHook>,
    metrics_hook: Option<MetricsHook>,
    logs_hook: Option<LogsHook>,
}

impl KitBuilder {
    pub fn new(config: KitConfig) -> Self {
        Self {
            config,
            trace_hook: None,
            metrics_hook: None,
            logs_hook: None,
        }
    }

    /// Export spans synchronously to `exporter` instead of the configured backend.
    pub fn with_span_exporter<E>(mut self, exporter: E) -> Self
    where
        E: SpanExporter + 'static,
    {
        self.trace_hook = Some(Box::new(move |builder| builder.with_simple_exporter(exporter)));
        self
    }

    /// Read metrics through `reader` instead of the configured backend.
    pub fn with_metric_reader<R>(mut self, reader: R) -> Self
    where
        R: MetricReader,
    {
        self.metrics_hook = Some(Box::new(move |builder| builder.with_reader(reader)));
        self
    }

    /// Export log records synchronously to `exporter` instead of the configured backend.
    pub fn with_log_exporter<E>(mut self, exporter: E) -> Self
    where
        E: LogExporter + 'static,
    {
        self.logs_hook = Some(Box::new(move |builder| builder.with_simple_exporter(exporter)));
        self
    }

    pub fn build(self) -> Result<OtelKit, KitError> {
        let config = self.config;
        validate_config(&config).map_err(ConfigError::Validation)?;

        let resource = build_resource(&config);

        let traces = build_trace_pipeline(&config, resource.clone(), self.trace_hook)?;

        let metrics = if config.metrics_enabled {
            Some(build_metrics_pipeline(&config, resource.clone(), self.metrics_hook)?)
        } else {
            None
        };

        let logs = if config.logs_enabled {
            Some(build_logs_pipeline(&config, resource, self.logs_hook)?)
        } else {
            None
        };

        let local_sink = build_local_sink(&config)?;

        let shutdown = ShutdownCoordinator::new(
            Some(traces.provider),
            metrics.as_ref().map(|m| m.provider.clone()),
            logs.as_ref().map(|l| l.provider.clone()),
        );

        if config.debug && config.log_level <= LogLevel::Info {
            let mut fields = serde_json::Map::new();
            fields.insert("service".into(), config.service_name.clone().into());
            fields.insert("version".into(), config.service_version.clone().into());
            fields.insert("traces".into(), config.traces_exporter.clone().into());
            fields.insert("metrics".into(), config.metrics_enabled.into());
            fields.insert("logs".into(), config.logs_enabled.into());
            local_sink.write(LocalRecord {
                level: LogLevel::Info,
                message: "OtelKit initialized",
                error: None,
                trace_id: None,
                span_id: None,
                fields,
            });
        }

        Ok(OtelKit {
            config,
            tracer: traces.tracer,
            metrics,
            logs,
            local_sink,
            shutdown,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ValidationError;

    fn quiet_config() -> KitConfig {
        KitConfig {
            traces_exporter: "none".into(),
            metrics_exporter: "none".into(),
            logs_exporter: "none".into(),
            log_level: LogLevel::Error,
            ..KitConfig::default()
        }
    }

    #[test]
    fn unknown_exporter_aborts_construction() {
        let config = KitConfig {
            traces_exporter: "carrier-pigeon".into(),
            ..quiet_config()
        };

        match OtelKit::new(config) {
            Err(KitError::Config(ConfigError::Validation(errors))) => {
                assert!(matches!(errors[0], ValidationError::UnknownExporter { .. }));
            }
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("construction should fail"),
        }
    }

    #[test]
    fn disabled_signals_are_absent() {
        let config = KitConfig {
            metrics_enabled: false,
            logs_enabled: false,
            ..quiet_config()
        };
        let kit = OtelKit::new(config).unwrap();

        assert!(!kit.metrics_enabled());
        assert!(!kit.logs_enabled());
        assert!(kit.meter().is_none());
        assert!(kit.prometheus_registry().is_none());
    }

    #[test]
    fn prometheus_backend_exposes_registry() {
        let config = KitConfig {
            metrics_exporter: "prometheus".into(),
            ..quiet_config()
        };
        let kit = OtelKit::new(config).unwrap();

        assert!(kit.prometheus_registry().is_some());
        assert!(kit.meter().is_some());
    }

    #[test]
    fn unwritable_log_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let config = KitConfig {
            log_file_path: Some(dir.path().join("missing").join("kit.log")),
            ..quiet_config()
        };

        assert!(matches!(OtelKit::new(config), Err(KitError::LogFile { .. })));
    }
}
