//! Metrics pipeline.
//!
//! # Responsibilities
//! - Build the metric reader for the selected backend
//! - Register the kit's instruments once, at startup
//!
//! # Metrics
//! - `http_request_duration_seconds` (histogram): request latency by method, status
//! - `http_requests_total` (counter): requests by method, status
//! - `otelkit_active_spans` (up/down counter): in-flight instrumented requests
//! - `otelkit_business_operations_total` (counter): ad hoc operations by type
//!
//! # Design Decisions
//! - Push backends export every 15s through a periodic reader
//! - Prometheus is pull-based; the kit owns the registry it scrapes from
//! - Instrument names already carry their `_total`/`_seconds` suffixes, so the
//!   Prometheus exporter is told not to append them again
//! - `none` keeps a provider with no reader, so instruments are no-ops

use std::time::Duration;

use opentelemetry::metrics::{Counter, Histogram, Meter, MeterProvider as _, UpDownCounter};
use opentelemetry::InstrumentationScope;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::metrics::{MeterProviderBuilder, PeriodicReader, SdkMeterProvider};
use opentelemetry_sdk::Resource;

use crate::config::KitConfig;
use crate::error::{KitError, Signal};
use crate::provider::backend::MetricsBackend;

pub const EXPORT_INTERVAL: Duration = Duration::from_secs(15);

pub const HTTP_REQUEST_DURATION: &str = "http_request_duration_seconds";
pub const HTTP_REQUESTS_TOTAL: &str = "http_requests_total";
pub const ACTIVE_SPANS: &str = "otelkit_active_spans";
pub const BUSINESS_OPERATIONS_TOTAL: &str = "otelkit_business_operations_total";

/// Replaces the configured reader when the kit is built.
pub type MetricsHook = Box<dyn FnOnce(MeterProviderBuilder) -> MeterProviderBuilder + Send>;

/// The kit's pre-registered instruments.
#[derive(Clone)]
pub struct Instruments {
    pub http_request_duration: Histogram<f64>,
    pub http_requests_total: Counter<u64>,
    pub active_spans: UpDownCounter<i64>,
    pub business_operations: Counter<u64>,
}

impl Instruments {
    pub fn register(meter: &Meter) -> Self {
        Self {
            http_request_duration: meter
                .f64_histogram(HTTP_REQUEST_DURATION)
                .with_description("Duration of HTTP requests in seconds")
                .with_unit("s")
                .build(),
            http_requests_total: meter
                .u64_counter(HTTP_REQUESTS_TOTAL)
                .with_description("Total number of HTTP requests")
                .build(),
            active_spans: meter
                .i64_up_down_counter(ACTIVE_SPANS)
                .with_description("Number of currently active spans")
                .build(),
            business_operations: meter
                .u64_counter(BUSINESS_OPERATIONS_TOTAL)
                .with_description("Total number of business operations")
                .build(),
        }
    }
}

pub struct MetricsPipeline {
    pub provider: SdkMeterProvider,
    pub meter: Meter,
    pub instruments: Instruments,
    /// Present only for the Prometheus backend.
    pub registry: Option<prometheus::Registry>,
}

pub fn build_metrics_pipeline(
    config: &KitConfig,
    resource: Resource,
    hook: Option<MetricsHook>,
) -> Result<MetricsPipeline, KitError> {
    let builder = SdkMeterProvider::builder().with_resource(resource);
    let mut registry = None;

    let provider = match hook {
        Some(hook) => hook(builder).build(),
        None => match MetricsBackend::select(config)? {
            MetricsBackend::Otlp { endpoint } => {
                let exporter = opentelemetry_otlp::MetricExporter::builder()
                    .with_http()
                    .with_endpoint(endpoint)
                    .build()
                    .map_err(|e| KitError::exporter(Signal::Metrics, e))?;
                let reader = PeriodicReader::builder(exporter)
                    .with_interval(EXPORT_INTERVAL)
                    .build();
                builder.with_reader(reader).build()
            }
            MetricsBackend::Prometheus => {
                let prometheus_registry = prometheus::Registry::new();
                let exporter = opentelemetry_prometheus::exporter()
                    .with_registry(prometheus_registry.clone())
                    .without_target_info()
                    .without_counter_suffixes()
                    .without_units()
                    .build()
                    .map_err(|e| KitError::exporter(Signal::Metrics, e))?;
                registry = Some(prometheus_registry);
                builder.with_reader(exporter).build()
            }
            MetricsBackend::Stdout => {
                let reader = PeriodicReader::builder(opentelemetry_stdout::MetricExporter::default())
                    .with_interval(EXPORT_INTERVAL)
                    .build();
                builder.with_reader(reader).build()
            }
            MetricsBackend::None => builder.build(),
        },
    };

    let scope = InstrumentationScope::builder(config.service_name.clone())
        .with_version(config.service_version.clone())
        .build();
    let meter = provider.meter_with_scope(scope);
    let instruments = Instruments::register(&meter);

    Ok(MetricsPipeline {
        provider,
        meter,
        instruments,
        registry,
    })
}
