//! Trace pipeline.
//!
//! # Responsibilities
//! - Build the span exporter for the selected backend
//! - Sample by trace-id ratio at the configured rate
//! - Hand out a tracer bound to the service identity
//!
//! # Design Decisions
//! - `none` keeps a real provider with no processor and an always-off
//!   sampler, so every span call still works and costs almost nothing
//! - Network exporters are batched; an injected exporter is exported
//!   synchronously so tests observe spans as soon as they end

use opentelemetry::trace::TracerProvider as _;
use opentelemetry::InstrumentationScope;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::trace::{Sampler, SdkTracer, SdkTracerProvider, TracerProviderBuilder};
use opentelemetry_sdk::Resource;

use crate::config::KitConfig;
use crate::error::{KitError, Signal};
use crate::provider::backend::TraceBackend;

/// Replaces the configured exporter when the kit is built.
pub type TraceHook = Box<dyn FnOnce(TracerProviderBuilder) -> TracerProviderBuilder + Send>;

pub struct TracePipeline {
    pub provider: SdkTracerProvider,
    pub tracer: SdkTracer,
}

pub fn build_trace_pipeline(
    config: &KitConfig,
    resource: Resource,
    hook: Option<TraceHook>,
) -> Result<TracePipeline, KitError> {
    let builder = SdkTracerProvider::builder().with_resource(resource);
    let ratio = Sampler::TraceIdRatioBased(config.sample_rate);

    let provider = match hook {
        Some(hook) => hook(builder.with_sampler(ratio)).build(),
        None => match TraceBackend::select(config)? {
            TraceBackend::Jaeger { endpoint } | TraceBackend::Otlp { endpoint } => {
                let exporter = opentelemetry_otlp::SpanExporter::builder()
                    .with_http()
                    .with_endpoint(endpoint)
                    .build()
                    .map_err(|e| KitError::exporter(Signal::Traces, e))?;
                builder.with_sampler(ratio).with_batch_exporter(exporter).build()
            }
            TraceBackend::Stdout => builder
                .with_sampler(ratio)
                .with_batch_exporter(opentelemetry_stdout::SpanExporter::default())
                .build(),
            TraceBackend::None => builder.with_sampler(Sampler::AlwaysOff).build(),
        },
    };

    let scope = InstrumentationScope::builder(config.service_name.clone())
        .with_version(config.service_version.clone())
        .build();
    let tracer = provider.tracer_with_scope(scope);

    Ok(TracePipeline { provider, tracer })
}
