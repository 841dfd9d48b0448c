//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use opentelemetry::logs::AnyValue;
use opentelemetry::Key;
use opentelemetry_sdk::logs::{InMemoryLogExporter, SdkLogRecord};
use opentelemetry_sdk::trace::{InMemorySpanExporter, SpanData};

use otelkit::{KitConfig, LogLevel, OtelKit};

/// A kit whose spans and log records are captured in memory.
pub struct TestKit {
    pub kit: Arc<OtelKit>,
    pub spans: InMemorySpanExporter,
    pub logs: InMemoryLogExporter,
}

impl TestKit {
    pub fn finished_spans(&self) -> Vec<SpanData> {
        self.spans.get_finished_spans().unwrap()
    }

    pub fn span_named(&self, name: &str) -> SpanData {
        self.finished_spans()
            .into_iter()
            .find(|span| span.name == name)
            .unwrap_or_else(|| panic!("no finished span named {name}"))
    }

    pub fn log_records(&self) -> Vec<SdkLogRecord> {
        self.logs
            .get_emitted_logs()
            .unwrap()
            .into_iter()
            .map(|log| log.record)
            .collect()
    }

    pub fn log_with_body(&self, body: &str) -> SdkLogRecord {
        self.log_records()
            .into_iter()
            .find(|record| record.body() == Some(&AnyValue::from(body.to_string())))
            .unwrap_or_else(|| panic!("no log record with body {body}"))
    }
}

/// Configuration that samples everything and exports nowhere by default.
pub fn test_config() -> KitConfig {
    KitConfig {
        service_name: "otelkit-test".into(),
        service_version: "0.0.1".into(),
        environment: "test".into(),
        traces_exporter: "none".into(),
        metrics_exporter: "none".into(),
        logs_exporter: "none".into(),
        sample_rate: 1.0,
        log_level: LogLevel::Debug,
        ..KitConfig::default()
    }
}

pub fn test_kit() -> TestKit {
    test_kit_with(test_config())
}

pub fn test_kit_with(config: KitConfig) -> TestKit {
    let spans = InMemorySpanExporter::default();
    let logs = InMemoryLogExporter::default();

    let kit = OtelKit::builder(config)
        .with_span_exporter(spans.clone())
        .with_log_exporter(logs.clone())
        .build()
        .unwrap();

    TestKit {
        kit: Arc::new(kit),
        spans,
        logs,
    }
}

/// Look up an attribute on a finished span.
pub fn span_attr(span: &SpanData, key: &str) -> Option<opentelemetry::Value> {
    span.attributes
        .iter()
        .find(|kv| kv.key.as_str() == key)
        .map(|kv| kv.value.clone())
}

/// Look up an attribute on an exported log record.
pub fn log_attr(record: &SdkLogRecord, key: &str) -> Option<AnyValue> {
    let key = Key::from(key.to_string());
    record
        .attributes_iter()
        .find(|(k, _)| *k == key)
        .map(|(_, v)| v.clone())
}
